//! Takes the old CNI plugin out of service so it can't hand out addresses mid-migration.

use crate::error::{self, Result};
use snafu::ResultExt;
use std::fs;
use std::io;
use std::path::Path;
use std::thread;
use std::time::Duration;

/// Moves `config` to `disabled` so the container runtime no longer picks it up, then waits
/// `settle` for CNI invocations that already loaded it to finish.
///
/// A missing `config` isn't an error: a rerun after a failed migration finds it already moved.
pub(crate) fn disable_plugin_config<P1, P2>(
    config: P1,
    disabled: P2,
    settle: Duration,
) -> Result<()>
where
    P1: AsRef<Path>,
    P2: AsRef<Path>,
{
    let config = config.as_ref();
    let disabled = disabled.as_ref();

    if let Err(e) = fs::rename(config, disabled) {
        // A missing target directory also reports NotFound, so only a missing source counts.
        if e.kind() == io::ErrorKind::NotFound && is_missing(config) {
            warn!(
                "CNI config '{}' not found, assuming it was already disabled",
                config.display()
            );
            return Ok(());
        }
        return Err(e).context(error::DisablePluginSnafu {
            from: config,
            to: disabled,
        });
    }
    info!(
        "Disabled CNI config '{}', moved to '{}'",
        config.display(),
        disabled.display()
    );

    thread::sleep(settle);
    Ok(())
}

fn is_missing(path: &Path) -> bool {
    matches!(fs::symlink_metadata(path), Err(e) if e.kind() == io::ErrorKind::NotFound)
}
