//! Works out which node the allocations are being migrated on behalf of.

use crate::error::{self, Result};
use snafu::OptionExt;
use std::env;

/// Set by the DaemonSet running the migration, from the pod's `spec.nodeName`.
const NODE_NAME_ENV: &str = "KUBERNETES_NODE_NAME";

/// Returns `explicit` if given, otherwise the value of `KUBERNETES_NODE_NAME`. An empty name is
/// treated as missing, since every assignment would otherwise be made to a nameless host.
pub(crate) fn node_name(explicit: Option<String>) -> Result<String> {
    resolve(explicit, env::var(NODE_NAME_ENV).ok())
}

fn resolve(explicit: Option<String>, from_env: Option<String>) -> Result<String> {
    explicit
        .filter(|name| !name.is_empty())
        .or_else(|| from_env.filter(|name| !name.is_empty()))
        .context(error::MissingNodeNameSnafu { var: NODE_NAME_ENV })
}
