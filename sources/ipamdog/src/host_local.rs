//! Reads the allocation records left behind by the host-local IPAM plugin.
//!
//! host-local keeps one file per allocated address in its network directory. The file is named
//! after the bare IPv4 address and holds the ID of the container that owns it. Alongside those
//! sits a `last_reserved_ip.N` file recording where the plugin's allocation cursor stopped.

use crate::error::{self, Result};
use ipnet::Ipv4Net;
use snafu::{OptionExt, ResultExt};
use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;

/// Any entry whose name contains this is bookkeeping, not an allocation.
const LAST_RESERVED_MARKER: &str = "last";

/// One address handed out by the host-local plugin.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct AllocationRecord {
    /// Always a /32.
    pub(crate) address: Ipv4Net,
    /// The owning container's ID as stored; bytes that aren't UTF-8 are replaced.
    pub(crate) owner: String,
}

impl AllocationRecord {
    pub(crate) fn ip(&self) -> Ipv4Addr {
        self.address.addr()
    }
}

/// Returns a record for every allocation in `path`, in directory listing order. Stops at the
/// first entry that can't be turned into a record.
pub(crate) fn list_allocations<P>(path: P) -> Result<Vec<AllocationRecord>>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let entries = fs::read_dir(path).context(error::StoreUnavailableSnafu { path })?;

    let mut records = Vec::new();
    for entry in entries {
        let entry = entry.context(error::StoreUnavailableSnafu { path })?;
        let file_name = entry.file_name();
        let name = file_name
            .to_str()
            .context(error::RecordCorruptNameSnafu {
                name: file_name.to_string_lossy(),
            })?;

        if name.contains(LAST_RESERVED_MARKER) {
            debug!("Skipping '{}', not an allocation", name);
            continue;
        }

        let record = read_record(&entry.path(), name)?;
        trace!("Read allocation {} owned by '{}'", record.address, record.owner);
        records.push(record);
    }

    Ok(records)
}

fn read_record(path: &Path, name: &str) -> Result<AllocationRecord> {
    // host-local writes whatever ID the runtime gave it, so don't insist on UTF-8.
    let owner = fs::read(path).context(error::RecordCorruptContentSnafu { name })?;
    let owner = String::from_utf8_lossy(&owner).into_owned();
    let address = host_address(name)?;
    Ok(AllocationRecord { address, owner })
}

/// Parses a record name as a single-host network.
fn host_address(name: &str) -> Result<Ipv4Net> {
    format!("{}/32", name)
        .parse()
        .context(error::RecordCorruptAddressSnafu { name })
}
