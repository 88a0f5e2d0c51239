//! Provides the list of errors for `ipamdog`.

use snafu::Snafu;
use std::net::Ipv4Addr;
use std::path::PathBuf;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub(crate) enum Error {
    #[snafu(display("Failed to disable CNI config '{}' by moving it to '{}': {}",
                    from.display(), to.display(), source))]
    DisablePlugin {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Unable to list allocation records in '{}': {}", path.display(), source))]
    StoreUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Corrupt allocation record '{}': name is not UTF-8", name))]
    RecordCorruptName { name: String },

    #[snafu(display("Corrupt allocation record '{}': unable to read owner: {}", name, source))]
    RecordCorruptContent {
        name: String,
        source: std::io::Error,
    },

    #[snafu(display("Corrupt allocation record '{}': not an IPv4 address: {}", name, source))]
    RecordCorruptAddress {
        name: String,
        source: ipnet::AddrParseError,
    },

    #[snafu(display("IPAM rejected assignment of {} to handle '{}': {}", address, handle, source))]
    AssignmentRejected {
        address: Ipv4Addr,
        handle: String,
        source: ipamclient::Error,
    },

    #[snafu(display("Failed to migrate {} of {} allocations", failed, total))]
    IncompleteMigration { failed: usize, total: usize },

    #[snafu(display("Unable to determine node name: set --node-name or {}", var))]
    MissingNodeName { var: String },

    #[snafu(display("Unable to load IPAM client config: {}", source))]
    IpamConfig { source: ipamclient::Error },

    #[snafu(display("Unable to create IPAM client: {}", source))]
    IpamClient { source: ipamclient::Error },

    #[snafu(display("Logger setup error: {}", source))]
    Logger { source: log::SetLoggerError },
}

pub(crate) type Result<T> = std::result::Result<T, Error>;
