//! Command line arguments for the ipamdog program.

use argh::FromArgs;
use simplelog::LevelFilter;
use std::path::PathBuf;

/// Directory where the host-local plugin keeps one file per allocated address.
const DEFAULT_STORE_DIR: &str = "/var/lib/cni/networks/k8s-pod-network";
/// The CNI config that routes pod networking through the host-local plugin.
const DEFAULT_CNI_CONFIG: &str = "/etc/cni/net.d/10-calico.conflist";
/// Where the CNI config is moved to; outside `net.d` the runtime no longer loads it.
const DEFAULT_DISABLED_CNI_CONFIG: &str = "/etc/cni/caliconflist.tmp";

/// Moves host-local IPAM allocations into the cluster IPAM service.
#[derive(FromArgs, Debug, PartialEq)]
pub(crate) struct Args {
    /// log-level trace|debug|info|warn|error
    #[argh(option, default = "LevelFilter::Info")]
    pub(crate) log_level: LevelFilter,

    /// directory holding the host-local allocation records
    #[argh(option, default = "PathBuf::from(DEFAULT_STORE_DIR)")]
    pub(crate) store_dir: PathBuf,

    /// path of the CNI config to disable before reading the allocation records
    #[argh(option, default = "PathBuf::from(DEFAULT_CNI_CONFIG)")]
    pub(crate) cni_config: PathBuf,

    /// path the CNI config is moved to
    #[argh(option, default = "PathBuf::from(DEFAULT_DISABLED_CNI_CONFIG)")]
    pub(crate) disabled_cni_config: PathBuf,

    /// seconds to wait after disabling the CNI config, letting in-flight CNI calls finish
    #[argh(option, default = "1")]
    pub(crate) settle_seconds: u64,

    /// name of this node [default: $KUBERNETES_NODE_NAME]
    #[argh(option)]
    pub(crate) node_name: Option<String>,

    /// path to a TOML config for the IPAM client [default: IPAM_* environment variables]
    #[argh(option)]
    pub(crate) ipam_config: Option<PathBuf>,

    /// attempt every record and report failures at the end, instead of stopping at the first
    #[argh(switch)]
    pub(crate) skip_and_report: bool,

    /// leave the CNI config in place, e.g. when rerunning after a failed migration
    #[argh(switch)]
    pub(crate) keep_cni_config: bool,
}
