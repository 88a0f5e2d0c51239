/*!
# Introduction

ipamdog moves a node's pod addresses from the host-local CNI IPAM plugin to the cluster IPAM
service. It runs once per node while the node is switched over, and keeps every running pod on
the address it already has.

It works in three steps:

* Disable the old plugin by moving its CNI config out of `/etc/cni/net.d`, so no new addresses
  are handed out from the host-local store while it is being read.
* Read every allocation record in the host-local store. Each file is named after an address and
  holds the ID of the container that owns it; the `last_reserved_ip` bookkeeping file is skipped.
* Assign each address, one at a time, to this node in the cluster IPAM service under the handle
  `k8s-pod-network.<container ID>`.

ipamdog stops at the first error and exits non-zero. Assignments made before the error stay in
place. Once the cause is fixed it can be run again with `--keep-cni-config`. The service refuses
the addresses it already holds, so a rerun with `--skip-and-report` attempts every record but
still exits non-zero, listing the refused addresses; check those against the ones migrated
before the failure.

# Configuration

The node name comes from `--node-name` or the `KUBERNETES_NODE_NAME` environment variable.

The IPAM client is configured from the TOML file given with `--ipam-config`, or from the
`IPAM_ENDPOINT`, `IPAM_TOKEN` and `IPAM_TIMEOUT_SECONDS` environment variables.
*/

#![deny(rust_2018_idioms)]

#[macro_use]
extern crate log;

mod args;
mod disable;
mod error;
mod host_local;
mod migrate;
mod node;

use crate::args::Args;
use crate::error::Result;
use crate::migrate::OnError;
use ipamclient::{ClientConfig, HttpIpamClient, IpamClient};
use simplelog::{Config as LogConfig, SimpleLogger};
use snafu::ResultExt;
use std::process;
use std::time::Duration;

/// Disables the old plugin, then migrates every allocation in its store to `node_name`.
///
/// pub(crate) for testing.
pub(crate) fn migrate_node(args: &Args, node_name: &str, client: &dyn IpamClient) -> Result<()> {
    if args.keep_cni_config {
        info!(
            "Leaving CNI config '{}' in place",
            args.cni_config.display()
        );
    } else {
        disable::disable_plugin_config(
            &args.cni_config,
            &args.disabled_cni_config,
            Duration::from_secs(args.settle_seconds),
        )?;
    }

    let records = host_local::list_allocations(&args.store_dir)?;
    info!(
        "Found {} allocations in '{}'",
        records.len(),
        args.store_dir.display()
    );

    let on_error = if args.skip_and_report {
        OnError::SkipAndReport
    } else {
        OnError::AbortAll
    };
    migrate::migrate(&records, node_name, client, on_error)
}

fn run() -> Result<()> {
    let args: Args = argh::from_env();

    // SimpleLogger will send errors to stderr and anything less to stdout.
    SimpleLogger::init(args.log_level, LogConfig::default()).context(error::LoggerSnafu)?;

    // Everything that can be checked without side effects is, before the CNI config is touched.
    let node_name = node::node_name(args.node_name.clone())?;
    info!("Migrating host-local allocations for node '{}'", node_name);
    let config =
        ClientConfig::load(args.ipam_config.as_deref()).context(error::IpamConfigSnafu)?;
    let client = HttpIpamClient::new(&config).context(error::IpamClientSnafu)?;

    migrate_node(&args, &node_name, &client)
}

// Returning a Result from main makes it print a Debug representation of the error, but with Snafu
// we have nice Display representations of the error, so we wrap "main" (run) and print any error.
// https://github.com/shepmaster/snafu/issues/110
fn main() {
    if let Err(e) = run() {
        eprintln!("{}", e);
        process::exit(1);
    }
}
