//! Registers host-local allocations with the cluster IPAM service.

use crate::error::{self, Result};
use crate::host_local::AllocationRecord;
use ipamclient::{AssignIpArgs, IpamClient};
use snafu::{ensure, ResultExt};

/// Prefix of every handle created by the migration. Matches the network name host-local stored
/// the allocations under, keeping them apart from handles created by normal pod setup.
pub(crate) const MIGRATION_HANDLE_NAMESPACE: &str = "k8s-pod-network";

/// What to do when the IPAM service refuses an assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub(crate) enum OnError {
    /// Stop at the first failure; later records are never attempted.
    #[default]
    AbortAll,
    /// Attempt every record, log each failure, and fail once all have been tried.
    SkipAndReport,
}

/// The IPAM handle that will own an address previously owned by container `owner`.
pub(crate) fn owner_handle(owner: &str) -> String {
    format!("{}.{}", MIGRATION_HANDLE_NAMESPACE, owner)
}

fn assignment(record: &AllocationRecord, host_identity: &str) -> AssignIpArgs {
    AssignIpArgs {
        ip: record.ip(),
        handle_id: Some(owner_handle(&record.owner)),
        hostname: host_identity.to_string(),
    }
}

/// Assigns each record's address to `host_identity` in order, one request at a time.
///
/// Assignments that succeed before a failure stay committed; there is nothing to roll back to.
pub(crate) fn migrate(
    records: &[AllocationRecord],
    host_identity: &str,
    client: &dyn IpamClient,
    on_error: OnError,
) -> Result<()> {
    let total = records.len();
    let mut failed: usize = 0;

    for (i, record) in records.iter().enumerate() {
        let args = assignment(record, host_identity);
        let handle = args.handle_id.clone().unwrap_or_default();
        debug!(
            "Assigning {} to '{}' on '{}' ({}/{})",
            args.ip,
            handle,
            args.hostname,
            i + 1,
            total
        );

        let result = client
            .assign_ip(&args)
            .context(error::AssignmentRejectedSnafu {
                address: args.ip,
                handle: &handle,
            });
        match (result, on_error) {
            (Ok(()), _) => info!("Migrated {} to handle '{}'", args.ip, handle),
            (Err(e), OnError::AbortAll) => return Err(e),
            (Err(e), OnError::SkipAndReport) => {
                warn!("{}", e);
                failed += 1;
            }
        }
    }

    ensure!(failed == 0, error::IncompleteMigrationSnafu { failed, total });
    info!("Migrated {} allocations", total);
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::error::Error;
    use ipnet::Ipv4Net;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::net::Ipv4Addr;

    /// Records every request and refuses the ones for addresses in `reject`.
    #[derive(Default)]
    struct MockClient {
        reject: HashSet<Ipv4Addr>,
        requests: RefCell<Vec<AssignIpArgs>>,
    }

    impl MockClient {
        fn rejecting(ips: &[&str]) -> Self {
            Self {
                reject: ips.iter().map(|ip| ip.parse().unwrap()).collect(),
                ..Default::default()
            }
        }

        fn attempted(&self) -> Vec<Ipv4Addr> {
            self.requests.borrow().iter().map(|args| args.ip).collect()
        }
    }

    impl IpamClient for MockClient {
        fn assign_ip(&self, args: &AssignIpArgs) -> ipamclient::Result<()> {
            self.requests.borrow_mut().push(args.clone());
            if self.reject.contains(&args.ip) {
                return Err(ipamclient::Error::AlreadyAssigned {
                    ip: args.ip,
                    body: "in use".to_string(),
                });
            }
            Ok(())
        }
    }

    fn record(ip: &str, owner: &str) -> AllocationRecord {
        AllocationRecord {
            address: Ipv4Net::new(ip.parse().unwrap(), 32).unwrap(),
            owner: owner.to_string(),
        }
    }

    fn three_records() -> Vec<AllocationRecord> {
        vec![
            record("10.0.0.1", "one"),
            record("10.0.0.2", "two"),
            record("10.0.0.3", "three"),
        ]
    }

    fn ip(s: &str) -> Ipv4Addr {
        s.parse().unwrap()
    }

    #[test]
    fn handle_is_deterministic() {
        assert_eq!(owner_handle("containerABC"), owner_handle("containerABC"));
        assert_eq!(owner_handle("containerABC"), "k8s-pod-network.containerABC");
    }

    #[test]
    fn single_record() {
        let client = MockClient::default();
        migrate(
            &[record("10.0.0.5", "containerABC")],
            "node-1",
            &client,
            OnError::AbortAll,
        )
        .unwrap();

        let requests = client.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].ip, ip("10.0.0.5"));
        assert!(requests[0]
            .handle_id
            .as_deref()
            .unwrap()
            .ends_with(".containerABC"));
        assert_eq!(requests[0].hostname, "node-1");
    }

    #[test]
    fn same_handle_on_rerun() {
        let records = [record("10.0.0.5", "containerABC")];
        let first = MockClient::default();
        let second = MockClient::default();
        migrate(&records, "node-1", &first, OnError::AbortAll).unwrap();
        migrate(&records, "node-1", &second, OnError::AbortAll).unwrap();
        assert_eq!(*first.requests.borrow(), *second.requests.borrow());
    }

    #[test]
    fn host_identity_used_verbatim() {
        let client = MockClient::default();
        migrate(&three_records(), "ip-10-0-0-1.ec2.internal", &client, OnError::AbortAll)
            .unwrap();
        assert!(client
            .requests
            .borrow()
            .iter()
            .all(|args| args.hostname == "ip-10-0-0-1.ec2.internal"));
    }

    #[test]
    fn no_records() {
        let client = MockClient::default();
        migrate(&[], "node-1", &client, OnError::AbortAll).unwrap();
        assert!(client.requests.borrow().is_empty());
    }

    #[test]
    fn stops_at_first_failure() {
        let client = MockClient::rejecting(&["10.0.0.2"]);
        let result = migrate(&three_records(), "node-1", &client, OnError::AbortAll);

        assert!(matches!(
            result,
            Err(Error::AssignmentRejected { address, ref handle, .. })
                if address == ip("10.0.0.2") && handle == "k8s-pod-network.two"
        ));
        assert_eq!(client.attempted(), vec![ip("10.0.0.1"), ip("10.0.0.2")]);
    }

    #[test]
    fn skip_and_report_attempts_everything() {
        let client = MockClient::rejecting(&["10.0.0.2"]);
        let result = migrate(&three_records(), "node-1", &client, OnError::SkipAndReport);

        assert!(matches!(
            result,
            Err(Error::IncompleteMigration {
                failed: 1,
                total: 3
            })
        ));
        assert_eq!(
            client.attempted(),
            vec![ip("10.0.0.1"), ip("10.0.0.2"), ip("10.0.0.3")]
        );
    }

    #[test]
    fn skip_and_report_succeeds_without_failures() {
        let client = MockClient::default();
        migrate(&three_records(), "node-1", &client, OnError::SkipAndReport).unwrap();
        assert_eq!(client.attempted().len(), 3);
    }

    #[test]
    fn order_does_not_change_assignments() {
        let records = three_records();
        let mut reversed = records.clone();
        reversed.reverse();
        let mut rotated = records.clone();
        rotated.rotate_left(1);

        let assignments = |records: &[AllocationRecord]| {
            let client = MockClient::default();
            migrate(records, "node-1", &client, OnError::AbortAll).unwrap();
            let requests = client.requests.borrow();
            requests
                .iter()
                .map(|args| (args.ip, args.handle_id.clone(), args.hostname.clone()))
                .collect::<HashSet<_>>()
        };

        let expected = assignments(&records);
        assert_eq!(expected.len(), 3);
        assert_eq!(assignments(&reversed), expected);
        assert_eq!(assignments(&rotated), expected);
    }
}
