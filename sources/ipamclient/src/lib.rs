/*!
`ipamclient` talks to the cluster IPAM service that owns address assignments once a node has been
moved off the host-local CNI plugin.

Only one operation is needed by the node tools that use it: assign a *specific* address to an
owner handle on behalf of a host. The service must refuse the request if the address is already
owned by someone else; that refusal surfaces as [`Error::AlreadyAssigned`].

The [`IpamClient`] trait is the seam callers program against. [`HttpIpamClient`] is the
implementation used on real hosts; tests substitute their own.

# Configuration

The client is configured either from a TOML file:

```toml
# base URL of the cluster IPAM service
endpoint = "https://ipam.kube-system.svc:8443"
# optional bearer token
token = "..."
# optional request timeout, defaults to 30
timeout_seconds = 30
```

or from the environment, using the same keys upper-cased and prefixed with `IPAM_`, e.g.
`IPAM_ENDPOINT`, `IPAM_TOKEN` and `IPAM_TIMEOUT_SECONDS`.
*/

#![deny(rust_2018_idioms)]

mod config;
pub mod error;

pub use config::ClientConfig;
pub use error::Error;

use http::StatusCode;
use log::{debug, trace};
use reqwest::blocking::Client;
use serde::Serialize;
use snafu::{ensure, ResultExt};
use std::net::Ipv4Addr;
use std::time::Duration;
use url::Url;

pub type Result<T> = std::result::Result<T, error::Error>;

/// Path, relative to the configured endpoint, of the "assign this exact address" call.
const ASSIGN_PATH: &str = "/ipam/v1/assign";

/// The arguments of an "assign exactly this address" request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssignIpArgs {
    /// The address to assign.
    pub ip: Ipv4Addr,
    /// The handle that will own the address. Releasing by handle later frees every address
    /// assigned under it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle_id: Option<String>,
    /// The host the address is affine to.
    pub hostname: String,
}

pub trait IpamClient {
    /// Assigns `args.ip` to `args.handle_id` on `args.hostname`. Fails rather than succeeding
    /// silently when the address is already assigned.
    fn assign_ip(&self, args: &AssignIpArgs) -> Result<()>;
}

/// A blocking client for the cluster IPAM service's HTTP API.
pub struct HttpIpamClient {
    client: Client,
    assign_url: Url,
    token: Option<String>,
}

impl HttpIpamClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let assign_url = format!("{}{}", config.endpoint.trim_end_matches('/'), ASSIGN_PATH);
        let assign_url = Url::parse(&assign_url).context(error::UrlParseSnafu {
            url: &config.endpoint,
        })?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context(error::HttpClientSnafu {
                url: assign_url.clone(),
            })?;
        debug!(
            "Using IPAM endpoint {} with a {}s timeout",
            assign_url, config.timeout_seconds
        );
        Ok(Self {
            client,
            assign_url,
            token: config.token.clone(),
        })
    }
}

impl IpamClient for HttpIpamClient {
    fn assign_ip(&self, args: &AssignIpArgs) -> Result<()> {
        trace!("POST {} {:?}", self.assign_url, args);
        let mut request = self.client.post(self.assign_url.clone()).json(args);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request.send().context(error::HttpSendSnafu {
            url: self.assign_url.clone(),
        })?;

        let code = response.status();
        if code.is_success() {
            return Ok(());
        }
        // The body only feeds the error message, so a failure to read it isn't worth reporting.
        let body = response.text().unwrap_or_default();
        ensure!(
            code != StatusCode::CONFLICT,
            error::AlreadyAssignedSnafu { ip: args.ip, body }
        );
        error::ResponseStatusSnafu {
            url: self.assign_url.clone(),
            code,
            body,
        }
        .fail()
    }
}
