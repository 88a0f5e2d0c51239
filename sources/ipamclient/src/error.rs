//! The error type returned by the IPAM client.

use http::StatusCode;
use snafu::Snafu;
use std::net::Ipv4Addr;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Failed to read IPAM client config {}: {}", path.display(), source))]
    ConfigRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Failed to parse IPAM client config {}: {}", path.display(), source))]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[snafu(display("Failed to load IPAM client config from environment: {}", source))]
    ConfigEnv { source: envy::Error },

    #[snafu(display("Unable to parse IPAM endpoint '{}': {}", url, source))]
    UrlParse {
        url: String,
        source: url::ParseError,
    },

    #[snafu(display("Error building HTTP client for {}: {}", url.as_str(), source))]
    HttpClient { url: Url, source: reqwest::Error },

    #[snafu(display("Error sending HTTP request to {}: {}", url.as_str(), source))]
    HttpSend { url: Url, source: reqwest::Error },

    #[snafu(display("Address {} is already assigned: {}", ip, body))]
    AlreadyAssigned { ip: Ipv4Addr, body: String },

    #[snafu(display("Error {} from {}: {}", code, url.as_str(), body))]
    ResponseStatus {
        url: Url,
        code: StatusCode,
        body: String,
    },
}
