//! Helper crate to resolve this node's externally reachable address from the
//! EC2 Instance Metadata Service (IMDSv2).
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;

pub use error::{Error, Result};

use std::time::Duration;

use reqwest::Client;
use tracing::debug;

static IMDS_BASE_URL: &str = "http://169.254.169.254";
static IMDS_PUBLIC_IPV4_PATH: &str = "/latest/meta-data/public-ipv4";
static IMDS_TOKEN_PATH: &str = "/latest/api/token";

const TOKEN_TTL_SECONDS: &str = "21600";

/// The IMDS client.
pub struct Imds {
    client: Client,
    token: String,
}

impl Imds {
    /// Default timeout applied to every metadata request.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

    /// Creates a new IMDS client, fetching a session token up front.
    ///
    /// # Errors
    ///
    /// This function will return an error if:
    /// - The HTTP request to obtain the token fails or times out
    /// - The response cannot be read as text
    pub async fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;

        let token_response = client
            .put(format!("{IMDS_BASE_URL}{IMDS_TOKEN_PATH}"))
            .header("X-aws-ec2-metadata-token-ttl-seconds", TOKEN_TTL_SECONDS)
            .send()
            .await?;

        if !token_response.status().is_success() {
            return Err(Error::UnexpectedStatus(token_response.status()));
        }

        let token = token_response.text().await?;

        Ok(Self { client, token })
    }

    /// Retrieves the instance's public IPv4 address.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP request fails, times
    /// out, or answers with a non-success status (instances without a public
    /// address report 404 here).
    pub async fn get_public_ipv4(&self) -> Result<String> {
        let response = self
            .client
            .get(format!("{IMDS_BASE_URL}{IMDS_PUBLIC_IPV4_PATH}"))
            .header("X-aws-ec2-metadata-token", &self.token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::UnexpectedStatus(response.status()));
        }

        let address = response.text().await?;
        debug!("resolved public address: {}", address);

        Ok(address)
    }
}
