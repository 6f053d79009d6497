//! Helper crate for querying NATS HTTP monitoring endpoints.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;

use std::time::Duration;

use reqwest::Client;

/// Helper for querying NATS HTTP monitoring endpoints on localhost.
#[derive(Clone, Debug)]
pub struct NatsMonitor {
    client: Client,
    monitoring_port: u16,
}

impl NatsMonitor {
    /// Default timeout applied to every monitoring request.
    pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);

    /// Creates a new `NatsMonitor` for the specified monitoring port.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP client cannot be
    /// constructed.
    pub fn new(monitoring_port: u16, request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;

        Ok(Self {
            client,
            monitoring_port,
        })
    }

    /// Fetches the route information (Routez) from the NATS server.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP request fails, the
    /// server answers non-2xx, or the response cannot be parsed into a
    /// `Routez` object.
    pub async fn get_routez(&self) -> Result<Routez> {
        let url = format!("http://localhost:{}/routez", self.monitoring_port);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let json = response.text().await?;
        let routez: Routez = serde_json::from_str(&json)?;
        Ok(routez)
    }

    /// Fetches the server information (Varz) from the NATS server.
    ///
    /// # Errors
    ///
    /// This function will return an error if the HTTP request fails, the
    /// server answers non-2xx, or the response cannot be parsed into a
    /// `Varz` object.
    pub async fn get_varz(&self) -> Result<Varz> {
        let url = format!("http://localhost:{}/varz", self.monitoring_port);
        let response = self.client.get(url).send().await?.error_for_status()?;
        let json = response.text().await?;
        let varz: Varz = serde_json::from_str(&json)?;
        Ok(varz)
    }
}
