//! External polling driver.
//!
//! The protocol makes progress only when something polls each participant;
//! this crate is that something. The driver sweeps every participant's
//! `/status` endpoint, and whenever a poll reports an available payload it
//! ferries the payload to its destination: member payloads to the
//! coordinator, the coordinator's global result to every member.
//!
//! The driver deliberately has no abort path: a participant that never
//! progresses stalls the sweep loop forever, mirroring the protocol's own
//! stall-forever barrier semantics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use lockstep_protocol::StatusReport;
use lockstep_types::ExchangePayload;

/// Errors raised by the driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The endpoint list was empty.
    #[error("At least one participant endpoint is required")]
    NoEndpoints,

    /// An HTTP request failed outright.
    #[error("HTTP transport failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A participant answered with `success = false`.
    #[error("{endpoint} rejected {operation}")]
    Rejected {
        /// The participant's base URL.
        endpoint: String,
        /// Which call was rejected.
        operation: &'static str,
    },
}

/// Which processes to drive and how often to sweep them.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// The coordinator's base URL.
    pub coordinator: String,
    /// The members' base URLs.
    pub members: Vec<String>,
    /// Delay between polling sweeps.
    pub poll_interval: Duration,
}

impl DriverConfig {
    /// Build a configuration from an endpoint list; the first endpoint
    /// coordinates, the rest are members.
    pub fn from_endpoints(
        endpoints: Vec<String>,
        poll_interval: Duration,
    ) -> Result<Self, DriverError> {
        let mut endpoints: Vec<String> = endpoints
            .into_iter()
            .map(|e| e.trim_end_matches('/').to_owned())
            .collect();
        if endpoints.is_empty() {
            return Err(DriverError::NoEndpoints);
        }
        let coordinator = endpoints.remove(0);
        Ok(Self {
            coordinator,
            members: endpoints,
            poll_interval,
        })
    }
}

#[derive(Debug, Serialize)]
struct SetupRequest {
    id: String,
    is_coordinator: bool,
    participants: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SuccessResponse {
    success: bool,
}

/// Drives a set of lockstep participants to completion over HTTP.
#[derive(Debug)]
pub struct Driver {
    config: DriverConfig,
    client: reqwest::Client,
}

impl Driver {
    /// Create a driver for the given configuration.
    pub fn new(config: DriverConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn participants(&self) -> impl Iterator<Item = &String> {
        std::iter::once(&self.config.coordinator).chain(self.config.members.iter())
    }

    /// Send the setup call to every participant.
    ///
    /// Participant ids are their endpoint URLs; the coordinator's roster
    /// lists every participant, itself included.
    pub async fn setup_all(&self) -> Result<(), DriverError> {
        let roster: Vec<String> = self.participants().cloned().collect();

        self.post_setup(
            &self.config.coordinator,
            &SetupRequest {
                id: self.config.coordinator.clone(),
                is_coordinator: true,
                participants: roster,
            },
        )
        .await?;

        for member in &self.config.members {
            self.post_setup(
                member,
                &SetupRequest {
                    id: member.clone(),
                    is_coordinator: false,
                    participants: Vec::new(),
                },
            )
            .await?;
        }
        info!(participants = self.config.members.len() + 1, "Run configured");
        Ok(())
    }

    /// Sweep all participants until every one reports finished.
    ///
    /// Returns the global result if it passed through the driver during
    /// this run. Never returns while any participant is stalled.
    pub async fn run(&self) -> Result<Option<f64>, DriverError> {
        let mut global_result = None;

        loop {
            let mut all_finished = true;

            for endpoint in self.participants() {
                let report: StatusReport = self
                    .client
                    .get(format!("{endpoint}/status"))
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;

                if report.finished {
                    continue;
                }
                all_finished = false;
                if !report.available {
                    continue;
                }

                let payload: Option<ExchangePayload> = self
                    .client
                    .get(format!("{endpoint}/data"))
                    .send()
                    .await?
                    .error_for_status()?
                    .json()
                    .await?;

                match payload {
                    Some(ExchangePayload::GlobalResult(result)) => {
                        info!(result, "Relaying global result to members");
                        for member in &self.config.members {
                            self.post_data(member, &ExchangePayload::GlobalResult(result))
                                .await?;
                        }
                        global_result = Some(result);
                    }
                    Some(payload) => {
                        debug!(
                            endpoint = endpoint.as_str(),
                            payload = payload.type_name(),
                            "Relaying to coordinator"
                        );
                        self.post_data(&self.config.coordinator, &payload).await?;
                    }
                    None => {}
                }
            }

            if all_finished {
                info!("All participants finished");
                return Ok(global_result);
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn post_setup(
        &self,
        endpoint: &str,
        request: &SetupRequest,
    ) -> Result<(), DriverError> {
        let response: SuccessResponse = self
            .client
            .post(format!("{endpoint}/setup"))
            .json(request)
            .send()
            .await?
            .json()
            .await?;
        if !response.success {
            return Err(DriverError::Rejected {
                endpoint: endpoint.to_owned(),
                operation: "setup",
            });
        }
        Ok(())
    }

    async fn post_data(
        &self,
        endpoint: &str,
        payload: &ExchangePayload,
    ) -> Result<(), DriverError> {
        let response: SuccessResponse = self
            .client
            .post(format!("{endpoint}/data"))
            .json(payload)
            .send()
            .await?
            .json()
            .await?;
        if !response.success {
            return Err(DriverError::Rejected {
                endpoint: endpoint.to_owned(),
                operation: "submit",
            });
        }
        Ok(())
    }
}
