//! Thin client for the Azure Resource Manager REST surface
//!
//! Implements the three verbs the pipeline needs: create-or-update awaited
//! to a terminal state, resource reads for polling, and resource group
//! deletion. Long-running operations are followed through the
//! `Azure-AsyncOperation`/`Location` monitor URL when one is returned, and
//! through the resource's own `provisioningState` otherwise.

use anyhow::{Context, Result};
use reqwest::{Response, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::arm::auth::{TokenProvider, DEFAULT_AUTHORITY};
use crate::arm::error::{error_from_body, ArmError};
use crate::arm::models::{OperationStatus, ResourceGroupBody, ResourceResponse};
use crate::config::AzureCredentials;
use crate::wait::{wait_for_operation, WaitConfig};

/// Public-cloud management endpoint; sovereign clouds differ
pub const DEFAULT_MANAGEMENT_ENDPOINT: &str = "https://management.azure.com";

/// Api version for resource group operations
pub const RESOURCE_GROUP_API_VERSION: &str = "2021-04-01";

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// ARM client carrying the HTTP transport and token source
pub struct ArmClient {
    http: reqwest::Client,
    tokens: TokenProvider,
    endpoint: String,
    wait: WaitConfig,
}

impl ArmClient {
    /// Create a client against the public cloud endpoints.
    pub fn new(credentials: AzureCredentials) -> Result<Self> {
        Self::with_endpoints(credentials, DEFAULT_MANAGEMENT_ENDPOINT, DEFAULT_AUTHORITY)
    }

    /// Create a client against explicit management/authority endpoints.
    pub fn with_endpoints(
        credentials: AzureCredentials,
        management_endpoint: &str,
        authority: &str,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(HTTP_CONNECT_TIMEOUT)
            .timeout(HTTP_REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        let tokens = TokenProvider::new(
            http.clone(),
            credentials,
            authority,
            management_endpoint,
        );
        Ok(Self {
            http,
            tokens,
            endpoint: management_endpoint.trim_end_matches('/').to_string(),
            wait: WaitConfig::default(),
        })
    }

    /// Replace the polling cadence. Tests use tight delays.
    pub fn with_wait_config(mut self, wait: WaitConfig) -> Self {
        self.wait = wait;
        self
    }

    fn url(&self, resource_id: &str, api_version: &str) -> String {
        format!("{}{}?api-version={}", self.endpoint, resource_id, api_version)
    }

    /// Create or update the resource group and return its captured id.
    pub async fn create_resource_group(&self, group_id: &str, location: &str) -> Result<String> {
        let body = serde_json::to_value(ResourceGroupBody {
            location: location.to_string(),
        })
        .context("Failed to encode resource group body")?;

        debug!(group = %group_id, "Submitting resource group create");
        let response = self.send_put(group_id, RESOURCE_GROUP_API_VERSION, &body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.response_error(response).await);
        }

        let parsed: ResourceResponse = response
            .json()
            .await
            .context("Failed to decode resource group response")?;
        let captured_id = parsed.id.clone().unwrap_or_else(|| group_id.to_string());

        // Group creation normally completes synchronously; poll only if the
        // control plane reports it still settling.
        match parsed.provisioning_state() {
            Some(state) if is_success_state(state) => {}
            Some(state) if is_failure_state(state) => {
                return Err(ArmError::Operation {
                    operation: group_id.to_string(),
                    status: state.to_string(),
                    message: None,
                }
                .into());
            }
            _ => {
                self.poll_resource_state(group_id, RESOURCE_GROUP_API_VERSION)
                    .await?;
            }
        }
        Ok(captured_id)
    }

    /// Create or update a resource and wait for its terminal state.
    pub async fn create_resource(
        &self,
        resource_id: &str,
        api_version: &str,
        body: Value,
    ) -> Result<()> {
        debug!(resource = %resource_id, "Submitting create-or-update");
        let response = self.send_put(resource_id, api_version, &body).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(self.response_error(response).await);
        }

        let monitor = monitor_url(&response);
        if status == StatusCode::ACCEPTED {
            return match monitor {
                Some(url) => self.poll_monitor(&url, resource_id).await,
                None => self.poll_resource_state(resource_id, api_version).await,
            };
        }

        let parsed: ResourceResponse = response
            .json()
            .await
            .with_context(|| format!("Failed to decode create response for {resource_id}"))?;
        match parsed.provisioning_state() {
            Some(state) if is_success_state(state) => Ok(()),
            Some(state) if is_failure_state(state) => Err(ArmError::Operation {
                operation: resource_id.to_string(),
                status: state.to_string(),
                message: None,
            }
            .into()),
            _ => match monitor {
                Some(url) => self.poll_monitor(&url, resource_id).await,
                None => self.poll_resource_state(resource_id, api_version).await,
            },
        }
    }

    /// Delete the resource group and wait until the operation finishes.
    ///
    /// A group that is already gone is not an error.
    pub async fn delete_resource_group(&self, group_id: &str) -> Result<()> {
        let token = self.tokens.bearer_token().await?;
        debug!(group = %group_id, "Submitting resource group delete");
        let response = self
            .http
            .delete(self.url(group_id, RESOURCE_GROUP_API_VERSION))
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("DELETE {group_id} failed to send"))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            debug!(group = %group_id, "Resource group already absent");
            return Ok(());
        }
        if !status.is_success() {
            return Err(self.response_error(response).await);
        }
        if status != StatusCode::ACCEPTED {
            return Ok(());
        }

        match monitor_url(&response) {
            Some(url) => self.poll_monitor(&url, group_id).await,
            None => {
                // No monitor returned; watch the group itself disappear
                wait_for_operation(
                    &self.wait,
                    || async {
                        let current = self
                            .get_resource(group_id, RESOURCE_GROUP_API_VERSION)
                            .await?;
                        Ok(current.is_none())
                    },
                    group_id,
                )
                .await
            }
        }
    }

    /// Read a resource; `None` when it does not exist.
    pub async fn get_resource(
        &self,
        resource_id: &str,
        api_version: &str,
    ) -> Result<Option<ResourceResponse>> {
        let token = self.tokens.bearer_token().await?;
        let response = self
            .http
            .get(self.url(resource_id, api_version))
            .bearer_auth(&token)
            .send()
            .await
            .with_context(|| format!("GET {resource_id} failed to send"))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(self.response_error(response).await);
        }
        let parsed = response
            .json()
            .await
            .with_context(|| format!("Failed to decode resource read for {resource_id}"))?;
        Ok(Some(parsed))
    }

    async fn send_put(
        &self,
        resource_id: &str,
        api_version: &str,
        body: &Value,
    ) -> Result<Response> {
        let token = self.tokens.bearer_token().await?;
        self.http
            .put(self.url(resource_id, api_version))
            .bearer_auth(&token)
            .json(body)
            .send()
            .await
            .with_context(|| format!("PUT {resource_id} failed to send"))
    }

    /// Follow an operation monitor URL until the operation is terminal.
    async fn poll_monitor(&self, url: &str, operation: &str) -> Result<()> {
        wait_for_operation(
            &self.wait,
            || async {
                let token = self.tokens.bearer_token().await?;
                let response = self
                    .http
                    .get(url)
                    .bearer_auth(&token)
                    .send()
                    .await
                    .with_context(|| format!("Failed to poll operation for {operation}"))?;

                let status = response.status();
                if status == StatusCode::ACCEPTED {
                    return Ok(false);
                }
                if !status.is_success() {
                    return Err(self.response_error(response).await);
                }
                if status == StatusCode::NO_CONTENT {
                    return Ok(true);
                }
                let text = response
                    .text()
                    .await
                    .with_context(|| format!("Failed to read operation status for {operation}"))?;
                interpret_monitor_body(operation, &text)
            },
            operation,
        )
        .await
    }

    /// Poll a resource's `provisioningState` until it is terminal.
    async fn poll_resource_state(&self, resource_id: &str, api_version: &str) -> Result<()> {
        wait_for_operation(
            &self.wait,
            || async {
                let Some(resource) = self.get_resource(resource_id, api_version).await? else {
                    // Not visible yet; keep polling
                    return Ok(false);
                };
                match resource.provisioning_state() {
                    Some(state) if is_success_state(state) => Ok(true),
                    Some(state) if is_failure_state(state) => Err(ArmError::Operation {
                        operation: resource_id.to_string(),
                        status: state.to_string(),
                        message: None,
                    }
                    .into()),
                    _ => Ok(false),
                }
            },
            resource_id,
        )
        .await
    }

    async fn response_error(&self, response: Response) -> anyhow::Error {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        error_from_body(status, &body).into()
    }
}

/// Extract the operation monitor URL, preferring `Azure-AsyncOperation`.
fn monitor_url(response: &Response) -> Option<String> {
    let headers = response.headers();
    headers
        .get("azure-asyncoperation")
        .or_else(|| headers.get("location"))
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

/// Interpret one monitor poll body.
///
/// Monitor URLs serve either an operation-status document or (for `Location`
/// monitors) the resource representation itself; an empty or opaque body on
/// a 200 means the operation finished.
fn interpret_monitor_body(operation: &str, text: &str) -> Result<bool> {
    if text.trim().is_empty() {
        return Ok(true);
    }

    if let Ok(op) = serde_json::from_str::<OperationStatus>(text) {
        if is_success_state(&op.status) {
            return Ok(true);
        }
        if is_failure_state(&op.status) {
            return Err(ArmError::Operation {
                operation: operation.to_string(),
                status: op.status,
                message: op.error.as_ref().map(|e| e.to_message()),
            }
            .into());
        }
        return Ok(false);
    }

    if let Ok(resource) = serde_json::from_str::<ResourceResponse>(text) {
        return match resource.provisioning_state() {
            Some(state) if is_success_state(state) => Ok(true),
            Some(state) if is_failure_state(state) => Err(ArmError::Operation {
                operation: operation.to_string(),
                status: state.to_string(),
                message: None,
            }
            .into()),
            Some(_) => Ok(false),
            None => Ok(true),
        };
    }

    Ok(true)
}

fn is_success_state(state: &str) -> bool {
    state.eq_ignore_ascii_case("Succeeded")
}

fn is_failure_state(state: &str) -> bool {
    state.eq_ignore_ascii_case("Failed") || state.eq_ignore_ascii_case("Canceled")
}

/// Trait for ARM operations that can be mocked in tests.
///
/// This trait abstracts the control-plane calls the pipeline makes to enable
/// unit testing of the step ordering and teardown logic without a live
/// subscription.
#[allow(async_fn_in_trait)] // Internal use only, Send+Sync bounds on trait are sufficient
#[cfg_attr(test, mockall::automock)]
pub trait ArmOperations: Send + Sync {
    /// Create or update the resource group; returns the captured group id
    async fn create_resource_group(&self, group_id: &str, location: &str) -> Result<String>;

    /// Create or update a resource and wait for its terminal state
    async fn create_resource(&self, resource_id: &str, api_version: &str, body: Value)
        -> Result<()>;

    /// Delete the resource group and wait until the operation finishes
    async fn delete_resource_group(&self, group_id: &str) -> Result<()>;
}

impl ArmOperations for ArmClient {
    async fn create_resource_group(&self, group_id: &str, location: &str) -> Result<String> {
        ArmClient::create_resource_group(self, group_id, location).await
    }

    async fn create_resource(
        &self,
        resource_id: &str,
        api_version: &str,
        body: Value,
    ) -> Result<()> {
        ArmClient::create_resource(self, resource_id, api_version, body).await
    }

    async fn delete_resource_group(&self, group_id: &str) -> Result<()> {
        ArmClient::delete_resource_group(self, group_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_state_classification() {
        assert!(is_success_state("Succeeded"));
        assert!(is_success_state("succeeded"));
        assert!(is_failure_state("Failed"));
        assert!(is_failure_state("Canceled"));
        assert!(!is_success_state("Updating"));
        assert!(!is_failure_state("Creating"));
    }

    #[test]
    fn monitor_status_document_in_progress() {
        let body = r#"{"status": "InProgress"}"#;
        assert!(!interpret_monitor_body("op", body).unwrap());
    }

    #[test]
    fn monitor_status_document_succeeded() {
        let body = r#"{"status": "Succeeded"}"#;
        assert!(interpret_monitor_body("op", body).unwrap());
    }

    #[test]
    fn monitor_status_document_failure_carries_detail() {
        let body = r#"{"status": "Failed", "error": {"code": "OverconstrainedZonalAllocationRequest", "message": "zone 1 exhausted"}}"#;
        let err = interpret_monitor_body("creating lVM2abc", body).unwrap_err();
        let arm = err
            .chain()
            .find_map(|cause| cause.downcast_ref::<ArmError>())
            .unwrap_or_else(|| panic!("expected an ArmError, got {err:?}"));
        match arm {
            ArmError::Operation {
                operation,
                status,
                message,
            } => {
                assert_eq!(operation, "creating lVM2abc");
                assert_eq!(status, "Failed");
                assert!(message.as_deref().unwrap().contains("zone 1 exhausted"));
            }
            other => panic!("expected Operation error, got {other:?}"),
        }
    }

    #[test]
    fn monitor_resource_document_still_settling() {
        let body = r#"{"name": "d1", "properties": {"provisioningState": "Updating"}}"#;
        assert!(!interpret_monitor_body("op", body).unwrap());
    }

    #[test]
    fn monitor_resource_document_done() {
        let body = r#"{"name": "d1", "properties": {"provisioningState": "Succeeded"}}"#;
        assert!(interpret_monitor_body("op", body).unwrap());
    }

    #[test]
    fn empty_or_opaque_monitor_body_means_done() {
        assert!(interpret_monitor_body("op", "").unwrap());
        assert!(interpret_monitor_body("op", "   ").unwrap());
    }
}
