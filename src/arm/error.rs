//! ARM error classification and handling
//!
//! Provides typed errors for Azure Resource Manager requests using the error
//! code from the ARM error envelope instead of string matching on bodies.

use serde::Deserialize;
use thiserror::Error;

/// ARM error categories for teardown and reporting logic
#[derive(Debug, Error)]
pub enum ArmError {
    /// Credentials missing or rejected by the token endpoint
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    /// Resource or resource group does not exist (safe to skip in teardown)
    #[error("Resource not found: {message}")]
    NotFound { message: String },

    /// Control plane rate limit hit
    #[error("Request throttled by the control plane: {message}")]
    Throttled { message: String },

    /// Generic ARM request failure with status, code, and message
    #[error("ARM request failed ({status} {code}): {message}", code = .code.as_deref().unwrap_or("no code"))]
    Api {
        status: u16,
        code: Option<String>,
        message: String,
    },

    /// A long-running operation reached a non-success terminal state
    #[error("Operation '{operation}' ended in state {status}{}", .message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Operation {
        operation: String,
        status: String,
        message: Option<String>,
    },

    /// Response could not be interpreted (missing fields, bad JSON)
    #[error("Unexpected control plane response: {message}")]
    InvalidResponse { message: String },
}

impl ArmError {
    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, ArmError::NotFound { .. })
    }

    /// Check if this is an authentication/authorization error
    pub fn is_auth(&self) -> bool {
        matches!(self, ArmError::Auth { .. })
    }

    /// Check if this is a throttling error
    pub fn is_throttled(&self) -> bool {
        matches!(self, ArmError::Throttled { .. })
    }
}

/// Known ARM error codes for "not found" conditions
const NOT_FOUND_CODES: &[&str] = &[
    "ResourceGroupNotFound",
    "ResourceNotFound",
    "NotFound",
    "ParentResourceNotFound",
    "SubscriptionNotFound",
];

/// Known ARM error codes for authentication/authorization failures
const AUTH_CODES: &[&str] = &[
    "AuthorizationFailed",
    "InvalidAuthenticationToken",
    "ExpiredAuthenticationToken",
    "AuthenticationFailed",
];

/// Known ARM error codes for throttling
const THROTTLED_CODES: &[&str] = &["TooManyRequests", "RequestThrottled"];

/// Classify an ARM failure using the HTTP status and envelope error code.
pub fn classify_arm_error(status: u16, code: Option<&str>, message: &str) -> ArmError {
    match code {
        Some(c) if NOT_FOUND_CODES.contains(&c) => ArmError::NotFound {
            message: message.to_string(),
        },
        Some(c) if AUTH_CODES.contains(&c) => ArmError::Auth {
            message: message.to_string(),
        },
        Some(c) if THROTTLED_CODES.contains(&c) => ArmError::Throttled {
            message: message.to_string(),
        },
        _ if status == 404 => ArmError::NotFound {
            message: message.to_string(),
        },
        _ if status == 401 || status == 403 => ArmError::Auth {
            message: message.to_string(),
        },
        _ if status == 429 => ArmError::Throttled {
            message: message.to_string(),
        },
        _ => ArmError::Api {
            status,
            code: code.map(|s| s.to_string()),
            message: message.to_string(),
        },
    }
}

/// ARM error envelope returned on failed requests
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorDetail,
}

/// The code/message pair inside an ARM error envelope
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

impl ErrorDetail {
    /// Render the detail as a single line for operation errors
    pub fn to_message(&self) -> String {
        match (&self.code, &self.message) {
            (Some(code), Some(message)) => format!("{code}: {message}"),
            (Some(code), None) => code.clone(),
            (None, Some(message)) => message.clone(),
            (None, None) => "no error detail".to_string(),
        }
    }
}

/// Parse a failed response body into a classified [`ArmError`].
///
/// Falls back to a generic `Api` error carrying a body snippet when the body
/// is not a standard ARM error envelope.
pub fn error_from_body(status: u16, body: &str) -> ArmError {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        let message = envelope
            .error
            .message
            .unwrap_or_else(|| "no error message".to_string());
        return classify_arm_error(status, envelope.error.code.as_deref(), &message);
    }

    let snippet: String = body.chars().take(200).collect();
    classify_arm_error(status, None, snippet.trim())
}

/// Check whether any error in an anyhow chain is an ARM "not found".
pub fn chain_is_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .any(|cause| matches!(cause.downcast_ref::<ArmError>(), Some(e) if e.is_not_found()))
}
