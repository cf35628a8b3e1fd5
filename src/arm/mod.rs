//! Azure Resource Manager client

pub mod auth;
pub mod client;
pub mod error;
pub mod models;

pub use auth::{TokenProvider, DEFAULT_AUTHORITY};
pub use client::{
    ArmClient, ArmOperations, DEFAULT_MANAGEMENT_ENDPOINT, RESOURCE_GROUP_API_VERSION,
};
pub use error::{chain_is_not_found, classify_arm_error, error_from_body, ArmError};

#[cfg(test)]
pub use client::MockArmOperations;
