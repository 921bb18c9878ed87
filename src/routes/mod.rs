/**
 * Routes Module
 * API route handlers
 */
use serde::{Deserialize, Serialize};

pub mod health;
pub mod site;

/// Error body shared by all handlers
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
