//! JIRA API transport and wire types.
//!
//! This module provides the interface for communicating with the JIRA REST API.

mod auth;
mod client;
pub mod error;
pub mod types;

pub use auth::Auth;
pub use client::JiraClient;
pub use error::ApiError;
pub use reqwest::Method;

/// Path prefix of the REST API version this crate speaks.
pub const API_PREFIX: &str = "rest/api/2";
