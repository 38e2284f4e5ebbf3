//! Resource DTOs exchanged with the manager API.
//!
//! Only the fields the console displays or sends are modelled.

use serde::{Deserialize, Serialize};

use crate::session::UserIdentity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Organization {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user: UserIdentity,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub url_slug: String,
    pub organization_id: i64,
    #[serde(default)]
    pub endpoints: Vec<Endpoint>,
}

impl Project {
    /// Public URL under which the mock engine serves this project.
    pub fn mock_url(&self, mock_base_url: &str) -> String {
        format!("{}/{}", mock_base_url.trim_end_matches('/'), self.url_slug)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: i64,
    pub method: String,
    pub path: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewOrganization {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewProject {
    pub name: String,
    pub url_slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewUser {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MockResponse {
    pub status_code: u16,
    pub body: String,
    pub delay_ms: u64,
    pub failure_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewEndpoint {
    pub method: String,
    pub path: String,
    pub description: String,
    pub response: MockResponse,
}

impl NewEndpoint {
    /// Endpoint with the console's defaults: no delay, no injected failures.
    pub fn new(method: &str, path: &str, status_code: u16, body: impl Into<String>) -> Self {
        Self {
            method: method.to_uppercase(),
            path: normalize_endpoint_path(path),
            description: "A new mock endpoint".to_string(),
            response: MockResponse {
                status_code,
                body: body.into(),
                delay_ms: 0,
                failure_rate: 0.0,
            },
        }
    }
}

/// Trims, forces a leading `/` and strips one trailing `/` (except for `/`).
pub fn normalize_endpoint_path(path: &str) -> String {
    let trimmed = path.trim();
    let mut clean = if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    };
    if clean.len() > 1 && clean.ends_with('/') {
        clean.pop();
    }
    clean
}
