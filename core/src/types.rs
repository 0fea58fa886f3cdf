//! Response shapes used by the practice calls.
//!
//! # Design
//! These are consumer-side decode targets, not part of the client itself.
//! They mirror the public echo service and the mock user API but are defined
//! independently of the mock-server crate; the integration tests catch any
//! drift between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The only field the simple GET call cares about.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HttpBinResponse {
    pub url: String,
}

/// Echo of a request as returned by the `/get`, `/headers` and `/post`
/// endpoints. Fields an endpoint does not report stay empty.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpBinEcho {
    pub args: BTreeMap<String, String>,
    pub headers: BTreeMap<String, String>,
    pub url: String,
    pub data: String,
    pub form: BTreeMap<String, String>,
    pub files: BTreeMap<String, String>,
    pub json: Option<serde_json::Value>,
}

impl HttpBinEcho {
    /// Header lookup ignoring case; the echo service title-cases names.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A user record held by the mock user API.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct UserContent {
    pub id: String,
    pub name: String,
    pub avatar: String,
}
