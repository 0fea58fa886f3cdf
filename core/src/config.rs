//! Client-wide configuration.
//!
//! Session-level settings applied to every request unless the descriptor
//! overrides them. Hosts can embed `ClientConfig` in their own configuration
//! files; every field has a default.

use std::ops::Range;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ClientError;
use crate::http::{Headers, HttpResponse};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_MAX_BODY_SIZE: u64 = 10 * 1024 * 1024;

/// Status code policy. Responses are accepted as-is unless validation is
/// switched on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Validation {
    #[default]
    Disabled,
    Range(Range<u16>),
}

impl Validation {
    /// Accept only `200..300`.
    pub fn successful() -> Self {
        Validation::Range(200..300)
    }

    pub fn accepts(&self, status: u16) -> bool {
        match self {
            Validation::Disabled => true,
            Validation::Range(range) => range.contains(&status),
        }
    }

    pub fn check(&self, response: &HttpResponse) -> Result<(), ClientError> {
        if self.accepts(response.status) {
            return Ok(());
        }
        Err(ClientError::Status {
            status: response.status,
            body: response.body.clone(),
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whole-request deadline in milliseconds.
    #[serde(rename = "timeout_ms", with = "millis")]
    pub timeout: Option<Duration>,
    pub validation: Validation,
    /// Sent with every request; per-request headers win on conflict.
    #[serde(with = "header_map")]
    pub default_headers: Headers,
    pub user_agent: Option<String>,
    /// Cap for bodies buffered in memory. Downloads to a file are not capped.
    pub max_body_size: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Some(DEFAULT_TIMEOUT),
            validation: Validation::Disabled,
            default_headers: Headers::new(),
            user_agent: None,
            max_body_size: DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ClientConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn with_default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers.set(name, value);
        self
    }

    pub fn with_user_agent(mut self, user_agent: &str) -> Self {
        self.user_agent = Some(user_agent.to_string());
        self
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}

mod header_map {
    use std::collections::BTreeMap;

    use serde::{Deserialize, Deserializer};

    use crate::http::Headers;

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Headers, D::Error> {
        Ok(BTreeMap::<String, String>::deserialize(d)?.into_iter().collect())
    }
}
