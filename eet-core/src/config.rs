//! Configuration and environment selection.
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// Target registration service.
///
/// Envelopes are identical for both; only the endpoint differs. The
/// playground accepts the public test certificates, production requires a
/// certificate issued to the taxpayer.
///
/// ```rust
/// use eet_core::config::EnvironmentType;
///
/// let env: EnvironmentType = "Production".parse()?;
/// assert_eq!(env, EnvironmentType::Production);
/// # Ok::<(), eet_core::config::EnvironmentParseError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentType {
    #[default]
    Playground,
    Production,
}

/// Name and SOAP endpoint of each environment.
const ENVIRONMENTS: [(EnvironmentType, &str, &str); 2] = [
    (
        EnvironmentType::Playground,
        "playground",
        "https://pg.eet.cz:443/eet/services/EETServiceSOAP/v3",
    ),
    (
        EnvironmentType::Production,
        "production",
        "https://prod.eet.cz:443/eet/services/EETServiceSOAP/v3",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvironmentParseError {
    #[error("invalid environment type: {input} (expected playground or production)")]
    Invalid { input: String },
}

impl FromStr for EnvironmentType {
    type Err = EnvironmentParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        ENVIRONMENTS
            .iter()
            .find(|(_, name, _)| name.eq_ignore_ascii_case(input.trim()))
            .map(|&(env, _, _)| env)
            .ok_or_else(|| EnvironmentParseError::Invalid {
                input: input.to_string(),
            })
    }
}

impl EnvironmentType {
    fn entry(self) -> (&'static str, &'static str) {
        let (_, name, url) = ENVIRONMENTS[self as usize];
        (name, url)
    }

    pub fn as_str(&self) -> &'static str {
        self.entry().0
    }

    pub fn endpoint_url(&self) -> &'static str {
        self.entry().1
    }
}

/// Settings shared by envelope producers.
///
/// # Examples
/// ```rust
/// use eet_core::config::{Config, EnvironmentType};
///
/// let config = Config::new(EnvironmentType::Production);
/// assert!(config.endpoint_url().starts_with("https://prod.eet.cz"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    env: EnvironmentType,
}

impl Config {
    pub fn new(env: EnvironmentType) -> Self {
        Self { env }
    }

    pub fn env(&self) -> EnvironmentType {
        self.env
    }

    pub fn endpoint_url(&self) -> &'static str {
        self.env.endpoint_url()
    }
}
