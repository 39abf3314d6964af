use std::collections::BTreeSet;
use std::env;
use std::fmt;

use crate::workflows::pipeline::domain::ActorRole;

const DEFAULT_HOOK_BUFFER: usize = 256;
const DEFAULT_PRIVILEGED_ROLES: &str = "admin,recruiter";

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let privileged_roles = parse_roles(
            &env::var("PIPELINE_PRIVILEGED_ROLES")
                .unwrap_or_else(|_| DEFAULT_PRIVILEGED_ROLES.to_string()),
        )?;

        let hook_buffer = match env::var("PIPELINE_HOOK_BUFFER") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .ok()
                .filter(|value| *value > 0)
                .ok_or(ConfigError::InvalidHookBuffer)?,
            Err(_) => DEFAULT_HOOK_BUFFER,
        };

        Ok(Self {
            environment,
            telemetry: TelemetryConfig { log_level },
            pipeline: PipelineConfig {
                privileged_roles,
                hook_buffer,
            },
        })
    }
}

fn parse_roles(raw: &str) -> Result<BTreeSet<ActorRole>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            ActorRole::parse(value).ok_or_else(|| ConfigError::UnknownRole {
                value: value.to_string(),
            })
        })
        .collect()
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Knobs for the transition engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Roles allowed to move candidates between stages. Super-admins are always allowed.
    pub privileged_roles: BTreeSet<ActorRole>,
    /// Capacity of the engagement-event channel.
    pub hook_buffer: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            privileged_roles: BTreeSet::from([ActorRole::Admin, ActorRole::Recruiter]),
            hook_buffer: DEFAULT_HOOK_BUFFER,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidHookBuffer,
    UnknownRole { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidHookBuffer => {
                write!(f, "PIPELINE_HOOK_BUFFER must be a positive integer")
            }
            ConfigError::UnknownRole { value } => {
                write!(f, "PIPELINE_PRIVILEGED_ROLES contains unknown role '{}'", value)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serializes tests that mutate process environment variables.
#[cfg(test)]
pub(crate) fn env_guard() -> &'static std::sync::Mutex<()> {
    static GUARD: std::sync::OnceLock<std::sync::Mutex<()>> = std::sync::OnceLock::new();
    GUARD.get_or_init(|| std::sync::Mutex::new(()))
}
