//! Service configuration, read from the environment at startup.
//!
//! Integration credentials may be missing here; the dispatcher reports that
//! at submit time. Malformed values fail startup.

use std::time::Duration;

use secrecy::SecretString;

use crate::dispatch::{
    CrmFormConfig, EmailConfig, IntegrationTarget, SpreadsheetConfig, TaskTrackerConfig,
};
use crate::error::ConfigError;
use crate::form::RequiredFields;

/// Everything the server binary needs.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub target: IntegrationTarget,
    pub email: EmailConfig,
    /// Also email the agency after an accepted HTTP submission.
    pub notify_by_email: bool,
    pub http_timeout: Duration,
    pub strict_validation: bool,
    /// Idle wizard sessions are dropped after this long.
    pub session_ttl: Duration,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            target: IntegrationTarget::TaskTracker(TaskTrackerConfig::default()),
            email: EmailConfig::default(),
            notify_by_email: false,
            http_timeout: Duration::from_secs(15),
            strict_validation: false,
            session_ttl: Duration::from_secs(60 * 60),
            port: 8080,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let target = match get("ONBOARDING_TARGET")
            .map(|v| v.trim().to_lowercase())
            .as_deref()
        {
            None | Some("clickup") => IntegrationTarget::TaskTracker(TaskTrackerConfig {
                api_base: get("CLICKUP_API_BASE")
                    .unwrap_or_else(|| TaskTrackerConfig::default().api_base),
                list_id: get("CLICKUP_LIST_ID"),
                api_key: get("CLICKUP_API_KEY").map(SecretString::from),
            }),
            Some("hubspot") => IntegrationTarget::CrmForm(CrmFormConfig {
                api_base: get("HUBSPOT_API_BASE")
                    .unwrap_or_else(|| CrmFormConfig::default().api_base),
                portal_id: get("HUBSPOT_PORTAL_ID"),
                form_id: get("HUBSPOT_FORM_ID"),
                page_uri: get("HUBSPOT_PAGE_URI"),
                page_name: get("HUBSPOT_PAGE_NAME"),
                ..CrmFormConfig::default()
            }),
            Some("sheets") => IntegrationTarget::Spreadsheet(SpreadsheetConfig {
                script_url: get("SHEETS_SCRIPT_URL"),
            }),
            Some("email") => IntegrationTarget::EmailRelay,
            Some(other) => {
                return Err(ConfigError::InvalidValue {
                    key: "ONBOARDING_TARGET".into(),
                    message: format!("unknown target '{other}' (expected clickup, hubspot, sheets or email)"),
                });
            }
        };

        let email_defaults = EmailConfig::default();
        let email = EmailConfig {
            smtp_host: get("EMAIL_SMTP_HOST").unwrap_or(email_defaults.smtp_host),
            smtp_port: parse_or("EMAIL_SMTP_PORT", get("EMAIL_SMTP_PORT"), email_defaults.smtp_port)?,
            username: get("EMAIL_USER"),
            password: get("EMAIL_PASS").map(SecretString::from),
            to: get("EMAIL_TO"),
            from_name: get("EMAIL_FROM_NAME").unwrap_or(email_defaults.from_name),
        };

        let timeout_secs: u64 = parse_or(
            "ONBOARDING_HTTP_TIMEOUT_SECS",
            get("ONBOARDING_HTTP_TIMEOUT_SECS"),
            defaults.http_timeout.as_secs(),
        )?;
        if !(1..=120).contains(&timeout_secs) {
            return Err(ConfigError::InvalidValue {
                key: "ONBOARDING_HTTP_TIMEOUT_SECS".into(),
                message: format!("{timeout_secs} is outside 1..=120"),
            });
        }

        let ttl_mins: u64 = parse_or(
            "ONBOARDING_SESSION_TTL_MINS",
            get("ONBOARDING_SESSION_TTL_MINS"),
            defaults.session_ttl.as_secs() / 60,
        )?;
        if !(1..=24 * 60).contains(&ttl_mins) {
            return Err(ConfigError::InvalidValue {
                key: "ONBOARDING_SESSION_TTL_MINS".into(),
                message: format!("{ttl_mins} is outside 1..=1440"),
            });
        }

        Ok(Self {
            target,
            email,
            notify_by_email: parse_bool("ONBOARDING_NOTIFY_EMAIL", get("ONBOARDING_NOTIFY_EMAIL"))?,
            http_timeout: Duration::from_secs(timeout_secs),
            strict_validation: parse_bool(
                "ONBOARDING_STRICT_VALIDATION",
                get("ONBOARDING_STRICT_VALIDATION"),
            )?,
            session_ttl: Duration::from_secs(ttl_mins * 60),
            port: parse_or("ONBOARDING_PORT", get("ONBOARDING_PORT"), defaults.port)?,
        })
    }

    /// The required-field set selected by `ONBOARDING_STRICT_VALIDATION`.
    pub fn required_fields(&self) -> RequiredFields {
        if self.strict_validation {
            RequiredFields::strict()
        } else {
            RequiredFields::standard()
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(v) => v.trim().parse().map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{v}': {e}"),
        }),
    }
}

fn parse_bool(key: &str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(v) = raw else {
        return Ok(false);
    };
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            message: format!("'{v}' is not a boolean"),
        }),
    }
}
