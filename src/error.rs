//! Error types for the onboarding service.

use std::time::Duration;

use crate::form::model::{FieldName, Platform};
use crate::form::state::WizardStep;

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Outbound request errors (HTTP or SMTP).
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Request to {target} failed: {reason}")]
    RequestFailed { target: String, reason: String },

    #[error("Request to {target} timed out after {timeout:?}")]
    Timeout { target: String, timeout: Duration },

    #[error("Failed to send message via {target}: {reason}")]
    SendFailed { target: String, reason: String },

    #[error("Integration not configured: {0}")]
    NotConfigured(#[from] ConfigError),
}

/// A per-step completion rule that is not met.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Step {step}: required field '{field}' is empty")]
    MissingField { step: WizardStep, field: FieldName },

    #[error("At least one objective must be selected")]
    NoObjectives,

    #[error("The 'Other' objective needs a description")]
    OtherObjectiveUnspecified,

    #[error("Credentials for {platform} are incomplete")]
    MissingCredentials { platform: Platform },
}

/// Wizard controller errors. Never reach the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot {action} while in state {state}")]
    InvalidAction { state: String, action: String },

    #[error("A submission is already in flight")]
    SubmissionInFlight,

    #[error("The onboarding form was already submitted")]
    AlreadySubmitted,
}
