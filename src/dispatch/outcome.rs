//! Result of one dispatch attempt.

/// Message shown to the client for any failed submission. Downstream and
/// configuration details stay in the logs.
pub const GENERIC_FAILURE_MESSAGE: &str =
    "No pudimos enviar el formulario. Intenta de nuevo más tarde.";

/// Message shown to the client once the submission is accepted.
pub const SUCCESS_MESSAGE: &str = "¡Listo! Hemos recibido tu información. Nos pondremos en \
contacto contigo en las próximas 24-48 horas para nuestra reunión de kickoff.";

/// Tagged result of a single `submit` call.
///
/// `reason` and `diagnostic` are operator-facing; use [`user_message`] for
/// anything shown to the client.
///
/// [`user_message`]: SubmissionOutcome::user_message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The downstream system took the submission.
    Accepted { id: Option<String> },
    /// The downstream system answered with a non-success status, or the
    /// record could not be formatted.
    Rejected { reason: String },
    /// No usable response: network error, timeout, or missing configuration.
    TransportFailed { diagnostic: Option<String> },
}

impl SubmissionOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }

    /// Downstream-issued identifier, when the submission was accepted with one.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Accepted { id } => id.as_deref(),
            _ => None,
        }
    }

    pub fn user_message(&self) -> &'static str {
        if self.is_accepted() {
            SUCCESS_MESSAGE
        } else {
            GENERIC_FAILURE_MESSAGE
        }
    }

    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Accepted { .. } => "accepted",
            Self::Rejected { .. } => "rejected",
            Self::TransportFailed { .. } => "transport_failed",
        }
    }
}
