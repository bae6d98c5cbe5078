//! Submission dispatcher. Formats a finished record for the configured
//! integration, sends it once, and folds every result into a
//! [`SubmissionOutcome`].

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::TransportError;
use crate::form::model::FormRecord;
use crate::form::validation::{RequiredFields, validate_record};

use super::format;
use super::mailer::{MailMessage, Mailer};
use super::outcome::SubmissionOutcome;
use super::target::{IntegrationTarget, PrepareError};
use super::transport::{Transport, TransportResponse};

/// Default bound on a single outbound request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Sends finished records to one integration target.
///
/// The primary send is awaited and decides the outcome. The optional email
/// notification runs on a detached task after an accepted primary send and
/// can only be logged, never surfaced.
pub struct Dispatcher {
    target: IntegrationTarget,
    transport: Arc<dyn Transport>,
    mailer: Option<Arc<dyn Mailer>>,
    notify_by_email: bool,
    rules: RequiredFields,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(target: IntegrationTarget, transport: Arc<dyn Transport>) -> Self {
        Self {
            target,
            transport,
            mailer: None,
            notify_by_email: false,
            rules: RequiredFields::standard(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Also email the agency inbox after an accepted HTTP submission.
    pub fn with_email_notification(mut self, enabled: bool) -> Self {
        self.notify_by_email = enabled;
        self
    }

    pub fn with_rules(mut self, rules: RequiredFields) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn target(&self) -> &IntegrationTarget {
        &self.target
    }

    pub fn rules(&self) -> &RequiredFields {
        &self.rules
    }

    /// Send `record` to the configured target.
    ///
    /// Never fails: invalid records, missing configuration, transport errors
    /// and downstream rejections all come back as an outcome.
    pub async fn submit(&self, record: FormRecord) -> SubmissionOutcome {
        let submission_id = Uuid::new_v4();
        let integration = self.target.name();

        if let Err(e) = validate_record(&record, &self.rules) {
            warn!(%submission_id, integration, error = %e, "Refusing to dispatch incomplete record");
            return SubmissionOutcome::Rejected {
                reason: e.to_string(),
            };
        }

        info!(%submission_id, integration, brand = %record.brand_name, "Dispatching onboarding submission");

        let outcome = if self.target.is_email() {
            self.send_email(&record).await
        } else {
            self.send_http(&record).await
        };

        match &outcome {
            SubmissionOutcome::Accepted { id } => {
                info!(%submission_id, integration, downstream_id = ?id, "Submission accepted");
            }
            SubmissionOutcome::Rejected { reason } => {
                warn!(%submission_id, integration, %reason, "Submission rejected");
            }
            SubmissionOutcome::TransportFailed { diagnostic } => {
                error!(%submission_id, integration, ?diagnostic, "Submission transport failed");
            }
        }

        if outcome.is_accepted() && self.notify_by_email && !self.target.is_email() {
            self.spawn_notification(submission_id, &record);
        }

        outcome
    }

    async fn send_http(&self, record: &FormRecord) -> SubmissionOutcome {
        let request = match self.target.http_request(record) {
            Some(Ok(request)) => request,
            Some(Err(PrepareError::Config(e))) => {
                error!(integration = self.target.name(), error = %e, "Integration is not configured");
                return SubmissionOutcome::TransportFailed {
                    diagnostic: Some(e.to_string()),
                };
            }
            Some(Err(PrepareError::Format(reason))) => {
                return SubmissionOutcome::Rejected { reason };
            }
            None => {
                return SubmissionOutcome::TransportFailed {
                    diagnostic: Some(format!("{} has no HTTP endpoint", self.target)),
                };
            }
        };

        let name = request.target;
        let result = tokio::time::timeout(self.timeout, self.transport.send(request)).await;
        match result {
            Err(_) => transport_failed(TransportError::Timeout {
                target: name.into(),
                timeout: self.timeout,
            }),
            Ok(Err(e)) => transport_failed(e),
            Ok(Ok(response)) => self.interpret(response),
        }
    }

    async fn send_email(&self, record: &FormRecord) -> SubmissionOutcome {
        let Some(mailer) = self.mailer.as_ref() else {
            return SubmissionOutcome::TransportFailed {
                diagnostic: Some("Email relay selected but no mailer is configured".into()),
            };
        };

        let message = onboarding_email(record);
        match tokio::time::timeout(self.timeout, mailer.send(message)).await {
            Err(_) => transport_failed(TransportError::Timeout {
                target: "email".into(),
                timeout: self.timeout,
            }),
            Ok(Err(e)) => transport_failed(e),
            Ok(Ok(())) => SubmissionOutcome::Accepted { id: None },
        }
    }

    fn interpret(&self, response: TransportResponse) -> SubmissionOutcome {
        let body = response.json();

        if response.is_success() {
            let id = body.as_ref().and_then(|b| self.target.extract_id(b));
            return SubmissionOutcome::Accepted { id };
        }

        warn!(
            integration = self.target.name(),
            status = response.status,
            body = %response.body,
            "Downstream returned an error"
        );
        let reason = body
            .as_ref()
            .and_then(|b| self.target.extract_reason(b))
            .unwrap_or_else(|| {
                format!(
                    "{} rejected the submission (status {})",
                    self.target, response.status
                )
            });
        SubmissionOutcome::Rejected { reason }
    }

    fn spawn_notification(&self, submission_id: Uuid, record: &FormRecord) {
        let Some(mailer) = self.mailer.clone() else {
            warn!(%submission_id, "Email notification enabled but no mailer is configured");
            return;
        };
        let message = onboarding_email(record);
        let timeout = self.timeout;

        tokio::spawn(async move {
            match tokio::time::timeout(timeout, mailer.send(message)).await {
                Ok(Ok(())) => info!(%submission_id, "Notification email sent"),
                Ok(Err(e)) => warn!(%submission_id, error = %e, "Notification email failed"),
                Err(_) => warn!(%submission_id, ?timeout, "Notification email timed out"),
            }
        });
    }
}

fn onboarding_email(record: &FormRecord) -> MailMessage {
    MailMessage {
        subject: format::email_subject(record),
        body: format::email_body(record),
    }
}

fn transport_failed(err: TransportError) -> SubmissionOutcome {
    SubmissionOutcome::TransportFailed {
        diagnostic: Some(err.to_string()),
    }
}
