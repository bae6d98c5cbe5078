//! Submission dispatch: turns a finished onboarding record into one
//! delivery to ClickUp, HubSpot, a spreadsheet script, or email.

pub mod dispatcher;
pub mod format;
pub mod mailer;
pub mod outcome;
pub mod target;
pub mod transport;

pub use dispatcher::{DEFAULT_TIMEOUT, Dispatcher};
pub use format::{FieldMap, NOT_SPECIFIED, StructuredPayload};
pub use mailer::{EmailConfig, MailMessage, Mailer, SmtpMailer};
pub use outcome::{GENERIC_FAILURE_MESSAGE, SUCCESS_MESSAGE, SubmissionOutcome};
pub use target::{CrmFormConfig, IntegrationTarget, SpreadsheetConfig, TaskTrackerConfig};
pub use transport::{HttpTransport, OutboundRequest, RequestBody, Transport, TransportResponse};
