//! The onboarding wizard: five ordered steps over one [`FormRecord`].
//!
//! Steps gate forward navigation on their own completion rules. The final
//! confirmation hands the record to the dispatcher exactly once; a failure
//! keeps the data for a manual retry.

pub mod controller;
pub mod model;
pub mod session;
pub mod state;
pub mod validation;

#[cfg(test)]
pub(crate) mod fixtures;

pub use controller::{WizardController, WizardSnapshot};
pub use model::{FieldName, FormRecord, Objective, Platform, ToggleItem};
pub use session::{SessionStore, WizardSession, spawn_expiry_task};
pub use state::{TOTAL_STEPS, WizardState, WizardStep};
pub use validation::{RequiredFields, validate, validate_record, validate_step};
