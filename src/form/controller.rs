//! WizardController: step sequencing, field edits, and the submit guard.
//!
//! The controller never performs I/O itself. `confirm` is split into
//! [`WizardController::begin_submit`] and [`WizardController::finish_submit`]
//! so a caller holding the controller behind a lock can release it while the
//! dispatch is awaited; the `Submitting` state is the in-flight guard.

use serde::Serialize;

use crate::dispatch::{Dispatcher, SubmissionOutcome};
use crate::error::WizardError;

use super::model::{FieldName, FormRecord, ToggleItem};
use super::state::{TOTAL_STEPS, WizardState, WizardStep};
use super::validation::{RequiredFields, step_errors, validate_record, validate_step};

/// Serializable view of a wizard for the UI layer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardSnapshot {
    pub state: WizardState,
    pub step: Option<u8>,
    pub step_label: Option<&'static str>,
    pub total_steps: u8,
    pub progress_percent: u8,
    pub current_step_valid: bool,
    /// Unmet rules on the current step, as display text.
    pub errors: Vec<String>,
    pub record: FormRecord,
    /// User-facing message after the last submission attempt.
    pub message: Option<&'static str>,
}

/// Drives one onboarding pass through the five steps.
#[derive(Debug, Clone)]
pub struct WizardController {
    state: WizardState,
    record: FormRecord,
    rules: RequiredFields,
    last_outcome: Option<SubmissionOutcome>,
}

impl Default for WizardController {
    fn default() -> Self {
        Self::new(RequiredFields::standard())
    }
}

impl WizardController {
    /// Start at step 1 with an empty record.
    pub fn new(rules: RequiredFields) -> Self {
        Self {
            state: WizardState::default(),
            record: FormRecord::new(),
            rules,
            last_outcome: None,
        }
    }

    pub fn state(&self) -> WizardState {
        self.state
    }

    pub fn record(&self) -> &FormRecord {
        &self.record
    }

    pub fn rules(&self) -> &RequiredFields {
        &self.rules
    }

    pub fn last_outcome(&self) -> Option<&SubmissionOutcome> {
        self.last_outcome.as_ref()
    }

    /// Whether the step on screen currently passes validation.
    pub fn current_step_valid(&self) -> bool {
        match self.state.step() {
            Some(step) => validate_step(step, &self.record, &self.rules).is_ok(),
            None => false,
        }
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        let step = self.state.step();
        let errors = step
            .map(|s| step_errors(s, &self.record, &self.rules))
            .unwrap_or_default()
            .iter()
            .map(ToString::to_string)
            .collect();
        let progress_percent = match self.state {
            WizardState::Submitting | WizardState::Submitted => 100,
            _ => step.map(WizardStep::progress_percent).unwrap_or(0),
        };

        WizardSnapshot {
            state: self.state,
            step: step.map(WizardStep::number),
            step_label: step.map(WizardStep::label),
            total_steps: TOTAL_STEPS,
            progress_percent,
            current_step_valid: self.current_step_valid(),
            errors,
            record: self.record.clone(),
            message: self.last_outcome.as_ref().map(SubmissionOutcome::user_message),
        }
    }

    /// Overwrite one field. Allowed on any step and after a failed submit.
    pub fn set_field(
        &mut self,
        field: FieldName,
        value: impl Into<String>,
    ) -> Result<(), WizardError> {
        self.ensure_editable("edit")?;
        self.record = self.record.with_field(field, value);
        Ok(())
    }

    /// Add or remove an objective or platform.
    pub fn toggle(&mut self, item: ToggleItem) -> Result<(), WizardError> {
        self.ensure_editable("toggle")?;
        self.record = self.record.toggle(item);
        Ok(())
    }

    /// Advance one step. Leaves the state untouched when the current step
    /// is incomplete.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let WizardState::Step(step) = self.state else {
            return Err(self.invalid("advance"));
        };
        let Some(next) = step.next() else {
            return Err(self.invalid("advance"));
        };
        validate_step(step, &self.record, &self.rules)?;
        self.state = WizardState::Step(next);
        Ok(next)
    }

    /// Go back one step. Never validates. From `Failed` this returns to the
    /// step before the closing one.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        let prev = match self.state {
            WizardState::Step(step) => step.prev(),
            WizardState::Failed => WizardStep::Closeout.prev(),
            WizardState::Submitting | WizardState::Submitted => None,
        };
        let Some(prev) = prev else {
            return Err(self.invalid("go back"));
        };
        self.state = WizardState::Step(prev);
        Ok(prev)
    }

    /// Enter `Submitting` and hand out the record to dispatch.
    ///
    /// Permitted from the closing step or after a failed attempt, and only
    /// when every step validates. A second call before
    /// [`finish_submit`](Self::finish_submit) is refused.
    pub fn begin_submit(&mut self) -> Result<FormRecord, WizardError> {
        match self.state {
            WizardState::Submitting => return Err(WizardError::SubmissionInFlight),
            WizardState::Submitted => return Err(WizardError::AlreadySubmitted),
            WizardState::Step(WizardStep::Closeout) | WizardState::Failed => {}
            WizardState::Step(_) => return Err(self.invalid("confirm")),
        }
        validate_record(&self.record, &self.rules)?;
        self.state = WizardState::Submitting;
        Ok(self.record.clone())
    }

    /// Record the dispatch result. Success clears the record; any failure
    /// keeps it so the user can retry.
    pub fn finish_submit(&mut self, outcome: &SubmissionOutcome) {
        if self.state != WizardState::Submitting {
            tracing::warn!(state = %self.state, "finish_submit called with no submission in flight");
            return;
        }
        if outcome.is_accepted() {
            self.state = WizardState::Submitted;
            self.record = FormRecord::new();
        } else {
            self.state = WizardState::Failed;
        }
        self.last_outcome = Some(outcome.clone());
    }

    /// Submit through `dispatcher` and apply the result.
    pub async fn confirm(
        &mut self,
        dispatcher: &Dispatcher,
    ) -> Result<SubmissionOutcome, WizardError> {
        let record = self.begin_submit()?;
        let outcome = dispatcher.submit(record).await;
        self.finish_submit(&outcome);
        Ok(outcome)
    }

    fn ensure_editable(&self, action: &str) -> Result<(), WizardError> {
        if self.state.is_editable() {
            Ok(())
        } else {
            Err(self.invalid(action))
        }
    }

    fn invalid(&self, action: &str) -> WizardError {
        WizardError::InvalidAction {
            state: self.state.to_string(),
            action: action.to_string(),
        }
    }
}
