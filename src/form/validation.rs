//! Per-step completion rules.
//!
//! Which fields are mandatory is configuration: the same checks serve the
//! lenient and the strict form by swapping the [`RequiredFields`] set.
//! Two rules are not configurable: at least one objective must be chosen,
//! and choosing "Other" requires a description.

use std::collections::HashSet;

use crate::error::ValidationError;

use super::model::{FieldName, FormRecord, Objective, Platform};
use super::state::WizardStep;

/// The set of fields that must be non-blank before leaving their step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequiredFields {
    fields: HashSet<FieldName>,
    platform_credentials: bool,
}

impl RequiredFields {
    /// The canonical set, matching the required markers of the web form.
    pub fn standard() -> Self {
        use FieldName::*;
        Self {
            fields: [
                FullName,
                Role,
                Email,
                Phone,
                BrandName,
                Description,
                MissionVisionValues,
                Differentiator,
                Personality,
                Competitors,
                IdealCustomer,
                AdsBudget,
                SocialAccountsExist,
                BusinessHours,
                ApprovalContact,
            ]
            .into_iter()
            .collect(),
            platform_credentials: false,
        }
    }

    /// Standard plus address, customer channel, and credentials for every
    /// selected platform.
    pub fn strict() -> Self {
        Self::standard()
            .with_required(FieldName::Address)
            .with_required(FieldName::CustomerContact)
            .with_platform_credentials(true)
    }

    pub fn with_required(mut self, field: FieldName) -> Self {
        self.fields.insert(field);
        self
    }

    pub fn without(mut self, field: FieldName) -> Self {
        self.fields.remove(&field);
        self
    }

    /// Require an (identifier, secret) pair for each selected platform.
    pub fn with_platform_credentials(mut self, required: bool) -> Self {
        self.platform_credentials = required;
        self
    }

    pub fn is_required(&self, field: FieldName) -> bool {
        self.fields.contains(&field)
    }

    pub fn requires_platform_credentials(&self) -> bool {
        self.platform_credentials
    }
}

impl Default for RequiredFields {
    fn default() -> Self {
        Self::standard()
    }
}

/// Every unmet rule for `step`, in display order. Empty when the step is
/// complete.
pub fn step_errors(
    step: WizardStep,
    record: &FormRecord,
    rules: &RequiredFields,
) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if step == WizardStep::Strategy {
        if record.objectives.is_empty() {
            errors.push(ValidationError::NoObjectives);
        }
        if record.has_objective(Objective::Other) && !record.is_filled(FieldName::OtherObjective)
        {
            errors.push(ValidationError::OtherObjectiveUnspecified);
        }
    }

    errors.extend(
        FieldName::ALL
            .into_iter()
            .filter(|field| field.step() == step)
            .filter(|field| rules.is_required(*field) && !record.is_filled(*field))
            .map(|field| ValidationError::MissingField { step, field }),
    );

    if step == WizardStep::DigitalEcosystem && rules.requires_platform_credentials() {
        errors.extend(
            Platform::ALL
                .into_iter()
                .filter(|p| record.has_platform(*p))
                .filter(|p| {
                    let (id, secret) = record.credentials(*p);
                    id.trim().is_empty() || secret.trim().is_empty()
                })
                .map(|platform| ValidationError::MissingCredentials { platform }),
        );
    }

    errors
}

/// Check one step, reporting the first unmet rule.
pub fn validate_step(
    step: WizardStep,
    record: &FormRecord,
    rules: &RequiredFields,
) -> Result<(), ValidationError> {
    match step_errors(step, record, rules).into_iter().next() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Check every step in order.
pub fn validate_record(record: &FormRecord, rules: &RequiredFields) -> Result<(), ValidationError> {
    WizardStep::ALL
        .into_iter()
        .try_for_each(|step| validate_step(step, record, rules))
}

/// Whether `step` is complete under the standard rules.
pub fn validate(step: WizardStep, record: &FormRecord) -> bool {
    validate_step(step, record, &RequiredFields::standard()).is_ok()
}
