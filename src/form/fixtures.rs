//! Shared records for unit tests.

use super::model::{FieldName, FormRecord, Objective, ToggleItem};

/// A record that satisfies the standard rules on every step.
pub(crate) fn complete_record() -> FormRecord {
    use FieldName::*;
    let mut record = FormRecord::new();
    for (field, value) in [
        (FullName, "Ana Pérez"),
        (Role, "CEO"),
        (Email, "ana@x.com"),
        (Phone, "8090000000"),
        (BrandName, "Acme"),
        (Description, "Tienda de café"),
        (MissionVisionValues, "Café justo"),
        (Differentiator, "Tostado local"),
        (Personality, "Cercana"),
        (Competitors, "Cafetería Central"),
        (IdealCustomer, "Profesionales jóvenes"),
        (AdsBudget, "500"),
        (SocialAccountsExist, "si"),
        (BusinessHours, "9-5"),
        (ApprovalContact, "Ana"),
    ] {
        record.set_field(field, value);
    }
    record.toggle(ToggleItem::Objective(Objective::Sales))
}
