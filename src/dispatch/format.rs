//! Turning a [`FormRecord`] into downstream payloads.
//!
//! Two families:
//! - structured fields: a few named fields plus one free-text block holding
//!   everything else, in a fixed section order;
//! - whole-record: the record serialized verbatim as JSON text.

use crate::form::model::{FieldName, FormRecord, Platform};

/// Rendered in place of an empty value so every block has the same shape.
pub const NOT_SPECIFIED: &str = "No especificado";

/// One line of the free-text block.
enum Entry {
    Field(&'static str, FieldName),
    Objectives,
    Platforms,
    Credentials(Platform),
}

use Entry::{Credentials, Field, Objectives, Platforms};

const LAYOUT: &[(&str, &[Entry])] = &[
    (
        "DATOS DE CONTACTO",
        &[
            Field("Nombre", FieldName::FullName),
            Field("Cargo", FieldName::Role),
            Field("Email", FieldName::Email),
            Field("Teléfono", FieldName::Phone),
        ],
    ),
    (
        "MARCA",
        &[
            Field("Nombre de la marca", FieldName::BrandName),
            Field("Descripción", FieldName::Description),
            Field("Misión / Visión / Valores", FieldName::MissionVisionValues),
            Field("Diferenciador", FieldName::Differentiator),
            Field("Personalidad", FieldName::Personality),
            Field("Competidores", FieldName::Competitors),
        ],
    ),
    (
        "OBJETIVOS",
        &[
            Objectives,
            Field("Otro objetivo", FieldName::OtherObjective),
            Field("Cliente ideal", FieldName::IdealCustomer),
            Field("Presupuesto Ads", FieldName::AdsBudget),
            Field("Material gráfico", FieldName::CreativeAssetsLink),
        ],
    ),
    (
        "REDES",
        &[
            Field("Redes creadas", FieldName::SocialAccountsExist),
            Platforms,
            Credentials(Platform::Instagram),
            Credentials(Platform::Facebook),
            Credentials(Platform::LinkedIn),
        ],
    ),
    (
        "OPERACIÓN",
        &[
            Field("Horario", FieldName::BusinessHours),
            Field("Dirección", FieldName::Address),
            Field("WhatsApp clientes", FieldName::CustomerContact),
        ],
    ),
    (
        "CIERRE",
        &[
            Field("Contacto aprobación", FieldName::ApprovalContact),
            Field("Comentarios", FieldName::Comments),
        ],
    ),
];

/// Internal field → downstream field name, plus the name of the field that
/// receives the free-text block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMap {
    pub entries: Vec<(FieldName, String)>,
    pub message_field: String,
}

impl FieldMap {
    pub fn new(message_field: impl Into<String>) -> Self {
        Self {
            entries: Vec::new(),
            message_field: message_field.into(),
        }
    }

    pub fn map(mut self, field: FieldName, downstream: impl Into<String>) -> Self {
        self.entries.push((field, downstream.into()));
        self
    }

    pub fn contains(&self, field: FieldName) -> bool {
        self.entries.iter().any(|(f, _)| *f == field)
    }
}

impl Default for FieldMap {
    /// The CRM contact properties used by the agency's form.
    fn default() -> Self {
        Self::new("message")
            .map(FieldName::FullName, "firstname")
            .map(FieldName::Role, "lastname")
            .map(FieldName::Email, "email")
            .map(FieldName::Phone, "phone")
            .map(FieldName::BrandName, "company")
    }
}

/// Output of the structured-field formatter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredPayload {
    /// (downstream name, value) in field-map order.
    pub fields: Vec<(String, String)>,
    /// Everything not mapped to a named field.
    pub message: String,
}

impl StructuredPayload {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

/// Map the record onto `map`'s named fields and render the rest as a block.
pub fn structured_fields(record: &FormRecord, map: &FieldMap) -> StructuredPayload {
    let fields = map
        .entries
        .iter()
        .map(|(field, name)| (name.clone(), record.value(*field).trim().to_string()))
        .collect();
    let excluded: Vec<FieldName> = map.entries.iter().map(|(f, _)| *f).collect();

    StructuredPayload {
        fields,
        message: free_text_block(record, &excluded),
    }
}

/// Render every field not in `exclude` as `Label: value` lines under
/// section headers. Sections left with no lines are skipped.
pub fn free_text_block(record: &FormRecord, exclude: &[FieldName]) -> String {
    let mut sections = Vec::new();

    for (title, entries) in LAYOUT {
        let lines: Vec<String> = entries
            .iter()
            .filter_map(|entry| render_entry(record, entry, exclude))
            .collect();
        if !lines.is_empty() {
            sections.push(format!("{title}\n{}", lines.join("\n")));
        }
    }

    sections.join("\n\n")
}

/// The whole record as pretty-printed JSON.
pub fn whole_record(record: &FormRecord) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(record)
}

/// Plain-text email body: a banner plus the full block.
pub fn email_body(record: &FormRecord) -> String {
    format!(
        "NUEVO ONBOARDING – SWIPE\n\n{}",
        free_text_block(record, &[])
    )
}

/// Subject line for onboarding emails.
pub fn email_subject(record: &FormRecord) -> String {
    format!("🆕 Nuevo Onboarding – {}", or_placeholder(&record.brand_name))
}

/// Title for task-tracker tasks.
pub fn task_title(record: &FormRecord) -> String {
    let brand = record.brand_name.trim();
    let brand = if brand.is_empty() { "Nueva Marca" } else { brand };
    format!("🧾 Onboarding - {brand}")
}

fn render_entry(record: &FormRecord, entry: &Entry, exclude: &[FieldName]) -> Option<String> {
    match entry {
        Field(label, field) => {
            if exclude.contains(field) {
                return None;
            }
            Some(format!("{label}: {}", display_value(record, *field)))
        }
        Objectives => {
            let list: Vec<String> = record.objectives.iter().map(|o| o.to_string()).collect();
            Some(format!("Objetivos: {}", or_placeholder(&list.join(", "))))
        }
        Platforms => {
            let list: Vec<String> = record.platforms.iter().map(|p| p.to_string()).collect();
            Some(format!("Plataformas: {}", or_placeholder(&list.join(", "))))
        }
        Credentials(platform) => {
            let (id_field, secret_field) = platform.credential_fields();
            if exclude.contains(&id_field) && exclude.contains(&secret_field) {
                return None;
            }
            if !record.has_platform(*platform) {
                return Some(format!("{platform}: {NOT_SPECIFIED}"));
            }
            let (id, secret) = record.credentials(*platform);
            Some(format!(
                "{platform}: {} / Pass: {}",
                or_placeholder(id),
                or_placeholder(secret)
            ))
        }
    }
}

fn display_value(record: &FormRecord, field: FieldName) -> String {
    if field == FieldName::SocialAccountsExist {
        return match record.social_accounts_exist {
            Some(true) => "Sí".to_string(),
            Some(false) => "No".to_string(),
            None => NOT_SPECIFIED.to_string(),
        };
    }
    or_placeholder(record.value(field)).to_string()
}

fn or_placeholder(value: &str) -> &str {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        NOT_SPECIFIED
    } else {
        trimmed
    }
}
