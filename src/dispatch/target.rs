//! Downstream integrations and how each one wants the record shaped.

use secrecy::SecretString;
use serde_json::{Value, json};

use crate::error::ConfigError;
use crate::form::model::FormRecord;

use super::format::{self, FieldMap};
use super::transport::{OutboundRequest, RequestBody};

/// Task-tracker (ClickUp) list integration. Whole-record payload.
#[derive(Debug, Clone)]
pub struct TaskTrackerConfig {
    pub api_base: String,
    pub list_id: Option<String>,
    pub api_key: Option<SecretString>,
}

impl Default for TaskTrackerConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.clickup.com/api/v2".to_string(),
            list_id: None,
            api_key: None,
        }
    }
}

/// CRM forms (HubSpot) integration. Structured-field payload.
#[derive(Debug, Clone)]
pub struct CrmFormConfig {
    pub api_base: String,
    pub portal_id: Option<String>,
    pub form_id: Option<String>,
    pub field_map: FieldMap,
    pub page_uri: Option<String>,
    pub page_name: Option<String>,
}

impl Default for CrmFormConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.hsforms.com".to_string(),
            portal_id: None,
            form_id: None,
            field_map: FieldMap::default(),
            page_uri: None,
            page_name: None,
        }
    }
}

/// Spreadsheet-backed script endpoint. Whole-record payload as plain text.
#[derive(Debug, Clone, Default)]
pub struct SpreadsheetConfig {
    pub script_url: Option<String>,
}

/// Which downstream system receives submissions.
#[derive(Debug, Clone)]
pub enum IntegrationTarget {
    TaskTracker(TaskTrackerConfig),
    CrmForm(CrmFormConfig),
    Spreadsheet(SpreadsheetConfig),
    /// Sent through the dispatcher's mailer; SMTP settings live there.
    EmailRelay,
}

/// Why a request could not be built.
#[derive(Debug)]
pub enum PrepareError {
    Config(ConfigError),
    Format(String),
}

impl From<ConfigError> for PrepareError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

impl IntegrationTarget {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TaskTracker(_) => "clickup",
            Self::CrmForm(_) => "hubspot",
            Self::Spreadsheet(_) => "sheets",
            Self::EmailRelay => "email",
        }
    }

    pub fn is_email(&self) -> bool {
        matches!(self, Self::EmailRelay)
    }

    /// Build the HTTP request for `record`. `None` for the email relay.
    pub fn http_request(&self, record: &FormRecord) -> Option<Result<OutboundRequest, PrepareError>> {
        match self {
            Self::TaskTracker(config) => Some(task_tracker_request(config, record)),
            Self::CrmForm(config) => Some(crm_form_request(config, record)),
            Self::Spreadsheet(config) => Some(spreadsheet_request(config, record)),
            Self::EmailRelay => None,
        }
    }

    /// Identifier issued by the downstream system in a success body.
    pub fn extract_id(&self, body: &Value) -> Option<String> {
        let keys: &[&str] = match self {
            Self::TaskTracker(_) | Self::CrmForm(_) => &["id"],
            Self::Spreadsheet(_) => &["id", "row"],
            Self::EmailRelay => &[],
        };
        first_scalar(body, keys)
    }

    /// Reason given by the downstream system in a rejection body.
    pub fn extract_reason(&self, body: &Value) -> Option<String> {
        let keys: &[&str] = match self {
            Self::TaskTracker(_) => &["err", "error"],
            Self::CrmForm(_) => &["message", "error"],
            Self::Spreadsheet(_) => &["error", "message"],
            Self::EmailRelay => &[],
        };
        first_scalar(body, keys)
    }
}

impl std::fmt::Display for IntegrationTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn task_tracker_request(
    config: &TaskTrackerConfig,
    record: &FormRecord,
) -> Result<OutboundRequest, PrepareError> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| missing("CLICKUP_API_KEY", "ClickUp personal API token."))?;
    let list_id = non_blank(config.list_id.as_deref())
        .ok_or_else(|| missing("CLICKUP_LIST_ID", "ClickUp list that receives onboarding tasks."))?;

    let record_json = format::whole_record(record).map_err(|e| PrepareError::Format(e.to_string()))?;

    Ok(OutboundRequest {
        target: "clickup",
        url: format!("{}/list/{list_id}/task", config.api_base.trim_end_matches('/')),
        authorization: Some(api_key),
        body: RequestBody::Json(json!({
            "name": format::task_title(record),
            "description": format!("Datos del formulario:\n\n```json\n{record_json}\n```"),
        })),
    })
}

fn crm_form_request(
    config: &CrmFormConfig,
    record: &FormRecord,
) -> Result<OutboundRequest, PrepareError> {
    let portal_id = non_blank(config.portal_id.as_deref())
        .ok_or_else(|| missing("HUBSPOT_PORTAL_ID", "HubSpot portal (account) id."))?;
    let form_id = non_blank(config.form_id.as_deref())
        .ok_or_else(|| missing("HUBSPOT_FORM_ID", "HubSpot form GUID."))?;

    let payload = format::structured_fields(record, &config.field_map);
    let mut fields: Vec<Value> = payload
        .fields
        .iter()
        .map(|(name, value)| json!({ "name": name, "value": value }))
        .collect();
    fields.push(json!({ "name": config.field_map.message_field, "value": payload.message }));

    let mut body = json!({ "fields": fields });
    if config.page_uri.is_some() || config.page_name.is_some() {
        body["context"] = json!({
            "pageUri": config.page_uri,
            "pageName": config.page_name,
        });
    }

    Ok(OutboundRequest {
        target: "hubspot",
        url: format!(
            "{}/submissions/v3/integration/submit/{portal_id}/{form_id}",
            config.api_base.trim_end_matches('/')
        ),
        authorization: None,
        body: RequestBody::Json(body),
    })
}

fn spreadsheet_request(
    config: &SpreadsheetConfig,
    record: &FormRecord,
) -> Result<OutboundRequest, PrepareError> {
    let url = non_blank(config.script_url.as_deref())
        .ok_or_else(|| missing("SHEETS_SCRIPT_URL", "Deployed spreadsheet script web-app URL."))?;
    let text = format::whole_record(record).map_err(|e| PrepareError::Format(e.to_string()))?;

    Ok(OutboundRequest {
        target: "sheets",
        url: url.to_string(),
        authorization: None,
        body: RequestBody::Text(text),
    })
}

fn missing(key: &str, hint: &str) -> ConfigError {
    ConfigError::MissingRequired {
        key: key.to_string(),
        hint: hint.to_string(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn first_scalar(body: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::fixtures::complete_record;
    use secrecy::ExposeSecret;

    fn task_tracker() -> IntegrationTarget {
        IntegrationTarget::TaskTracker(TaskTrackerConfig {
            api_base: "https://clickup.test/api/v2/".into(),
            list_id: Some("901".into()),
            api_key: Some(SecretString::from("pk_123")),
        })
    }

    fn build(target: &IntegrationTarget) -> OutboundRequest {
        target.http_request(&complete_record()).unwrap().unwrap()
    }

    #[test]
    fn task_tracker_request_wraps_whole_record() {
        let request = build(&task_tracker());
        assert_eq!(request.url, "https://clickup.test/api/v2/list/901/task");
        assert_eq!(request.authorization.unwrap().expose_secret(), "pk_123");

        let RequestBody::Json(body) = request.body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["name"], "🧾 Onboarding - Acme");
        let description = body["description"].as_str().unwrap();
        assert!(description.starts_with("Datos del formulario:\n\n```json\n"));
        assert!(description.contains("\"approvalContact\": \"Ana\""));
        assert!(description.ends_with("\n```"));
    }

    #[test]
    fn task_tracker_without_key_is_a_config_error() {
        let target = IntegrationTarget::TaskTracker(TaskTrackerConfig {
            list_id: Some("901".into()),
            ..TaskTrackerConfig::default()
        });
        match target.http_request(&complete_record()) {
            Some(Err(PrepareError::Config(ConfigError::MissingRequired { key, .. }))) => {
                assert_eq!(key, "CLICKUP_API_KEY")
            }
            other => panic!("expected missing key, got {other:?}"),
        }
    }

    #[test]
    fn blank_list_id_counts_as_missing() {
        let target = IntegrationTarget::TaskTracker(TaskTrackerConfig {
            list_id: Some("  ".into()),
            api_key: Some(SecretString::from("pk")),
            ..TaskTrackerConfig::default()
        });
        assert!(matches!(
            target.http_request(&complete_record()),
            Some(Err(PrepareError::Config(_)))
        ));
    }

    #[test]
    fn crm_request_maps_fields_and_message() {
        let target = IntegrationTarget::CrmForm(CrmFormConfig {
            portal_id: Some("509".into()),
            form_id: Some("da6e".into()),
            page_uri: Some("https://onboarding.swipe.test".into()),
            page_name: Some("Onboarding".into()),
            ..CrmFormConfig::default()
        });
        let request = build(&target);
        assert_eq!(
            request.url,
            "https://api.hsforms.com/submissions/v3/integration/submit/509/da6e"
        );
        assert!(request.authorization.is_none());

        let RequestBody::Json(body) = request.body else {
            panic!("expected JSON body");
        };
        let fields = body["fields"].as_array().unwrap();
        let names: Vec<&str> = fields.iter().map(|f| f["name"].as_str().unwrap()).collect();
        assert_eq!(
            names,
            vec!["firstname", "lastname", "email", "phone", "company", "message"]
        );
        assert_eq!(fields[2]["value"], "ana@x.com");
        assert!(fields[5]["value"].as_str().unwrap().contains("Objetivos: Sales"));
        assert_eq!(body["context"]["pageName"], "Onboarding");
    }

    #[test]
    fn crm_context_omitted_without_page_info() {
        let target = IntegrationTarget::CrmForm(CrmFormConfig {
            portal_id: Some("509".into()),
            form_id: Some("da6e".into()),
            ..CrmFormConfig::default()
        });
        let RequestBody::Json(body) = build(&target).body else {
            panic!("expected JSON body");
        };
        assert!(body.get("context").is_none());
    }

    #[test]
    fn spreadsheet_request_is_plain_text_record() {
        let target = IntegrationTarget::Spreadsheet(SpreadsheetConfig {
            script_url: Some("https://script.test/exec".into()),
        });
        let request = build(&target);
        assert_eq!(request.url, "https://script.test/exec");
        let RequestBody::Text(text) = request.body else {
            panic!("expected text body");
        };
        let parsed: FormRecord = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, complete_record());
    }

    #[test]
    fn email_relay_has_no_http_request() {
        assert!(IntegrationTarget::EmailRelay.http_request(&complete_record()).is_none());
        assert!(IntegrationTarget::EmailRelay.is_email());
    }

    #[test]
    fn extracts_ids_and_reasons() {
        let tracker = task_tracker();
        assert_eq!(tracker.extract_id(&json!({"id": "T-1"})), Some("T-1".into()));
        assert_eq!(
            tracker.extract_reason(&json!({"err": "Team not authorized", "ECODE": "OAUTH_027"})),
            Some("Team not authorized".into())
        );

        let sheets = IntegrationTarget::Spreadsheet(SpreadsheetConfig::default());
        assert_eq!(sheets.extract_id(&json!({"result": "success", "row": 42})), Some("42".into()));
        assert_eq!(sheets.extract_id(&json!({"id": ""})), None);
    }
}
