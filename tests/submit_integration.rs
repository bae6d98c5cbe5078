//! End-to-end tests for the onboarding HTTP surface.
//!
//! Each test starts a stub downstream API and the onboarding router on
//! random ports, then drives the router over real HTTP with reqwest.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use secrecy::SecretString;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::time::timeout;

use swipe_onboarding::dispatch::{
    CrmFormConfig, Dispatcher, GENERIC_FAILURE_MESSAGE, HttpTransport, IntegrationTarget,
    SpreadsheetConfig, TaskTrackerConfig,
};
use swipe_onboarding::form::SessionStore;
use swipe_onboarding::routes::onboarding_routes;

/// Maximum time any test is allowed to run before we consider it hung.
const TEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One request as seen by the stub downstream API.
#[derive(Debug, Clone)]
struct Received {
    authorization: Option<String>,
    content_type: Option<String>,
    body: String,
}

/// Stub downstream API: records every request and answers with a fixed
/// status and body after an optional delay.
struct Downstream {
    status: StatusCode,
    reply: String,
    delay: Duration,
    received: Mutex<Vec<Received>>,
}

impl Downstream {
    fn new(status: u16, reply: Value) -> Arc<Self> {
        Self::slow(status, reply, Duration::ZERO)
    }

    fn slow(status: u16, reply: Value, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            status: StatusCode::from_u16(status).unwrap(),
            reply: reply.to_string(),
            delay,
            received: Mutex::new(Vec::new()),
        })
    }

    fn received(&self) -> Vec<Received> {
        self.received.lock().unwrap().clone()
    }
}

async fn receive(
    State(downstream): State<Arc<Downstream>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    downstream.received.lock().unwrap().push(Received {
        authorization: header("authorization"),
        content_type: header("content-type"),
        body,
    });
    tokio::time::sleep(downstream.delay).await;
    (downstream.status, downstream.reply.clone())
}

async fn serve(app: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    // Give the server a moment to start accepting connections.
    tokio::time::sleep(Duration::from_millis(50)).await;
    format!("http://127.0.0.1:{port}")
}

/// Start the stub downstream API, return its base URL.
async fn start_downstream(downstream: Arc<Downstream>) -> String {
    let app = Router::new()
        .route("/list/{list_id}/task", post(receive))
        .route(
            "/submissions/v3/integration/submit/{portal}/{form}",
            post(receive),
        )
        .route("/exec", post(receive))
        .with_state(downstream);
    serve(app).await
}

/// Start the onboarding router against `target`, return its base URL.
async fn start_app(target: IntegrationTarget) -> String {
    let transport = Arc::new(HttpTransport::new(Duration::from_secs(5)).unwrap());
    let dispatcher = Dispatcher::new(target, transport).with_timeout(Duration::from_secs(5));
    serve(onboarding_routes(Arc::new(SessionStore::new(Arc::new(dispatcher))))).await
}

fn clickup(base: &str) -> IntegrationTarget {
    IntegrationTarget::TaskTracker(TaskTrackerConfig {
        api_base: base.to_string(),
        list_id: Some("901".into()),
        api_key: Some(SecretString::from("pk_test_token")),
    })
}

/// The example record used throughout: every standard-required field set.
fn ana() -> Value {
    json!({
        "fullName": "Ana Pérez",
        "role": "CEO",
        "email": "ana@x.com",
        "phone": "8090000000",
        "brandName": "Acme",
        "description": "...",
        "missionVisionValues": "Café justo",
        "differentiator": "Tostado local",
        "personality": "Cercana",
        "competitors": "Cafetería Central",
        "objectives": ["Sales"],
        "idealCustomer": "Profesionales jóvenes",
        "adsBudget": "500",
        "socialAccountsExist": "si",
        "businessHours": "9-5",
        "approvalContact": "Ana"
    })
}

async fn post_json(url: &str, body: &Value) -> (StatusCode, Value) {
    let response = reqwest::Client::new()
        .post(url)
        .json(body)
        .send()
        .await
        .unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap_or(Value::Null))
}

async fn send(method: reqwest::Method, url: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = reqwest::Client::new().request(method, url);
    if let Some(body) = body {
        request = request.json(&body);
    }
    let response = request.send().await.unwrap();
    let status = StatusCode::from_u16(response.status().as_u16()).unwrap();
    (status, response.json().await.unwrap_or(Value::Null))
}

// ── One-shot submission ─────────────────────────────────────────────────

#[tokio::test]
async fn accepted_submission_creates_one_task() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(200, json!({"id": "T-1"}));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(clickup(&base)).await;

        let (status, body) = post_json(&format!("{app}/api/submit-onboarding"), &ana()).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["taskId"], "T-1");

        let received = downstream.received();
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].authorization.as_deref(), Some("pk_test_token"));

        let task: Value = serde_json::from_str(&received[0].body).unwrap();
        assert_eq!(task["name"], "🧾 Onboarding - Acme");
        let description = task["description"].as_str().unwrap();
        assert!(description.starts_with("Datos del formulario:"));
        assert!(description.contains(r#""email": "ana@x.com""#));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn spanish_keys_are_accepted() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(200, json!({"id": "T-2"}));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(clickup(&base)).await;

        let mut record = ana();
        let fields = record.as_object_mut().unwrap();
        let name = fields.remove("fullName").unwrap();
        fields.insert("nombreCompleto".into(), name);

        let (status, body) = post_json(&format!("{app}/api/submit-onboarding"), &record).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(downstream.received().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn crm_payload_maps_fields_and_message_block() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(200, json!({"inlineMessage": "Thanks"}));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(IntegrationTarget::CrmForm(CrmFormConfig {
            api_base: base,
            portal_id: Some("123".into()),
            form_id: Some("abc".into()),
            ..CrmFormConfig::default()
        }))
        .await;

        let (status, body) = post_json(&format!("{app}/api/submit-onboarding"), &ana()).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.get("taskId").is_none());

        let received = downstream.received();
        assert_eq!(received.len(), 1);
        let payload: Value = serde_json::from_str(&received[0].body).unwrap();
        let fields = payload["fields"].as_array().unwrap();
        let field = |name: &str| {
            fields
                .iter()
                .find(|f| f["name"] == name)
                .and_then(|f| f["value"].as_str())
                .unwrap()
                .to_string()
        };
        assert_eq!(field("email"), "ana@x.com");
        assert_eq!(field("company"), "Acme");
        assert!(field("message").lines().any(|l| l == "Objetivos: Sales"));
        assert!(payload.get("context").is_none());
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn spreadsheet_receives_plain_text_record() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(200, json!({"result": "success", "row": 12}));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(IntegrationTarget::Spreadsheet(SpreadsheetConfig {
            script_url: Some(format!("{base}/exec")),
        }))
        .await;

        let (status, body) = post_json(&format!("{app}/api/submit-onboarding"), &ana()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["taskId"], "12");

        let received = downstream.received();
        assert!(received[0].content_type.as_deref().unwrap().starts_with("text/plain"));
        let record: Value = serde_json::from_str(&received[0].body).unwrap();
        assert_eq!(record["brandName"], "Acme");
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn rejection_is_502_without_downstream_detail() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(401, json!({"err": "Token invalid", "ECODE": "OAUTH_025"}));
        let base = start_downstream(downstream).await;
        let app = start_app(clickup(&base)).await;

        let (status, body) = post_json(&format!("{app}/api/submit-onboarding"), &ana()).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], GENERIC_FAILURE_MESSAGE);
        assert!(!body.to_string().contains("Token invalid"));
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn unreachable_downstream_is_503() {
    timeout(TEST_TIMEOUT, async {
        // Grab a free port, then close it so nothing is listening.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let app = start_app(clickup(&format!("http://127.0.0.1:{port}"))).await;
        let (status, body) = post_json(&format!("{app}/api/submit-onboarding"), &ana()).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["message"], GENERIC_FAILURE_MESSAGE);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn invalid_record_never_reaches_downstream() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(200, json!({"id": "T-1"}));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(clickup(&base)).await;

        let mut record = ana();
        record["objectives"] = json!(["Other"]);
        let (status, body) = post_json(&format!("{app}/api/submit-onboarding"), &record).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["errors"][0], "The 'Other' objective needs a description");
        assert!(downstream.received().is_empty());
    })
    .await
    .expect("test timed out");
}

// ── Wizard sessions ─────────────────────────────────────────────────────

/// Create a session and fill it through the field and toggle endpoints,
/// advancing to the closing step. Returns the session URL.
async fn filled_session(app: &str) -> String {
    let (status, body) = send(reqwest::Method::POST, &format!("{app}/api/sessions"), None).await;
    assert_eq!(status, StatusCode::CREATED);
    let url = format!("{app}/api/sessions/{}", body["id"].as_str().unwrap());

    let record = ana();
    for (field, value) in record.as_object().unwrap() {
        if field == "objectives" {
            continue;
        }
        let (status, _) = send(
            reqwest::Method::PUT,
            &format!("{url}/fields"),
            Some(json!({"field": field, "value": value})),
        )
        .await;
        assert_eq!(status, StatusCode::OK, "setting {field}");
    }
    let (status, _) = send(
        reqwest::Method::POST,
        &format!("{url}/toggle"),
        Some(json!({"objective": "Sales"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    for expected in 2..=5 {
        let (status, body) = send(reqwest::Method::POST, &format!("{url}/next"), None).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["step"], expected);
    }
    url
}

#[tokio::test]
async fn session_walkthrough_submits_once() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(200, json!({"id": "T-7"}));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(clickup(&base)).await;
        let url = filled_session(&app).await;

        let (_, view) = send(reqwest::Method::GET, &url, None).await;
        assert_eq!(view["stepLabel"], "Cierre Operativo");
        assert_eq!(view["progressPercent"], 100);
        assert_eq!(view["currentStepValid"], true);

        let (status, body) = send(reqwest::Method::POST, &format!("{url}/confirm"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["taskId"], "T-7");
        assert_eq!(body["session"]["state"]["status"], "submitted");
        assert_eq!(body["session"]["record"]["email"], "");

        let (status, _) = send(reqwest::Method::POST, &format!("{url}/confirm"), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(downstream.received().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn concurrent_confirms_send_one_request() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::slow(200, json!({"id": "T-8"}), Duration::from_millis(300));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(clickup(&base)).await;
        let url = filled_session(&app).await;

        let confirm_url = format!("{url}/confirm");
        let statuses: Vec<StatusCode> = futures_util::future::join_all(
            (0..3).map(|_| send(reqwest::Method::POST, &confirm_url, None)),
        )
        .await
        .into_iter()
        .map(|(status, _)| status)
        .collect();

        assert_eq!(statuses.iter().filter(|s| **s == StatusCode::OK).count(), 1);
        assert_eq!(
            statuses.iter().filter(|s| **s == StatusCode::CONFLICT).count(),
            2
        );
        assert_eq!(downstream.received().len(), 1);
    })
    .await
    .expect("test timed out");
}

#[tokio::test]
async fn failed_session_keeps_record_for_retry() {
    timeout(TEST_TIMEOUT, async {
        let downstream = Downstream::new(500, json!({"err": "boom"}));
        let base = start_downstream(Arc::clone(&downstream)).await;
        let app = start_app(clickup(&base)).await;
        let url = filled_session(&app).await;

        let (status, body) = send(reqwest::Method::POST, &format!("{url}/confirm"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["session"]["state"]["status"], "failed");
        assert_eq!(body["session"]["record"]["email"], "ana@x.com");

        // Still editable, and confirm may be re-attempted.
        let (status, _) = send(
            reqwest::Method::PUT,
            &format!("{url}/fields"),
            Some(json!({"field": "comments", "value": "Gracias"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(reqwest::Method::POST, &format!("{url}/confirm"), None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(downstream.received().len(), 2);
    })
    .await
    .expect("test timed out");
}
