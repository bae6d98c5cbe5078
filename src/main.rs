use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use swipe_onboarding::config::AppConfig;
use swipe_onboarding::dispatch::{Dispatcher, HttpTransport, Mailer, SmtpMailer};
use swipe_onboarding::form::{SessionStore, spawn_expiry_task};
use swipe_onboarding::routes::onboarding_routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Install rustls crypto provider before any TLS usage
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = AppConfig::from_env().context("Invalid onboarding configuration")?;

    eprintln!("📝 Swipe Onboarding v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Target: {}", config.target);
    eprintln!("   Timeout: {}s", config.http_timeout.as_secs());
    eprintln!(
        "   Validation: {}",
        if config.strict_validation { "strict" } else { "standard" }
    );
    eprintln!("   Session TTL: {}m", config.session_ttl.as_secs() / 60);
    eprintln!("   API: http://0.0.0.0:{}/api/submit-onboarding", config.port);

    // ── Dispatcher ──────────────────────────────────────────────────────
    let transport = Arc::new(HttpTransport::new(config.http_timeout)?);
    let mut dispatcher = Dispatcher::new(config.target.clone(), transport)
        .with_rules(config.required_fields())
        .with_timeout(config.http_timeout)
        .with_email_notification(config.notify_by_email);

    if config.email.is_complete() {
        let mailer: Arc<dyn Mailer> =
            Arc::new(SmtpMailer::new(config.email.clone(), config.http_timeout));
        dispatcher = dispatcher.with_mailer(mailer);
        eprintln!("   Email: enabled via {}", config.email.smtp_host);
    } else if config.target.is_email() || config.notify_by_email {
        tracing::warn!(
            "Email is selected but EMAIL_USER, EMAIL_PASS or EMAIL_TO is unset; \
             email submissions will fail"
        );
    }

    // ── HTTP server ─────────────────────────────────────────────────────
    let sessions = Arc::new(SessionStore::new(Arc::new(dispatcher)).with_ttl(config.session_ttl));
    let _expiry = spawn_expiry_task(Arc::clone(&sessions), Duration::from_secs(60));
    let app = onboarding_routes(sessions);

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;
    tracing::info!(port = config.port, integration = %config.target, "Onboarding server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}
