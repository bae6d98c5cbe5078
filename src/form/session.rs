//! In-memory wizard sessions for the HTTP surface.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::dispatch::{Dispatcher, SubmissionOutcome};
use crate::error::WizardError;

use super::controller::{WizardController, WizardSnapshot};
use super::state::WizardState;

/// Idle sessions older than this are swept.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);

/// One browser's pass through the wizard.
pub struct WizardSession {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Millisecond timestamp of the last read or write.
    last_active_ms: AtomicI64,
    controller: Arc<Mutex<WizardController>>,
    dispatcher: Arc<Dispatcher>,
}

impl WizardSession {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        let controller = WizardController::new(dispatcher.rules().clone());
        let created_at = Utc::now();
        Self {
            id: Uuid::new_v4(),
            created_at,
            last_active_ms: AtomicI64::new(created_at.timestamp_millis()),
            controller: Arc::new(Mutex::new(controller)),
            dispatcher,
        }
    }

    pub async fn snapshot(&self) -> WizardSnapshot {
        self.touch();
        self.controller.lock().await.snapshot()
    }

    /// Run `f` against the controller and return the resulting view.
    pub async fn update<F>(&self, f: F) -> Result<WizardSnapshot, WizardError>
    where
        F: FnOnce(&mut WizardController) -> Result<(), WizardError>,
    {
        self.touch();
        let mut controller = self.controller.lock().await;
        f(&mut controller)?;
        Ok(controller.snapshot())
    }

    /// Submit the record.
    ///
    /// The controller lock is not held across the dispatch, so reads and a
    /// concurrent `confirm` see `Submitting` and the latter is refused.
    /// The dispatch and its state transition run on their own task: if the
    /// caller goes away mid-flight the session still ends up `Submitted` or
    /// `Failed`.
    pub async fn confirm(&self) -> Result<(SubmissionOutcome, WizardSnapshot), WizardError> {
        let record = self.controller.lock().await.begin_submit()?;
        self.touch();

        let controller = Arc::clone(&self.controller);
        let dispatcher = Arc::clone(&self.dispatcher);
        let session_id = self.id;
        let flight = tokio::spawn(async move {
            let outcome = dispatcher.submit(record).await;
            let mut controller = controller.lock().await;
            controller.finish_submit(&outcome);
            tracing::info!(
                %session_id,
                outcome = outcome.kind(),
                state = %controller.state(),
                "Wizard submission finished"
            );
            (outcome, controller.snapshot())
        });

        let finished = match flight.await {
            Ok(finished) => finished,
            Err(e) => {
                tracing::error!(%session_id, error = %e, "Wizard submission task failed");
                let outcome = SubmissionOutcome::TransportFailed {
                    diagnostic: Some(format!("submission task failed: {e}")),
                };
                let mut controller = self.controller.lock().await;
                controller.finish_submit(&outcome);
                (outcome, controller.snapshot())
            }
        };
        self.touch();
        Ok(finished)
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_active_ms.load(Ordering::Relaxed))
            .unwrap_or(self.created_at)
    }

    fn touch(&self) {
        self.last_active_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    /// Whether a sweep may drop this session. A session whose controller is
    /// locked right now, or that has a submission in flight, is kept.
    fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let Ok(controller) = self.controller.try_lock() else {
            return false;
        };
        match controller.state() {
            WizardState::Submitted => true,
            WizardState::Submitting => false,
            _ => chrono::Duration::from_std(ttl)
                .is_ok_and(|ttl| now - self.last_active() > ttl),
        }
    }
}

/// All live sessions, keyed by id. Submitted and idle sessions are dropped
/// by [`SessionStore::sweep`].
pub struct SessionStore {
    dispatcher: Arc<Dispatcher>,
    ttl: Duration,
    sessions: RwLock<HashMap<Uuid, Arc<WizardSession>>>,
}

impl SessionStore {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            ttl: DEFAULT_SESSION_TTL,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.dispatcher
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub async fn create(&self) -> Arc<WizardSession> {
        let session = Arc::new(WizardSession::new(Arc::clone(&self.dispatcher)));
        self.sessions
            .write()
            .await
            .insert(session.id, Arc::clone(&session));
        tracing::debug!(session_id = %session.id, "Wizard session created");
        session
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<WizardSession>> {
        self.sessions.read().await.get(&id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop submitted sessions and sessions idle for longer than the TTL.
    /// Returns how many were removed.
    pub async fn sweep(&self) -> usize {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now, self.ttl));
        let removed = before - sessions.len();
        if removed > 0 {
            tracing::info!(removed, live = sessions.len(), "Swept wizard sessions");
        }
        removed
    }
}

/// Spawn a background task that sweeps the store every `every`.
pub fn spawn_expiry_task(store: Arc<SessionStore>, every: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            store.sweep().await;
        }
    })
}
