//! Session registry: the explicitly owned home of every live interview.
//!
//! Lifecycle: a session is created by setup, removed by an explicit end or by
//! the idle sweeper. Each session serializes its own interviewer behind an
//! async mutex; the registry map lock is only held for lookups and never
//! across a model call, so unrelated interviews never wait on each other.

use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard, RwLock};
use tokio::task::JoinHandle;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::{Interviewer, InterviewerReply};
use crate::llm_client::ChatModel;
use crate::models::session::SessionConfig;
use crate::models::transcript::Turn;
use crate::review::{review, ApplicantProfile, ReviewVerdict};

pub struct Session {
    pub id: Uuid,
    pub config: SessionConfig,
    pub created_at: DateTime<Utc>,
    last_active_ms: AtomicI64,
    interviewer: Mutex<Option<Interviewer>>,
}

impl Session {
    fn new(id: Uuid, config: SessionConfig) -> Self {
        let now = Utc::now();
        Self {
            id,
            config,
            created_at: now,
            last_active_ms: AtomicI64::new(now.timestamp_millis()),
            interviewer: Mutex::new(None),
        }
    }

    fn touch(&self) {
        self.last_active_ms
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
    }

    pub fn last_active(&self) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(self.last_active_ms.load(Ordering::Relaxed))
            .unwrap_or(self.created_at)
    }

    /// Opens the interview, or on reconnect returns the latest question
    /// without calling the model again.
    pub async fn begin(&self, model: Arc<dyn ChatModel>) -> Result<InterviewerReply, AppError> {
        self.touch();
        let mut guard = self.interviewer.lock().await;
        let interviewer =
            guard.get_or_insert_with(|| Interviewer::start(self.id, &self.config, model));

        if let Some((index, turn)) = interviewer.transcript().last_reply() {
            info!("Session {} resumed at index {index}", self.id);
            return Ok(InterviewerReply {
                index,
                content: turn.content.clone(),
            });
        }
        interviewer.open().await
    }

    /// Serialized `advance` on this session's interviewer.
    pub async fn advance(&self, utterance: &str) -> Result<InterviewerReply, AppError> {
        self.answer_slot().await?.advance(utterance).await
    }

    /// Locks the interviewer for one candidate answer. The slot knows which
    /// question is being answered, and nothing else can advance the session
    /// until it is dropped.
    pub async fn answer_slot(&self) -> Result<AnswerSlot<'_>, AppError> {
        self.touch();
        let guard = self.interviewer.lock().await;
        let interviewer = MutexGuard::try_map(guard, Option::as_mut)
            .map_err(|_| AppError::Validation("Interview has not started".to_string()))?;

        let question_index = interviewer
            .transcript()
            .last_reply()
            .map(|(index, _)| index)
            .ok_or_else(|| AppError::Validation("Interview has not started".to_string()))?;

        Ok(AnswerSlot {
            interviewer,
            question_index,
        })
    }

    /// Number of recorded turns, the kickoff included.
    pub async fn turn_count(&self) -> usize {
        self.interviewer
            .lock()
            .await
            .as_ref()
            .map_or(0, |i| i.transcript().len())
    }

    /// Copy of the durable transcript; empty if the interview never started.
    pub async fn transcript_snapshot(&self) -> Vec<Turn> {
        self.interviewer
            .lock()
            .await
            .as_ref()
            .map(|i| i.transcript().turns().to_vec())
            .unwrap_or_default()
    }

    pub async fn transcript_dump(&self) -> String {
        self.interviewer
            .lock()
            .await
            .as_ref()
            .map(|i| i.transcript().render_dump())
            .unwrap_or_default()
    }

    /// Grades a snapshot of the transcript. The interviewer stays usable
    /// while the reviewer runs.
    pub async fn review(&self, model: &dyn ChatModel) -> Result<ReviewVerdict, AppError> {
        self.touch();
        let transcript = self.transcript_snapshot().await;
        if transcript.is_empty() {
            return Err(AppError::Validation(
                "Interview has no recorded turns to review".to_string(),
            ));
        }
        review(
            model,
            &transcript,
            ApplicantProfile {
                position: &self.config.position,
                years_of_experience: self.config.years_of_experience,
                cv: &self.config.cv_text,
            },
        )
        .await
    }
}

/// Exclusive hold on a started interview while one answer is processed.
pub struct AnswerSlot<'a> {
    interviewer: MappedMutexGuard<'a, Interviewer>,
    question_index: usize,
}

impl AnswerSlot<'_> {
    /// Index of the interviewer question the next answer responds to.
    pub fn question_index(&self) -> usize {
        self.question_index
    }

    pub async fn advance(mut self, utterance: &str) -> Result<InterviewerReply, AppError> {
        self.interviewer.advance(utterance).await
    }
}

pub struct SessionRegistry {
    sessions: RwLock<HashMap<Uuid, Arc<Session>>>,
    idle_timeout: chrono::Duration,
}

impl SessionRegistry {
    pub fn new(idle_timeout: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            idle_timeout: chrono::Duration::from_std(idle_timeout)
                .unwrap_or(chrono::Duration::MAX),
        }
    }

    pub async fn create(&self, config: SessionConfig) -> Arc<Session> {
        let session = Arc::new(Session::new(Uuid::new_v4(), config));
        self.sessions
            .write()
            .await
            .insert(session.id, session.clone());
        info!("Session {} created: {:?}", session.id, session.config);
        session
    }

    pub async fn get(&self, id: Uuid) -> Result<Arc<Session>, AppError> {
        self.sessions
            .read()
            .await
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Session {id} not found")))
    }

    pub async fn remove(&self, id: Uuid) -> Option<Arc<Session>> {
        let removed = self.sessions.write().await.remove(&id);
        if removed.is_some() {
            info!("Session {id} ended");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions idle for longer than the timeout as of `now`.
    /// Returns how many were removed.
    pub async fn evict_idle(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| now.signed_duration_since(s.last_active()) <= self.idle_timeout);
        before - sessions.len()
    }
}

/// Periodically evicts idle sessions for the lifetime of the process.
pub fn spawn_idle_sweeper(registry: Arc<SessionRegistry>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let evicted = registry.evict_idle(Utc::now()).await;
            if evicted > 0 {
                info!("Evicted {evicted} idle session(s)");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::testing::ScriptedModel;
    use crate::models::session::SetupRequest;

    const REVIEW_JSON: &str = r#"{"score": "A-", "the_chances_of_getting_this_job": 85,
        "comments": "Good.", "what_to_improve": "More detail."}"#;

    fn config() -> SessionConfig {
        SessionConfig::from_request(
            SetupRequest {
                name: "Ada".to_string(),
                position: "Data Engineer".to_string(),
                years_of_experience: 5.0,
                interview_type: "Behavioral".to_string(),
                interviewer_personality: "strict".to_string(),
                cv_text: "Spark, Airflow".to_string(),
                enable_voice: false,
                api_key: Some("sk-test".to_string()),
            },
            None,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_get_remove() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;

        assert_eq!(registry.get(session.id).await.unwrap().id, session.id);
        assert_eq!(registry.len().await, 1);

        assert!(registry.remove(session.id).await.is_some());
        assert!(matches!(
            registry.get(session.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(registry.remove(session.id).await.is_none());
    }

    #[tokio::test]
    async fn test_evict_idle() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;

        assert_eq!(registry.evict_idle(Utc::now()).await, 0);
        let later = Utc::now() + chrono::Duration::seconds(61);
        assert_eq!(registry.evict_idle(later).await, 1);
        assert!(registry.get(session.id).await.is_err());
    }

    #[tokio::test]
    async fn test_advance_before_begin_is_rejected() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;
        assert!(matches!(
            session.advance("hello").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_answer_slot_points_at_question_being_answered() {
        let model = Arc::new(ScriptedModel::with_replies(["Opening?", "Follow-up?"]));
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;

        let opening = session.begin(model).await.unwrap();
        let slot = session.answer_slot().await.unwrap();
        assert_eq!(slot.question_index(), opening.index);

        let next = slot.advance("my answer").await.unwrap();
        assert_eq!(next.index, 2);
        assert_eq!(session.answer_slot().await.unwrap().question_index(), 2);
    }

    #[tokio::test]
    async fn test_failed_opening_can_be_retried() {
        let model = Arc::new(ScriptedModel::new());
        model.push_failure();
        model.push_reply("Welcome back.");
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;

        assert!(matches!(
            session.begin(model.clone()).await,
            Err(AppError::ModelInvocation(_))
        ));
        assert!(matches!(
            session.answer_slot().await,
            Err(AppError::Validation(_))
        ));

        let opening = session.begin(model).await.unwrap();
        assert_eq!(opening.index, 1);
        assert_eq!(opening.content, "Welcome back.");
        assert_eq!(session.turn_count().await, 2);
    }

    #[tokio::test]
    async fn test_begin_then_resume_does_not_reopen() {
        let model = Arc::new(ScriptedModel::with_replies(["Welcome, Ada."]));
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;

        let first = session.begin(model.clone()).await.unwrap();
        assert_eq!(first.index, 1);

        let answer = session.advance("I once mediated a conflict").await.unwrap();
        assert_eq!(answer.index, 2);

        let resumed = session.begin(model.clone()).await.unwrap();
        assert_eq!(resumed, answer);
        assert_eq!(model.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_concurrent_advances_are_serialized() {
        let model = Arc::new(ScriptedModel::new());
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;
        session.begin(model).await.unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let session = session.clone();
                tokio::spawn(async move { session.advance(&format!("answer {i}")).await })
            })
            .collect();

        let mut indices = Vec::new();
        for handle in handles {
            indices.push(handle.await.unwrap().unwrap().index);
        }
        indices.sort_unstable();
        assert_eq!(indices, (2..=9).collect::<Vec<_>>());
        assert_eq!(session.transcript_snapshot().await.len(), 18);
    }

    #[tokio::test]
    async fn test_review_uses_snapshot_and_profile() {
        let interviewer_model = Arc::new(ScriptedModel::with_replies(["Tell me about conflict."]));
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;
        session.begin(interviewer_model).await.unwrap();

        let reviewer = ScriptedModel::with_replies([REVIEW_JSON]);
        let verdict = session.review(&reviewer).await.unwrap();
        assert_eq!(verdict.score, "A-");

        let query = &reviewer.last_call().turns[0].content;
        assert!(query.contains("* Position: Data Engineer"));
        assert!(query.contains("Spark, Airflow"));
        assert!(query.contains("interviewer: Tell me about conflict."));
    }

    #[tokio::test]
    async fn test_review_of_unstarted_session_is_rejected() {
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;
        let reviewer = ScriptedModel::new();
        assert!(matches!(
            session.review(&reviewer).await,
            Err(AppError::Validation(_))
        ));
        assert!(reviewer.calls().is_empty());
    }

    #[tokio::test]
    async fn test_transcript_dump_of_started_session() {
        let model = Arc::new(ScriptedModel::with_replies(["Hello!"]));
        let registry = SessionRegistry::new(Duration::from_secs(60));
        let session = registry.create(config()).await;
        assert_eq!(session.transcript_dump().await, "");

        session.begin(model).await.unwrap();
        let dump = session.transcript_dump().await;
        assert_eq!(
            dump,
            "human : ### Start the Interview ###\n--------------------\n\
             ai    : Hello!\n--------------------\n"
        );
    }
}
