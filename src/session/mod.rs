use log::{ info, warn };
use thiserror::Error;

use crate::api::{ ApiError, TutorApi };
use crate::models::exercise::Exercise;
use crate::models::session::{
    ChatTurn, CheckResult, Feedback, SessionConfig, SessionState, Skill, TutorPersona,
};

#[derive(Debug, Error)]
pub enum SessionError {
    /// Client-side precondition: the input was empty after trimming. No
    /// request is issued in this case.
    #[error("input is empty")]
    EmptyInput,
    #[error("no active session")]
    NoSession,
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// What the backend returned for a graded answer.
#[derive(Debug, Clone)]
pub struct AnswerOutcome {
    pub check_result: CheckResult,
    pub feedback: Feedback,
    pub summary_message: String,
}

/// Client-side view of one tutoring session.
///
/// The server owns the session; this struct holds the last state it sent,
/// the id to address it by, and the one ungraded exercise that may be
/// active. Every state-bearing request draws a ticket from a monotonic
/// counter and a response is only applied when nothing newer has been
/// applied already, so a slow response can no longer clobber a faster
/// one that was issued after it.
pub struct TutorSession {
    api: TutorApi,
    tutor: TutorPersona,
    config: SessionConfig,
    session_id: Option<String>,
    state: SessionState,
    active_exercise: Option<Exercise>,
    next_ticket: u64,
    applied_ticket: u64,
}

impl TutorSession {
    pub fn new(api: TutorApi, tutor: TutorPersona, config: SessionConfig) -> Self {
        Self {
            api,
            tutor,
            config,
            session_id: None,
            state: SessionState::default(),
            active_exercise: None,
            next_ticket: 0,
            applied_ticket: 0,
        }
    }

    pub fn tutor(&self) -> TutorPersona {
        self.tutor
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn active_exercise(&self) -> Option<&Exercise> {
        self.active_exercise.as_ref()
    }

    fn take_ticket(&mut self) -> u64 {
        self.next_ticket += 1;
        self.next_ticket
    }

    /// Installs a server state unless a response issued later has already
    /// been applied. Returns whether the state was taken.
    fn apply_state(&mut self, ticket: u64, state: SessionState) -> bool {
        if ticket <= self.applied_ticket {
            warn!(
                "Discarding stale session state (ticket {} <= {})",
                ticket, self.applied_ticket
            );
            return false;
        }
        self.applied_ticket = ticket;
        self.state = state;
        true
    }

    fn require_session(&self) -> Result<String, SessionError> {
        self.session_id.clone().ok_or(SessionError::NoSession)
    }

    /// Starts a fresh session, discarding whatever came before. Safe to call
    /// again at any point; the previous server session is simply abandoned.
    pub async fn start(&mut self) -> Result<&SessionState, SessionError> {
        let ticket = self.take_ticket();
        let resp = self.api.create_session(self.tutor, &self.config).await?;
        info!("Session {} started with tutor {}", resp.session_id, self.tutor);
        self.session_id = Some(resp.session_id);
        self.active_exercise = None;
        self.apply_state(ticket, resp.state);
        Ok(&self.state)
    }

    /// In-place tutor switch: keep the config, drop all history by starting
    /// a fresh session with the new persona.
    pub async fn switch_tutor(&mut self, tutor: TutorPersona) -> Result<&SessionState, SessionError> {
        self.tutor = tutor;
        self.start().await
    }

    /// Re-fetches the authoritative state without sending anything.
    pub async fn refresh(&mut self) -> Result<&SessionState, SessionError> {
        let id = self.require_session()?;
        let ticket = self.take_ticket();
        let resp = self.api.session_state(&id).await?;
        self.apply_state(ticket, resp.state);
        Ok(&self.state)
    }

    /// Sends a chat turn. The user's message is appended optimistically and
    /// rolled back if the transport fails; on success the server history
    /// replaces ours entirely.
    pub async fn send_chat(&mut self, message: &str) -> Result<String, SessionError> {
        let message = message.trim();
        if message.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let id = self.require_session()?;

        let len_before = self.state.chat_history.len();
        self.state.chat_history.push(ChatTurn::user(message));

        let ticket = self.take_ticket();
        match self.api.chat(&id, message).await {
            Ok(resp) => {
                self.apply_state(ticket, resp.state);
                Ok(resp.reply)
            }
            Err(e) => {
                self.state.chat_history.truncate(len_before);
                Err(e.into())
            }
        }
    }

    /// Asks the backend for a new exercise shaped by the session config.
    /// Replaces any exercise that was still active.
    pub async fn request_exercise(&mut self) -> Result<Exercise, SessionError> {
        let id = self.require_session()?;
        let ticket = self.take_ticket();
        let resp = self.api.request_exercise(&id).await?;
        self.apply_state(ticket, resp.state);
        self.active_exercise = Some(resp.exercise.clone());
        Ok(resp.exercise)
    }

    /// Explicitly parameterized generation. The endpoint returns the bare
    /// exercise and no state, so only the active exercise changes here.
    pub async fn generate_exercise(
        &mut self,
        skill: Skill,
        topic: &str,
    ) -> Result<Exercise, SessionError> {
        let id = self.require_session()?;
        let exercise = self.api.generate_exercise(&id, skill, topic).await?;
        self.active_exercise = Some(exercise.clone());
        Ok(exercise)
    }

    /// Submits an answer for the active exercise. Empty answers are rejected
    /// before any request is made. A graded answer always clears the active
    /// exercise; a failed submission leaves it in place.
    pub async fn submit_answer(&mut self, answer: &str) -> Result<AnswerOutcome, SessionError> {
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let id = self.require_session()?;
        let ticket = self.take_ticket();
        let resp = self.api.submit_answer(&id, answer).await?;
        self.active_exercise = None;
        self.apply_state(ticket, resp.state);
        Ok(AnswerOutcome {
            check_result: resp.check_result,
            feedback: resp.feedback,
            summary_message: resp.summary_message,
        })
    }

    pub async fn set_theme(&mut self, theme: &str) -> Result<&SessionState, SessionError> {
        let theme = theme.trim();
        if theme.is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let id = self.require_session()?;
        let ticket = self.take_ticket();
        let resp = self.api.set_theme(&id, theme).await?;
        self.config.theme = theme.to_string();
        self.apply_state(ticket, resp.state);
        Ok(&self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::session::Role;

    // Nothing listens on this address; any issued request would surface as
    // ApiError::Transport, which is exactly what the precondition tests
    // must not see.
    fn offline_session() -> TutorSession {
        let api = TutorApi::new("http://127.0.0.1:1/api", 1).unwrap();
        TutorSession::new(api, TutorPersona::Jan, SessionConfig::default())
    }

    #[tokio::test]
    async fn empty_chat_is_rejected_without_a_request() {
        let mut session = offline_session();
        session.session_id = Some("s-1".to_string());
        let err = session.send_chat("   ").await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyInput));
        assert!(session.state.chat_history.is_empty());
    }

    #[tokio::test]
    async fn empty_answer_is_rejected_without_a_request() {
        let mut session = offline_session();
        session.session_id = Some("s-1".to_string());
        let err = session.submit_answer("\t\n").await.unwrap_err();
        assert!(matches!(err, SessionError::EmptyInput));
    }

    #[tokio::test]
    async fn chat_without_session_is_rejected() {
        let mut session = offline_session();
        let err = session.send_chat("hallo").await.unwrap_err();
        assert!(matches!(err, SessionError::NoSession));
    }

    #[tokio::test]
    async fn failed_send_rolls_back_the_optimistic_turn() {
        let mut session = offline_session();
        session.session_id = Some("s-1".to_string());
        let err = session.send_chat("hallo").await.unwrap_err();
        assert!(matches!(err, SessionError::Api(ApiError::Transport(_))));
        assert!(session.state.chat_history.is_empty());
    }

    #[test]
    fn stale_state_is_discarded() {
        let mut session = offline_session();
        let early = session.take_ticket();
        let late = session.take_ticket();

        let mut late_state = SessionState::default();
        late_state.chat_history.push(ChatTurn::user("nieuw"));
        assert!(session.apply_state(late, late_state));

        let mut early_state = SessionState::default();
        early_state.chat_history.push(ChatTurn::user("oud"));
        early_state.chat_history.push(ChatTurn::user("oud 2"));
        assert!(!session.apply_state(early, early_state));

        assert_eq!(session.state.chat_history.len(), 1);
        assert_eq!(session.state.chat_history[0].role, Role::User);
        assert_eq!(session.state.chat_history[0].text.as_deref(), Some("nieuw"));
    }
}
