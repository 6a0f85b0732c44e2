use log::debug;
use reqwest::multipart::{ Form, Part };
use reqwest::{ Client as HttpClient, Response, StatusCode };
use serde::de::DeserializeOwned;
use serde::{ Serialize, Deserialize };
use std::time::Duration;
use thiserror::Error;

use crate::models::exercise::Exercise;
use crate::models::session::{
    CheckResult, Feedback, SessionConfig, SessionState, Skill, TutorPersona,
};

/// Errors surfaced by the tutoring backend transport. `Status` carries the
/// backend's own `detail` message when the body had one, so callers can show
/// it verbatim.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request to tutor backend failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{detail}")]
    Status { status: u16, detail: String },
    #[error("unexpected response payload: {0}")]
    Payload(String),
}

impl ApiError {
    fn from_status(status: StatusCode, body: &str) -> Self {
        let detail = serde_json
            ::from_str::<ErrorBody>(body)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| format!("tutor backend returned HTTP {}", status.as_u16()));
        ApiError::Status {
            status: status.as_u16(),
            detail,
        }
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

// Request and response envelopes for the canonical contract.

#[derive(Serialize)]
struct CreateSessionRequest<'a> {
    tutor: &'a str,
    config: &'a SessionConfig,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct AnswerRequest<'a> {
    answer: &'a str,
}

#[derive(Serialize)]
struct ThemeRequest<'a> {
    theme: &'a str,
}

#[derive(Serialize)]
struct GenerateExerciseRequest<'a> {
    skill: Skill,
    theme: &'a str,
}

#[derive(Serialize)]
struct SpeakRequest<'a> {
    text: &'a str,
    tutor_id: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionResponse {
    pub session_id: String,
    pub state: SessionState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StateResponse {
    pub state: SessionState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatResponse {
    pub reply: String,
    pub state: SessionState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseResponse {
    pub exercise: Exercise,
    pub state: SessionState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerResponse {
    pub check_result: CheckResult,
    pub feedback: Feedback,
    #[serde(default)]
    pub summary_message: String,
    pub state: SessionState,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscribeResponse {
    pub text: String,
}

/// HTTP client for the tutoring backend. One instance per process; cloning
/// shares the underlying connection pool.
#[derive(Clone)]
pub struct TutorApi {
    http: HttpClient,
    base_url: String,
}

impl TutorApi {
    pub fn new(base_url: &str, timeout_secs: u64) -> Result<Self, ApiError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, ApiError> {
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ApiError::from_status(status, &body));
        }
        serde_json::from_str::<T>(&body).map_err(|e| ApiError::Payload(e.to_string()))
    }

    pub async fn create_session(
        &self,
        tutor: TutorPersona,
        config: &SessionConfig,
    ) -> Result<CreateSessionResponse, ApiError> {
        let url = self.endpoint("session");
        debug!("POST {} (tutor={})", url, tutor);
        let req = CreateSessionRequest {
            tutor: tutor.id(),
            config,
        };
        let resp = self.http.post(&url).json(&req).send().await?;
        Self::decode(resp).await
    }

    pub async fn session_state(&self, session_id: &str) -> Result<StateResponse, ApiError> {
        let url = self.endpoint(&format!("session/{}", session_id));
        let resp = self.http.get(&url).send().await?;
        Self::decode(resp).await
    }

    pub async fn chat(&self, session_id: &str, message: &str) -> Result<ChatResponse, ApiError> {
        let url = self.endpoint(&format!("session/{}/chat", session_id));
        let resp = self.http.post(&url).json(&ChatRequest { message }).send().await?;
        Self::decode(resp).await
    }

    /// Generic exercise request: the backend picks the shape from the
    /// session config.
    pub async fn request_exercise(&self, session_id: &str) -> Result<ExerciseResponse, ApiError> {
        let url = self.endpoint(&format!("session/{}/exercise", session_id));
        let resp = self.http.post(&url).send().await?;
        Self::decode(resp).await
    }

    /// Parameterized generation: the caller chooses skill and theme, the
    /// backend must honor both or fail. Returns the bare exercise.
    pub async fn generate_exercise(
        &self,
        session_id: &str,
        skill: Skill,
        theme: &str,
    ) -> Result<Exercise, ApiError> {
        let url = self.endpoint(&format!("generate_exercise/{}", session_id));
        let resp = self.http
            .post(&url)
            .json(&GenerateExerciseRequest { skill, theme })
            .send().await?;
        Self::decode(resp).await
    }

    pub async fn submit_answer(
        &self,
        session_id: &str,
        answer: &str,
    ) -> Result<AnswerResponse, ApiError> {
        let url = self.endpoint(&format!("session/{}/answer", session_id));
        let resp = self.http.post(&url).json(&AnswerRequest { answer }).send().await?;
        Self::decode(resp).await
    }

    pub async fn set_theme(&self, session_id: &str, theme: &str) -> Result<StateResponse, ApiError> {
        let url = self.endpoint(&format!("set_theme/{}", session_id));
        let resp = self.http.post(&url).json(&ThemeRequest { theme }).send().await?;
        Self::decode(resp).await
    }

    /// Speech synthesis for a tutor utterance. Returns the encoded audio
    /// bytes as-is.
    pub async fn speak(&self, text: &str, tutor_id: &str) -> Result<Vec<u8>, ApiError> {
        let url = self.endpoint("speak");
        let resp = self.http.post(&url).json(&SpeakRequest { text, tutor_id }).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body));
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Ships a finished recording for transcription. The multipart field is
    /// named `file`, matching the backend's upload handler.
    pub async fn transcribe(
        &self,
        file_name: &str,
        mime: &str,
        bytes: Vec<u8>,
    ) -> Result<TranscribeResponse, ApiError> {
        let url = self.endpoint("transcribe");
        let part = Part::bytes(bytes).file_name(file_name.to_string()).mime_str(mime)?;
        let form = Form::new().part("file", part);
        let resp = self.http.post(&url).multipart(form).send().await?;
        Self::decode(resp).await
    }
}
