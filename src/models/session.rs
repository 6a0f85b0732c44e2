use serde::{ Serialize, Deserialize };
use std::fmt;
use std::str::FromStr;

use super::exercise::Exercise;

/// Backend-defined tutor characters. The lowercase id is what goes on the
/// wire, both when creating a session and as `tutor_id` for speech synthesis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TutorPersona {
    Jan,
    Sara,
}

impl TutorPersona {
    pub fn id(&self) -> &'static str {
        match self {
            TutorPersona::Jan => "jan",
            TutorPersona::Sara => "sara",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            TutorPersona::Jan => "Meester Jan",
            TutorPersona::Sara => "Coach Sara",
        }
    }
}

impl FromStr for TutorPersona {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "jan" => Ok(TutorPersona::Jan),
            "sara" => Ok(TutorPersona::Sara),
            other => Err(format!("Unknown tutor persona: {}", other)),
        }
    }
}

impl fmt::Display for TutorPersona {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Skill category for parameterized exercise generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Skill {
    Grammar,
    Reading,
    Writing,
    Vocabulary,
}

impl FromStr for Skill {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "grammar" => Ok(Skill::Grammar),
            "reading" => Ok(Skill::Reading),
            "writing" => Ok(Skill::Writing),
            "vocabulary" => Ok(Skill::Vocabulary),
            other => Err(format!("Unknown skill: {}", other)),
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Skill::Grammar => "grammar",
            Skill::Reading => "reading",
            Skill::Writing => "writing",
            Skill::Vocabulary => "vocabulary",
        };
        f.write_str(s)
    }
}

/// Session options forwarded verbatim to the backend. Their effect is
/// entirely backend-defined.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SessionConfig {
    pub topic: String,
    pub theme: String,
    pub skill: Skill,
    pub difficulty: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            topic: "Present Perfect".to_string(),
            theme: "school".to_string(),
            skill: Skill::Grammar,
            difficulty: "medium".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Tutor,
    Exercise,
}

/// One turn in the conversation. Exercise turns carry the exercise payload
/// instead of text; both fields are optional on the wire.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exercise: Option<Exercise>,
}

impl ChatTurn {
    pub fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            text: Some(text.to_string()),
            exercise: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TutorInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub persona_id: Option<String>,
}

/// The server-authoritative session snapshot. Replaced wholesale on every
/// state-bearing response, never merged.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub tutor: TutorInfo,
    #[serde(default)]
    pub config: Option<SessionConfig>,
    #[serde(default)]
    pub chat_history: Vec<ChatTurn>,
    #[serde(default)]
    pub current_exercise: Option<Exercise>,
    #[serde(default)]
    pub current_exercise_id: Option<String>,
    #[serde(default)]
    pub current_feedback: Option<Feedback>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verdict {
    Correct,
    Almost,
    #[default]
    Incorrect,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Correct => "correct",
            Verdict::Almost => "almost",
            Verdict::Incorrect => "incorrect",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckDetails {
    #[serde(default)]
    pub skill: Option<String>,
    #[serde(default)]
    pub error_types: Vec<String>,
}

/// Grading verdict for a submitted answer. The backend sends either
/// `overall_score` or `score` depending on the exercise shape.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CheckResult {
    #[serde(default)]
    pub result: Verdict,
    #[serde(default)]
    pub overall_score: Option<f64>,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub expected: Option<String>,
    #[serde(default)]
    pub details: Option<CheckDetails>,
    #[serde(default)]
    pub comments: Option<String>,
}

impl CheckResult {
    pub fn score_value(&self) -> Option<f64> {
        self.overall_score.or(self.score)
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Feedback {
    #[serde(default)]
    pub feedback_text: String,
    #[serde(default)]
    pub tutor_name: Option<String>,
}
