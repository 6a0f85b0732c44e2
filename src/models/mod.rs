pub mod exercise;
pub mod session;

pub use exercise::{AnswerKey, Exercise, ExerciseContent, ExerciseKind, WordLimit};
pub use session::{
    ChatTurn, CheckDetails, CheckResult, Feedback, Role, SessionConfig, SessionState, Skill,
    TutorInfo, TutorPersona, Verdict,
};
