use serde::{ Serialize, Deserialize };
use std::collections::BTreeMap;

/// Exercise shapes the backend can produce. Older backend revisions used the
/// long spellings, both are accepted on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExerciseKind {
    #[serde(alias = "multiple_choice")]
    Mcq,
    #[serde(alias = "gap_fill")]
    Gapfill,
    Reading,
    Writing,
}

impl ExerciseKind {
    pub fn has_options(&self) -> bool {
        matches!(self, ExerciseKind::Mcq | ExerciseKind::Reading)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WordLimit {
    pub min: u32,
    pub max: u32,
}

/// Exercise body. Which fields are present depends on the kind: `question`
/// and `options` for mcq, `sentence` for gapfill, `passage` plus `question`
/// for reading, `prompt`/`rubric`/`word_limit` for writing. Writing
/// exercises legitimately carry no options and no answer key.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ExerciseContent {
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub sentence: Option<String>,
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub passage: Option<String>,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default)]
    pub rubric: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub word_limit: Option<WordLimit>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnswerKey {
    #[serde(default)]
    pub correct_option: Option<String>,
    #[serde(default)]
    pub correct_index: Option<usize>,
    #[serde(default)]
    pub correct_answer: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Exercise {
    #[serde(default)]
    pub exercise_id: String,
    #[serde(rename = "type")]
    pub kind: ExerciseKind,
    #[serde(default)]
    pub instructions: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub difficulty: Option<String>,
    #[serde(default)]
    pub content: ExerciseContent,
    #[serde(default)]
    pub answer_key: Option<AnswerKey>,
}

impl Exercise {
    /// The main text shown for this exercise, by kind.
    pub fn prompt_text(&self) -> Option<&str> {
        let content = &self.content;
        match self.kind {
            ExerciseKind::Mcq | ExerciseKind::Reading => content.question.as_deref(),
            ExerciseKind::Gapfill => content.sentence.as_deref(),
            ExerciseKind::Writing => content.prompt.as_deref(),
        }
    }

    pub fn options(&self) -> &[String] {
        self.content.options.as_deref().unwrap_or(&[])
    }

    /// Resolves the expected answer from whichever answer-key field the
    /// backend filled in. None for open writing tasks.
    pub fn correct_answer(&self) -> Option<&str> {
        let key = self.answer_key.as_ref()?;
        if let Some(option) = key.correct_option.as_deref() {
            return Some(option);
        }
        if let Some(answer) = key.correct_answer.as_deref() {
            return Some(answer);
        }
        key.correct_index
            .and_then(|idx| self.options().get(idx))
            .map(|s| s.as_str())
    }
}
