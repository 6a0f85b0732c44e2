use crate::models::exercise::{ Exercise, ExerciseKind };

/// How an option is shown once a choice has been made.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionMark {
    Neutral,
    Correct,
    ChosenWrong,
    Dimmed,
}

#[derive(Clone, Debug)]
pub struct OptionRow {
    pub label: char,
    pub text: String,
    pub mark: OptionMark,
    pub disabled: bool,
}

/// Per-instance view state for one exercise.
///
/// Choosing an answer is a one-way transition: afterwards every option is
/// disabled and recolored (correct positive, the chosen one negative when
/// wrong, the rest dimmed). There is no way back; a fresh exercise gets a
/// fresh view.
pub struct ExerciseView {
    exercise: Exercise,
    chosen: Option<String>,
}

fn same_answer(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

impl ExerciseView {
    pub fn new(exercise: Exercise) -> Self {
        Self {
            exercise,
            chosen: None,
        }
    }

    pub fn exercise(&self) -> &Exercise {
        &self.exercise
    }

    pub fn is_resolved(&self) -> bool {
        self.chosen.is_some()
    }

    /// An exercise the backend sent without its core text field. Rendered
    /// as a raw dump instead of failing.
    pub fn is_malformed(&self) -> bool {
        self.exercise.prompt_text().is_none()
    }

    /// Maps console input onto an answer string. A single letter picks the
    /// option with that index label; anything else is passed through as
    /// free text for the backend to grade.
    pub fn resolve_input(&self, input: &str) -> String {
        let trimmed = input.trim();
        let options = self.exercise.options();
        if self.exercise.kind.has_options() && trimmed.len() == 1 {
            let c = trimmed.chars().next().unwrap_or(' ').to_ascii_uppercase();
            if c.is_ascii_uppercase() {
                let idx = (c as usize) - ('A' as usize);
                if let Some(option) = options.get(idx) {
                    return option.clone();
                }
            }
        }
        trimmed.to_string()
    }

    /// Records the chosen answer. Ignored when a choice was already made;
    /// the transition is not reversible.
    pub fn choose(&mut self, answer: &str) {
        if self.chosen.is_some() {
            return;
        }
        self.chosen = Some(answer.trim().to_string());
    }

    pub fn option_rows(&self) -> Vec<OptionRow> {
        let correct = self.exercise.correct_answer();
        self.exercise
            .options()
            .iter()
            .enumerate()
            .map(|(idx, text)| {
                let label = (b'A' + (idx as u8 % 26)) as char;
                let mark = match &self.chosen {
                    None => OptionMark::Neutral,
                    Some(chosen) => {
                        if correct.map(|c| same_answer(c, text)).unwrap_or(false) {
                            OptionMark::Correct
                        } else if same_answer(chosen, text) {
                            OptionMark::ChosenWrong
                        } else {
                            OptionMark::Dimmed
                        }
                    }
                };
                OptionRow {
                    label,
                    text: text.clone(),
                    mark,
                    disabled: self.chosen.is_some(),
                }
            })
            .collect()
    }

    /// Renders the exercise as terminal lines.
    pub fn render_lines(&self) -> Vec<String> {
        if self.is_malformed() {
            return self.render_debug_dump();
        }

        let mut lines = Vec::new();
        let content = &self.exercise.content;

        let header = match self.exercise.kind {
            ExerciseKind::Mcq => "Oefening: meerkeuze",
            ExerciseKind::Gapfill => "Oefening: invuloefening",
            ExerciseKind::Reading => "Oefening: begrijpend lezen",
            ExerciseKind::Writing => "Oefening: schrijfopdracht",
        };
        lines.push(header.to_string());

        if let Some(instructions) = &self.exercise.instructions {
            lines.push(instructions.clone());
        }

        if self.exercise.kind == ExerciseKind::Reading {
            if let Some(passage) = &content.passage {
                lines.push(String::new());
                lines.push(passage.clone());
            }
        }

        lines.push(String::new());
        if let Some(text) = self.exercise.prompt_text() {
            lines.push(text.to_string());
        }

        match self.exercise.kind {
            ExerciseKind::Mcq | ExerciseKind::Reading => {
                lines.push(String::new());
                for row in self.option_rows() {
                    let marker = match row.mark {
                        OptionMark::Neutral => "",
                        OptionMark::Correct => "  [juist]",
                        OptionMark::ChosenWrong => "  [fout]",
                        OptionMark::Dimmed => "",
                    };
                    lines.push(format!("  {}. {}{}", row.label, row.text, marker));
                }
            }
            ExerciseKind::Writing => {
                if let Some(limit) = &content.word_limit {
                    lines.push(format!("Lengte: {} – {} woorden", limit.min, limit.max));
                }
                if let Some(rubric) = &content.rubric {
                    lines.push(String::new());
                    for (criterion, description) in rubric {
                        lines.push(format!("  - {}: {}", criterion, description));
                    }
                }
            }
            ExerciseKind::Gapfill => {}
        }

        lines
    }

    fn render_debug_dump(&self) -> Vec<String> {
        let raw = serde_json
            ::to_string_pretty(&self.exercise)
            .unwrap_or_else(|_| "<onleesbare oefening>".to_string());
        let mut lines = vec!["Onbekende oefeningsvorm, ruwe inhoud:".to_string()];
        lines.extend(raw.lines().map(|l| l.to_string()));
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exercise::{ AnswerKey, ExerciseContent, WordLimit };

    fn mcq(options: &[&str], correct: &str) -> Exercise {
        Exercise {
            exercise_id: "mcq_test".to_string(),
            kind: ExerciseKind::Mcq,
            instructions: None,
            topic: None,
            difficulty: None,
            content: ExerciseContent {
                question: Some("Kies het juiste antwoord.".to_string()),
                options: Some(options.iter().map(|s| s.to_string()).collect()),
                ..Default::default()
            },
            answer_key: Some(AnswerKey {
                correct_option: Some(correct.to_string()),
                ..Default::default()
            }),
        }
    }

    #[test]
    fn choosing_the_correct_option_marks_nothing_negative() {
        let mut view = ExerciseView::new(mcq(&["A", "B"], "A"));
        let answer = view.resolve_input("A");
        view.choose(&answer);

        let rows = view.option_rows();
        assert_eq!(rows[0].mark, OptionMark::Correct);
        assert_eq!(rows[1].mark, OptionMark::Dimmed);
        assert!(rows.iter().all(|r| r.disabled));
        assert!(rows.iter().all(|r| r.mark != OptionMark::ChosenWrong));
    }

    #[test]
    fn choosing_a_wrong_option_marks_it_negative() {
        let mut view = ExerciseView::new(mcq(&["A", "B"], "A"));
        let answer = view.resolve_input("B");
        view.choose(&answer);

        let rows = view.option_rows();
        assert_eq!(rows[0].mark, OptionMark::Correct);
        assert_eq!(rows[1].mark, OptionMark::ChosenWrong);
    }

    #[test]
    fn choose_is_a_one_way_transition() {
        let mut view = ExerciseView::new(mcq(&["A", "B"], "A"));
        view.choose("B");
        view.choose("A");

        let rows = view.option_rows();
        assert_eq!(rows[1].mark, OptionMark::ChosenWrong);
    }

    #[test]
    fn letter_input_maps_to_option_text() {
        let view = ExerciseView::new(mcq(&["must", "should", "can"], "must"));
        assert_eq!(view.resolve_input("b"), "should");
        assert_eq!(view.resolve_input("vrije tekst"), "vrije tekst");
        // out of range letters fall through as free text
        assert_eq!(view.resolve_input("z"), "z");
    }

    #[test]
    fn writing_renders_word_limit_advisory_and_rubric() {
        let exercise = Exercise {
            exercise_id: "write_01".to_string(),
            kind: ExerciseKind::Writing,
            instructions: None,
            topic: None,
            difficulty: None,
            content: ExerciseContent {
                prompt: Some("Describe your weekend".to_string()),
                word_limit: Some(WordLimit { min: 50, max: 150 }),
                rubric: Some(
                    [("structure".to_string(), "Greeting, body, ending.".to_string())]
                        .into_iter()
                        .collect(),
                ),
                ..Default::default()
            },
            answer_key: None,
        };
        let view = ExerciseView::new(exercise);
        let rendered = view.render_lines().join("\n");
        assert!(rendered.contains("Describe your weekend"));
        assert!(rendered.contains("50 – 150 woorden"));
        assert!(rendered.contains("structure: Greeting, body, ending."));
    }

    #[test]
    fn exercise_without_core_text_renders_debug_dump() {
        let exercise = Exercise {
            exercise_id: "broken_01".to_string(),
            kind: ExerciseKind::Mcq,
            instructions: None,
            topic: None,
            difficulty: None,
            content: ExerciseContent::default(),
            answer_key: None,
        };
        let view = ExerciseView::new(exercise);
        assert!(view.is_malformed());
        let rendered = view.render_lines().join("\n");
        assert!(rendered.contains("broken_01"));
    }
}
