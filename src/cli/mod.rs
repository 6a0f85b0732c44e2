use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    // --- Backend Args ---
    /// Base URL of the tutoring backend, including any deployment prefix
    /// (e.g., http://localhost:8000/api)
    #[arg(long, env = "TUTOR_API_BASE", default_value = "http://localhost:8000/api")]
    pub api_base: String,

    /// Request timeout in seconds for backend calls.
    #[arg(long, env = "TUTOR_TIMEOUT_SECS", default_value = "120")]
    pub timeout_secs: u64,

    // --- Session Args ---
    /// Tutor persona to open the session with (jan, sara)
    #[arg(long, env = "TUTOR_PERSONA", default_value = "jan")]
    pub tutor: String,

    /// Grammar topic the session focuses on (e.g., "Present Perfect")
    #[arg(long, env = "TUTOR_TOPIC", default_value = "Present Perfect")]
    pub topic: String,

    /// Topical constraint applied to generated exercises (e.g., "school", "football")
    #[arg(long, env = "TUTOR_THEME", default_value = "school")]
    pub theme: String,

    /// Skill category to practice (grammar, reading, writing, vocabulary)
    #[arg(long, env = "TUTOR_SKILL", default_value = "grammar")]
    pub skill: String,

    /// Exercise difficulty (easy, medium, hard)
    #[arg(long, env = "TUTOR_DIFFICULTY", default_value = "medium")]
    pub difficulty: String,

    // --- Audio Args ---
    /// Speak tutor replies through the backend's speech synthesis.
    #[arg(long, env = "TUTOR_SPEAK", default_value = "false")]
    pub speak: bool,

    /// Directory where synthesized utterances are written.
    #[arg(long, env = "TUTOR_UTTERANCE_DIR", default_value = "utterances")]
    pub utterance_dir: String,

    // --- General App Args ---
    /// Path to the user settings file.
    #[arg(long, env = "TUTOR_SETTINGS_PATH", default_value = "settings.json")]
    pub settings_path: String,
}
