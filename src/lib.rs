pub mod api;
pub mod audio;
pub mod cli;
pub mod console;
pub mod exercise;
pub mod models;
pub mod session;
pub mod settings;

use api::TutorApi;
use audio::{ AudioBridge, FileSink };
use cli::Args;
use console::Console;
use log::info;
use models::session::{ SessionConfig, Skill, TutorPersona };
use session::TutorSession;
use settings::Settings;
use std::error::Error;
use std::path::{ Path, PathBuf };
use std::sync::Arc;

pub async fn run(args: Args) -> Result<(), Box<dyn Error + Send + Sync>> {
    info!("--- Core Configuration ---");
    info!("Backend Base URL: {}", args.api_base);
    info!("Tutor Persona: {}", args.tutor);
    info!(
        "Topic: {} | Theme: {} | Skill: {} | Difficulty: {}",
        args.topic, args.theme, args.skill, args.difficulty
    );
    info!("Request Timeout: {}s", args.timeout_secs);
    info!("Speak Replies: {}", args.speak);
    info!("Utterance Dir: {}", args.utterance_dir);
    info!("Settings Path: {}", args.settings_path);
    info!("-------------------------");

    let tutor: TutorPersona = args.tutor.parse()?;
    let skill: Skill = args.skill.parse()?;
    let config = SessionConfig {
        topic: args.topic.clone(),
        theme: args.theme.clone(),
        skill,
        difficulty: args.difficulty.clone(),
    };

    let mut settings = Settings::load(Path::new(&args.settings_path));
    if args.speak {
        settings.speak_replies = true;
    }

    let api = TutorApi::new(&args.api_base, args.timeout_secs)?;
    let mut session = TutorSession::new(api.clone(), tutor, config);
    session.start().await?;

    let sink = Arc::new(FileSink::new(Path::new(&args.utterance_dir)));
    let bridge = AudioBridge::new(api, sink);

    let console = Console::new(session, bridge, settings, PathBuf::from(&args.settings_path));
    console.run().await
}
