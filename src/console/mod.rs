use log::{ info, warn, error };
use std::io::Write;
use std::path::{ Path, PathBuf };
use std::error::Error;
use tokio::io::{ AsyncBufReadExt, BufReader };

use crate::audio::{ AudioBridge, FileCapture, Recorder };
use crate::exercise::ExerciseView;
use crate::models::session::{ Role, Skill, TutorPersona };
use crate::session::{ SessionError, TutorSession };
use crate::settings::Settings;

const HELP: &str = "\
Commando's:
  /exercise                nieuwe oefening op basis van de sessie-instellingen
  /generate <skill> [topic]  oefening voor een gekozen skill en onderwerp
  /theme <thema>           thema van de sessie wijzigen
  /tutor <jan|sara>        andere tutor, geschiedenis begint opnieuw
  /record <pad>            opname starten vanaf een audiobestand
  /stop                    opname stoppen en als bericht versturen
  /speak                   voorlezen van tutor-antwoorden aan/uit
  /refresh                 sessiestatus opnieuw ophalen
  /state                   ruwe sessiestatus tonen
  /quit                    afsluiten";

/// Line-oriented front end over one tutoring session. Plain input is a chat
/// message, unless an exercise is active, then it is the answer to it.
pub struct Console {
    session: TutorSession,
    bridge: AudioBridge,
    settings: Settings,
    settings_path: PathBuf,
    recorder: Option<Recorder>,
    view: Option<ExerciseView>,
}

impl Console {
    pub fn new(
        session: TutorSession,
        bridge: AudioBridge,
        settings: Settings,
        settings_path: PathBuf,
    ) -> Self {
        Self {
            session,
            bridge,
            settings,
            settings_path,
            recorder: None,
            view: None,
        }
    }

    fn tutor_name(&self) -> String {
        let name = &self.session.state().tutor.name;
        if name.is_empty() {
            self.session.tutor().display_name().to_string()
        } else {
            name.clone()
        }
    }

    fn print_history_tail(&self) {
        for turn in self.session.state().chat_history.iter().rev().take(1).rev() {
            if turn.role == Role::Tutor {
                if let Some(text) = &turn.text {
                    println!("{}: {}", self.tutor_name(), text);
                }
            }
        }
    }

    async fn speak_if_enabled(&self, text: &str) {
        if !self.settings.speak_replies {
            return;
        }
        let tutor_id = self.session.tutor().id();
        if let Err(e) = self.bridge.speak(text, tutor_id).await {
            error!("Speech synthesis failed: {}", e);
        }
    }

    async fn chat(&mut self, message: &str) {
        match self.session.send_chat(message).await {
            Ok(reply) => {
                println!("{}: {}", self.tutor_name(), reply);
                self.speak_if_enabled(&reply).await;
            }
            // empty input never leaves the client, just ignore it
            Err(SessionError::EmptyInput) => {}
            Err(e) => {
                error!("Chat send failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    fn show_exercise(&mut self, view: ExerciseView) {
        for line in view.render_lines() {
            println!("{}", line);
        }
        if view.is_malformed() {
            warn!(
                "Exercise {} arrived without usable content",
                view.exercise().exercise_id
            );
        } else {
            println!();
            println!("(typ je antwoord, of een letter bij meerkeuze)");
        }
        self.view = Some(view);
    }

    async fn new_exercise(&mut self) {
        match self.session.request_exercise().await {
            Ok(exercise) => self.show_exercise(ExerciseView::new(exercise)),
            Err(e) => {
                error!("Exercise request failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    async fn generate_exercise(&mut self, rest: &[&str]) {
        let Some(skill_arg) = rest.first() else {
            println!("Gebruik: /generate <skill> [topic]");
            return;
        };
        let skill: Skill = match skill_arg.parse() {
            Ok(skill) => skill,
            Err(e) => {
                println!("! {}", e);
                return;
            }
        };
        let topic = if rest.len() > 1 {
            rest[1..].join(" ")
        } else {
            self.session.config().topic.clone()
        };
        match self.session.generate_exercise(skill, &topic).await {
            Ok(exercise) => self.show_exercise(ExerciseView::new(exercise)),
            Err(e) => {
                error!("Exercise generation failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    async fn answer(&mut self, input: &str) {
        let Some(view) = self.view.as_mut() else {
            return;
        };
        let answer = view.resolve_input(input);
        view.choose(&answer);

        // show the one-way marking before the grade comes back
        if view.exercise().kind.has_options() {
            for line in view.render_lines() {
                println!("{}", line);
            }
        }

        match self.session.submit_answer(&answer).await {
            Ok(outcome) => {
                self.view = None;
                let check = &outcome.check_result;
                match check.score_value() {
                    Some(score) => println!("Resultaat: {} (score {:.2})", check.result, score),
                    None => println!("Resultaat: {}", check.result),
                }
                if let Some(expected) = &check.expected {
                    println!("Verwacht: {}", expected);
                }
                if !outcome.feedback.feedback_text.is_empty() {
                    println!("{}: {}", self.tutor_name(), outcome.feedback.feedback_text);
                    self.speak_if_enabled(&outcome.feedback.feedback_text).await;
                }
                if !outcome.summary_message.is_empty() {
                    println!("{}", outcome.summary_message);
                }
            }
            Err(SessionError::EmptyInput) => {}
            Err(e) => {
                // the exercise stays active, the backend's own message is
                // shown verbatim
                error!("Answer submission failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    async fn set_theme(&mut self, rest: &[&str]) {
        let theme = rest.join(" ");
        match self.session.set_theme(&theme).await {
            Ok(_) => println!("Thema is nu: {}", theme.trim()),
            Err(SessionError::EmptyInput) => println!("Gebruik: /theme <thema>"),
            Err(e) => {
                error!("Theme change failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    async fn switch_tutor(&mut self, rest: &[&str]) {
        let Some(name) = rest.first() else {
            println!("Gebruik: /tutor <jan|sara>");
            return;
        };
        let persona: TutorPersona = match name.parse() {
            Ok(persona) => persona,
            Err(e) => {
                println!("! {}", e);
                return;
            }
        };
        match self.session.switch_tutor(persona).await {
            Ok(_) => {
                self.view = None;
                println!("Nieuwe sessie met {}.", persona.display_name());
                self.print_history_tail();
            }
            Err(e) => {
                error!("Tutor switch failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    async fn start_recording(&mut self, rest: &[&str]) {
        let Some(path) = rest.first() else {
            println!("Gebruik: /record <pad-naar-audiobestand>");
            return;
        };
        if let Some(recorder) = self.recorder.as_mut() {
            if recorder.is_recording() {
                // the guard refuses a second capture stream
                if let Err(e) = recorder.start().await {
                    println!("! {}", e);
                }
                return;
            }
        }
        let mut recorder = Recorder::new(Box::new(FileCapture::new(Path::new(path))));
        match recorder.start().await {
            Ok(()) => {
                self.recorder = Some(recorder);
                println!("Opname loopt. Gebruik /stop om te versturen.");
            }
            Err(e) => {
                error!("Recording start failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    async fn stop_recording(&mut self) {
        let Some(recorder) = self.recorder.as_mut() else {
            println!("Er loopt geen opname.");
            return;
        };
        let audio = match recorder.stop().await {
            Ok(audio) => audio,
            Err(e) => {
                println!("! {}", e);
                return;
            }
        };
        match self.bridge.transcribe(audio).await {
            Ok(text) => {
                println!("Jij (opname): {}", text);
                self.chat(&text).await;
            }
            Err(e) => {
                error!("Transcription failed: {}", e);
                println!("! {}", e);
            }
        }
    }

    fn toggle_speak(&mut self) {
        self.settings.speak_replies = !self.settings.speak_replies;
        if let Err(e) = self.settings.save(&self.settings_path) {
            warn!("Could not persist settings: {}", e);
        }
        if self.settings.speak_replies {
            println!("Voorlezen staat aan.");
        } else {
            println!("Voorlezen staat uit.");
        }
    }

    async fn refresh(&mut self) {
        match self.session.refresh().await {
            Ok(_) => self.print_history_tail(),
            Err(e) => println!("! {}", e),
        }
    }

    fn dump_state(&self) {
        match serde_json::to_string_pretty(self.session.state()) {
            Ok(raw) => println!("{}", raw),
            Err(e) => println!("! {}", e),
        }
    }

    /// Handles one input line. Returns false when the loop should end.
    async fn dispatch(&mut self, line: &str) -> bool {
        let line = line.trim();
        if line.is_empty() {
            return true;
        }

        if let Some(command) = line.strip_prefix('/') {
            let parts: Vec<&str> = command.split_whitespace().collect();
            let rest = parts.get(1..).unwrap_or(&[]);
            match parts.first().copied().unwrap_or("") {
                "exercise" => self.new_exercise().await,
                "generate" => self.generate_exercise(rest).await,
                "theme" => self.set_theme(rest).await,
                "tutor" => self.switch_tutor(rest).await,
                "record" => self.start_recording(rest).await,
                "stop" => self.stop_recording().await,
                "speak" => self.toggle_speak(),
                "refresh" => self.refresh().await,
                "state" => self.dump_state(),
                "help" => println!("{}", HELP),
                "quit" | "exit" => return false,
                other => println!("Onbekend commando: /{} (zie /help)", other),
            }
            return true;
        }

        if self.view.is_some() {
            self.answer(line).await;
        } else {
            self.chat(line).await;
        }
        true
    }

    pub async fn run(mut self) -> Result<(), Box<dyn Error + Send + Sync>> {
        println!("Verbonden met {}.", self.tutor_name());
        println!("Typ een bericht, of /help voor commando's.");
        self.print_history_tail();

        let stdin = BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                break;
            };
            if !self.dispatch(&line).await {
                break;
            }
        }
        info!("Console session ended");
        Ok(())
    }
}
