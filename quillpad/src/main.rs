#![warn(clippy::pedantic)]

use anyhow::Result as AnyResult;
use quillpad_core::{
    config::ConfigDir,
    frontend::{Answer, Frontend},
    io::settings::{self, SettingsError},
    session::Session,
    settings::Settings,
};
use std::io::Write;

/// There is no window, but views still want a size to center on.
const SCREEN_SIZE: [i32; 2] = [1280, 720];

/// Prompts and notices on stdin/stdout.
struct Terminal;
impl Terminal {
    /// Print a prompt and read one trimmed line. `None` on EOF or error.
    fn ask(title: &str, message: &str, choices: &str) -> Option<String> {
        let mut stdout = std::io::stdout().lock();
        let _ = write!(stdout, "[{title}] {message} {choices} ");
        let _ = stdout.flush();
        let mut line = String::new();
        match std::io::stdin().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_owned()),
        }
    }
}
impl Frontend for Terminal {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        Self::ask(title, message, "[y/N]").is_some_and(|reply| reply.eq_ignore_ascii_case("y"))
    }
    fn confirm_or_cancel(&mut self, title: &str, message: &str) -> Answer {
        match Self::ask(title, message, "[y/n/C]").as_deref() {
            Some("y" | "Y") => Answer::Yes,
            Some("n" | "N") => Answer::No,
            _ => Answer::Cancel,
        }
    }
    fn notify(&mut self, title: &str, message: &str) {
        println!("[{title}] {message}");
    }
    fn choose_save_path(&mut self) -> Option<std::path::PathBuf> {
        Self::ask("Save as", "Path to save to, empty to cancel:", "")
            .filter(|reply| !reply.is_empty())
            .map(Into::into)
    }
}

fn load_settings(config: &ConfigDir) -> Settings {
    match settings::load_settings(config) {
        Ok(settings) => settings,
        Err(SettingsError::NotFound) => {
            log::info!("no settings yet, using defaults");
            Settings::default()
        }
        Err(e) => {
            log::warn!("failed to read settings, using defaults: {e}");
            Settings::default()
        }
    }
}

fn main() -> AnyResult<()> {
    let has_term = std::io::IsTerminal::is_terminal(&std::io::stdin());
    // Log to a terminal, if available. Else, log to "log.out" in the working directory.
    if has_term {
        env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        let _ = simple_logging::log_to_file("log.out", log::LevelFilter::Debug);
    }

    let config = ConfigDir::preferences()
        .ok_or_else(|| anyhow::anyhow!("no per-user preferences directory on this platform"))?;
    log::debug!("config directory is {}", config.path().display());
    let user_settings = load_settings(&config);
    match settings::load_platform_settings(&config) {
        Ok(platform) => log::debug!("window placement {platform:?}"),
        Err(e) => log::debug!("no window placement: {e}"),
    }

    let mut frontend = Terminal;
    let mut session = Session::new(config, user_settings, SCREEN_SIZE);

    // A single optional path to open, else whatever was open last time.
    let opened = match std::env::args_os().nth(1) {
        Some(path) => session.open(path.into(), &mut frontend),
        None => session.open_last(&mut frontend),
    };
    match opened {
        Ok(version) => {
            log::info!("opened {} ({version})", session.persist.path.display());
            if session.persist.binary_version.needs_upgrade() {
                // Failures are already reported to the user.
                let _ = session.save(&mut frontend);
            }
        }
        Err(e) => log::warn!("failed to open: {e}"),
    }

    let document = &session.document;
    println!(
        "{}: {} layers, {} strokes, {} undo records{}",
        session.persist.path.display(),
        document.layers.len(),
        document.stroke_count(),
        document.history.len(),
        if session.is_default_canvas {
            " (default canvas)"
        } else {
            ""
        }
    );
    if session.persist.bytes_written != 0 {
        println!(
            "wrote {}",
            human_bytes::human_bytes(session.persist.bytes_written as f64)
        );
    }

    match settings::save_settings(&session.config, &session.settings, || {
        frontend.confirm(
            "Settings",
            "The settings file is from a newer version. Overwrite it?",
        )
    }) {
        Ok(true) => (),
        Ok(false) => log::info!("settings left as they were"),
        Err(e) => log::warn!("failed to save settings: {e}"),
    }
    Ok(())
}
