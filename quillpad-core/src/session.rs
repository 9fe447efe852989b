//! # Session
//!
//! Ties the open document to the file it came from, and runs the user-facing side of loading
//! and saving: prompts, notices, the default canvas, and the dirty flag.
//!
//! Everything here blocks the calling thread until the file operation is done.

use crate::config::ConfigDir;
use crate::frontend::{Answer, Frontend};
use crate::io::{self, last_canvas, DecodeContext, DecodeError, SaveError, Version};
use crate::settings::{Settings, SwitchSaveTarget};
use crate::state::Document;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

/// Bookkeeping about the file behind the open document.
#[derive(Clone, Debug)]
pub struct Persist {
    pub path: PathBuf,
    /// Schema the file on disk is in. [`Version::CURRENT`] once upgraded or saved.
    pub binary_version: Version,
    /// Wall-clock time of the last successful save.
    pub last_save_time: Option<SystemTime>,
    /// Set before every save and cleared when it succeeds.
    pub last_save_failed: bool,
    /// Size of the last successful save.
    pub bytes_written: u64,
    /// Saving should average no more than this much disk traffic.
    pub target_mb_per_sec: f32,
}
impl Persist {
    pub const DEFAULT_TARGET_MB_PER_SEC: f32 = 0.2;

    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            binary_version: Version::CURRENT,
            last_save_time: None,
            last_save_failed: false,
            bytes_written: 0,
            target_mb_per_sec: Self::DEFAULT_TARGET_MB_PER_SEC,
        }
    }
    /// How long to wait after a save of the last save's size to stay within the target rate.
    #[must_use]
    pub fn save_interval(&self) -> Duration {
        let bytes_per_sec = f64::from(self.target_mb_per_sec) * 1_000_000.0;
        if bytes_per_sec <= 0.0 {
            return Duration::ZERO;
        }
        Duration::try_from_secs_f64(self.bytes_written as f64 / bytes_per_sec)
            .unwrap_or(Duration::MAX)
    }
    /// Whether enough time passed since the last save.
    #[must_use]
    pub fn save_due(&self, now: SystemTime) -> bool {
        match self.last_save_time {
            None => true,
            // Clock went backwards, save anyway.
            Some(last) => now
                .duration_since(last)
                .map_or(true, |elapsed| elapsed >= self.save_interval()),
        }
    }
}

pub struct Session {
    pub document: Document,
    pub persist: Persist,
    pub has_unsaved_changes: bool,
    /// The document lives in the config dir, because the user never picked a file for it.
    pub is_default_canvas: bool,
    pub config: ConfigDir,
    pub settings: Settings,
}
impl Session {
    /// A blank document on the default canvas.
    #[must_use]
    pub fn new(config: ConfigDir, settings: Settings, screen_size: [i32; 2]) -> Self {
        let document = Document::new(screen_size, settings.misc.background_color);
        let persist = Persist::new(config.default_canvas());
        Self {
            document,
            persist,
            has_unsaved_changes: false,
            is_default_canvas: true,
            config,
            settings,
        }
    }
    /// Some edit happened.
    pub fn mark_changed(&mut self) {
        self.has_unsaved_changes = true;
    }
    /// Point the session at `path`, and remember it as the canvas to reopen next time.
    pub fn set_canvas_file(&mut self, path: PathBuf) {
        self.is_default_canvas = path == self.config.default_canvas();
        if self.is_default_canvas {
            if let Err(err) = last_canvas::unset_last_canvas(&self.config) {
                log::warn!("could not forget last canvas: {err}");
            }
        } else if let Err(err) = last_canvas::set_last_canvas(&self.config, &path) {
            log::warn!("could not remember last canvas: {err}");
        }
        self.persist = Persist {
            path,
            target_mb_per_sec: self.persist.target_mb_per_sec,
            ..Persist::new(PathBuf::new())
        };
    }
    /// Point the session at the default canvas.
    pub fn set_default_canvas_file(&mut self) {
        self.set_canvas_file(self.config.default_canvas());
    }
    /// Throw away the document and start blank on the default canvas.
    pub fn reset_to_default(&mut self) {
        self.document = Document::new(
            self.document.view.screen_size,
            self.settings.misc.background_color,
        );
        self.has_unsaved_changes = false;
        self.set_default_canvas_file();
    }

    /// Open the document at `path`.
    ///
    /// Older files are only opened if the user agrees to an upgrade. If the user declines, or
    /// the file is from a newer version, the open document stays as it was. A file that doesn't
    /// exist yet opens as a blank document at `path`. Any other failure is reported and falls
    /// back to a blank default canvas.
    /// # Errors
    /// Whatever stopped the load. The session is usable either way.
    pub fn open(
        &mut self,
        path: PathBuf,
        frontend: &mut impl Frontend,
    ) -> Result<Version, DecodeError> {
        let context = DecodeContext::replacing(&self.document, self.settings.misc.background_color);
        let result = io::load_document(&path, &context, |version| {
            frontend.confirm(
                "File format change",
                &format!(
                    "This file ({version}) will be updated to the current format ({}). \
                    Older versions won't be able to open it. Is this OK?",
                    Version::CURRENT
                ),
            )
        });
        match result {
            Ok((document, version)) => {
                self.document = document;
                self.has_unsaved_changes = false;
                self.set_canvas_file(path);
                // Stays the old schema on disk until the next save.
                self.persist.binary_version = version;
                frontend.request_full_redraw();
                Ok(version)
            }
            Err(err) => {
                self.open_failed(path, &err, frontend);
                Err(err)
            }
        }
    }
    fn open_failed(&mut self, path: PathBuf, err: &DecodeError, frontend: &mut impl Frontend) {
        match err {
            DecodeError::Codec(io::common::CodecError::IO(io_err))
                if io_err.kind() == std::io::ErrorKind::NotFound =>
            {
                log::info!("{} doesn't exist yet, starting blank", path.display());
                self.reset_to_default();
                self.set_canvas_file(path);
                frontend.request_full_redraw();
                return;
            }
            DecodeError::UpgradeDeclined => {
                log::info!("upgrade of {} declined", path.display());
                return;
            }
            DecodeError::NewerVersion(version) => {
                log::warn!("{} is from a newer version ({version})", path.display());
                frontend.notify(
                    "Could not open",
                    "This file was created with a newer version of this program.",
                );
                return;
            }
            DecodeError::BadMagic(_) => {
                log::error!("{}: {err}", path.display());
                frontend.notify("Problem", "The file could not be loaded. Magic number mismatch.");
                // Don't try to reopen it at next start.
                if let Err(err) = last_canvas::unset_last_canvas(&self.config) {
                    log::warn!("could not forget last canvas: {err}");
                }
            }
            _ => {
                log::error!("loading {} failed: {err}", path.display());
                frontend.notify(
                    "Error",
                    "Tried to load a corrupt file or there was an error reading from disk.",
                );
            }
        }
        self.reset_to_default();
        frontend.request_full_redraw();
    }

    /// Open the canvas remembered from last time, or the default canvas.
    /// # Errors
    /// See [`Self::open`].
    pub fn open_last(&mut self, frontend: &mut impl Frontend) -> Result<Version, DecodeError> {
        let path =
            last_canvas::last_canvas(&self.config).unwrap_or_else(|| self.config.default_canvas());
        self.open(path, frontend)
    }

    /// Write the document to `path`, keeping the bookkeeping of [`Persist`] current.
    fn write_document(&mut self, path: &Path) -> Result<u64, SaveError> {
        if path == self.config.default_canvas() {
            self.config.create().map_err(|source| SaveError::Create {
                path: self.config.path().to_owned(),
                source,
            })?;
        }
        let bytes_written = io::save_document(path, &self.document)?;
        self.persist.last_save_time = Some(SystemTime::now());
        self.persist.bytes_written = bytes_written;
        Ok(bytes_written)
    }

    /// Save over the session's file.
    ///
    /// On failure the file on disk is untouched, the document stays dirty, and the user is told.
    /// # Errors
    /// See [`SaveError`].
    pub fn save(&mut self, frontend: &mut impl Frontend) -> Result<u64, SaveError> {
        // Assume failure, cleared on success.
        self.persist.last_save_failed = true;
        let path = self.persist.path.clone();
        match self.write_document(&path) {
            Ok(bytes_written) => {
                self.persist.last_save_failed = false;
                self.persist.binary_version = Version::CURRENT;
                self.has_unsaved_changes = false;
                Ok(bytes_written)
            }
            Err(err) => {
                log::error!("saving {} failed: {err}", path.display());
                frontend.notify("Save error", &format!("Failed to write to the file! {err}"));
                Err(err)
            }
        }
    }

    /// Save a copy to `path`, then maybe continue editing that copy depending on
    /// [`crate::settings::MiscSettings::switch_save_target`].
    /// # Errors
    /// See [`SaveError`]. The session is unchanged on error.
    pub fn save_as(
        &mut self,
        path: PathBuf,
        frontend: &mut impl Frontend,
    ) -> Result<u64, SaveError> {
        let bytes_written = match self.write_document(&path) {
            Ok(bytes_written) => bytes_written,
            Err(err) => {
                log::error!("saving {} failed: {err}", path.display());
                frontend.notify("Warning", &format!("Could not save to {}", path.display()));
                return Err(err);
            }
        };
        let switch = match self.settings.misc.switch_save_target() {
            SwitchSaveTarget::OnSave => true,
            SwitchSaveTarget::Never => false,
            SwitchSaveTarget::Ask => frontend.confirm(
                "Switch to new file?",
                &format!(
                    "Successfully wrote save to {}. Would you like to edit it?",
                    path.display()
                ),
            ),
        };
        if switch {
            let was_default = self.is_default_canvas;
            self.set_canvas_file(path);
            self.persist.bytes_written = bytes_written;
            self.persist.last_save_time = Some(SystemTime::now());
            self.has_unsaved_changes = false;
            if was_default {
                self.delete_default_canvas(frontend);
            }
        }
        Ok(bytes_written)
    }

    /// Ask for a destination and [`Self::save_as`] there. Returns false if the user cancelled
    /// or the save failed.
    pub fn save_as_dialog(&mut self, frontend: &mut impl Frontend) -> bool {
        match frontend.choose_save_path() {
            Some(path) => self.save_as(path, frontend).is_ok(),
            None => false,
        }
    }

    /// Before the default canvas is cleared, offer to keep its contents in a file of the
    /// user's choosing.
    ///
    /// Returns false if the user cancelled, in which case nothing may be cleared.
    pub fn prompt_and_save_default_canvas_as(&mut self, frontend: &mut impl Frontend) -> bool {
        let answer = if self.is_default_canvas && self.document.stroke_count() > 0 {
            frontend.confirm_or_cancel(
                "Save?",
                "The default canvas will be cleared. Save it to a file first?",
            )
        } else {
            Answer::No
        };
        match answer {
            Answer::Cancel => return false,
            Answer::Yes => {
                let Some(path) = frontend.choose_save_path() else {
                    return false;
                };
                log::info!("saving default canvas to {}", path.display());
                self.set_canvas_file(path);
                // Failure is reported to the user and recorded in `last_save_failed`.
                let _ = self.save(frontend);
            }
            Answer::No => (),
        }
        if !self.persist.last_save_failed {
            self.delete_default_canvas(frontend);
        }
        true
    }

    /// Start a blank canvas, after offering to save the default canvas.
    /// Returns false if the user cancelled.
    pub fn new_canvas(&mut self, frontend: &mut impl Frontend) -> bool {
        if !self.prompt_and_save_default_canvas_as(frontend) {
            return false;
        }
        self.reset_to_default();
        frontend.request_full_redraw();
        true
    }

    fn delete_default_canvas(&mut self, frontend: &mut impl Frontend) {
        if let Err(err) = self.config.delete(ConfigDir::DEFAULT_CANVAS) {
            log::warn!("could not delete default canvas: {err}");
            frontend.notify(
                "Info",
                "Could not delete the default canvas. The current drawing may still be there \
                when you try to create a new one.",
            );
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::brush::Brush;
    use crate::stroke::{Stroke, StrokeFlags};
    use crate::util::Rect;
    use std::collections::VecDeque;

    /// Replies from a script, and records everything shown.
    #[derive(Default)]
    struct Scripted {
        confirms: VecDeque<bool>,
        answers: VecDeque<Answer>,
        save_paths: VecDeque<Option<PathBuf>>,
        notices: Vec<String>,
        prompts: usize,
        redraws: usize,
    }
    impl Frontend for Scripted {
        fn confirm(&mut self, _: &str, _: &str) -> bool {
            self.prompts += 1;
            self.confirms.pop_front().expect("unexpected confirm")
        }
        fn confirm_or_cancel(&mut self, _: &str, _: &str) -> Answer {
            self.prompts += 1;
            self.answers.pop_front().expect("unexpected prompt")
        }
        fn notify(&mut self, title: &str, _: &str) {
            self.notices.push(title.to_owned());
        }
        fn choose_save_path(&mut self) -> Option<PathBuf> {
            self.save_paths.pop_front().expect("unexpected file dialog")
        }
        fn request_full_redraw(&mut self) {
            self.redraws += 1;
        }
    }

    fn session(dir: &Path) -> Session {
        Session::new(
            ConfigDir::at(dir.join("config")),
            Settings::default(),
            [640, 480],
        )
    }
    fn draw(session: &mut Session) {
        let document = &mut session.document;
        let mut stroke = Stroke {
            id: document.next_stroke_id(),
            layer_id: document.layers[0].id,
            brush: Brush::default(),
            flags: StrokeFlags::empty(),
            points: vec![[0, 0], [10, 10]],
            pressures: vec![1.0, 0.5],
            bounding_rect: Rect::EMPTY,
        };
        stroke.update_bounds();
        document.layers[0].strokes.push(stroke);
        session.mark_changed();
    }
    fn header(magic: u32, version: u32) -> Vec<u8> {
        let mut bytes = magic.to_le_bytes().to_vec();
        bytes.extend_from_slice(&version.to_le_bytes());
        bytes
    }

    #[test]
    fn save_and_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drawing.quill");
        let mut frontend = Scripted::default();

        let mut first = session(dir.path());
        first.set_canvas_file(path.clone());
        draw(&mut first);
        let written = first.save(&mut frontend).unwrap();
        assert!(!first.has_unsaved_changes);
        assert!(!first.persist.last_save_failed);
        assert_eq!(first.persist.bytes_written, written);
        assert!(first.persist.last_save_time.is_some());
        assert_eq!(last_canvas::last_canvas(&first.config), Some(path.clone()));

        let mut second = session(dir.path());
        assert_eq!(second.open_last(&mut frontend).unwrap(), Version::CURRENT);
        assert_eq!(second.persist.path, path);
        assert!(!second.is_default_canvas);
        assert_eq!(second.document.layers, first.document.layers);
        assert_eq!(frontend.redraws, 1);
        assert!(frontend.notices.is_empty());
    }

    #[test]
    fn failed_save_stays_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut frontend = Scripted::default();
        let mut session = session(dir.path());
        session.set_canvas_file(dir.path().join("missing").join("drawing.quill"));
        draw(&mut session);

        assert!(session.save(&mut frontend).is_err());
        assert!(session.has_unsaved_changes);
        assert!(session.persist.last_save_failed);
        assert!(session.persist.last_save_time.is_none());
        assert_eq!(frontend.notices, ["Save error"]);
    }

    #[test]
    fn newer_version_keeps_live_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("future.quill");
        std::fs::write(&path, header(io::MAGIC, Version::CURRENT.0 + 1)).unwrap();
        let mut frontend = Scripted::default();
        let mut session = session(dir.path());
        draw(&mut session);
        let before = session.document.clone();

        assert!(matches!(
            session.open(path, &mut frontend),
            Err(DecodeError::NewerVersion(_))
        ));
        assert_eq!(session.document, before);
        assert!(session.has_unsaved_changes);
        assert!(session.is_default_canvas);
        assert_eq!(frontend.notices, ["Could not open"]);
        assert_eq!(frontend.redraws, 0);
    }

    #[test]
    fn declined_upgrade_is_silent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.quill");
        std::fs::write(&path, header(io::MAGIC, 3)).unwrap();
        let mut frontend = Scripted {
            confirms: [false].into(),
            ..Scripted::default()
        };
        let mut session = session(dir.path());
        draw(&mut session);
        let before = session.document.clone();

        assert!(matches!(
            session.open(path, &mut frontend),
            Err(DecodeError::UpgradeDeclined)
        ));
        assert_eq!(frontend.prompts, 1);
        assert!(frontend.notices.is_empty());
        assert_eq!(session.document, before);
    }

    #[test]
    fn bad_magic_falls_back_and_forgets() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.quill");
        std::fs::write(&path, header(0xDEAD_BEEF, Version::CURRENT.0)).unwrap();
        let mut frontend = Scripted::default();
        let mut session = session(dir.path());
        session.set_canvas_file(path.clone());
        draw(&mut session);
        assert_eq!(last_canvas::last_canvas(&session.config), Some(path.clone()));

        assert!(matches!(
            session.open(path, &mut frontend),
            Err(DecodeError::BadMagic(0xDEAD_BEEF))
        ));
        assert_eq!(session.document.stroke_count(), 0);
        assert_eq!(session.document.layers.len(), 1);
        assert!(session.is_default_canvas);
        assert!(!session.has_unsaved_changes);
        assert_eq!(last_canvas::last_canvas(&session.config), None);
        assert_eq!(frontend.notices, ["Problem"]);
    }

    #[test]
    fn truncated_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.quill");
        std::fs::write(&path, header(io::MAGIC, Version::CURRENT.0)).unwrap();
        let mut frontend = Scripted::default();
        let mut session = session(dir.path());
        draw(&mut session);

        assert!(matches!(
            session.open(path, &mut frontend),
            Err(DecodeError::Codec(_))
        ));
        assert_eq!(session.document.stroke_count(), 0);
        assert!(session.is_default_canvas);
        assert_eq!(frontend.notices, ["Error"]);
    }

    #[test]
    fn missing_file_starts_blank() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.quill");
        let mut frontend = Scripted::default();
        let mut session = session(dir.path());
        draw(&mut session);

        assert!(session.open(path.clone(), &mut frontend).is_err());
        assert!(frontend.notices.is_empty());
        assert_eq!(session.document.stroke_count(), 0);
        assert_eq!(session.persist.path, path);
        assert!(!session.is_default_canvas);
    }

    #[test]
    fn save_as_switch_target() {
        let dir = tempfile::tempdir().unwrap();
        let mut frontend = Scripted::default();
        let mut session = session(dir.path());
        draw(&mut session);

        session
            .settings
            .misc
            .set_switch_save_target(SwitchSaveTarget::Never);
        let copy = dir.path().join("copy.quill");
        session.save_as(copy.clone(), &mut frontend).unwrap();
        assert!(copy.exists());
        assert!(session.is_default_canvas);
        assert!(session.has_unsaved_changes);

        session
            .settings
            .misc
            .set_switch_save_target(SwitchSaveTarget::Ask);
        frontend.confirms.push_back(false);
        session.save_as(copy.clone(), &mut frontend).unwrap();
        assert!(session.is_default_canvas);

        // Switching away from the default canvas deletes it.
        session.save(&mut frontend).unwrap();
        assert!(session.config.default_canvas().exists());
        session
            .settings
            .misc
            .set_switch_save_target(SwitchSaveTarget::OnSave);
        session.save_as(copy.clone(), &mut frontend).unwrap();
        assert_eq!(session.persist.path, copy);
        assert!(!session.is_default_canvas);
        assert!(!session.config.default_canvas().exists());
        assert_eq!(frontend.prompts, 1);
    }

    #[test]
    fn save_as_failure_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut frontend = Scripted {
            save_paths: [Some(dir.path().join("nope").join("x.quill"))].into(),
            ..Scripted::default()
        };
        let mut session = session(dir.path());
        assert!(!session.save_as_dialog(&mut frontend));
        assert!(session.is_default_canvas);
        assert_eq!(frontend.notices, ["Warning"]);
    }

    #[test]
    fn default_canvas_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("kept.quill");
        let mut session = session(dir.path());
        draw(&mut session);
        let mut frontend = Scripted::default();
        session.save(&mut frontend).unwrap();
        assert!(session.config.default_canvas().exists());

        // Cancel, at the prompt then at the file dialog.
        frontend.answers.push_back(Answer::Cancel);
        assert!(!session.new_canvas(&mut frontend));
        frontend.answers.push_back(Answer::Yes);
        frontend.save_paths.push_back(None);
        assert!(!session.new_canvas(&mut frontend));
        assert_eq!(session.document.stroke_count(), 1);
        assert!(session.config.default_canvas().exists());

        frontend.answers.push_back(Answer::Yes);
        frontend.save_paths.push_back(Some(target.clone()));
        assert!(session.prompt_and_save_default_canvas_as(&mut frontend));
        assert_eq!(session.persist.path, target);
        assert!(target.exists());
        assert!(!session.config.default_canvas().exists());

        // No longer the default canvas, so no prompt.
        assert!(session.new_canvas(&mut frontend));
        assert!(session.is_default_canvas);
        assert_eq!(session.document.stroke_count(), 0);
        assert_eq!(frontend.prompts, 3);
    }

    #[test]
    fn save_interval_tracks_size() {
        let mut persist = Persist::new(PathBuf::from("x"));
        assert!(persist.save_due(SystemTime::now()));
        persist.bytes_written = 2_000_000;
        persist.target_mb_per_sec = 1.0;
        assert_eq!(persist.save_interval(), Duration::from_secs(2));
        let now = SystemTime::now();
        persist.last_save_time = Some(now);
        assert!(!persist.save_due(now + Duration::from_secs(1)));
        assert!(persist.save_due(now + Duration::from_secs(3)));
        persist.target_mb_per_sec = 0.0;
        assert_eq!(persist.save_interval(), Duration::ZERO);
    }
}
