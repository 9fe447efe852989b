//! # Frontend
//!
//! The few things persistence needs from whoever hosts it: dialogs, a file picker, and redraws.

use std::path::PathBuf;

/// Reply to a yes/no/cancel prompt.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum Answer {
    Yes,
    No,
    Cancel,
}

pub trait Frontend {
    /// Ask a yes/no question. Blocks until answered.
    fn confirm(&mut self, title: &str, message: &str) -> bool;
    /// Ask a yes/no/cancel question. Blocks until answered.
    fn confirm_or_cancel(&mut self, title: &str, message: &str) -> Answer;
    /// Tell the user something. Blocks until acknowledged.
    fn notify(&mut self, title: &str, message: &str);
    /// Ask where to save a document. `None` if the user cancelled.
    fn choose_save_path(&mut self) -> Option<PathBuf>;
    /// The whole document was replaced and must be rendered from scratch.
    fn request_full_redraw(&mut self) {}
}
