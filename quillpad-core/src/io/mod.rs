//! # Persistence
//!
//! Single-file binary documents, settings, and image export. All operations here block the
//! calling thread until done.

pub mod atomic;
pub mod common;
pub mod decode;
pub mod encode;
pub mod export;
pub mod last_canvas;
pub mod settings;
pub mod version;

use std::path::Path;

pub use atomic::SaveError;
pub use decode::{DecodeContext, DecodeError};
pub use version::Version;

/// First four bytes of every document.
pub const MAGIC: u32 = 0x11DE_CAF3;
/// Extension of document files, without the dot.
pub const EXTENSION: &str = "quill";

/// Encode `document` and atomically replace the file at `path` with it.
///
/// Returns the number of bytes written.
/// # Errors
/// See [`SaveError`]. The file at `path` is never modified on error.
pub fn save_document(path: &Path, document: &crate::state::Document) -> Result<u64, SaveError> {
    log::info!("saving {}", path.display());
    let bytes_written = atomic::write_atomic(path, |w| {
        encode::encode(document, w).map(|encoded| encoded.degraded)
    })?;
    log::info!(
        "saved {} ({})",
        path.display(),
        human_bytes::human_bytes(bytes_written as f64)
    );
    Ok(bytes_written)
}

/// Decode the document at `path`. See [`decode::decode`].
/// # Errors
/// See [`DecodeError`].
pub fn load_document(
    path: &Path,
    context: &DecodeContext,
    confirm_upgrade: impl FnOnce(Version) -> bool,
) -> Result<(crate::state::Document, Version), DecodeError> {
    let file = std::fs::File::open(path).map_err(common::CodecError::from)?;
    let len = file.metadata().map_err(common::CodecError::from)?.len();
    log::info!(
        "loading {} ({})",
        path.display(),
        human_bytes::human_bytes(len as f64)
    );
    let mut reader = common::Reader::new(std::io::BufReader::new(file), len);
    let (document, version) = decode::decode(&mut reader, context, confirm_upgrade)?;
    log::info!("loaded {} ({version})", path.display());
    Ok((document, version))
}
