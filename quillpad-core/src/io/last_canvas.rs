//! # Last canvas
//!
//! Remembers which document to reopen at startup, as a `u64` byte length followed by the
//! NUL-terminated UTF-8 path.

use super::atomic::{self, SaveError};
use super::common::{open_if_exists, CodecError};
use crate::config::ConfigDir;
use std::path::{Path, PathBuf};

/// Longest stored path, including the terminator. Longer records are ignored.
pub const MAX_PATH_LEN: u64 = 4096;

#[derive(thiserror::Error, Debug)]
pub enum LastCanvasError {
    #[error("path {} is not valid unicode", .0.display())]
    NotUnicode(PathBuf),
    #[error("path is {} bytes, longer than the {} allowed", .0, MAX_PATH_LEN)]
    TooLong(u64),
    #[error("could not create config directory: {}", .0)]
    CreateDir(std::io::Error),
    #[error(transparent)]
    Save(#[from] SaveError),
}

/// Remember `path` as the canvas to open next time.
/// # Errors
/// Paths that can't be stored, or a failure writing the pointer file.
pub fn set_last_canvas(config: &ConfigDir, path: &Path) -> Result<(), LastCanvasError> {
    let text = path
        .to_str()
        .ok_or_else(|| LastCanvasError::NotUnicode(path.to_owned()))?;
    let len = text.len() as u64 + 1;
    if len >= MAX_PATH_LEN {
        return Err(LastCanvasError::TooLong(len));
    }
    config.create().map_err(LastCanvasError::CreateDir)?;
    atomic::write_atomic(&config.file(ConfigDir::LAST_CANVAS), |w| {
        w.write_pod(&len)?;
        w.write_bytes(text.as_bytes())?;
        w.write_bytes(&[0])?;
        Ok::<_, CodecError>(false)
    })?;
    log::debug!("last canvas is now {}", path.display());
    Ok(())
}

/// The canvas remembered by [`set_last_canvas`], if any.
///
/// An unreadable or malformed pointer is treated as absent. The path may no longer exist.
#[must_use]
pub fn last_canvas(config: &ConfigDir) -> Option<PathBuf> {
    let read = || -> Result<Option<PathBuf>, CodecError> {
        let Some(mut reader) = open_if_exists(&config.file(ConfigDir::LAST_CANVAS))? else {
            return Ok(None);
        };
        let len = reader.read_pod::<u64>()?;
        if len >= MAX_PATH_LEN {
            log::warn!("ignoring last canvas pointer of {len} bytes");
            return Ok(None);
        }
        // Bounded above
        let mut bytes = reader.read_vec::<u8>(len as usize)?;
        while bytes.last() == Some(&0) {
            bytes.pop();
        }
        match String::from_utf8(bytes) {
            Ok(text) if !text.is_empty() => Ok(Some(PathBuf::from(text))),
            _ => {
                log::warn!("ignoring malformed last canvas pointer");
                Ok(None)
            }
        }
    };
    read().unwrap_or_else(|err| {
        log::warn!("could not read last canvas: {err}");
        None
    })
}

/// Forget the last canvas. Succeeds if there was none.
/// # Errors
/// Any I/O error besides the pointer not existing.
pub fn unset_last_canvas(config: &ConfigDir) -> std::io::Result<()> {
    config.delete(ConfigDir::LAST_CANVAS)
}
