//! # Transactional file writer
//!
//! Writes go to a temporary sibling of the target, which only replaces the target once it was
//! written, flushed, and synced in full. A crash at any point leaves the target as it was.

use super::common::{CodecError, Writer};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

#[derive(thiserror::Error, Debug)]
pub enum SaveError {
    #[error("could not create {}: {}", .path.display(), .source)]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("writing failed: {}", .0)]
    Codec(#[from] CodecError),
    #[error("could not sync {}: {}", .path.display(), .source)]
    Sync {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not move {} over {}: {}", .temp_path.display(), .target_path.display(), .source)]
    Replace {
        temp_path: PathBuf,
        target_path: PathBuf,
        source: std::io::Error,
    },
    /// The content was written, but some of it had to be left out.
    /// The partial copy is kept for manual recovery and the target is left alone.
    #[error("only part of the data could be written, kept at {}", .kept.display())]
    Degraded { kept: PathBuf, bytes_written: u64 },
    #[error("{}", .0)]
    Encode(#[from] super::encode::EncodeError),
}

/// The sibling written to before replacing `target`. Unique per process.
#[must_use]
pub fn temp_path(target: &Path) -> PathBuf {
    let mut name = target
        .file_name()
        .map(std::ffi::OsStr::to_os_string)
        .unwrap_or_default();
    name.push(format!(".tmp_{}", std::process::id()));
    target.with_file_name(name)
}

/// Atomically replace `target` with whatever `body` writes.
///
/// `body` returns whether its output is degraded, in which case the temporary file is kept and the
/// target is not replaced. If `body` fails, the temporary file is removed.
///
/// Blocks the calling thread until the data is synced to disk.
/// # Errors
/// See [`SaveError`]. The target file is untouched on every error.
pub fn write_atomic<E>(
    target: &Path,
    body: impl FnOnce(&mut Writer<BufWriter<File>>) -> Result<bool, E>,
) -> Result<u64, SaveError>
where
    SaveError: From<E>,
{
    let temp = temp_path(target);
    match write_temp(&temp, body) {
        Err(err) => {
            // May not exist if creation failed.
            let _ = fs::remove_file(&temp);
            Err(err)
        }
        Ok((true, bytes_written)) => {
            log::warn!(
                "degraded save of {} kept at {}",
                target.display(),
                temp.display()
            );
            Err(SaveError::Degraded {
                kept: temp,
                bytes_written,
            })
        }
        Ok((false, bytes_written)) => match fs::rename(&temp, target) {
            Ok(()) => Ok(bytes_written),
            Err(source) => {
                let _ = fs::remove_file(&temp);
                Err(SaveError::Replace {
                    temp_path: temp,
                    target_path: target.to_owned(),
                    source,
                })
            }
        },
    }
}

fn write_temp<E>(
    temp: &Path,
    body: impl FnOnce(&mut Writer<BufWriter<File>>) -> Result<bool, E>,
) -> Result<(bool, u64), SaveError>
where
    SaveError: From<E>,
{
    let file = File::create(temp).map_err(|source| SaveError::Create {
        path: temp.to_owned(),
        source,
    })?;
    let mut writer = Writer::new(BufWriter::new(file));
    let degraded = body(&mut writer)?;
    writer.flush()?;
    let bytes_written = writer.bytes_written();
    let file = writer
        .into_inner()
        .into_inner()
        .map_err(|err| CodecError::from(err.into_error()))?;
    file.sync_all().map_err(|source| SaveError::Sync {
        path: temp.to_owned(),
        source,
    })?;
    Ok((degraded, bytes_written))
}

#[cfg(test)]
mod test {
    use super::{temp_path, write_atomic, SaveError};
    use crate::color::Rgb;
    use crate::io::common::{CodecError, Writer};
    use crate::io::encode::{encode, EncodeError};
    use crate::state::{view::CanvasView, Document};

    #[test]
    fn temp_is_sibling() {
        let temp = temp_path(std::path::Path::new("/some/dir/drawing.quill"));
        assert_eq!(temp.parent(), Some(std::path::Path::new("/some/dir")));
        let name = temp.file_name().unwrap().to_string_lossy().into_owned();
        assert_eq!(name, format!("drawing.quill.tmp_{}", std::process::id()));
    }
    #[test]
    fn success_replaces_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("file.bin");
        std::fs::write(&target, b"old").unwrap();

        let written = write_atomic(&target, |w| {
            w.write_bytes(b"brand new")?;
            Ok::<_, CodecError>(false)
        })
        .unwrap();
        assert_eq!(written, 9);
        assert_eq!(std::fs::read(&target).unwrap(), b"brand new");
        assert!(!temp_path(&target).exists());
    }
    #[test]
    fn failure_leaves_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("file.bin");
        std::fs::write(&target, b"precious").unwrap();

        let result = write_atomic(&target, |w| {
            w.write_bytes(b"half of the da")?;
            Err::<bool, _>(CodecError::ShortWrite)
        });
        assert!(matches!(
            result,
            Err(SaveError::Codec(CodecError::ShortWrite))
        ));
        assert_eq!(std::fs::read(&target).unwrap(), b"precious");
        assert!(!temp_path(&target).exists());
    }
    #[test]
    fn degraded_keeps_temp() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("file.bin");
        std::fs::write(&target, b"precious").unwrap();

        let result = write_atomic(&target, |w| {
            w.write_bytes(b"most of it")?;
            Ok::<_, CodecError>(true)
        });
        let Err(SaveError::Degraded {
            kept,
            bytes_written,
        }) = result
        else {
            panic!("expected degraded save");
        };
        assert_eq!(bytes_written, 10);
        assert_eq!(std::fs::read(&kept).unwrap(), b"most of it");
        assert_eq!(std::fs::read(&target).unwrap(), b"precious");
    }
    /// Passes the first `budget` bytes through, then refuses to write more.
    struct FailAfter<'a, W: std::io::Write> {
        inner: &'a mut Writer<W>,
        budget: usize,
    }
    impl<W: std::io::Write> std::io::Write for FailAfter<'_, W> {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            let len = buf.len().min(self.budget);
            self.inner
                .write_bytes(&buf[..len])
                .map_err(std::io::Error::other)?;
            self.budget -= len;
            Ok(len)
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }
    #[test]
    fn encode_failure_leaves_target() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("drawing.quill");
        let old = Document::new([100, 100], Rgb::WHITE);
        crate::io::save_document(&target, &old).unwrap();
        let before = std::fs::read(&target).unwrap();

        let mut document = Document::new([200, 200], Rgb([0.0, 0.5, 1.0]));
        document.new_layer().name = "Second".to_owned();
        // Past the header and view, partway into the layers.
        let budget = 8 + CanvasView::SIZE + 20;
        let result = write_atomic(&target, |w| {
            let mut failing = Writer::new(FailAfter { inner: w, budget });
            encode(&document, &mut failing).map(|encoded| encoded.degraded)
        });
        assert!(matches!(
            result,
            Err(SaveError::Encode(EncodeError::Codec(CodecError::ShortWrite)))
        ));
        assert_eq!(std::fs::read(&target).unwrap(), before);
        assert!(!temp_path(&target).exists());
    }
    #[test]
    fn missing_directory_is_create_error() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nope").join("file.bin");
        let result = write_atomic(&target, |_| Ok::<_, CodecError>(false));
        assert!(matches!(result, Err(SaveError::Create { .. })));
        assert!(!target.exists());
    }
}
