//! # Settings files
//!
//! `settings.bin` holds a `u16` format tag followed by two sections, misc options then key
//! bindings, each as a `u16` byte size and the raw struct. A section whose size doesn't match
//! this build is skipped and left at its defaults.
//!
//! Older builds wrote `user_settings.bin` instead, a `u16` size and one fixed blob. It is only
//! read when `settings.bin` doesn't exist, and is never written.
//!
//! `platform_settings.bin` is a `u16` size and a [`PlatformSettings`], which may be shorter than
//! the current struct.

use super::atomic::{self, SaveError};
use super::common::{open_if_exists as open, CodecError, Reader, Writer};
use crate::bindings::{Action, Binding, Bindings};
use crate::color::Rgb;
use crate::config::ConfigDir;
use crate::settings::{MiscSettings, PlatformSettings, Settings, SettingsFormat};
use std::io::{Read, Write};

/// Size of the blob in `user_settings.bin`: background color, peek-out increment, bindings.
pub const LEGACY_SIZE: usize =
    std::mem::size_of::<Rgb>() + std::mem::size_of::<f32>() + Bindings::SIZE;

#[derive(thiserror::Error, Debug)]
pub enum SettingsError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("no settings file found")]
    NotFound,
    #[error("{} is {} bytes, larger than the {} bytes known", .what, .declared, .max)]
    StructTooLarge {
        what: &'static str,
        declared: u16,
        max: usize,
    },
    #[error("could not create config directory: {}", .0)]
    CreateDir(std::io::Error),
    #[error(transparent)]
    Save(#[from] SaveError),
}

fn read_bindings<R: Read>(r: &mut Reader<R>) -> Result<Bindings, CodecError> {
    let table = r.read_vec::<Binding>(Action::SLOTS)?;
    // `read_vec` returns exactly the requested count.
    let table: [Binding; Action::SLOTS] = table.try_into().map_err(|_| CodecError::ShortRead)?;
    Ok(Bindings(table))
}

/// Read the body of `settings.bin`.
/// # Errors
/// Only on a short read. Unknown formats and mismatched sections are not errors.
pub fn read_settings<R: Read>(r: &mut Reader<R>) -> Result<Settings, SettingsError> {
    let format = SettingsFormat::from_tag(r.read_u16()?);
    let mut settings = Settings {
        format: Some(format),
        ..Settings::default()
    };
    if format != SettingsFormat::V1 {
        log::warn!("unknown settings format {}, ignoring", format.tag());
        settings.format = Some(SettingsFormat::Unknown(format.tag()));
        return Ok(settings);
    }

    let size = r.read_u16()?;
    if usize::from(size) == MiscSettings::SIZE {
        settings.misc = r.read_pod()?;
    } else {
        log::warn!(
            "misc settings are {size} bytes, expected {}. Using defaults",
            MiscSettings::SIZE
        );
        r.skip(size.into())?;
    }

    let size = r.read_u16()?;
    if usize::from(size) == Bindings::SIZE {
        settings.bindings = read_bindings(r)?;
    } else {
        log::warn!(
            "key bindings are {size} bytes, expected {}. Using defaults",
            Bindings::SIZE
        );
        r.skip(size.into())?;
    }
    Ok(settings)
}

/// Read the body of `user_settings.bin`, carrying over the fields that still exist.
/// # Errors
/// A short read, or a blob larger than any known layout.
pub fn read_legacy_settings<R: Read>(r: &mut Reader<R>) -> Result<Settings, SettingsError> {
    let declared = r.read_u16()?;
    if usize::from(declared) > LEGACY_SIZE {
        return Err(SettingsError::StructTooLarge {
            what: "legacy settings",
            declared,
            max: LEGACY_SIZE,
        });
    }
    // Older writers still wrote the full blob, whatever the size says.
    let background_color: Rgb = r.read_pod()?;
    let peek_out_increment = r.read_f32()?;
    let bindings = read_bindings(r)?;
    Ok(Settings {
        format: Some(SettingsFormat::Legacy),
        misc: MiscSettings {
            background_color,
            peek_out_increment,
            ..MiscSettings::default()
        },
        bindings,
    })
}

/// Load `settings.bin`, or the legacy file if it doesn't exist.
/// # Errors
/// [`SettingsError::NotFound`] if neither file exists, or any failure reading the one that does.
pub fn load_settings(config: &ConfigDir) -> Result<Settings, SettingsError> {
    let path = config.file(ConfigDir::SETTINGS);
    if let Some(mut reader) = open(&path)? {
        log::info!("loading settings from {}", path.display());
        return read_settings(&mut reader);
    }
    let legacy_path = config.file(ConfigDir::LEGACY_SETTINGS);
    log::info!(
        "{} not found, trying legacy {}",
        path.display(),
        legacy_path.display()
    );
    match open(&legacy_path)? {
        Some(mut reader) => read_legacy_settings(&mut reader),
        None => Err(SettingsError::NotFound),
    }
}

/// Write the body of `settings.bin` in the current format.
/// # Errors
/// Any I/O failure.
pub fn write_settings<W: Write>(w: &mut Writer<W>, settings: &Settings) -> Result<(), CodecError> {
    w.write_pod(&SettingsFormat::CURRENT.tag())?;
    w.write_pod(&(MiscSettings::SIZE as u16))?;
    w.write_pod(&settings.misc)?;
    w.write_pod(&(Bindings::SIZE as u16))?;
    w.write_bytes(settings.bindings.as_bytes())
}

/// Save `settings.bin` in the current format.
///
/// If the settings came from a file this build can't fully understand, `confirm_overwrite` is
/// asked first. Returns whether the file was written.
/// # Errors
/// Any failure creating the config directory or writing the file. The old file is untouched.
pub fn save_settings(
    config: &ConfigDir,
    settings: &Settings,
    confirm_overwrite: impl FnOnce() -> bool,
) -> Result<bool, SettingsError> {
    if let Some(format) = settings.format {
        if format.is_unknown_or_newer() && !confirm_overwrite() {
            log::info!("not overwriting settings of format {}", format.tag());
            return Ok(false);
        }
        if format != SettingsFormat::CURRENT {
            log::info!(
                "upgrading settings format from {} to {}",
                format.tag(),
                SettingsFormat::CURRENT.tag()
            );
        }
    }
    config.create().map_err(SettingsError::CreateDir)?;
    atomic::write_atomic(&config.file(ConfigDir::SETTINGS), |w| {
        write_settings(w, settings).map(|()| false)
    })?;
    Ok(true)
}

/// Read the body of `platform_settings.bin`. Fields missing from a shorter record are zero.
/// # Errors
/// A short read, or a record larger than the current struct.
pub fn read_platform_settings<R: Read>(
    r: &mut Reader<R>,
) -> Result<PlatformSettings, SettingsError> {
    let declared = r.read_u16()?;
    if usize::from(declared) > PlatformSettings::SIZE {
        return Err(SettingsError::StructTooLarge {
            what: "platform settings",
            declared,
            max: PlatformSettings::SIZE,
        });
    }
    let mut settings = PlatformSettings::default();
    r.read_prefix(&mut settings, declared.into())?;
    Ok(settings)
}

/// # Errors
/// [`SettingsError::NotFound`] if there is no file, or any failure reading it.
pub fn load_platform_settings(config: &ConfigDir) -> Result<PlatformSettings, SettingsError> {
    let path = config.file(ConfigDir::PLATFORM_SETTINGS);
    match open(&path)? {
        Some(mut reader) => read_platform_settings(&mut reader),
        None => Err(SettingsError::NotFound),
    }
}

/// # Errors
/// Any failure creating the config directory or writing the file.
pub fn save_platform_settings(
    config: &ConfigDir,
    settings: &PlatformSettings,
) -> Result<(), SettingsError> {
    config.create().map_err(SettingsError::CreateDir)?;
    atomic::write_atomic(&config.file(ConfigDir::PLATFORM_SETTINGS), |w| {
        w.write_pod(&(PlatformSettings::SIZE as u16))?;
        w.write_pod(settings)?;
        Ok::<_, CodecError>(false)
    })?;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bindings::{Key, Modifiers};
    use crate::settings::SwitchSaveTarget;

    fn custom_bindings() -> Bindings {
        let mut bindings = Bindings::empty();
        bindings.bind(Binding::new(
            Modifiers::CTRL | Modifiers::ALT,
            Key::ascii('p').unwrap(),
            Action::PeekOut,
        ));
        bindings
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigDir::at(dir.path().join("prefs"));
        let mut settings = Settings::default();
        settings.misc.background_color = Rgb([0.1, 0.2, 0.3]);
        settings.misc.set_switch_save_target(SwitchSaveTarget::OnSave);
        settings.bindings = custom_bindings();

        assert!(save_settings(&config, &settings, || panic!("no prompt expected")).unwrap());
        let loaded = load_settings(&config).unwrap();
        assert_eq!(loaded.format, Some(SettingsFormat::V1));
        assert_eq!(loaded.misc, settings.misc);
        assert_eq!(loaded.bindings, settings.bindings);
    }

    #[test]
    fn legacy_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigDir::at(dir.path());
        let bindings = custom_bindings();

        let mut blob = Vec::new();
        blob.extend_from_slice(&(LEGACY_SIZE as u16).to_le_bytes());
        blob.extend_from_slice(bytemuck::bytes_of(&Rgb([0.5, 0.25, 0.125])));
        blob.extend_from_slice(&3.5f32.to_le_bytes());
        blob.extend_from_slice(bindings.as_bytes());
        std::fs::write(config.file(ConfigDir::LEGACY_SETTINGS), blob).unwrap();

        let loaded = load_settings(&config).unwrap();
        assert_eq!(loaded.format, Some(SettingsFormat::Legacy));
        assert_eq!(loaded.misc.background_color, Rgb([0.5, 0.25, 0.125]));
        assert_eq!(loaded.misc.peek_out_increment, 3.5);
        // No equivalent in the legacy blob
        assert_eq!(
            loaded.misc.switch_save_target(),
            MiscSettings::default().switch_save_target()
        );
        assert_eq!(loaded.bindings, bindings);

        // The modern file wins once it exists.
        save_settings(&config, &Settings::default(), || true).unwrap();
        assert_eq!(
            load_settings(&config).unwrap().format,
            Some(SettingsFormat::V1)
        );
    }

    #[test]
    fn missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigDir::at(dir.path());
        assert!(matches!(
            load_settings(&config),
            Err(SettingsError::NotFound)
        ));
        assert!(matches!(
            load_platform_settings(&config),
            Err(SettingsError::NotFound)
        ));
    }

    #[test]
    fn mismatched_section_is_skipped() {
        let bindings = custom_bindings();
        let mut data = Vec::new();
        data.extend_from_slice(&1u16.to_le_bytes());
        // A misc section from some other build, with an extra field.
        data.extend_from_slice(&((MiscSettings::SIZE + 4) as u16).to_le_bytes());
        data.extend_from_slice(&[0xAB; MiscSettings::SIZE + 4]);
        data.extend_from_slice(&(Bindings::SIZE as u16).to_le_bytes());
        data.extend_from_slice(bindings.as_bytes());

        let mut reader = Reader::new(&data[..], data.len() as u64);
        let settings = read_settings(&mut reader).unwrap();
        assert_eq!(settings.misc, MiscSettings::default());
        assert_eq!(settings.bindings, bindings);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn unknown_format_asks_before_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigDir::at(dir.path());
        let path = config.file(ConfigDir::SETTINGS);
        std::fs::write(&path, 9u16.to_le_bytes()).unwrap();

        let settings = load_settings(&config).unwrap();
        assert_eq!(settings.format, Some(SettingsFormat::Unknown(9)));
        assert_eq!(settings.bindings, Bindings::default());

        let mut asked = false;
        let saved = save_settings(&config, &settings, || {
            asked = true;
            false
        })
        .unwrap();
        assert!(asked);
        assert!(!saved);
        assert_eq!(std::fs::read(&path).unwrap(), 9u16.to_le_bytes());

        assert!(save_settings(&config, &settings, || true).unwrap());
        assert_eq!(
            load_settings(&config).unwrap().format,
            Some(SettingsFormat::V1)
        );
    }

    #[test]
    fn oversized_legacy_is_rejected() {
        let data = ((LEGACY_SIZE + 1) as u16).to_le_bytes();
        let mut reader = Reader::new(&data[..], 2);
        assert!(matches!(
            read_legacy_settings(&mut reader),
            Err(SettingsError::StructTooLarge { .. })
        ));
    }

    #[test]
    fn platform_settings() {
        let dir = tempfile::tempdir().unwrap();
        let config = ConfigDir::at(dir.path());
        let settings = PlatformSettings {
            window_position: [10, -20],
            window_size: [800, 600],
            maximized: 1,
        };
        save_platform_settings(&config, &settings).unwrap();
        assert_eq!(load_platform_settings(&config).unwrap(), settings);

        // An older, shorter record without the maximized flag.
        let mut data = Vec::new();
        data.extend_from_slice(&16u16.to_le_bytes());
        data.extend_from_slice(&bytemuck::bytes_of(&settings)[..16]);
        let mut reader = Reader::new(&data[..], data.len() as u64);
        let old = read_platform_settings(&mut reader).unwrap();
        assert_eq!(old.window_size, [800, 600]);
        assert_eq!(old.maximized, 0);

        let data = 64u16.to_le_bytes();
        let mut reader = Reader::new(&data[..], 2);
        assert!(matches!(
            read_platform_settings(&mut reader),
            Err(SettingsError::StructTooLarge { .. })
        ));
    }
}
