//! # User settings
//!
//! Preferences that outlive any one document. Stored in the config directory, see
//! [`crate::io::settings`] for the on-disk form.

use crate::bindings::Bindings;
use crate::color::Rgb;

/// What to do with the session's file after a successful "save as".
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, strum::FromRepr)]
#[repr(u32)]
pub enum SwitchSaveTarget {
    /// Ask the user every time.
    #[default]
    Ask = 0,
    /// Always continue editing the new file.
    OnSave = 1,
    /// Keep editing the old file.
    Never = 2,
}

/// Assorted options, stored as one raw block. Fields may only be appended.
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C)]
pub struct MiscSettings {
    /// Background of new canvases.
    pub background_color: Rgb,
    /// Zoom step used by peek-out, in scale units.
    pub peek_out_increment: f32,
    /// Raw [`SwitchSaveTarget`]. Unknown values act as [`SwitchSaveTarget::Ask`].
    pub switch_save_target: u32,
}
impl MiscSettings {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const DEFAULT_PEEK_OUT_INCREMENT: f32 = 20.0;

    #[must_use]
    pub fn switch_save_target(&self) -> SwitchSaveTarget {
        SwitchSaveTarget::from_repr(self.switch_save_target).unwrap_or_default()
    }
    pub fn set_switch_save_target(&mut self, target: SwitchSaveTarget) {
        self.switch_save_target = target as u32;
    }
}
impl Default for MiscSettings {
    fn default() -> Self {
        Self {
            background_color: Rgb::WHITE,
            peek_out_increment: Self::DEFAULT_PEEK_OUT_INCREMENT,
            switch_save_target: SwitchSaveTarget::default() as u32,
        }
    }
}

/// Which settings file layout the settings were read from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SettingsFormat {
    /// The old single-blob `user_settings.bin`.
    Legacy,
    /// Sectioned `settings.bin`, version 1.
    V1,
    /// A `settings.bin` with a version this build doesn't know. The defaults are in use.
    Unknown(u16),
}
impl SettingsFormat {
    /// The format written on save.
    pub const CURRENT: Self = Self::V1;

    #[must_use]
    pub fn from_tag(tag: u16) -> Self {
        match tag {
            0 => Self::Legacy,
            1 => Self::V1,
            other => Self::Unknown(other),
        }
    }
    #[must_use]
    pub fn tag(self) -> u16 {
        match self {
            Self::Legacy => 0,
            Self::V1 => 1,
            Self::Unknown(other) => other,
        }
    }
    /// Overwriting a file in this format would lose data this build can't see.
    #[must_use]
    pub fn is_unknown_or_newer(self) -> bool {
        matches!(self, Self::Unknown(_)) || self.tag() > Self::CURRENT.tag()
    }
}

#[derive(Clone, PartialEq, Debug)]
pub struct Settings {
    /// Where these were loaded from. `None` if nothing could be loaded.
    pub format: Option<SettingsFormat>,
    pub misc: MiscSettings,
    pub bindings: Bindings,
}
impl Default for Settings {
    fn default() -> Self {
        Self {
            format: None,
            misc: MiscSettings::default(),
            bindings: Bindings::default(),
        }
    }
}

/// Window placement, restored by the platform layer at startup.
#[derive(Copy, Clone, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable, Debug, Default)]
#[repr(C)]
pub struct PlatformSettings {
    pub window_position: [i32; 2],
    pub window_size: [i32; 2],
    /// Nonzero if the window was maximized.
    pub maximized: u32,
}
impl PlatformSettings {
    pub const SIZE: usize = std::mem::size_of::<Self>();
}
