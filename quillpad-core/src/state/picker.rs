use crate::color::{Color, Rgb};

/// Picker state as stored before schema 5. Only the color survives an upgrade.
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C)]
pub struct LegacyPickerData {
    pub center: [i32; 2],
    pub bounds_radius_px: i32,
    pub wheel_radius: f32,
    pub wheel_half_width: f32,
    /// Hue in degrees, saturation and value normalized.
    pub hsv: [f32; 3],
}

/// The current color and the row of saved swatches.
#[derive(Clone, PartialEq, Debug)]
pub struct Picker {
    pub rgb: Rgb,
    /// Swatches, in display order. The number of slots is fixed by the frontend.
    pub buttons: Vec<Color>,
}
impl Picker {
    pub const DEFAULT_BUTTON_COUNT: usize = 5;
}
impl Default for Picker {
    fn default() -> Self {
        Self {
            rgb: Rgb([0.0; 3]),
            buttons: vec![Color::default(); Self::DEFAULT_BUTTON_COUNT],
        }
    }
}
