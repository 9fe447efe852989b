//! # View
//!
//! The pan/zoom/rotate transform of the canvas, plus the few scalars stored alongside it.
//! The struct is written to disk as-is, so it must only ever grow by appending fields.

use crate::color::Rgb;

/// The current on-disk view. Self-sized: `size` holds the byte length of the struct that
/// wrote it, allowing a newer build to read a smaller view from a build of the same schema.
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C)]
pub struct CanvasView {
    /// Size of this struct in bytes, including this field.
    pub size: u32,
    /// Window size in pixels. Never trusted from a file.
    pub screen_size: [i32; 2],
    pub scale: i32,
    pub zoom_center: [i32; 2],
    pub pan_center: [i64; 2],
    pub background_color: Rgb,
    pub working_layer_id: i32,
    /// Rotation, in radians.
    pub angle: f32,
    pub _padding: u32,
}
impl CanvasView {
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const DEFAULT_SCALE: i32 = 1 << 10;

    #[must_use]
    pub fn new(screen_size: [i32; 2], background_color: Rgb) -> Self {
        Self {
            size: Self::SIZE as u32,
            screen_size,
            scale: Self::DEFAULT_SCALE,
            zoom_center: [screen_size[0] / 2, screen_size[1] / 2],
            pan_center: [0; 2],
            background_color,
            working_layer_id: 0,
            angle: 0.0,
            _padding: 0,
        }
    }
}

/// View of schemas 4 through 8. Bytes are laid out like [`CanvasView`] minus the leading
/// size, except for the trailing `num_layers` which was dropped and later replaced by `angle`.
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C, packed)]
pub struct CanvasViewPreV9 {
    pub screen_size: [i32; 2],
    pub scale: i32,
    pub zoom_center: [i32; 2],
    pub pan_center: [i64; 2],
    pub background_color: Rgb,
    pub working_layer_id: i32,
    pub num_layers: i32,
}
impl CanvasViewPreV9 {
    #[must_use]
    pub fn upgrade(self, defaults: CanvasView) -> CanvasView {
        CanvasView {
            screen_size: self.screen_size,
            scale: self.scale,
            zoom_center: self.zoom_center,
            pan_center: self.pan_center,
            background_color: self.background_color,
            working_layer_id: self.working_layer_id,
            angle: 0.0,
            ..defaults
        }
    }
}

/// View of schemas 1 through 3, with 32-bit pan stored with the opposite sign.
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C, packed)]
pub struct CanvasViewPreV4 {
    pub screen_size: [i32; 2],
    pub scale: i32,
    pub zoom_center: [i32; 2],
    pub pan_center: [i32; 2],
    pub background_color: Rgb,
    pub working_layer_id: i32,
    pub num_layers: i32,
}
impl CanvasViewPreV4 {
    #[must_use]
    pub fn upgrade(self, defaults: CanvasView) -> CanvasView {
        // Copy out of the packed struct before destructuring.
        let pan = self.pan_center;
        let [x, y] = pan;
        CanvasView {
            screen_size: self.screen_size,
            scale: self.scale,
            zoom_center: self.zoom_center,
            pan_center: [-i64::from(x), -i64::from(y)],
            background_color: self.background_color,
            working_layer_id: self.working_layer_id,
            angle: 0.0,
            ..defaults
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn layout_sizes() {
        assert_eq!(CanvasView::SIZE, 64);
        assert_eq!(std::mem::size_of::<CanvasViewPreV9>(), 56);
        assert_eq!(std::mem::size_of::<CanvasViewPreV4>(), 48);
    }
    #[test]
    fn pre_v4_pan_is_inverted() {
        let old = CanvasViewPreV4 {
            screen_size: [1, 1],
            scale: 3,
            zoom_center: [0, 0],
            pan_center: [100, -i32::MAX],
            background_color: Rgb::WHITE,
            working_layer_id: 2,
            num_layers: 1,
        };
        let view = old.upgrade(CanvasView::new([10, 10], Rgb::WHITE));
        assert_eq!(view.pan_center, [-100, i64::from(i32::MAX)]);
        assert_eq!(view.scale, 3);
        assert_eq!(view.angle, 0.0);
        assert_eq!(view.size as usize, CanvasView::SIZE);
    }
}
