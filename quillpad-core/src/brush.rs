//! # Brush
//!
//! Brush records are stored in files as raw structs. Older schemas stored
//! smaller structs, kept here so their layout can be read back exactly.

use crate::color::Color;

/// The brush record as written by the current schema.
///
/// Files from schema 8 onward prefix every brush with its size in bytes, so fields
/// may only ever be *appended* here. A shorter record from an older build reads into
/// the leading fields, leaving the rest at [`Brush::default`].
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C)]
pub struct Brush {
    pub color: Color,
    /// Radius, in canvas units at the scale the stroke was drawn.
    pub radius: i32,
    pub alpha: f32,
    /// Opacity at zero pressure when pressure-to-opacity is in use.
    pub pressure_opacity_min: f32,
    pub hardness: f32,
}
impl Brush {
    /// Size of the current record, in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
    pub const DEFAULT_HARDNESS: f32 = 10.0;
    /// Hardness given to strokes from files older than schema 7.
    pub const LEGACY_HARDNESS_PRE_V7: f32 = 10.0;
    /// Hardness given to strokes from schema 7 files.
    pub const LEGACY_HARDNESS_V7: f32 = 2.0;
}
impl Default for Brush {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            radius: 10,
            alpha: 1.0,
            pressure_opacity_min: 1.0,
            hardness: Self::DEFAULT_HARDNESS,
        }
    }
}

/// Brush record of schemas 1 through 6.
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C)]
pub struct BrushPreV7 {
    pub color: Color,
    pub radius: i32,
    pub alpha: f32,
}
impl From<BrushPreV7> for Brush {
    fn from(value: BrushPreV7) -> Self {
        Self {
            color: value.color,
            radius: value.radius,
            alpha: value.alpha,
            hardness: Self::LEGACY_HARDNESS_PRE_V7,
            ..Self::default()
        }
    }
}

/// Brush record of schema 7.
#[derive(Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C)]
pub struct BrushPreV8 {
    pub color: Color,
    pub radius: i32,
    pub alpha: f32,
    pub pressure_opacity_min: f32,
}
impl From<BrushPreV8> for Brush {
    fn from(value: BrushPreV8) -> Self {
        Self {
            color: value.color,
            radius: value.radius,
            alpha: value.alpha,
            pressure_opacity_min: value.pressure_opacity_min,
            hardness: Self::LEGACY_HARDNESS_V7,
        }
    }
}

/// The persisted brush slots, in file order.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum::EnumCount, strum::EnumIter)]
#[repr(usize)]
pub enum BrushSlot {
    Pen = 0,
    Eraser = 1,
    Primitive = 2,
}
impl BrushSlot {
    pub const COUNT: usize = <Self as strum::EnumCount>::COUNT;
}

/// Brush and size for every slot.
#[derive(Copy, Clone, PartialEq, Debug)]
pub struct BrushSlots {
    pub brushes: [Brush; BrushSlot::COUNT],
    /// Independent size for every slot, in screen pixels.
    pub sizes: [i32; BrushSlot::COUNT],
}
impl BrushSlots {
    #[must_use]
    pub fn brush(&self, slot: BrushSlot) -> &Brush {
        &self.brushes[slot as usize]
    }
    #[must_use]
    pub fn size(&self, slot: BrushSlot) -> i32 {
        self.sizes[slot as usize]
    }
}
impl Default for BrushSlots {
    fn default() -> Self {
        let pen = Brush::default();
        let eraser = Brush {
            color: Color::WHITE,
            ..Brush::default()
        };
        Self {
            brushes: [pen, eraser, pen],
            sizes: [10; BrushSlot::COUNT],
        }
    }
}
