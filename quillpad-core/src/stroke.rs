use crate::brush::Brush;
use crate::util::Rect;

/// Most points a single stroke may hold. Point counts in `1..=STROKE_MAX_POINTS` are valid.
pub const STROKE_MAX_POINTS: usize = 2048;

bitflags::bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, bytemuck::Pod, bytemuck::Zeroable, Debug, Default)]
    #[rustfmt::skip]
    #[repr(transparent)]
    pub struct StrokeFlags : u32 {
        /// The stroke removes paint instead of depositing it.
        const ERASER =              0b0000_0001;
        const PRESSURE_TO_OPACITY = 0b0000_0010;
        const DISTANCE_TO_OPACITY = 0b0000_0100;
        /// Drawn with the line tool.
        const LINE =                0b0000_1000;
        /// Drawn with the rectangle tool.
        const RECTANGLE =           0b0001_0000;
        /// Drawn with the grid tool.
        const GRID =                0b0010_0000;
    }
}

/// Globally unique stroke id, assigned in creation order. Never stored on disk.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Default)]
pub struct StrokeID(pub u64);

#[derive(Clone, PartialEq, Debug)]
pub struct Stroke {
    pub id: StrokeID,
    /// Id of the layer this stroke was drawn onto.
    pub layer_id: i32,
    pub brush: Brush,
    pub flags: StrokeFlags,
    /// Canvas-space positions. Always the same length as `pressures`.
    pub points: Vec<[i64; 2]>,
    pub pressures: Vec<f32>,
    /// Bounds of `points` padded by the brush radius.
    pub bounding_rect: Rect,
}
impl Stroke {
    /// Whether this stroke can be stored. Empty, oversized, or ragged strokes cannot.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        (1..=STROKE_MAX_POINTS).contains(&self.points.len())
            && self.points.len() == self.pressures.len()
    }
    /// Recompute the cached bounds from the current points and brush.
    pub fn update_bounds(&mut self) {
        self.bounding_rect = Rect::bounding(&self.points, i64::from(self.brush.radius));
    }
}
