//! # Schema versions
//!
//! Every historical on-disk layout, selected by version range. Decoders ask the [`Version`]
//! which layout applies instead of comparing raw version numbers at every call site.

/// A schema version tag, as found in a document header.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Version(pub u32);

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum VersionError {
    /// Written by a newer build than this one.
    Newer(Version),
    /// Zero was never a valid version.
    Invalid,
}

impl Version {
    /// The version all documents are written with.
    pub const CURRENT: Self = Self(10);
    pub const OLDEST: Self = Self(1);

    /// Check that this build knows how to read `self`.
    /// # Errors
    /// If `self` is newer than [`Self::CURRENT`] or zero.
    pub fn supported(self) -> Result<Self, VersionError> {
        if self > Self::CURRENT {
            Err(VersionError::Newer(self))
        } else if self < Self::OLDEST {
            Err(VersionError::Invalid)
        } else {
            Ok(self)
        }
    }
    /// Whether loading this version requires an upgrade on next save.
    #[must_use]
    pub fn needs_upgrade(self) -> bool {
        self < Self::CURRENT
    }
    #[must_use]
    pub fn view_layout(self) -> ViewLayout {
        match self.0 {
            9.. => ViewLayout::SelfSized,
            4..=8 => ViewLayout::PreV9,
            _ => ViewLayout::PreV4,
        }
    }
    /// Layout of the brush embedded in every stroke.
    #[must_use]
    pub fn stroke_brush_layout(self) -> BrushLayout {
        match self.0 {
            8.. => BrushLayout::SelfSized,
            7 => BrushLayout::PreV8,
            _ => BrushLayout::PreV7,
        }
    }
    #[must_use]
    pub fn point_layout(self) -> PointLayout {
        if self.0 >= 4 {
            PointLayout::Wide
        } else {
            PointLayout::Narrow
        }
    }
    #[must_use]
    pub fn brush_array_layout(self) -> BrushArrayLayout {
        match self.0 {
            6.. => BrushArrayLayout::Counted(self.stroke_brush_layout()),
            2..=5 => BrushArrayLayout::PenAndEraser,
            _ => BrushArrayLayout::Absent,
        }
    }
    #[must_use]
    pub fn has_effects(self) -> bool {
        self.0 >= 4
    }
    #[must_use]
    pub fn has_rgb_picker(self) -> bool {
        self.0 >= 5
    }
    #[must_use]
    pub fn has_layer_alpha(self) -> bool {
        self.0 >= 3
    }
    #[must_use]
    pub fn has_grid(self) -> bool {
        self.0 >= 10
    }
}
impl std::fmt::Display for Version {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ViewLayout {
    /// [`crate::state::view::CanvasViewPreV4`]: 32-bit inverted pan, no angle.
    PreV4,
    /// [`crate::state::view::CanvasViewPreV9`]: no angle.
    PreV9,
    /// Leading `u32` size, followed by that many bytes of [`crate::state::view::CanvasView`] (size included).
    SelfSized,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BrushLayout {
    /// [`crate::brush::BrushPreV7`], no stroke flags stored. Erasers are tagged by color.
    PreV7,
    /// [`crate::brush::BrushPreV8`], followed by stroke flags.
    PreV8,
    /// Leading `i32` size, then a prefix of [`crate::brush::Brush`], followed by stroke flags.
    SelfSized,
}
impl BrushLayout {
    /// Whether stroke flags follow the brush.
    #[must_use]
    pub fn has_stroke_flags(self) -> bool {
        !matches!(self, Self::PreV7)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum PointLayout {
    /// `[i32; 2]`, widened on read.
    Narrow,
    /// `[i64; 2]`
    Wide,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BrushArrayLayout {
    /// No brushes stored.
    Absent,
    /// Exactly two [`crate::brush::BrushPreV7`] then their two sizes.
    PenAndEraser,
    /// A `u16` count, then that many brushes in the given layout (a self-sized array shares
    /// one leading size), then that many sizes.
    Counted(BrushLayout),
}
