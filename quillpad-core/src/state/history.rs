/// An undo record. Stored on disk as a flat array.
#[derive(Copy, Clone, PartialEq, Eq, Hash, bytemuck::Pod, bytemuck::Zeroable, Debug)]
#[repr(C)]
pub struct HistoryElement {
    /// Raw [`HistoryKind`], kept as-is to survive unknown kinds.
    pub kind: i32,
    pub layer_id: i32,
}
impl HistoryElement {
    #[must_use]
    pub fn stroke(layer_id: i32) -> Self {
        Self {
            kind: HistoryKind::Stroke as i32,
            layer_id,
        }
    }
    #[must_use]
    pub fn known_kind(&self) -> Option<HistoryKind> {
        HistoryKind::from_repr(self.kind)
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum::FromRepr)]
#[repr(i32)]
pub enum HistoryKind {
    /// A stroke was pushed onto the layer.
    Stroke = 0,
}

/// Append-only undo buffer, oldest first.
pub type History = Vec<HistoryElement>;
