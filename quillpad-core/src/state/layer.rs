use crate::stroke::Stroke;

bitflags::bitflags! {
    #[derive(Copy, Clone, Eq, PartialEq, Hash, bytemuck::Pod, bytemuck::Zeroable, Debug)]
    #[repr(transparent)]
    pub struct LayerFlags : u32 {
        const VISIBLE = 0b0000_0001;
    }
}
impl Default for LayerFlags {
    fn default() -> Self {
        Self::VISIBLE
    }
}

/// On-disk tag of an effect.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug, strum::FromRepr)]
#[repr(u32)]
pub enum EffectType {
    Blur = 1,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum EffectKind {
    Blur {
        /// View scale at the time the blur was created.
        original_scale: i32,
        kernel_size: i32,
    },
}
impl EffectKind {
    #[must_use]
    pub fn effect_type(&self) -> EffectType {
        match self {
            Self::Blur { .. } => EffectType::Blur,
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct LayerEffect {
    pub enabled: bool,
    pub kind: EffectKind,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Layer {
    /// Unique within a document, never reused.
    pub id: i32,
    pub name: String,
    pub flags: LayerFlags,
    pub alpha: f32,
    /// Strokes, oldest first.
    pub strokes: Vec<Stroke>,
    /// Effects, in application order.
    pub effects: Vec<LayerEffect>,
}
impl Layer {
    /// Longest storable name in bytes, including the terminating nul.
    pub const MAX_NAME_LEN: usize = 64;

    #[must_use]
    pub fn new(id: i32) -> Self {
        Self {
            id,
            name: format!("Layer {id}"),
            flags: LayerFlags::default(),
            alpha: 1.0,
            strokes: Vec::new(),
            effects: Vec::new(),
        }
    }
    /// The name as stored on disk: truncated on a character boundary to fit, and nul-terminated.
    #[must_use]
    pub fn stored_name(&self) -> Vec<u8> {
        let mut end = self.name.len().min(Self::MAX_NAME_LEN - 1);
        while !self.name.is_char_boundary(end) {
            end -= 1;
        }
        let mut bytes = Vec::with_capacity(end + 1);
        bytes.extend_from_slice(&self.name.as_bytes()[..end]);
        bytes.push(0);
        bytes
    }
    /// Parse a stored name, stopping at the first nul.
    #[must_use]
    pub fn name_from_stored(bytes: &[u8]) -> String {
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        String::from_utf8_lossy(&bytes[..len]).into_owned()
    }
}
