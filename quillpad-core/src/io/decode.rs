//! # Document decoder
//!
//! Reads a document of any supported schema version into a fresh [`Document`].
//! The live document is never touched: the caller swaps in the result only once every
//! section decoded successfully.

use super::common::{CodecError, Reader};
use super::version::{BrushArrayLayout, BrushLayout, PointLayout, Version, VersionError, ViewLayout};
use super::MAGIC;
use crate::brush::{Brush, BrushPreV7, BrushPreV8, BrushSlot, BrushSlots};
use crate::color::{Color, Rgb};
use crate::state::{
    history::HistoryElement,
    layer::{EffectKind, EffectType, Layer, LayerEffect, LayerFlags},
    picker::LegacyPickerData,
    view::{CanvasView, CanvasViewPreV4, CanvasViewPreV9},
    Document,
};
use crate::stroke::{Stroke, StrokeFlags, StrokeID, STROKE_MAX_POINTS};
use crate::util::Rect;
use az::CheckedAs;
use std::io::Read;

#[derive(thiserror::Error, Debug)]
pub enum DecodeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("magic number mismatch ({:#010x})", .0)]
    BadMagic(u32),
    #[error("written by a newer version ({})", .0)]
    NewerVersion(Version),
    #[error("invalid version")]
    InvalidVersion,
    #[error("{} declares {} bytes, at most {} are known", what, declared, max)]
    StructTooLarge {
        what: &'static str,
        declared: u64,
        max: usize,
    },
    #[error("upgrade declined")]
    UpgradeDeclined,
    #[error("corrupt: {}", .0)]
    Corrupt(&'static str),
}
impl DecodeError {
    /// Whether this failure was already explained to the user (or chosen by them), so that
    /// the generic corruption notice must not be shown.
    #[must_use]
    pub fn is_handled(&self) -> bool {
        matches!(self, Self::UpgradeDeclined | Self::NewerVersion(_))
    }
}
impl From<VersionError> for DecodeError {
    fn from(value: VersionError) -> Self {
        match value {
            VersionError::Newer(version) => Self::NewerVersion(version),
            VersionError::Invalid => Self::InvalidVersion,
        }
    }
}

/// Live state that a load carries over instead of reading from the file.
#[derive(Clone, Debug)]
pub struct DecodeContext {
    /// The current window size. The stored one is always discarded.
    pub screen_size: [i32; 2],
    /// Background used by views that predate per-document backgrounds.
    pub background_color: Rgb,
    /// Stroke ids are not stored; loaded strokes continue from this live counter.
    pub next_stroke_id: u64,
    /// The live swatches. Only as many as there are slots are loaded.
    pub buttons: Vec<Color>,
}
impl DecodeContext {
    /// Context for a load that replaces `live`.
    #[must_use]
    pub fn replacing(live: &Document, background_color: Rgb) -> Self {
        Self {
            screen_size: live.view.screen_size,
            background_color,
            next_stroke_id: live.stroke_id_count,
            buttons: live.picker.buttons.clone(),
        }
    }
}

/// Read the magic and schema version.
/// # Errors
/// On magic mismatch, an unsupported version, or a short read.
pub fn read_header<R: Read>(r: &mut Reader<R>) -> Result<Version, DecodeError> {
    let magic = r.read_u32()?;
    if magic != MAGIC {
        return Err(DecodeError::BadMagic(magic));
    }
    let version = Version(r.read_u32()?);
    Ok(version.supported()?)
}

/// Read a whole document. `confirm_upgrade` is asked before reading anything past the header
/// of a file older than [`Version::CURRENT`], and declining aborts the load.
/// # Errors
/// See [`DecodeError`]. The first failure aborts the load.
pub fn decode<R: Read>(
    r: &mut Reader<R>,
    context: &DecodeContext,
    confirm_upgrade: impl FnOnce(Version) -> bool,
) -> Result<(Document, Version), DecodeError> {
    let version = read_header(r)?;
    if version.needs_upgrade() {
        if !confirm_upgrade(version) {
            return Err(DecodeError::UpgradeDeclined);
        }
        log::info!("upgrading document from {version} to {}", Version::CURRENT);
    }
    let document = read_body(r, version, context)?;
    Ok((document, version))
}

/// Read everything after the header.
/// # Errors
/// See [`DecodeError`]. The first failure aborts the load.
pub fn read_body<R: Read>(
    r: &mut Reader<R>,
    version: Version,
    context: &DecodeContext,
) -> Result<Document, DecodeError> {
    let view = read_view(r, version, context)?;
    let saved_working_layer_id = view.working_layer_id;

    let mut document = Document::empty(context.screen_size, context.background_color);
    document.stroke_id_count = context.next_stroke_id;

    let num_layers: usize = r
        .read_i32()?
        .checked_as()
        .ok_or(DecodeError::Corrupt("negative layer count"))?;
    let layer_guid = r.read_i32()?;

    for _ in 0..num_layers {
        read_layer(r, version, &mut document, saved_working_layer_id)?;
    }
    if document.layers.is_empty() {
        return Err(DecodeError::Corrupt("document has no layers"));
    }

    document.picker.rgb = if version.has_rgb_picker() {
        r.read_pod::<Rgb>()?
    } else {
        let legacy: LegacyPickerData = r.read_pod()?;
        Rgb::from_hsv(legacy.hsv)
    };
    document.picker.buttons = read_buttons(r, &context.buttons)?;
    read_brush_array(r, version, &mut document.brushes)?;

    let history_count: usize = r
        .read_i32()?
        .checked_as()
        .ok_or(DecodeError::Corrupt("negative history count"))?;
    document.history = r.read_vec::<HistoryElement>(history_count)?;

    if version.has_layer_alpha() {
        for layer in &mut document.layers {
            layer.alpha = r.read_f32()?;
        }
    } else {
        for layer in &mut document.layers {
            layer.alpha = 1.0;
        }
    }
    if version.has_grid() {
        document.grid_rows = r.read_i32()?;
        document.grid_columns = r.read_i32()?;
    }
    if r.remaining() != 0 {
        log::debug!("{} trailing bytes ignored", r.remaining());
    }

    // Creating layers moved the working layer around. Restore it from the stored id.
    document.view = view;
    document.layer_guid = layer_guid;
    if !document.set_working_layer_by_id(saved_working_layer_id) {
        log::warn!("working layer {saved_working_layer_id} not found, using topmost layer");
        document.working_layer = document.layers.len() - 1;
        document.view.working_layer_id = document.layers[document.working_layer].id;
    }

    Ok(document)
}

fn read_view<R: Read>(
    r: &mut Reader<R>,
    version: Version,
    context: &DecodeContext,
) -> Result<CanvasView, DecodeError> {
    let defaults = CanvasView::new(context.screen_size, context.background_color);
    let mut view = match version.view_layout() {
        ViewLayout::SelfSized => {
            let size = r.read_u32()?;
            let size_usize: usize = size.checked_as().unwrap_or(usize::MAX);
            if size_usize > CanvasView::SIZE {
                return Err(DecodeError::StructTooLarge {
                    what: "view",
                    declared: size.into(),
                    max: CanvasView::SIZE,
                });
            }
            let size_field = std::mem::size_of::<u32>();
            if size_usize < size_field {
                return Err(DecodeError::Corrupt("view smaller than its size field"));
            }
            // Fields missing from a smaller view are left zeroed.
            let mut view = <CanvasView as bytemuck::Zeroable>::zeroed();
            r.read_bytes(&mut bytemuck::bytes_of_mut(&mut view)[size_field..size_usize])?;
            view.size = defaults.size;
            view
        }
        ViewLayout::PreV9 => r.read_pod::<CanvasViewPreV9>()?.upgrade(defaults),
        ViewLayout::PreV4 => r.read_pod::<CanvasViewPreV4>()?.upgrade(defaults),
    };
    view.screen_size = context.screen_size;
    Ok(view)
}

fn read_layer<R: Read>(
    r: &mut Reader<R>,
    version: Version,
    document: &mut Document,
    saved_working_layer_id: i32,
) -> Result<(), DecodeError> {
    let name_len: usize = r
        .read_i32()?
        .checked_as()
        .ok_or(DecodeError::Corrupt("negative layer name length"))?;
    if name_len > Layer::MAX_NAME_LEN {
        return Err(DecodeError::Corrupt("layer name too long"));
    }
    let name = r.read_vec::<u8>(name_len)?;
    let id = r.read_i32()?;
    let flags = LayerFlags::from_bits_retain(r.read_u32()?);

    let num_strokes: usize = r
        .read_i32()?
        .checked_as()
        .ok_or(DecodeError::Corrupt("negative stroke count"))?;
    // Not preallocated, the count is untrusted.
    let mut strokes = Vec::new();
    for _ in 0..num_strokes {
        let stroke_id = document.next_stroke_id();
        strokes.push(read_stroke(r, version, stroke_id)?);
    }
    if id == saved_working_layer_id {
        if let Some(last) = strokes.last() {
            document.working_stroke_flags = last.flags;
        }
    }

    let effects = if version.has_effects() {
        read_effects(r)?
    } else {
        Vec::new()
    };

    // The stored id replaces the freshly generated one.
    let layer = document.new_layer();
    layer.id = id;
    layer.name = Layer::name_from_stored(&name);
    layer.flags = flags;
    layer.strokes = strokes;
    layer.effects = effects;
    Ok(())
}

/// Read the size prefix shared by self-sized brush records.
fn read_brush_size<R: Read>(r: &mut Reader<R>) -> Result<usize, DecodeError> {
    let size = r.read_i32()?;
    match usize::try_from(size) {
        Ok(0) | Err(_) => Err(DecodeError::Corrupt("empty brush record")),
        Ok(size) if size > Brush::SIZE => Err(DecodeError::StructTooLarge {
            what: "brush",
            declared: size as u64,
            max: Brush::SIZE,
        }),
        Ok(size) => Ok(size),
    }
}

fn read_stroke<R: Read>(
    r: &mut Reader<R>,
    version: Version,
    id: StrokeID,
) -> Result<Stroke, DecodeError> {
    let layout = version.stroke_brush_layout();
    let brush = match layout {
        BrushLayout::PreV7 => Brush::from(r.read_pod::<BrushPreV7>()?),
        BrushLayout::PreV8 => Brush::from(r.read_pod::<BrushPreV8>()?),
        BrushLayout::SelfSized => {
            let size = read_brush_size(r)?;
            let mut brush = Brush::default();
            r.read_prefix(&mut brush, size)?;
            brush
        }
    };
    let flags = if layout.has_stroke_flags() {
        StrokeFlags::from_bits_retain(r.read_u32()?)
    } else if brush.color == Color::LEGACY_ERASER {
        StrokeFlags::ERASER
    } else {
        StrokeFlags::empty()
    };

    let num_points = r.read_i32()?;
    let num_points = match usize::try_from(num_points) {
        Ok(n) if (1..=STROKE_MAX_POINTS).contains(&n) => n,
        _ => {
            log::error!("stroke has {num_points} points");
            return Err(DecodeError::Corrupt("stroke point count out of range"));
        }
    };
    if num_points == STROKE_MAX_POINTS {
        // Older builds could store one point more than they could load back.
        log::warn!("stroke at the {STROKE_MAX_POINTS} point limit");
    }
    let points = match version.point_layout() {
        PointLayout::Wide => r.read_vec::<[i64; 2]>(num_points)?,
        PointLayout::Narrow => r
            .read_vec::<[i32; 2]>(num_points)?
            .into_iter()
            .map(|point| point.map(i64::from))
            .collect(),
    };
    let pressures = r.read_vec::<f32>(num_points)?;
    let layer_id = r.read_i32()?;

    let mut stroke = Stroke {
        id,
        layer_id,
        brush,
        flags,
        points,
        pressures,
        bounding_rect: Rect::EMPTY,
    };
    stroke.update_bounds();
    Ok(stroke)
}

fn read_effects<R: Read>(r: &mut Reader<R>) -> Result<Vec<LayerEffect>, DecodeError> {
    // Zero or negative means none.
    let count = r.read_i64()?.max(0);
    let mut effects = Vec::new();
    for _ in 0..count {
        let ty = r.read_u32()?;
        let enabled = r.read_u8()? != 0;
        let kind = match EffectType::from_repr(ty) {
            Some(EffectType::Blur) => EffectKind::Blur {
                original_scale: r.read_i32()?,
                kernel_size: r.read_i32()?,
            },
            // Parameters of unknown effects can't be skipped.
            None => return Err(DecodeError::Corrupt("unknown layer effect")),
        };
        effects.push(LayerEffect { enabled, kind });
    }
    Ok(effects)
}

/// Read swatches over the live ones. Entries beyond the live slots are read and dropped.
fn read_buttons<R: Read>(r: &mut Reader<R>, live: &[Color]) -> Result<Vec<Color>, DecodeError> {
    let count = r.read_i32()?.max(0);
    let mut buttons = live.to_vec();
    let mut slots = buttons.iter_mut();
    for _ in 0..count {
        let color: Color = r.read_pod()?;
        if let Some(slot) = slots.next() {
            *slot = color;
        }
    }
    Ok(buttons)
}

fn read_brush_array<R: Read>(
    r: &mut Reader<R>,
    version: Version,
    slots: &mut BrushSlots,
) -> Result<(), DecodeError> {
    let (num_brushes, layout) = match version.brush_array_layout() {
        BrushArrayLayout::Absent => return Ok(()),
        BrushArrayLayout::PenAndEraser => (2, BrushLayout::PreV7),
        BrushArrayLayout::Counted(layout) => {
            let num = usize::from(r.read_u16()?);
            if num > BrushSlot::COUNT {
                log::error!("file has {num} brushes");
                return Err(DecodeError::Corrupt("too many brushes"));
            }
            (num, layout)
        }
    };
    let record_size = match layout {
        BrushLayout::SelfSized => read_brush_size(r)?,
        BrushLayout::PreV7 | BrushLayout::PreV8 => 0,
    };
    for brush in &mut slots.brushes[..num_brushes] {
        *brush = match layout {
            BrushLayout::PreV7 => Brush::from(r.read_pod::<BrushPreV7>()?),
            BrushLayout::PreV8 => Brush::from(r.read_pod::<BrushPreV8>()?),
            BrushLayout::SelfSized => {
                // Fields the record lacks keep their defaults.
                let mut brush = Brush::default();
                r.read_prefix(&mut brush, record_size)?;
                brush
            }
        };
    }
    for size in &mut slots.sizes[..num_brushes] {
        *size = r.read_i32()?;
    }
    Ok(())
}
