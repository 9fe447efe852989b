//! # Document encoder
//!
//! Always writes [`Version::CURRENT`]. Shortfalls the format can't represent (too many strokes,
//! too much history, unstorable strokes) are skipped and reported as a degraded save, while
//! I/O failures abort immediately.

use super::common::{CodecError, Writer};
use super::version::Version;
use super::MAGIC;
use crate::brush::{Brush, BrushSlot};
use crate::state::{layer::EffectKind, view::CanvasView, Document};
use crate::stroke::Stroke;
use az::CheckedAs;
use std::io::Write;

/// Most strokes a single layer can hold on disk.
pub const MAX_STROKES_PER_LAYER: usize = i32::MAX as usize;
/// Most undo records that can be stored.
pub const MAX_HISTORY: usize = i32::MAX as usize;

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("too many layers")]
    TooManyLayers,
}

/// Result of an encode that reached the end of the document.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Encoded {
    /// Some data was left out. The output is readable, but not a full copy.
    pub degraded: bool,
}

/// Write the whole document.
/// # Errors
/// Any I/O failure, or a document with more layers than the format can count.
pub fn encode<W: Write>(document: &Document, w: &mut Writer<W>) -> Result<Encoded, EncodeError> {
    let mut degraded = false;

    w.write_pod(&MAGIC)?;
    w.write_pod(&Version::CURRENT.0)?;
    // Always the full current view, whatever size it was loaded with.
    let view = CanvasView {
        size: CanvasView::SIZE as u32,
        ..document.view
    };
    w.write_pod(&view)?;

    let num_layers: i32 = document
        .layers
        .len()
        .checked_as()
        .ok_or(EncodeError::TooManyLayers)?;
    w.write_pod(&num_layers)?;
    w.write_pod(&document.layer_guid)?;

    for layer in &document.layers {
        let name = layer.stored_name();
        // Bounded by `Layer::MAX_NAME_LEN`
        w.write_pod(&(name.len() as i32))?;
        w.write_bytes(&name)?;
        w.write_pod(&layer.id)?;
        w.write_pod(&layer.flags.bits())?;

        // Filter before counting, so the count always matches what follows.
        let mut strokes: Vec<&Stroke> = layer
            .strokes
            .iter()
            .filter(|stroke| {
                let valid = stroke.is_valid();
                if !valid {
                    log::warn!(
                        "skipping stroke {:?} with {} points, {} pressures",
                        stroke.id,
                        stroke.points.len(),
                        stroke.pressures.len()
                    );
                    degraded = true;
                }
                valid
            })
            .collect();
        if strokes.len() > MAX_STROKES_PER_LAYER {
            log::warn!(
                "layer {} has {} strokes, only saving the first {MAX_STROKES_PER_LAYER}",
                layer.id,
                strokes.len()
            );
            strokes.truncate(MAX_STROKES_PER_LAYER);
            degraded = true;
        }
        // Truncated above
        w.write_pod(&(strokes.len() as i32))?;
        for stroke in strokes {
            write_stroke(w, stroke)?;
        }

        let num_effects = layer.effects.len() as i64;
        w.write_pod(&num_effects)?;
        for effect in &layer.effects {
            w.write_pod(&(effect.kind.effect_type() as u32))?;
            w.write_pod(&u8::from(effect.enabled))?;
            match effect.kind {
                EffectKind::Blur {
                    original_scale,
                    kernel_size,
                } => {
                    w.write_pod(&original_scale)?;
                    w.write_pod(&kernel_size)?;
                }
            }
        }
    }

    w.write_pod(&document.picker.rgb)?;
    let buttons = &document.picker.buttons[..document.picker.buttons.len().min(i32::MAX as usize)];
    w.write_pod(&(buttons.len() as i32))?;
    w.write_slice(buttons)?;

    w.write_pod(&(BrushSlot::COUNT as u16))?;
    w.write_pod(&(Brush::SIZE as i32))?;
    w.write_slice(&document.brushes.brushes)?;
    w.write_slice(&document.brushes.sizes)?;

    let history = if document.history.len() > MAX_HISTORY {
        log::warn!(
            "{} undo records can't be stored, dropping history",
            document.history.len()
        );
        degraded = true;
        &[][..]
    } else {
        &document.history[..]
    };
    // Checked above
    w.write_pod(&(history.len() as i32))?;
    w.write_slice(history)?;

    for layer in &document.layers {
        w.write_pod(&layer.alpha)?;
    }
    w.write_pod(&document.grid_rows)?;
    w.write_pod(&document.grid_columns)?;

    Ok(Encoded { degraded })
}

fn write_stroke<W: Write>(w: &mut Writer<W>, stroke: &Stroke) -> Result<(), CodecError> {
    w.write_pod(&(Brush::SIZE as i32))?;
    w.write_pod(&stroke.brush)?;
    w.write_pod(&stroke.flags.bits())?;
    // Checked by `Stroke::is_valid`
    w.write_pod(&(stroke.points.len() as i32))?;
    w.write_slice(&stroke.points)?;
    w.write_slice(&stroke.pressures)?;
    w.write_pod(&stroke.layer_id)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::color::Rgb;
    use crate::io::common::Reader;
    use crate::io::decode::{decode, DecodeContext};
    use crate::stroke::{StrokeFlags, STROKE_MAX_POINTS};
    use crate::util::Rect;

    fn stroke(document: &mut Document, len: usize) -> Stroke {
        let mut stroke = Stroke {
            id: document.next_stroke_id(),
            layer_id: 0,
            brush: Brush::default(),
            flags: StrokeFlags::PRESSURE_TO_OPACITY,
            points: (0..len as i64).map(|i| [i, -i]).collect(),
            pressures: vec![0.5; len],
            bounding_rect: Rect::EMPTY,
        };
        stroke.update_bounds();
        stroke
    }

    #[test]
    fn unstorable_strokes_are_skipped() {
        let mut document = Document::new([100, 100], Rgb::WHITE);
        let strokes = vec![
            stroke(&mut document, 3),
            stroke(&mut document, 0),
            stroke(&mut document, STROKE_MAX_POINTS + 1),
            stroke(&mut document, STROKE_MAX_POINTS),
        ];
        document.layers[0].strokes = strokes;

        let mut writer = Writer::new(Vec::new());
        let encoded = encode(&document, &mut writer).unwrap();
        assert!(encoded.degraded);
        assert_eq!(writer.bytes_written() as usize, writer.into_inner().len());

        let mut writer = Writer::new(Vec::new());
        encode(&document, &mut writer).unwrap();
        let bytes = writer.into_inner();
        let context = DecodeContext::replacing(&Document::new([100, 100], Rgb::WHITE), Rgb::WHITE);
        let mut reader = Reader::new(&bytes[..], bytes.len() as u64);
        let (decoded, _) = decode(&mut reader, &context, |_| true).unwrap();
        let lens: Vec<usize> = decoded.layers[0]
            .strokes
            .iter()
            .map(|stroke| stroke.points.len())
            .collect();
        assert_eq!(lens, vec![3, STROKE_MAX_POINTS]);
    }

    #[test]
    fn header_and_view() {
        let mut document = Document::new([100, 100], Rgb::WHITE);
        // A view read from a smaller struct is still written in full.
        document.view.size = 20;
        let mut writer = Writer::new(Vec::new());
        let encoded = encode(&document, &mut writer).unwrap();
        assert!(!encoded.degraded);
        let bytes = writer.into_inner();
        assert_eq!(bytes[0..4], MAGIC.to_ne_bytes());
        assert_eq!(bytes[4..8], Version::CURRENT.0.to_ne_bytes());
        assert_eq!(bytes[8..12], (CanvasView::SIZE as u32).to_ne_bytes());
    }

    #[test]
    fn io_failure_aborts() {
        let document = Document::new([100, 100], Rgb::WHITE);
        let mut buf = [0u8; 40];
        let mut writer = Writer::new(&mut buf[..]);
        assert!(matches!(
            encode(&document, &mut writer),
            Err(EncodeError::Codec(CodecError::ShortWrite))
        ));
    }
}
