use super::{history::History, layer::Layer, picker::Picker, view::CanvasView};
use crate::brush::BrushSlots;
use crate::color::Rgb;
use crate::stroke::{StrokeFlags, StrokeID};

/// The complete drawing state. Replaced wholesale on load, never patched.
#[derive(Clone, PartialEq, Debug)]
pub struct Document {
    pub view: CanvasView,
    /// Layers, oldest (bottom-most) first.
    pub layers: Vec<Layer>,
    /// Index into `layers` of the layer receiving new strokes.
    pub working_layer: usize,
    /// Generator for layer ids. The next created layer takes this value.
    pub layer_guid: i32,
    /// Generator for stroke ids.
    pub stroke_id_count: u64,
    pub history: History,
    pub picker: Picker,
    pub brushes: BrushSlots,
    /// Flags of the stroke in progress, carried over from the working layer on load.
    pub working_stroke_flags: StrokeFlags,
    pub grid_rows: i32,
    pub grid_columns: i32,
}
impl Document {
    pub const DEFAULT_GRID: i32 = 5;

    /// A document with no layers at all. Not valid for editing until a layer is added.
    #[must_use]
    pub fn empty(screen_size: [i32; 2], background_color: Rgb) -> Self {
        Self {
            view: CanvasView::new(screen_size, background_color),
            layers: Vec::new(),
            working_layer: 0,
            layer_guid: 0,
            stroke_id_count: 0,
            history: History::new(),
            picker: Picker::default(),
            brushes: BrushSlots::default(),
            working_stroke_flags: StrokeFlags::empty(),
            grid_rows: Self::DEFAULT_GRID,
            grid_columns: Self::DEFAULT_GRID,
        }
    }
    /// A fresh canvas with a single background layer.
    #[must_use]
    pub fn new(screen_size: [i32; 2], background_color: Rgb) -> Self {
        let mut document = Self::empty(screen_size, background_color);
        document.new_layer().name = "Background".to_owned();
        document
    }
    /// Append a layer with a fresh id on top of the stack and make it the working layer.
    pub fn new_layer(&mut self) -> &mut Layer {
        let id = self.layer_guid;
        self.layer_guid = self.layer_guid.wrapping_add(1);
        self.layers.push(Layer::new(id));
        self.working_layer = self.layers.len() - 1;
        self.view.working_layer_id = id;
        // Just pushed, can't be empty.
        let last = self.layers.len() - 1;
        &mut self.layers[last]
    }
    #[must_use]
    pub fn working_layer(&self) -> Option<&Layer> {
        self.layers.get(self.working_layer)
    }
    /// Make the layer with the given id the working layer. Returns false if there is no such layer.
    pub fn set_working_layer_by_id(&mut self, id: i32) -> bool {
        if let Some(idx) = self.layers.iter().position(|layer| layer.id == id) {
            self.working_layer = idx;
            self.view.working_layer_id = id;
            true
        } else {
            false
        }
    }
    pub fn next_stroke_id(&mut self) -> StrokeID {
        let id = StrokeID(self.stroke_id_count);
        self.stroke_id_count += 1;
        id
    }
    #[must_use]
    pub fn stroke_count(&self) -> usize {
        self.layers.iter().map(|layer| layer.strokes.len()).sum()
    }
}

#[cfg(test)]
mod test {
    use super::Document;
    use crate::color::Rgb;
    #[test]
    fn layer_ids_are_never_reused() {
        let mut document = Document::new([100, 100], Rgb::WHITE);
        let first = document.layers[0].id;
        let second = document.new_layer().id;
        document.layers.remove(1);
        let third = document.new_layer().id;
        assert!(first < second && second < third);
        assert_eq!(document.view.working_layer_id, third);
    }
    #[test]
    fn working_layer_lookup() {
        let mut document = Document::new([100, 100], Rgb::WHITE);
        document.new_layer();
        assert!(document.set_working_layer_by_id(0));
        assert_eq!(document.working_layer, 0);
        assert!(!document.set_working_layer_by_id(42));
        assert_eq!(document.working_layer, 0);
    }
}
