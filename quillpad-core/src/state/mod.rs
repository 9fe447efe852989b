pub mod document;
pub mod history;
pub mod layer;
pub mod picker;
pub mod view;

pub use document::Document;
