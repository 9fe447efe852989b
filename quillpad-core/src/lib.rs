pub mod bindings;
pub mod brush;
pub mod color;
pub mod config;
pub mod frontend;
pub mod io;
pub mod session;
pub mod settings;
pub mod state;
pub mod stroke;
pub mod util;
