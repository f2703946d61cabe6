mod devices;
mod render;
mod templates;

pub use devices::*;
pub use render::*;
pub use templates::*;
