pub mod font;
pub mod render;
pub mod text;

pub use ab_glyph::FontVec;
pub use font::load_font;
pub use render::{SkiaRenderer, TextSizes, View};
