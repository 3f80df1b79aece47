mod fetch;
mod font;
mod render;

pub use fetch::fetch_image;
pub use font::load_font_database;
pub use render::{composite_label, rasterize_svg};
