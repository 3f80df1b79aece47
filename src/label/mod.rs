mod compose;
pub mod markup;
mod measure;
pub mod style;
mod svg;

pub use compose::compose_label;
pub use markup::{StyledRun, parse_runs, plain_text};
pub use measure::{FontRequest, MeasureFuture, SvgTextMeasurer, TextMeasurer};
pub use style::{Padding, ResolvedStyle, Shadow, StyleConfig};

use serde::Serialize;

pub const DEFAULT_CANVAS_WIDTH: u32 = 1000;

/// Output canvas; the height always keeps a 16:9 ratio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn from_width(width: u32) -> Self {
        Self {
            width,
            height: (width as f64 * 9.0 / 16.0).round() as u32,
        }
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::from_width(DEFAULT_CANVAS_WIDTH)
    }
}

/// Corner of the canvas the label box is pinned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Anchor {
    #[default]
    BottomRight,
}

impl Anchor {
    /// Top-left corner of a `width`×`height` box. Oversized boxes are not
    /// clamped and produce negative coordinates.
    pub fn position(self, canvas: Canvas, width: u32, height: u32) -> (i64, i64) {
        match self {
            Anchor::BottomRight => (
                canvas.width as i64 - width as i64,
                canvas.height as i64 - height as i64,
            ),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelDocument {
    pub canvas: Canvas,
    pub background: LabelBox,
    pub text: LabelText,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelBox {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
    pub corner_radius: u32,
    pub fill: String,
    pub fill_opacity: f32,
    pub shadow: Option<Shadow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LabelText {
    pub x: i64,
    pub y: i64,
    pub font_family: String,
    pub font_size: u32,
    pub font_weight: String,
    pub fill: String,
    pub spans: Vec<TextSpan>,
    pub shadow: Option<Shadow>,
}

/// A styled run with its effective font weight and style.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextSpan {
    pub content: String,
    pub font_weight: String,
    pub italic: bool,
}

impl TextSpan {
    pub fn from_run(run: StyledRun, base_weight: &str) -> Self {
        let font_weight = if run.bold {
            "bold".to_string()
        } else {
            base_weight.to_string()
        };
        Self {
            content: run.content,
            font_weight,
            italic: run.italic,
        }
    }
}
