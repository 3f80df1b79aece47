//! Credit overlay service: renders a styled rich-text credit label and
//! composites it onto a remote image.

pub mod label;
pub mod logging;
pub mod overlay;
pub mod server;
pub mod settings;

#[cfg(test)]
mod test_util;

pub use label::{
    Canvas, LabelDocument, ResolvedStyle, StyleConfig, StyledRun, SvgTextMeasurer, TextMeasurer,
    compose_label,
};
