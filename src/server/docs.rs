use anyhow::{Context, Result};
use serde::Serialize;
use tera::{Context as TeraContext, Tera};

use super::overlay::MAX_TEXT_LEN;
use crate::label::Canvas;
use crate::label::style::{
    DEFAULT_BACKGROUND_COLOR, DEFAULT_BORDER_RADIUS, DEFAULT_BOX_SHADOW, DEFAULT_COLOR,
    DEFAULT_FONT_FAMILY, DEFAULT_FONT_SIZE, DEFAULT_FONT_WEIGHT, DEFAULT_OPACITY, DEFAULT_PADDING,
    DEFAULT_TEXT_SHADOW,
};

const DOCS_TEMPLATE: &str = include_str!("templates/docs.txt.tera");

#[derive(Serialize)]
struct StyleDefaults {
    font_size: u32,
    font_weight: &'static str,
    font_family: &'static str,
    color: &'static str,
    background_color: &'static str,
    opacity: String,
    padding: &'static str,
    border_radius: u32,
    text_shadow: &'static str,
    box_shadow: &'static str,
}

pub(crate) fn render_docs(canvas: Canvas) -> Result<String> {
    let defaults = StyleDefaults {
        font_size: DEFAULT_FONT_SIZE,
        font_weight: DEFAULT_FONT_WEIGHT,
        font_family: DEFAULT_FONT_FAMILY,
        color: DEFAULT_COLOR,
        background_color: DEFAULT_BACKGROUND_COLOR,
        opacity: DEFAULT_OPACITY.to_string(),
        padding: DEFAULT_PADDING,
        border_radius: DEFAULT_BORDER_RADIUS,
        text_shadow: DEFAULT_TEXT_SHADOW,
        box_shadow: DEFAULT_BOX_SHADOW,
    };
    let mut context = TeraContext::new();
    context.insert("defaults", &defaults);
    context.insert("max_text_len", &MAX_TEXT_LEN);
    context.insert("canvas_width", &canvas.width);
    context.insert("canvas_height", &canvas.height);
    Tera::one_off(DOCS_TEMPLATE, &context, false).with_context(|| "failed to render docs template")
}
