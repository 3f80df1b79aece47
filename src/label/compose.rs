use anyhow::{Context, Result};
use tracing::debug;

use super::markup;
use super::measure::TextMeasurer;
use super::style::{ResolvedStyle, StyleConfig};
use super::{Anchor, Canvas, LabelBox, LabelDocument, LabelText, TextSpan};

/// Builds the label for `text`: measures the markup-free text, sizes the
/// padded box around it and pins the box to the bottom-right corner.
pub async fn compose_label<M>(
    text: &str,
    css: Option<&StyleConfig>,
    canvas: Canvas,
    measurer: &M,
) -> Result<LabelDocument>
where
    M: TextMeasurer + ?Sized,
{
    let style = ResolvedStyle::resolve(css);
    let plain = markup::plain_text(text);
    let measured = measurer
        .measure(&plain, &style.font_request())
        .await
        .with_context(|| "failed to measure label text")?;

    let padding = style.padding;
    let rect_width = measured.width.saturating_add(padding.horizontal());
    let rect_height = measured.height.saturating_add(padding.vertical());
    let (x, y) = Anchor::BottomRight.position(canvas, rect_width, rect_height);
    debug!(
        "label box {}x{} at ({}, {}) for text {}x{}",
        rect_width, rect_height, x, y, measured.width, measured.height
    );

    let spans = markup::parse_runs(text)
        .into_iter()
        .map(|run| TextSpan::from_run(run, &style.font_weight))
        .collect();

    Ok(LabelDocument {
        canvas,
        background: LabelBox {
            x,
            y,
            width: rect_width,
            height: rect_height,
            corner_radius: style.border_radius,
            fill: style.background_color,
            fill_opacity: style.opacity,
            shadow: style.box_shadow,
        },
        text: LabelText {
            x: x + padding.left as i64,
            y: y + rect_height as i64 - padding.bottom as i64,
            font_family: style.font_family,
            font_size: style.font_size,
            font_weight: style.font_weight,
            fill: style.color,
            spans,
            shadow: style.text_shadow,
        },
    })
}
