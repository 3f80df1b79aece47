use std::borrow::Cow;

use super::style::Shadow;
use super::{LabelDocument, TextSpan};

const TEXT_SHADOW_ID: &str = "textShadow";
const BOX_SHADOW_ID: &str = "boxShadow";

const GENERIC_FAMILIES: [&str; 5] = ["serif", "sans-serif", "monospace", "cursive", "fantasy"];

pub(crate) fn escape(value: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(value)
}

/// `font-family` value for a requested family, ending in `sans-serif` so an
/// uninstalled family still renders. Returned unescaped.
pub(crate) fn font_family_list(family: &str) -> String {
    let family = family.trim();
    if let Some(generic) = GENERIC_FAMILIES
        .iter()
        .find(|generic| family.eq_ignore_ascii_case(generic))
    {
        generic.to_string()
    } else if family.contains(['"', '\'', ',']) {
        format!("{}, sans-serif", family)
    } else {
        format!("\"{}\", sans-serif", family)
    }
}

impl LabelDocument {
    /// Serializes the label as a standalone SVG the size of the canvas, with
    /// one background `<rect>` and one `<text>` block.
    pub fn to_svg(&self) -> String {
        let mut svg = String::new();
        svg.push_str(&format!(
            r#"<svg width="{w}" height="{h}" viewBox="0 0 {w} {h}" xmlns="http://www.w3.org/2000/svg">"#,
            w = self.canvas.width,
            h = self.canvas.height
        ));
        svg.push('\n');

        let text_shadow = self.text.shadow.as_ref();
        let box_shadow = self.background.shadow.as_ref();
        if text_shadow.is_some() || box_shadow.is_some() {
            svg.push_str("<defs>\n");
            if let Some(shadow) = text_shadow {
                push_drop_shadow(&mut svg, TEXT_SHADOW_ID, shadow);
            }
            if let Some(shadow) = box_shadow {
                push_drop_shadow(&mut svg, BOX_SHADOW_ID, shadow);
            }
            svg.push_str("</defs>\n");
        }

        let bg = &self.background;
        svg.push_str(&format!(
            r#"<rect x="{x}" y="{y}" width="{w}" height="{h}" rx="{rx}" fill="{fill}" opacity="{opacity}"{filter}/>"#,
            x = bg.x,
            y = bg.y,
            w = bg.width,
            h = bg.height,
            rx = bg.corner_radius,
            fill = escape(&bg.fill),
            opacity = bg.fill_opacity,
            filter = filter_attr(box_shadow.map(|_| BOX_SHADOW_ID))
        ));
        svg.push('\n');

        let text = &self.text;
        svg.push_str(&format!(
            r#"<text x="{x}" y="{y}" fill="{fill}" font-family="{family}" font-size="{size}" font-weight="{weight}"{filter}>"#,
            x = text.x,
            y = text.y,
            fill = escape(&text.fill),
            family = escape(&font_family_list(&text.font_family)),
            size = text.font_size,
            weight = escape(&text.font_weight),
            filter = filter_attr(text_shadow.map(|_| TEXT_SHADOW_ID))
        ));
        for span in &text.spans {
            push_span(&mut svg, span);
        }
        svg.push_str("</text>\n</svg>");
        svg
    }
}

fn push_drop_shadow(svg: &mut String, id: &str, shadow: &Shadow) {
    svg.push_str(&format!(
        r#"<filter id="{id}" x="-50%" y="-50%" width="200%" height="200%"><feDropShadow dx="{dx}" dy="{dy}" stdDeviation="{std}" flood-color="{color}" flood-opacity="{opacity}"/></filter>"#,
        dx = shadow.dx,
        dy = shadow.dy,
        std = shadow.std_deviation(),
        color = escape(&shadow.color),
        opacity = shadow.opacity
    ));
    svg.push('\n');
}

fn push_span(svg: &mut String, span: &TextSpan) {
    let style = if span.italic {
        r#" font-style="italic""#
    } else {
        ""
    };
    svg.push_str(&format!(
        r#"<tspan font-weight="{weight}"{style} xml:space="preserve">{content}</tspan>"#,
        weight = escape(&span.font_weight),
        content = escape(&span.content)
    ));
}

fn filter_attr(id: Option<&str>) -> String {
    id.map(|id| format!(r#" filter="url(#{id})""#))
        .unwrap_or_default()
}
