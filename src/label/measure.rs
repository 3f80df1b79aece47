use anyhow::{Context, Result, anyhow};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;
use usvg::{Group, Node, Options, Tree, fontdb};

use super::Dimensions;
use super::svg::{escape, font_family_list};

pub type MeasureFuture = Pin<Box<dyn Future<Output = Result<Dimensions>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FontRequest {
    pub family: String,
    pub size: u32,
    pub weight: String,
}

/// Reports the rendered extent of a single, unwrapped line of text.
pub trait TextMeasurer: Send + Sync {
    fn measure(&self, text: &str, font: &FontRequest) -> MeasureFuture;
}

/// Measures text by laying it out with `usvg` against a shared font database.
#[derive(Clone)]
pub struct SvgTextMeasurer {
    fontdb: Arc<fontdb::Database>,
}

impl SvgTextMeasurer {
    pub fn new(fontdb: Arc<fontdb::Database>) -> Self {
        Self { fontdb }
    }
}

impl TextMeasurer for SvgTextMeasurer {
    fn measure(&self, text: &str, font: &FontRequest) -> MeasureFuture {
        let fontdb = self.fontdb.clone();
        let text = text.to_string();
        let font = font.clone();
        Box::pin(async move {
            if text.trim().is_empty() {
                return Ok(Dimensions::default());
            }
            tokio::task::spawn_blocking(move || measure_blocking(&text, &font, fontdb))
                .await
                .map_err(|err| anyhow!("measurement task failed: {}", err))?
        })
    }
}

fn measure_blocking(
    text: &str,
    font: &FontRequest,
    fontdb: Arc<fontdb::Database>,
) -> Result<Dimensions> {
    let svg = measurement_svg(text, font);
    let options = Options {
        fontdb,
        ..Options::default()
    };
    let tree = Tree::from_str(&svg, &options).with_context(|| "failed to parse measurement SVG")?;
    let (left, top, right, bottom) = text_bounds(tree.root()).ok_or_else(|| {
        anyhow!(
            "no glyphs rendered for font '{}' ({}px, {})",
            font.family,
            font.size,
            font.weight
        )
    })?;
    let dimensions = Dimensions {
        width: (right - left).max(0.0).ceil() as u32,
        height: (bottom - top).max(0.0).ceil() as u32,
    };
    debug!(
        "measured {:?} with {} {}px {}: {}x{}",
        text, font.family, font.size, font.weight, dimensions.width, dimensions.height
    );
    Ok(dimensions)
}

pub(crate) fn measurement_svg(text: &str, font: &FontRequest) -> String {
    format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg"><text x="0" y="{size}" font-family="{family}" font-size="{size}" font-weight="{weight}" xml:space="preserve">{text}</text></svg>"#,
        size = font.size,
        family = escape(&font_family_list(&font.family)),
        weight = escape(&font.weight),
        text = escape(text)
    )
}

fn text_bounds(group: &Group) -> Option<(f32, f32, f32, f32)> {
    let mut bounds: Option<(f32, f32, f32, f32)> = None;
    for node in group.children() {
        let found = match node {
            Node::Text(text) => {
                let bbox = text.bounding_box();
                Some((bbox.left(), bbox.top(), bbox.right(), bbox.bottom()))
            }
            Node::Group(group) => text_bounds(group),
            _ => None,
        };
        if let Some((l, t, r, b)) = found {
            bounds = Some(match bounds {
                Some((bl, bt, br, bb)) => (bl.min(l), bt.min(t), br.max(r), bb.max(b)),
                None => (l, t, r, b),
            });
        }
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> FontRequest {
        FontRequest {
            family: "Noto \"Sans\"".to_string(),
            size: 22,
            weight: "bold".to_string(),
        }
    }

    #[test]
    fn measurement_svg_escapes_text_and_font() {
        let svg = measurement_svg("A & B <c>", &font());
        assert!(svg.contains(r#"font-family="Noto &quot;Sans&quot;, sans-serif""#));
        assert!(svg.contains(r#"font-size="22""#));
        assert!(svg.contains(r#"font-weight="bold""#));
        assert!(svg.contains(">A &amp; B &lt;c&gt;</text>"));
    }

    fn request(family: &str) -> FontRequest {
        FontRequest {
            family: family.to_string(),
            size: 22,
            weight: "normal".to_string(),
        }
    }

    #[tokio::test]
    async fn text_without_fonts_is_a_measurement_failure() {
        let measurer = SvgTextMeasurer::new(Arc::new(fontdb::Database::new()));
        let err = measurer
            .measure("Hello", &request("sans-serif"))
            .await
            .expect_err("no fonts loaded");
        assert!(err.to_string().contains("no glyphs rendered"));
    }

    #[tokio::test]
    async fn system_fonts_measure_real_text() {
        let db = crate::overlay::load_font_database(None, None).expect("font database");
        if db.len() == 0 {
            return;
        }
        let measurer = SvgTextMeasurer::new(db);
        for family in ["sans-serif", "Arial", "No Such Family 0xdead"] {
            let dims = measurer
                .measure("Hello World", &request(family))
                .await
                .expect("measure");
            assert!(dims.width > 0 && dims.height > 0, "{}: {:?}", family, dims);
        }
    }

    #[tokio::test]
    async fn blank_text_measures_zero() {
        let measurer = SvgTextMeasurer::new(Arc::new(fontdb::Database::new()));
        let dims = measurer.measure("   ", &font()).await.expect("measure");
        assert_eq!(dims, Dimensions::default());
    }
}
