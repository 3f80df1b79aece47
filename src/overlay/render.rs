use anyhow::{Context, Result, anyhow};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, Rgb, RgbImage, RgbaImage};
use resvg::render;
use std::io::Cursor;
use std::sync::Arc;
use tiny_skia::Pixmap;
use usvg::{Options, Tree, fontdb};

use crate::label::Canvas;

/// Rasterizes an SVG into straight (non-premultiplied) RGBA.
pub fn rasterize_svg(svg: &str, fontdb: Arc<fontdb::Database>) -> Result<RgbaImage> {
    let options = Options {
        fontdb,
        ..Options::default()
    };
    let tree = Tree::from_str(svg, &options).with_context(|| "failed to parse label SVG")?;
    let size = tree.size().to_int_size();
    let mut pixmap =
        Pixmap::new(size.width(), size.height()).ok_or_else(|| anyhow!("empty SVG size"))?;
    let mut pixmap_mut = pixmap.as_mut();
    render(&tree, tiny_skia::Transform::identity(), &mut pixmap_mut);

    let mut data = Vec::with_capacity(pixmap.data().len());
    for pixel in pixmap.pixels() {
        let color = pixel.demultiply();
        data.extend_from_slice(&[color.red(), color.green(), color.blue(), color.alpha()]);
    }
    RgbaImage::from_raw(size.width(), size.height(), data)
        .ok_or_else(|| anyhow!("failed to build image buffer from SVG"))
}

/// Resizes the base image to cover the canvas, layers the rasterized label
/// over it at the origin and encodes the result as JPEG.
pub fn composite_label(
    base_image: &[u8],
    label_svg: &str,
    canvas: Canvas,
    fontdb: Arc<fontdb::Database>,
) -> Result<Vec<u8>> {
    let base = image::load_from_memory(base_image).with_context(|| "failed to decode base image")?;
    let mut base = base
        .resize_to_fill(canvas.width, canvas.height, FilterType::Lanczos3)
        .to_rgba8();
    let label = rasterize_svg(label_svg, fontdb)?;
    image::imageops::overlay(&mut base, &label, 0, 0);
    encode_jpeg(base)
}

fn encode_jpeg(image: RgbaImage) -> Result<Vec<u8>> {
    let rgb = flatten_onto_black(&image);
    let mut bytes = Vec::new();
    let mut cursor = Cursor::new(&mut bytes);
    DynamicImage::ImageRgb8(rgb)
        .write_to(&mut cursor, ImageFormat::Jpeg)
        .with_context(|| "failed to encode JPEG")?;
    Ok(bytes)
}

/// JPEG has no alpha: transparent areas become black.
fn flatten_onto_black(image: &RgbaImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b, a] = image.get_pixel(x, y).0;
        let scale = |channel: u8| ((channel as u16 * a as u16 + 127) / 255) as u8;
        Rgb([scale(r), scale(g), scale(b)])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_fonts() -> Arc<fontdb::Database> {
        Arc::new(fontdb::Database::new())
    }

    fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba(color));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgba8(image)
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .expect("encode png");
        bytes
    }

    #[test]
    fn rasterized_pixels_are_demultiplied() {
        let svg = r##"<svg width="4" height="4" xmlns="http://www.w3.org/2000/svg"><rect x="0" y="0" width="4" height="4" fill="#ff0000" opacity="0.5"/></svg>"##;
        let image = rasterize_svg(svg, empty_fonts()).expect("rasterize");
        assert_eq!(image.dimensions(), (4, 4));
        let pixel = image.get_pixel(1, 1).0;
        assert!(pixel[0] >= 250, "red channel: {:?}", pixel);
        assert_eq!(pixel[1], 0);
        assert!((120..=135).contains(&pixel[3]), "alpha: {:?}", pixel);
    }

    #[test]
    fn invalid_svg_is_an_error() {
        assert!(rasterize_svg("<svg", empty_fonts()).is_err());
    }

    #[test]
    fn label_is_layered_over_resized_base() {
        let canvas = Canvas::from_width(160);
        let base = png(32, 18, [255, 255, 255, 255]);
        let svg = format!(
            r#"<svg width="{w}" height="{h}" xmlns="http://www.w3.org/2000/svg"><rect x="{x}" y="{y}" width="60" height="30" fill="black"/></svg>"#,
            w = canvas.width,
            h = canvas.height,
            x = canvas.width - 60,
            y = canvas.height - 30
        );
        let jpeg = composite_label(&base, &svg, canvas, empty_fonts()).expect("composite");
        let decoded = image::load_from_memory(&jpeg).expect("decode jpeg").to_rgb8();
        assert_eq!(decoded.dimensions(), (160, 90));
        assert!(decoded.get_pixel(5, 5).0.iter().all(|channel| *channel > 200));
        assert!(decoded.get_pixel(150, 85).0.iter().all(|channel| *channel < 60));
    }

    #[test]
    fn transparency_is_flattened_onto_black() {
        let mut image = RgbaImage::from_pixel(3, 1, image::Rgba([255, 255, 255, 0]));
        image.put_pixel(1, 0, image::Rgba([200, 100, 50, 255]));
        image.put_pixel(2, 0, image::Rgba([255, 255, 255, 128]));
        let flat = flatten_onto_black(&image);
        assert_eq!(flat.get_pixel(0, 0).0, [0, 0, 0]);
        assert_eq!(flat.get_pixel(1, 0).0, [200, 100, 50]);
        assert_eq!(flat.get_pixel(2, 0).0, [128, 128, 128]);
    }

    #[test]
    fn transparent_base_encodes_black() {
        let canvas = Canvas::from_width(32);
        let base = png(32, 18, [255, 255, 255, 0]);
        let svg = format!(
            r#"<svg width="{}" height="{}" xmlns="http://www.w3.org/2000/svg"/>"#,
            canvas.width, canvas.height
        );
        let jpeg = composite_label(&base, &svg, canvas, empty_fonts()).expect("composite");
        let decoded = image::load_from_memory(&jpeg).expect("decode jpeg").to_rgb8();
        assert!(decoded.get_pixel(16, 9).0.iter().all(|channel| *channel < 20));
    }

    #[test]
    fn undecodable_base_image_is_an_error() {
        let err = composite_label(b"nope", "<svg/>", Canvas::default(), empty_fonts())
            .expect_err("bad base");
        assert!(err.to_string().contains("failed to decode base image"));
    }
}
