use anyhow::{Context, Result, anyhow};
use tracing::debug;

/// Downloads the base image. Payloads recognised as a non-image type are
/// rejected here; everything else is left to the image decoder.
pub async fn fetch_image(client: &reqwest::Client, url: &str) -> Result<Vec<u8>> {
    let response = client
        .get(url)
        .send()
        .await
        .with_context(|| format!("failed to fetch image: {}", url))?
        .error_for_status()
        .with_context(|| format!("image request was rejected: {}", url))?;
    let bytes = response
        .bytes()
        .await
        .with_context(|| format!("failed to read image body: {}", url))?;
    match sniff_payload(&bytes) {
        Payload::Other(mime) => {
            return Err(anyhow!("fetched resource is not an image ({}): {}", mime, url));
        }
        Payload::Image(mime) => debug!("fetched {} ({}, {} bytes)", url, mime, bytes.len()),
        Payload::Unknown => debug!("fetched {} (unrecognised type, {} bytes)", url, bytes.len()),
    }
    Ok(bytes.to_vec())
}

#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Payload {
    Image(&'static str),
    Other(&'static str),
    Unknown,
}

pub(crate) fn sniff_payload(bytes: &[u8]) -> Payload {
    match infer::get(bytes) {
        Some(kind) if kind.matcher_type() == infer::MatcherType::Image => {
            Payload::Image(kind.mime_type())
        }
        Some(kind) => Payload::Other(kind.mime_type()),
        None => Payload::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_image_payloads() {
        let png = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 0];
        assert_eq!(sniff_payload(&png), Payload::Image("image/png"));
        let jpeg = [0xFF, 0xD8, 0xFF, 0xE0, 0, 0x10];
        assert_eq!(sniff_payload(&jpeg), Payload::Image("image/jpeg"));
    }

    #[test]
    fn known_non_image_types_are_flagged() {
        assert_eq!(sniff_payload(b"%PDF-1.7"), Payload::Other("application/pdf"));
        assert_eq!(sniff_payload(b"<html></html>"), Payload::Other("text/html"));
    }

    #[test]
    fn unrecognised_payloads_are_left_to_the_decoder() {
        assert_eq!(sniff_payload(b""), Payload::Unknown);
        // Binary PPM: no magic number infer knows, but the decoder reads it.
        let ppm = b"P6\n1 1\n255\n\x10\x20\x30";
        assert_eq!(sniff_payload(ppm), Payload::Unknown);
        let decoded = image::load_from_memory(ppm).expect("decode ppm").to_rgb8();
        assert_eq!(decoded.get_pixel(0, 0).0, [0x10, 0x20, 0x30]);
    }
}
