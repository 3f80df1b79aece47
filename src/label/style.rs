//! CSS-like style configuration and its resolution into concrete values.
//!
//! Resolution never fails: every missing or unparseable field falls back to
//! the documented default for that field.

use serde::{Deserialize, Serialize};

use super::measure::FontRequest;

pub const DEFAULT_FONT_SIZE: u32 = 22;
pub const DEFAULT_FONT_WEIGHT: &str = "normal";
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
pub const DEFAULT_COLOR: &str = "white";
pub const DEFAULT_BACKGROUND_COLOR: &str = "black";
pub const DEFAULT_OPACITY: f32 = 0.6;
pub const DEFAULT_PADDING: &str = "12px 25px 12px 15px";
pub const DEFAULT_BORDER_RADIUS: u32 = 0;
pub const DEFAULT_TEXT_SHADOW: &str = "3px 3px 6px rgba(0,0,0,1)";
pub const DEFAULT_BOX_SHADOW: &str = "none";

const PADDING_DEFAULT: Padding = Padding {
    top: 12,
    right: 25,
    bottom: 12,
    left: 15,
};

// Used per side when a token cannot be parsed or the shorthand has more
// than four values.
const PADDING_FALLBACK: Padding = Padding {
    top: 12,
    right: 15,
    bottom: 12,
    left: 15,
};

/// A style value as it arrives in JSON: `"28"` and `28` are equivalent.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CssValue {
    Number(f64),
    Text(String),
    Other(serde_json::Value),
}

impl CssValue {
    fn as_text(&self) -> Option<String> {
        match self {
            CssValue::Number(value) if value.is_finite() && value.fract() == 0.0 => {
                Some(format!("{}", *value as i64))
            }
            CssValue::Number(value) => Some(value.to_string()),
            CssValue::Text(value) if !value.trim().is_empty() => Some(value.clone()),
            _ => None,
        }
    }

    fn leading_int(&self) -> Option<i64> {
        match self {
            CssValue::Number(value) if value.is_finite() => Some(value.trunc() as i64),
            CssValue::Text(value) => parse_leading_int(value),
            _ => None,
        }
    }

    fn as_f32(&self) -> Option<f32> {
        match self {
            CssValue::Number(value) if value.is_finite() => Some(*value as f32),
            CssValue::Text(value) => value.trim().parse::<f32>().ok().filter(|v| v.is_finite()),
            _ => None,
        }
    }
}

impl From<&str> for CssValue {
    fn from(value: &str) -> Self {
        CssValue::Text(value.to_string())
    }
}

impl From<f64> for CssValue {
    fn from(value: f64) -> Self {
        CssValue::Number(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StyleConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_size: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_weight: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_family: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opacity: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub padding: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_radius: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_shadow: Option<CssValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub box_shadow: Option<CssValue>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Padding {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Padding {
    pub fn horizontal(&self) -> u32 {
        self.left.saturating_add(self.right)
    }

    pub fn vertical(&self) -> u32 {
        self.top.saturating_add(self.bottom)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shadow {
    pub dx: i32,
    pub dy: i32,
    pub blur: u32,
    pub color: String,
    pub opacity: f32,
}

impl Shadow {
    pub fn default_text() -> Self {
        Self {
            dx: 3,
            dy: 3,
            blur: 6,
            color: "rgba(0,0,0,1)".to_string(),
            opacity: 1.0,
        }
    }

    pub fn default_box() -> Self {
        Self {
            dx: 2,
            dy: 2,
            blur: 4,
            color: "black".to_string(),
            opacity: 0.5,
        }
    }

    /// Gaussian deviation handed to the rasterizer: half the blur length.
    pub fn std_deviation(&self) -> f32 {
        self.blur as f32 / 2.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedStyle {
    pub font_size: u32,
    pub font_weight: String,
    pub font_family: String,
    pub color: String,
    pub background_color: String,
    pub opacity: f32,
    pub padding: Padding,
    pub border_radius: u32,
    pub text_shadow: Option<Shadow>,
    pub box_shadow: Option<Shadow>,
}

impl Default for ResolvedStyle {
    fn default() -> Self {
        Self::resolve(None)
    }
}

impl ResolvedStyle {
    pub fn resolve(config: Option<&StyleConfig>) -> Self {
        let empty = StyleConfig::default();
        let config = config.unwrap_or(&empty);

        let font_size = config
            .font_size
            .as_ref()
            .and_then(CssValue::leading_int)
            .and_then(|size| u32::try_from(size).ok())
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_FONT_SIZE);
        let padding = config
            .padding
            .as_ref()
            .and_then(CssValue::as_text)
            .map(|value| parse_padding(&value))
            .unwrap_or(PADDING_DEFAULT);
        let border_radius = config
            .border_radius
            .as_ref()
            .and_then(CssValue::leading_int)
            .map(clamp_to_u32)
            .unwrap_or(DEFAULT_BORDER_RADIUS);
        let opacity = config
            .opacity
            .as_ref()
            .and_then(CssValue::as_f32)
            .unwrap_or(DEFAULT_OPACITY);
        let text_shadow = config
            .text_shadow
            .as_ref()
            .and_then(CssValue::as_text)
            .map_or_else(
                || Some(Shadow::default_text()),
                |value| parse_shadow(&value, Shadow::default_text()),
            );
        // The box shadow is a switch: any value but `none` draws the fixed shadow.
        let box_shadow = config
            .box_shadow
            .as_ref()
            .and_then(CssValue::as_text)
            .filter(|value| !value.trim().eq_ignore_ascii_case("none"))
            .map(|_| Shadow::default_box());

        Self {
            font_size,
            font_weight: text_or(config.font_weight.as_ref(), DEFAULT_FONT_WEIGHT),
            font_family: text_or(config.font_family.as_ref(), DEFAULT_FONT_FAMILY),
            color: text_or(config.color.as_ref(), DEFAULT_COLOR),
            background_color: text_or(config.background_color.as_ref(), DEFAULT_BACKGROUND_COLOR),
            opacity,
            padding,
            border_radius,
            text_shadow,
            box_shadow,
        }
    }

    pub fn font_request(&self) -> FontRequest {
        FontRequest {
            family: self.font_family.clone(),
            size: self.font_size,
            weight: self.font_weight.clone(),
        }
    }
}

fn text_or(value: Option<&CssValue>, default: &str) -> String {
    value
        .and_then(CssValue::as_text)
        .unwrap_or_else(|| default.to_string())
}

fn clamp_to_u32(value: i64) -> u32 {
    value.clamp(0, u32::MAX as i64) as u32
}

/// Parses a CSS padding shorthand (`top [right [bottom [left]]]`).
pub fn parse_padding(value: &str) -> Padding {
    let tokens = value
        .split_whitespace()
        .map(|token| parse_leading_int(token).map(clamp_to_u32))
        .collect::<Vec<_>>();
    let fb = PADDING_FALLBACK;
    match tokens.as_slice() {
        [] => PADDING_DEFAULT,
        [all] => Padding {
            top: all.unwrap_or(fb.top),
            right: all.unwrap_or(fb.right),
            bottom: all.unwrap_or(fb.bottom),
            left: all.unwrap_or(fb.left),
        },
        [vertical, horizontal] => Padding {
            top: vertical.unwrap_or(fb.top),
            right: horizontal.unwrap_or(fb.right),
            bottom: vertical.unwrap_or(fb.bottom),
            left: horizontal.unwrap_or(fb.left),
        },
        [top, horizontal, bottom] => Padding {
            top: top.unwrap_or(fb.top),
            right: horizontal.unwrap_or(fb.right),
            bottom: bottom.unwrap_or(fb.bottom),
            left: horizontal.unwrap_or(fb.left),
        },
        [top, right, bottom, left] => Padding {
            top: top.unwrap_or(fb.top),
            right: right.unwrap_or(fb.right),
            bottom: bottom.unwrap_or(fb.bottom),
            left: left.unwrap_or(fb.left),
        },
        _ => fb,
    }
}

/// Parses `<dx>px <dy>px <blur>px <color>`; `none` disables the shadow and a
/// value that does not match the pattern resolves to `fallback`.
pub fn parse_shadow(value: &str, fallback: Shadow) -> Option<Shadow> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("none") {
        return None;
    }
    match match_shadow(trimmed) {
        Some((dx, dy, blur, color)) => Some(Shadow {
            dx,
            dy,
            blur,
            color: color.to_string(),
            opacity: fallback.opacity,
        }),
        None => Some(fallback),
    }
}

fn match_shadow(value: &str) -> Option<(i32, i32, u32, &str)> {
    let (dx, rest) = take_px(value, true)?;
    let (dy, rest) = take_px(skip_whitespace(rest)?, true)?;
    let (blur, rest) = take_px(skip_whitespace(rest)?, false)?;
    let color = skip_whitespace(rest)?.trim_end();
    if color.is_empty() {
        return None;
    }
    Some((
        i32::try_from(dx).ok()?,
        i32::try_from(dy).ok()?,
        u32::try_from(blur).ok()?,
        color,
    ))
}

fn take_px(input: &str, signed: bool) -> Option<(i64, &str)> {
    let (negative, body) = match input.strip_prefix('-') {
        Some(body) if signed => (true, body),
        _ => (false, input),
    };
    let digits = body.len() - body.trim_start_matches(|ch: char| ch.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let value = body[..digits].parse::<i64>().ok()?;
    let rest = body[digits..].strip_prefix("px")?;
    Some((if negative { -value } else { value }, rest))
}

// At least one whitespace character is required between shadow components.
fn skip_whitespace(input: &str) -> Option<&str> {
    let trimmed = input.trim_start();
    (trimmed.len() < input.len()).then_some(trimmed)
}

/// Leading-integer parse: optional sign then digits, trailing units ignored.
pub(crate) fn parse_leading_int(value: &str) -> Option<i64> {
    let value = value.trim_start();
    let (negative, body) = if let Some(body) = value.strip_prefix('-') {
        (true, body)
    } else {
        (false, value.strip_prefix('+').unwrap_or(value))
    };
    let digits = body.len() - body.trim_start_matches(|ch: char| ch.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    let parsed = body[..digits].parse::<i64>().ok()?;
    Some(if negative { -parsed } else { parsed })
}
