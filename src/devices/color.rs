//! Color names, hex parsing, and RGB to HSV conversion for smart bulbs.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Bulb color: hue in degrees `0..360`, saturation and value in percent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hsv {
    pub hue: u16,
    pub saturation: u8,
    pub value: u8,
}

const WHITE: Rgb = Rgb(255, 255, 255);

/// Named colors accepted by [`parse_color`].
pub const COLOR_NAMES: &[(&str, Rgb)] = &[
    ("red", Rgb(255, 0, 0)),
    ("orange", Rgb(255, 165, 0)),
    ("yellow", Rgb(255, 255, 0)),
    ("green", Rgb(0, 255, 0)),
    ("blue", Rgb(0, 0, 255)),
    ("purple", Rgb(128, 0, 128)),
    ("pink", Rgb(255, 192, 203)),
    ("white", WHITE),
    ("warm_white", Rgb(255, 244, 229)),
    ("cool_white", WHITE),
];

/// Parse a color name or `#RRGGBB` hex code.
///
/// Names are case-insensitive and accept spaces or dashes for `_`. Unknown
/// names resolve to white; malformed hex is an error.
pub fn parse_color(input: &str) -> Result<Rgb, String> {
    let input = input.trim();

    if let Some(hex) = input.strip_prefix('#') {
        return parse_hex(hex).ok_or_else(|| format!("invalid hex color format: {input}"));
    }

    let key: String = input
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '-' || c == '_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");

    match COLOR_NAMES.iter().find(|(name, _)| *name == key) {
        Some((_, rgb)) => Ok(*rgb),
        None => {
            tracing::debug!(color = %input, "unknown color name, using white");
            Ok(WHITE)
        }
    }
}

fn parse_hex(hex: &str) -> Option<Rgb> {
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
}

/// Convert RGB to bulb HSV. Components are truncated, not rounded.
pub fn rgb_to_hsv(rgb: Rgb) -> Hsv {
    let r = f64::from(rgb.0) / 255.0;
    let g = f64::from(rgb.1) / 255.0;
    let b = f64::from(rgb.2) / 255.0;

    let cmax = r.max(g).max(b);
    let cmin = r.min(g).min(b);
    let diff = cmax - cmin;

    let hue = if diff == 0.0 {
        0.0
    } else if cmax == r {
        (60.0 * ((g - b) / diff) + 360.0) % 360.0
    } else if cmax == g {
        (60.0 * ((b - r) / diff) + 120.0) % 360.0
    } else {
        (60.0 * ((r - g) / diff) + 240.0) % 360.0
    };

    let saturation = if cmax == 0.0 { 0.0 } else { diff / cmax * 100.0 };
    let value = cmax * 100.0;

    Hsv {
        hue: hue as u16,
        saturation: saturation as u8,
        value: value as u8,
    }
}
