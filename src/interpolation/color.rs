//! Color parsing and interpolation.
//!
//! Accepts `#rgb`, `#rrggbb`, `rgb()`, `rgba()`, `hsl()`, `hsla()` and a
//! small set of named colors. Committed values are always serialized as
//! `rgb()`/`rgba()`.

use crate::interpolation::{Parsed, ValueInterpolator};
use crate::params::{format_number, PropValue};
use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    static ref NAMED_COLORS: HashMap<&'static str, Rgba> = [
        ("black", Rgba::opaque(0.0, 0.0, 0.0)),
        ("white", Rgba::opaque(255.0, 255.0, 255.0)),
        ("red", Rgba::opaque(255.0, 0.0, 0.0)),
        ("green", Rgba::opaque(0.0, 128.0, 0.0)),
        ("blue", Rgba::opaque(0.0, 0.0, 255.0)),
        ("yellow", Rgba::opaque(255.0, 255.0, 0.0)),
        ("cyan", Rgba::opaque(0.0, 255.0, 255.0)),
        ("magenta", Rgba::opaque(255.0, 0.0, 255.0)),
        ("gray", Rgba::opaque(128.0, 128.0, 128.0)),
        ("orange", Rgba::opaque(255.0, 165.0, 0.0)),
        ("transparent", Rgba { r: 0.0, g: 0.0, b: 0.0, a: 0.0 }),
    ]
    .into_iter()
    .collect();
}

/// A color in rgba space; channels 0..=255, alpha 0..=1.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Rgba {
    pub fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    fn lerp(&self, other: &Rgba, t: f64) -> Rgba {
        Rgba {
            r: self.r + (other.r - self.r) * t,
            g: self.g + (other.g - self.g) * t,
            b: self.b + (other.b - self.b) * t,
            a: self.a + (other.a - self.a) * t,
        }
    }

    fn serialize(&self) -> String {
        let r = self.r.round().clamp(0.0, 255.0);
        let g = self.g.round().clamp(0.0, 255.0);
        let b = self.b.round().clamp(0.0, 255.0);
        let a = self.a.clamp(0.0, 1.0);
        if (a - 1.0).abs() < 1e-9 {
            format!("rgb({}, {}, {})", r as i64, g as i64, b as i64)
        } else {
            format!(
                "rgba({}, {}, {}, {})",
                r as i64,
                g as i64,
                b as i64,
                format_number(a)
            )
        }
    }
}

/// Parse a color string, or `None` when it is not a color.
pub fn parse(s: &str) -> Option<Rgba> {
    let t = s.trim();
    if let Some(hex) = t.strip_prefix('#') {
        return parse_hex(hex);
    }
    let lower = t.to_ascii_lowercase();
    if let Some(named) = NAMED_COLORS.get(lower.as_str()) {
        return Some(*named);
    }
    if let Some(args) = call_args(&lower, "rgba").or_else(|| call_args(&lower, "rgb")) {
        let nums = parse_args(&args)?;
        return match nums.as_slice() {
            [r, g, b] => Some(Rgba::opaque(*r, *g, *b)),
            [r, g, b, a] => Some(Rgba {
                r: *r,
                g: *g,
                b: *b,
                a: *a,
            }),
            _ => None,
        };
    }
    if let Some(args) = call_args(&lower, "hsla").or_else(|| call_args(&lower, "hsl")) {
        let nums = parse_args(&args)?;
        return match nums.as_slice() {
            [h, s, l] => Some(hsl_to_rgb(*h, *s / 100.0, *l / 100.0, 1.0)),
            [h, s, l, a] => Some(hsl_to_rgb(*h, *s / 100.0, *l / 100.0, *a)),
            _ => None,
        };
    }
    None
}

fn call_args(s: &str, name: &str) -> Option<String> {
    let rest = s.strip_prefix(name)?.trim_start();
    let inner = rest.strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.to_string())
}

fn parse_args(args: &str) -> Option<Vec<f64>> {
    args.split(',')
        .map(|p| p.trim().trim_end_matches('%').parse::<f64>().ok())
        .collect()
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let expand = |c: u8| -> u8 { c << 4 | c };
    match hex.len() {
        3 => {
            let r = u8::from_str_radix(&hex[0..1], 16).ok()?;
            let g = u8::from_str_radix(&hex[1..2], 16).ok()?;
            let b = u8::from_str_radix(&hex[2..3], 16).ok()?;
            Some(Rgba::opaque(
                expand(r) as f64,
                expand(g) as f64,
                expand(b) as f64,
            ))
        }
        6 => {
            let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
            let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
            let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
            Some(Rgba::opaque(r as f64, g as f64, b as f64))
        }
        _ => None,
    }
}

fn hsl_to_rgb(h: f64, s: f64, l: f64, a: f64) -> Rgba {
    let h = h.rem_euclid(360.0) / 360.0;
    let s = s.clamp(0.0, 1.0);
    let l = l.clamp(0.0, 1.0);
    if s == 0.0 {
        let v = l * 255.0;
        return Rgba { r: v, g: v, b: v, a };
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f64| -> f64 {
        let t = t.rem_euclid(1.0);
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        v * 255.0
    };
    Rgba {
        r: channel(h + 1.0 / 3.0),
        g: channel(h),
        b: channel(h - 1.0 / 3.0),
        a,
    }
}

#[derive(Debug)]
pub struct ColorInterpolator {
    from: Rgba,
    to: Rgba,
}

impl ValueInterpolator for ColorInterpolator {
    fn value_at(&self, eased: f64) -> PropValue {
        // Easing overshoot makes no sense in color space.
        let t = eased.clamp(0.0, 1.0);
        PropValue::Text(self.from.lerp(&self.to, t).serialize())
    }
}

/// Accepts two parsed colors.
pub fn create(from: &Parsed, to: &Parsed) -> Option<Box<dyn ValueInterpolator>> {
    let (Parsed::Color(f), Parsed::Color(t)) = (from, to) else {
        return None;
    };
    Some(Box::new(ColorInterpolator { from: *f, to: *t }))
}
