//! Geometry helpers: CSS-length parsing and node bounding boxes.
//!
//! Style values arrive as loosely typed JSON (`"120px"`, `120`, `"auto"`).
//! Everything here is pure; unparsable input collapses to `0`.

use crate::model::PropMap;
use serde_json::Value;
use winnow::ascii::{digit0, digit1};
use winnow::combinator::{alt, opt};
use winnow::prelude::*;
use winnow::token::one_of;

/// Read a numeric length out of a style value.
///
/// Numbers pass through. Strings yield their leading decimal number, so
/// `"120px"` is `120` and `"auto"` is `0`.
pub fn parse_length(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Value::String(s) => parse_length_str(s),
        _ => 0.0,
    }
}

/// String form of [`parse_length`].
pub fn parse_length_str(s: &str) -> f64 {
    let mut rest = s.trim_start();
    decimal
        .parse_next(&mut rest)
        .ok()
        .and_then(|text| text.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Look up `key` in a style map and parse it as a length (missing → 0).
pub fn style_length(style: &PropMap, key: &str) -> f64 {
    style.get(key).map(parse_length).unwrap_or(0.0)
}

/// Leading decimal literal: sign, digits, optional fraction and exponent.
fn decimal<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    (
        opt(one_of(['+', '-'])),
        alt((
            (digit1, opt(('.', digit0))).void(),
            ('.', digit1).void(),
        )),
        opt((one_of(['e', 'E']), opt(one_of(['+', '-'])), digit1)),
    )
        .take()
        .parse_next(input)
}

/// Shortest decimal text for a number (`280`, `12.5`); negative zero prints as `0`.
pub fn format_number(n: f64) -> String {
    if n == 0.0 || !n.is_finite() {
        return "0".to_string();
    }
    format!("{n}")
}

/// Format a number as a pixel length, e.g. `280px`.
pub fn format_px(n: f64) -> String {
    format!("{}px", format_number(n))
}

/// Axis-aligned rectangle in canvas coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Bounds {
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Bounds described by a node's `left`/`top`/`width`/`height` style.
    pub fn of_style(style: &PropMap) -> Self {
        let left = style_length(style, "left");
        let top = style_length(style, "top");
        Self {
            left,
            top,
            right: left + style_length(style, "width"),
            bottom: top + style_length(style, "height"),
        }
    }

    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Smallest rectangle containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }
}
