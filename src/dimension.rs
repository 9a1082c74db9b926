use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

const PIXELS_PER_INCH: f64 = 96.0;

/// A CSS-style length as written in configuration, e.g. `8.5in` or `10mm`.
///
/// The original text is kept for display; the browser receives inches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Dimension {
    raw: String,
    pixels: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum DimensionParseError {
    #[error("Empty dimension")]
    Empty,
    #[error("Invalid dimension '{0}': expected a number optionally followed by px, in, cm or mm")]
    InvalidNumber(String),
    #[error("Dimension must not be negative: {0}")]
    Negative(String),
}

impl Dimension {
    pub fn from_inches(value: f64) -> Self {
        Dimension {
            raw: format!("{value}in"),
            pixels: value * PIXELS_PER_INCH,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn pixels(&self) -> f64 {
        self.pixels
    }

    pub fn inches(&self) -> f64 {
        self.pixels / PIXELS_PER_INCH
    }
}

fn unit_to_pixels(unit: &str) -> Option<f64> {
    match unit {
        "px" => Some(1.0),
        "in" => Some(PIXELS_PER_INCH),
        "cm" => Some(37.8),
        "mm" => Some(3.78),
        _ => None,
    }
}

impl FromStr for Dimension {
    type Err = DimensionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        if text.is_empty() {
            return Err(DimensionParseError::Empty);
        }

        // A bare number is pixels.
        let (value, factor) = match text
            .len()
            .checked_sub(2)
            .filter(|&split| text.is_char_boundary(split))
            .and_then(|split| {
                let unit = text[split..].to_ascii_lowercase();
                unit_to_pixels(&unit).map(|factor| (&text[..split], factor))
            }) {
            Some(pair) => pair,
            None => (text, 1.0),
        };

        let number: f64 = value
            .trim()
            .parse()
            .map_err(|_| DimensionParseError::InvalidNumber(text.to_string()))?;
        if !number.is_finite() {
            return Err(DimensionParseError::InvalidNumber(text.to_string()));
        }
        if number < 0.0 {
            return Err(DimensionParseError::Negative(text.to_string()));
        }

        Ok(Dimension {
            raw: text.to_string(),
            pixels: number * factor,
        })
    }
}

impl TryFrom<String> for Dimension {
    type Error = DimensionParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Dimension> for String {
    fn from(value: Dimension) -> Self {
        value.raw
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.raw)
    }
}
