//! CSS color values used by the SVG exporter.

use std::{fmt, str::FromStr};

use color::DynamicColor;

/// A parsed CSS color.
#[derive(Clone, PartialEq, Debug)]
pub struct Color(DynamicColor);

impl Color {
    /// Parses CSS color strings such as "#ff0000", "rgb(255, 0, 0)" or "red".
    ///
    /// # Errors
    ///
    /// A message naming the rejected string.
    pub fn new(css: &str) -> Result<Self, String> {
        DynamicColor::from_str(css)
            .map(Self)
            .map_err(|err| format!("Invalid color '{css}': {err}"))
    }

    /// The color as a fragment usable inside an SVG id, for arrow markers
    /// that are defined once per stroke color.
    pub fn to_id_safe_string(&self) -> String {
        let sanitized: String = self
            .to_string()
            .chars()
            .map(|c| match c {
                '#' => 'h',
                c if c.is_ascii_alphanumeric() || c == '-' => c,
                _ => '_',
            })
            .collect();
        // Ids must not start with a digit.
        if sanitized.starts_with(|c: char| c.is_ascii_digit()) {
            format!("c{sanitized}")
        } else {
            sanitized
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_css_forms() {
        for css in ["black", "#1f2933", "rgb(10, 20, 30)", "hsl(120 50% 50%)"] {
            assert!(Color::new(css).is_ok(), "{css}");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        let err = Color::new("nope").unwrap_err();
        assert!(err.contains("'nope'"));
    }

    #[test]
    fn test_id_safe_string() {
        for css in ["#ff0000", "rgb(1, 2, 3)", "black"] {
            let id = Color::new(css).unwrap().to_id_safe_string();
            assert!(
                id.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-'),
                "{id}"
            );
            assert!(id.starts_with(|c: char| c.is_ascii_alphabetic()), "{id}");
        }
    }
}
