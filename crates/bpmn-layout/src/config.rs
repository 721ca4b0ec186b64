//! Configuration types for bpmn-layout.
//!
//! All types implement [`serde::Deserialize`] so the CLI can load them from
//! TOML. Every field has a default, so a partial file (or none at all) is
//! valid.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining layout and style settings.
//! - [`LayoutConfig`] - Pixel spacing used when converting the grid to coordinates.
//! - [`StyleConfig`] - Colors and font size for SVG output.
//! - [`AsciiConfig`] - Character set and scale for text output.
//!
//! # Example
//!
//! ```
//! # use bpmn_layout::config::AppConfig;
//! let config = AppConfig::default();
//! assert_eq!(config.layout().horizontal_gap(), 80.0);
//! assert!(config.style().background_color().unwrap().is_none());
//! ```

use serde::Deserialize;

use bpmn_layout_core::color::Color;

/// Top-level configuration combining layout and style settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section.
    #[serde(default)]
    layout: LayoutConfig,

    /// Style configuration section.
    #[serde(default)]
    style: StyleConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] with the specified layout and style configurations.
    pub fn new(layout: LayoutConfig, style: StyleConfig) -> Self {
        Self { layout, style }
    }

    /// Returns the layout configuration.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Returns the style configuration.
    pub fn style(&self) -> &StyleConfig {
        &self.style
    }
}

/// Spacing constants of the grid-to-pixel conversion.
///
/// A grid cell is as large as the largest element kind; gaps separate
/// neighbouring cells and `padding` surrounds the whole drawing.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    horizontal_gap: f32,
    vertical_gap: f32,
    padding: f32,
    lane_spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            horizontal_gap: 80.0,
            vertical_gap: 50.0,
            padding: 40.0,
            lane_spacing: 15.0,
        }
    }
}

impl LayoutConfig {
    /// Space between two columns.
    pub fn horizontal_gap(&self) -> f32 {
        self.horizontal_gap
    }

    /// Space between two rows.
    pub fn vertical_gap(&self) -> f32 {
        self.vertical_gap
    }

    /// Margin around the drawing.
    pub fn padding(&self) -> f32 {
        self.padding
    }

    /// Distance between stacked loop-back lanes.
    pub fn lane_spacing(&self) -> f32 {
        self.lane_spacing
    }

    pub fn with_horizontal_gap(mut self, gap: f32) -> Self {
        self.horizontal_gap = gap;
        self
    }

    pub fn with_vertical_gap(mut self, gap: f32) -> Self {
        self.vertical_gap = gap;
        self
    }

    pub fn with_padding(mut self, padding: f32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_lane_spacing(mut self, spacing: f32) -> Self {
        self.lane_spacing = spacing;
        self
    }
}

/// Visual styling of SVG output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    /// Background color as a CSS color string; transparent when unset.
    background_color: Option<String>,
    stroke_color: String,
    fill_color: String,
    font_size: u16,
    ascii: AsciiConfig,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: None,
            stroke_color: "black".to_string(),
            fill_color: "white".to_string(),
            font_size: 12,
            ascii: AsciiConfig::default(),
        }
    }
}

impl StyleConfig {
    /// Returns the parsed background [`Color`], or `None` if no color is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::new(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    /// Returns the parsed stroke [`Color`] used for outlines and flows.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn stroke_color(&self) -> Result<Color, String> {
        Color::new(&self.stroke_color)
            .map_err(|err| format!("Invalid stroke color in config: {err}"))
    }

    /// Returns the parsed fill [`Color`] of element shapes.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured color string cannot be parsed.
    pub fn fill_color(&self) -> Result<Color, String> {
        Color::new(&self.fill_color).map_err(|err| format!("Invalid fill color in config: {err}"))
    }

    pub fn font_size(&self) -> u16 {
        self.font_size
    }

    pub fn ascii(&self) -> &AsciiConfig {
        &self.ascii
    }

    pub fn with_background_color(mut self, color: impl Into<String>) -> Self {
        self.background_color = Some(color.into());
        self
    }

    pub fn with_stroke_color(mut self, color: impl Into<String>) -> Self {
        self.stroke_color = color.into();
        self
    }

    pub fn with_ascii(mut self, ascii: AsciiConfig) -> Self {
        self.ascii = ascii;
        self
    }
}

/// Character-grid output settings.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct AsciiConfig {
    /// Box-drawing characters when `true`, plain `+-|` otherwise.
    unicode: bool,
    /// Pixels per character column.
    scale_x: f32,
    /// Pixels per character row.
    scale_y: f32,
}

impl Default for AsciiConfig {
    fn default() -> Self {
        Self {
            unicode: true,
            scale_x: 10.0,
            scale_y: 20.0,
        }
    }
}

impl AsciiConfig {
    pub fn unicode(&self) -> bool {
        self.unicode
    }

    pub fn scale_x(&self) -> f32 {
        self.scale_x
    }

    pub fn scale_y(&self) -> f32 {
        self.scale_y
    }

    pub fn with_unicode(mut self, unicode: bool) -> Self {
        self.unicode = unicode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.layout().vertical_gap(), 50.0);
        assert_eq!(config.layout().padding(), 40.0);
        assert_eq!(config.layout().lane_spacing(), 15.0);
        assert_eq!(config.style().font_size(), 12);
        assert!(config.style().ascii().unicode());
        assert_eq!(config.style().ascii().scale_x(), 10.0);
        assert_eq!(config.style().ascii().scale_y(), 20.0);
    }

    #[test]
    fn test_colors() {
        let style = StyleConfig::default().with_background_color("#f0f0f0");

        assert!(style.background_color().unwrap().is_some());
        assert!(style.stroke_color().is_ok());
        assert!(style.fill_color().is_ok());

        let bad = StyleConfig::default().with_stroke_color("not-a-color");
        assert!(bad.stroke_color().unwrap_err().contains("stroke color"));
    }

    #[test]
    fn test_builders() {
        let layout = LayoutConfig::default()
            .with_horizontal_gap(10.0)
            .with_vertical_gap(20.0)
            .with_padding(5.0)
            .with_lane_spacing(3.0);

        assert_eq!(layout.horizontal_gap(), 10.0);
        assert_eq!(layout.vertical_gap(), 20.0);
        assert_eq!(layout.padding(), 5.0);
        assert_eq!(layout.lane_spacing(), 3.0);
    }
}
