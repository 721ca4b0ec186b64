//! Input and output format selectors.

use std::{fmt, str::FromStr};

use thiserror::Error;

/// A format name that is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown format `{0}`")]
pub struct UnknownFormatError(pub String);

/// Source format of a process description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum InputFormat {
    /// One BPMN 2.0 XML document.
    #[default]
    Bpmn,
    /// A node file and an edge file.
    Csv,
}

impl InputFormat {
    /// Number of input files the format reads.
    pub fn file_count(self) -> usize {
        match self {
            Self::Bpmn => 1,
            Self::Csv => 2,
        }
    }
}

impl FromStr for InputFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bpmn" => Ok(Self::Bpmn),
            "csv" => Ok(Self::Csv),
            _ => Err(UnknownFormatError(s.to_string())),
        }
    }
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bpmn => write!(f, "BPMN"),
            Self::Csv => write!(f, "CSV"),
        }
    }
}

/// Output format of a rendered layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExportFormat {
    /// BPMN XML with a diagram-interchange section.
    #[default]
    Bpmn,
    Svg,
    /// Character-grid drawing.
    Ascii,
}

impl FromStr for ExportFormat {
    type Err = UnknownFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bpmn" => Ok(Self::Bpmn),
            "svg" => Ok(Self::Svg),
            "ascii" => Ok(Self::Ascii),
            _ => Err(UnknownFormatError(s.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bpmn => write!(f, "BPMN"),
            Self::Svg => write!(f, "SVG"),
            Self::Ascii => write!(f, "ASCII"),
        }
    }
}

/// Source text handed to [`crate::AutoLayout::generate`].
#[derive(Debug, Clone, Copy)]
pub enum Input<'a> {
    Bpmn(&'a str),
    Csv { nodes: &'a str, edges: &'a str },
}

impl Input<'_> {
    pub fn format(&self) -> InputFormat {
        match self {
            Self::Bpmn(_) => InputFormat::Bpmn,
            Self::Csv { .. } => InputFormat::Csv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("bpmn".parse::<InputFormat>(), Ok(InputFormat::Bpmn));
        assert_eq!("Csv".parse::<InputFormat>(), Ok(InputFormat::Csv));
        assert_eq!("SVG".parse::<ExportFormat>(), Ok(ExportFormat::Svg));
        assert_eq!("ascii".parse::<ExportFormat>(), Ok(ExportFormat::Ascii));
    }

    #[test]
    fn test_unknown_format() {
        let err = "png".parse::<ExportFormat>().unwrap_err();
        assert_eq!(err.to_string(), "unknown format `png`");
        assert!("svg".parse::<InputFormat>().is_err());
    }

    #[test]
    fn test_display_round_trips() {
        for format in [ExportFormat::Bpmn, ExportFormat::Svg, ExportFormat::Ascii] {
            assert_eq!(format.to_string().parse::<ExportFormat>(), Ok(format));
        }
        assert_eq!(InputFormat::Csv.to_string(), "CSV");
        assert_eq!(InputFormat::Csv.file_count(), 2);
    }
}
