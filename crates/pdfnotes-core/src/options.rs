//! Ruling options
//!
//! Options can be built in code, loaded from a TOML file, or assembled from
//! free-text form input. Every field has a default, so an empty TOML file is
//! a valid configuration.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PdfNotesError, Result};

/// Default gap between ruled lines, in centimeters
pub const DEFAULT_LINE_SPACING_CM: f64 = 0.7;

/// Smallest accepted gap between ruled lines (1 mm), in centimeters
pub const MIN_LINE_SPACING_CM: f64 = 0.1;

/// Default suffix appended to the input file stem when no output is given
pub const DEFAULT_OUTPUT_SUFFIX: &str = " - notes";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotesOptions {
    /// Vertical gap between ruled lines (cm)
    pub line_spacing_cm: f64,
    /// Stroke gray level, 0.0 is black and 1.0 is white
    pub line_gray: f64,
    /// Stroke width (pt)
    pub line_width_pt: f64,
    /// Distance kept between ruled lines and the page edge (cm)
    pub inset_cm: f64,
    pub output_suffix: String,
}

impl Default for NotesOptions {
    fn default() -> Self {
        Self {
            line_spacing_cm: DEFAULT_LINE_SPACING_CM,
            line_gray: 0.7,
            line_width_pt: 0.5,
            inset_cm: 1.0,
            output_suffix: DEFAULT_OUTPUT_SUFFIX.to_string(),
        }
    }
}

impl NotesOptions {
    /// Load options from a TOML file
    ///
    /// ```no_run
    /// use pdfnotes_core::NotesOptions;
    ///
    /// let options = NotesOptions::from_file("pdfnotes.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PdfNotesError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        Self::from_str(&content)
    }

    /// Parse options from a TOML string
    ///
    /// ```
    /// use pdfnotes_core::NotesOptions;
    ///
    /// let options = NotesOptions::from_str("line_spacing_cm = 1.0").unwrap();
    /// assert_eq!(options.line_spacing_cm, 1.0);
    /// assert_eq!(options.line_gray, 0.7);
    /// ```
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let options: Self = toml::from_str(s).map_err(|e| PdfNotesError::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Replace the line spacing, keeping the other fields
    pub fn with_spacing(self, line_spacing_cm: f64) -> Self {
        Self {
            line_spacing_cm,
            ..self
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_spacing(self.line_spacing_cm)?;

        if !(self.line_width_pt.is_finite() && self.line_width_pt > 0.0) {
            return Err(PdfNotesError::InvalidOptions(format!(
                "line_width_pt must be positive, got {}",
                self.line_width_pt
            )));
        }
        if !(0.0..=1.0).contains(&self.line_gray) {
            return Err(PdfNotesError::InvalidOptions(format!(
                "line_gray must be between 0 and 1, got {}",
                self.line_gray
            )));
        }
        if !(self.inset_cm.is_finite() && self.inset_cm >= 0.0) {
            return Err(PdfNotesError::InvalidOptions(format!(
                "inset_cm must be zero or positive, got {}",
                self.inset_cm
            )));
        }
        Ok(())
    }
}

/// Parse the free-text spacing field, e.g. `"0.7"` or `" 1,5 "`
pub fn parse_spacing(input: &str) -> Result<f64> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(PdfNotesError::InvalidSpacing("No spacing given".into()));
    }

    // Accept a decimal comma
    let normalized = trimmed.replace(',', ".");
    let spacing: f64 = normalized
        .parse()
        .map_err(|_| PdfNotesError::InvalidSpacing(format!("Not a number: {}", trimmed)))?;

    validate_spacing(spacing)?;
    Ok(spacing)
}

fn validate_spacing(spacing: f64) -> Result<()> {
    if !spacing.is_finite() {
        return Err(PdfNotesError::InvalidSpacing(format!(
            "Spacing must be a finite number, got {}",
            spacing
        )));
    }
    if spacing <= 0.0 {
        return Err(PdfNotesError::InvalidSpacing(format!(
            "Spacing must be greater than zero, got {}",
            spacing
        )));
    }
    if spacing < MIN_LINE_SPACING_CM {
        return Err(PdfNotesError::InvalidSpacing(format!(
            "Spacing must be at least {} cm, got {}",
            MIN_LINE_SPACING_CM, spacing
        )));
    }
    Ok(())
}
