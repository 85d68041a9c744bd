use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PdfNotesError {
    #[error("Failed to open source PDF {path}: {reason}")]
    SourceOpen { path: PathBuf, reason: String },

    #[error("Failed to write output PDF {path}: {source}")]
    DestinationWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid line spacing: {0}")]
    InvalidSpacing(String),

    #[error("Invalid options: {0}")]
    InvalidOptions(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("PDF operation failed: {0}")]
    Pdf(String),
}

impl From<lopdf::Error> for PdfNotesError {
    fn from(e: lopdf::Error) -> Self {
        PdfNotesError::Pdf(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PdfNotesError>;
