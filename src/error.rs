use std::{io, path::PathBuf};

use image::ImageError;
use thiserror::Error;

// Error
//------------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum QRError {
    // Encoder
    #[error("Empty data")]
    EmptyData,
    #[error("Invalid box size: a module must be at least one pixel wide")]
    InvalidBoxSize,
    #[error("{0}")]
    Encoding(String),

    // Raster
    #[error("Image too large: {what} does not fit in memory")]
    ImageTooLarge { what: &'static str },

    // File sink
    #[error("Could not save {}: {}", path.display(), save_causes(first, source))]
    Save {
        path: PathBuf,
        /// Cause of the attempt with the inferred format, when the PNG retry was reached.
        first: Option<ImageError>,
        #[source]
        source: ImageError,
    },

    // Configuration
    #[error("Invalid config {}: {message}", path.display())]
    Config { path: PathBuf, message: String },
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),

    // Prompts
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type QRResult<T> = Result<T, QRError>;

fn save_causes(first: &Option<ImageError>, last: &ImageError) -> String {
    match first {
        Some(first) => format!("{first}; retry as PNG: {last}"),
        None => last.to_string(),
    }
}
