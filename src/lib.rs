//! # qrcaption
//!
//! Turns a piece of text into a QR code image with an optional caption underneath, and saves
//! it to disk.
//!
//! ## Pipeline
//!
//! - [`encode`]: encodes the text at error correction level M in the smallest version that
//!   fits, and rasterizes it with a configurable module size, quiet zone and colours
//! - [`caption`]: grows the canvas to fit a measured caption and centers both elements
//! - [`sink`]: normalizes the output extension and saves, retrying as PNG if needed
//! - [`opener`]: asks the OS to show the result, ignoring any failure
//!
//! [`font`] and [`measure`] resolve the caption font once per run and measure text with it,
//! [`config`] holds every tunable, and [`cli`] drives the interactive prompts.
//!
//! ## Example
//!
//! ```rust,no_run
//! use qrcaption::{
//!     caption::{CaptionComposer, CaptionSpec},
//!     config::Config,
//!     encode::{EncodeRequest, QrEncoder},
//!     font::FontResolver,
//!     sink::{DiskWriter, FileSink, OutputTarget},
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::default();
//! let qr = QrEncoder.encode(&EncodeRequest::new("https://example.com", &config.qr))?;
//!
//! let font = FontResolver::new(config.caption.font_paths.clone()).resolve(config.caption.font_size);
//! let spec = CaptionSpec::new(Some("Scan me".to_string()), &config.caption);
//! let img = CaptionComposer::new(&font).compose(&qr, &spec)?;
//!
//! let saved = FileSink::new(DiskWriter).save(&img, &OutputTarget::normalize("ticket"))?;
//! println!("Saved to: {}", saved.display());
//! # Ok(())
//! # }
//! ```

pub mod caption;
pub mod cli;
pub mod config;
pub mod encode;
pub mod error;
pub mod font;
pub mod measure;
pub mod opener;
pub mod sink;

pub use caption::{CaptionComposer, CaptionLayout, CaptionSpec};
pub use config::{Color, Config};
pub use encode::{EncodeRequest, QrEncoder};
pub use error::{QRError, QRResult};
pub use font::{CaptionFont, FontResolver};
pub use measure::{MeasureStrategy, TextMeasurer};
pub use sink::{FileSink, OutputFormat, OutputTarget};
