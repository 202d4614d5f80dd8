//! Interactive driver.
//!
//! Prompts for the text, the output filename and an optional caption, then runs the pipeline:
//! encode, caption, save, open. Every stage reports to the output stream, and the outcome is
//! summarized as an [`ExitStatus`].

use std::{
    borrow::Cow,
    io::{BufRead, Write},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use tracing::{info, warn};

use crate::{
    caption::{CaptionComposer, CaptionSpec},
    config::Config,
    encode::{EncodeRequest, QrEncoder},
    error::QRResult,
    font::FontResolver,
    opener::{open_with, Launcher, SystemLauncher},
    sink::{DiskWriter, FileSink, OutputTarget},
};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ExitStatus {
    Success,
    /// Input ended before every prompt was answered.
    Cancelled,
    Failure,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        match self {
            Self::Success | Self::Cancelled => 0,
            Self::Failure => 1,
        }
    }
}

pub struct Cli<R, W, L = SystemLauncher> {
    config: Config,
    input: R,
    output: W,
    launcher: L,
    prompting: Arc<AtomicBool>,
}

impl<R: BufRead, W: Write> Cli<R, W> {
    pub fn new(config: Config, input: R, output: W) -> Self {
        Self { config, input, output, launcher: SystemLauncher, prompting: Arc::default() }
    }
}

impl<R: BufRead, W: Write, L: Launcher> Cli<R, W, L> {
    pub fn with_launcher<M: Launcher>(self, launcher: M) -> Cli<R, W, M> {
        let Self { config, input, output, prompting, .. } = self;
        Cli { config, input, output, launcher, prompting }
    }

    /// Set while the driver is blocked on a prompt, so a signal handler can tell a
    /// cancellation from an interruption of the pipeline.
    pub fn prompting_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.prompting)
    }

    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn run(&mut self) -> ExitStatus {
        match self.try_run() {
            Ok(status) => status,
            Err(e) => {
                warn!("Terminal I/O failed: {e}");
                // The output stream may be what failed.
                let _ = writeln!(self.output, "\nInput failed: {e}");
                ExitStatus::Failure
            }
        }
    }

    fn try_run(&mut self) -> QRResult<ExitStatus> {
        writeln!(self.output, "qrcaption {}: QR codes with captions", env!("CARGO_PKG_VERSION"))?;

        let Some(text) = self.prompt("Text or URL (example: https://example.com): ")? else {
            return self.cancelled();
        };
        if text.is_empty() {
            writeln!(self.output, "No text. Bye.")?;
            return Ok(ExitStatus::Failure);
        }

        let default_file = self.config.output.default_filename.clone();
        let Some(filename) = self.prompt(&format!("Output filename (default: {default_file}): "))? else {
            return self.cancelled();
        };
        let filename = if filename.is_empty() { default_file } else { filename };

        let Some(caption) = self.prompt("Caption (press Enter to skip): ")? else {
            return self.cancelled();
        };
        let caption = Some(caption).filter(|c| !c.is_empty());

        writeln!(self.output, "Generating QR code...")?;
        let qr = match QrEncoder.encode(&EncodeRequest::new(&text, &self.config.qr)) {
            Ok(qr) => qr,
            Err(e) => {
                writeln!(self.output, "QR failed: {e}")?;
                return Ok(ExitStatus::Failure);
            }
        };

        let spec = CaptionSpec::new(caption, &self.config.caption);
        let img = if spec.text.is_some() {
            writeln!(self.output, "Adding caption...")?;
            let caption_cfg = &self.config.caption;
            let font = FontResolver::new(caption_cfg.font_paths.clone()).resolve(caption_cfg.font_size);
            match CaptionComposer::new(&font).compose(&qr, &spec) {
                Ok(img) => img,
                Err(e) => {
                    writeln!(self.output, "Caption failed: {e}")?;
                    return Ok(ExitStatus::Failure);
                }
            }
        } else {
            Cow::Borrowed(&qr)
        };

        let target = OutputTarget::normalize(&filename);
        let saved = match FileSink::new(DiskWriter).save(&img, &target) {
            Ok(path) => path,
            Err(e) => {
                writeln!(self.output, "Save failed: {e}")?;
                return Ok(ExitStatus::Failure);
            }
        };
        writeln!(self.output, "Saved to: {}", saved.display())?;

        if self.config.output.open_after_save {
            let absolute = saved.canonicalize().unwrap_or(saved);
            info!("Opening {}", absolute.display());
            open_with(&self.launcher, &absolute);
        }

        Ok(ExitStatus::Success)
    }

    /// Reads one trimmed line, or `None` at end of input.
    fn prompt(&mut self, message: &str) -> QRResult<Option<String>> {
        write!(self.output, "{message}")?;
        self.output.flush()?;

        self.prompting.store(true, Ordering::SeqCst);
        let mut line = String::new();
        let read = self.input.read_line(&mut line);
        self.prompting.store(false, Ordering::SeqCst);

        match read {
            Ok(0) => Ok(None),
            Ok(_) => Ok(Some(line.trim().to_string())),
            Err(e) => Err(e.into()),
        }
    }

    fn cancelled(&mut self) -> QRResult<ExitStatus> {
        writeln!(self.output, "\nCancelled.")?;
        Ok(ExitStatus::Cancelled)
    }
}
