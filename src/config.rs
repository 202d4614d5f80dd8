//! Run configuration.
//!
//! Every tunable of the pipeline (module size, quiet zone, colours, caption font size and
//! padding, the font search list, the default output file) lives in [`Config`] and is passed
//! explicitly to the component that needs it.
//!
//! The configuration is read from a TOML file. [`Config::load`] looks at the
//! `QRCAPTION_CONFIG` environment variable first, then at `qrcaption/config.toml` inside the
//! platform config directory, and falls back to [`Config::default`] when neither exists.
//!
//! ```toml
//! [qr]
//! box_size = 8
//! fill_color = "#1a1a1a"
//!
//! [caption]
//! font_size = 20
//! font_paths = ["/usr/share/fonts/TTF/Inter-Bold.ttf"]
//!
//! [output]
//! default_filename = "ticket.png"
//! open_after_save = false
//! ```

use std::{
    env, fmt, fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use image::Rgb;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{QRError, QRResult};

pub const CONFIG_ENV_VAR: &str = "QRCAPTION_CONFIG";
const APP_DIR: &str = "qrcaption";
const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_OUTPUT_FILE: &str = "qrcode_with_caption.png";
pub const DEFAULT_FONT_SIZE: u32 = 16;

// Config
//------------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub qr: QrConfig,
    pub caption: CaptionConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QrConfig {
    /// Pixel size of a single module.
    pub box_size: u32,
    /// Quiet zone width, in modules.
    pub border: u32,
    pub fill_color: Color,
    pub back_color: Color,
}

impl Default for QrConfig {
    fn default() -> Self {
        Self { box_size: 10, border: 4, fill_color: Color::BLACK, back_color: Color::WHITE }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptionConfig {
    /// Pixel height requested from scalable fonts. The built-in font ignores it.
    pub font_size: u32,
    pub padding: u32,
    pub background: Color,
    pub text_color: Color,
    /// Font files tried in order before falling back to the built-in glyphs.
    pub font_paths: Vec<PathBuf>,
}

impl Default for CaptionConfig {
    fn default() -> Self {
        Self {
            font_size: DEFAULT_FONT_SIZE,
            padding: 10,
            background: Color::WHITE,
            text_color: Color::BLACK,
            font_paths: default_font_paths(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_filename: String,
    pub open_after_save: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { default_filename: DEFAULT_OUTPUT_FILE.to_string(), open_after_save: true }
    }
}

pub fn default_font_paths() -> Vec<PathBuf> {
    [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/Library/Fonts/Arial.ttf",
        "C:\\Windows\\Fonts\\arial.ttf",
    ]
    .iter()
    .map(PathBuf::from)
    .collect()
}

impl Config {
    /// Loads the configuration for this run.
    ///
    /// A file named by `QRCAPTION_CONFIG` must exist and parse. The per-user file is
    /// optional, and a broken one is reported and replaced by the defaults.
    pub fn load() -> QRResult<Self> {
        if let Some(path) = env::var_os(CONFIG_ENV_VAR) {
            return Self::load_from_path(Path::new(&path));
        }

        match default_config_path() {
            Some(path) if path.exists() => Ok(Self::load_from_path(&path).unwrap_or_else(|err| {
                warn!("{err}. Using defaults");
                Self::default()
            })),
            _ => {
                debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn load_from_path(path: &Path) -> QRResult<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| QRError::Config { path: path.to_path_buf(), message: e.to_string() })?;
        let config = Self::from_toml(&contents)
            .map_err(|message| QRError::Config { path: path.to_path_buf(), message })?;
        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str(contents).map_err(|e| e.message().to_string())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_DIR);
        path.push(CONFIG_FILE);
        path
    })
}

// Color
//------------------------------------------------------------------------------

/// An opaque RGB colour, written in config files as a name or as `#rgb` / `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub [u8; 3]);

impl Color {
    pub const BLACK: Self = Self([0, 0, 0]);
    pub const WHITE: Self = Self([255, 255, 255]);

    pub fn rgb(self) -> Rgb<u8> {
        Rgb(self.0)
    }

    fn named(name: &str) -> Option<Self> {
        let rgb = match name {
            "black" => [0, 0, 0],
            "white" => [255, 255, 255],
            "red" => [255, 0, 0],
            "green" => [0, 128, 0],
            "lime" => [0, 255, 0],
            "blue" => [0, 0, 255],
            "navy" => [0, 0, 128],
            "yellow" => [255, 255, 0],
            "orange" => [255, 165, 0],
            "purple" => [128, 0, 128],
            "cyan" => [0, 255, 255],
            "magenta" => [255, 0, 255],
            "gray" | "grey" => [128, 128, 128],
            _ => return None,
        };
        Some(Self(rgb))
    }

    fn hex(digits: &str) -> Option<Self> {
        if !digits.is_ascii() {
            return None;
        }
        let channel = |s: &str| u8::from_str_radix(s, 16).ok();
        match digits.len() {
            3 => {
                let mut rgb = [0; 3];
                for (i, c) in digits.chars().enumerate() {
                    let v = c.to_digit(16)? as u8;
                    rgb[i] = v << 4 | v;
                }
                Some(Self(rgb))
            }
            6 => Some(Self([channel(&digits[0..2])?, channel(&digits[2..4])?, channel(&digits[4..6])?])),
            _ => None,
        }
    }
}

impl FromStr for Color {
    type Err = QRError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let parsed = match s.strip_prefix('#') {
            Some(digits) => Self::hex(digits),
            None => Self::named(&s.to_ascii_lowercase()),
        };
        parsed.ok_or_else(|| QRError::InvalidColor(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = QRError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let [r, g, b] = self.0;
        write!(f, "#{r:02x}{g:02x}{b:02x}")
    }
}
