use std::{
    fs,
    path::{Path, PathBuf},
};

use image::{ImageError, ImageFormat, ImageResult, RgbImage};
use tracing::{info, warn};

use crate::error::{QRError, QRResult};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum OutputFormat {
    Png,
    Jpeg,
    Bmp,
    Gif,
    WebP,
}

impl OutputFormat {
    /// Recognizes `png jpg jpeg bmp gif webp`, in any letter case.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "gif" => Some(Self::Gif),
            "webp" => Some(Self::WebP),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
            Self::Gif => ImageFormat::Gif,
            Self::WebP => ImageFormat::WebP,
        }
    }
}

/// Where the final image goes. The path always ends in a recognized image extension.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OutputTarget {
    path: PathBuf,
    format: OutputFormat,
}

impl OutputTarget {
    /// Keeps a recognized extension as typed, otherwise appends or replaces it with `.png`.
    pub fn normalize(filename: impl AsRef<Path>) -> Self {
        let filename = filename.as_ref();
        let format = filename.extension().and_then(|e| e.to_str()).and_then(OutputFormat::from_extension);
        match format {
            Some(format) => Self { path: filename.to_path_buf(), format },
            None => Self { path: filename.with_extension("png"), format: OutputFormat::Png },
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }
}

// Writer
//------------------------------------------------------------------------------

pub trait ImageWriter {
    /// Writes `image` to `path`, inferring the format from the extension when `format` is
    /// `None`.
    fn write(&self, image: &RgbImage, path: &Path, format: Option<ImageFormat>) -> ImageResult<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct DiskWriter;

impl ImageWriter for DiskWriter {
    fn write(&self, image: &RgbImage, path: &Path, format: Option<ImageFormat>) -> ImageResult<()> {
        match format {
            Some(format) => image.save_with_format(path, format),
            None => image.save(path),
        }
    }
}

impl<W: ImageWriter + ?Sized> ImageWriter for &W {
    fn write(&self, image: &RgbImage, path: &Path, format: Option<ImageFormat>) -> ImageResult<()> {
        (**self).write(image, path, format)
    }
}

// Sink
//------------------------------------------------------------------------------

#[derive(Debug, Default, Clone, Copy)]
pub struct FileSink<W = DiskWriter> {
    writer: W,
}

impl<W: ImageWriter> FileSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Saves with the format implied by the extension, then retries once as PNG at the same
    /// path. The retry can leave PNG data behind a non-PNG extension.
    pub fn save(&self, image: &RgbImage, target: &OutputTarget) -> QRResult<PathBuf> {
        let path = target.path();
        let fail = |first: Option<ImageError>, source: ImageError| QRError::Save {
            path: path.to_path_buf(),
            first,
            source,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| fail(None, ImageError::IoError(e)))?;
        }

        if let Err(first) = self.writer.write(image, path, None) {
            warn!("Saving {} as {:?} failed: {first}. Retrying as PNG", path.display(), target.format());
            if let Err(source) = self.writer.write(image, path, Some(ImageFormat::Png)) {
                return Err(fail(Some(first), source));
            }
        }

        info!("Wrote {}x{} image to {}", image.width(), image.height(), path.display());
        Ok(path.to_path_buf())
    }
}

#[cfg(test)]
mod sink_tests {
    use std::{
        cell::RefCell,
        io,
        path::{Path, PathBuf},
    };

    use image::{ImageError, ImageFormat, ImageResult, Rgb, RgbImage};
    use test_case::test_case;

    use super::{DiskWriter, FileSink, ImageWriter, OutputFormat, OutputTarget};
    use crate::error::QRError;

    #[test_case("out", "out.png", OutputFormat::Png)]
    #[test_case("out.png", "out.png", OutputFormat::Png)]
    #[test_case("out.JPG", "out.JPG", OutputFormat::Jpeg)]
    #[test_case("out.jpeg", "out.jpeg", OutputFormat::Jpeg)]
    #[test_case("out.Bmp", "out.Bmp", OutputFormat::Bmp)]
    #[test_case("out.gif", "out.gif", OutputFormat::Gif)]
    #[test_case("out.webp", "out.webp", OutputFormat::WebP)]
    #[test_case("out.txt", "out.png", OutputFormat::Png)]
    #[test_case("my.qr.code", "my.qr.png", OutputFormat::Png)]
    #[test_case("dir/sub/ticket", "dir/sub/ticket.png", OutputFormat::Png)]
    fn test_normalize(input: &str, path: &str, format: OutputFormat) {
        let target = OutputTarget::normalize(input);
        assert_eq!(target.path(), Path::new(path));
        assert_eq!(target.format(), format);
    }

    /// Records every write and fails the first `failures` of them.
    struct FlakyWriter {
        failures: usize,
        calls: RefCell<Vec<(PathBuf, Option<ImageFormat>)>>,
    }

    impl FlakyWriter {
        fn new(failures: usize) -> Self {
            Self { failures, calls: RefCell::new(Vec::new()) }
        }
    }

    impl ImageWriter for FlakyWriter {
        fn write(&self, _: &RgbImage, path: &Path, format: Option<ImageFormat>) -> ImageResult<()> {
            let mut calls = self.calls.borrow_mut();
            calls.push((path.to_path_buf(), format));
            if calls.len() <= self.failures {
                let reason = format!("denied on attempt {}", calls.len());
                Err(ImageError::IoError(io::Error::new(io::ErrorKind::PermissionDenied, reason)))
            } else {
                Ok(())
            }
        }
    }

    fn image() -> RgbImage {
        RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]))
    }

    #[test]
    fn test_save_first_attempt() {
        let writer = FlakyWriter::new(0);
        let target = OutputTarget::normalize("qr.jpg");
        let saved = FileSink::new(&writer).save(&image(), &target).unwrap();

        assert_eq!(saved, PathBuf::from("qr.jpg"));
        assert_eq!(*writer.calls.borrow(), vec![(PathBuf::from("qr.jpg"), None)]);
    }

    #[test]
    fn test_save_falls_back_to_png() {
        let writer = FlakyWriter::new(1);
        let target = OutputTarget::normalize("qr.webp");
        let saved = FileSink::new(&writer).save(&image(), &target).unwrap();

        assert_eq!(saved, PathBuf::from("qr.webp"));
        assert_eq!(
            *writer.calls.borrow(),
            vec![(PathBuf::from("qr.webp"), None), (PathBuf::from("qr.webp"), Some(ImageFormat::Png))]
        );
    }

    #[test]
    fn test_save_fails_after_fallback() {
        let writer = FlakyWriter::new(2);
        let target = OutputTarget::normalize("qr.bmp");
        let err = FileSink::new(&writer).save(&image(), &target).unwrap_err();

        assert!(matches!(err, QRError::Save { ref path, first: Some(_), .. } if path == Path::new("qr.bmp")));
        assert_eq!(writer.calls.borrow().len(), 2);
        assert_eq!(writer.calls.borrow()[1].1, Some(ImageFormat::Png));

        // Both causes are reported.
        let message = err.to_string();
        assert!(message.contains("denied on attempt 1"), "{message}");
        assert!(message.contains("denied on attempt 2"), "{message}");
    }

    #[test_case("qr", ImageFormat::Png)]
    #[test_case("qr.JPG", ImageFormat::Jpeg)]
    #[test_case("qr.bmp", ImageFormat::Bmp)]
    #[test_case("nested/dir/qr.gif", ImageFormat::Gif)]
    fn test_save_to_disk(name: &str, format: ImageFormat) {
        let dir = tempfile::tempdir().unwrap();
        let target = OutputTarget::normalize(dir.path().join(name));
        let saved = FileSink::new(DiskWriter).save(&image(), &target).unwrap();

        let bytes = std::fs::read(&saved).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), format);
        let reloaded = image::load_from_memory(&bytes).unwrap();
        assert_eq!((reloaded.width(), reloaded.height()), (8, 8));
    }

    #[test]
    fn test_save_into_file_parent_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let target = OutputTarget::normalize(blocker.join("qr.png"));
        let err = FileSink::new(DiskWriter).save(&image(), &target).unwrap_err();
        assert!(matches!(err, QRError::Save { first: None, .. }));
    }
}
