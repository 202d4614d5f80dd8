use std::{
    ffi::OsString,
    io,
    path::Path,
    process::{Command, Stdio},
};

use tracing::debug;

pub trait Launcher {
    /// Starts `program` without waiting for it to exit.
    fn launch(&self, program: &str, args: &[OsString]) -> io::Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl Launcher for SystemLauncher {
    fn launch(&self, program: &str, args: &[OsString]) -> io::Result<()> {
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(&self, program: &str, args: &[OsString]) -> io::Result<()> {
        (**self).launch(program, args)
    }
}

/// The host's "open with the default application" command for `path`.
pub fn open_command(path: &Path) -> (&'static str, Vec<OsString>) {
    if cfg!(target_os = "macos") {
        ("open", vec![path.into()])
    } else if cfg!(windows) {
        ("cmd", vec!["/C".into(), "start".into(), "".into(), path.into()])
    } else {
        ("xdg-open", vec![path.into()])
    }
}

/// Asks the OS to show `path`. Every failure is ignored.
pub fn open_best_effort(path: &Path) {
    open_with(&SystemLauncher, path)
}

pub fn open_with<L: Launcher>(launcher: &L, path: &Path) {
    let (program, args) = open_command(path);
    match launcher.launch(program, &args) {
        Ok(()) => debug!("Launched {program} for {}", path.display()),
        Err(e) => debug!("Could not open {} with {program}: {e}", path.display()),
    }
}

#[cfg(test)]
mod opener_tests {
    use std::{cell::RefCell, ffi::OsString, io, path::Path};

    use super::{open_command, open_with, Launcher};

    #[derive(Default)]
    struct Recorder {
        fail: bool,
        launched: RefCell<Vec<(String, Vec<OsString>)>>,
    }

    impl Launcher for Recorder {
        fn launch(&self, program: &str, args: &[OsString]) -> io::Result<()> {
            self.launched.borrow_mut().push((program.to_string(), args.to_vec()));
            if self.fail {
                Err(io::Error::new(io::ErrorKind::NotFound, "no opener"))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_open_command_ends_with_path() {
        let path = Path::new("/tmp/qr code.png");
        let (program, args) = open_command(path);
        assert!(!program.is_empty());
        assert_eq!(args.last().unwrap(), path.as_os_str());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_open_command_linux() {
        let (program, args) = open_command(Path::new("/tmp/qr.png"));
        assert_eq!(program, "xdg-open");
        assert_eq!(args, vec![OsString::from("/tmp/qr.png")]);
    }

    #[test]
    fn test_open_with_launches_once() {
        let recorder = Recorder::default();
        open_with(&recorder, Path::new("/tmp/qr.png"));
        assert_eq!(recorder.launched.borrow().len(), 1);
    }

    #[test]
    fn test_open_failure_is_swallowed() {
        let recorder = Recorder { fail: true, ..Default::default() };
        open_with(&recorder, Path::new("/tmp/qr.png"));
        open_with(&recorder, Path::new("/tmp/qr.png"));
        assert_eq!(recorder.launched.borrow().len(), 2);
    }
}
