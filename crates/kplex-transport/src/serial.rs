use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use nix::sys::termios::{self, BaudRate, SetArg, SpecialCharacterIndices, Termios};

use kplex_core::Senblk;
use kplex_framing::LineFramer;
use kplex_topology::{Direction, Interface, Transport};

use crate::READ_CHUNK;

/// The three baud rates the configuration grammar accepts (§6). AIS readers
/// commonly need `38400`; everything else defaults to `4800`, the NMEA 0183
/// line rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Baud {
    B4800,
    B9600,
    B38400,
}

impl Baud {
    fn to_nix(self) -> BaudRate {
        match self {
            Baud::B4800 => BaudRate::B4800,
            Baud::B9600 => BaudRate::B9600,
            Baud::B38400 => BaudRate::B38400,
        }
    }

    /// Parses the `baud=` option value; `None` for anything not in the
    /// three rates the grammar accepts.
    pub fn parse(s: &str) -> Option<Baud> {
        match s {
            "4800" => Some(Baud::B4800),
            "9600" => Some(Baud::B9600),
            "38400" => Some(Baud::B38400),
            _ => None,
        }
    }
}

impl Default for Baud {
    fn default() -> Self {
        Baud::B4800
    }
}

/// A real or virtual serial line carrying line-framed NMEA 0183 text.
///
/// When a configuration entry requests `direction=both`, the two resulting
/// [`Interface`]s share one `SerialTransport` rather than each duplicating
/// the file descriptor the way `init_serial`'s `ifdup` does: a single open
/// file already lets one thread read and another write concurrently, so
/// duplication buys nothing here. `paired` records that sharing so
/// `cleanup` can skip restoring the original terminal attributes exactly
/// once, matching `cleanup_serial`'s `if (!ifa->pair)` guard — restoring
/// twice (once per sibling thread racing to close) is what the guard exists
/// to avoid.
pub struct SerialTransport {
    path: PathBuf,
    reader: Mutex<File>,
    writer: Mutex<File>,
    original: Termios,
    paired: bool,
    restored: AtomicBool,
}

impl SerialTransport {
    pub fn open(path: impl AsRef<Path>, direction: Direction, baud: Baud) -> io::Result<Self> {
        Self::open_inner(path, direction, baud, false)
    }

    /// Opens one shared transport for a `both`-expanded pair.
    pub fn open_paired(path: impl AsRef<Path>, baud: Baud) -> io::Result<Self> {
        Self::open_inner(path, Direction::In, baud, true)
    }

    fn open_inner(
        path: impl AsRef<Path>,
        direction: Direction,
        baud: Baud,
        paired: bool,
    ) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let meta = std::fs::metadata(&path)?;
        if !is_char_device(&meta) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a character device", path.display()),
            ));
        }

        let read_flag = !matches!(direction, Direction::Out);
        let file = OpenOptions::new()
            .read(read_flag)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)?;

        let original =
            termios::tcgetattr(&file).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        configure_raw(&file, baud.to_nix(), read_flag, false)?;

        let writer = file.try_clone()?;
        Ok(SerialTransport {
            path,
            reader: Mutex::new(file),
            writer: Mutex::new(writer),
            original,
            paired,
            restored: AtomicBool::new(false),
        })
    }
}

impl Transport for SerialTransport {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        let mut reader = self.reader.lock().unwrap();
        let mut framer = LineFramer::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if iface.is_cancelled() {
                return Ok(());
            }
            let n = match reader.read(&mut buf) {
                Ok(n) => n,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                    if iface.is_cancelled() {
                        return Ok(());
                    }
                    continue;
                }
                Err(e) => return Err(e),
            };
            if n == 0 {
                return Ok(());
            }
            framer.feed_all(&buf[..n], |sentence| emit(Senblk::new(sentence, iface.id)));
        }
    }

    fn run_output(
        &self,
        iface: &Interface,
        next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        let mut writer = self.writer.lock().unwrap();
        while let Some(sentence) = next() {
            let mut remaining = sentence.as_bytes();
            while !remaining.is_empty() {
                match writer.write(remaining) {
                    Ok(0) => return Ok(()),
                    Ok(n) => remaining = &remaining[n..],
                    Err(ref e) if e.kind() == io::ErrorKind::Interrupted => {
                        if iface.is_cancelled() {
                            return Ok(());
                        }
                    }
                    Err(e) => return Err(e),
                }
            }
        }
        Ok(())
    }

    fn cleanup(&self) {
        if self.paired {
            return;
        }
        if self.restored.swap(true, Ordering::SeqCst) {
            return;
        }
        let reader = self.reader.lock().unwrap();
        if let Err(e) = termios::tcsetattr(&*reader, SetArg::TCSAFLUSH, &self.original) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to restore serial line");
        }
    }

    fn description(&self) -> String {
        format!("serial:{}", self.path.display())
    }
}

fn configure_raw(
    fd: &impl AsFd,
    baud: BaudRate,
    _cread: bool,
    seatalk_parmrk: bool,
) -> io::Result<()> {
    let mut t = termios::tcgetattr(fd).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    termios::cfmakeraw(&mut t);
    termios::cfsetispeed(&mut t, baud).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    termios::cfsetospeed(&mut t, baud).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    t.control_flags.insert(termios::ControlFlags::CLOCAL);
    t.control_flags.insert(termios::ControlFlags::CREAD);
    t.input_flags.insert(termios::InputFlags::IGNBRK);
    t.input_flags.insert(termios::InputFlags::INPCK);
    if seatalk_parmrk {
        t.input_flags.insert(termios::InputFlags::PARMRK);
    }
    t.control_chars[SpecialCharacterIndices::VMIN as usize] = 1;
    t.control_chars[SpecialCharacterIndices::VTIME as usize] = 0;
    termios::tcflush(fd, termios::FlushArg::TCIOFLUSH)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
    termios::tcsetattr(fd, SetArg::TCSAFLUSH, &t).map_err(|e| io::Error::new(io::ErrorKind::Other, e))
}

/// Exposed so `seatalk.rs` can reuse the same raw-mode setup with SPACE
/// parity enabled instead of this module's default.
pub(crate) fn configure_seatalk(fd: &impl AsFd, baud: BaudRate) -> io::Result<()> {
    configure_raw(fd, baud, true, true)
}

/// Exposed so `pty.rs` can configure a slave-mode pty identically to a real
/// serial line.
pub(crate) fn configure_plain(fd: &impl AsFd, baud: BaudRate) -> io::Result<()> {
    configure_raw(fd, baud, true, false)
}

pub(crate) fn baud_to_nix(baud: Baud) -> BaudRate {
    baud.to_nix()
}

fn is_char_device(meta: &std::fs::Metadata) -> bool {
    use std::os::unix::fs::FileTypeExt;
    meta.file_type().is_char_device()
}
