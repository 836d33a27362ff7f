use std::fs::{File, OpenOptions};
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use nix::sys::termios::{self, SetArg, Termios};

use kplex_core::Senblk;
use kplex_framing::SeatalkFramer;
use kplex_topology::{Interface, Transport};

use crate::serial::{baud_to_nix, configure_seatalk, Baud};
use crate::READ_CHUNK;

/// A serial line carrying Raymarine Seatalk rather than NMEA 0183 text.
///
/// Seatalk commands are delimited by parity errors, so the line is opened
/// with `PARMRK` and SPACE parity instead of the plain-text raw mode
/// `SerialTransport` uses (§4.5). Input bytes pass through
/// [`SeatalkFramer`]; translated sentences come back out as ordinary NMEA
/// 0183 text and are framed with [`frame_sentence`] before being emitted.
/// This interface type is input-only: the original protocol is a Raymarine
/// instrument bus, not something `kplex` originates sentences onto.
pub struct SeatalkTransport {
    path: PathBuf,
    file: Mutex<File>,
    original: Termios,
    restored: AtomicBool,
}

impl SeatalkTransport {
    pub fn open(path: impl AsRef<Path>, baud: Baud) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&path)?;

        let original =
            termios::tcgetattr(&file).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        configure_seatalk(&file, baud_to_nix(baud))?;

        Ok(SeatalkTransport {
            path,
            file: Mutex::new(file),
            original,
            restored: AtomicBool::new(false),
        })
    }
}

impl Transport for SeatalkTransport {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        let mut framer = SeatalkFramer::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if iface.is_cancelled() {
                return Ok(());
            }
            let n = match file.read(&mut buf) {
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
            for &byte in &buf[..n] {
                if let Some(sentence) = framer.feed(byte) {
                    emit(Senblk::new(&sentence, iface.id));
                }
            }
        }
    }

    fn run_output(
        &self,
        _iface: &Interface,
        _next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "seatalk interfaces are input-only",
        ))
    }

    fn cleanup(&self) {
        if self.restored.swap(true, Ordering::SeqCst) {
            return;
        }
        let file = self.file.lock().unwrap();
        if let Err(e) = termios::tcsetattr(&*file, SetArg::TCSAFLUSH, &self.original) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to restore seatalk line");
        }
    }

    fn description(&self) -> String {
        format!("seatalk:{}", self.path.display())
    }
}
