use std::fs::File;
use std::io::{self, Read, Write};
use std::os::unix::io::{AsFd, AsRawFd};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use nix::pty::openpty;
use nix::unistd;

use kplex_core::Senblk;
use kplex_framing::LineFramer;
use kplex_topology::{Interface, Transport};

use crate::serial::{baud_to_nix, configure_plain, Baud};
use crate::READ_CHUNK;

/// `mode=master|slave` as named in the configuration grammar (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtyMode {
    /// Allocate a fresh pty pair and speak from the master side; if
    /// `filename` is given, symlink it to the allocated slave's device node
    /// the way `init_pty` does, so another program can open the slave.
    Master,
    /// Open an existing pty slave device directly; equivalent to a serial
    /// line from this process's point of view.
    Slave,
}

pub struct PtyTransport {
    label: String,
    file: Mutex<File>,
}

impl PtyTransport {
    pub fn open(mode: PtyMode, filename: Option<&Path>, baud: Baud) -> io::Result<Self> {
        match mode {
            PtyMode::Master => Self::open_master(filename, baud),
            PtyMode::Slave => Self::open_slave(
                filename.ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        "slave mode pty requires a filename",
                    )
                })?,
                baud,
            ),
        }
    }

    fn open_master(filename: Option<&Path>, baud: Baud) -> io::Result<Self> {
        let pty = openpty(None, None).map_err(|e| io::Error::new(io::ErrorKind::Other, e))?;
        configure_plain(&pty.master, baud_to_nix(baud))?;

        let slave_name = slave_device_name(&pty.slave)
            .unwrap_or_else(|| format!("fd {}", pty.slave.as_raw_fd()));

        if let Some(link) = filename {
            relink(link, &slave_name)?;
        }

        // The slave fd is only needed to let the kernel keep the pty open
        // and to discover its device name; we never read or write it.
        drop(pty.slave);

        let file = File::from(pty.master);

        Ok(PtyTransport {
            label: format!("pty:master:{}", slave_name),
            file: Mutex::new(file),
        })
    }

    fn open_slave(filename: &Path, baud: Baud) -> io::Result<Self> {
        let file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .open(filename)?;
        configure_plain(&file, baud_to_nix(baud))?;
        Ok(PtyTransport {
            label: format!("pty:slave:{}", filename.display()),
            file: Mutex::new(file),
        })
    }
}

fn slave_device_name(slave: &impl AsFd) -> Option<String> {
    unistd::ttyname(slave)
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}

fn relink(link: &Path, target: &str) -> io::Result<()> {
    match std::fs::symlink_metadata(link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            std::fs::remove_file(link)?;
        }
        Ok(_) => {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{}: file exists and is not a symbolic link", link.display()),
            ));
        }
        Err(_) => {}
    }
    #[cfg(unix)]
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

impl Transport for PtyTransport {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        let mut framer = LineFramer::new();
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
            framer.feed_all(&buf[..n], |sentence| emit(Senblk::new(sentence, iface.id)));
        }
    }

    fn run_output(
        &self,
        iface: &Interface,
        next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        while let Some(sentence) = next() {
            let mut remaining = sentence.as_bytes();
            while !remaining.is_empty() {
                match file.write(remaining) {
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

    fn cleanup(&self) {}

    fn description(&self) -> String {
        self.label.clone()
    }
}
