use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use kplex_core::Senblk;
use kplex_framing::LineFramer;
use kplex_topology::{Direction, Interface, Transport};

use crate::READ_CHUNK;

/// A plain file used for replay (`direction=in`, read once to EOF) or
/// capture (`direction=out`, appended to). This is `kplex.c`'s treatment of
/// `FILEIO` as just another transport behind the common read/write/cleanup
/// triple, not a special case in the engine.
pub struct FileTransport {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileTransport {
    pub fn new(path: impl Into<PathBuf>, direction: Direction) -> io::Result<Self> {
        let path = path.into();
        let file = match direction {
            Direction::In => OpenOptions::new().read(true).open(&path)?,
            Direction::Out => OpenOptions::new().create(true).append(true).open(&path)?,
        };
        Ok(FileTransport {
            path,
            file: Mutex::new(file),
        })
    }
}

impl Transport for FileTransport {
    fn run_input(&self, iface: &Interface, emit: &mut dyn FnMut(Senblk)) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        let mut framer = LineFramer::new();
        let mut buf = [0u8; READ_CHUNK];

        loop {
            if iface.is_cancelled() {
                return Ok(());
            }
            let n = file.read(&mut buf)?;
            if n == 0 {
                return Ok(());
            }
            framer.feed_all(&buf[..n], |sentence| emit(Senblk::new(sentence, iface.id)));
        }
    }

    fn run_output(
        &self,
        _iface: &Interface,
        next: &mut dyn FnMut() -> Option<Senblk>,
    ) -> io::Result<()> {
        let mut file = self.file.lock().unwrap();
        while let Some(sentence) = next() {
            file.write_all(sentence.as_bytes())?;
        }
        Ok(())
    }

    fn cleanup(&self) {}

    fn description(&self) -> String {
        format!("file:{}", self.path.display())
    }
}
