use kplex_core::SENMAX;

/// A completed, length-bounded sentence record handed back by [`LineFramer`].
#[derive(Debug, Clone, Copy)]
pub struct Record {
    buf: [u8; SENMAX],
    len: usize,
}

impl Record {
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Splits a raw byte stream on `CR LF` into fixed-capacity sentence
/// records, dropping any record that exceeds `SENMAX` bytes.
///
/// One `LineFramer` holds all the state needed across calls to `feed`: the
/// accumulating buffer, its cursor, whether the previous byte was a `CR`,
/// and whether the in-progress record has already overrun `SENMAX`. This
/// mirrors the original `read_serial` loop's locals (`count`, `cr`,
/// `overrun`), just promoted from stack variables re-initialized per
/// `read()` call into fields that persist across calls — a raw `read()`
/// can split a sentence across two syscalls, so the state must survive
/// between them.
///
/// Only the `LF` immediately following a `CR` ends a sentence. A run like
/// `CR CR LF` does not "stack": each `CR` independently sets `cr_seen`, a
/// non-`CR`/non-`LF` byte clears it, and the `LF` only fires against
/// whatever the most recent byte left behind.
pub struct LineFramer {
    buf: [u8; SENMAX],
    count: usize,
    cr_seen: bool,
    overrun: bool,
}

impl Default for LineFramer {
    fn default() -> Self {
        LineFramer {
            buf: [0u8; SENMAX],
            count: 0,
            cr_seen: false,
            overrun: false,
        }
    }
}

impl LineFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one byte. Returns `Some(record)` when that byte completed a
    /// well-formed (non-overlength) sentence.
    pub fn feed(&mut self, byte: u8) -> Option<Record> {
        if self.count < SENMAX {
            self.buf[self.count] = byte;
            self.count += 1;
        } else {
            self.overrun = true;
        }

        if byte == b'\r' {
            self.cr_seen = true;
            None
        } else if byte == b'\n' && self.cr_seen {
            let record = if self.overrun {
                tracing::warn!(len = self.count, "dropped oversize sentence");
                None
            } else {
                Some(Record {
                    buf: self.buf,
                    len: self.count,
                })
            };
            self.count = 0;
            self.overrun = false;
            self.cr_seen = false;
            record
        } else {
            self.cr_seen = false;
            None
        }
    }

    /// Feeds a whole chunk of bytes (as read from a transport in one
    /// syscall), invoking `on_sentence` for each complete record.
    pub fn feed_all(&mut self, bytes: &[u8], mut on_sentence: impl FnMut(&[u8])) {
        for &b in bytes {
            if let Some(record) = self.feed(b) {
                on_sentence(record.as_bytes());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(bytes: &[u8]) -> Vec<Vec<u8>> {
        let mut framer = LineFramer::new();
        let mut out = Vec::new();
        framer.feed_all(bytes, |rec| out.push(rec.to_vec()));
        out
    }

    #[test]
    fn splits_two_sentences() {
        let out = run(b"$A*00\r\n$B*00\r\n");
        assert_eq!(out, vec![b"$A*00\r\n".to_vec(), b"$B*00\r\n".to_vec()]);
    }

    #[test]
    fn exact_senmax_is_emitted_one_byte_longer_is_dropped() {
        let exact = vec![b'A'; SENMAX - 2];
        let mut exact_sentence = exact.clone();
        exact_sentence.extend_from_slice(b"\r\n");
        assert_eq!(exact_sentence.len(), SENMAX);
        let out = run(&exact_sentence);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].len(), SENMAX);

        let mut overlong = vec![b'A'; SENMAX - 1];
        overlong.extend_from_slice(b"\r\n");
        assert_eq!(overlong.len(), SENMAX + 1);
        let out = run(&overlong);
        assert!(out.is_empty());
    }

    #[test]
    fn lone_lf_is_not_a_delimiter() {
        let out = run(b"AB\nCD\r\n");
        assert_eq!(out, vec![b"AB\nCD\r\n".to_vec()]);
    }

    #[test]
    fn cr_then_non_lf_clears_cr_seen() {
        let out = run(b"AB\rXY\r\n");
        assert_eq!(out, vec![b"AB\rXY\r\n".to_vec()]);
    }

    #[test]
    fn double_cr_then_lf_terminates_on_final_cr() {
        // CR CR LF: only the LF immediately following a CR terminates; the
        // whole run up to and including the LF is one sentence.
        let out = run(b"AB\r\r\n");
        assert_eq!(out, vec![b"AB\r\r\n".to_vec()]);
    }

    #[test]
    fn state_persists_across_feed_calls() {
        let mut framer = LineFramer::new();
        let mut out = Vec::new();
        framer.feed_all(b"$A*00\r", |rec| out.push(rec.to_vec()));
        assert!(out.is_empty());
        framer.feed_all(b"\n", |rec| out.push(rec.to_vec()));
        assert_eq!(out, vec![b"$A*00\r\n".to_vec()]);
    }
}
