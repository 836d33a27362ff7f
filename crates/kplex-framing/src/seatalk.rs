use crate::nmea::frame_sentence;

/// Largest data payload a Seatalk command can carry (attribute byte's low
/// 6 bits cap it at 63, but real Seatalk commands are far shorter).
const MAX_DATA_LEN: usize = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    /// Scanning the raw stream for the `0xFF 0x00` parity-error escape.
    SeekEscape { saw_ff: bool },
    /// Escape seen; the next byte is the command byte.
    Command,
    /// Command seen; the next byte is the attribute byte (low 6 bits = remaining length).
    Attribute,
    /// Reading `remaining` data bytes.
    Data { remaining: usize },
}

/// Assembles complete Seatalk commands out of a parity-marked serial
/// stream and feeds them to the translation table.
///
/// Seatalk is carried over a serial line configured with SPACE parity: a
/// command byte arrives as a parity error, which the UART driver (with
/// `PARMRK` set, in the original) reports in-band as the two-byte escape
/// `0xFF 0x00` immediately before the real command byte. After the escape
/// and the command byte comes one attribute byte whose low 6 bits give the
/// length of the data that follows. Once that many data bytes have
/// arrived, the whole buffer is handed to [`translate`].
pub struct SeatalkFramer {
    state: State,
    cmd: u8,
    attr: u8,
    data: [u8; MAX_DATA_LEN],
    data_len: usize,
}

impl Default for SeatalkFramer {
    fn default() -> Self {
        SeatalkFramer {
            state: State::SeekEscape { saw_ff: false },
            cmd: 0,
            attr: 0,
            data: [0u8; MAX_DATA_LEN],
            data_len: 0,
        }
    }
}

impl SeatalkFramer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one raw byte from the serial stream. Returns `Some(sentence)`
    /// once a complete command has been assembled and successfully
    /// translated; untranslatable commands are dropped silently and this
    /// returns `None` for them too, indistinguishable at this layer from
    /// "command not yet complete".
    pub fn feed(&mut self, byte: u8) -> Option<Vec<u8>> {
        match self.state {
            State::SeekEscape { saw_ff } => {
                if saw_ff && byte == 0x00 {
                    self.state = State::Command;
                } else {
                    self.state = State::SeekEscape { saw_ff: byte == 0xff };
                }
                None
            }
            State::Command => {
                self.cmd = byte;
                self.state = State::Attribute;
                None
            }
            State::Attribute => {
                self.attr = byte;
                let remaining = (byte & 0x3f) as usize;
                if remaining == 0 {
                    self.data_len = 0;
                    self.finish_command()
                } else if remaining > MAX_DATA_LEN {
                    tracing::warn!(cmd = self.cmd, remaining, "dropped malformed seatalk frame");
                    self.state = State::SeekEscape { saw_ff: false };
                    None
                } else {
                    self.state = State::Data { remaining };
                    None
                }
            }
            State::Data { remaining } => {
                self.data[self.data_len] = byte;
                self.data_len += 1;
                if remaining == 1 {
                    self.finish_command()
                } else {
                    self.state = State::Data {
                        remaining: remaining - 1,
                    };
                    None
                }
            }
        }
    }

    fn finish_command(&mut self) -> Option<Vec<u8>> {
        self.state = State::SeekEscape { saw_ff: false };
        translate(self.cmd, self.attr, &self.data[..self.data_len])
    }
}

/// The Seatalk-to-NMEA translation table. Only the handful of commands the
/// original implementation bothered to decode are supported here (depth
/// below transducer and water temperature); everything else is
/// untranslatable and dropped, matching the original's explicit comment
/// that this table is incomplete.
pub fn translate(cmd: u8, _attr: u8, data: &[u8]) -> Option<Vec<u8>> {
    let body = match cmd {
        // Depth below transducer: two data bytes, depth in units of 0.1 ft.
        0x00 => {
            if data.len() < 2 {
                return None;
            }
            let raw = u16::from(data[0]) | (u16::from(data[1]) << 8);
            let feet = f64::from(raw) / 10.0;
            format!(
                "DBT,{:.1},f,{:.1},m,{:.1},F",
                feet,
                feet * 0.3048,
                feet * 0.6
            )
        }
        // Water temperature: one data byte, signed degrees Celsius. Bit 6
        // of the first data byte marks the transducer as non-functional.
        0x23 => {
            if data.is_empty() {
                return None;
            }
            if data[0] & 0x40 != 0 {
                tracing::debug!("dropped seatalk reading from non-functional transducer");
                return None;
            }
            format!("MTW,{},C", data[0] as i8)
        }
        _ => {
            tracing::debug!(cmd, "dropped untranslatable seatalk command");
            return None;
        }
    };
    Some(frame_sentence(&body))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(framer: &mut SeatalkFramer, bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes.iter().filter_map(|&b| framer.feed(b)).collect()
    }

    #[test]
    fn ignores_stream_until_escape() {
        let mut framer = SeatalkFramer::new();
        let out = feed_all(&mut framer, &[0x11, 0x22, 0x33]);
        assert!(out.is_empty());
    }

    #[test]
    fn translates_water_temperature() {
        let mut framer = SeatalkFramer::new();
        // escape, cmd=0x23, attr with length=1, data byte = 12 (deg C)
        let out = feed_all(&mut framer, &[0xff, 0x00, 0x23, 0x01, 12]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], frame_sentence("MTW,12,C"));
    }

    #[test]
    fn non_functional_transducer_is_dropped() {
        let mut framer = SeatalkFramer::new();
        let out = feed_all(&mut framer, &[0xff, 0x00, 0x23, 0x01, 0x40]);
        assert!(out.is_empty());
    }

    #[test]
    fn unknown_command_is_dropped_silently() {
        let mut framer = SeatalkFramer::new();
        let out = feed_all(&mut framer, &[0xff, 0x00, 0x99, 0x00]);
        assert!(out.is_empty());
    }

    #[test]
    fn resyncs_after_a_stray_ff_inside_data() {
        // A literal 0xff that's just data, not an escape, must not get
        // mistaken for the start of a new command.
        let mut framer = SeatalkFramer::new();
        let out = feed_all(&mut framer, &[0xff, 0x00, 0x23, 0x01, 5]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], frame_sentence("MTW,5,C"));
    }
}
