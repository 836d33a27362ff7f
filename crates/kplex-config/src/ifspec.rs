use std::collections::HashMap;

use kplex_core::{KplexError, Result};

/// One of the six transport types an interface specifier or config section
/// can name. `name2type`'s table, unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterfaceType {
    File,
    Serial,
    Tcp,
    Broadcast,
    Pty,
    Seatalk,
}

impl InterfaceType {
    pub fn parse(name: &str) -> Result<InterfaceType> {
        let itype = match name.to_ascii_lowercase().as_str() {
            "file" => InterfaceType::File,
            "serial" => InterfaceType::Serial,
            "tcp" => InterfaceType::Tcp,
            "broadcast" => InterfaceType::Broadcast,
            "pty" => InterfaceType::Pty,
            "seatalk" => InterfaceType::Seatalk,
            _ => return Err(KplexError::UnknownInterfaceType(name.to_string())),
        };
        Ok(itype)
    }
}

/// The configuration-time direction. `Both` only ever exists here: it is
/// expanded into a linked `In`/`Out` pair of runtime interfaces before any
/// worker thread exists (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
    Both,
}

impl Direction {
    fn parse(val: &str) -> Option<Direction> {
        match val.to_ascii_lowercase().as_str() {
            "in" => Some(Direction::In),
            "out" => Some(Direction::Out),
            "both" => Some(Direction::Both),
            _ => None,
        }
    }
}

/// One interface descriptor: its transport type, direction, and every other
/// `key=value` option as a flat map. Transport-specific option parsing
/// (`filename`, `baud`, `qsize`, `mode`, …) is left to the binary crate,
/// which knows what each `InterfaceType` requires — `add_common_opt` is the
/// only option the original itself interprets generically, everything else
/// it hands transport-specific `init_*` functions as a `kopts` list, which
/// this `HashMap` plays the same role as.
#[derive(Debug, Clone)]
pub struct InterfaceSpec {
    pub itype: InterfaceType,
    pub direction: Option<Direction>,
    pub options: HashMap<String, String>,
}

impl InterfaceSpec {
    pub(crate) fn new(itype: InterfaceType) -> Self {
        InterfaceSpec {
            itype,
            direction: None,
            options: HashMap::new(),
        }
    }

    /// Applies one `key=value` pair, recognizing `direction` itself and
    /// stashing everything else — `add_common_opt`'s single special case.
    pub(crate) fn apply(&mut self, key: &str, val: &str) -> Result<()> {
        if key.eq_ignore_ascii_case("direction") {
            self.direction = Some(Direction::parse(val).ok_or_else(|| KplexError::Config {
                line: None,
                msg: format!("invalid direction '{val}'"),
            })?);
        } else {
            self.options.insert(key.to_string(), val.to_string());
        }
        Ok(())
    }

    /// Call once option collection is complete: `direction` is mandatory.
    pub(crate) fn finish(self) -> Result<InterfaceSpec> {
        if self.direction.is_none() {
            return Err(KplexError::MissingDirection);
        }
        Ok(self)
    }
}

/// Parses one `-f`-less command-line interface specifier:
/// `type:k=v,k=v,...`, e.g. `serial:filename=/dev/ttyUSB0,direction=both,
/// baud=4800`. Grounded on `parse_arg` in the original, including its
/// accepted delimiters (`,` between pairs, `=` within one) and the
/// requirement that `direction` be present by the end.
pub fn parse_arg(arg: &str) -> Result<InterfaceSpec> {
    let (type_name, rest) = arg.split_once(':').ok_or_else(|| KplexError::Config {
        line: None,
        msg: format!("interface specifier '{arg}' is missing a ':'"),
    })?;

    let mut spec = InterfaceSpec::new(InterfaceType::parse(type_name)?);

    if !rest.is_empty() {
        for pair in rest.split(',') {
            let (key, val) = pair.split_once('=').ok_or_else(|| KplexError::Config {
                line: None,
                msg: format!("malformed option '{pair}' in interface specifier '{arg}'"),
            })?;
            spec.apply(key.trim(), val.trim())?;
        }
    }

    spec.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_type_direction_and_options() {
        let spec = parse_arg("serial:filename=/dev/ttyUSB0,direction=both,baud=4800").unwrap();
        assert_eq!(spec.itype, InterfaceType::Serial);
        assert_eq!(spec.direction, Some(Direction::Both));
        assert_eq!(spec.options.get("filename").unwrap(), "/dev/ttyUSB0");
        assert_eq!(spec.options.get("baud").unwrap(), "4800");
    }

    #[test]
    fn rejects_missing_direction() {
        assert!(matches!(
            parse_arg("file:filename=/tmp/x"),
            Err(KplexError::MissingDirection)
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        assert!(parse_arg("carrier-pigeon:direction=in").is_err());
    }

    #[test]
    fn rejects_missing_colon() {
        assert!(parse_arg("tcp").is_err());
    }
}
