use std::path::Path;

use kplex_core::{KplexError, Result};

use crate::facility::Facility;
use crate::ifspec::{InterfaceSpec, InterfaceType};

/// The `[global]` section: queue sizing, daemonization, and log facility.
/// The only keys `add_common_opt`'s original analogue recognizes at this
/// level — everything else is a config-syntax error, matching the
/// original's "unknown option" rejection rather than silently ignoring it.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub qsize: Option<usize>,
    pub background: bool,
    pub logto: Option<Facility>,
}

/// The fully-parsed contents of a config file: at most one `[global]`
/// section plus every interface section, in file order.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    pub global: GlobalOptions,
    pub interfaces: Vec<InterfaceSpec>,
}

enum Section {
    Global(GlobalOptions),
    Interface(InterfaceSpec),
}

/// Reads and parses a config file from disk.
pub fn parse_file(path: &Path) -> Result<FileConfig> {
    let text = std::fs::read_to_string(path)?;
    parse_str(&text)
}

/// The INI-like grammar from `options.c`'s `get_interface_section` +
/// `next_config`, re-expressed over whole lines instead of a single
/// character-at-a-time buffer: `[section]` headers (repeatable — a config
/// can have several `[serial]` blocks, one per physical port), `key=value`
/// lines with optional single- or double-quoting, `#` line comments, blank
/// lines ignored. `[global]` may appear at most once.
pub fn parse_str(text: &str) -> Result<FileConfig> {
    let mut config = FileConfig::default();
    let mut global_seen = false;
    let mut current: Option<Section> = None;
    let last_line = text.lines().count();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = (idx + 1) as u32;
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = section_header(line) {
            close_section(current.take(), &mut config, line_no)?;
            current = Some(if name.eq_ignore_ascii_case("global") {
                if global_seen {
                    return Err(KplexError::DuplicateGlobalSection { line: line_no });
                }
                global_seen = true;
                Section::Global(GlobalOptions::default())
            } else {
                Section::Interface(InterfaceSpec::new(
                    InterfaceType::parse(name).map_err(|e| with_line(e, line_no))?,
                ))
            });
            continue;
        }

        let (key, val) = parse_kv(line, line_no)?;
        match &mut current {
            Some(Section::Global(opts)) => apply_global(opts, &key, &val, line_no)?,
            Some(Section::Interface(spec)) => {
                spec.apply(&key, &val).map_err(|e| with_line(e, line_no))?
            }
            None => {
                return Err(KplexError::Config {
                    line: Some(line_no),
                    msg: "option outside of any [section]".into(),
                })
            }
        }
    }

    close_section(current.take(), &mut config, last_line as u32)?;
    Ok(config)
}

fn close_section(section: Option<Section>, config: &mut FileConfig, line_no: u32) -> Result<()> {
    match section {
        Some(Section::Global(opts)) => config.global = opts,
        Some(Section::Interface(spec)) => {
            config.interfaces.push(spec.finish().map_err(|e| with_line(e, line_no))?)
        }
        None => {}
    }
    Ok(())
}

fn with_line(err: KplexError, line: u32) -> KplexError {
    match err {
        KplexError::Config { line: None, msg } => KplexError::Config {
            line: Some(line),
            msg,
        },
        other => other,
    }
}

/// Strips a `#` comment, unless the `#` falls inside a quoted value.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '\'' || c == '"' => quote = Some(c),
            None if c == '#' => return &line[..i],
            None => {}
        }
    }
    line
}

fn section_header(line: &str) -> Option<&str> {
    line.strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

fn parse_kv(line: &str, line_no: u32) -> Result<(String, String)> {
    let (key, rest) = line.split_once('=').ok_or_else(|| KplexError::Config {
        line: Some(line_no),
        msg: format!("expected 'key = value', got '{line}'"),
    })?;
    let key = key.trim();
    if key.is_empty() {
        return Err(KplexError::Config {
            line: Some(line_no),
            msg: "empty key before '='".into(),
        });
    }
    let val = strip_quotes(rest.trim());
    Ok((key.to_string(), val.to_string()))
}

fn strip_quotes(val: &str) -> &str {
    let bytes = val.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if (first == b'\'' || first == b'"') && first == last {
            return &val[1..val.len() - 1];
        }
    }
    val
}

fn apply_global(opts: &mut GlobalOptions, key: &str, val: &str, line_no: u32) -> Result<()> {
    match key.to_ascii_lowercase().as_str() {
        "qsize" => {
            let n: usize = val.parse().map_err(|_| KplexError::Config {
                line: Some(line_no),
                msg: format!("invalid qsize '{val}'"),
            })?;
            if n < kplex_core::MIN_QUEUE_SIZE {
                return Err(KplexError::InvalidQueueCapacity(n));
            }
            opts.qsize = Some(n);
        }
        "mode" => {
            if val.eq_ignore_ascii_case("background") {
                opts.background = true;
            } else {
                return Err(KplexError::Config {
                    line: Some(line_no),
                    msg: format!("unknown global mode '{val}'"),
                });
            }
        }
        "logto" => opts.logto = Some(Facility::parse(val).map_err(|e| with_line(e, line_no))?),
        other => {
            return Err(KplexError::Config {
                line: Some(line_no),
                msg: format!("unknown global option '{other}'"),
            })
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ifspec::Direction;

    #[test]
    fn parses_global_and_interface_sections() {
        let text = "\
[global]
qsize=64
logto=local3
# a comment line is ignored

[serial]
filename=/dev/ttyUSB0
direction=both
baud=4800

[tcp]
direction=in
address=192.168.1.1
port=10110
";
        let cfg = parse_str(text).unwrap();
        assert_eq!(cfg.global.qsize, Some(64));
        assert_eq!(cfg.global.logto, Some(Facility::Local3));
        assert!(!cfg.global.background);
        assert_eq!(cfg.interfaces.len(), 2);
        assert_eq!(cfg.interfaces[0].itype, InterfaceType::Serial);
        assert_eq!(cfg.interfaces[0].direction, Some(Direction::Both));
        assert_eq!(cfg.interfaces[1].options.get("address").unwrap(), "192.168.1.1");
    }

    #[test]
    fn repeated_interface_sections_each_produce_one_entry() {
        let text = "\
[serial]
filename=/dev/ttyUSB0
direction=in

[serial]
filename=/dev/ttyUSB1
direction=out
";
        let cfg = parse_str(text).unwrap();
        assert_eq!(cfg.interfaces.len(), 2);
        assert_eq!(cfg.interfaces[0].options.get("filename").unwrap(), "/dev/ttyUSB0");
        assert_eq!(cfg.interfaces[1].options.get("filename").unwrap(), "/dev/ttyUSB1");
    }

    #[test]
    fn duplicate_global_section_is_an_error() {
        let text = "[global]\nqsize=4\n\n[global]\nqsize=8\n";
        assert!(matches!(
            parse_str(text),
            Err(KplexError::DuplicateGlobalSection { .. })
        ));
    }

    #[test]
    fn quoted_values_keep_embedded_hash() {
        let text = "[file]\nfilename=\"/tmp/log#1.txt\"\ndirection=out\n";
        let cfg = parse_str(text).unwrap();
        assert_eq!(
            cfg.interfaces[0].options.get("filename").unwrap(),
            "/tmp/log#1.txt"
        );
    }

    #[test]
    fn interface_section_missing_direction_errors() {
        let text = "[file]\nfilename=/tmp/x\n";
        assert!(matches!(parse_str(text), Err(KplexError::MissingDirection)));
    }

    #[test]
    fn unknown_section_type_errors() {
        let text = "[satellite]\ndirection=in\n";
        assert!(matches!(
            parse_str(text),
            Err(KplexError::UnknownInterfaceType(_))
        ));
    }
}
