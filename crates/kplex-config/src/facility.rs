use kplex_core::{KplexError, Result};

/// A syslog facility, as named on the `-l`/`logto` option.
///
/// Mirrors `string2facility`'s table exactly — the original maps `localX`
/// arithmetically (`(*fac + 5) - 32`); §9 resolves that as an enumerated
/// table instead, so `local0..local7` are spelled out here rather than
/// derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facility {
    Kern,
    User,
    Mail,
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Cron,
    AuthPriv,
    Ftp,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    pub fn parse(name: &str) -> Result<Facility> {
        let facility = match name.to_ascii_lowercase().as_str() {
            "kern" => Facility::Kern,
            "user" => Facility::User,
            "mail" => Facility::Mail,
            "daemon" => Facility::Daemon,
            "auth" => Facility::Auth,
            "syslog" => Facility::Syslog,
            "lpr" => Facility::Lpr,
            "news" => Facility::News,
            "cron" => Facility::Cron,
            "authpriv" => Facility::AuthPriv,
            "ftp" => Facility::Ftp,
            "local0" => Facility::Local0,
            "local1" => Facility::Local1,
            "local2" => Facility::Local2,
            "local3" => Facility::Local3,
            "local4" => Facility::Local4,
            "local5" => Facility::Local5,
            "local6" => Facility::Local6,
            "local7" => Facility::Local7,
            _ => return Err(KplexError::UnknownFacility(name.to_string())),
        };
        Ok(facility)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_every_table_entry() {
        for name in [
            "kern", "user", "mail", "daemon", "auth", "syslog", "lpr", "news", "cron",
            "authpriv", "ftp", "local0", "local7",
        ] {
            assert!(Facility::parse(name).is_ok(), "{name} should parse");
        }
    }

    #[test]
    fn is_case_insensitive() {
        assert_eq!(Facility::parse("LOCAL3").unwrap(), Facility::Local3);
    }

    #[test]
    fn rejects_local8_and_garbage() {
        assert!(Facility::parse("local8").is_err());
        assert!(Facility::parse("nonsense").is_err());
    }
}
