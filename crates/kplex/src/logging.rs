//! Log output setup: syslog once daemonized, stderr otherwise — mirroring
//! `main`'s `openlog`/`vsyslog` versus plain `fprintf(stderr, ...)` split in
//! the original, re-expressed as a `tracing_subscriber` layer instead of a
//! hand-rolled `logmsg` function.

use std::sync::Mutex;

use syslog::{Facility as SyslogFacility, Formatter3164, Logger, LoggerBackend};
use tracing::field::{Field, Visit};
use tracing::{Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::prelude::*;
use tracing_subscriber::Layer;

use kplex_config::Facility;

/// Initializes global logging. `background` selects syslog; anything else
/// (including a syslog connection failure) falls back to stderr so a
/// logging problem never prevents startup.
pub fn init(background: bool, facility: Facility) {
    if background {
        match syslog_layer(facility) {
            Ok(layer) => {
                tracing_subscriber::registry().with(layer).init();
                return;
            }
            Err(err) => {
                eprintln!("kplex: failed to open syslog, falling back to stderr: {err}");
            }
        }
    }
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .init();
}

fn syslog_layer(facility: Facility) -> Result<SyslogLayer, syslog::Error> {
    let formatter = Formatter3164 {
        facility: to_syslog_facility(facility),
        hostname: None,
        process: "kplex".into(),
        pid: std::process::id() as i32,
    };
    let logger = syslog::unix(formatter)?;
    Ok(SyslogLayer {
        logger: Mutex::new(logger),
    })
}

fn to_syslog_facility(facility: Facility) -> SyslogFacility {
    match facility {
        Facility::Kern => SyslogFacility::LOG_KERN,
        Facility::User => SyslogFacility::LOG_USER,
        Facility::Mail => SyslogFacility::LOG_MAIL,
        Facility::Daemon => SyslogFacility::LOG_DAEMON,
        Facility::Auth => SyslogFacility::LOG_AUTH,
        Facility::Syslog => SyslogFacility::LOG_SYSLOG,
        Facility::Lpr => SyslogFacility::LOG_LPR,
        Facility::News => SyslogFacility::LOG_NEWS,
        Facility::Cron => SyslogFacility::LOG_CRON,
        Facility::AuthPriv => SyslogFacility::LOG_AUTHPRIV,
        Facility::Ftp => SyslogFacility::LOG_FTP,
        Facility::Local0 => SyslogFacility::LOG_LOCAL0,
        Facility::Local1 => SyslogFacility::LOG_LOCAL1,
        Facility::Local2 => SyslogFacility::LOG_LOCAL2,
        Facility::Local3 => SyslogFacility::LOG_LOCAL3,
        Facility::Local4 => SyslogFacility::LOG_LOCAL4,
        Facility::Local5 => SyslogFacility::LOG_LOCAL5,
        Facility::Local6 => SyslogFacility::LOG_LOCAL6,
        Facility::Local7 => SyslogFacility::LOG_LOCAL7,
    }
}

struct SyslogLayer {
    logger: Mutex<Logger<LoggerBackend, Formatter3164>>,
}

impl<S: Subscriber> Layer<S> for SyslogLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);
        let message = visitor.finish();

        let mut logger = self.logger.lock().unwrap();
        let result = match *event.metadata().level() {
            Level::ERROR => logger.err(message),
            Level::WARN => logger.warning(message),
            Level::INFO => logger.info(message),
            Level::DEBUG | Level::TRACE => logger.debug(message),
        };
        if let Err(e) = result {
            eprintln!("kplex: syslog write failed: {e}");
        }
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = Some(rendered);
        } else {
            self.fields.push((field.name().to_string(), rendered));
        }
    }
}

impl MessageVisitor {
    fn finish(self) -> String {
        let mut out = self.message.unwrap_or_default();
        for (name, value) in self.fields {
            out.push_str(&format!(" {name}={value}"));
        }
        out
    }
}
