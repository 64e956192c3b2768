//! `tracing` integration
//!
//! [`DotoLayer`] turns `tracing` events into records for a [`Logger`], so
//! application code can keep using the `tracing` macros. Boolean fields named
//! `raw`, `no_newline`, `textwrap` and `no_splitlines` set the matching record
//! flags, and a `severity` field (`"critical"`, `"fatal"`, ...) overrides the
//! event level:
//!
//! ```ignore
//! tracing::info!(textwrap = true, "a long explanation ...");
//! tracing::error!(severity = "fatal", "cannot continue");
//! ```

use std::fmt;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

use super::logger::Logger;
use super::record::{Record, RecordFlags, UNKNOWN_FILE};
use super::severity::Severity;

/// Layer forwarding every event to a logger
pub struct DotoLayer {
    logger: Arc<Logger>,
}

impl DotoLayer {
    pub fn new(logger: Arc<Logger>) -> Self {
        Self { logger }
    }
}

#[derive(Default)]
struct EventVisitor {
    message: String,
    flags: RecordFlags,
    severity: Option<Severity>,
}

impl Visit for EventVisitor {
    fn record_bool(&mut self, field: &Field, value: bool) {
        match field.name() {
            "raw" => self.flags.raw = value,
            "no_newline" => self.flags.no_newline = value,
            "textwrap" => self.flags.textwrap = value,
            "no_splitlines" => self.flags.no_splitlines = value,
            _ => {}
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = value.to_string(),
            "severity" => self.severity = value.parse().ok(),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for DotoLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let metadata = event.metadata();
        let severity = visitor
            .severity
            .unwrap_or_else(|| Severity::from(*metadata.level()));
        let record = Record::new(severity, visitor.message)
            .with_flags(visitor.flags)
            .at(
                metadata.file().unwrap_or(UNKNOWN_FILE),
                metadata.line().unwrap_or(0),
            )
            .with_logger(Arc::from(metadata.target()));

        self.logger.dispatch(&record);
    }
}

/// Install a global subscriber that sends `tracing` events to `logger`
///
/// The filter comes from `RUST_LOG` and defaults to `debug`, leaving level
/// selection to the logger and its sinks.
pub fn init_tracing(logger: Arc<Logger>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(DotoLayer::new(logger))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
