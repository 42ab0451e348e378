//! Destinations for records produced by a [`Logger`](crate::Logger).

use serde_json::{Map, Value};
use std::backtrace::Backtrace;
use std::panic::Location;
use tracing::{Dispatch, Level};

use crate::Field;

/// Target of events emitted by [`DispatchBackend`].
pub const TARGET: &str = "svclog";

/// Something that can take a leveled message with structured fields.
pub trait Backend: Send + Sync {
    fn log_at(&self, level: Level, message: &str, fields: &[Field], caller: &Location<'_>);
}

/// Forwards records as `tracing` events into a dispatch.
///
/// The dispatch is entered only for the duration of each call, so several
/// of these can coexist in one process without a global subscriber.
#[derive(Clone)]
pub struct DispatchBackend {
    dispatch: Dispatch,
    stacktrace: Option<Level>,
}

impl DispatchBackend {
    pub fn new(dispatch: Dispatch) -> Self {
        Self {
            dispatch,
            stacktrace: None,
        }
    }

    /// Capture a backtrace for records at `level` or more severe.
    pub fn with_stacktrace(mut self, level: Option<Level>) -> Self {
        self.stacktrace = level;
        self
    }

    pub fn dispatch(&self) -> &Dispatch {
        &self.dispatch
    }
}

impl Backend for DispatchBackend {
    fn log_at(&self, level: Level, message: &str, fields: &[Field], caller: &Location<'_>) {
        let kv = (!fields.is_empty()).then(|| encode_fields(fields));
        // `Level` orders by verbosity, so "at least as severe" is `<=`.
        let st = self
            .stacktrace
            .filter(|threshold| level <= *threshold)
            .map(|_| Backtrace::force_capture().to_string());

        let file = caller.file();
        let line = caller.line();
        let kv = kv.as_deref();
        let st = st.as_deref();

        tracing::dispatcher::with_default(&self.dispatch, || {
            macro_rules! emit {
                ($lvl:expr) => {
                    tracing::event!(
                        target: TARGET,
                        $lvl,
                        log.file = file,
                        log.line = line,
                        kv = kv,
                        st = st,
                        "{}",
                        message
                    )
                };
            }

            match level {
                Level::ERROR => emit!(Level::ERROR),
                Level::WARN => emit!(Level::WARN),
                Level::INFO => emit!(Level::INFO),
                Level::DEBUG => emit!(Level::DEBUG),
                _ => emit!(Level::TRACE),
            }
        });
    }
}

/// Encode fields as one JSON object; a repeated key keeps its last value.
pub(crate) fn encode_fields(fields: &[Field]) -> String {
    let map: Map<String, Value> = fields
        .iter()
        .map(|f| (f.key.clone(), Value::String(f.value.clone())))
        .collect();
    Value::Object(map).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoder::RecordEncoder;
    use crate::layer::RecordLayer;
    use crate::layer::tests::SharedBuf;
    use crate::{CallerFormat, Encoding};
    use tracing_subscriber::layer::SubscriberExt;

    fn backend(buf: &SharedBuf, stacktrace: Option<Level>) -> DispatchBackend {
        let encoder = RecordEncoder::new(Encoding::Json).with_caller(CallerFormat::Full);
        let subscriber =
            tracing_subscriber::registry().with(RecordLayer::new(encoder, buf.clone()));
        DispatchBackend::new(Dispatch::new(subscriber)).with_stacktrace(stacktrace)
    }

    #[test]
    fn test_encode_fields_keeps_order_and_text() {
        let fields = vec![
            Field::new("zeta", "1"),
            Field::new("alpha", "say \"hi\""),
            Field::new("zeta", "2"),
        ];
        assert_eq!(
            encode_fields(&fields),
            r#"{"zeta":"2","alpha":"say \"hi\""}"#
        );
    }

    #[test]
    fn test_log_at_forwards_fields_and_caller() {
        let buf = SharedBuf::default();
        let backend = backend(&buf, None);
        let caller = Location::caller();

        backend.log_at(
            Level::INFO,
            "user signed in",
            &[Field::new("user", "alice"), Field::new("attempt", "3")],
            caller,
        );

        let rec = &buf.lines()[0];
        assert_eq!(rec["l"], "INFO");
        assert_eq!(rec["msg"], "user signed in");
        assert_eq!(rec["user"], "alice");
        assert_eq!(rec["attempt"], "3");
        assert_eq!(
            rec["c"],
            format!("{}:{}", caller.file(), caller.line()).as_str()
        );
        assert!(rec.get("st").is_none());
    }

    #[test]
    fn test_stacktrace_only_at_threshold() {
        let buf = SharedBuf::default();
        let backend = backend(&buf, Some(Level::ERROR));

        backend.log_at(Level::WARN, "slow", &[], Location::caller());
        backend.log_at(Level::ERROR, "failed", &[], Location::caller());

        let lines = buf.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].get("st").is_none());
        assert!(lines[1]["st"].is_string());
    }

    #[test]
    fn test_braces_in_message_are_literal() {
        let buf = SharedBuf::default();
        backend(&buf, None).log_at(Level::DEBUG, "{not} a {format}", &[], Location::caller());
        assert_eq!(buf.lines()[0]["msg"], "{not} a {format}");
    }
}
