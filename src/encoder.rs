//! Rendering of `tracing` events into log lines.
//!
//! A [`Record`] is collected from an event's fields; a [`RecordEncoder`]
//! turns it into one line of either JSON or tab separated console text. The
//! keys are short to keep file output compact:
//!
//! | key   | content                               |
//! |-------|---------------------------------------|
//! | `l`   | level (`DEBUG`, `INFO`, ...)          |
//! | `t`   | `YYYY-MM-DD hh:mm:ss.mmm`             |
//! | `c`   | caller location                       |
//! | `msg` | message                               |
//! | `svr` | service name                          |
//! | `st`  | stack trace                           |
//!
//! Structured fields land between `svr` and `st`.

use serde_json::{Map, Value};
use std::fmt;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};
use tracing::field::{Field, Visit};
use tracing::{Event, Level};

use crate::{CallerFormat, Encoding};

/// Event field carrying flattened key/value pairs as a JSON object.
pub(crate) const KV_FIELD: &str = "kv";
/// Event field carrying a captured stack trace.
pub(crate) const STACK_FIELD: &str = "st";
/// Event fields overriding the callsite location, named as `tracing-log` does.
pub(crate) const FILE_FIELD: &str = "log.file";
pub(crate) const LINE_FIELD: &str = "log.line";

const RESERVED_KEYS: [&str; 6] = ["l", "t", "c", "msg", "svr", "st"];

/// Everything a sink needs to render one event.
#[derive(Debug, Clone)]
pub struct Record {
    pub time: OffsetDateTime,
    pub level: Level,
    pub file: Option<String>,
    pub line: Option<u32>,
    pub message: String,
    pub fields: Map<String, Value>,
    pub stacktrace: Option<String>,
}

impl Record {
    /// Collect a record from an event, stamped with the current time.
    pub fn from_event(event: &Event<'_>) -> Self {
        let mut visitor = RecordVisitor::default();
        event.record(&mut visitor);

        let meta = event.metadata();
        Self {
            time: OffsetDateTime::now_utc(),
            level: *meta.level(),
            file: visitor.file.or_else(|| meta.file().map(str::to_string)),
            line: visitor.line.or(meta.line()),
            message: visitor.message.unwrap_or_default(),
            fields: visitor.fields,
            stacktrace: visitor.stacktrace,
        }
    }
}

#[derive(Default)]
struct RecordVisitor {
    message: Option<String>,
    file: Option<String>,
    line: Option<u32>,
    stacktrace: Option<String>,
    fields: Map<String, Value>,
}

impl RecordVisitor {
    fn insert(&mut self, key: &str, value: Value) {
        if !RESERVED_KEYS.contains(&key) {
            self.fields.insert(key.to_string(), value);
        }
    }
}

impl Visit for RecordVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            FILE_FIELD => self.file = Some(value.to_string()),
            // bridged `log` records also carry these; the caller already covers them
            "log.target" | "log.module_path" => {}
            STACK_FIELD => self.stacktrace = Some(value.to_string()),
            KV_FIELD => {
                if let Ok(Value::Object(pairs)) = serde_json::from_str::<Value>(value) {
                    for (key, value) in pairs {
                        self.insert(&key, value);
                    }
                }
            }
            name => self.insert(name, Value::String(value.to_string())),
        }
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        match field.name() {
            LINE_FIELD => self.line = u32::try_from(value).ok(),
            name => self.insert(name, Value::from(value)),
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        match field.name() {
            LINE_FIELD => self.line = u32::try_from(value).ok(),
            name => self.insert(name, Value::from(value)),
        }
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field.name(), Value::from(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.insert(field.name(), Value::String(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        let text = format!("{:?}", value);
        match field.name() {
            "message" => self.message = Some(text),
            name => self.insert(name, Value::String(text)),
        }
    }
}

/// Turns records into newline terminated lines.
#[derive(Debug, Clone)]
pub struct RecordEncoder {
    encoding: Encoding,
    caller: CallerFormat,
    service: Option<String>,
    offset: UtcOffset,
}

impl RecordEncoder {
    /// Create an encoder stamping times in the local offset of the process.
    ///
    /// The offset is sampled once here; later lookups can fail once the
    /// process is multi-threaded.
    pub fn new(encoding: Encoding) -> Self {
        Self {
            encoding,
            caller: CallerFormat::default(),
            service: None,
            offset: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
        }
    }

    pub fn with_caller(mut self, caller: CallerFormat) -> Self {
        self.caller = caller;
        self
    }

    /// Tag every record with `svr`; empty names are ignored.
    pub fn with_service(mut self, service: Option<&str>) -> Self {
        self.service = service.filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    pub fn with_offset(mut self, offset: UtcOffset) -> Self {
        self.offset = offset;
        self
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn encode(&self, record: &Record) -> String {
        match self.encoding {
            Encoding::Json => self.encode_json(record),
            Encoding::Console => self.encode_console(record),
        }
    }

    fn timestamp(&self, time: OffsetDateTime) -> String {
        time.to_offset(self.offset)
            .format(format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
            ))
            .unwrap_or_default()
    }

    fn caller(&self, record: &Record) -> Option<String> {
        let file = record.file.as_deref()?;
        self.caller.render(file, record.line.unwrap_or(0))
    }

    fn encode_json(&self, record: &Record) -> String {
        let mut map = Map::new();
        map.insert("l".into(), Value::String(record.level.to_string()));
        map.insert("t".into(), Value::String(self.timestamp(record.time)));
        if let Some(caller) = self.caller(record) {
            map.insert("c".into(), Value::String(caller));
        }
        map.insert("msg".into(), Value::String(record.message.clone()));
        if let Some(service) = &self.service {
            map.insert("svr".into(), Value::String(service.clone()));
        }
        for (key, value) in &record.fields {
            map.insert(key.clone(), value.clone());
        }
        if let Some(st) = &record.stacktrace {
            map.insert("st".into(), Value::String(st.clone()));
        }

        let mut line = Value::Object(map).to_string();
        line.push('\n');
        line
    }

    fn encode_console(&self, record: &Record) -> String {
        let mut line = format!(
            "{}\t{}",
            self.timestamp(record.time),
            record.level
        );
        if let Some(caller) = self.caller(record) {
            line.push('\t');
            line.push_str(&caller);
        }
        line.push('\t');
        line.push_str(&record.message);

        let mut context = Map::new();
        if let Some(service) = &self.service {
            context.insert("svr".into(), Value::String(service.clone()));
        }
        context.extend(record.fields.clone());
        if !context.is_empty() {
            line.push('\t');
            line.push_str(&Value::Object(context).to_string());
        }
        if let Some(st) = &record.stacktrace {
            line.push('\n');
            line.push_str(st.trim_end());
        }
        line.push('\n');
        line
    }
}
