//! Tracing capture for log assertions.
//!
//! Installs a JSON fmt subscriber for the duration of a closure and
//! returns the emitted `(level, message)` pairs.

use std::io;
use std::sync::{Arc, Mutex};

use serde_json::Value;

#[derive(Clone, Default)]
struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for CaptureBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// One captured log event.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub level: String,
    pub message: String,
}

/// Run `f` with a capturing subscriber installed.
#[allow(dead_code)]
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, Vec<LogRecord>) {
    let buffer = CaptureBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_max_level(tracing::Level::INFO)
        .with_writer(move || writer.clone())
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);

    let bytes = buffer.0.lock().expect("buffer lock").clone();
    let records = String::from_utf8(bytes)
        .expect("utf8 log output")
        .lines()
        .map(|line| {
            let json: Value = serde_json::from_str(line).expect("json log line");
            LogRecord {
                level: json["level"].as_str().unwrap_or_default().to_owned(),
                message: json["fields"]["message"]
                    .as_str()
                    .unwrap_or_default()
                    .to_owned(),
            }
        })
        .collect();
    (result, records)
}

/// Messages logged at `level`, in order.
#[allow(dead_code)]
pub fn messages_at(records: &[LogRecord], level: &str) -> Vec<String> {
    records
        .iter()
        .filter(|r| r.level == level)
        .map(|r| r.message.clone())
        .collect()
}
