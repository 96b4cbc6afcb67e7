//! Diagnostic output for failing steps.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

/// Receives diagnostic text, typically the last response body
pub trait Debugger: Send + Sync + fmt::Debug {
    fn print(&self, info: &str);
}

/// Writes diagnostics to stdout
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleDebugger;

impl Debugger for ConsoleDebugger {
    fn print(&self, info: &str) {
        println!("{}", info);
    }
}

/// Keeps every printed message in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingDebugger {
    messages: Arc<Mutex<Vec<String>>>,
}

impl RecordingDebugger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().clone()
    }
}

impl Debugger for RecordingDebugger {
    fn print(&self, info: &str) {
        self.messages.lock().push(info.to_string());
    }
}

/// Pretty-printed JSON when `body` parses, raw text otherwise.
pub fn format_body(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| String::from_utf8_lossy(body).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_body() {
        assert_eq!(format_body(br#"{"a":1}"#), "{\n  \"a\": 1\n}");
        assert_eq!(format_body(b"plain text"), "plain text");
        assert_eq!(format_body(b""), "");
    }

    #[test]
    fn test_recording_debugger() {
        let debugger = RecordingDebugger::new();
        let shared = debugger.clone();
        shared.print("first");
        debugger.print("second");
        assert_eq!(debugger.messages(), vec!["first", "second"]);
    }
}
