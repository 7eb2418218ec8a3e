use std::fs::{File, OpenOptions};
use std::io::Write;

use chrono::Utc;
use serde_json::{Value, json};
use tracing::warn;

use crate::diff::diff_json;

/// How device-list bodies are recorded in the message log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLogMode {
    Full,
    /// First body in full, afterwards only the JSON paths that changed.
    Diffed,
}

pub(crate) struct MessageLogger {
    mode: MessageLogMode,
    file: File,
    previous_state: Option<Value>,
}

impl MessageLogger {
    pub fn new(mode: MessageLogMode, path: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            mode,
            file,
            previous_state: None,
        })
    }

    /// `fields` must never carry the password.
    pub fn log_request(&mut self, method: &str, path: &str, fields: Option<&Value>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "req",
            "method": method,
            "path": path,
            "fields": fields,
        });
        self.write_line(&entry);
    }

    pub fn log_write(&mut self, device: &str, attr: &str, value: &str, status: Option<u16>) {
        let entry = json!({
            "ts": Utc::now().to_rfc3339(),
            "dir": "write",
            "device": device,
            "attr": attr,
            "value": value,
            "status": status,
        });
        self.write_line(&entry);
    }

    pub fn log_fetch(&mut self, status: u16, body: &Value) {
        match self.mode {
            MessageLogMode::Full => {
                let entry = json!({
                    "ts": Utc::now().to_rfc3339(),
                    "dir": "fetch",
                    "status": status,
                    "body": body,
                });
                self.write_line(&entry);
            }
            MessageLogMode::Diffed => {
                let entry = match self.previous_state.as_ref() {
                    None => json!({
                        "ts": Utc::now().to_rfc3339(),
                        "dir": "fetch",
                        "status": status,
                        "full": true,
                        "body": body,
                    }),
                    Some(prev) => {
                        let mut changes = Vec::new();
                        diff_json(prev, body, "", &mut changes);

                        let change_entries: Vec<Value> = changes
                            .iter()
                            .map(|(path, old, new)| json!({ "path": path, "old": old, "new": new }))
                            .collect();

                        json!({
                            "ts": Utc::now().to_rfc3339(),
                            "dir": "fetch",
                            "status": status,
                            "changes": change_entries,
                        })
                    }
                };
                self.write_line(&entry);
                self.previous_state = Some(body.clone());
            }
        }
    }

    fn write_line(&mut self, entry: &Value) {
        if let Ok(line) = serde_json::to_string(entry)
            && let Err(e) = writeln!(self.file, "{line}")
        {
            warn!("failed to write log entry: {e}");
        }
    }
}
