use std::fs;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use tempfile::TempDir;

use moodchat::config::{ApiConfig, StreamConfig};

/// Default stream endpoint path.
#[allow(dead_code)]
pub const STREAM_PATH: &str = "/api/chat/message/stream";

#[allow(dead_code)]
pub fn api_config(base_url: &str) -> ApiConfig {
    ApiConfig {
        base_url: base_url.to_string(),
        ..ApiConfig::default()
    }
}

#[allow(dead_code)]
pub fn stream_config(idle_timeout_seconds: u64) -> StreamConfig {
    StreamConfig {
        idle_timeout_seconds,
        ..StreamConfig::default()
    }
}

/// Build an SSE body from `(event, data)` pairs.
#[allow(dead_code)]
pub fn sse_body(frames: &[(&str, &str)]) -> String {
    frames
        .iter()
        .map(|(event, data)| format!("event: {}\ndata: {}\n\n", event, data))
        .collect()
}

/// A full reply made of `tokens` followed by `done`.
#[allow(dead_code)]
pub fn reply_body(tokens: &[&str]) -> String {
    let mut body: String = tokens
        .iter()
        .map(|t| format!("event: token\ndata: {}\n\n", json!({ "content": t })))
        .collect();
    body.push_str("event: done\ndata: {\"diary_ids\":[]}\n\n");
    body
}

#[allow(dead_code)]
pub fn session_json(id: &str, user_id: &str, created_at: DateTime<Utc>, active: bool) -> Value {
    json!({
        "session_id": id,
        "user_id": user_id,
        "title": "",
        "created_at": created_at.to_rfc3339(),
        "updated_at": created_at.to_rfc3339(),
        "is_active": active,
    })
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
