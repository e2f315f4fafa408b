//! Frame to [`StreamEvent`] decoding
//!
//! The event kind comes from the frame's `event:` name, or from the `type`
//! field of its JSON data when the frame is unnamed. Kind names are matched
//! case-insensitively with `-` and `_` treated alike, so `diary-reference`
//! and `diary_reference` are the same event.

use serde::Deserialize;
use serde_json::Value;

use crate::error::MoodchatError;
use crate::models::{ActionType, DiaryReference, MessageAction};
use crate::transport::sse::SseFrame;
use crate::transport::StreamEvent;

/// Sentinel some backends send instead of a `done` frame.
const DONE_SENTINEL: &str = "[DONE]";

fn normalize_kind(kind: &str) -> String {
    kind.trim().to_ascii_lowercase().replace('-', "_")
}

fn protocol(message: impl Into<String>) -> MoodchatError {
    MoodchatError::Protocol(message.into())
}

/// Decode one SSE frame.
///
/// Returns `Ok(None)` for frames that carry nothing for the state machine
/// (keep-alives, unknown kinds, actions of an unknown type).
///
/// # Errors
///
/// [`MoodchatError::Protocol`] when the data is not valid JSON for a kind
/// that requires it, or when an unnamed frame has no recognizable kind.
pub fn decode_frame(frame: &SseFrame) -> Result<Option<StreamEvent>, MoodchatError> {
    let raw = frame.data.as_deref().unwrap_or_default();
    let named = frame
        .event
        .as_deref()
        .filter(|e| !e.is_empty() && *e != "message")
        .map(normalize_kind);

    // The sentinel only ends unnamed frames; a `token` frame may carry it as text.
    if matches!(named.as_deref(), None | Some("done")) && raw.trim() == DONE_SENTINEL {
        return Ok(Some(StreamEvent::Done {
            diary_ids: Vec::new(),
        }));
    }

    let json = if raw.trim().is_empty() {
        None
    } else {
        let parsed = serde_json::from_str::<Value>(raw);
        match named.as_deref() {
            // Token and error frames may be plain text that happens to parse
            // as a JSON scalar; only objects and strings are structured data.
            Some(kind @ ("token" | "error")) => match parsed {
                Ok(value @ (Value::Object(_) | Value::String(_))) => Some(value),
                _ if kind == "token" => return Ok(Some(StreamEvent::Token(raw.to_string()))),
                _ => return Ok(Some(StreamEvent::error(raw))),
            },
            _ => match parsed {
                Ok(value) => Some(value),
                Err(e) => return Err(protocol(format!("invalid event data: {}", e))),
            },
        }
    };

    let kind = match named {
        Some(kind) => kind,
        None => match json.as_ref() {
            Some(Value::Object(map)) => match map.get("type").and_then(Value::as_str) {
                Some(kind) => normalize_kind(kind),
                None if map.contains_key("content") => "token".to_string(),
                None => return Err(protocol("event frame without a kind")),
            },
            _ => return Err(protocol("event frame without a kind")),
        },
    };

    let json = json.unwrap_or(Value::Null);
    match kind.as_str() {
        "token" | "content" | "delta" => decode_token(&json).map(Some),
        "action" => decode_action(&json),
        "diary_reference" | "diary_references" | "diaries" | "related_diaries" => {
            decode_references(&json).map(|refs| Some(StreamEvent::DiaryReferences(refs)))
        }
        "done" | "end" | "complete" | "completed" => decode_done(&json).map(Some),
        "error" => Ok(Some(StreamEvent::error(error_message(&json)))),
        "ping" | "heartbeat" | "keepalive" => Ok(None),
        other => {
            tracing::warn!(kind = other, "Ignoring unknown stream event");
            Ok(None)
        }
    }
}

fn decode_token(json: &Value) -> Result<StreamEvent, MoodchatError> {
    let text = match json {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Object(map) => ["content", "token", "text", "delta"]
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .map(str::to_string)
            .ok_or_else(|| protocol("token event without text"))?,
        other => return Err(protocol(format!("unexpected token payload: {}", other))),
    };
    Ok(StreamEvent::Token(text))
}

#[derive(Debug, Deserialize)]
struct RawAction {
    #[serde(rename = "type")]
    action_type: String,
    label: String,
    path: String,
}

fn decode_action(json: &Value) -> Result<Option<StreamEvent>, MoodchatError> {
    let payload = match json.get("action") {
        Some(inner) if inner.is_object() => inner,
        _ => json,
    };
    let raw: RawAction = serde_json::from_value(payload.clone())
        .map_err(|e| protocol(format!("invalid action payload: {}", e)))?;

    let kind = normalize_kind(&raw.action_type);
    match serde_json::from_value::<ActionType>(Value::String(kind)) {
        Ok(action_type) => Ok(Some(StreamEvent::Action(MessageAction {
            action_type,
            label: raw.label,
            path: raw.path,
        }))),
        Err(_) => {
            tracing::warn!(action_type = %raw.action_type, "Dropping action of unknown type");
            Ok(None)
        }
    }
}

fn decode_references(json: &Value) -> Result<Vec<DiaryReference>, MoodchatError> {
    let list = match json {
        Value::Object(map) => match map.get("diaries").or_else(|| map.get("related_diaries")) {
            Some(inner) => inner.clone(),
            None => Value::Array(vec![json.clone()]),
        },
        Value::Array(_) => json.clone(),
        Value::Null => Value::Array(Vec::new()),
        other => return Err(protocol(format!("unexpected diary reference payload: {}", other))),
    };

    let items = match list {
        Value::Array(items) => items,
        other => return Err(protocol(format!("unexpected diary reference list: {}", other))),
    };
    items.into_iter().map(reference_from_value).collect()
}

/// A reference is an object, or just an id as a string or number.
fn reference_from_value(value: Value) -> Result<DiaryReference, MoodchatError> {
    match value {
        Value::String(id) => Ok(DiaryReference::bare(id)),
        Value::Number(n) => Ok(DiaryReference::bare(n.to_string())),
        Value::Object(mut map) => {
            if let Some(Value::Number(n)) = ["diary_id", "diaryId", "id"]
                .iter()
                .find_map(|key| map.get(*key).filter(|v| v.is_number()).cloned())
            {
                map.insert("diary_id".into(), Value::String(n.to_string()));
                map.remove("diaryId");
                map.remove("id");
            }
            serde_json::from_value(Value::Object(map))
                .map_err(|e| protocol(format!("invalid diary reference: {}", e)))
        }
        other => Err(protocol(format!("invalid diary reference: {}", other))),
    }
}

fn decode_done(json: &Value) -> Result<StreamEvent, MoodchatError> {
    let ids = match json {
        Value::Object(map) => {
            if let Some(ids) = map.get("diary_ids").or_else(|| map.get("diaryIds")) {
                ids.clone()
            } else if let Some(related) = map.get("related_diaries") {
                related.clone()
            } else {
                Value::Array(Vec::new())
            }
        }
        Value::Array(_) => json.clone(),
        _ => Value::Array(Vec::new()),
    };

    let diary_ids = match ids {
        Value::Array(items) => items
            .into_iter()
            .map(|item| reference_from_value(item).map(|r| r.diary_id))
            .collect::<Result<Vec<_>, _>>()?,
        Value::Null => Vec::new(),
        other => return Err(protocol(format!("unexpected diary id list: {}", other))),
    };
    Ok(StreamEvent::Done { diary_ids })
}

fn error_message(json: &Value) -> String {
    match json {
        Value::String(s) => s.clone(),
        Value::Object(map) => ["message", "error", "detail"]
            .iter()
            .find_map(|key| match map.get(*key) {
                Some(Value::String(s)) => Some(s.clone()),
                Some(Value::Object(inner)) => inner
                    .get("message")
                    .and_then(Value::as_str)
                    .map(str::to_string),
                _ => None,
            })
            .unwrap_or_else(|| "upstream error".to_string()),
        _ => "upstream error".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(event: Option<&str>, data: &str) -> SseFrame {
        SseFrame {
            event: event.map(str::to_string),
            data: Some(data.to_string()),
            id: None,
        }
    }

    fn decode(event: Option<&str>, data: &str) -> Option<StreamEvent> {
        decode_frame(&frame(event, data)).unwrap()
    }

    #[test]
    fn test_named_token() {
        assert_eq!(
            decode(Some("token"), r#"{"content":"Hi"}"#),
            Some(StreamEvent::Token("Hi".into()))
        );
    }

    #[test]
    fn test_token_from_type_field() {
        assert_eq!(
            decode(None, r#"{"type":"token","token":" there"}"#),
            Some(StreamEvent::Token(" there".into()))
        );
    }

    #[test]
    fn test_empty_token_is_kept() {
        assert_eq!(
            decode(Some("token"), r#"{"content":""}"#),
            Some(StreamEvent::Token(String::new()))
        );
        let empty = SseFrame {
            event: Some("token".into()),
            data: None,
            id: None,
        };
        assert_eq!(
            decode_frame(&empty).unwrap(),
            Some(StreamEvent::Token(String::new()))
        );
    }

    #[test]
    fn test_plain_text_token() {
        assert_eq!(
            decode(Some("token"), "good morning"),
            Some(StreamEvent::Token("good morning".into()))
        );
    }

    #[test]
    fn test_plain_text_token_that_parses_as_json() {
        for text in ["42", "null", "true", "[1, 2]"] {
            assert_eq!(
                decode(Some("token"), text),
                Some(StreamEvent::Token(text.into())),
                "token text {text:?}"
            );
        }
    }

    #[test]
    fn test_done_sentinel_inside_token_is_text() {
        assert_eq!(
            decode(Some("token"), "[DONE]"),
            Some(StreamEvent::Token("[DONE]".into()))
        );
        assert_eq!(
            decode(Some("message"), "[DONE]"),
            Some(StreamEvent::Done { diary_ids: vec![] })
        );
    }

    #[test]
    fn test_plain_text_error_scalar() {
        assert_eq!(decode(Some("error"), "503"), Some(StreamEvent::error("503")));
    }

    #[test]
    fn test_unnamed_content_frame_is_token() {
        assert_eq!(
            decode(None, r#"{"content":"x"}"#),
            Some(StreamEvent::Token("x".into()))
        );
    }

    #[test]
    fn test_action() {
        let event = decode(
            Some("action"),
            r#"{"type":"write_diary","label":"Write it down","path":"/diary/new"}"#,
        );
        match event {
            Some(StreamEvent::Action(action)) => {
                assert_eq!(action.action_type, ActionType::WriteDiary);
                assert_eq!(action.path, "/diary/new");
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_wrapped_action_with_dashed_type() {
        let event = decode(
            None,
            r#"{"type":"action","action":{"type":"record-mood","label":"Log mood","path":"/mood"}}"#,
        );
        assert!(matches!(
            event,
            Some(StreamEvent::Action(MessageAction {
                action_type: ActionType::RecordMood,
                ..
            }))
        ));
    }

    #[test]
    fn test_unknown_action_type_is_dropped() {
        assert_eq!(
            decode(
                Some("action"),
                r#"{"type":"book_flight","label":"Go","path":"/x"}"#
            ),
            None
        );
    }

    #[test]
    fn test_malformed_action_is_protocol_error() {
        let err = decode_frame(&frame(Some("action"), r#"{"label":"Go"}"#)).unwrap_err();
        assert!(matches!(err, MoodchatError::Protocol(_)));
    }

    #[test]
    fn test_diary_reference_shapes() {
        let single = decode(
            Some("diary-reference"),
            r#"{"diary_id":"d1","title":"Walk"}"#,
        );
        assert_eq!(
            single,
            Some(StreamEvent::DiaryReferences(vec![DiaryReference {
                diary_id: "d1".into(),
                title: Some("Walk".into()),
                date: None,
            }]))
        );

        let list = decode(Some("diary_reference"), r#"[{"id":7},"d2"]"#);
        assert_eq!(
            list,
            Some(StreamEvent::DiaryReferences(vec![
                DiaryReference::bare("7"),
                DiaryReference::bare("d2"),
            ]))
        );

        let wrapped = decode(
            None,
            r#"{"type":"diary-reference","diaries":[{"diaryId":"d3","date":"2026-10-15"}]}"#,
        );
        match wrapped {
            Some(StreamEvent::DiaryReferences(refs)) => {
                assert_eq!(refs[0].diary_id, "d3");
                assert_eq!(refs[0].date.as_deref(), Some("2026-10-15"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_done_with_ids() {
        assert_eq!(
            decode(Some("done"), r#"{"diary_ids":["d1",2]}"#),
            Some(StreamEvent::Done {
                diary_ids: vec!["d1".into(), "2".into()]
            })
        );
    }

    #[test]
    fn test_done_from_related_diaries() {
        assert_eq!(
            decode(
                None,
                r#"{"type":"done","related_diaries":[{"diary_id":"d9"}]}"#
            ),
            Some(StreamEvent::Done {
                diary_ids: vec!["d9".into()]
            })
        );
    }

    #[test]
    fn test_done_sentinel_and_empty_done() {
        assert_eq!(
            decode(None, "[DONE]"),
            Some(StreamEvent::Done { diary_ids: vec![] })
        );
        assert_eq!(
            decode(Some("done"), "{}"),
            Some(StreamEvent::Done { diary_ids: vec![] })
        );
    }

    #[test]
    fn test_error_payloads() {
        assert_eq!(
            decode(Some("error"), r#"{"message":"model overloaded"}"#),
            Some(StreamEvent::error("model overloaded"))
        );
        assert_eq!(
            decode(None, r#"{"type":"error","detail":"quota"}"#),
            Some(StreamEvent::error("quota"))
        );
        assert_eq!(
            decode(Some("error"), "gateway timeout"),
            Some(StreamEvent::error("gateway timeout"))
        );
    }

    #[test]
    fn test_ping_and_unknown_kinds_ignored() {
        assert_eq!(decode(Some("ping"), "{}"), None);
        assert_eq!(decode(Some("usage"), r#"{"tokens":12}"#), None);
    }

    #[test]
    fn test_malformed_json_is_protocol_error() {
        let err = decode_frame(&frame(Some("done"), "{not json")).unwrap_err();
        assert!(matches!(err, MoodchatError::Protocol(_)));
    }

    #[test]
    fn test_unnamed_frame_without_kind_is_protocol_error() {
        let err = decode_frame(&frame(None, r#"{"foo":1}"#)).unwrap_err();
        assert!(matches!(err, MoodchatError::Protocol(_)));
    }
}
