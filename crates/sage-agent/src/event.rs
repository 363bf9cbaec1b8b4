//! The tagged event protocol carried inside stream frames.
//!
//! Each frame is one JSON record with a `type` discriminant. Malformed
//! records and unknown discriminants are tolerated: the former are
//! logged and dropped, the latter decode to [`StreamEvent::Unknown`] so
//! new server-side event kinds never break older clients.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One week of a generated study plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeekPlan {
    #[serde(default)]
    pub week: u32,
    #[serde(default)]
    pub activities: Vec<String>,
}

/// Structured content of a `plan` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanContent {
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub weekly_schedule: Vec<WeekPlan>,
}

/// A recommended video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VideoResource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub channel: String,
}

/// A recommended article or documentation page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WebResource {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub site: String,
}

/// Structured content of a `resources` event. The server may send the
/// video and web lists in separate events; both fields default to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceContent {
    #[serde(default)]
    pub videos: Vec<VideoResource>,
    #[serde(default)]
    pub web: Vec<WebResource>,
}

/// One semantic event decoded from a frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    /// Progress indicator text; never touches the transcript.
    Status { text: String },
    /// The agent opened its reply message.
    ChatStart,
    /// A text delta to append to the open agent message.
    ChatChunk { text: String },
    /// A generated study plan, attached to the open message.
    Plan { content: PlanContent },
    /// Curated videos/articles, attached to the open message.
    Resources { content: ResourceContent },
    /// End of the agent turn, optionally carrying the authoritative full
    /// reply text the server persisted.
    ChatEnd {
        #[serde(default)]
        full_text: Option<String>,
    },
    /// A user-visible failure reported inside the stream.
    Error { text: String },
    /// Forward compatibility: event kinds this client does not know.
    #[serde(other)]
    Unknown,
}

impl StreamEvent {
    /// Decode one frame. Malformed frames are logged and dropped; they
    /// never abort the stream or surface as protocol errors.
    pub fn parse(frame: &str) -> Option<Self> {
        match serde_json::from_str(frame) {
            Ok(event) => Some(event),
            Err(e) => {
                debug!("skipping malformed frame: {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status() {
        let event = StreamEvent::parse(r#"{"type":"status","text":"Thinking..."}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Status {
                text: "Thinking...".into()
            }
        );
    }

    #[test]
    fn parses_chat_start_with_extra_fields() {
        let event = StreamEvent::parse(r#"{"type":"chat_start","role":"agent"}"#).unwrap();
        assert_eq!(event, StreamEvent::ChatStart);
    }

    #[test]
    fn parses_chat_chunk() {
        let event = StreamEvent::parse(r#"{"type":"chat_chunk","text":"Sure, "}"#).unwrap();
        assert_eq!(event, StreamEvent::ChatChunk { text: "Sure, ".into() });
    }

    #[test]
    fn parses_plan_payload() {
        let frame = r#"{
            "type": "plan",
            "content": {
                "overview": "Four weeks of Rust",
                "weekly_schedule": [
                    {"week": 1, "activities": ["Read the book", "Do rustlings"]}
                ]
            }
        }"#;
        match StreamEvent::parse(frame).unwrap() {
            StreamEvent::Plan { content } => {
                assert_eq!(content.overview, "Four weeks of Rust");
                assert_eq!(content.weekly_schedule.len(), 1);
                assert_eq!(content.weekly_schedule[0].activities.len(), 2);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_resources_with_only_videos() {
        let frame = r#"{
            "type": "resources",
            "content": {
                "videos": [{"title": "Ownership explained", "url": "https://example.com", "channel": "RustCasts"}]
            }
        }"#;
        match StreamEvent::parse(frame).unwrap() {
            StreamEvent::Resources { content } => {
                assert_eq!(content.videos.len(), 1);
                assert!(content.web.is_empty());
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn parses_chat_end_with_and_without_full_text() {
        let event = StreamEvent::parse(r#"{"type":"chat_end","full_text":"All done."}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::ChatEnd {
                full_text: Some("All done.".into())
            }
        );

        let event = StreamEvent::parse(r#"{"type":"chat_end"}"#).unwrap();
        assert_eq!(event, StreamEvent::ChatEnd { full_text: None });
    }

    #[test]
    fn unknown_discriminant_is_tolerated() {
        let event = StreamEvent::parse(r#"{"type":"telemetry","ms":12}"#).unwrap();
        assert_eq!(event, StreamEvent::Unknown);
    }

    #[test]
    fn malformed_frames_are_dropped() {
        assert!(StreamEvent::parse("not json at all").is_none());
        assert!(StreamEvent::parse(r#"{"no_type_field":true}"#).is_none());
        // Missing required field.
        assert!(StreamEvent::parse(r#"{"type":"chat_chunk"}"#).is_none());
    }
}
