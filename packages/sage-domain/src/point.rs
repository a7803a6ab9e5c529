use serde::Serialize;
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

pub const SOURCE_TYPE_KNOWLEDGE: &str = "pdf";
pub const SOURCE_TYPE_JOURNAL: &str = "journal";

pub const FIELD_TEXT: &str = "text";
pub const FIELD_SOURCE_TYPE: &str = "source_type";
pub const FIELD_USER_ID: &str = "user_id";
pub const FIELD_TIMESTAMP: &str = "timestamp";
/// Integer projection of [`FIELD_TIMESTAMP`]; the backend filters ranges on
/// numbers, not on RFC 3339 strings.
pub const FIELD_TIMESTAMP_UNIX: &str = "timestamp_unix";

/// One embedded document instance, ready to be written. Points are
/// write-once: re-indexing the same content mints a fresh id.
#[derive(Clone, Debug)]
pub struct Point {
	pub id: Uuid,
	pub vector: Vec<f32>,
	pub payload: Map<String, Value>,
}

/// A shared source-document chunk for a tradition's knowledge collection.
#[derive(Clone, Debug)]
pub struct KnowledgePoint {
	pub text: String,
	pub metadata: Map<String, Value>,
}
impl KnowledgePoint {
	/// Caller metadata goes in first; stamped provenance fields win on
	/// key collisions.
	pub fn into_payload(self) -> Map<String, Value> {
		let mut payload = self.metadata;

		payload.insert(FIELD_TEXT.to_string(), Value::String(self.text));
		payload
			.insert(FIELD_SOURCE_TYPE.to_string(), Value::String(SOURCE_TYPE_KNOWLEDGE.to_string()));

		payload
	}
}

/// A private journal entry for a `(tradition, user)` personal collection.
#[derive(Clone, Debug)]
pub struct PersonalPoint {
	pub text: String,
	pub user_id: String,
	pub timestamp: OffsetDateTime,
	pub metadata: Map<String, Value>,
}
impl PersonalPoint {
	pub fn into_payload(self) -> Result<Map<String, Value>, time::error::Format> {
		let mut payload = self.metadata;

		payload.insert(FIELD_TEXT.to_string(), Value::String(self.text));
		payload
			.insert(FIELD_SOURCE_TYPE.to_string(), Value::String(SOURCE_TYPE_JOURNAL.to_string()));
		payload.insert(FIELD_USER_ID.to_string(), Value::String(self.user_id));
		payload.insert(FIELD_TIMESTAMP.to_string(), Value::String(self.timestamp.format(&Rfc3339)?));
		payload.insert(FIELD_TIMESTAMP_UNIX.to_string(), Value::from(self.timestamp.unix_timestamp()));

		Ok(payload)
	}
}

/// One search hit. Payload access is lenient: a missing or malformed
/// field reads as absent, so downstream ranking stays total.
#[derive(Clone, Debug, Serialize)]
pub struct SearchResult {
	pub id: Uuid,
	pub score: f32,
	pub payload: Map<String, Value>,
}
impl SearchResult {
	pub fn text(&self) -> Option<&str> {
		self.payload.get(FIELD_TEXT).and_then(Value::as_str)
	}

	pub fn source_type(&self) -> Option<&str> {
		self.payload.get(FIELD_SOURCE_TYPE).and_then(Value::as_str)
	}

	pub fn is_personal_content(&self) -> bool {
		self.source_type() == Some(SOURCE_TYPE_JOURNAL)
	}

	pub fn timestamp(&self) -> Option<OffsetDateTime> {
		let raw = self.payload.get(FIELD_TIMESTAMP)?.as_str()?;

		OffsetDateTime::parse(raw, &Rfc3339).ok()
	}

	/// Returns a copy carrying `score`; ranking never mutates in place.
	pub fn with_score(&self, score: f32) -> Self {
		Self { id: self.id, score, payload: self.payload.clone() }
	}
}
