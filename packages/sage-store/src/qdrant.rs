use std::{collections::HashMap, time::Duration};

use qdrant_client::{
	Qdrant, QdrantError,
	client::Payload,
	qdrant::{
		CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, Distance, FieldType, PointId,
		PointStruct, Query, QueryPointsBuilder, UpsertPointsBuilder, Value, VectorParamsBuilder,
		point_id::PointIdOptions, value::Kind,
	},
};
use serde_json::{Map, Value as JsonValue};
use uuid::Uuid;

use sage_domain::{Point, SearchResult, point};

use crate::{Error, Result, filter::MetadataFilter};

/// Thin wrapper around the Qdrant driver. The client is safe for
/// concurrent use; every operation carries the configured request
/// timeout, so a stalled backend surfaces as a retryable error instead
/// of hanging the caller.
pub struct VectorStore {
	client: Qdrant,
	vector_dim: u32,
}
impl VectorStore {
	pub fn new(cfg: &sage_config::Qdrant) -> Result<Self> {
		let mut builder =
			Qdrant::from_url(&cfg.url).timeout(Duration::from_millis(cfg.timeout_ms));

		if let Some(api_key) = cfg.api_key.as_deref() {
			builder = builder.api_key(api_key.to_string());
		}

		let client = builder.build().map_err(|err| classify(&err))?;

		Ok(Self { client, vector_dim: cfg.vector_dim })
	}

	pub fn vector_dim(&self) -> u32 {
		self.vector_dim
	}

	pub async fn exists(&self, name: &str) -> Result<bool> {
		self.client.collection_exists(name).await.map_err(|err| classify(&err))
	}

	/// Creates `name` with a single fixed-size cosine vector field plus
	/// the payload indexes the retrieval filters rely on. Idempotent: a
	/// concurrent creator winning the race is success, not failure.
	pub async fn create(&self, name: &str, dim: u32) -> Result<()> {
		let builder = CreateCollectionBuilder::new(name)
			.vectors_config(VectorParamsBuilder::new(u64::from(dim), Distance::Cosine));

		match self.client.create_collection(builder).await {
			Ok(_) => {},
			Err(err) =>
				if is_already_exists_error(&err) {
					tracing::debug!(collection = name, "Collection already present during create.");
				} else {
					return Err(classify(&err));
				},
		}

		self.create_payload_indexes(name).await
	}

	async fn create_payload_indexes(&self, name: &str) -> Result<()> {
		for (field, field_type) in [
			(point::FIELD_SOURCE_TYPE, FieldType::Keyword),
			(point::FIELD_USER_ID, FieldType::Keyword),
			(point::FIELD_TIMESTAMP_UNIX, FieldType::Integer),
		] {
			match self
				.client
				.create_field_index(CreateFieldIndexCollectionBuilder::new(name, field, field_type))
				.await
			{
				Ok(_) => {},
				Err(err) =>
					if is_already_exists_error(&err) {
						continue;
					} else {
						return Err(classify(&err));
					},
			}
		}

		Ok(())
	}

	/// Writes the whole batch or nothing; partial success is never
	/// reported, so "retry the whole call" is always correct for
	/// retryable failures.
	pub async fn upsert(&self, name: &str, points: Vec<Point>) -> Result<()> {
		if points.is_empty() {
			return Ok(());
		}

		let mut qdrant_points = Vec::with_capacity(points.len());

		for point in points {
			let payload = json_payload(point.payload);

			qdrant_points.push(PointStruct::new(point.id.to_string(), point.vector, payload));
		}

		let upsert = UpsertPointsBuilder::new(name, qdrant_points).wait(true);

		self.client.upsert_points(upsert).await.map_err(|err| classify(&err))?;

		Ok(())
	}

	/// Up to `limit` nearest neighbors by cosine similarity, optionally
	/// restricted by a payload filter. Hits whose point id is not a
	/// UUID are skipped with a warning; this store only ever writes
	/// UUID-keyed points.
	pub async fn search(
		&self,
		name: &str,
		query_vector: Vec<f32>,
		limit: u64,
		filter: Option<&MetadataFilter>,
	) -> Result<Vec<SearchResult>> {
		let mut query = QueryPointsBuilder::new(name)
			.query(Query::new_nearest(query_vector))
			.limit(limit)
			.with_payload(true);

		if let Some(filter) = filter.filter(|filter| !filter.is_empty()) {
			query = query.filter(filter.to_qdrant());
		}

		let response = self.client.query(query).await.map_err(|err| classify(&err))?;
		let mut results = Vec::with_capacity(response.result.len());

		for scored in response.result {
			let Some(id) = scored.id.as_ref().and_then(point_id_to_uuid) else {
				tracing::warn!(collection = name, "Skipped a search hit with a non-UUID point id.");

				continue;
			};

			results.push(SearchResult {
				id,
				score: scored.score,
				payload: payload_to_json(scored.payload),
			});
		}

		Ok(results)
	}

	pub async fn delete_collection(&self, name: &str) -> Result<()> {
		self.client.delete_collection(name).await.map_err(|err| classify(&err))?;

		Ok(())
	}
}

fn json_payload(fields: Map<String, JsonValue>) -> Payload {
	let mut payload = HashMap::new();

	for (key, value) in fields {
		payload.insert(key, Value::from(value));
	}

	Payload::from(payload)
}

fn payload_to_json(payload: HashMap<String, Value>) -> Map<String, JsonValue> {
	payload.into_iter().map(|(key, value)| (key, value_to_json(value))).collect()
}

fn value_to_json(value: Value) -> JsonValue {
	match value.kind {
		Some(Kind::BoolValue(value)) => JsonValue::Bool(value),
		Some(Kind::IntegerValue(value)) => JsonValue::from(value),
		Some(Kind::DoubleValue(value)) =>
			serde_json::Number::from_f64(value).map(JsonValue::Number).unwrap_or(JsonValue::Null),
		Some(Kind::StringValue(value)) => JsonValue::String(value),
		Some(Kind::ListValue(list)) =>
			JsonValue::Array(list.values.into_iter().map(value_to_json).collect()),
		Some(Kind::StructValue(fields)) => JsonValue::Object(
			fields.fields.into_iter().map(|(key, value)| (key, value_to_json(value))).collect(),
		),
		Some(Kind::NullValue(_)) | None => JsonValue::Null,
	}
}

fn point_id_to_uuid(point_id: &PointId) -> Option<Uuid> {
	match &point_id.point_id_options {
		Some(PointIdOptions::Uuid(id)) => Uuid::parse_str(id).ok(),
		_ => None,
	}
}

fn classify(err: &QdrantError) -> Error {
	let message = err.to_string();

	if is_transient_message(&message) {
		Error::Unavailable { message }
	} else {
		Error::Rejected { message }
	}
}

fn is_transient_message(message: &str) -> bool {
	let message = message.to_lowercase();

	[
		"transport error",
		"connection refused",
		"connection reset",
		"broken pipe",
		"timed out",
		"timeout",
		"deadline",
		"unavailable",
	]
	.iter()
	.any(|marker| message.contains(marker))
}

fn is_already_exists_error(err: &QdrantError) -> bool {
	err.to_string().to_lowercase().contains("already exists")
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn transport_failures_classify_as_transient() {
		assert!(is_transient_message("status: Unavailable, message: \"transport error\""));
		assert!(is_transient_message("Deadline expired before operation could complete"));
		assert!(is_transient_message("tcp connect error: Connection refused (os error 111)"));
	}

	#[test]
	fn structural_rejections_classify_as_permanent() {
		assert!(!is_transient_message(
			"Wrong input: Vector dimension error: expected dim: 4, got 2"
		));
		assert!(!is_transient_message("status: InvalidArgument, message: \"bad filter\""));
	}

	#[test]
	fn payload_values_round_trip_through_the_wire_types() {
		let original = json!({
			"text": "Morning pages.",
			"timestamp_unix": 1_717_977_600_i64,
			"pinned": true,
			"tags": ["journal", "morning"],
			"ref": { "page": 3 },
			"missing": null,
		});

		let restored = value_to_json(Value::from(original.clone()));

		assert_eq!(restored, original);
	}
}
