use serde_json::{Map, json};
use time::macros::datetime;
use uuid::Uuid;

use sage_domain::{
	SearchResult, knowledge_collection, personal_collection,
	point::{FIELD_SOURCE_TYPE, FIELD_TIMESTAMP, SOURCE_TYPE_JOURNAL, SOURCE_TYPE_KNOWLEDGE},
	rank,
};

fn result(score: f32, source_type: &str, timestamp: Option<&str>) -> SearchResult {
	let mut payload = Map::new();

	payload.insert(FIELD_SOURCE_TYPE.to_string(), json!(source_type));

	if let Some(timestamp) = timestamp {
		payload.insert(FIELD_TIMESTAMP.to_string(), json!(timestamp));
	}

	SearchResult { id: Uuid::new_v4(), score, payload }
}

#[test]
fn personal_collection_naming_is_pure_and_injective() {
	let pairs =
		[("stoicism", "u1"), ("stoicism", "u2"), ("vedanta", "u1"), ("zen", "morning-sitter")];
	let mut names = Vec::new();

	for (tradition, user_id) in pairs {
		let name = personal_collection(tradition, user_id).unwrap();

		assert_eq!(name, personal_collection(tradition, user_id).unwrap());
		assert!(!names.contains(&name), "Collision for ({tradition}, {user_id}): {name}");

		names.push(name);
	}

	assert!(!names.contains(&knowledge_collection("stoicism").unwrap()));
}

#[test]
fn fresh_journal_entry_outranks_higher_similarity_knowledge() {
	// The worked example: a same-day journal hit at 0.9 similarity beats
	// a 0.95 knowledge hit once the bonuses land.
	let now = datetime!(2024-06-10 00:00 UTC);
	let journal = result(0.9, SOURCE_TYPE_JOURNAL, Some("2024-06-10T00:00:00Z"));
	let knowledge = result(0.95, SOURCE_TYPE_KNOWLEDGE, None);
	let journal_id = journal.id;
	let knowledge_id = knowledge.id;

	let ranked = rank(&[knowledge, journal], now);

	assert_eq!(ranked.len(), 2);
	assert_eq!(ranked[0].id, journal_id);
	assert_eq!(ranked[1].id, knowledge_id);
	assert!((ranked[0].score - 0.93).abs() < 1e-6);
	assert!((ranked[1].score - 0.665).abs() < 1e-6);
}

#[test]
fn knowledge_results_never_receive_a_recency_bonus() {
	let now = datetime!(2024-06-10 00:00 UTC);
	let knowledge = result(0.8, SOURCE_TYPE_KNOWLEDGE, Some("2024-06-10T00:00:00Z"));

	let ranked = rank(&[knowledge], now);

	assert!((ranked[0].score - 0.7 * 0.8).abs() < 1e-6);
}

#[test]
fn ties_preserve_input_order() {
	let now = datetime!(2024-06-10 00:00 UTC);
	let first = result(0.4, SOURCE_TYPE_KNOWLEDGE, None);
	let second = result(0.4, SOURCE_TYPE_KNOWLEDGE, None);
	let first_id = first.id;
	let second_id = second.id;

	let ranked = rank(&[first, second], now);

	assert_eq!(ranked[0].id, first_id);
	assert_eq!(ranked[1].id, second_id);
}

#[test]
fn ranking_does_not_mutate_inputs() {
	let now = datetime!(2024-06-10 00:00 UTC);
	let original = result(0.9, SOURCE_TYPE_JOURNAL, Some("2024-06-10T00:00:00Z"));
	let inputs = vec![original.clone()];

	let ranked = rank(&inputs, now);

	assert!((inputs[0].score - 0.9).abs() < 1e-6);
	assert!(ranked[0].score > inputs[0].score);
}
