//! Hybrid score recombination.
//!
//! `final = 0.7 * similarity + recency bonus + personal bonus`. The
//! recency bonus decays linearly from 0.2 at zero days old to 0.0 at 30
//! days and applies to journal content only; shared knowledge does not
//! age the same way. The function is total: malformed payload fields
//! default to no bonus.

use time::OffsetDateTime;

use crate::point::SearchResult;

pub const SIMILARITY_WEIGHT: f32 = 0.7;
pub const PERSONAL_BONUS: f32 = 0.1;
pub const RECENCY_BONUS_MAX: f32 = 0.2;
pub const RECENCY_WINDOW_DAYS: i64 = 30;

/// Re-scores `results` and returns them sorted descending by final
/// score. The sort is stable, so ties keep their input order and the
/// output is reproducible for a given input ordering.
pub fn rank(results: &[SearchResult], now: OffsetDateTime) -> Vec<SearchResult> {
	let mut ranked: Vec<SearchResult> =
		results.iter().map(|result| result.with_score(final_score(result, now))).collect();

	ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

	ranked
}

pub fn final_score(result: &SearchResult, now: OffsetDateTime) -> f32 {
	let mut score = SIMILARITY_WEIGHT * result.score;

	if result.is_personal_content() {
		score += PERSONAL_BONUS;
		score += recency_bonus(result.timestamp(), now);
	}

	score
}

fn recency_bonus(timestamp: Option<OffsetDateTime>, now: OffsetDateTime) -> f32 {
	let Some(timestamp) = timestamp else {
		return 0.0;
	};
	// Future-dated stamps clamp to zero days so the bonus never exceeds
	// its ceiling.
	let days_ago = (now - timestamp).whole_days().max(0);

	if days_ago >= RECENCY_WINDOW_DAYS {
		return 0.0;
	}

	RECENCY_BONUS_MAX * (1.0 - days_ago as f32 / RECENCY_WINDOW_DAYS as f32)
}

#[cfg(test)]
mod tests {
	use serde_json::{Map, json};
	use time::macros::datetime;
	use uuid::Uuid;

	use super::*;
	use crate::point::{FIELD_SOURCE_TYPE, FIELD_TIMESTAMP, SOURCE_TYPE_JOURNAL};

	fn journal_result(score: f32, timestamp: Option<&str>) -> SearchResult {
		let mut payload = Map::new();

		payload.insert(FIELD_SOURCE_TYPE.to_string(), json!(SOURCE_TYPE_JOURNAL));

		if let Some(timestamp) = timestamp {
			payload.insert(FIELD_TIMESTAMP.to_string(), json!(timestamp));
		}

		SearchResult { id: Uuid::new_v4(), score, payload }
	}

	#[test]
	fn recency_bonus_decays_to_zero_at_window_edge() {
		let now = datetime!(2024-06-10 00:00 UTC);
		let thirty_days = journal_result(0.0, Some("2024-05-11T00:00:00Z"));
		let fifteen_days = journal_result(0.0, Some("2024-05-26T00:00:00Z"));

		assert!((final_score(&thirty_days, now) - PERSONAL_BONUS).abs() < 1e-6);
		assert!((final_score(&fifteen_days, now) - (PERSONAL_BONUS + 0.1)).abs() < 1e-6);
	}

	#[test]
	fn future_timestamps_cap_the_bonus() {
		let now = datetime!(2024-06-10 00:00 UTC);
		let future = journal_result(0.0, Some("2024-07-01T00:00:00Z"));

		assert!((final_score(&future, now) - (PERSONAL_BONUS + RECENCY_BONUS_MAX)).abs() < 1e-6);
	}

	#[test]
	fn unparsable_timestamp_scores_without_recency() {
		let now = datetime!(2024-06-10 00:00 UTC);
		let malformed = journal_result(0.5, Some("yesterday-ish"));

		assert!((final_score(&malformed, now) - (0.7 * 0.5 + PERSONAL_BONUS)).abs() < 1e-6);
	}
}
