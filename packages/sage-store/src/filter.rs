use qdrant_client::qdrant::{Condition, Filter, Range};

/// Payload filter: an AND of exact-match conditions, optionally with one
/// closed interval on a numeric field (used by date-range queries).
#[derive(Clone, Debug, Default)]
pub struct MetadataFilter {
	equals: Vec<(String, String)>,
	within: Option<(String, f64, f64)>,
}
impl MetadataFilter {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn equals(mut self, field: &str, value: &str) -> Self {
		self.equals.push((field.to_string(), value.to_string()));

		self
	}

	pub fn within(mut self, field: &str, start: f64, end: f64) -> Self {
		self.within = Some((field.to_string(), start, end));

		self
	}

	pub fn is_empty(&self) -> bool {
		self.equals.is_empty() && self.within.is_none()
	}

	pub(crate) fn to_qdrant(&self) -> Filter {
		let mut must: Vec<Condition> = self
			.equals
			.iter()
			.map(|(field, value)| Condition::matches(field.clone(), value.clone()))
			.collect();

		if let Some((field, start, end)) = &self.within {
			must.push(Condition::range(
				field.clone(),
				Range { gte: Some(*start), lte: Some(*end), ..Default::default() },
			));
		}

		Filter::must(must)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn conditions_accumulate_as_a_conjunction() {
		let filter = MetadataFilter::new()
			.equals("source_type", "journal")
			.equals("user_id", "u42")
			.within("timestamp_unix", 100.0, 200.0);

		assert!(!filter.is_empty());
		assert_eq!(filter.to_qdrant().must.len(), 3);
	}

	#[test]
	fn empty_filter_converts_to_no_conditions() {
		let filter = MetadataFilter::new();

		assert!(filter.is_empty());
		assert!(filter.to_qdrant().must.is_empty());
	}
}
