//! Collection naming for the two partition families.
//!
//! Knowledge content lives in `{tradition}_knowledge`, journal-derived
//! content in `{tradition}_{user_id}_personal`. `_` is the reserved
//! separator, so identifiers must not contain it; with that constraint
//! both schemes are injective and a name round-trips to exactly one
//! `(tradition[, user_id])` pair.

const RESERVED_SEPARATOR: char = '_';

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("Invalid {field} {value:?}: must be non-empty and must not contain '_'.")]
pub struct InvalidIdentifier {
	pub field: &'static str,
	pub value: String,
}

pub fn knowledge_collection(tradition: &str) -> Result<String, InvalidIdentifier> {
	validate_identifier("tradition", tradition)?;

	Ok(format!("{tradition}_knowledge"))
}

pub fn personal_collection(tradition: &str, user_id: &str) -> Result<String, InvalidIdentifier> {
	validate_identifier("tradition", tradition)?;
	validate_identifier("user_id", user_id)?;

	Ok(format!("{tradition}_{user_id}_personal"))
}

fn validate_identifier(field: &'static str, value: &str) -> Result<(), InvalidIdentifier> {
	if value.trim().is_empty() || value.contains(RESERVED_SEPARATOR) {
		return Err(InvalidIdentifier { field, value: value.to_string() });
	}

	Ok(())
}
