pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Malformed arguments caught before any network call; never retried.
	#[error("Invalid input: {message}")]
	InvalidInput { message: String },
	/// Embedding length does not match the configured dimension; caught
	/// before any network call.
	#[error("Embedding dimension mismatch: expected {expected}, got {actual}.")]
	DimensionMismatch { expected: usize, actual: usize },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error(transparent)]
	Store(#[from] sage_store::Error),
}
impl Error {
	/// Retry policy belongs to callers; this is the predicate they need.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Store(err) => err.is_retryable(),
			_ => false,
		}
	}
}
impl From<sage_domain::InvalidIdentifier> for Error {
	fn from(err: sage_domain::InvalidIdentifier) -> Self {
		Self::InvalidInput { message: err.to_string() }
	}
}
impl From<sage_providers::Error> for Error {
	fn from(err: sage_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
