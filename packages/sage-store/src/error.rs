#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Transient network or backend failure; safe to retry with backoff
	/// at the caller's discretion.
	#[error("Vector backend unavailable: {message}")]
	Unavailable { message: String },
	/// The backend understood the request and refused it; retrying the
	/// same request will not help.
	#[error("Vector backend rejected the request: {message}")]
	Rejected { message: String },
}
impl Error {
	pub fn is_retryable(&self) -> bool {
		matches!(self, Self::Unavailable { .. })
	}
}
