pub mod index;
pub mod search;

mod error;

pub use error::{Error, Result};
pub use index::DocumentIndexer;
pub use search::RetrievalEngine;

use std::{future::Future, pin::Pin, sync::Arc};

use sage_config::EmbeddingProviderConfig;
use sage_providers::embedding;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Seam for the external `embed(text) -> vector` function. The default
/// implementation calls the configured HTTP provider; tests substitute
/// a stub.
pub trait EmbeddingProvider
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sage_providers::Result<Vec<Vec<f32>>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn EmbeddingProvider>,
}
impl Providers {
	pub fn new(embedding: Arc<dyn EmbeddingProvider>) -> Self {
		Self { embedding }
	}
}
impl Default for Providers {
	fn default() -> Self {
		Self { embedding: Arc::new(DefaultProviders) }
	}
}

struct DefaultProviders;

impl EmbeddingProvider for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, sage_providers::Result<Vec<Vec<f32>>>> {
		Box::pin(embedding::embed(cfg, texts))
	}
}

pub(crate) async fn embed_texts(
	providers: &Providers,
	cfg: &EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	let vectors = providers.embedding.embed(cfg, texts).await?;

	if vectors.len() != texts.len() {
		return Err(Error::Provider {
			message: "Embedding provider returned a mismatched vector count.".to_string(),
		});
	}

	let expected = cfg.dimensions as usize;

	for vector in &vectors {
		if vector.len() != expected {
			return Err(Error::DimensionMismatch { expected, actual: vector.len() });
		}
	}

	Ok(vectors)
}

pub(crate) async fn embed_single(
	providers: &Providers,
	cfg: &EmbeddingProviderConfig,
	text: &str,
) -> Result<Vec<f32>> {
	let mut vectors = embed_texts(providers, cfg, std::slice::from_ref(&text.to_string())).await?;

	vectors.pop().ok_or_else(|| Error::Provider {
		message: "Embedding provider returned no vectors.".to_string(),
	})
}
