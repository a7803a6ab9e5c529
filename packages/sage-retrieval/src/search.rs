use std::sync::Arc;

use time::OffsetDateTime;

use sage_config::EmbeddingProviderConfig;
use sage_domain::{
	SearchResult, knowledge_collection, personal_collection,
	point::{FIELD_SOURCE_TYPE, FIELD_TIMESTAMP_UNIX, SOURCE_TYPE_JOURNAL, SOURCE_TYPE_KNOWLEDGE},
	ranking,
};
use sage_store::{filter::MetadataFilter, manager::CollectionManager, qdrant::VectorStore};

use crate::{Error, Providers, Result};

/// Issues scoped searches against the knowledge and personal
/// collections and merges them under one ranking pass.
pub struct RetrievalEngine {
	store: Arc<VectorStore>,
	collections: Arc<CollectionManager>,
	providers: Providers,
	embedding: EmbeddingProviderConfig,
	default_limit: u32,
}
impl RetrievalEngine {
	pub fn new(
		store: Arc<VectorStore>,
		collections: Arc<CollectionManager>,
		embedding: EmbeddingProviderConfig,
		default_limit: u32,
	) -> Self {
		Self { store, collections, providers: Providers::default(), embedding, default_limit }
	}

	pub fn with_providers(
		store: Arc<VectorStore>,
		collections: Arc<CollectionManager>,
		embedding: EmbeddingProviderConfig,
		default_limit: u32,
		providers: Providers,
	) -> Self {
		Self { store, collections, providers, embedding, default_limit }
	}

	pub async fn search_knowledge(
		&self,
		tradition: &str,
		query_vector: Vec<f32>,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		let collection = knowledge_collection(tradition)?;

		self.check_dimension(&query_vector)?;
		self.collections.ensure(&collection, self.store.vector_dim()).await?;

		let filter = MetadataFilter::new().equals(FIELD_SOURCE_TYPE, SOURCE_TYPE_KNOWLEDGE);
		let results = self
			.store
			.search(&collection, query_vector, self.effective_limit(limit), Some(&filter))
			.await?;

		Ok(results)
	}

	/// An absent personal collection is the normal state for a user who
	/// has never journaled: the result is empty, no error is raised and
	/// nothing is created.
	pub async fn search_personal(
		&self,
		tradition: &str,
		user_id: &str,
		query_vector: Vec<f32>,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		let filter = personal_filter();

		self.search_personal_scoped(tradition, user_id, query_vector, limit, filter).await
	}

	/// As [`Self::search_personal`], restricted to entries whose
	/// timestamp falls inside the closed interval `[start, end]`.
	pub async fn search_personal_by_date_range(
		&self,
		tradition: &str,
		user_id: &str,
		query_vector: Vec<f32>,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		if end < start {
			return Err(Error::InvalidInput {
				message: "Date range end must not precede its start.".to_string(),
			});
		}

		let filter = personal_filter().within(
			FIELD_TIMESTAMP_UNIX,
			start.unix_timestamp() as f64,
			end.unix_timestamp() as f64,
		);

		self.search_personal_scoped(tradition, user_id, query_vector, limit, filter).await
	}

	/// Runs the requested scoped searches concurrently, each capped at
	/// `limit` so the merged set never exceeds twice that, then ranks
	/// the union once and truncates. Both flags false is an explicit
	/// no-op, not an error.
	pub async fn hybrid_search(
		&self,
		tradition: &str,
		user_id: &str,
		query_vector: Vec<f32>,
		include_knowledge: bool,
		include_personal: bool,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		if !include_knowledge && !include_personal {
			return Ok(Vec::new());
		}

		let knowledge_leg = async {
			if include_knowledge {
				self.search_knowledge(tradition, query_vector.clone(), limit).await
			} else {
				Ok(Vec::new())
			}
		};
		let personal_leg = async {
			if include_personal {
				self.search_personal(tradition, user_id, query_vector.clone(), limit).await
			} else {
				Ok(Vec::new())
			}
		};
		let (knowledge, personal) = tokio::join!(knowledge_leg, personal_leg);
		let mut merged = knowledge?;

		merged.extend(personal?);

		let mut ranked = ranking::rank(&merged, OffsetDateTime::now_utc());

		ranked.truncate(self.effective_limit(limit) as usize);

		Ok(ranked)
	}

	pub async fn search_knowledge_text(
		&self,
		tradition: &str,
		query: &str,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		let query_vector = crate::embed_single(&self.providers, &self.embedding, query).await?;

		self.search_knowledge(tradition, query_vector, limit).await
	}

	pub async fn search_personal_text(
		&self,
		tradition: &str,
		user_id: &str,
		query: &str,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		let query_vector = crate::embed_single(&self.providers, &self.embedding, query).await?;

		self.search_personal(tradition, user_id, query_vector, limit).await
	}

	pub async fn search_personal_text_by_date_range(
		&self,
		tradition: &str,
		user_id: &str,
		query: &str,
		start: OffsetDateTime,
		end: OffsetDateTime,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		let query_vector = crate::embed_single(&self.providers, &self.embedding, query).await?;

		self.search_personal_by_date_range(tradition, user_id, query_vector, start, end, limit)
			.await
	}

	pub async fn hybrid_search_text(
		&self,
		tradition: &str,
		user_id: &str,
		query: &str,
		include_knowledge: bool,
		include_personal: bool,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		if !include_knowledge && !include_personal {
			return Ok(Vec::new());
		}

		let query_vector = crate::embed_single(&self.providers, &self.embedding, query).await?;

		self.hybrid_search(
			tradition,
			user_id,
			query_vector,
			include_knowledge,
			include_personal,
			limit,
		)
		.await
	}

	async fn search_personal_scoped(
		&self,
		tradition: &str,
		user_id: &str,
		query_vector: Vec<f32>,
		limit: u32,
		filter: MetadataFilter,
	) -> Result<Vec<SearchResult>> {
		let collection = personal_collection(tradition, user_id)?;

		self.check_dimension(&query_vector)?;

		if !self.collections.is_materialized(&collection).await? {
			tracing::debug!(collection = %collection, "No personal history yet.");

			return Ok(Vec::new());
		}

		let results = self
			.store
			.search(&collection, query_vector, self.effective_limit(limit), Some(&filter))
			.await?;

		Ok(results)
	}

	fn effective_limit(&self, limit: u32) -> u64 {
		if limit == 0 { u64::from(self.default_limit) } else { u64::from(limit) }
	}

	fn check_dimension(&self, query_vector: &[f32]) -> Result<()> {
		let expected = self.store.vector_dim() as usize;

		if query_vector.len() != expected {
			return Err(Error::DimensionMismatch { expected, actual: query_vector.len() });
		}

		Ok(())
	}
}

fn personal_filter() -> MetadataFilter {
	MetadataFilter::new().equals(FIELD_SOURCE_TYPE, SOURCE_TYPE_JOURNAL)
}
