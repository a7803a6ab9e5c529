use std::sync::Arc;

use serde_json::{Map, Value};
use time::OffsetDateTime;
use uuid::Uuid;

use sage_config::EmbeddingProviderConfig;
use sage_domain::{KnowledgePoint, PersonalPoint, Point, knowledge_collection, personal_collection};
use sage_store::{manager::CollectionManager, qdrant::VectorStore};

use crate::{Error, Providers, Result};

/// Turns documents into persisted points: resolves the target
/// collection, ensures it exists, stamps provenance, mints fresh UUIDs
/// and writes one upsert per call. All argument validation happens
/// before the first network call.
pub struct DocumentIndexer {
	store: Arc<VectorStore>,
	collections: Arc<CollectionManager>,
	providers: Providers,
	embedding: EmbeddingProviderConfig,
}
impl DocumentIndexer {
	pub fn new(
		store: Arc<VectorStore>,
		collections: Arc<CollectionManager>,
		embedding: EmbeddingProviderConfig,
	) -> Self {
		Self { store, collections, providers: Providers::default(), embedding }
	}

	pub fn with_providers(
		store: Arc<VectorStore>,
		collections: Arc<CollectionManager>,
		embedding: EmbeddingProviderConfig,
		providers: Providers,
	) -> Self {
		Self { store, collections, providers, embedding }
	}

	pub async fn index_knowledge_document(
		&self,
		tradition: &str,
		text: &str,
		embedding: Vec<f32>,
		metadata: Map<String, Value>,
	) -> Result<Uuid> {
		let mut ids = self
			.index_knowledge_batch(tradition, &[text.to_string()], vec![embedding], vec![metadata])
			.await?;

		Ok(ids.remove(0))
	}

	/// One point per input, one upsert for the whole batch; a rejected
	/// batch leaves zero points behind.
	pub async fn index_knowledge_batch(
		&self,
		tradition: &str,
		texts: &[String],
		embeddings: Vec<Vec<f32>>,
		metadatas: Vec<Map<String, Value>>,
	) -> Result<Vec<Uuid>> {
		if texts.len() != embeddings.len() || texts.len() != metadatas.len() {
			return Err(Error::InvalidInput {
				message: format!(
					"Batch length mismatch: {} texts, {} embeddings, {} metadata entries.",
					texts.len(),
					embeddings.len(),
					metadatas.len()
				),
			});
		}

		let collection = knowledge_collection(tradition)?;

		for embedding in &embeddings {
			self.check_dimension(embedding)?;
		}

		let mut points = Vec::with_capacity(texts.len());

		for ((text, embedding), metadata) in texts.iter().zip(embeddings).zip(metadatas) {
			let payload = KnowledgePoint { text: text.clone(), metadata }.into_payload();

			points.push(Point { id: Uuid::new_v4(), vector: embedding, payload });
		}

		let ids: Vec<Uuid> = points.iter().map(|point| point.id).collect();

		self.collections.ensure(&collection, self.store.vector_dim()).await?;
		self.store.upsert(&collection, points).await?;

		tracing::info!(collection = %collection, count = ids.len(), "Indexed knowledge documents.");

		Ok(ids)
	}

	pub async fn index_personal_document(
		&self,
		tradition: &str,
		user_id: &str,
		text: &str,
		embedding: Vec<f32>,
		metadata: Map<String, Value>,
	) -> Result<Uuid> {
		let collection = personal_collection(tradition, user_id)?;

		self.check_dimension(&embedding)?;

		let entry = PersonalPoint {
			text: text.to_string(),
			user_id: user_id.to_string(),
			timestamp: OffsetDateTime::now_utc(),
			metadata,
		};
		let payload = entry
			.into_payload()
			.map_err(|err| Error::InvalidInput { message: err.to_string() })?;
		let point = Point { id: Uuid::new_v4(), vector: embedding, payload };
		let id = point.id;

		self.collections.ensure(&collection, self.store.vector_dim()).await?;
		self.store.upsert(&collection, vec![point]).await?;

		tracing::info!(collection = %collection, "Indexed personal document.");

		Ok(id)
	}

	pub async fn index_knowledge_text(
		&self,
		tradition: &str,
		text: &str,
		metadata: Map<String, Value>,
	) -> Result<Uuid> {
		let embedding = crate::embed_single(&self.providers, &self.embedding, text).await?;

		self.index_knowledge_document(tradition, text, embedding, metadata).await
	}

	pub async fn index_knowledge_texts(
		&self,
		tradition: &str,
		texts: &[String],
		metadatas: Vec<Map<String, Value>>,
	) -> Result<Vec<Uuid>> {
		let embeddings = crate::embed_texts(&self.providers, &self.embedding, texts).await?;

		self.index_knowledge_batch(tradition, texts, embeddings, metadatas).await
	}

	pub async fn index_personal_text(
		&self,
		tradition: &str,
		user_id: &str,
		text: &str,
		metadata: Map<String, Value>,
	) -> Result<Uuid> {
		let embedding = crate::embed_single(&self.providers, &self.embedding, text).await?;

		self.index_personal_document(tradition, user_id, text, embedding, metadata).await
	}

	fn check_dimension(&self, embedding: &[f32]) -> Result<()> {
		let expected = self.store.vector_dim() as usize;

		if embedding.len() != expected {
			return Err(Error::DimensionMismatch { expected, actual: embedding.len() });
		}

		Ok(())
	}
}
