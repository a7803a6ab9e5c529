use std::{
	collections::HashSet,
	sync::{Arc, Mutex},
};

use crate::{Result, qdrant::VectorStore};

/// Get-or-create gate in front of every collection read and write.
///
/// Confirmed names are cached for the process lifetime so the common
/// path costs one lock. Concurrent `ensure` calls for the same name may
/// race the exists check against create; that is tolerated because
/// collection creation is idempotent backend-side, so no lock spans the
/// network calls.
pub struct CollectionManager {
	store: Arc<VectorStore>,
	known: Mutex<HashSet<String>>,
}
impl CollectionManager {
	pub fn new(store: Arc<VectorStore>) -> Self {
		Self { store, known: Mutex::new(HashSet::new()) }
	}

	pub async fn ensure(&self, name: &str, dim: u32) -> Result<()> {
		if self.is_known(name) {
			return Ok(());
		}
		if self.store.exists(name).await? {
			self.mark_known(name);

			return Ok(());
		}

		self.store.create(name, dim).await?;

		tracing::info!(collection = name, dim, "Created vector collection.");

		self.mark_known(name);

		Ok(())
	}

	/// Existence probe for read paths that must not create: an absent
	/// personal collection is a normal state, not a reason to write.
	pub async fn is_materialized(&self, name: &str) -> Result<bool> {
		if self.is_known(name) {
			return Ok(true);
		}

		let exists = self.store.exists(name).await?;

		if exists {
			self.mark_known(name);
		}

		Ok(exists)
	}

	fn is_known(&self, name: &str) -> bool {
		self.known.lock().unwrap_or_else(|err| err.into_inner()).contains(name)
	}

	fn mark_known(&self, name: &str) {
		self.known.lock().unwrap_or_else(|err| err.into_inner()).insert(name.to_string());
	}
}
