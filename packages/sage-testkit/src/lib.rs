mod error;

pub use error::{Error, Result};

use std::{
	collections::HashSet,
	env,
	sync::Mutex,
	thread,
	time::Duration,
};

use qdrant_client::Qdrant;
use tokio::{runtime::Builder, time};
use uuid::Uuid;

/// Unique identifiers and collection tracking for tests that talk to a
/// live Qdrant. Tradition/user identifiers minted here carry a random
/// suffix so parallel test runs never share collections; every derived
/// collection name must be `track`ed so cleanup can delete it.
pub struct TestCollections {
	qdrant_url: String,
	suffix: String,
	cleaned: bool,
	collections: Mutex<HashSet<String>>,
}
impl TestCollections {
	pub fn new(qdrant_url: &str) -> Self {
		Self {
			qdrant_url: qdrant_url.to_string(),
			suffix: Uuid::new_v4().simple().to_string(),
			cleaned: false,
			collections: Mutex::new(HashSet::new()),
		}
	}

	pub fn qdrant_url(&self) -> &str {
		&self.qdrant_url
	}

	/// A unique identifier safe for collection naming: no `_`, so the
	/// tradition/user naming scheme accepts it.
	pub fn identifier(&self, prefix: &str) -> String {
		format!("{prefix}{}", self.suffix)
	}

	pub fn track(&self, collection: &str) {
		let mut tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

		tracked.insert(collection.to_string());
	}

	pub async fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner().await
	}

	async fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		let collections = {
			let tracked = self.collections.lock().unwrap_or_else(|err| err.into_inner());

			tracked.iter().cloned().collect::<Vec<_>>()
		};

		cleanup_collections(&self.qdrant_url, &collections).await?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestCollections {
	fn drop(&mut self) {
		if self.cleaned {
			return;
		}

		let qdrant_url = self.qdrant_url.clone();
		let collections = self
			.collections
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.iter()
			.cloned()
			.collect::<Vec<_>>();
		let cleanup_thread = thread::spawn(move || {
			let runtime = match Builder::new_current_thread().enable_all().build() {
				Ok(runtime) => runtime,
				Err(err) => {
					eprintln!("Test collection cleanup failed: {err}.");

					return;
				},
			};

			if let Err(err) = runtime.block_on(cleanup_collections(&qdrant_url, &collections)) {
				eprintln!("Test collection cleanup failed: {err}.");
			}
		});
		let _ = cleanup_thread.join();
	}
}

pub fn env_qdrant_url() -> Option<String> {
	env::var("SAGE_QDRANT_URL").ok()
}

async fn cleanup_collections(qdrant_url: &str, collections: &[String]) -> Result<()> {
	if collections.is_empty() {
		return Ok(());
	}

	let client = Qdrant::from_url(qdrant_url)
		.build()
		.map_err(|err| Error::Message(format!("Failed to build Qdrant client: {err}.")))?;
	let max_attempts = 6;
	let mut remaining = collections.iter().cloned().collect::<HashSet<_>>();
	let mut backoff = Duration::from_millis(100);

	for attempt in 1..=max_attempts {
		let existing = time::timeout(Duration::from_secs(10), client.list_collections())
			.await
			.map_err(|_| Error::Message("Qdrant list_collections timed out.".to_string()))?
			.map_err(|err| Error::Message(format!("Failed to list Qdrant collections: {err}.")))?;
		let existing = existing.collections.into_iter().map(|c| c.name).collect::<HashSet<_>>();

		remaining.retain(|collection| existing.contains(collection));

		if remaining.is_empty() {
			return Ok(());
		}

		for collection in remaining.iter().cloned().collect::<Vec<_>>() {
			let result = time::timeout(
				Duration::from_secs(10),
				client.delete_collection(collection.clone()),
			)
			.await;

			match result {
				Ok(Ok(_)) => {},
				Ok(Err(err)) =>
					if attempt == max_attempts {
						return Err(Error::Message(format!(
							"Failed to delete Qdrant collection {collection:?} after {attempt} attempts: {err}."
						)));
					},
				Err(_) =>
					if attempt == max_attempts {
						return Err(Error::Message(format!(
							"Timed out deleting Qdrant collection {collection:?} after {attempt} attempts."
						)));
					},
			}
		}

		time::sleep(backoff).await;

		backoff = backoff.saturating_mul(2).min(Duration::from_secs(2));
	}

	Ok(())
}
