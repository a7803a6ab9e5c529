use std::{path::PathBuf, sync::Arc};

use clap::{Parser, Subcommand};
use color_eyre::eyre;
use serde_json::{Map, Value};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use tracing_subscriber::EnvFilter;

use sage_retrieval::{DocumentIndexer, RetrievalEngine};
use sage_store::{manager::CollectionManager, qdrant::VectorStore};

#[derive(Debug, Parser)]
#[command(version, rename_all = "kebab")]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
	/// Embed and index a shared knowledge document for a tradition.
	IndexKnowledge {
		#[arg(long)]
		tradition: String,
		#[arg(long)]
		text: String,
		/// Extra payload fields as a JSON object.
		#[arg(long)]
		metadata: Option<String>,
	},
	/// Embed and index a private journal entry.
	IndexJournal {
		#[arg(long)]
		tradition: String,
		#[arg(long)]
		user: String,
		#[arg(long)]
		text: String,
		#[arg(long)]
		metadata: Option<String>,
	},
	/// Search the tradition's knowledge and, with --user, the user's
	/// journal; hybrid by default.
	Search {
		#[arg(long)]
		tradition: String,
		#[arg(long)]
		user: Option<String>,
		#[arg(long)]
		query: String,
		/// Skip the personal collection.
		#[arg(long, default_value_t = false)]
		knowledge_only: bool,
		/// Skip the knowledge collection; requires --user.
		#[arg(long, default_value_t = false)]
		personal_only: bool,
		/// Restrict journal hits to entries at or after this RFC 3339
		/// timestamp; requires --personal-only.
		#[arg(long)]
		since: Option<String>,
		/// Upper bound for --since; defaults to now.
		#[arg(long)]
		until: Option<String>,
		#[arg(long, default_value_t = 0)]
		limit: u32,
	},
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let cfg = sage_config::load(&args.config)?;

	init_tracing(&cfg);

	let store = Arc::new(VectorStore::new(&cfg.storage.qdrant)?);
	let collections = Arc::new(CollectionManager::new(store.clone()));

	match args.command {
		Command::IndexKnowledge { tradition, text, metadata } => {
			let indexer =
				DocumentIndexer::new(store, collections, cfg.providers.embedding.clone());
			let metadata = parse_metadata(metadata.as_deref())?;
			let id = indexer.index_knowledge_text(&tradition, &text, metadata).await?;

			println!("{}", serde_json::json!({ "id": id }));
		},
		Command::IndexJournal { tradition, user, text, metadata } => {
			let indexer =
				DocumentIndexer::new(store, collections, cfg.providers.embedding.clone());
			let metadata = parse_metadata(metadata.as_deref())?;
			let id = indexer.index_personal_text(&tradition, &user, &text, metadata).await?;

			println!("{}", serde_json::json!({ "id": id }));
		},
		Command::Search {
			tradition,
			user,
			query,
			knowledge_only,
			personal_only,
			since,
			until,
			limit,
		} => {
			if knowledge_only && personal_only {
				return Err(eyre::eyre!("--knowledge-only and --personal-only are exclusive."));
			}
			if personal_only && user.is_none() {
				return Err(eyre::eyre!("--personal-only requires --user."));
			}
			if (since.is_some() || until.is_some()) && !personal_only {
				return Err(eyre::eyre!("--since/--until require --personal-only."));
			}
			if until.is_some() && since.is_none() {
				return Err(eyre::eyre!("--until requires --since."));
			}

			let include_knowledge = !personal_only;
			let include_personal = !knowledge_only;

			let engine = RetrievalEngine::new(
				store,
				collections,
				cfg.providers.embedding.clone(),
				cfg.retrieval.default_limit,
			);
			let results = match (since, user.as_deref()) {
				(Some(since), Some(user)) => {
					let start = parse_timestamp(&since)?;
					let end = match until {
						Some(until) => parse_timestamp(&until)?,
						None => OffsetDateTime::now_utc(),
					};

					engine
						.search_personal_text_by_date_range(
							&tradition, user, &query, start, end, limit,
						)
						.await?
				},
				(Some(_), None) => unreachable!("--since requires --personal-only and --user."),
				(None, Some(user)) =>
					engine
						.hybrid_search_text(
							&tradition,
							user,
							&query,
							include_knowledge,
							include_personal,
							limit,
						)
						.await?,
				(None, None) => engine.search_knowledge_text(&tradition, &query, limit).await?,
			};

			for result in results {
				println!(
					"{}",
					serde_json::json!({
						"id": result.id,
						"score": result.score,
						"source_type": result.source_type(),
						"text": result.text(),
					})
				);
			}
		},
	}

	Ok(())
}

fn init_tracing(cfg: &sage_config::Config) {
	let filter =
		EnvFilter::try_new(&cfg.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn parse_metadata(raw: Option<&str>) -> color_eyre::Result<Map<String, Value>> {
	let Some(raw) = raw else {
		return Ok(Map::new());
	};
	let value: Value = serde_json::from_str(raw)?;

	match value {
		Value::Object(map) => Ok(map),
		_ => Err(eyre::eyre!("--metadata must be a JSON object.")),
	}
}

fn parse_timestamp(raw: &str) -> color_eyre::Result<OffsetDateTime> {
	OffsetDateTime::parse(raw, &Rfc3339)
		.map_err(|err| eyre::eyre!("Invalid RFC 3339 timestamp {raw:?}: {err}."))
}
