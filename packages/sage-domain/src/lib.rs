pub mod collection;
pub mod point;
pub mod ranking;

pub use collection::{InvalidIdentifier, knowledge_collection, personal_collection};
pub use point::{
	KnowledgePoint, PersonalPoint, Point, SOURCE_TYPE_JOURNAL, SOURCE_TYPE_KNOWLEDGE, SearchResult,
};
pub use ranking::rank;
