// Cardgen - search-and-summarize pipeline for political profile cards

pub mod config;
pub mod db;
pub mod dedup;
pub mod generator;
pub mod llm;
pub mod models;
pub mod query;
pub mod quota;
pub mod search;
pub mod text;
pub mod types;

// Re-exports for convenience
pub use config::Config;
pub use dedup::deduplicate_cards;
pub use generator::{CardGenerator, GenerationReport};
pub use models::{Card, CardDraft, Subject};
pub use query::build_search_query;
pub use quota::{calculate_deficits, Tier};
pub use text::clean_text;
// Note: Import specific items from types module instead of glob to avoid name conflicts
// e.g., use cardgen::types::{LLMRequest, LLMResponse, AppResult};
