//! Search Module
//!
//! Web search and page extraction via the Tavily API:
//! - `search` finds candidate pages for a quota bucket's query
//! - `extract` pulls one page's content for cleaning and summarization

pub mod tavily;

pub use tavily::{SearchError, SearchHit, TavilyClient};
