use anyhow::{anyhow, Result};
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub supabase: SupabaseConfig,
    pub search: SearchConfig,
    pub llm: LLMConfig,
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_role_key: String,
}

#[derive(Debug, Clone)]
pub struct SearchConfig {
    pub tavily_api_key: String,
    pub max_results: usize,
    pub max_pages: usize,
}

#[derive(Debug, Clone)]
pub struct LLMConfig {
    pub mistral_api_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            supabase: SupabaseConfig {
                url: required("SUPABASE_URL")?,
                service_role_key: required("SUPABASE_SERVICE_ROLE_KEY")?,
            },
            search: SearchConfig {
                tavily_api_key: required("TAVILY_API_KEY")?,
                max_results: env::var("TAVILY_MAX_RESULTS")
                    .unwrap_or_else(|_| "5".to_string())
                    .parse()?,
                max_pages: env::var("CARDGEN_MAX_PAGES")
                    .unwrap_or_else(|_| "3".to_string())
                    .parse()?,
            },
            llm: LLMConfig {
                mistral_api_key: required("MISTRAL_API_KEY")?,
            },
        })
    }
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|_| anyhow!("{name} must be set"))
}
