// LLM provider layer

pub mod mistral;

pub use mistral::{choose_model, MistralClient};
