// Supabase PostgREST client
//
// All storage lives behind Supabase's REST surface, so this is a plain HTTP
// client like the search and LLM ones: service-role key in the `apikey` and
// `Authorization` headers, filters passed as query parameters
// (`column=eq.value`), inserts as JSON arrays with
// `Prefer: return=representation`.

use chrono::{DateTime, Utc};
use reqwest::Client;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::SupabaseConfig;
use crate::models::{Card, Subject};

/// Errors that can occur talking to the database API
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Database request failed: {0}")]
    RequestFailed(String),

    #[error("Database API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse database response: {0}")]
    ParseError(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, service_key: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// Configure client from config
    pub fn from_config(config: &SupabaseConfig) -> Self {
        Self::new(&config.url, &config.service_role_key)
    }

    fn request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/rest/v1/{}", self.base_url, table))
            .header("apikey", &self.service_key)
            .header("Authorization", format!("Bearer {}", self.service_key))
    }

    async fn get_rows<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, DbError> {
        let response = self
            .request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await
            .map_err(|e| DbError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DbError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| DbError::ParseError(e.to_string()))
    }

    /// Look up a tracked person by id
    pub async fn fetch_subject(&self, subject_id: i64) -> Result<Subject, DbError> {
        debug!(subject_id, "Fetching subject row");

        let rows: Vec<Subject> = self
            .get_rows(
                "ppl_index",
                &[
                    ("id", format!("eq.{subject_id}")),
                    ("select", "id,name,tier".to_string()),
                ],
            )
            .await?;

        rows.into_iter()
            .next()
            .ok_or_else(|| DbError::NotFound(format!("no tracked person with id {subject_id}")))
    }

    /// All active cards owned by a subject, used for quota counting
    pub async fn fetch_active_cards(&self, owner_id: i64) -> Result<Vec<Card>, DbError> {
        let cards: Vec<Card> = self
            .get_rows(
                "card_index",
                &[
                    ("owner_id", format!("eq.{owner_id}")),
                    ("is_ppl", "eq.true".to_string()),
                    ("is_active", "eq.true".to_string()),
                ],
            )
            .await?;

        debug!(owner_id, count = cards.len(), "Fetched active cards");
        Ok(cards)
    }

    /// Cards created at or after `cutoff`, used to seed deduplication
    pub async fn fetch_cards_since(
        &self,
        owner_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Card>, DbError> {
        let cards: Vec<Card> = self
            .get_rows(
                "card_index",
                &[
                    ("owner_id", format!("eq.{owner_id}")),
                    ("is_ppl", "eq.true".to_string()),
                    ("created_at", format!("gte.{}", cutoff.to_rfc3339())),
                ],
            )
            .await?;

        debug!(owner_id, count = cards.len(), "Fetched recent cards");
        Ok(cards)
    }

    /// Insert a batch of cards, returning the stored rows
    pub async fn insert_cards(&self, cards: &[Card]) -> Result<Vec<Card>, DbError> {
        if cards.is_empty() {
            return Ok(Vec::new());
        }

        let response = self
            .request(reqwest::Method::POST, "card_index")
            .header("Prefer", "return=representation")
            .json(&cards)
            .send()
            .await
            .map_err(|e| DbError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DbError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let inserted: Vec<Card> = response
            .json()
            .await
            .map_err(|e| DbError::ParseError(e.to_string()))?;

        info!(count = inserted.len(), "Inserted cards");
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_fetch_subject() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/ppl_index")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("id".into(), "eq.42".into()),
                Matcher::UrlEncoded("select".into(), "id,name,tier".into()),
            ]))
            .match_header("apikey", "service-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 42, "name": "John Doe", "tier": "hard"}]"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "service-key");
        let subject = client.fetch_subject(42).await.unwrap();

        assert_eq!(subject.name, "John Doe");
        assert_eq!(subject.tier, "hard");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_subject_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/ppl_index")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "service-key");
        let err = client.fetch_subject(7).await.unwrap_err();

        assert!(matches!(err, DbError::NotFound(_)));
        assert!(err.to_string().contains('7'));
    }

    #[tokio::test]
    async fn test_fetch_active_cards_filters_by_owner_and_activity() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/card_index")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("owner_id".into(), "eq.7".into()),
                Matcher::UrlEncoded("is_ppl".into(), "eq.true".into()),
                Matcher::UrlEncoded("is_active".into(), "eq.true".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"[
                    {"id": 1, "owner_id": 7, "title": "Card A", "category": "economy", "is_active": true},
                    {"id": 2, "owner_id": 7, "title": "Card B", "category": "donors", "is_active": true}
                ]"#,
            )
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "service-key");
        let cards = client.fetch_active_cards(7).await.unwrap();

        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Card A");
        assert_eq!(cards[1].category.as_deref(), Some("donors"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_cards_since_sends_a_created_at_filter() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/card_index")
            .match_query(Matcher::Regex("created_at=gte".to_string()))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 3, "title": "Recent Card"}]"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "service-key");
        let cutoff = Utc::now() - chrono::Duration::days(30);
        let cards = client.fetch_cards_since(7, cutoff).await.unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].title, "Recent Card");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_insert_cards_returns_stored_rows() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/v1/card_index")
            .match_header("Prefer", "return=representation")
            .match_header("authorization", "Bearer service-key")
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"id": 99, "owner_id": 7, "title": "New Card"}]"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "service-key");
        let mut card = Card::new("New Card");
        card.owner_id = Some(7);

        let inserted = client.insert_cards(&[card]).await.unwrap();

        assert_eq!(inserted.len(), 1);
        assert_eq!(inserted[0].id, Some(99));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_insert_of_an_empty_batch_skips_the_network() {
        // Unroutable base URL: the call must still succeed.
        let client = SupabaseClient::new("http://127.0.0.1:9", "service-key");
        let inserted = client.insert_cards(&[]).await.unwrap();
        assert!(inserted.is_empty());
    }

    #[tokio::test]
    async fn test_api_errors_surface_status_and_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rest/v1/card_index")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body(r#"{"message": "permission denied"}"#)
            .create_async()
            .await;

        let client = SupabaseClient::new(&server.url(), "wrong-key");
        let err = client.fetch_active_cards(7).await.unwrap_err();

        match err {
            DbError::Api { status, message } => {
                assert_eq!(status, 403);
                assert!(message.contains("permission denied"));
            }
            other => panic!("expected Api error, got {other:?}"),
        }
    }
}
