//! Card generation pipeline
//!
//! One linear pass per subject: work out which quota buckets are short,
//! search the web for each short bucket, extract and clean the top pages,
//! have Mistral draft cards from each page, then deduplicate the whole
//! batch against recently stored cards and insert what survives. Every
//! step awaits the previous one; a failing bucket is logged and skipped
//! rather than aborting the run.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::db::SupabaseClient;
use crate::dedup::deduplicate_cards;
use crate::llm::{choose_model, MistralClient};
use crate::models::{Card, CardDraft, Subject};
use crate::query::build_search_query;
use crate::quota::{self, calculate_deficits, screen_for_category, Tier};
use crate::search::TavilyClient;
use crate::text::{clean_text, slugify, trim_to_words};
use crate::types::{AppResult, LLMMessage, LLMRequest};

/// Existing cards younger than this seed the dedup set.
const RECENT_CARD_WINDOW_DAYS: i64 = 30;

const DRAFT_TEMPERATURE: f32 = 0.1;
const DRAFT_MAX_TOKENS: u32 = 5000;

const MAX_TITLE_WORDS: usize = 10;
const MAX_SUBTEXT_WORDS: usize = 20;

/// Hosts whose cards get the `is_media` flag.
const MEDIA_DOMAINS: &[&str] = &[
    "reuters.com",
    "apnews.com",
    "bbc.com",
    "thehill.com",
    "bloomberg.com",
    "axios.com",
    "afp.com",
    "dw.com",
    "cbc.ca",
    "abc.net.au",
    "snopes.com",
    "politifact.com",
    "fivethirtyeight.com",
    "yougov.com",
    "morningconsult.com",
    "gallup.com",
];

pub struct CardGenerator {
    db: SupabaseClient,
    search: TavilyClient,
    llm: MistralClient,
    max_pages_per_query: usize,
    tier_override: Option<Tier>,
    dry_run: bool,
}

/// Machine-readable summary of one run
#[derive(Debug, Serialize)]
pub struct GenerationReport {
    pub subject_id: i64,
    pub subject: String,
    pub tier: String,
    pub dry_run: bool,
    pub buckets: Vec<BucketOutcome>,
    /// Raw drafts the model produced, summed over all buckets
    pub drafted: usize,
    /// Drafts that survived ranking and the per-bucket cap
    pub selected: usize,
    pub unique: usize,
    pub inserted: usize,
}

/// What happened for one deficient quota bucket
#[derive(Debug, Serialize)]
pub struct BucketOutcome {
    pub key: String,
    pub needed: u32,
    pub query: String,
    pub pages_scanned: usize,
    pub drafted: usize,
    pub kept: usize,
}

impl CardGenerator {
    pub fn new(config: &Config) -> AppResult<Self> {
        Ok(Self {
            db: SupabaseClient::from_config(&config.supabase),
            search: TavilyClient::from_config(&config.search)?,
            llm: MistralClient::new(&config.llm.mistral_api_key),
            max_pages_per_query: config.search.max_pages,
            tier_override: None,
            dry_run: false,
        })
    }

    /// Run without inserting anything
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Use this tier instead of the one stored on the subject
    pub fn with_tier_override(mut self, tier: Tier) -> Self {
        self.tier_override = Some(tier);
        self
    }

    /// Generate cards for one tracked person until their tier quota is met
    /// (or the searched pages run out of usable material).
    pub async fn run_for_subject(&self, subject_id: i64) -> AppResult<GenerationReport> {
        let subject = self.db.fetch_subject(subject_id).await?;
        let tier = match self.tier_override {
            Some(tier) => tier,
            None => Tier::parse(&subject.tier)?,
        };

        info!(subject_id, name = %subject.name, tier = %tier, "Starting card generation");

        let active = self.db.fetch_active_cards(subject_id).await?;
        let counts = bucket_counts(tier, &active);
        let deficits = calculate_deficits(tier, &counts);

        if deficits.is_empty() {
            info!(subject_id, "All quota buckets are full");
            return Ok(GenerationReport {
                subject_id,
                subject: subject.name,
                tier: tier.to_string(),
                dry_run: self.dry_run,
                buckets: Vec::new(),
                drafted: 0,
                selected: 0,
                unique: 0,
                inserted: 0,
            });
        }

        let cutoff = Utc::now() - Duration::days(RECENT_CARD_WINDOW_DAYS);
        let recent = self.db.fetch_cards_since(subject_id, cutoff).await?;

        let mut batch: Vec<Card> = Vec::new();
        let mut buckets = Vec::new();

        // Walk buckets in the tier table's declared order so runs and logs
        // stay deterministic.
        for &key in tier.quota().names.iter() {
            let Some(&needed) = deficits.get(key) else {
                continue;
            };
            let outcome = self.fill_bucket(&subject, tier, key, needed, &mut batch).await;
            buckets.push(outcome);
        }

        let drafted: usize = buckets.iter().map(|b| b.drafted).sum();
        let selected = batch.len();
        let unique = deduplicate_cards(batch, &recent);
        let unique_count = unique.len();

        // Slugs are identity columns; one collision would fail the whole
        // batch insert, so claim them against everything already stored.
        let stored_slugs: HashSet<String> = active
            .iter()
            .chain(recent.iter())
            .filter_map(|c| c.slug.clone())
            .collect();
        let to_insert = claim_slugs(unique, stored_slugs);

        let inserted = if self.dry_run {
            info!(count = to_insert.len(), "Dry run: skipping insert");
            0
        } else {
            self.db.insert_cards(&to_insert).await?.len()
        };

        info!(
            subject_id,
            drafted,
            selected,
            unique = unique_count,
            inserted,
            "Card generation finished"
        );

        Ok(GenerationReport {
            subject_id,
            subject: subject.name,
            tier: tier.to_string(),
            dry_run: self.dry_run,
            buckets,
            drafted,
            selected,
            unique: unique_count,
            inserted,
        })
    }

    /// Search, extract, and draft cards for one short bucket. Failures are
    /// downgraded to warnings so the remaining buckets still run.
    async fn fill_bucket(
        &self,
        subject: &Subject,
        tier: Tier,
        key: &'static str,
        needed: u32,
        batch: &mut Vec<Card>,
    ) -> BucketOutcome {
        let query = build_search_query(&subject.name, tier, key);
        let mut outcome = BucketOutcome {
            key: key.to_string(),
            needed,
            query: query.clone(),
            pages_scanned: 0,
            drafted: 0,
            kept: 0,
        };

        let hits = match self.search.search(&query).await {
            Ok(hits) => hits,
            Err(e) => {
                warn!(bucket = key, error = %e, "Search failed; skipping bucket");
                return outcome;
            }
        };

        let mut drafts: Vec<(CardDraft, String)> = Vec::new();

        for hit in hits.iter().take(self.max_pages_per_query) {
            let raw = match self.search.extract(&hit.url).await {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(url = %hit.url, error = %e, "Extract failed; skipping page");
                    continue;
                }
            };

            let page = clean_text(&raw);
            if page.is_empty() {
                debug!(url = %hit.url, "Nothing left after cleaning; skipping page");
                continue;
            }

            let Some(model) = choose_model(page.len()) else {
                warn!(url = %hit.url, chars = page.len(), "Page too large for any model; skipping");
                continue;
            };

            outcome.pages_scanned += 1;

            match self.draft_cards(subject, tier, model, &page, &hit.url).await {
                Ok(page_drafts) => {
                    outcome.drafted += page_drafts.len();
                    drafts.extend(page_drafts.into_iter().map(|d| (d, hit.url.clone())));
                }
                Err(e) => warn!(url = %hit.url, error = %e, "Card drafting failed; skipping page"),
            }
        }

        for (draft, link) in select_drafts(drafts, needed) {
            batch.push(build_card(subject.id, tier, key, draft, &link));
            outcome.kept += 1;
        }

        debug!(
            bucket = key,
            drafted = outcome.drafted,
            kept = outcome.kept,
            "Bucket finished"
        );
        outcome
    }

    async fn draft_cards(
        &self,
        subject: &Subject,
        tier: Tier,
        model: &str,
        page: &str,
        link: &str,
    ) -> AppResult<Vec<CardDraft>> {
        let request = LLMRequest::new(
            model,
            vec![
                LLMMessage::system(Self::draft_system_prompt(tier)),
                LLMMessage::user(Self::draft_user_prompt(&subject.name, link, page)),
            ],
        )
        .with_temperature(DRAFT_TEMPERATURE)
        .with_max_tokens(DRAFT_MAX_TOKENS)
        .with_json_object();

        let response = self.llm.create_chat_completion(&request).await?;
        Ok(parse_card_drafts(&response.content))
    }

    fn draft_system_prompt(tier: Tier) -> String {
        format!(
            r#"You are a careful political analyst. Given a page about a politician, propose potential "cards".
Return ONLY JSON: {{"cards":[{{...}}]}}

Each card MUST include:
- "title": 5-10 words, neutral, specific to the page
- "subtext": 15-20 words, neutral, clear, upper-high-school reading level
- "category": one of the allowed categories below
- "score": integer 0-100 reflecting importance/relevance based on THIS page
- "confidence": number 0-1 indicating how well THIS page supports the card

Do NOT invent facts. Base all cards only on the given page.
Prefer distinct topics; avoid near-duplicates.
Allowed categories (by screen):
{allowed}"#,
            allowed = allowed_categories_json(tier)
        )
    }

    fn draft_user_prompt(full_name: &str, link: &str, page: &str) -> String {
        format!(
            r#"POLITICIAN: {full_name}

PAGE LINK: {link}

PAGE TEXT:
{page}

NOTES:
- Use neutral wording. Avoid hype or partisan framing.
- Do not quote headlines; use substance from the text."#
        )
    }
}

/// How many active cards each bucket already holds. Hard and soft quotas
/// bucket by category; the base quota buckets by screen.
fn bucket_counts(tier: Tier, cards: &[Card]) -> HashMap<String, u32> {
    let mut counts = HashMap::new();

    for card in cards {
        let bucket = match tier {
            Tier::Base => card.screen.as_deref(),
            Tier::Hard | Tier::Soft => card.category.as_deref(),
        };
        if let Some(bucket) = bucket {
            *counts.entry(bucket.to_string()).or_insert(0) += 1;
        }
    }

    counts
}

/// The tier's allowed categories grouped by screen, rendered as pretty JSON
/// for the drafting prompt.
fn allowed_categories_json(tier: Tier) -> String {
    let mut by_screen: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for &name in quota::allowed_categories(tier) {
        if let Some(screen) = screen_for_category(name) {
            by_screen.entry(screen).or_default().push(name);
        }
    }
    serde_json::to_string_pretty(&by_screen).unwrap_or_default()
}

#[derive(serde::Deserialize)]
struct DraftsEnvelope {
    #[serde(default)]
    cards: Vec<CardDraft>,
}

/// Pull the draft list out of a model response. Tolerates code fences
/// around the JSON; anything unparseable yields an empty list rather than
/// an error, and untitled drafts are dropped.
fn parse_card_drafts(response: &str) -> Vec<CardDraft> {
    let json_str = if response.contains("```json") {
        response
            .split("```json")
            .nth(1)
            .and_then(|s| s.split("```").next())
            .unwrap_or(response)
            .trim()
    } else if response.contains("```") {
        response.split("```").nth(1).unwrap_or(response).trim()
    } else {
        response.trim()
    };

    let envelope: DraftsEnvelope = match serde_json::from_str(json_str) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!(error = %e, "Failed to parse card drafts");
            return Vec::new();
        }
    };

    envelope
        .cards
        .into_iter()
        .filter(|d| !d.title.trim().is_empty())
        .collect()
}

/// Best drafts first: confidence, then score.
fn sort_drafts(drafts: &mut [(CardDraft, String)]) {
    drafts.sort_by(|(a, _), (b, _)| {
        b.confidence
            .unwrap_or(0.0)
            .total_cmp(&a.confidence.unwrap_or(0.0))
            .then(b.score.unwrap_or(0.0).total_cmp(&a.score.unwrap_or(0.0)))
    });
}

/// Rank a bucket's drafts best-first and cap the selection at the bucket's
/// shortfall.
fn select_drafts(mut drafts: Vec<(CardDraft, String)>, needed: u32) -> Vec<(CardDraft, String)> {
    sort_drafts(&mut drafts);
    drafts.truncate(needed as usize);
    drafts
}

/// Where a drafted card lands. Hard and soft buckets are categories, so the
/// bucket key wins outright; base buckets are screens, and the draft's own
/// category is kept when it belongs to that screen, falling back to the
/// screen's default otherwise.
fn place_card(tier: Tier, key: &'static str, draft_category: Option<&str>) -> (&'static str, &'static str) {
    match tier {
        Tier::Hard | Tier::Soft => {
            let screen = screen_for_category(key).unwrap_or("identity");
            (screen, key)
        }
        Tier::Base => {
            let screen = key;
            let category = draft_category
                .map(|c| c.trim().to_lowercase())
                .and_then(|c| {
                    quota::allowed_categories(Tier::Base)
                        .iter()
                        .copied()
                        .find(|&name| name == c && screen_for_category(name) == Some(screen))
                })
                .unwrap_or_else(|| default_category_for_screen(screen));
            (screen, category)
        }
    }
}

fn default_category_for_screen(screen: &str) -> &'static str {
    match screen {
        "agenda_ppl" => "economy",
        "affiliates" => "party",
        _ => "background",
    }
}

fn build_card(owner_id: i64, tier: Tier, key: &'static str, draft: CardDraft, link: &str) -> Card {
    let title = trim_to_words(&draft.title, MAX_TITLE_WORDS);
    let subtext = trim_to_words(&draft.subtext.unwrap_or_default(), MAX_SUBTEXT_WORDS);
    let (screen, category) = place_card(tier, key, draft.category.as_deref());
    let slug = slugify(&format!("{screen}:{category}:{title}"));

    let mut card = Card::new(title);
    card.owner_id = Some(owner_id);
    card.is_ppl = Some(true);
    card.screen = Some(screen.to_string());
    card.category = Some(category.to_string());
    card.subtext = (!subtext.is_empty()).then_some(subtext);
    card.slug = Some(slug);
    card.score = draft.score.map(|s| s.round() as i32);
    card.is_media = Some(is_media_link(link));
    card.link = (!link.is_empty()).then(|| link.to_string());
    card.is_active = Some(true);
    card.created_at = Some(Utc::now());
    card
}

/// True when the link's host (ignoring a leading `www.`) is one of the
/// known media domains or a subdomain of one.
fn is_media_link(link: &str) -> bool {
    let Ok(parsed) = url::Url::parse(link) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let host = host.strip_prefix("www.").unwrap_or(host);

    MEDIA_DOMAINS
        .iter()
        .any(|d| host == *d || host.ends_with(&format!(".{d}")))
}

/// Drop cards whose slug is already taken, either by a stored card or by an
/// earlier card in the same batch. Runs after title deduplication: distinct
/// titles can still collapse to one slug once punctuation is stripped and
/// long titles are trimmed.
fn claim_slugs(cards: Vec<Card>, stored: HashSet<String>) -> Vec<Card> {
    let mut claimed = stored;

    cards
        .into_iter()
        .filter(|card| match &card.slug {
            Some(slug) => claimed.insert(slug.clone()),
            None => true,
        })
        .collect()
}
