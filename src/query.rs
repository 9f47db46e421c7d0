//! Search query construction
//!
//! Turns a subject name plus a quota bucket into the web-search query for
//! that bucket. A handful of category names are poor search terms on their
//! own ("party", "medias", ...) and get replaced by a friendlier phrase; the
//! base tier's screen keys get a phrase of their own. Everything else falls
//! back to `"<subject> <key>"`.

use crate::quota::Tier;

/// Category keys whose literal name searches badly, with the phrase used
/// instead. Applied on any tier.
const SPECIAL_QUERIES: &[(&str, &str)] = &[
    ("party", "party affiliation"),
    ("enterprises", "business ventures"),
    ("businesses", "business interests"),
    ("politicians", "political allies"),
    ("medias", "media coverage"),
    ("organizations", "affiliated organizations"),
];

/// Query phrases for the base tier's screen keys.
const BASE_SCREEN_QUERIES: &[(&str, &str)] = &[
    ("agenda_ppl", "political agenda"),
    ("identity", "who is"),
    ("affiliates", "political affiliations"),
];

fn lookup(table: &[(&str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// Build the search query for one quota bucket.
///
/// Special-category overrides win regardless of tier; hard and soft tiers
/// otherwise use the category name verbatim; the base tier uses its screen
/// phrases. Unrecognized keys degrade to the generic `"<subject> <key>"`
/// form rather than failing.
pub fn build_search_query(subject: &str, tier: Tier, key: &str) -> String {
    if let Some(phrase) = lookup(SPECIAL_QUERIES, key) {
        return format!("{subject} {phrase}");
    }

    match tier {
        Tier::Hard | Tier::Soft => format!("{subject} {key}"),
        Tier::Base => match lookup(BASE_SCREEN_QUERIES, key) {
            Some(phrase) => format!("{subject} {phrase}"),
            None => format!("{subject} {key}"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_category_appends_the_key() {
        assert_eq!(
            build_search_query("John Doe", Tier::Hard, "economy"),
            "John Doe economy"
        );
        assert_eq!(
            build_search_query("John Doe", Tier::Soft, "beliefs"),
            "John Doe beliefs"
        );
    }

    #[test]
    fn test_special_categories_use_their_phrase() {
        assert_eq!(
            build_search_query("John Doe", Tier::Hard, "party"),
            "John Doe party affiliation"
        );
        assert_eq!(
            build_search_query("John Doe", Tier::Hard, "medias"),
            "John Doe media coverage"
        );
        assert_eq!(
            build_search_query("John Doe", Tier::Soft, "enterprises"),
            "John Doe business ventures"
        );
    }

    #[test]
    fn test_special_override_applies_on_any_tier() {
        assert_eq!(
            build_search_query("John Doe", Tier::Base, "party"),
            "John Doe party affiliation"
        );
    }

    #[test]
    fn test_base_screens_use_their_phrase() {
        assert_eq!(
            build_search_query("John Doe", Tier::Base, "identity"),
            "John Doe who is"
        );
        assert_eq!(
            build_search_query("John Doe", Tier::Base, "agenda_ppl"),
            "John Doe political agenda"
        );
        assert_eq!(
            build_search_query("John Doe", Tier::Base, "affiliates"),
            "John Doe political affiliations"
        );
    }

    #[test]
    fn test_unknown_keys_fall_back_to_the_generic_form() {
        assert_eq!(
            build_search_query("John Doe", Tier::Base, "mystery"),
            "John Doe mystery"
        );
        assert_eq!(
            build_search_query("John Doe", Tier::Hard, "mystery"),
            "John Doe mystery"
        );
    }
}
