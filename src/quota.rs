//! Tier quota policy
//!
//! Every tracked person carries a tier that fixes which buckets must stay
//! filled and how many cards each bucket targets:
//! - **hard**: high-coverage subjects, one bucket per detailed category
//! - **soft**: lighter coverage over a reduced category set
//! - **base**: minimal coverage, tracked per screen instead of per category
//!
//! The tables are compile-time constants; generation only ever reads them.

use std::collections::HashMap;

use crate::types::{AppError, AppResult};

/// Coverage tier of a tracked person.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Hard,
    Soft,
    Base,
}

/// Bucket name set and per-bucket card target for one tier.
#[derive(Debug, Clone, Copy)]
pub struct TierQuota {
    pub names: &'static [&'static str],
    pub target: u32,
}

const HARD_CATEGORIES: &[&str] = &[
    "economy",
    "immigration",
    "healthcare",
    "environment",
    "defense",
    "education",
    "background",
    "career",
    "public image",
    "accomplishments",
    "statements",
    "awards",
    "party",
    "organizations",
    "businesses",
    "politicians",
    "medias",
    "donors",
];

const SOFT_CATEGORIES: &[&str] = &[
    "economy",
    "social programs",
    "immigration",
    "national security",
    "background",
    "career",
    "public image",
    "beliefs",
    "party",
    "politicians",
    "enterprises",
    "donors",
];

/// The three profile screens cards are grouped under.
pub const SCREENS: &[&str] = &["agenda_ppl", "identity", "affiliates"];

const HARD_QUOTA: TierQuota = TierQuota {
    names: HARD_CATEGORIES,
    target: 10,
};

const SOFT_QUOTA: TierQuota = TierQuota {
    names: SOFT_CATEGORIES,
    target: 6,
};

const BASE_QUOTA: TierQuota = TierQuota {
    names: SCREENS,
    target: 10,
};

impl Tier {
    /// Parse a stored tier name. The tier sets are fixed constants, so an
    /// unknown name is an error rather than an empty quota.
    pub fn parse(s: &str) -> AppResult<Tier> {
        match s.to_ascii_lowercase().as_str() {
            "hard" => Ok(Tier::Hard),
            "soft" => Ok(Tier::Soft),
            "base" => Ok(Tier::Base),
            other => Err(AppError::InvalidRequest(format!("unknown tier: {other}"))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hard => "hard",
            Tier::Soft => "soft",
            Tier::Base => "base",
        }
    }

    pub fn quota(&self) -> &'static TierQuota {
        match self {
            Tier::Hard => &HARD_QUOTA,
            Tier::Soft => &SOFT_QUOTA,
            Tier::Base => &BASE_QUOTA,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Shortfall per bucket: `target - have` for every configured bucket still
/// below target. Buckets at or above target are absent from the result, so
/// every returned value is strictly positive. Counts under names outside the
/// tier's configured set are ignored.
pub fn calculate_deficits(
    tier: Tier,
    current_counts: &HashMap<String, u32>,
) -> HashMap<&'static str, u32> {
    let quota = tier.quota();
    let mut deficits = HashMap::new();

    for &name in quota.names {
        let have = current_counts.get(name).copied().unwrap_or(0);
        if have < quota.target {
            deficits.insert(name, quota.target - have);
        }
    }

    deficits
}

/// Categories the summarizer may label cards with on a tier. The base tier
/// shares the soft tier's category set; its quota buckets are screens, but
/// its cards still carry soft-set categories.
pub fn allowed_categories(tier: Tier) -> &'static [&'static str] {
    match tier {
        Tier::Hard => HARD_CATEGORIES,
        Tier::Soft | Tier::Base => SOFT_CATEGORIES,
    }
}

/// Screen a category's cards land on. Screen names map to themselves, so
/// base-tier bucket keys pass through unchanged.
pub fn screen_for_category(category: &str) -> Option<&'static str> {
    const AGENDA: &[&str] = &[
        "economy",
        "immigration",
        "healthcare",
        "environment",
        "defense",
        "education",
        "social programs",
        "national security",
    ];
    const IDENTITY: &[&str] = &[
        "background",
        "career",
        "public image",
        "accomplishments",
        "statements",
        "awards",
        "beliefs",
    ];
    const AFFILIATES: &[&str] = &[
        "party",
        "organizations",
        "businesses",
        "politicians",
        "medias",
        "donors",
        "enterprises",
    ];

    if let Some(screen) = SCREENS.iter().copied().find(|s| *s == category) {
        return Some(screen);
    }
    if AGENDA.contains(&category) {
        Some("agenda_ppl")
    } else if IDENTITY.contains(&category) {
        Some("identity")
    } else if AFFILIATES.contains(&category) {
        Some("affiliates")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counts(pairs: &[(&str, u32)]) -> HashMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_hard_tier_deficits() {
        let current = counts(&[("economy", 3), ("immigration", 10), ("healthcare", 0)]);
        let deficits = calculate_deficits(Tier::Hard, &current);

        assert_eq!(deficits.get("economy"), Some(&7));
        // At target: not reported.
        assert!(!deficits.contains_key("immigration"));
        assert_eq!(deficits.get("healthcare"), Some(&10));
        // Categories absent from the counts owe the full target.
        assert_eq!(deficits.get("donors"), Some(&10));
        assert!(deficits.values().all(|&d| d > 0));
    }

    #[test]
    fn test_soft_tier_deficits() {
        let current = counts(&[("economy", 2), ("social programs", 6)]);
        let deficits = calculate_deficits(Tier::Soft, &current);

        assert_eq!(deficits.get("economy"), Some(&4));
        assert!(!deficits.contains_key("social programs"));
    }

    #[test]
    fn test_base_tier_deficits_with_no_cards() {
        let deficits = calculate_deficits(Tier::Base, &HashMap::new());

        assert_eq!(deficits.len(), 3);
        assert_eq!(deficits.get("agenda_ppl"), Some(&10));
        assert_eq!(deficits.get("identity"), Some(&10));
        assert_eq!(deficits.get("affiliates"), Some(&10));
    }

    #[test]
    fn test_over_target_counts_are_not_reported() {
        let current = counts(&[("economy", 25)]);
        let deficits = calculate_deficits(Tier::Hard, &current);
        assert!(!deficits.contains_key("economy"));
    }

    #[test]
    fn test_counts_outside_the_tier_set_are_ignored() {
        // "healthcare" is a hard category, not a soft one.
        let current = counts(&[("healthcare", 3), ("not a category", 99)]);
        let deficits = calculate_deficits(Tier::Soft, &current);

        assert!(!deficits.contains_key("healthcare"));
        assert!(!deficits.contains_key("not a category"));
        assert_eq!(deficits.len(), Tier::Soft.quota().names.len());
    }

    #[test]
    fn test_quota_table_shapes() {
        assert_eq!(Tier::Hard.quota().names.len(), 18);
        assert_eq!(Tier::Hard.quota().target, 10);
        assert_eq!(Tier::Soft.quota().names.len(), 12);
        assert_eq!(Tier::Soft.quota().target, 6);
        assert_eq!(Tier::Base.quota().names.len(), 3);
        assert_eq!(Tier::Base.quota().target, 10);
    }

    #[test]
    fn test_tier_parse_round_trip() {
        for tier in [Tier::Hard, Tier::Soft, Tier::Base] {
            assert_eq!(Tier::parse(tier.as_str()).unwrap(), tier);
        }
        assert_eq!(Tier::parse("HARD").unwrap(), Tier::Hard);
    }

    #[test]
    fn test_tier_parse_rejects_unknown_names() {
        let err = Tier::parse("platinum").unwrap_err();
        assert!(err.to_string().contains("platinum"));
    }

    #[test]
    fn test_screen_for_category() {
        assert_eq!(screen_for_category("economy"), Some("agenda_ppl"));
        assert_eq!(screen_for_category("beliefs"), Some("identity"));
        assert_eq!(screen_for_category("donors"), Some("affiliates"));
        // Screen names pass through for base-tier buckets.
        assert_eq!(screen_for_category("identity"), Some("identity"));
        assert_eq!(screen_for_category("unknown"), None);
    }

    #[test]
    fn test_every_quota_category_maps_to_a_screen() {
        for tier in [Tier::Hard, Tier::Soft, Tier::Base] {
            for name in tier.quota().names {
                assert!(
                    screen_for_category(name).is_some(),
                    "no screen for {name}"
                );
            }
        }
    }

    #[test]
    fn test_base_tier_shares_the_soft_category_set() {
        assert_eq!(allowed_categories(Tier::Base), allowed_categories(Tier::Soft));
        assert_eq!(allowed_categories(Tier::Hard).len(), 18);
    }
}
