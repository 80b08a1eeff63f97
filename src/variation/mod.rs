//! Deterministic creative variation.
//!
//! Picks discrete parameters (cast, scene, framing, appearance, mood) from
//! small enumerated pools, keyed by a SHA-256 hash of a seed built from
//! mode, the stable brief fields and a per-request variation token —
//! reproducible for a fixed seed, different for a different token. The
//! recently-used history is injected by the caller, so selection stays a
//! pure function of its inputs.

use sha2::{Digest, Sha256};

use crate::campaign::CampaignBrief;

/// One pool of candidate descriptors for a parameter.
#[derive(Debug, Clone)]
pub struct Pool {
    pub name: &'static str,
    pub options: Vec<String>,
}

/// Enumerated pools for every creative parameter.
#[derive(Debug, Clone)]
pub struct VariationPools {
    pub cast: Pool,
    pub scene: Pool,
    pub framing: Pool,
    pub appearance: Pool,
    pub mood: Pool,
}

impl VariationPools {
    /// Stock pools used when a mode ships no custom ones.
    pub fn defaults() -> Self {
        let pool = |name: &'static str, options: &[&str]| Pool {
            name,
            options: options.iter().map(|s| s.to_string()).collect(),
        };
        Self {
            cast: pool(
                "cast",
                &[
                    "a young woman",
                    "a young man",
                    "a middle-aged woman",
                    "a middle-aged man",
                    "a couple",
                    "a small group of friends",
                ],
            ),
            scene: pool(
                "scene",
                &[
                    "a sunlit cafe",
                    "a city street at dusk",
                    "a minimalist studio",
                    "a cozy living room",
                    "an open-air market",
                    "a rooftop terrace",
                ],
            ),
            framing: pool(
                "framing",
                &["close-up", "medium shot", "wide shot", "over-the-shoulder"],
            ),
            appearance: pool(
                "appearance",
                &[
                    "casual outfit",
                    "smart casual outfit",
                    "sporty outfit",
                    "elegant outfit",
                ],
            ),
            mood: pool(
                "mood",
                &["warm and inviting", "energetic", "calm and focused", "playful"],
            ),
        }
    }
}

/// The chosen parameter set for one generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariationChoice {
    pub cast: String,
    pub scene: String,
    pub framing: String,
    pub appearance: String,
    pub mood: String,
}

/// Recently used identifiers for one owner+mode, most recent first.
/// Queried by the caller and injected here.
#[derive(Debug, Clone, Default)]
pub struct RecentChoices {
    pub cast: Vec<String>,
    pub scene: Vec<String>,
    pub framing: Vec<String>,
    pub appearance: Vec<String>,
    pub mood: Vec<String>,
}

fn hash_index(seed: &str, len: usize) -> usize {
    let digest = Sha256::digest(seed.as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    (u64::from_be_bytes(bytes) % len as u64) as usize
}

/// Pick one option from a pool.
///
/// Anti-repetition: prefer options absent from `recent`; if that empties
/// the pool, relax to excluding only the two most recent; if still empty,
/// use the full pool. An explicit `preference` filters the pool before
/// hashing; a filter that matches nothing is ignored rather than failing.
pub fn pick(pool: &Pool, seed: &str, recent: &[String], preference: Option<&str>) -> String {
    debug_assert!(!pool.options.is_empty());

    let used = |o: &str, window: &[String]| window.iter().any(|r| r == o);

    let filtered: Vec<&str> = match preference {
        Some(pref) => {
            let pref = pref.to_lowercase();
            let matching: Vec<&str> = pool
                .options
                .iter()
                .map(String::as_str)
                .filter(|o| o.to_lowercase().contains(&pref))
                .collect();
            if matching.is_empty() {
                pool.options.iter().map(String::as_str).collect()
            } else {
                matching
            }
        }
        None => pool.options.iter().map(String::as_str).collect(),
    };

    let fresh: Vec<&str> = filtered
        .iter()
        .copied()
        .filter(|o| !used(o, recent))
        .collect();
    let candidates = if !fresh.is_empty() {
        fresh
    } else {
        let two_most_recent = &recent[..recent.len().min(2)];
        let relaxed: Vec<&str> = filtered
            .iter()
            .copied()
            .filter(|o| !used(o, two_most_recent))
            .collect();
        if relaxed.is_empty() {
            filtered
        } else {
            relaxed
        }
    };

    let idx = hash_index(&format!("{}|{}", pool.name, seed), candidates.len());
    candidates[idx].to_string()
}

/// Build the seed string from the stable context fields.
pub fn build_seed(mode: Option<&str>, brief: &CampaignBrief, token: &str) -> String {
    format!(
        "{}|{}|{}|{}|{}",
        mode.unwrap_or("default"),
        brief.objective.as_deref().unwrap_or(""),
        brief.audience.as_deref().unwrap_or(""),
        brief.aspect_format.as_deref().unwrap_or(""),
        token,
    )
}

/// Select the full parameter set for one request.
pub fn select(
    pools: &VariationPools,
    seed: &str,
    recent: &RecentChoices,
    cast_preference: Option<&str>,
) -> VariationChoice {
    VariationChoice {
        cast: pick(&pools.cast, seed, &recent.cast, cast_preference),
        scene: pick(&pools.scene, seed, &recent.scene, None),
        framing: pick(&pools.framing, seed, &recent.framing, None),
        appearance: pick(&pools.appearance, seed, &recent.appearance, None),
        mood: pick(&pools.mood, seed, &recent.mood, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool(options: &[&str]) -> Pool {
        Pool {
            name: "cast",
            options: options.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_identical_seed_identical_pick() {
        let p = pool(&["a", "b", "c", "d"]);
        let first = pick(&p, "mode|leads|public|4:5|token-1", &[], None);
        let second = pick(&p, "mode|leads|public|4:5|token-1", &[], None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_token_change_usually_changes_pick() {
        let p = pool(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let baseline = pick(&p, "seed|token-0", &[], None);
        let changed = (1..=20)
            .map(|i| pick(&p, &format!("seed|token-{i}"), &[], None))
            .filter(|choice| *choice != baseline)
            .count();
        assert!(changed > 10, "only {changed}/20 picks differed");
    }

    #[test]
    fn test_never_picks_excluded_while_alternative_exists() {
        let p = pool(&["a", "b", "c"]);
        let recent = vec!["a".to_string(), "b".to_string()];
        for i in 0..50 {
            let choice = pick(&p, &format!("seed-{i}"), &recent, None);
            assert_eq!(choice, "c");
        }
    }

    #[test]
    fn test_exhausted_pool_relaxes_to_two_most_recent() {
        let p = pool(&["a", "b", "c"]);
        // Everything used; the two most recent are "a" then "b".
        let recent = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        for i in 0..50 {
            let choice = pick(&p, &format!("seed-{i}"), &recent, None);
            assert_eq!(choice, "c", "only the third-most-recent is eligible");
        }
    }

    #[test]
    fn test_fully_recent_small_pool_uses_full_pool() {
        let p = pool(&["a", "b"]);
        let recent = vec!["a".to_string(), "b".to_string()];
        let choice = pick(&p, "seed", &recent, None);
        assert!(p.options.contains(&choice));
    }

    #[test]
    fn test_preference_filters_pool() {
        let p = pool(&["a young woman", "a young man", "a couple"]);
        for i in 0..20 {
            let choice = pick(&p, &format!("seed-{i}"), &[], Some("woman"));
            assert_eq!(choice, "a young woman");
        }
    }

    #[test]
    fn test_unmatched_preference_is_ignored() {
        let p = pool(&["a", "b"]);
        let choice = pick(&p, "seed", &[], Some("robot"));
        assert!(p.options.contains(&choice));
    }

    #[test]
    fn test_select_is_reproducible() {
        let pools = VariationPools::defaults();
        let brief = CampaignBrief {
            objective: Some("leads".into()),
            audience: Some("general public".into()),
            aspect_format: Some("4:5".into()),
            ..Default::default()
        };
        let seed = build_seed(Some("lumen"), &brief, "token-42");
        let a = select(&pools, &seed, &RecentChoices::default(), None);
        let b = select(&pools, &seed, &RecentChoices::default(), None);
        assert_eq!(a, b);
    }
}
