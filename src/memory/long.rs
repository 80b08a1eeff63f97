//! Long-term memory: durable records with hybrid retrieval.
//!
//! Retrieval blends cosine similarity, a lexical token-overlap ratio over
//! stopword-filtered query tokens, and an exponential recency decay. The
//! keyword leg runs whenever the query yields at least one significant
//! token; the rerank pool interleaves the top vector and top keyword hits
//! so each leg is represented. When the vector backend is unavailable the
//! store degrades to lexical+recency and never raises.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::db::connection::ConciergeDb;
use crate::models::memory::{create_memory_record, MemoryRecordCreate};
use crate::models::Role;
use crate::services::completion::CompletionService;
use crate::ConciergeError;

use super::normalize_dimension;

/// Blend weights when at least one vector hit exists.
const VECTOR_WEIGHT: f32 = 0.72;
const LEXICAL_WEIGHT: f32 = 0.22;
const RECENCY_WEIGHT: f32 = 1.0 - VECTOR_WEIGHT - LEXICAL_WEIGHT;

/// Blend weights when retrieval is lexical-only.
const LEXICAL_ONLY_WEIGHT: f32 = 0.85;
const LEXICAL_ONLY_RECENCY_WEIGHT: f32 = 1.0 - LEXICAL_ONLY_WEIGHT;

/// Recency half-life in hours.
const RECENCY_HALF_LIFE_HOURS: f32 = 72.0;

/// Candidate pool bound, as a multiple of the requested count.
const CANDIDATE_MULTIPLE: usize = 4;

/// Tokens shorter than this never count as significant.
const MIN_TOKEN_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "was", "are", "have", "has", "had", "you",
    "your", "our", "their", "about", "what", "when", "where", "which", "who", "how", "did",
    "does", "can", "could", "would", "should", "will", "there", "from", "into", "then", "than",
    "them", "they", "she", "her", "his", "him", "its", "were", "been", "being", "but", "not",
    "all", "any", "some", "out", "get", "got", "just", "also", "too", "very",
];

/// Whether the vector-similarity backend is usable. Resolved once at
/// construction and passed in explicitly; no process-wide state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorCapability {
    Available,
    Unavailable,
}

impl VectorCapability {
    pub fn is_available(&self) -> bool {
        matches!(self, VectorCapability::Available)
    }
}

/// A record surfaced by hybrid retrieval.
#[derive(Debug, Clone)]
pub struct RetrievedMemory {
    pub id: String,
    pub role: Role,
    pub content: String,
    /// Blended rank score.
    pub score: f32,
    /// Raw cosine similarity (0.0 when the record had no vector hit).
    pub similarity: f32,
    pub created_at: DateTime<Utc>,
}

/// Data for indexing one turn into long memory.
pub struct MemoryIndexRequest {
    pub owner: String,
    pub session: Option<surrealdb::RecordId>,
    pub role: Role,
    pub content: String,
    pub mode: Option<String>,
}

/// A rerank candidate before blending.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub id: String,
    pub role: Role,
    pub content: String,
    pub similarity: Option<f32>,
    pub created_at: DateTime<Utc>,
}

/// Extract stopword-filtered significant tokens from a query.
pub fn significant_tokens(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= MIN_TOKEN_LEN && !STOPWORDS.contains(t))
        .filter(|t| seen.insert(t.to_string()))
        .map(String::from)
        .collect()
}

/// Fraction of query tokens present in the content's token set.
pub fn lexical_overlap(query_tokens: &[String], content: &str) -> f32 {
    if query_tokens.is_empty() {
        return 0.0;
    }
    let content_tokens: HashSet<String> = content
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect();
    let hits = query_tokens
        .iter()
        .filter(|t| content_tokens.contains(*t))
        .count();
    hits as f32 / query_tokens.len() as f32
}

fn recency_factor(created_at: DateTime<Utc>, now: DateTime<Utc>) -> f32 {
    let age_hours = (now - created_at).num_minutes().max(0) as f32 / 60.0;
    0.5_f32.powf(age_hours / RECENCY_HALF_LIFE_HOURS)
}

/// Blend and rank a candidate pool.
///
/// Weights: 0.72 cosine + 0.22 lexical + recency remainder when any vector
/// hit exists; otherwise lexical dominates at 0.85 with recency taking the
/// rest. Order: blended score desc, tie-break by raw similarity, then by
/// creation recency.
pub fn blend_candidates(
    candidates: Vec<Candidate>,
    query_tokens: &[String],
    now: DateTime<Utc>,
) -> Vec<RetrievedMemory> {
    let any_vector = candidates.iter().any(|c| c.similarity.is_some());
    let (w_vec, w_lex, w_rec) = if any_vector {
        (VECTOR_WEIGHT, LEXICAL_WEIGHT, RECENCY_WEIGHT)
    } else {
        (0.0, LEXICAL_ONLY_WEIGHT, LEXICAL_ONLY_RECENCY_WEIGHT)
    };

    let mut ranked: Vec<RetrievedMemory> = candidates
        .into_iter()
        .map(|c| {
            let similarity = c.similarity.unwrap_or(0.0);
            let lexical = lexical_overlap(query_tokens, &c.content);
            let recency = recency_factor(c.created_at, now);
            RetrievedMemory {
                id: c.id,
                role: c.role,
                content: c.content,
                score: w_vec * similarity + w_lex * lexical + w_rec * recency,
                similarity,
                created_at: c.created_at,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                b.similarity
                    .partial_cmp(&a.similarity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
    ranked
}

/// Merge the two retrieval legs into one bounded pool.
///
/// Legs are interleaved pairwise so a full vector leg can never crowd every
/// keyword hit out of the pool (and vice versa). Records present in both
/// legs keep their cosine similarity regardless of which copy survived
/// dedup.
pub fn merge_candidate_legs(
    vector_hits: Vec<Candidate>,
    keyword_hits: Vec<Candidate>,
    pool_size: usize,
) -> Vec<Candidate> {
    let similarities: std::collections::HashMap<String, f32> = vector_hits
        .iter()
        .filter_map(|c| c.similarity.map(|s| (c.id.clone(), s)))
        .collect();

    let mut seen = HashSet::new();
    let mut pool: Vec<Candidate> = Vec::new();
    let mut vector_iter = vector_hits.into_iter();
    let mut keyword_iter = keyword_hits.into_iter();
    loop {
        if pool.len() >= pool_size {
            break;
        }
        match (vector_iter.next(), keyword_iter.next()) {
            (None, None) => break,
            (v, k) => {
                for candidate in [v, k].into_iter().flatten() {
                    if pool.len() < pool_size && seen.insert(candidate.id.clone()) {
                        pool.push(candidate);
                    }
                }
            }
        }
    }

    for candidate in pool.iter_mut() {
        if candidate.similarity.is_none() {
            candidate.similarity = similarities.get(&candidate.id).copied();
        }
    }
    pool
}

#[derive(Debug, Deserialize)]
struct CandidateRow {
    id: surrealdb::RecordId,
    role: Role,
    content: String,
    #[serde(default)]
    similarity: Option<f32>,
    created_at: surrealdb::Datetime,
}

impl CandidateRow {
    fn into_candidate(self) -> Candidate {
        Candidate {
            id: self.id.to_string(),
            role: self.role,
            content: self.content,
            similarity: self.similarity,
            created_at: DateTime::<Utc>::from(self.created_at.into_inner()),
        }
    }
}

/// Durable long-term memory store.
pub struct LongMemory {
    db: Arc<ConciergeDb>,
    completion: Arc<dyn CompletionService>,
    vector: VectorCapability,
}

impl LongMemory {
    pub fn new(
        db: Arc<ConciergeDb>,
        completion: Arc<dyn CompletionService>,
        vector: VectorCapability,
    ) -> Self {
        Self {
            db,
            completion,
            vector,
        }
    }

    pub fn vector_capability(&self) -> VectorCapability {
        self.vector
    }

    /// Index one turn. Embedding failures downgrade to a lexical-only
    /// record instead of failing the write.
    pub async fn index(&self, request: MemoryIndexRequest) -> Result<(), ConciergeError> {
        let embedding = if self.vector.is_available() {
            match self.completion.embed(&request.content).await {
                Ok(vector) => Some(normalize_dimension(vector)),
                Err(e) => {
                    tracing::warn!("Embedding failed, indexing without vector: {}", e);
                    None
                }
            }
        } else {
            None
        };

        create_memory_record(
            &self.db,
            MemoryRecordCreate {
                owner: request.owner,
                session: request.session,
                role: request.role,
                content: request.content,
                mode: request.mode,
                embedding,
                metadata: None,
            },
        )
        .await?;
        Ok(())
    }

    /// Hybrid recall: top vector and top keyword hits interleaved into a
    /// bounded pool, blended and truncated to `limit`.
    pub async fn recall(
        &self,
        owner: &str,
        mode: Option<&str>,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RetrievedMemory>, ConciergeError> {
        let query_tokens = significant_tokens(query);
        let pool_size = limit.max(1) * CANDIDATE_MULTIPLE;

        let vector_hits = if self.vector.is_available() {
            match self.vector_candidates(owner, mode, query, pool_size).await {
                Ok(hits) => hits,
                Err(e) => {
                    // Degrade to lexical+recency, never raise.
                    tracing::warn!("Vector retrieval failed, degrading to lexical: {}", e);
                    Vec::new()
                }
            }
        } else {
            Vec::new()
        };

        let keyword_hits = if query_tokens.is_empty() {
            Vec::new()
        } else {
            self.keyword_candidates(owner, mode, &query_tokens, pool_size)
                .await?
        };

        let pool = merge_candidate_legs(vector_hits, keyword_hits, pool_size);
        let mut ranked = blend_candidates(pool, &query_tokens, Utc::now());
        ranked.truncate(limit);
        Ok(ranked)
    }

    async fn vector_candidates(
        &self,
        owner: &str,
        mode: Option<&str>,
        query: &str,
        k: usize,
    ) -> Result<Vec<Candidate>, ConciergeError> {
        let query_vector = normalize_dimension(self.completion.embed(query).await?);

        let mode_clause = if mode.is_some() { " AND mode = $mode" } else { "" };
        let sql = format!(
            "SELECT id, role, content, created_at, \
             vector::similarity::cosine(embedding, $query_vector) AS similarity \
             FROM memory_record \
             WHERE owner = $owner AND embedding IS NOT NONE{mode_clause} \
             ORDER BY similarity DESC LIMIT {k}"
        );

        let mut builder = self
            .db
            .query(sql)
            .bind(("owner", owner.to_string()))
            .bind(("query_vector", query_vector));
        if let Some(m) = mode {
            builder = builder.bind(("mode", m.to_string()));
        }
        let mut response = builder.await?;
        let rows: Vec<CandidateRow> = response.take(0)?;
        Ok(rows.into_iter().map(CandidateRow::into_candidate).collect())
    }

    async fn keyword_candidates(
        &self,
        owner: &str,
        mode: Option<&str>,
        query_tokens: &[String],
        k: usize,
    ) -> Result<Vec<Candidate>, ConciergeError> {
        let mode_clause = if mode.is_some() { " AND mode = $mode" } else { "" };
        let sql = format!(
            "SELECT id, role, content, created_at, search::score(1) AS relevance \
             FROM memory_record \
             WHERE owner = $owner AND content @1@ $query{mode_clause} \
             ORDER BY relevance DESC LIMIT {k}"
        );

        let mut builder = self
            .db
            .query(sql)
            .bind(("owner", owner.to_string()))
            .bind(("query", query_tokens.join(" ")));
        if let Some(m) = mode {
            builder = builder.bind(("mode", m.to_string()));
        }
        let mut response = builder.await?;
        let rows: Vec<CandidateRow> = response.take(0)?;
        Ok(rows.into_iter().map(CandidateRow::into_candidate).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn candidate(
        id: &str,
        content: &str,
        similarity: Option<f32>,
        age_hours: i64,
        now: DateTime<Utc>,
    ) -> Candidate {
        Candidate {
            id: id.to_string(),
            role: Role::User,
            content: content.to_string(),
            similarity,
            created_at: now - Duration::hours(age_hours),
        }
    }

    #[test]
    fn test_significant_tokens_filter_stopwords() {
        let tokens = significant_tokens("what did the client say about the proposal?");
        assert!(tokens.contains(&"client".to_string()));
        assert!(tokens.contains(&"proposal".to_string()));
        assert!(!tokens.contains(&"the".to_string()));
        assert!(!tokens.contains(&"what".to_string()));
    }

    #[test]
    fn test_lexical_overlap_full_and_none() {
        let tokens = significant_tokens("quarterly sales report");
        assert_eq!(lexical_overlap(&tokens, "the quarterly sales report is ready"), 1.0);
        assert_eq!(lexical_overlap(&tokens, "nothing relevant here"), 0.0);
    }

    #[test]
    fn test_exact_match_outranks_no_overlap_without_vectors() {
        let now = Utc::now();
        let tokens = significant_tokens("budget meeting notes");
        // No vector hits anywhere: lexical dominates at 0.85.
        let candidates = vec![
            candidate("memory_record:old", "budget meeting notes from last week", None, 48, now),
            candidate("memory_record:fresh", "grocery list apples bananas", None, 1, now),
        ];
        let ranked = blend_candidates(candidates, &tokens, now);
        assert_eq!(ranked[0].id, "memory_record:old");
    }

    #[test]
    fn test_vector_weights_applied_when_vector_hit_exists() {
        let now = Utc::now();
        let tokens = significant_tokens("project deadline");
        let candidates = vec![
            candidate("memory_record:vec", "we talked about timing", Some(0.95), 2, now),
            candidate("memory_record:lex", "the project deadline is Friday", None, 2, now),
        ];
        let ranked = blend_candidates(candidates, &tokens, now);
        // 0.72 * 0.95 ≈ 0.68 beats 0.22 * 1.0 + small recency.
        assert_eq!(ranked[0].id, "memory_record:vec");
    }

    #[test]
    fn test_tie_breaks_by_similarity_then_recency() {
        let now = Utc::now();
        let tokens: Vec<String> = vec![];
        let candidates = vec![
            candidate("memory_record:a", "same", Some(0.5), 10, now),
            candidate("memory_record:b", "same", Some(0.5), 5, now),
        ];
        let ranked = blend_candidates(candidates, &tokens, now);
        // Equal similarity; fresher record wins on the recency component
        // and again on the final tie-break.
        assert_eq!(ranked[0].id, "memory_record:b");
    }

    #[test]
    fn test_merge_interleaves_both_legs_into_bounded_pool() {
        let now = Utc::now();
        let vector_hits: Vec<Candidate> = (0..8)
            .map(|i| candidate(&format!("memory_record:v{i}"), "vector hit", Some(0.9), 1, now))
            .collect();
        let keyword_hits = vec![
            candidate("memory_record:k0", "keyword hit", None, 1, now),
            candidate("memory_record:k1", "keyword hit", None, 1, now),
        ];
        let pool = merge_candidate_legs(vector_hits, keyword_hits, 8);
        assert_eq!(pool.len(), 8);
        // A full vector leg must not squeeze the keyword hits out.
        assert!(pool.iter().any(|c| c.id == "memory_record:k0"));
        assert!(pool.iter().any(|c| c.id == "memory_record:k1"));
    }

    #[test]
    fn test_merge_keeps_similarity_for_records_in_both_legs() {
        let now = Utc::now();
        let vector_hits = vec![
            candidate("memory_record:a", "shared", Some(0.8), 1, now),
            candidate("memory_record:b", "vector only", Some(0.7), 1, now),
        ];
        // The shared record appears first in the keyword leg.
        let keyword_hits = vec![candidate("memory_record:a", "shared", None, 1, now)];
        let pool = merge_candidate_legs(vector_hits, keyword_hits, 8);
        let shared = pool.iter().find(|c| c.id == "memory_record:a").unwrap();
        assert_eq!(shared.similarity, Some(0.8));
    }

    #[test]
    fn test_recency_decay_half_life() {
        let now = Utc::now();
        let fresh = recency_factor(now, now);
        let halved = recency_factor(now - Duration::hours(72), now);
        assert!((fresh - 1.0).abs() < 1e-3);
        assert!((halved - 0.5).abs() < 1e-2);
    }
}
