//! Filtered nearest-neighbor retrieval.
//!
//! The index only answers a flat "k nearest, ascending distance" query.
//! A category-scoped search is approximated by over-fetching a larger
//! candidate window and filtering it down, which keeps cost bounded but
//! can return fewer than `top_k` results when the requested category is
//! thinly represented among the global nearest neighbors. That partial
//! result is the documented contract, not a bug to fix here.

use docvec_index::{FragmentHit, Store, StoreError};

/// Default candidate-window multiplier for filtered searches.
pub const DEFAULT_OVER_FETCH: usize = 10;

/// Display similarity for a cosine distance on normalized embeddings.
pub fn similarity(distance: f64) -> f64 {
    1.0 - distance
}

/// Keep only hits matching `category` and truncate to `top_k`. The input
/// is already in ascending-distance order, so truncation preserves rank.
pub fn filter_by_category(
    hits: Vec<FragmentHit>,
    category: &str,
    top_k: usize,
) -> Vec<FragmentHit> {
    hits.into_iter()
        .filter(|h| h.category == category)
        .take(top_k)
        .collect()
}

/// Executes top-k searches against the store, approximating "top-k within
/// a category" by over-fetch-then-filter.
pub struct Retriever {
    over_fetch: usize,
}

impl Retriever {
    pub fn new(over_fetch: usize) -> Self {
        Self {
            over_fetch: over_fetch.max(1),
        }
    }

    /// Up to `top_k` fragments nearest to `query`, ascending by distance,
    /// scoped to `category` when given. The filtered case may come up
    /// short even when more matching fragments exist beyond the
    /// `top_k × over_fetch` candidate window.
    pub async fn search(
        &self,
        store: &mut Store,
        query: &[f32],
        category: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<FragmentHit>, StoreError> {
        let k = match category {
            Some(_) => top_k * self.over_fetch,
            None => top_k,
        };
        let hits = store.nearest(query, k as i64).await?;

        Ok(match category {
            Some(c) => filter_by_category(hits, c, top_k),
            None => hits,
        })
    }
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(DEFAULT_OVER_FETCH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docvec_core::FragmentKind;

    fn hit(category: &str, distance: f64) -> FragmentHit {
        FragmentHit {
            text: format!("fragment at {distance}"),
            source_file: "doc.md".to_string(),
            category: category.to_string(),
            seq_index: 0,
            kind: FragmentKind::Markdown,
            distance,
        }
    }

    #[test]
    fn similarity_inverts_distance() {
        assert_eq!(similarity(0.0), 1.0);
        assert!((similarity(0.25) - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn filter_keeps_only_requested_category() {
        let hits = vec![hit("a", 0.1), hit("b", 0.2), hit("a", 0.3), hit("b", 0.4)];
        let filtered = filter_by_category(hits, "a", 5);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|h| h.category == "a"));
    }

    #[test]
    fn filter_preserves_ascending_distance_order() {
        let hits = vec![hit("a", 0.1), hit("b", 0.2), hit("a", 0.3), hit("a", 0.5)];
        let filtered = filter_by_category(hits, "a", 5);
        let distances: Vec<f64> = filtered.iter().map(|h| h.distance).collect();
        assert_eq!(distances, vec![0.1, 0.3, 0.5]);
    }

    #[test]
    fn filter_truncates_to_top_k() {
        let hits = (0..10).map(|i| hit("a", i as f64 / 10.0)).collect();
        let filtered = filter_by_category(hits, "a", 3);
        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[2].distance, 0.2);
    }

    /// The documented approximation: when the candidate window holds fewer
    /// matching fragments than `top_k`, the result is short even though
    /// more may exist beyond the window.
    #[test]
    fn filter_returns_short_result_when_category_is_sparse() {
        // A window of 50 candidates dominated by category "b": only 2 of
        // the 3 existing "a" fragments made it in.
        let mut hits: Vec<FragmentHit> = (0..48).map(|i| hit("b", 0.01 * i as f64)).collect();
        hits.push(hit("a", 0.6));
        hits.push(hit("a", 0.7));
        hits.sort_by(|x, y| x.distance.total_cmp(&y.distance));

        let filtered = filter_by_category(hits, "a", 5);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|h| h.category == "a"));
    }

    #[test]
    fn over_fetch_floor_is_one() {
        let r = Retriever::new(0);
        assert_eq!(r.over_fetch, 1);
    }
}
