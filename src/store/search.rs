//! Search requests and exact ranking.

use super::DistanceMetric;
use crate::filter::{DocumentFilter, Predicate};
use crate::types::{ScoredDocument, StoredDocument};
use std::cmp::Ordering;

/// Parameters of a similarity search.
#[derive(Debug, Clone, Default)]
pub struct SearchRequest {
    /// Maximum number of results
    pub k: usize,
    /// Metadata filter
    pub filter: Option<Predicate>,
    /// Content filter
    pub document_filter: Option<DocumentFilter>,
    /// Drop hits whose relevance falls below this
    pub min_relevance: Option<f32>,
}

impl SearchRequest {
    pub fn new(k: usize) -> Self {
        Self {
            k,
            ..Default::default()
        }
    }

    pub fn filter(mut self, filter: Predicate) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn document_filter(mut self, filter: DocumentFilter) -> Self {
        self.document_filter = Some(filter);
        self
    }

    pub fn min_relevance(mut self, min_relevance: f32) -> Self {
        self.min_relevance = Some(min_relevance);
        self
    }

    /// Whether a stored document passes both filters.
    pub fn matches(&self, stored: &StoredDocument) -> bool {
        self.filter
            .as_ref()
            .map_or(true, |f| f.evaluate(&stored.document.metadata))
            && self
                .document_filter
                .as_ref()
                .map_or(true, |f| f.evaluate(&stored.document.page_content))
    }
}

/// Rank candidates against a query vector.
///
/// Ordered by ascending distance, ties by ID; at most `request.k` results.
pub fn rank<'a, I>(
    candidates: I,
    query: &[f32],
    metric: DistanceMetric,
    request: &SearchRequest,
) -> Vec<ScoredDocument>
where
    I: IntoIterator<Item = (&'a StoredDocument, &'a [f32])>,
{
    if request.k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(&StoredDocument, f32)> = candidates
        .into_iter()
        .filter(|(stored, _)| request.matches(stored))
        .map(|(stored, embedding)| (stored, metric.distance(query, embedding)))
        .filter(|(_, distance)| !distance.is_nan())
        .filter(|(_, distance)| {
            request
                .min_relevance
                .map_or(true, |min| metric.relevance(*distance) >= min)
        })
        .collect();

    scored.sort_by(|a, b| {
        a.1.partial_cmp(&b.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.id.cmp(&b.0.id))
    });
    scored.truncate(request.k);

    scored
        .into_iter()
        .map(|(stored, distance)| ScoredDocument {
            id: stored.id,
            document: stored.document.clone(),
            distance,
            relevance: metric.relevance(distance),
        })
        .collect()
}
