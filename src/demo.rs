//! Sample corpus and the three walkthrough queries.
//!
//! A: unfiltered semantic search. B: restricted to `access_level ==
//! "Executive"`. C: `year == 2024 OR access_level == "Developer"`.
//! Access levels are plain metadata; filtering on them is advisory.

use crate::filter::Predicate;
use crate::store::VectorStore;
use crate::types::{Document, Result, ScoredDocument};
use serde_json::json;

/// Characters of content shown per result line.
pub const PREVIEW_CHARS: usize = 60;

/// The four sample documents.
pub fn sample_documents() -> Vec<Document> {
    vec![
        Document::new("Our Q4 earnings report shows a 15% increase in cloud services revenue, reaching $1.2B.")
            .with("source", "Finance_Report")
            .with("year", 2024)
            .with("access_level", "Executive"),
        Document::new("The new microservice architecture dramatically improves latency by 30%, which is documented in the technical whitepaper.")
            .with("source", "Technical_Docs")
            .with("year", 2024)
            .with("access_level", "Developer"),
        Document::new("The marketing strategy for Q1 2025 will focus heavily on social media campaigns targeting Gen Z.")
            .with("source", "Marketing_Plan")
            .with("year", 2025)
            .with("access_level", "Public"),
        Document::new("The finance team requires all budget requests for Q1 2025 to be submitted by the end of November 2024.")
            .with("source", "Internal_Memo")
            .with("year", 2024)
            .with("access_level", "Executive"),
    ]
}

/// One walkthrough query.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub label: char,
    pub title: String,
    pub query: String,
    pub k: usize,
    pub filter: Option<Predicate>,
    /// Print the year next to the source
    pub show_year: bool,
    /// Printed when nothing matched
    pub fallback: Option<String>,
}

/// Scenario with its hits.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    pub scenario: Scenario,
    pub hits: Vec<ScoredDocument>,
}

/// Scenarios A, B and C.
pub fn scenarios() -> Result<Vec<Scenario>> {
    Ok(vec![
        Scenario {
            label: 'A',
            title: "Semantic Search (Unfiltered)".to_string(),
            query: "What should we concentrate on for advertising next year?".to_string(),
            k: 2,
            filter: None,
            show_year: false,
            fallback: None,
        },
        Scenario {
            label: 'B',
            title: "Semantic Search with FILTER ('access_level': 'Executive')".to_string(),
            query: "What were the financial results from the last period?".to_string(),
            k: 1,
            filter: Some(Predicate::from_where(&json!({"access_level": "Executive"}))?),
            show_year: true,
            fallback: Some("No documents found matching the filter criteria.".to_string()),
        },
        Scenario {
            label: 'C',
            title: "Filtered Search with OR Operator".to_string(),
            query: "Tell me about the recent technology updates.".to_string(),
            k: 3,
            filter: Some(Predicate::from_where(&json!({
                "$or": [{"year": 2024}, {"access_level": "Developer"}]
            }))?),
            show_year: true,
            fallback: None,
        },
    ])
}

/// Run every scenario against `store`.
pub async fn run_scenarios(store: &VectorStore) -> Result<Vec<ScenarioResult>> {
    let mut results = Vec::new();
    for scenario in scenarios()? {
        let hits = store
            .similarity_search_with_score(&scenario.query, scenario.k, scenario.filter.as_ref())
            .await?;
        results.push(ScenarioResult { scenario, hits });
    }
    Ok(results)
}

/// First `max_chars` characters of `text`, on char boundaries.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Result lines of a scenario, without the header.
pub fn render(result: &ScenarioResult) -> Vec<String> {
    if result.hits.is_empty() {
        return result.scenario.fallback.iter().cloned().collect();
    }

    result
        .hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let doc = &hit.document;
            let source = doc.metadata_str("source").unwrap_or_default();
            let text = preview(&doc.page_content, PREVIEW_CHARS);
            if result.scenario.show_year {
                let year = doc.metadata_str("year").unwrap_or_default();
                format!("Result {} (Source: {}, Year: {}): {}...", i + 1, source, year, text)
            } else {
                format!("Result {} (Source: {}): {}...", i + 1, source, text)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_sample_documents_are_valid() {
        let docs = sample_documents();
        assert_eq!(docs.len(), 4);
        for doc in &docs {
            doc.validate().unwrap();
            assert!(doc.metadata.contains_key("source"));
        }
    }

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("short", 60), "short");
        assert_eq!(preview("héllo wörld", 7), "héllo w");
        assert_eq!(preview("abc", 0), "");
    }

    #[test]
    fn test_render_formats() {
        let scenarios = scenarios().unwrap();
        let doc = sample_documents().remove(0);
        let hit = ScoredDocument {
            id: Uuid::nil(),
            document: doc,
            distance: 0.1,
            relevance: 0.9,
        };

        let a = ScenarioResult { scenario: scenarios[0].clone(), hits: vec![hit.clone()] };
        assert_eq!(
            render(&a),
            vec!["Result 1 (Source: Finance_Report): Our Q4 earnings report shows a 15% increase in cloud service...".to_string()]
        );

        let b = ScenarioResult { scenario: scenarios[1].clone(), hits: vec![hit] };
        assert!(render(&b)[0].starts_with("Result 1 (Source: Finance_Report, Year: 2024): "));

        let empty = ScenarioResult { scenario: scenarios[1].clone(), hits: vec![] };
        assert_eq!(render(&empty), vec!["No documents found matching the filter criteria.".to_string()]);

        let empty_c = ScenarioResult { scenario: scenarios[2].clone(), hits: vec![] };
        assert!(render(&empty_c).is_empty());
    }
}
