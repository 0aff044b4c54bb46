use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{LiteratureSource, load_or_default, mentions};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Article {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pmid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "abstract", skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<Value>,
}

impl Article {
    fn citation(&self) -> String {
        let year = match &self.year {
            Some(Value::String(y)) => y.clone(),
            Some(Value::Number(y)) => y.to_string(),
            _ => "N/A".to_string(),
        };
        format!(
            "{} ({}): {}",
            self.title.as_deref().unwrap_or("N/A"),
            year,
            self.abstract_text.as_deref().unwrap_or("N/A")
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiteratureSummary {
    pub drug: String,
    pub count: usize,
    pub summary: String,
    pub combined: String,
    pub matches: Vec<Article>,
}

#[derive(Debug, Default, Deserialize)]
struct LiteratureFile {
    #[serde(default)]
    articles: Vec<Article>,
}

/// Literature samples loaded from an `{"articles": [...]}` document. Stands
/// in for a web intelligence lookup.
#[derive(Debug, Default)]
pub struct LiteratureSamples {
    articles: Vec<Article>,
}

impl LiteratureSamples {
    pub fn load(path: &Path) -> Self {
        let payload: LiteratureFile = load_or_default(path, "literature");
        Self::from_records(payload.articles)
    }

    pub fn from_records(articles: Vec<Article>) -> Self {
        Self { articles }
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.articles.is_empty()
    }

    #[tracing::instrument(
        name = "source literature.summarize_for_drug",
        skip(self),
        fields(source = "literature", literature.count)
    )]
    pub fn summarize_for_drug(&self, drug_name: &str) -> LiteratureSummary {
        let matches: Vec<Article> = self
            .articles
            .iter()
            .filter(|a| {
                let text = format!(
                    "{} {}",
                    a.title.as_deref().unwrap_or_default(),
                    a.abstract_text.as_deref().unwrap_or_default()
                );
                mentions(&text, drug_name)
            })
            .cloned()
            .collect();

        tracing::Span::current().record("literature.count", matches.len());

        let combined = matches
            .iter()
            .map(Article::citation)
            .collect::<Vec<_>>()
            .join("\n\n");

        LiteratureSummary {
            drug: drug_name.to_string(),
            count: matches.len(),
            summary: synthesize(drug_name, matches.len()),
            combined,
            matches,
        }
    }
}

impl LiteratureSource for LiteratureSamples {
    fn summarize_for_drug(&self, drug_name: &str) -> LiteratureSummary {
        LiteratureSamples::summarize_for_drug(self, drug_name)
    }
}

/// Fixed-template synthesis. Placeholder for a generated summary; depends only
/// on the drug name and the number of matching articles.
pub fn synthesize(drug_name: &str, count: usize) -> String {
    if count == 0 {
        format!("No literature matches found for {drug_name}.")
    } else {
        format!(
            "Found {count} article(s). Preclinical and epidemiological signals suggest {drug_name} modulates metabolic pathways (AMPK/mTOR)"
        )
    }
}
