use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Number;

use super::{MarketSource, load_or_default};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketInsight {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gap_score: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_addressable_market_usd_m: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_competitors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payer_pressure: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommended_strategy: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// `market_insights` may hold one insight or an ordered list of them.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum InsightsPayload {
    Many(Vec<MarketInsight>),
    One(MarketInsight),
}

impl Default for InsightsPayload {
    fn default() -> Self {
        InsightsPayload::Many(Vec::new())
    }
}

impl From<InsightsPayload> for Vec<MarketInsight> {
    fn from(payload: InsightsPayload) -> Self {
        match payload {
            InsightsPayload::Many(insights) => insights,
            InsightsPayload::One(insight) => vec![insight],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct MarketFile {
    #[serde(default)]
    market_insights: InsightsPayload,
}

/// Ordered market insights; the first one is the default answer.
#[derive(Debug, Default)]
pub struct MarketData {
    insights: Vec<MarketInsight>,
}

impl MarketData {
    pub fn load(path: &Path) -> Self {
        let payload: MarketFile = load_or_default(path, "market");
        Self::from_records(payload.market_insights.into())
    }

    pub fn from_records(insights: Vec<MarketInsight>) -> Self {
        Self { insights }
    }

    pub fn is_empty(&self) -> bool {
        self.insights.is_empty()
    }

    pub fn segments(&self) -> Vec<String> {
        self.insights
            .iter()
            .filter_map(|i| i.segment.clone())
            .collect()
    }

    /// Looks up a segment by case-insensitive name. Unknown segments fall
    /// back to the first insight with a `note` naming the requested segment.
    #[tracing::instrument(
        name = "source market.insight",
        skip(self),
        fields(source = "market", market.fallback = false)
    )]
    pub fn insight(&self, segment: Option<&str>) -> MarketInsight {
        let Some(first) = self.insights.first() else {
            return MarketInsight::default();
        };

        let Some(segment) = segment.filter(|s| !s.is_empty()) else {
            return first.clone();
        };

        let wanted = segment.to_lowercase();
        if let Some(found) = self.insights.iter().find(|i| {
            i.segment.as_deref().unwrap_or_default().to_lowercase() == wanted
        }) {
            return found.clone();
        }

        tracing::Span::current().record("market.fallback", true);
        let mut fallback = first.clone();
        fallback.note = Some(format!(
            "Requested segment '{}' not found; returning '{}'.",
            segment,
            first.segment.as_deref().unwrap_or("default")
        ));
        fallback
    }
}

impl MarketSource for MarketData {
    fn insight(&self, segment: Option<&str>) -> MarketInsight {
        MarketData::insight(self, segment)
    }
}
