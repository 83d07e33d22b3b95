// ============================================================================
// BizDesk Core - Product Enrichment
// File: crates/bizdesk-core/src/domain/enrichment.rs
// Description: Suggestion types and the two-source confidence heuristic
// ============================================================================

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use uuid::Uuid;

use crate::error::DomainError;

/// Similarity at or above which two sources are considered to agree.
pub const HIGH_CONFIDENCE_SIMILARITY: f64 = 0.6;
/// Similarity at or above which two sources partially agree.
pub const MEDIUM_CONFIDENCE_SIMILARITY: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrichmentMethod {
    Ai,
    Web,
    Premium,
}

impl EnrichmentMethod {
    pub const ALL: [EnrichmentMethod; 3] = [
        EnrichmentMethod::Ai,
        EnrichmentMethod::Web,
        EnrichmentMethod::Premium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentMethod::Ai => "ai",
            EnrichmentMethod::Web => "web",
            EnrichmentMethod::Premium => "premium",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ai" => Some(EnrichmentMethod::Ai),
            "web" => Some(EnrichmentMethod::Web),
            "premium" => Some(EnrichmentMethod::Premium),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Product fields a suggestion may target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DraftField {
    Name,
    Description,
    Category,
    Brand,
    Tags,
}

impl DraftField {
    pub const ALL: [DraftField; 5] = [
        DraftField::Name,
        DraftField::Description,
        DraftField::Category,
        DraftField::Brand,
        DraftField::Tags,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DraftField::Name => "name",
            DraftField::Description => "description",
            DraftField::Category => "category",
            DraftField::Brand => "brand",
            DraftField::Tags => "tags",
        }
    }
}

/// Product metadata as proposed by one source. Every field is optional;
/// generators often leave some out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub tags: Vec<String>,
}

impl ProductDraft {
    /// The field as JSON, or `None` when absent or blank.
    pub fn value(&self, field: DraftField) -> Option<serde_json::Value> {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(|s| serde_json::Value::String(s.to_string()))
        };
        match field {
            DraftField::Name => text(&self.name),
            DraftField::Description => text(&self.description),
            DraftField::Category => text(&self.category),
            DraftField::Brand => text(&self.brand),
            DraftField::Tags => {
                let tags: Vec<serde_json::Value> = self
                    .tags
                    .iter()
                    .map(|t| t.trim())
                    .filter(|t| !t.is_empty())
                    .map(|t| serde_json::Value::String(t.to_string()))
                    .collect();
                if tags.is_empty() {
                    None
                } else {
                    Some(serde_json::Value::Array(tags))
                }
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        DraftField::ALL.iter().all(|f| self.value(*f).is_none())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldSuggestion {
    pub field: String,
    /// A string, or an array of strings for `tags`.
    pub value: serde_json::Value,
    pub confidence: Confidence,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodResult {
    pub method: EnrichmentMethod,
    pub suggestions: Vec<FieldSuggestion>,
    pub image_urls: Vec<String>,
    pub source_urls: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MethodFailure {
    pub method: EnrichmentMethod,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichmentResult {
    pub product_id: Uuid,
    pub ai: Option<MethodResult>,
    pub web: Option<MethodResult>,
    pub premium: Option<MethodResult>,
    pub errors: Vec<MethodFailure>,
}

impl EnrichmentResult {
    pub fn succeeded(&self) -> usize {
        [&self.ai, &self.web, &self.premium]
            .iter()
            .filter(|r| r.is_some())
            .count()
    }
}

/// Lower-case, punctuation stripped, whitespace collapsed.
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokens(value: &serde_json::Value) -> HashSet<String> {
    match value {
        serde_json::Value::String(s) => normalize(s).split(' ').filter(|t| !t.is_empty()).map(String::from).collect(),
        serde_json::Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(normalize)
            .filter(|t| !t.is_empty())
            .collect(),
        _ => HashSet::new(),
    }
}

/// Jaccard similarity of the normalised token sets, in `[0, 1]`.
/// Text fields compare words; tag lists compare whole tags.
pub fn similarity(a: &serde_json::Value, b: &serde_json::Value) -> f64 {
    let (ta, tb) = (tokens(a), tokens(b));
    if ta.is_empty() && tb.is_empty() {
        return 1.0;
    }
    let inter = ta.intersection(&tb).count() as f64;
    let union = ta.union(&tb).count() as f64;
    inter / union
}

pub fn confidence_for(similarity: f64) -> Confidence {
    if similarity >= HIGH_CONFIDENCE_SIMILARITY {
        Confidence::High
    } else if similarity >= MEDIUM_CONFIDENCE_SIMILARITY {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

/// Merges two independent drafts field by field. The primary value wins
/// when both exist; the label reflects how much the sources agree.
pub fn merge_drafts(
    primary: Option<(&str, &ProductDraft)>,
    secondary: Option<(&str, &ProductDraft)>,
) -> Vec<FieldSuggestion> {
    let mut out = Vec::new();
    for field in DraftField::ALL {
        let a = primary.and_then(|(src, d)| d.value(field).map(|v| (src, v)));
        let b = secondary.and_then(|(src, d)| d.value(field).map(|v| (src, v)));
        let suggestion = match (a, b) {
            (Some((sa, va)), Some((sb, vb))) => FieldSuggestion {
                field: field.as_str().to_string(),
                confidence: confidence_for(similarity(&va, &vb)),
                value: va,
                sources: vec![sa.to_string(), sb.to_string()],
            },
            (Some((s, v)), None) | (None, Some((s, v))) => FieldSuggestion {
                field: field.as_str().to_string(),
                value: v,
                confidence: Confidence::Low,
                sources: vec![s.to_string()],
            },
            (None, None) => continue,
        };
        out.push(suggestion);
    }
    out
}

/// Every present field of a single-source draft at a fixed confidence.
pub fn single_source(source: &str, draft: &ProductDraft, confidence: Confidence) -> Vec<FieldSuggestion> {
    DraftField::ALL
        .iter()
        .filter_map(|field| {
            draft.value(*field).map(|value| FieldSuggestion {
                field: field.as_str().to_string(),
                value,
                confidence,
                sources: vec![source.to_string()],
            })
        })
        .collect()
}

/// Extracts the JSON object from a model reply, tolerating markdown code
/// fences and chatter around it.
pub fn parse_draft(reply: &str) -> Result<ProductDraft, DomainError> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if e > s => &reply[s..=e],
        _ => {
            return Err(DomainError::Validation(
                "model reply contains no JSON object".to_string(),
            ))
        }
    };
    let draft: ProductDraft = serde_json::from_str(body)
        .map_err(|e| DomainError::Validation(format!("model reply is not a product draft: {}", e)))?;
    if draft.is_empty() {
        return Err(DomainError::Validation("model reply proposed no fields".to_string()));
    }
    Ok(draft)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn draft(name: &str, description: &str) -> ProductDraft {
        ProductDraft {
            name: Some(name.to_string()),
            description: Some(description.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Café, con   LECHE! "), "café con leche");
        assert_eq!(normalize("---"), "");
    }

    #[test]
    fn test_similarity_ignores_case_and_punctuation() {
        assert_eq!(similarity(&json!("Pan Amasado."), &json!("pan amasado")), 1.0);
        assert_eq!(similarity(&json!("a b"), &json!("c d")), 0.0);
        let half = similarity(&json!("pan amasado casero"), &json!("pan amasado integral"));
        assert!((half - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_tag_similarity_compares_whole_tags() {
        let s = similarity(&json!(["Pan", "horneado"]), &json!(["pan", "Horneado", "fresco"]));
        assert!((s - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_thresholds() {
        assert_eq!(confidence_for(1.0), Confidence::High);
        assert_eq!(confidence_for(0.6), Confidence::High);
        assert_eq!(confidence_for(0.45), Confidence::Medium);
        assert_eq!(confidence_for(0.1), Confidence::Low);
    }

    #[test]
    fn test_merge_near_identical_descriptions_are_high() {
        let a = draft("Pan amasado", "Pan amasado casero horneado cada mañana en horno de barro");
        let b = draft("Pan Amasado", "Pan amasado casero, horneado cada mañana en horno de leña");
        let merged = merge_drafts(Some(("gemini", &a)), Some(("openai", &b)));
        assert_eq!(merged.len(), 2);
        assert!(merged.iter().all(|s| s.confidence == Confidence::High));
        assert_eq!(merged[0].value, json!("Pan amasado"));
        assert_eq!(merged[0].sources, vec!["gemini", "openai"]);
    }

    #[test]
    fn test_merge_single_source_fields_are_low() {
        let a = ProductDraft {
            brand: Some("Ideal".into()),
            ..Default::default()
        };
        let merged = merge_drafts(Some(("gemini", &a)), None);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].field, "brand");
        assert_eq!(merged[0].confidence, Confidence::Low);
    }

    #[test]
    fn test_parse_draft_with_fences() {
        let reply = "Claro:\n```json\n{\"name\": \"Queque\", \"tags\": [\"dulce\"]}\n```";
        let d = parse_draft(reply).unwrap();
        assert_eq!(d.name.as_deref(), Some("Queque"));
        assert_eq!(d.tags, vec!["dulce"]);
    }

    #[test]
    fn test_parse_draft_rejects_garbage() {
        assert!(parse_draft("no idea").is_err());
        assert!(parse_draft("{\"name\": \"  \"}").is_err());
        assert!(parse_draft("{not json}").is_err());
    }

    #[test]
    fn test_single_source() {
        let d = draft("Queque", "Queque de naranja");
        let s = single_source("premium", &d, Confidence::Medium);
        assert_eq!(s.len(), 2);
        assert!(s.iter().all(|f| f.confidence == Confidence::Medium));
    }
}
