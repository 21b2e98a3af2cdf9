use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::structured::{parse_json_object, value_text};
use crate::{FailureKind, StageError};

pub type CoachingEntries = BTreeMap<String, String>;

/// Coaching output: conversation metrics and a qualitative analysis.
///
/// Either half may be missing from an otherwise valid response; callers render
/// a placeholder for the missing one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CoachingFeedback {
    pub metrics: Option<CoachingEntries>,
    pub analysis: Option<CoachingEntries>,
}

impl CoachingFeedback {
    pub fn parse(text: &str) -> Result<Self, StageError> {
        let map = parse_json_object(text, "coaching feedback")?;
        let feedback = Self {
            metrics: section(&map, "metrics"),
            analysis: section(&map, "analysis"),
        };
        if feedback.metrics.is_none() && feedback.analysis.is_none() {
            return Err(StageError::new(
                FailureKind::MalformedStructuredOutput,
                "coaching feedback has neither metrics nor analysis",
            ));
        }
        Ok(feedback)
    }
}

fn section(map: &Map<String, Value>, key: &str) -> Option<CoachingEntries> {
    let Value::Object(entries) = map.get(key)? else {
        return None;
    };
    Some(
        entries
            .iter()
            .filter_map(|(name, value)| Some((name.clone(), value_text(value)?)))
            .collect(),
    )
}

/// `talk_ratio` → `Talk Ratio`.
pub fn display_label(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
