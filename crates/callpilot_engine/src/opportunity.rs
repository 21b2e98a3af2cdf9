use serde_json::Value;

use crate::structured::{parse_json_object, value_text};
use crate::StageError;

/// Rendered in place of any missing value.
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpportunityField {
    Name,
    ServiceLine,
    Stage,
    Amount,
    CloseDate,
    NextStep,
    Competitors,
    KeyObjections,
    ScientificArea,
}

impl OpportunityField {
    pub const ALL: [OpportunityField; 9] = [
        OpportunityField::Name,
        OpportunityField::ServiceLine,
        OpportunityField::Stage,
        OpportunityField::Amount,
        OpportunityField::CloseDate,
        OpportunityField::NextStep,
        OpportunityField::Competitors,
        OpportunityField::KeyObjections,
        OpportunityField::ScientificArea,
    ];

    /// Key in the generated JSON.
    pub fn key(self) -> &'static str {
        match self {
            OpportunityField::Name => "name",
            OpportunityField::ServiceLine => "service_line",
            OpportunityField::Stage => "stage",
            OpportunityField::Amount => "amount",
            OpportunityField::CloseDate => "close_date",
            OpportunityField::NextStep => "next_step",
            OpportunityField::Competitors => "competitors",
            OpportunityField::KeyObjections => "key_objections",
            OpportunityField::ScientificArea => "scientific_area",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OpportunityField::Name => "Opportunity Name",
            OpportunityField::ServiceLine => "Service Line",
            OpportunityField::Stage => "Stage",
            OpportunityField::Amount => "Amount",
            OpportunityField::CloseDate => "Close Date",
            OpportunityField::NextStep => "Next Step",
            OpportunityField::Competitors => "Competitors",
            OpportunityField::KeyObjections => "Key Objections",
            OpportunityField::ScientificArea => "Scientific Area",
        }
    }
}

pub const TAGS_KEY: &str = "tags";
pub const TAGS_LABEL: &str = "Tags";

/// CRM opportunity extracted from a call transcript.
///
/// Absent keys stay `None` here; [`OpportunityRecord::display`] substitutes
/// [`NOT_AVAILABLE`] when rendering.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpportunityRecord {
    pub name: Option<String>,
    pub service_line: Option<String>,
    pub stage: Option<String>,
    pub amount: Option<String>,
    pub close_date: Option<String>,
    pub next_step: Option<String>,
    pub competitors: Option<String>,
    pub key_objections: Option<String>,
    pub scientific_area: Option<String>,
    pub tags: Vec<String>,
}

impl OpportunityRecord {
    pub fn parse(text: &str) -> Result<Self, StageError> {
        let map = parse_json_object(text, "opportunity record")?;
        let field = |field: OpportunityField| map.get(field.key()).and_then(value_text);
        let tags = match map.get(TAGS_KEY) {
            Some(Value::Array(items)) => items.iter().filter_map(value_text).collect(),
            Some(Value::String(joined)) => joined
                .split(',')
                .map(str::trim)
                .filter(|tag| !tag.is_empty())
                .map(ToOwned::to_owned)
                .collect(),
            _ => Vec::new(),
        };

        Ok(Self {
            name: field(OpportunityField::Name),
            service_line: field(OpportunityField::ServiceLine),
            stage: field(OpportunityField::Stage),
            amount: field(OpportunityField::Amount),
            close_date: field(OpportunityField::CloseDate),
            next_step: field(OpportunityField::NextStep),
            competitors: field(OpportunityField::Competitors),
            key_objections: field(OpportunityField::KeyObjections),
            scientific_area: field(OpportunityField::ScientificArea),
            tags,
        })
    }

    pub fn get(&self, field: OpportunityField) -> Option<&str> {
        let value = match field {
            OpportunityField::Name => &self.name,
            OpportunityField::ServiceLine => &self.service_line,
            OpportunityField::Stage => &self.stage,
            OpportunityField::Amount => &self.amount,
            OpportunityField::CloseDate => &self.close_date,
            OpportunityField::NextStep => &self.next_step,
            OpportunityField::Competitors => &self.competitors,
            OpportunityField::KeyObjections => &self.key_objections,
            OpportunityField::ScientificArea => &self.scientific_area,
        };
        value.as_deref()
    }

    /// Field value for rendering; never empty.
    pub fn display(&self, field: OpportunityField) -> &str {
        self.get(field)
            .filter(|value| !value.trim().is_empty())
            .unwrap_or(NOT_AVAILABLE)
    }

    pub fn tags_display(&self) -> String {
        if self.tags.is_empty() {
            NOT_AVAILABLE.to_string()
        } else {
            self.tags.join("; ")
        }
    }
}
