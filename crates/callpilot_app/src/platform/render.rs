use std::fmt::Write as _;

use callpilot_core::{AppViewModel, NoticeLevel, Panel, PanelStatus, TabView};
use callpilot_engine::{
    display_label, Artifact, CoachingEntries, OpportunityField, OpportunityRecord,
    PipelineController, PipelineStage, TAGS_LABEL,
};

/// One line per tab: `[x]` ready, `[>]` open, `[ ]` locked; `*` marks the
/// shown tab.
pub fn render_tabs(view: &AppViewModel) -> String {
    view.tabs
        .iter()
        .map(tab_marker)
        .collect::<Vec<_>>()
        .join("  ")
}

fn tab_marker(tab: &TabView) -> String {
    let state = if tab.ready {
        "[x]"
    } else if tab.navigable {
        "[>]"
    } else {
        "[ ]"
    };
    let active = if tab.active { "*" } else { "" };
    format!("{state} {active}{}", tab.label)
}

pub fn render_status(view: &AppViewModel) -> String {
    let mut out = render_tabs(view);
    if view.busy {
        out.push_str("  (working)");
    }
    if let Some(notice) = &view.notice {
        let prefix = match notice.level {
            NoticeLevel::Info => "info",
            NoticeLevel::Error => "error",
        };
        let _ = write!(out, "\n{prefix}: {}", notice.text);
    }
    out
}

/// Full report of every panel, using the stored artifacts for ready panels.
pub fn render_results(view: &AppViewModel, pipeline: &PipelineController) -> String {
    let mut out = String::new();
    for panel in Panel::ALL {
        let _ = writeln!(out, "\n## {}\n", panel_title(panel));
        let body = match view.panel(panel) {
            PanelStatus::Ready => panel_body(panel, pipeline),
            PanelStatus::Failed(message) => format!("Failed: {message}"),
            PanelStatus::Pending => "Still generating.".to_string(),
            PanelStatus::Empty => "Not generated.".to_string(),
        };
        out.push_str(body.trim_end());
        out.push('\n');
    }
    if let Some(path) = &view.last_export {
        let _ = writeln!(out, "\nExport written to {path}");
    }
    out
}

fn panel_title(panel: Panel) -> &'static str {
    match panel {
        Panel::Plan => "Call Plan",
        Panel::Transcript => "Transcript",
        Panel::ClientEmail => "Client Email",
        Panel::InternalEmail => "Internal Email",
        Panel::Opportunity => "Opportunity",
        Panel::Sow => "SOW Details",
        Panel::Metrics => "Conversation Metrics",
        Panel::Analysis => "Conversation Analysis",
    }
}

fn panel_stage(panel: Panel) -> PipelineStage {
    match panel {
        Panel::Plan => PipelineStage::Plan,
        Panel::Transcript => PipelineStage::Transcript,
        Panel::ClientEmail => PipelineStage::ClientEmail,
        Panel::InternalEmail => PipelineStage::InternalEmail,
        Panel::Opportunity => PipelineStage::Opportunity,
        Panel::Sow => PipelineStage::Sow,
        Panel::Metrics | Panel::Analysis => PipelineStage::Coaching,
    }
}

fn panel_body(panel: Panel, pipeline: &PipelineController) -> String {
    let Some(artifact) = pipeline.artifact(panel_stage(panel)) else {
        return "Not generated.".to_string();
    };
    match (panel, &artifact) {
        (_, Artifact::Text(text)) => text.clone(),
        (_, Artifact::Opportunity(record)) => render_opportunity(record),
        (Panel::Metrics, Artifact::Coaching(feedback)) => {
            render_entries(feedback.metrics.as_ref(), "No metrics were returned.")
        }
        (_, Artifact::Coaching(feedback)) => {
            render_entries(feedback.analysis.as_ref(), "No analysis was returned.")
        }
    }
}

pub fn render_opportunity(record: &OpportunityRecord) -> String {
    let mut out = String::new();
    for field in OpportunityField::ALL {
        let _ = writeln!(out, "{}: {}", field.label(), record.display(field));
    }
    let _ = writeln!(out, "{TAGS_LABEL}: {}", record.tags_display());
    out
}

fn render_entries(entries: Option<&CoachingEntries>, placeholder: &str) -> String {
    match entries {
        Some(entries) if !entries.is_empty() => entries
            .iter()
            .map(|(key, value)| format!("- {}: {}", display_label(key), value))
            .collect::<Vec<_>>()
            .join("\n"),
        _ => placeholder.to_string(),
    }
}
