use std::collections::{BTreeMap, BTreeSet};

use crate::gate::{GateEvent, StageGate, StageId};
use crate::view_model::{ActionStates, AppViewModel, PanelView, TabView};

pub type RunId = u64;

/// Generation steps as reported by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Email,
    Plan,
    Transcript,
    ClientEmail,
    InternalEmail,
    Opportunity,
    Sow,
    Coaching,
}

impl PipelineStage {
    pub fn label(self) -> &'static str {
        match self {
            PipelineStage::Email => "Email intake",
            PipelineStage::Plan => "Call plan",
            PipelineStage::Transcript => "Transcript",
            PipelineStage::ClientEmail => "Client email",
            PipelineStage::InternalEmail => "Internal email",
            PipelineStage::Opportunity => "Opportunity extraction",
            PipelineStage::Sow => "SOW details",
            PipelineStage::Coaching => "Coaching feedback",
        }
    }

    pub(crate) fn panels(self) -> &'static [Panel] {
        match self {
            PipelineStage::Email => &[],
            PipelineStage::Plan => &[Panel::Plan],
            PipelineStage::Transcript => &[Panel::Transcript],
            PipelineStage::ClientEmail => &[Panel::ClientEmail],
            PipelineStage::InternalEmail => &[Panel::InternalEmail],
            PipelineStage::Opportunity => &[Panel::Opportunity],
            PipelineStage::Sow => &[Panel::Sow],
            PipelineStage::Coaching => &[Panel::Metrics, Panel::Analysis],
        }
    }

    /// Scope whose runs own this stage; a `Call` run owns every stage.
    pub fn scope(self) -> RunScope {
        match self {
            PipelineStage::Email => RunScope::Call,
            PipelineStage::Plan => RunScope::Plan,
            _ => RunScope::Recording,
        }
    }
}

/// What a triggering action regenerates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunScope {
    Call,
    Plan,
    Recording,
}

impl RunScope {
    pub const ALL: [RunScope; 3] = [RunScope::Call, RunScope::Plan, RunScope::Recording];

    pub fn stages(self) -> &'static [PipelineStage] {
        match self {
            RunScope::Call => &[
                PipelineStage::Email,
                PipelineStage::Plan,
                PipelineStage::Transcript,
                PipelineStage::ClientEmail,
                PipelineStage::InternalEmail,
                PipelineStage::Opportunity,
                PipelineStage::Sow,
                PipelineStage::Coaching,
            ],
            RunScope::Plan => &[PipelineStage::Plan],
            RunScope::Recording => &[
                PipelineStage::Transcript,
                PipelineStage::ClientEmail,
                PipelineStage::InternalEmail,
                PipelineStage::Opportunity,
                PipelineStage::Sow,
                PipelineStage::Coaching,
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Configuration,
    Transport,
    Remote,
    MalformedStructuredOutput,
    Input,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingKind {
    Audio,
    Transcript,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedRecording {
    pub kind: RecordingKind,
    pub file_name: String,
}

/// Output areas of the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Panel {
    Plan,
    Transcript,
    ClientEmail,
    InternalEmail,
    Opportunity,
    Sow,
    Metrics,
    Analysis,
}

impl Panel {
    pub const ALL: [Panel; 8] = [
        Panel::Plan,
        Panel::Transcript,
        Panel::ClientEmail,
        Panel::InternalEmail,
        Panel::Opportunity,
        Panel::Sow,
        Panel::Metrics,
        Panel::Analysis,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PanelStatus {
    #[default]
    Empty,
    Pending,
    Ready,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    gate: StageGate,
    configured: bool,
    email_file: Option<String>,
    recording: Option<SelectedRecording>,
    current_runs: BTreeMap<RunScope, RunId>,
    in_flight: BTreeSet<PipelineStage>,
    succeeded: BTreeSet<PipelineStage>,
    panels: BTreeMap<Panel, PanelStatus>,
    notice: Option<Notice>,
    last_export: Option<String>,
    dirty: bool,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view(&self) -> AppViewModel {
        let tabs = StageId::ALL
            .iter()
            .map(|&stage| TabView {
                stage,
                label: stage.label(),
                ready: self.gate.is_ready(stage),
                navigable: self.gate.is_navigable_to(stage),
                interactable: self.gate.is_interactable(stage),
                active: self.gate.active() == stage,
            })
            .collect();
        let panels = Panel::ALL
            .iter()
            .map(|&panel| PanelView {
                panel,
                status: self.panel_status(panel),
            })
            .collect();

        AppViewModel {
            tabs,
            active_stage: self.gate.active(),
            panels,
            actions: ActionStates {
                generate_plan: self.can_generate_plan(),
                process_recording: self.can_process_recording(),
                export: self.can_export(),
            },
            email_file: self.email_file.clone(),
            recording: self.recording.clone(),
            configured: self.configured,
            busy: !self.in_flight.is_empty(),
            notice: self.notice.clone(),
            last_export: self.last_export.clone(),
            dirty: self.dirty,
        }
    }

    /// Returns whether state changed since the last call, clearing the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub fn take_gate_events(&mut self) -> Vec<GateEvent> {
        self.gate.take_events()
    }

    pub fn gate(&self) -> &StageGate {
        &self.gate
    }

    /// Latest run seen for `scope`.
    pub fn current_run(&self, scope: RunScope) -> RunId {
        self.current_runs.get(&scope).copied().unwrap_or_default()
    }

    pub fn panel_status(&self, panel: Panel) -> PanelStatus {
        self.panels.get(&panel).cloned().unwrap_or_default()
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub(crate) fn gate_mut(&mut self) -> &mut StageGate {
        &mut self.gate
    }

    pub(crate) fn configured(&self) -> bool {
        self.configured
    }

    pub(crate) fn set_configured(&mut self, configured: bool) {
        self.configured = configured;
        self.mark_dirty();
    }

    pub(crate) fn email_file(&self) -> Option<&str> {
        self.email_file.as_deref()
    }

    pub(crate) fn set_email_file(&mut self, file_name: String) {
        self.email_file = Some(file_name);
        self.mark_dirty();
    }

    pub(crate) fn recording(&self) -> Option<&SelectedRecording> {
        self.recording.as_ref()
    }

    /// Audio and transcript are mutually exclusive: a new selection replaces
    /// whichever one was chosen before.
    pub(crate) fn select_recording(&mut self, kind: RecordingKind, file_name: String) {
        self.recording = Some(SelectedRecording { kind, file_name });
        self.mark_dirty();
    }

    pub(crate) fn set_notice(&mut self, level: NoticeLevel, text: impl Into<String>) {
        self.notice = Some(Notice {
            level,
            text: text.into(),
        });
        self.mark_dirty();
    }

    pub(crate) fn clear_notice(&mut self) {
        if self.notice.take().is_some() {
            self.mark_dirty();
        }
    }

    pub(crate) fn set_last_export(&mut self, file_name: String) {
        self.last_export = Some(file_name);
        self.mark_dirty();
    }

    pub(crate) fn is_in_flight(&self, stage: PipelineStage) -> bool {
        self.in_flight.contains(&stage)
    }

    pub(crate) fn has_succeeded(&self, stage: PipelineStage) -> bool {
        self.succeeded.contains(&stage)
    }

    /// Returns `false` for a run that a newer run of `scope` superseded.
    pub(crate) fn accepts_run(&self, run_id: RunId, scope: RunScope) -> bool {
        run_id >= self.current_run(scope)
    }

    /// Returns `false` for stage events of a superseded run. Only runs of the
    /// stage's own scope, or a `Call` run, supersede it.
    pub(crate) fn accepts_stage(&self, run_id: RunId, stage: PipelineStage) -> bool {
        self.accepts_run(run_id, stage.scope())
    }

    /// Supersedes earlier runs of `scope`. Their stages leave `in_flight`
    /// here, since a superseded run reports nothing the state accepts.
    pub(crate) fn begin_run(&mut self, run_id: RunId, scope: RunScope) {
        match scope {
            RunScope::Call => {
                for scope in RunScope::ALL {
                    self.current_runs.insert(scope, run_id);
                }
            }
            RunScope::Plan | RunScope::Recording => {
                self.current_runs.insert(scope, run_id);
            }
        }
        for &stage in scope.stages() {
            self.in_flight.remove(&stage);
            self.succeeded.remove(&stage);
            for panel in stage.panels() {
                self.panels.remove(panel);
            }
        }
        match scope {
            RunScope::Call => {
                self.gate.reset();
                self.last_export = None;
            }
            RunScope::Plan => self.gate.clear(StageId::Plan),
            RunScope::Recording => {
                for stage in [
                    StageId::Recording,
                    StageId::Emails,
                    StageId::Opportunity,
                    StageId::Coaching,
                ] {
                    self.gate.clear(stage);
                }
            }
        }
        self.mark_dirty();
    }

    pub(crate) fn stage_started(&mut self, stage: PipelineStage) {
        self.in_flight.insert(stage);
        self.set_panels(stage, PanelStatus::Pending);
    }

    pub(crate) fn stage_succeeded(&mut self, stage: PipelineStage) {
        self.in_flight.remove(&stage);
        self.succeeded.insert(stage);
        self.set_panels(stage, PanelStatus::Ready);
    }

    /// Result dropped by the pipeline; the stage goes back to not generated.
    pub(crate) fn stage_discarded(&mut self, stage: PipelineStage) {
        self.in_flight.remove(&stage);
        for panel in stage.panels() {
            self.panels.remove(panel);
        }
        self.mark_dirty();
    }

    pub(crate) fn stage_failed(&mut self, stage: PipelineStage, message: &str) {
        self.in_flight.remove(&stage);
        self.succeeded.remove(&stage);
        self.set_panels(stage, PanelStatus::Failed(message.to_string()));
    }

    pub(crate) fn can_generate_plan(&self) -> bool {
        self.gate.is_ready(StageId::Email)
            && self.gate.is_interactable(StageId::Plan)
            && !self.is_in_flight(PipelineStage::Plan)
    }

    pub(crate) fn can_process_recording(&self) -> bool {
        self.recording.is_some()
            && self.gate.is_navigable_to(StageId::Recording)
            && !self.is_in_flight(PipelineStage::Transcript)
    }

    pub(crate) fn can_export(&self) -> bool {
        self.gate.is_ready(StageId::Opportunity)
    }

    fn set_panels(&mut self, stage: PipelineStage, status: PanelStatus) {
        for &panel in stage.panels() {
            self.panels.insert(panel, status.clone());
        }
        self.mark_dirty();
    }
}
