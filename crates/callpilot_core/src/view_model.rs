use crate::{Notice, Panel, PanelStatus, SelectedRecording, StageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppViewModel {
    pub tabs: Vec<TabView>,
    pub active_stage: StageId,
    pub panels: Vec<PanelView>,
    pub actions: ActionStates,
    pub email_file: Option<String>,
    pub recording: Option<SelectedRecording>,
    pub configured: bool,
    pub busy: bool,
    pub notice: Option<Notice>,
    pub last_export: Option<String>,
    pub dirty: bool,
}

impl AppViewModel {
    pub fn tab(&self, stage: StageId) -> Option<&TabView> {
        self.tabs.iter().find(|tab| tab.stage == stage)
    }

    pub fn panel(&self, panel: Panel) -> PanelStatus {
        self.panels
            .iter()
            .find(|view| view.panel == panel)
            .map(|view| view.status.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabView {
    pub stage: StageId,
    pub label: &'static str,
    pub ready: bool,
    pub navigable: bool,
    pub interactable: bool,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelView {
    pub panel: Panel,
    pub status: PanelStatus,
}

/// Enablement of the action buttons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ActionStates {
    pub generate_plan: bool,
    pub process_recording: bool,
    pub export: bool,
}
