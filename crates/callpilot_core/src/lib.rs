//! CallPilot core: pure UI state machine, stage gate and view-model helpers.
mod effect;
mod gate;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use gate::{GateEvent, StageGate, StageId};
pub use msg::Msg;
pub use state::{
    AppState, FailureKind, Notice, NoticeLevel, Panel, PanelStatus, PipelineStage, RecordingKind,
    RunId, RunScope, SelectedRecording,
};
pub use update::update;
pub use view_model::{ActionStates, AppViewModel, PanelView, TabView};
