use crate::{FailureKind, PipelineStage, RecordingKind, RunId, RunScope, StageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// Settings were loaded or saved; `configured` is false without a token.
    ConfigurationChanged { configured: bool },
    /// User picked the email thread file.
    EmailSelected { file_name: String },
    /// User picked an audio recording or a transcript; replaces the other.
    RecordingSelected {
        kind: RecordingKind,
        file_name: String,
    },
    /// User clicked "Generate call plan".
    GeneratePlanClicked,
    /// User clicked "Process recording".
    ProcessRecordingClicked,
    /// User clicked a tab.
    StageSelected(StageId),
    /// User clicked "Export".
    ExportClicked,
    /// Export file was written.
    ExportFinished { file_name: String },
    /// Export could not be produced.
    ExportFailed { message: String },
    /// User dismissed the current notice.
    NoticeDismissed,
    /// Pipeline began a run; earlier runs of the same scope are superseded,
    /// and a `Call` run supersedes every scope.
    RunStarted { run_id: RunId, scope: RunScope },
    /// Pipeline issued a stage.
    StageStarted { run_id: RunId, stage: PipelineStage },
    /// Pipeline stored a stage's artifact.
    StageSucceeded { run_id: RunId, stage: PipelineStage },
    /// Pipeline dropped a stage result because a newer run took over.
    StageDiscarded { run_id: RunId, stage: PipelineStage },
    /// Pipeline stage failed; its dependents did not run.
    StageFailed {
        run_id: RunId,
        stage: PipelineStage,
        failure: FailureKind,
        message: String,
    },
    /// UI/render tick to coalesce rendering.
    Tick,
    /// Fallback for placeholder wiring.
    NoOp,
}
