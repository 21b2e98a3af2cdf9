//! CallPilot engine: completion client, artifact store, generation pipeline
//! and export.
mod artifact;
mod coaching;
mod completion;
mod export;
mod filename;
mod opportunity;
mod persist;
mod pipeline;
pub mod prompts;
mod settings;
mod structured;
mod types;

pub use artifact::{Artifact, ArtifactStore, StoreError};
pub use coaching::{display_label, CoachingEntries, CoachingFeedback};
pub use completion::{
    interpret_response, CompletionClient, CompletionRequest, ReqwestCompletionClient,
    NO_CONTENT_SENTINEL,
};
pub use export::{parse_delimited, to_export, ExportError, ExportFile, SOW_LABEL};
pub use filename::export_filename;
pub use opportunity::{OpportunityField, OpportunityRecord, NOT_AVAILABLE, TAGS_LABEL};
pub use persist::{ensure_dir, AtomicFileWriter, PersistError};
pub use pipeline::{
    ChannelPipelineSink, PipelineController, PipelineSink, RecordingInput, RunReport,
    StageOutcome,
};
pub use settings::{LlmSettings, SettingsError, DEFAULT_CLIENT_TAG, DEFAULT_MODEL};
pub use types::{FailureKind, PipelineEvent, PipelineStage, RunId, RunScope, StageError};
