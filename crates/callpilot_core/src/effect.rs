use crate::RecordingKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Read the selected email file and hand it to the pipeline.
    SubmitEmail,
    GeneratePlan,
    ProcessRecording { kind: RecordingKind },
    /// Ask the user for endpoint and token before any completion call.
    RequestConfiguration,
    ExportOpportunity,
}
