use std::path::PathBuf;
use std::sync::mpsc;

use callpilot_core::{Effect, FailureKind, Msg, PipelineStage, RecordingKind, RunScope};
use callpilot_engine::{ExportError, PipelineController, PipelineEvent, RecordingInput};
use chrono::Utc;
use pilot_logging::{pilot_error, pilot_warn};

/// Inputs the user picked for this call, already read from disk.
pub(crate) struct CallInputs {
    pub email: String,
    pub recording: RecordingInput,
}

/// Executes effects against the pipeline and turns the resulting pipeline
/// events back into messages.
pub(crate) struct EffectRunner {
    pipeline: PipelineController,
    events: mpsc::Receiver<PipelineEvent>,
    inputs: CallInputs,
    export_dir: PathBuf,
}

impl EffectRunner {
    pub fn new(
        pipeline: PipelineController,
        events: mpsc::Receiver<PipelineEvent>,
        inputs: CallInputs,
        export_dir: PathBuf,
    ) -> Self {
        Self {
            pipeline,
            events,
            inputs,
            export_dir,
        }
    }

    pub fn pipeline(&self) -> &PipelineController {
        &self.pipeline
    }

    pub async fn run(&self, effect: Effect) -> Vec<Msg> {
        match effect {
            Effect::SubmitEmail => {
                self.pipeline.submit_email(&self.inputs.email).await;
            }
            Effect::GeneratePlan => {
                self.pipeline.generate_plan().await;
            }
            Effect::ProcessRecording { kind } => {
                if kind != recording_kind(&self.inputs.recording) {
                    pilot_warn!("Selected recording kind {:?} does not match the input", kind);
                }
                self.pipeline
                    .process_recording(self.inputs.recording.clone())
                    .await;
            }
            Effect::RequestConfiguration => {
                eprintln!(
                    "The completion service is not configured. Run `callpilot configure --endpoint <URL> --token <TOKEN>` first."
                );
            }
            Effect::ExportOpportunity => return vec![self.export()],
        }
        self.drain()
    }

    fn export(&self) -> Msg {
        let timestamp = Utc::now().format("%Y-%m-%dT%H%M%SZ").to_string();
        match self.pipeline.export_to(&self.export_dir, &timestamp) {
            Ok(path) => Msg::ExportFinished {
                file_name: path.display().to_string(),
            },
            Err(err @ ExportError::MissingOpportunity) => {
                pilot_warn!("Export not produced: {}", err);
                Msg::ExportFailed {
                    message: err.to_string(),
                }
            }
            Err(err) => {
                pilot_error!("Failed to write export: {}", err);
                Msg::ExportFailed {
                    message: err.to_string(),
                }
            }
        }
    }

    fn drain(&self) -> Vec<Msg> {
        self.events.try_iter().map(map_event).collect()
    }
}

fn recording_kind(input: &RecordingInput) -> RecordingKind {
    match input {
        RecordingInput::Audio(_) => RecordingKind::Audio,
        RecordingInput::Transcript(_) => RecordingKind::Transcript,
    }
}

pub(crate) fn map_event(event: PipelineEvent) -> Msg {
    match event {
        PipelineEvent::RunStarted { run_id, scope } => Msg::RunStarted {
            run_id,
            scope: map_scope(scope),
        },
        PipelineEvent::StageStarted { run_id, stage } => Msg::StageStarted {
            run_id,
            stage: map_stage(stage),
        },
        PipelineEvent::StageSucceeded { run_id, stage } => Msg::StageSucceeded {
            run_id,
            stage: map_stage(stage),
        },
        PipelineEvent::StageFailed {
            run_id,
            stage,
            error,
        } => Msg::StageFailed {
            run_id,
            stage: map_stage(stage),
            failure: map_failure(&error.kind),
            message: error.message,
        },
        PipelineEvent::StageDiscarded { run_id, stage } => Msg::StageDiscarded {
            run_id,
            stage: map_stage(stage),
        },
    }
}

fn map_scope(scope: callpilot_engine::RunScope) -> RunScope {
    match scope {
        callpilot_engine::RunScope::Call => RunScope::Call,
        callpilot_engine::RunScope::Plan => RunScope::Plan,
        callpilot_engine::RunScope::Recording => RunScope::Recording,
    }
}

fn map_stage(stage: callpilot_engine::PipelineStage) -> PipelineStage {
    match stage {
        callpilot_engine::PipelineStage::Email => PipelineStage::Email,
        callpilot_engine::PipelineStage::Plan => PipelineStage::Plan,
        callpilot_engine::PipelineStage::Transcript => PipelineStage::Transcript,
        callpilot_engine::PipelineStage::ClientEmail => PipelineStage::ClientEmail,
        callpilot_engine::PipelineStage::InternalEmail => PipelineStage::InternalEmail,
        callpilot_engine::PipelineStage::Opportunity => PipelineStage::Opportunity,
        callpilot_engine::PipelineStage::Sow => PipelineStage::Sow,
        callpilot_engine::PipelineStage::Coaching => PipelineStage::Coaching,
    }
}

fn map_failure(kind: &callpilot_engine::FailureKind) -> FailureKind {
    use callpilot_engine::FailureKind as Engine;
    match kind {
        Engine::Configuration | Engine::Authentication => FailureKind::Configuration,
        Engine::Transport | Engine::Timeout => FailureKind::Transport,
        Engine::Remote | Engine::MalformedResponse => FailureKind::Remote,
        Engine::MalformedStructuredOutput => FailureKind::MalformedStructuredOutput,
        Engine::InvalidRequest
        | Engine::InvalidInput
        | Engine::MissingArtifact { .. }
        | Engine::Stale { .. }
        | Engine::AlreadyStored { .. } => FailureKind::Input,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failures_keep_their_category() {
        let event = PipelineEvent::StageFailed {
            run_id: 3,
            stage: callpilot_engine::PipelineStage::Opportunity,
            error: callpilot_engine::interpret_response(401, "").unwrap_err(),
        };
        assert_eq!(
            map_event(event),
            Msg::StageFailed {
                run_id: 3,
                stage: PipelineStage::Opportunity,
                failure: FailureKind::Configuration,
                message: "HTTP status 401".to_string(),
            }
        );
    }

    #[test]
    fn discarded_stage_stays_a_terminal_message() {
        let event = PipelineEvent::StageDiscarded {
            run_id: 4,
            stage: callpilot_engine::PipelineStage::Transcript,
        };
        assert_eq!(
            map_event(event),
            Msg::StageDiscarded {
                run_id: 4,
                stage: PipelineStage::Transcript,
            }
        );
    }

    #[test]
    fn transcript_input_maps_to_transcript_kind() {
        let input = RecordingInput::Transcript("text".to_string());
        assert_eq!(recording_kind(&input), RecordingKind::Transcript);
    }
}
