use pilot_logging::{pilot_debug, pilot_info, pilot_warn};

use crate::{
    AppState, Effect, FailureKind, Msg, NoticeLevel, PipelineStage, RunId, RunScope, StageId,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::ConfigurationChanged { configured } => {
            state.set_configured(configured);
            if configured {
                state.clear_notice();
            }
            Vec::new()
        }
        Msg::EmailSelected { file_name } => {
            state.set_email_file(file_name);
            vec![Effect::SubmitEmail]
        }
        Msg::RecordingSelected { kind, file_name } => {
            state.select_recording(kind, file_name);
            Vec::new()
        }
        Msg::GeneratePlanClicked => {
            if state.email_file().is_none() || !state.gate().is_ready(StageId::Email) {
                state.set_notice(NoticeLevel::Error, "Select an email thread first.");
                Vec::new()
            } else if !state.configured() {
                request_configuration(&mut state)
            } else if state.can_generate_plan() {
                vec![Effect::GeneratePlan]
            } else {
                Vec::new()
            }
        }
        Msg::ProcessRecordingClicked => {
            if !state.gate().is_navigable_to(StageId::Recording) {
                pilot_warn!("Process requested before the call plan is ready");
                Vec::new()
            } else if state.recording().is_none() {
                state.set_notice(
                    NoticeLevel::Error,
                    "Select an audio recording or a transcript first.",
                );
                Vec::new()
            } else if !state.configured() {
                request_configuration(&mut state)
            } else if state.can_process_recording() {
                let kind = state.recording().map(|selected| selected.kind);
                kind.map(|kind| vec![Effect::ProcessRecording { kind }])
                    .unwrap_or_default()
            } else {
                Vec::new()
            }
        }
        Msg::StageSelected(stage) => {
            if state.gate_mut().navigate(stage) {
                state.mark_dirty();
            }
            Vec::new()
        }
        Msg::ExportClicked => {
            if state.can_export() {
                vec![Effect::ExportOpportunity]
            } else {
                state.set_notice(
                    NoticeLevel::Error,
                    "The opportunity record is not ready for export yet.",
                );
                Vec::new()
            }
        }
        Msg::ExportFinished { file_name } => {
            state.set_notice(NoticeLevel::Info, format!("Exported to {file_name}"));
            state.set_last_export(file_name);
            Vec::new()
        }
        Msg::ExportFailed { message } => {
            state.set_notice(NoticeLevel::Error, format!("Export failed: {message}"));
            Vec::new()
        }
        Msg::NoticeDismissed => {
            state.clear_notice();
            Vec::new()
        }
        Msg::RunStarted { run_id, scope } => {
            if state.accepts_run(run_id, scope) {
                pilot_info!("Run {} started ({:?})", run_id, scope);
                state.begin_run(run_id, scope);
            } else {
                ignore_stale(run_id, scope, &state);
            }
            Vec::new()
        }
        Msg::StageStarted { run_id, stage } => {
            if state.accepts_stage(run_id, stage) {
                state.stage_started(stage);
            } else {
                ignore_stale(run_id, stage.scope(), &state);
            }
            Vec::new()
        }
        Msg::StageSucceeded { run_id, stage } => {
            if state.accepts_stage(run_id, stage) {
                state.stage_succeeded(stage);
                unlock_gate(&mut state, stage);
            } else {
                ignore_stale(run_id, stage.scope(), &state);
            }
            Vec::new()
        }
        Msg::StageDiscarded { run_id, stage } => {
            if state.accepts_stage(run_id, stage) {
                pilot_debug!("Run {}: {:?} result discarded", run_id, stage);
                state.stage_discarded(stage);
            } else {
                ignore_stale(run_id, stage.scope(), &state);
            }
            Vec::new()
        }
        Msg::StageFailed {
            run_id,
            stage,
            failure,
            message,
        } => {
            if !state.accepts_stage(run_id, stage) {
                ignore_stale(run_id, stage.scope(), &state);
                return (state, Vec::new());
            }
            state.stage_failed(stage, &message);
            state.set_notice(
                NoticeLevel::Error,
                format!("{} failed: {}", stage.label(), message),
            );
            if failure == FailureKind::Configuration {
                vec![Effect::RequestConfiguration]
            } else {
                Vec::new()
            }
        }
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn request_configuration(state: &mut AppState) -> Vec<Effect> {
    state.set_notice(
        NoticeLevel::Error,
        "Please configure the completion endpoint and token first.",
    );
    vec![Effect::RequestConfiguration]
}

/// Maps a finished pipeline stage onto the tab it completes.
fn unlock_gate(state: &mut AppState, stage: PipelineStage) {
    let gate_stage = match stage {
        PipelineStage::Email => Some(StageId::Email),
        PipelineStage::Plan => Some(StageId::Plan),
        PipelineStage::Transcript => Some(StageId::Recording),
        PipelineStage::ClientEmail | PipelineStage::InternalEmail => {
            let both = state.has_succeeded(PipelineStage::ClientEmail)
                && state.has_succeeded(PipelineStage::InternalEmail);
            both.then_some(StageId::Emails)
        }
        PipelineStage::Opportunity => Some(StageId::Opportunity),
        PipelineStage::Coaching => Some(StageId::Coaching),
        PipelineStage::Sow => None,
    };
    if let Some(gate_stage) = gate_stage {
        let gate = state.gate_mut();
        gate.mark_ready(gate_stage);
        gate.enable_next(gate_stage);
        state.mark_dirty();
    }
}

fn ignore_stale(run_id: RunId, scope: RunScope, state: &AppState) {
    pilot_debug!(
        "Ignoring event from run {} (current {:?} run {})",
        run_id,
        scope,
        state.current_run(scope)
    );
}
