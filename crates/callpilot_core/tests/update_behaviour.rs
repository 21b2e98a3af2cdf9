use std::sync::Once;

use callpilot_core::{
    update, AppState, Effect, FailureKind, Msg, NoticeLevel, Panel, PanelStatus, PipelineStage,
    RecordingKind, RunScope, StageId,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(pilot_logging::initialize_for_tests);
}

fn apply(state: AppState, msgs: Vec<Msg>) -> (AppState, Vec<Effect>) {
    let mut effects = Vec::new();
    let mut state = state;
    for msg in msgs {
        let (next, mut emitted) = update(state, msg);
        effects.append(&mut emitted);
        state = next;
    }
    (state, effects)
}

fn succeeded(run_id: u64, stage: PipelineStage) -> Vec<Msg> {
    vec![
        Msg::StageStarted { run_id, stage },
        Msg::StageSucceeded { run_id, stage },
    ]
}

/// Configured app with the email submitted (run 1) and the plan ready (run 2).
fn with_plan_ready() -> AppState {
    let mut msgs = vec![
        Msg::ConfigurationChanged { configured: true },
        Msg::EmailSelected {
            file_name: "thread.txt".to_string(),
        },
        Msg::RunStarted {
            run_id: 1,
            scope: RunScope::Call,
        },
    ];
    msgs.extend(succeeded(1, PipelineStage::Email));
    msgs.push(Msg::RunStarted {
        run_id: 2,
        scope: RunScope::Plan,
    });
    msgs.extend(succeeded(2, PipelineStage::Plan));
    apply(AppState::new(), msgs).0
}

#[test]
fn selecting_an_email_requests_submission() {
    init_logging();
    let (state, effects) = update(
        AppState::new(),
        Msg::EmailSelected {
            file_name: "thread.txt".to_string(),
        },
    );

    assert_eq!(effects, vec![Effect::SubmitEmail]);
    assert_eq!(state.view().email_file.as_deref(), Some("thread.txt"));
    assert!(!state.view().actions.generate_plan);
}

#[test]
fn plan_success_unlocks_the_recording_tab() {
    init_logging();
    let state = with_plan_ready();
    let view = state.view();

    assert!(view.tab(StageId::Plan).unwrap().ready);
    let recording = view.tab(StageId::Recording).unwrap();
    assert!(recording.navigable);
    assert!(recording.interactable);
    assert!(!recording.ready);
    assert_eq!(view.panel(Panel::Plan), PanelStatus::Ready);
    assert!(!view.tab(StageId::Emails).unwrap().navigable);
}

#[test]
fn generate_plan_without_settings_asks_for_configuration() {
    init_logging();
    let mut msgs = vec![
        Msg::ConfigurationChanged { configured: false },
        Msg::EmailSelected {
            file_name: "thread.txt".to_string(),
        },
        Msg::RunStarted {
            run_id: 1,
            scope: RunScope::Call,
        },
    ];
    msgs.extend(succeeded(1, PipelineStage::Email));
    let (state, _) = apply(AppState::new(), msgs);

    let (state, effects) = update(state, Msg::GeneratePlanClicked);

    assert_eq!(effects, vec![Effect::RequestConfiguration]);
    assert_eq!(state.view().notice.unwrap().level, NoticeLevel::Error);
}

#[test]
fn generate_plan_is_ignored_while_the_plan_is_in_flight() {
    init_logging();
    let mut msgs = vec![
        Msg::ConfigurationChanged { configured: true },
        Msg::EmailSelected {
            file_name: "thread.txt".to_string(),
        },
    ];
    msgs.extend(succeeded(1, PipelineStage::Email));
    let (state, _) = apply(AppState::new(), msgs);

    let (state, effects) = update(state, Msg::GeneratePlanClicked);
    assert_eq!(effects, vec![Effect::GeneratePlan]);

    let (state, _) = update(
        state,
        Msg::StageStarted {
            run_id: 2,
            stage: PipelineStage::Plan,
        },
    );
    let (state, effects) = update(state, Msg::GeneratePlanClicked);
    assert!(effects.is_empty());
    assert!(state.view().busy);
}

#[test]
fn recording_selection_is_mutually_exclusive() {
    init_logging();
    let (state, _) = apply(
        with_plan_ready(),
        vec![
            Msg::RecordingSelected {
                kind: RecordingKind::Audio,
                file_name: "call.mp3".to_string(),
            },
            Msg::RecordingSelected {
                kind: RecordingKind::Transcript,
                file_name: "call.txt".to_string(),
            },
        ],
    );

    let recording = state.view().recording.unwrap();
    assert_eq!(recording.kind, RecordingKind::Transcript);
    assert_eq!(recording.file_name, "call.txt");

    let (_, effects) = update(state, Msg::ProcessRecordingClicked);
    assert_eq!(
        effects,
        vec![Effect::ProcessRecording {
            kind: RecordingKind::Transcript
        }]
    );
}

#[test]
fn process_before_plan_is_ready_does_nothing() {
    init_logging();
    let (state, effects) = apply(
        AppState::new(),
        vec![
            Msg::ConfigurationChanged { configured: true },
            Msg::RecordingSelected {
                kind: RecordingKind::Audio,
                file_name: "call.mp3".to_string(),
            },
            Msg::ProcessRecordingClicked,
        ],
    );

    assert!(effects.is_empty());
    assert!(!state.view().actions.process_recording);
}

#[test]
fn emails_tab_needs_both_follow_up_emails() {
    init_logging();
    let mut msgs = vec![Msg::RunStarted {
        run_id: 3,
        scope: RunScope::Recording,
    }];
    msgs.extend(succeeded(3, PipelineStage::Transcript));
    msgs.extend(succeeded(3, PipelineStage::ClientEmail));
    let (state, _) = apply(with_plan_ready(), msgs);
    assert!(!state.view().tab(StageId::Emails).unwrap().ready);

    let (state, _) = apply(state, succeeded(3, PipelineStage::InternalEmail));
    let view = state.view();
    assert!(view.tab(StageId::Recording).unwrap().ready);
    assert!(view.tab(StageId::Emails).unwrap().ready);
    assert!(view.tab(StageId::Opportunity).unwrap().navigable);
}

#[test]
fn opportunity_failure_keeps_sow_and_locks_export() {
    init_logging();
    let mut msgs = vec![Msg::RunStarted {
        run_id: 3,
        scope: RunScope::Recording,
    }];
    msgs.extend(succeeded(3, PipelineStage::Transcript));
    msgs.push(Msg::StageStarted {
        run_id: 3,
        stage: PipelineStage::Opportunity,
    });
    msgs.extend(succeeded(3, PipelineStage::Sow));
    msgs.push(Msg::StageFailed {
        run_id: 3,
        stage: PipelineStage::Opportunity,
        failure: FailureKind::MalformedStructuredOutput,
        message: "expected value at line 1 column 2".to_string(),
    });
    let (state, effects) = apply(with_plan_ready(), msgs);
    let view = state.view();

    assert!(effects.is_empty());
    assert_eq!(view.panel(Panel::Sow), PanelStatus::Ready);
    assert!(matches!(view.panel(Panel::Opportunity), PanelStatus::Failed(_)));
    assert!(!view.tab(StageId::Opportunity).unwrap().ready);
    assert!(!view.actions.export);
    let notice = view.notice.unwrap();
    assert!(notice.text.starts_with("Opportunity extraction failed"));

    let (_, effects) = update(state, Msg::ExportClicked);
    assert!(effects.is_empty());
}

#[test]
fn coaching_failure_degrades_both_panels() {
    init_logging();
    let msgs = vec![
        Msg::StageStarted {
            run_id: 2,
            stage: PipelineStage::Coaching,
        },
        Msg::StageFailed {
            run_id: 2,
            stage: PipelineStage::Coaching,
            failure: FailureKind::MalformedStructuredOutput,
            message: "not json".to_string(),
        },
    ];
    let (state, _) = apply(with_plan_ready(), msgs);
    let view = state.view();

    assert_eq!(view.panel(Panel::Metrics), PanelStatus::Failed("not json".to_string()));
    assert_eq!(view.panel(Panel::Analysis), PanelStatus::Failed("not json".to_string()));
    assert_eq!(view.panel(Panel::Plan), PanelStatus::Ready);
}

#[test]
fn configuration_failure_requests_settings() {
    init_logging();
    let (_, effects) = update(
        with_plan_ready(),
        Msg::StageFailed {
            run_id: 2,
            stage: PipelineStage::Plan,
            failure: FailureKind::Configuration,
            message: "completion endpoint is not configured".to_string(),
        },
    );

    assert_eq!(effects, vec![Effect::RequestConfiguration]);
}

#[test]
fn events_from_superseded_runs_are_ignored() {
    init_logging();
    let (state, _) = update(
        with_plan_ready(),
        Msg::RunStarted {
            run_id: 4,
            scope: RunScope::Recording,
        },
    );
    let before = state.view();

    let (state, _) = apply(state, succeeded(3, PipelineStage::Transcript));

    assert_eq!(state.view().tab(StageId::Recording), before.tab(StageId::Recording));
    assert_eq!(state.view().panel(Panel::Transcript), PanelStatus::Empty);
}

#[test]
fn plan_rerun_leaves_a_running_recording_alone() {
    init_logging();
    let msgs = vec![
        Msg::RecordingSelected {
            kind: RecordingKind::Audio,
            file_name: "call.mp3".to_string(),
        },
        Msg::RunStarted {
            run_id: 3,
            scope: RunScope::Recording,
        },
        Msg::StageStarted {
            run_id: 3,
            stage: PipelineStage::Transcript,
        },
        Msg::GeneratePlanClicked,
        Msg::RunStarted {
            run_id: 4,
            scope: RunScope::Plan,
        },
        Msg::StageStarted {
            run_id: 4,
            stage: PipelineStage::Plan,
        },
        Msg::StageSucceeded {
            run_id: 4,
            stage: PipelineStage::Plan,
        },
    ];
    let (state, _) = apply(with_plan_ready(), msgs);
    assert_eq!(state.view().panel(Panel::Transcript), PanelStatus::Pending);

    let (state, _) = apply(state, vec![Msg::StageSucceeded {
        run_id: 3,
        stage: PipelineStage::Transcript,
    }]);
    let view = state.view();
    assert!(!view.busy);
    assert_eq!(view.panel(Panel::Transcript), PanelStatus::Ready);
    assert!(view.tab(StageId::Recording).unwrap().ready);
    assert!(view.actions.process_recording);

    let (_, effects) = update(state, Msg::ProcessRecordingClicked);
    assert_eq!(
        effects,
        vec![Effect::ProcessRecording {
            kind: RecordingKind::Audio
        }]
    );
}

#[test]
fn discarded_stage_is_no_longer_in_flight() {
    init_logging();
    let msgs = vec![
        Msg::RecordingSelected {
            kind: RecordingKind::Transcript,
            file_name: "call.txt".to_string(),
        },
        Msg::RunStarted {
            run_id: 3,
            scope: RunScope::Recording,
        },
        Msg::StageStarted {
            run_id: 3,
            stage: PipelineStage::Transcript,
        },
        Msg::StageDiscarded {
            run_id: 3,
            stage: PipelineStage::Transcript,
        },
    ];
    let (state, _) = apply(with_plan_ready(), msgs);
    let view = state.view();

    assert!(!view.busy);
    assert_eq!(view.panel(Panel::Transcript), PanelStatus::Empty);
    assert!(view.actions.process_recording);
}

#[test]
fn superseding_run_frees_the_stages_it_restarts() {
    init_logging();
    let msgs = vec![
        Msg::RunStarted {
            run_id: 3,
            scope: RunScope::Recording,
        },
        Msg::StageStarted {
            run_id: 3,
            stage: PipelineStage::Transcript,
        },
        Msg::RunStarted {
            run_id: 4,
            scope: RunScope::Recording,
        },
    ];
    let (state, _) = apply(with_plan_ready(), msgs);
    assert!(!state.view().busy);

    let (state, _) = apply(state, vec![Msg::StageDiscarded {
        run_id: 3,
        stage: PipelineStage::Transcript,
    }]);
    assert!(!state.view().busy);
    assert_eq!(state.current_run(RunScope::Recording), 4);
    assert_eq!(state.current_run(RunScope::Plan), 2);
}

#[test]
fn new_call_resets_the_gate() {
    init_logging();
    let (state, _) = apply(
        with_plan_ready(),
        vec![
            Msg::StageSelected(StageId::Recording),
            Msg::RunStarted {
                run_id: 5,
                scope: RunScope::Call,
            },
        ],
    );
    let view = state.view();

    assert_eq!(view.active_stage, StageId::Email);
    assert!(view.tabs.iter().all(|tab| !tab.ready));
    assert_eq!(view.panel(Panel::Plan), PanelStatus::Empty);
}

#[test]
fn plan_rerun_clears_only_the_plan_tab() {
    init_logging();
    let (mut state, _) = apply(
        with_plan_ready(),
        vec![
            Msg::StageSelected(StageId::Plan),
            Msg::RunStarted {
                run_id: 3,
                scope: RunScope::Plan,
            },
        ],
    );
    let view = state.view();

    assert!(view.tab(StageId::Email).unwrap().ready);
    assert!(!view.tab(StageId::Plan).unwrap().ready);
    assert!(!view.tab(StageId::Recording).unwrap().navigable);
    assert!(state.consume_dirty());
    assert!(!state.consume_dirty());
}

#[test]
fn tab_selection_follows_the_gate() {
    init_logging();
    let (mut state, _) = update(AppState::new(), Msg::StageSelected(StageId::Plan));
    assert_eq!(state.view().active_stage, StageId::Email);
    assert!(!state.consume_dirty());

    let (state, _) = update(with_plan_ready(), Msg::StageSelected(StageId::Recording));
    assert_eq!(state.view().active_stage, StageId::Recording);
}

#[test]
fn export_finished_reports_the_file() {
    init_logging();
    let (state, _) = update(
        AppState::new(),
        Msg::ExportFinished {
            file_name: "Acme--20260101-120000.csv".to_string(),
        },
    );
    let view = state.view();

    assert_eq!(view.last_export.as_deref(), Some("Acme--20260101-120000.csv"));
    assert_eq!(view.notice.unwrap().level, NoticeLevel::Info);

    let (state, _) = update(state, Msg::NoticeDismissed);
    assert!(state.view().notice.is_none());
}
