use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::{mpsc, Arc};

use anyhow::{bail, Context, Result};
use callpilot_core::{update, AppState, AppViewModel, Msg, PanelStatus, RecordingKind, StageId};
use callpilot_engine::{
    ChannelPipelineSink, CompletionClient, LlmSettings, PipelineController, RecordingInput,
    ReqwestCompletionClient,
};
use pilot_logging::{pilot_debug, pilot_info};

use super::effects::{CallInputs, EffectRunner};
use super::persistence::{default_settings_path, load_settings, save_settings};
use super::render::{render_results, render_status};
use crate::cli::{Cli, Command, ConfigureArgs, RunArgs};

pub async fn run(cli: Cli) -> Result<()> {
    let settings_path = match cli.config {
        Some(path) => path,
        None => default_settings_path()?,
    };
    match cli.command {
        Command::Configure(args) => configure(&settings_path, args),
        Command::ShowConfig => {
            let settings = load_settings(&settings_path);
            println!("settings file: {}", settings_path.display());
            println!("{settings:#?}");
            Ok(())
        }
        Command::Run(args) => run_call(args, load_settings(&settings_path)).await,
    }
}

fn configure(path: &Path, args: ConfigureArgs) -> Result<()> {
    let mut settings = LlmSettings::validated(&args.endpoint, &args.token)?;
    if let Some(model) = args.model.filter(|model| !model.trim().is_empty()) {
        settings.model = model.trim().to_string();
    }
    if let Some(secs) = args.timeout {
        settings.request_timeout = std::time::Duration::from_secs(secs.max(1));
    }
    let written = save_settings(path, &settings)?;
    println!("Saved settings to {}", written.display());
    Ok(())
}

/// Drives the UI model through one call, the way a user would click through
/// the tabs.
async fn run_call(args: RunArgs, settings: LlmSettings) -> Result<()> {
    let email = fs::read_to_string(&args.email)
        .with_context(|| format!("reading email thread {}", args.email.display()))?;
    let (kind, recording_path, recording) = match (&args.audio, &args.transcript) {
        (Some(path), _) => {
            let bytes = fs::read(path)
                .with_context(|| format!("reading audio recording {}", path.display()))?;
            (RecordingKind::Audio, path, RecordingInput::Audio(bytes))
        }
        (None, Some(path)) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading transcript {}", path.display()))?;
            (RecordingKind::Transcript, path, RecordingInput::Transcript(text))
        }
        (None, None) => bail!("either --audio or --transcript is required"),
    };

    let client = Arc::new(ReqwestCompletionClient::new(settings));
    let configured = client.is_configured();
    let (event_tx, event_rx) = mpsc::channel();
    let pipeline = PipelineController::new(client, Arc::new(ChannelPipelineSink::new(event_tx)));
    let runner = EffectRunner::new(
        pipeline,
        event_rx,
        CallInputs { email, recording },
        args.output.clone(),
    );
    let mut app = App::new(runner);

    app.dispatch(Msg::ConfigurationChanged { configured }).await;
    app.dispatch(Msg::EmailSelected {
        file_name: file_label(&args.email),
    })
    .await;
    app.dispatch(Msg::GeneratePlanClicked).await;
    if !configured {
        bail!("the completion service is not configured");
    }
    app.dispatch(Msg::StageSelected(StageId::Plan)).await;
    app.dispatch(Msg::RecordingSelected {
        kind,
        file_name: file_label(recording_path),
    })
    .await;
    app.dispatch(Msg::ProcessRecordingClicked).await;
    app.show_furthest_tab().await;
    if args.export {
        app.dispatch(Msg::ExportClicked).await;
    }

    println!("{}", app.report());
    let view = app.view();
    let failed = view
        .panels
        .iter()
        .filter(|panel| matches!(panel.status, PanelStatus::Failed(_)))
        .count();
    if failed > 0 {
        pilot_info!("Call finished with {} failed panel(s)", failed);
    }
    Ok(())
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

struct App {
    state: AppState,
    runner: EffectRunner,
}

impl App {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
        }
    }

    fn view(&self) -> AppViewModel {
        self.state.view()
    }

    fn report(&self) -> String {
        render_results(&self.view(), self.runner.pipeline())
    }

    /// Applies `msg` and every message produced by the effects it triggers.
    async fn dispatch(&mut self, msg: Msg) {
        let mut inbox = VecDeque::from([msg]);
        while let Some(msg) = inbox.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (state, effects) = update(state, msg);
            self.state = state;

            for event in self.state.take_gate_events() {
                pilot_debug!("Gate: {:?}", event);
            }
            if self.state.consume_dirty() {
                println!("{}", render_status(&self.state.view()));
            }
            for effect in effects {
                inbox.extend(self.runner.run(effect).await);
            }
        }
    }

    async fn show_furthest_tab(&mut self) {
        let furthest = StageId::ALL
            .iter()
            .rev()
            .copied()
            .find(|stage| self.state.gate().is_navigable_to(*stage));
        if let Some(stage) = furthest {
            self.dispatch(Msg::StageSelected(stage)).await;
        }
    }
}
