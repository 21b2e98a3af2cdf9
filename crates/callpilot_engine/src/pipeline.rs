use std::collections::BTreeMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};

use base64::Engine as _;
use pilot_logging::{pilot_debug, pilot_info, pilot_warn};

use crate::artifact::{Artifact, ArtifactStore};
use crate::coaching::CoachingFeedback;
use crate::completion::{CompletionClient, CompletionRequest};
use crate::export::{to_export, ExportError, ExportFile};
use crate::filename::export_filename;
use crate::opportunity::OpportunityRecord;
use crate::persist::AtomicFileWriter;
use crate::prompts;
use crate::{FailureKind, PipelineEvent, PipelineStage, RunId, RunScope, StageError};

pub type StageOutcome = Result<(), StageError>;

/// Receives pipeline status events as they happen.
pub trait PipelineSink: Send + Sync {
    fn emit(&self, event: PipelineEvent);
}

pub struct ChannelPipelineSink {
    tx: mpsc::Sender<PipelineEvent>,
}

impl ChannelPipelineSink {
    pub fn new(tx: mpsc::Sender<PipelineEvent>) -> Self {
        Self { tx }
    }
}

impl PipelineSink for ChannelPipelineSink {
    fn emit(&self, event: PipelineEvent) {
        let _ = self.tx.send(event);
    }
}

/// Source of the transcript for a recording run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordingInput {
    /// Raw audio bytes; transcribed by the completion service.
    Audio(Vec<u8>),
    /// Ready transcript text; stored as is.
    Transcript(String),
}

/// Per-stage outcomes of one run, in stage order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub run_id: RunId,
    pub outcomes: BTreeMap<PipelineStage, StageOutcome>,
}

impl RunReport {
    fn new(run_id: RunId) -> Self {
        Self {
            run_id,
            outcomes: BTreeMap::new(),
        }
    }

    fn record(&mut self, stage: PipelineStage, outcome: StageOutcome) {
        self.outcomes.insert(stage, outcome);
    }

    pub fn outcome(&self, stage: PipelineStage) -> Option<&StageOutcome> {
        self.outcomes.get(&stage)
    }

    pub fn succeeded(&self, stage: PipelineStage) -> bool {
        matches!(self.outcome(stage), Some(Ok(())))
    }

    pub fn error(&self, stage: PipelineStage) -> Option<&StageError> {
        self.outcome(stage).and_then(|outcome| outcome.as_ref().err())
    }
}

/// Runs the generation stages and owns every write to the artifact store.
pub struct PipelineController {
    client: Arc<dyn CompletionClient>,
    sink: Arc<dyn PipelineSink>,
    store: Mutex<ArtifactStore>,
}

impl PipelineController {
    pub fn new(client: Arc<dyn CompletionClient>, sink: Arc<dyn PipelineSink>) -> Self {
        Self {
            client,
            sink,
            store: Mutex::new(ArtifactStore::new()),
        }
    }

    /// Most recently issued run id, whatever its scope.
    pub fn latest_run(&self) -> RunId {
        self.store().latest_run()
    }

    pub fn current_run(&self, scope: RunScope) -> RunId {
        self.store().current_run(scope)
    }

    pub fn artifact(&self, stage: PipelineStage) -> Option<Artifact> {
        self.store().get(stage).cloned()
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_configured()
    }

    /// Starts a run, superseding whatever is still in flight for `scope`.
    pub fn begin_run(&self, scope: RunScope) -> RunId {
        let run_id = self.store().begin_run(scope);
        pilot_info!("Run {} started ({:?})", run_id, scope);
        self.sink.emit(PipelineEvent::RunStarted { run_id, scope });
        run_id
    }

    /// Stores a new email thread; everything derived from the previous call is
    /// dropped.
    pub async fn submit_email(&self, email: &str) -> RunReport {
        let run_id = self.begin_run(RunScope::Call);
        let outcome = self
            .run_stage(run_id, PipelineStage::Email, async {
                if email.trim().is_empty() {
                    return Err(StageError::new(
                        FailureKind::InvalidInput,
                        "email thread is empty",
                    ));
                }
                Ok(Artifact::Text(email.to_string()))
            })
            .await;
        let mut report = RunReport::new(run_id);
        report.record(PipelineStage::Email, outcome);
        report
    }

    pub async fn generate_plan(&self) -> RunReport {
        let run_id = self.begin_run(RunScope::Plan);
        let outcome = self
            .run_stage(run_id, PipelineStage::Plan, async {
                let email = self.require_text(PipelineStage::Email)?;
                self.complete(prompts::CALL_PLAN, email)
                    .await
                    .map(Artifact::Text)
            })
            .await;
        let mut report = RunReport::new(run_id);
        report.record(PipelineStage::Plan, outcome);
        report
    }

    /// Transcript first, then every transcript-derived stage concurrently.
    /// A transcript failure skips the dependents.
    pub async fn process_recording(&self, input: RecordingInput) -> RunReport {
        let run_id = self.begin_run(RunScope::Recording);
        let mut report = RunReport::new(run_id);

        let transcript = if self.client.is_configured() {
            self.acquire_transcript(run_id, input).await
        } else {
            self.run_stage(run_id, PipelineStage::Transcript, async {
                Err(not_configured())
            })
            .await
        };
        let transcript_ok = transcript.is_ok();
        report.record(PipelineStage::Transcript, transcript);
        if !transcript_ok {
            pilot_warn!("Run {}: no transcript, dependent stages skipped", run_id);
            return report;
        }

        let ((client_email, internal_email), opportunity, sow, coaching) = futures_util::join!(
            self.generate_follow_up_emails(run_id),
            self.extract_opportunity(run_id),
            self.generate_sow(run_id),
            self.generate_coaching(run_id),
        );
        report.record(PipelineStage::ClientEmail, client_email);
        report.record(PipelineStage::InternalEmail, internal_email);
        report.record(PipelineStage::Opportunity, opportunity);
        report.record(PipelineStage::Sow, sow);
        report.record(PipelineStage::Coaching, coaching);
        report
    }

    pub async fn acquire_transcript(&self, run_id: RunId, input: RecordingInput) -> StageOutcome {
        self.run_stage(run_id, PipelineStage::Transcript, async {
            match input {
                RecordingInput::Transcript(text) => {
                    if text.trim().is_empty() {
                        return Err(StageError::new(
                            FailureKind::InvalidInput,
                            "transcript is empty",
                        ));
                    }
                    Ok(Artifact::Text(text))
                }
                RecordingInput::Audio(bytes) => {
                    if bytes.is_empty() {
                        return Err(StageError::new(
                            FailureKind::InvalidInput,
                            "audio recording is empty",
                        ));
                    }
                    let encoded = base64::engine::general_purpose::STANDARD.encode(&bytes);
                    pilot_debug!(
                        "Run {}: transcribing {} bytes of audio",
                        run_id,
                        bytes.len()
                    );
                    self.complete(prompts::TRANSCRIPTION, encoded)
                        .await
                        .map(Artifact::Text)
                }
            }
        })
        .await
    }

    /// Client and internal emails; issued together, each may fail on its own.
    pub async fn generate_follow_up_emails(&self, run_id: RunId) -> (StageOutcome, StageOutcome) {
        futures_util::join!(
            self.transcript_stage(run_id, PipelineStage::ClientEmail, prompts::CLIENT_EMAIL),
            self.transcript_stage(run_id, PipelineStage::InternalEmail, prompts::INTERNAL_EMAIL),
        )
    }

    pub async fn extract_opportunity(&self, run_id: RunId) -> StageOutcome {
        self.run_stage(run_id, PipelineStage::Opportunity, async {
            let transcript = self.require_text(PipelineStage::Transcript)?;
            let text = self.complete(prompts::OPPORTUNITY, transcript).await?;
            OpportunityRecord::parse(&text).map(Artifact::Opportunity)
        })
        .await
    }

    pub async fn generate_sow(&self, run_id: RunId) -> StageOutcome {
        self.transcript_stage(run_id, PipelineStage::Sow, prompts::SOW)
            .await
    }

    pub async fn generate_coaching(&self, run_id: RunId) -> StageOutcome {
        self.run_stage(run_id, PipelineStage::Coaching, async {
            let transcript = self.require_text(PipelineStage::Transcript)?;
            let text = self.complete(prompts::COACHING, transcript).await?;
            CoachingFeedback::parse(&text).map(Artifact::Coaching)
        })
        .await
    }

    /// Renders the stored opportunity and SOW; the timestamp only goes into
    /// the file name.
    pub fn export(&self, timestamp: &str) -> Result<ExportFile, ExportError> {
        let store = self.store();
        let record = store
            .get(PipelineStage::Opportunity)
            .and_then(Artifact::as_opportunity)
            .ok_or(ExportError::MissingOpportunity)?;
        let content = to_export(record, store.text(PipelineStage::Sow));
        Ok(ExportFile {
            file_name: export_filename(record.name.as_deref(), timestamp),
            content,
        })
    }

    /// Renders the export and writes it atomically into `dir`.
    pub fn export_to(&self, dir: &Path, timestamp: &str) -> Result<PathBuf, ExportError> {
        let file = self.export(timestamp)?;
        let path = AtomicFileWriter::new(dir).write(&file.file_name, &file.content)?;
        pilot_info!("Exported opportunity to {}", path.display());
        Ok(path)
    }

    async fn transcript_stage(
        &self,
        run_id: RunId,
        stage: PipelineStage,
        instruction: &'static str,
    ) -> StageOutcome {
        self.run_stage(run_id, stage, async {
            let transcript = self.require_text(PipelineStage::Transcript)?;
            self.complete(instruction, transcript)
                .await
                .map(Artifact::Text)
        })
        .await
    }

    async fn run_stage<F>(&self, run_id: RunId, stage: PipelineStage, work: F) -> StageOutcome
    where
        F: Future<Output = Result<Artifact, StageError>>,
    {
        if let Err(err) = self.check_current(run_id, stage) {
            pilot_warn!("Run {}: {:?} not started: {}", run_id, stage, err);
            return Err(err);
        }
        pilot_info!("Run {}: {:?} started", run_id, stage);
        self.sink.emit(PipelineEvent::StageStarted { run_id, stage });

        let result = match work.await {
            Ok(artifact) => self
                .store()
                .put(run_id, stage, artifact)
                .map_err(StageError::from),
            Err(err) => self.check_current(run_id, stage).and(Err(err)),
        };

        match &result {
            Ok(()) => {
                pilot_info!("Run {}: {:?} succeeded", run_id, stage);
                self.sink
                    .emit(PipelineEvent::StageSucceeded { run_id, stage });
            }
            Err(err) if err.is_stale() => {
                pilot_warn!("Run {}: discarding {:?} result: {}", run_id, stage, err);
                self.sink
                    .emit(PipelineEvent::StageDiscarded { run_id, stage });
            }
            Err(err) => {
                pilot_warn!("Run {}: {:?} failed: {}", run_id, stage, err);
                self.sink.emit(PipelineEvent::StageFailed {
                    run_id,
                    stage,
                    error: err.clone(),
                });
            }
        }
        result
    }

    async fn complete(
        &self,
        instruction: &str,
        content: impl Into<String>,
    ) -> Result<String, StageError> {
        if !self.client.is_configured() {
            return Err(not_configured());
        }
        let request = CompletionRequest::new(instruction, content)?;
        self.client.complete(&request).await
    }

    fn require_text(&self, stage: PipelineStage) -> Result<String, StageError> {
        self.store()
            .text(stage)
            .map(ToOwned::to_owned)
            .ok_or_else(|| {
                StageError::new(
                    FailureKind::MissingArtifact { stage },
                    format!("{stage:?} is not available yet"),
                )
            })
    }

    fn check_current(&self, run_id: RunId, stage: PipelineStage) -> Result<(), StageError> {
        let current = self.store().current_run(stage.scope());
        if run_id == current {
            Ok(())
        } else {
            Err(StageError::new(
                FailureKind::Stale { run_id, current },
                format!("run {run_id} was superseded by run {current}"),
            ))
        }
    }

    fn store(&self) -> MutexGuard<'_, ArtifactStore> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn not_configured() -> StageError {
    StageError::new(
        FailureKind::Configuration,
        "completion endpoint and token are not configured",
    )
}
