use std::collections::BTreeMap;

use crate::{CoachingFeedback, FailureKind, OpportunityRecord, PipelineStage, RunId, RunScope, StageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Artifact {
    Text(String),
    Opportunity(OpportunityRecord),
    Coaching(CoachingFeedback),
}

impl Artifact {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_opportunity(&self) -> Option<&OpportunityRecord> {
        match self {
            Artifact::Opportunity(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_coaching(&self) -> Option<&CoachingFeedback> {
        match self {
            Artifact::Coaching(feedback) => Some(feedback),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("run {run_id} is stale (current run {current})")]
    Stale { run_id: RunId, current: RunId },
    #[error("{stage:?} already stored for run {run_id}")]
    AlreadyStored { stage: PipelineStage, run_id: RunId },
}

impl From<StoreError> for StageError {
    fn from(err: StoreError) -> Self {
        let kind = match &err {
            StoreError::Stale { run_id, current } => FailureKind::Stale {
                run_id: *run_id,
                current: *current,
            },
            StoreError::AlreadyStored { stage, .. } => FailureKind::AlreadyStored { stage: *stage },
        };
        StageError::new(kind, err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct StoredArtifact {
    run_id: RunId,
    artifact: Artifact,
}

/// Intermediate results keyed by the stage that produced them.
///
/// Run ids are issued from one counter, but each run scope tracks its own
/// current run: a `Call` run supersedes every scope, a `Plan` or `Recording`
/// run only its own. Writes are accepted only from the current run of the
/// stage's scope and only once per stage and run. Beginning a run drops the
/// artifacts of the stages it regenerates.
#[derive(Debug, Default)]
pub struct ArtifactStore {
    latest_run: RunId,
    current: BTreeMap<RunScope, RunId>,
    entries: BTreeMap<PipelineStage, StoredArtifact>,
}

impl ArtifactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently issued run id, whatever its scope.
    pub fn latest_run(&self) -> RunId {
        self.latest_run
    }

    pub fn current_run(&self, scope: RunScope) -> RunId {
        self.current.get(&scope).copied().unwrap_or_default()
    }

    pub fn is_current(&self, run_id: RunId, stage: PipelineStage) -> bool {
        run_id == self.current_run(stage.scope())
    }

    pub fn begin_run(&mut self, scope: RunScope) -> RunId {
        self.latest_run += 1;
        let run_id = self.latest_run;
        match scope {
            RunScope::Call => {
                for scope in RunScope::ALL {
                    self.current.insert(scope, run_id);
                }
            }
            RunScope::Plan | RunScope::Recording => {
                self.current.insert(scope, run_id);
            }
        }
        for stage in scope.stages() {
            self.entries.remove(stage);
        }
        run_id
    }

    pub fn put(
        &mut self,
        run_id: RunId,
        stage: PipelineStage,
        artifact: Artifact,
    ) -> Result<(), StoreError> {
        if !self.is_current(run_id, stage) {
            return Err(StoreError::Stale {
                run_id,
                current: self.current_run(stage.scope()),
            });
        }
        if self
            .entries
            .get(&stage)
            .is_some_and(|stored| stored.run_id == run_id)
        {
            return Err(StoreError::AlreadyStored { stage, run_id });
        }
        self.entries.insert(stage, StoredArtifact { run_id, artifact });
        Ok(())
    }

    pub fn get(&self, stage: PipelineStage) -> Option<&Artifact> {
        self.entries.get(&stage).map(|stored| &stored.artifact)
    }

    pub fn text(&self, stage: PipelineStage) -> Option<&str> {
        self.get(stage).and_then(Artifact::as_text)
    }

    /// Run that produced the stored artifact of `stage`.
    pub fn produced_by(&self, stage: PipelineStage) -> Option<RunId> {
        self.entries.get(&stage).map(|stored| stored.run_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> Artifact {
        Artifact::Text(value.to_string())
    }

    #[test]
    fn writes_are_once_per_run() {
        let mut store = ArtifactStore::new();
        let run = store.begin_run(RunScope::Call);

        store.put(run, PipelineStage::Email, text("hello")).unwrap();
        let err = store.put(run, PipelineStage::Email, text("again")).unwrap_err();

        assert_eq!(
            err,
            StoreError::AlreadyStored {
                stage: PipelineStage::Email,
                run_id: run
            }
        );
        assert_eq!(store.text(PipelineStage::Email), Some("hello"));
    }

    #[test]
    fn stale_runs_cannot_write() {
        let mut store = ArtifactStore::new();
        let old = store.begin_run(RunScope::Plan);
        let new = store.begin_run(RunScope::Plan);

        let err = store.put(old, PipelineStage::Plan, text("late")).unwrap_err();

        assert_eq!(err, StoreError::Stale { run_id: old, current: new });
        assert!(store.get(PipelineStage::Plan).is_none());
    }

    #[test]
    fn call_run_supersedes_every_scope() {
        let mut store = ArtifactStore::new();
        let recording = store.begin_run(RunScope::Recording);
        let call = store.begin_run(RunScope::Call);

        let err = store
            .put(recording, PipelineStage::Transcript, text("late"))
            .unwrap_err();

        assert_eq!(err, StoreError::Stale { run_id: recording, current: call });
        assert_eq!(store.current_run(RunScope::Plan), call);
    }

    #[test]
    fn plan_run_leaves_recording_run_current() {
        let mut store = ArtifactStore::new();
        let call = store.begin_run(RunScope::Call);
        let recording = store.begin_run(RunScope::Recording);
        let plan = store.begin_run(RunScope::Plan);

        store
            .put(recording, PipelineStage::Transcript, text("transcript"))
            .unwrap();
        store.put(plan, PipelineStage::Plan, text("plan")).unwrap();

        assert!(store.is_current(recording, PipelineStage::Coaching));
        assert!(!store.is_current(recording, PipelineStage::Plan));
        assert_eq!(store.current_run(RunScope::Call), call);
        assert_eq!(store.latest_run(), plan);
        assert_eq!(store.text(PipelineStage::Transcript), Some("transcript"));
    }

    #[test]
    fn new_run_drops_only_its_scope() {
        let mut store = ArtifactStore::new();
        let call = store.begin_run(RunScope::Call);
        store.put(call, PipelineStage::Email, text("email")).unwrap();
        store.put(call, PipelineStage::Transcript, text("transcript")).unwrap();

        let plan = store.begin_run(RunScope::Plan);
        store.put(plan, PipelineStage::Plan, text("plan")).unwrap();
        let recording = store.begin_run(RunScope::Recording);

        assert_eq!(store.text(PipelineStage::Email), Some("email"));
        assert_eq!(store.text(PipelineStage::Plan), Some("plan"));
        assert!(store.get(PipelineStage::Transcript).is_none());
        assert_eq!(store.produced_by(PipelineStage::Plan), Some(plan));
        assert_eq!(store.current_run(RunScope::Recording), recording);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn stale_error_converts_to_stage_error() {
        let err: StageError = StoreError::Stale { run_id: 1, current: 2 }.into();
        assert!(err.is_stale());
    }
}
