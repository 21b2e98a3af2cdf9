use std::fmt;

pub type RunId = u64;

/// Generation steps, also the keys of the artifact store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PipelineStage {
    Email,
    Plan,
    Transcript,
    ClientEmail,
    InternalEmail,
    Opportunity,
    Sow,
    Coaching,
}

impl PipelineStage {
    /// Narrowest run scope that regenerates this stage. Only runs of this
    /// scope, or a `Call` run, supersede work on the stage.
    pub fn scope(self) -> RunScope {
        match self {
            PipelineStage::Email => RunScope::Call,
            PipelineStage::Plan => RunScope::Plan,
            PipelineStage::Transcript
            | PipelineStage::ClientEmail
            | PipelineStage::InternalEmail
            | PipelineStage::Opportunity
            | PipelineStage::Sow
            | PipelineStage::Coaching => RunScope::Recording,
        }
    }
}

/// What a triggering action regenerates; artifacts of these stages are
/// dropped when the run begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RunScope {
    Call,
    Plan,
    Recording,
}

impl RunScope {
    pub const ALL: [RunScope; 3] = [RunScope::Call, RunScope::Plan, RunScope::Recording];

    pub fn stages(self) -> &'static [PipelineStage] {
        match self {
            RunScope::Call => &[
                PipelineStage::Email,
                PipelineStage::Plan,
                PipelineStage::Transcript,
                PipelineStage::ClientEmail,
                PipelineStage::InternalEmail,
                PipelineStage::Opportunity,
                PipelineStage::Sow,
                PipelineStage::Coaching,
            ],
            RunScope::Plan => &[PipelineStage::Plan],
            RunScope::Recording => &[
                PipelineStage::Transcript,
                PipelineStage::ClientEmail,
                PipelineStage::InternalEmail,
                PipelineStage::Opportunity,
                PipelineStage::Sow,
                PipelineStage::Coaching,
            ],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineEvent {
    RunStarted {
        run_id: RunId,
        scope: RunScope,
    },
    StageStarted {
        run_id: RunId,
        stage: PipelineStage,
    },
    StageSucceeded {
        run_id: RunId,
        stage: PipelineStage,
    },
    StageFailed {
        run_id: RunId,
        stage: PipelineStage,
        error: StageError,
    },
    /// A newer run of the stage's scope took over; the result was dropped.
    StageDiscarded {
        run_id: RunId,
        stage: PipelineStage,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}: {message}")]
pub struct StageError {
    pub kind: FailureKind,
    pub message: String,
}

impl StageError {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn is_stale(&self) -> bool {
        matches!(self.kind, FailureKind::Stale { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// No endpoint or token; the user has to supply settings first.
    Configuration,
    Transport,
    Timeout,
    Authentication,
    /// Response body was not the expected JSON envelope.
    MalformedResponse,
    /// The service answered with an explicit error payload.
    Remote,
    /// Generated text that should be JSON could not be parsed.
    MalformedStructuredOutput,
    InvalidRequest,
    InvalidInput,
    MissingArtifact { stage: PipelineStage },
    /// A newer run started before this result arrived.
    Stale { run_id: RunId, current: RunId },
    AlreadyStored { stage: PipelineStage },
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Configuration => write!(f, "configuration error"),
            FailureKind::Transport => write!(f, "transport error"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Authentication => write!(f, "authentication failed"),
            FailureKind::MalformedResponse => write!(f, "malformed response"),
            FailureKind::Remote => write!(f, "remote error"),
            FailureKind::MalformedStructuredOutput => write!(f, "malformed structured output"),
            FailureKind::InvalidRequest => write!(f, "invalid request"),
            FailureKind::InvalidInput => write!(f, "invalid input"),
            FailureKind::MissingArtifact { stage } => write!(f, "missing {stage:?} artifact"),
            FailureKind::Stale { run_id, current } => {
                write!(f, "run {run_id} superseded by run {current}")
            }
            FailureKind::AlreadyStored { stage } => {
                write!(f, "{stage:?} artifact already stored for this run")
            }
        }
    }
}
