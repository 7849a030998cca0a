//! Load job state machine
//!
//! A [`LoadJob`] is the consumer's read-only view of the latest request of
//! one [`JobKind`]. Workers never touch it; they publish [`JobEvent`]s tagged
//! with the [`Generation`] they were started for, and the consumer applies an
//! event only while that generation is still the current one.

use crate::codec::DecodedImage;
use crate::error::AssetError;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Category of background load, each with its own worker lane
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    RouteLoad,
    PackagePreview,
}

impl JobKind {
    pub const ALL: [JobKind; 2] = [JobKind::RouteLoad, JobKind::PackagePreview];

    /// Name of the worker lane jobs of this kind run on
    pub fn lane(self) -> &'static str {
        match self {
            JobKind::RouteLoad => "route",
            JobKind::PackagePreview => "package",
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            JobKind::RouteLoad => 0,
            JobKind::PackagePreview => 1,
        }
    }
}

/// Monotonic request counter of one job kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(pub u64);

/// Current generation per job kind, shared by the loader and its workers
#[derive(Debug, Default)]
pub struct GenerationRegistry {
    current: [AtomicU64; 2],
}

impl GenerationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new generation, superseding every earlier one of `kind`
    pub fn advance(&self, kind: JobKind) -> Generation {
        Generation(self.current[kind.index()].fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn current(&self, kind: JobKind) -> Generation {
        Generation(self.current[kind.index()].load(Ordering::SeqCst))
    }

    pub fn is_current(&self, kind: JobKind, generation: Generation) -> bool {
        self.current(kind) == generation
    }
}

/// Lifecycle of a load job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    /// Nothing requested yet
    Idle,
    /// A worker owns the job
    Processing,
    /// Preview and text are valid
    Processed,
    /// Error message is valid, preview is the error sentinel
    Error,
}

/// Image to show for a job
#[derive(Debug, Clone, PartialEq)]
pub enum Preview {
    Loading,
    Unknown,
    Error,
    Image(Arc<DecodedImage>),
}

impl Preview {
    pub fn image(&self) -> Option<&Arc<DecodedImage>> {
        match self {
            Preview::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// Successful job output
#[derive(Debug, Clone, PartialEq)]
pub struct JobResult {
    pub preview: Preview,
    pub text: String,
}

/// Final result a worker hands back
#[derive(Debug, Clone)]
pub enum JobOutcome {
    Processed(JobResult),
    Failed(Arc<AssetError>),
}

/// Identifies one submitted job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobTicket {
    pub kind: JobKind,
    pub generation: Generation,
    pub target: PathBuf,
}

#[derive(Debug, Clone)]
pub enum JobEventKind {
    /// The worker picked the job up
    Started,
    Finished(JobOutcome),
}

/// Notification from a worker lane to the consumer
#[derive(Debug, Clone)]
pub struct JobEvent {
    pub kind: JobKind,
    pub generation: Generation,
    pub target: PathBuf,
    pub payload: JobEventKind,
}

impl JobEvent {
    pub(crate) fn new(ticket: &JobTicket, payload: JobEventKind) -> Self {
        Self {
            kind: ticket.kind,
            generation: ticket.generation,
            target: ticket.target.clone(),
            payload,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.payload, JobEventKind::Finished(_))
    }
}

/// Consumer-side view of the latest job of one kind
#[derive(Debug, Clone)]
pub struct LoadJob {
    kind: JobKind,
    target_file: PathBuf,
    generation: Generation,
    state: JobState,
    preview: Preview,
    text: String,
    error: Option<Arc<AssetError>>,
}

impl LoadJob {
    /// A job that was never requested
    pub fn idle(kind: JobKind) -> Self {
        Self {
            kind,
            target_file: PathBuf::new(),
            generation: Generation::default(),
            state: JobState::Idle,
            preview: Preview::Loading,
            text: String::new(),
            error: None,
        }
    }

    /// Fresh job for a just-submitted ticket, showing the loading placeholder
    pub fn begin(ticket: &JobTicket, text: impl Into<String>) -> Self {
        Self {
            kind: ticket.kind,
            target_file: ticket.target.clone(),
            generation: ticket.generation,
            state: JobState::Processing,
            preview: Preview::Loading,
            text: text.into(),
            error: None,
        }
    }

    /// Apply a worker event; returns false when it belongs to another job
    pub fn apply(&mut self, event: JobEvent) -> bool {
        if event.kind != self.kind || event.generation != self.generation {
            log::debug!(
                "Discarding {:?} event of superseded generation {} for {}",
                event.kind,
                event.generation.0,
                event.target.display()
            );
            return false;
        }
        if self.state != JobState::Processing {
            return false;
        }

        match event.payload {
            JobEventKind::Started => {
                self.preview = Preview::Loading;
            }
            JobEventKind::Finished(JobOutcome::Processed(result)) => {
                self.state = JobState::Processed;
                self.preview = result.preview;
                self.text = result.text;
                self.error = None;
            }
            JobEventKind::Finished(JobOutcome::Failed(error)) => {
                self.state = JobState::Error;
                self.preview = Preview::Error;
                self.text = error.to_string();
                self.error = Some(error);
            }
        }
        true
    }

    pub fn kind(&self) -> JobKind {
        self.kind
    }

    pub fn target_file(&self) -> &Path {
        &self.target_file
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn preview(&self) -> &Preview {
        &self.preview
    }

    /// Description text, or the failure detail in the error state
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn error(&self) -> Option<&AssetError> {
        self.error.as_deref()
    }

    pub fn error_message(&self) -> Option<String> {
        self.error.as_ref().map(|e| e.to_string())
    }

    pub fn is_loading(&self) -> bool {
        self.state == JobState::Processing
    }

    pub fn is_ready(&self) -> bool {
        self.state == JobState::Processed
    }

    pub fn is_failed(&self) -> bool {
        self.state == JobState::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(generation: u64) -> JobTicket {
        JobTicket {
            kind: JobKind::RouteLoad,
            generation: Generation(generation),
            target: PathBuf::from("route.csv"),
        }
    }

    fn finished(ticket: &JobTicket, outcome: JobOutcome) -> JobEvent {
        JobEvent::new(ticket, JobEventKind::Finished(outcome))
    }

    #[test]
    fn test_registry_advances_per_kind() {
        let registry = GenerationRegistry::new();
        let a = registry.advance(JobKind::RouteLoad);
        let b = registry.advance(JobKind::RouteLoad);
        let c = registry.advance(JobKind::PackagePreview);

        assert!(b > a);
        assert!(!registry.is_current(JobKind::RouteLoad, a));
        assert!(registry.is_current(JobKind::RouteLoad, b));
        assert_eq!(c, Generation(1));
    }

    #[test]
    fn test_idle_job() {
        let job = LoadJob::idle(JobKind::RouteLoad);
        assert_eq!(job.state(), JobState::Idle);
        assert_eq!(job.preview(), &Preview::Loading);
        assert!(!job.is_loading());
    }

    #[test]
    fn test_processing_to_processed() {
        let t = ticket(1);
        let mut job = LoadJob::begin(&t, "Processing");
        assert!(job.is_loading());

        assert!(job.apply(JobEvent::new(&t, JobEventKind::Started)));
        assert_eq!(job.state(), JobState::Processing);

        let result = JobResult {
            preview: Preview::Unknown,
            text: "A quiet branch line".into(),
        };
        assert!(job.apply(finished(&t, JobOutcome::Processed(result))));
        assert!(job.is_ready());
        assert_eq!(job.text(), "A quiet branch line");
        assert_eq!(job.preview(), &Preview::Unknown);
        assert!(job.error_message().is_none());
    }

    #[test]
    fn test_processing_to_error() {
        let t = ticket(1);
        let mut job = LoadJob::begin(&t, "Processing");
        let error = AssetError::ParserFailure(anyhow::anyhow!("bad header"));

        assert!(job.apply(finished(&t, JobOutcome::Failed(Arc::new(error)))));
        assert!(job.is_failed());
        assert_eq!(job.preview(), &Preview::Error);
        assert_eq!(job.error_message().as_deref(), Some("bad header"));
        assert_eq!(job.text(), "bad header");
    }

    #[test]
    fn test_superseded_event_is_discarded() {
        let old = ticket(1);
        let new = ticket(2);
        let mut job = LoadJob::begin(&new, "Processing");

        let result = JobResult {
            preview: Preview::Unknown,
            text: "old".into(),
        };
        assert!(!job.apply(finished(&old, JobOutcome::Processed(result))));
        assert!(job.is_loading());
        assert_eq!(job.text(), "Processing");
    }

    #[test]
    fn test_terminal_state_ignores_late_events() {
        let t = ticket(1);
        let mut job = LoadJob::begin(&t, "Processing");
        let result = JobResult {
            preview: Preview::Unknown,
            text: "done".into(),
        };
        assert!(job.apply(finished(&t, JobOutcome::Processed(result))));
        assert!(!job.apply(JobEvent::new(&t, JobEventKind::Started)));
        assert!(job.is_ready());
    }
}
