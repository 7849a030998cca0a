//! Background loader
//!
//! [`BackgroundLoader::submit`] returns immediately; the job runs on its
//! kind's worker lane and reports back through [`JobEvents`]. Each lane runs
//! at most one job at a time, and a job whose generation was superseded
//! while it waited is skipped without publishing anything.

mod worker;

use parking_lot::Mutex;
use std::path::Path;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use crate::cache::ImageCache;
use crate::config::LoaderConfig;
use crate::job::{GenerationRegistry, JobEvent, JobKind, JobTicket};
use crate::package::PackageReader;
use crate::route::{ParserTable, RouteParser, SharedScene};
use crate::runtime::{ThreadSpawner, WorkerSpawner};

/// State shared between the loader and its worker lanes
pub(crate) struct LoaderShared {
    pub(crate) config: LoaderConfig,
    pub(crate) parsers: ParserTable,
    pub(crate) packages: Option<Arc<dyn PackageReader>>,
    pub(crate) cache: Arc<ImageCache>,
    pub(crate) scene: Arc<SharedScene>,
    pub(crate) generations: GenerationRegistry,
    lanes: [Mutex<()>; 2],
}

impl LoaderShared {
    pub(crate) fn lane(&self, kind: JobKind) -> &Mutex<()> {
        &self.lanes[kind.index()]
    }
}

/// Receiving end of worker notifications, owned by the consumer
#[derive(Debug)]
pub struct JobEvents {
    rx: Receiver<JobEvent>,
}

impl JobEvents {
    /// Next pending event, without blocking
    pub fn try_next(&self) -> Option<JobEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// All pending events, without blocking
    pub fn drain(&self) -> Vec<JobEvent> {
        self.rx.try_iter().collect()
    }

    /// Wait up to `timeout` for the next event
    ///
    /// Blocks the caller; a frame loop should use [`JobEvents::try_next`].
    pub fn next_timeout(&self, timeout: Duration) -> Option<JobEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

/// Configures and builds a [`BackgroundLoader`]
pub struct LoaderBuilder {
    config: LoaderConfig,
    parsers: Vec<Arc<dyn RouteParser>>,
    packages: Option<Arc<dyn PackageReader>>,
    cache: Option<Arc<ImageCache>>,
    scene: Option<Arc<SharedScene>>,
}

impl LoaderBuilder {
    pub fn new(config: LoaderConfig) -> Self {
        Self {
            config,
            parsers: Vec::new(),
            packages: None,
            cache: None,
            scene: None,
        }
    }

    /// Register a route parser; earlier registrations take priority
    pub fn parser(mut self, parser: impl RouteParser + 'static) -> Self {
        self.parsers.push(Arc::new(parser));
        self
    }

    pub fn package_reader(mut self, reader: impl PackageReader + 'static) -> Self {
        self.packages = Some(Arc::new(reader));
        self
    }

    /// Share an existing image cache instead of creating one
    pub fn cache(mut self, cache: Arc<ImageCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Share an existing scene slot instead of creating one
    pub fn scene(mut self, scene: Arc<SharedScene>) -> Self {
        self.scene = Some(scene);
        self
    }

    pub fn build<S: WorkerSpawner>(self, spawner: S) -> (BackgroundLoader<S>, JobEvents) {
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ImageCache::new(self.config.cache_budget_bytes)));
        let (tx, rx) = mpsc::channel();

        let shared = LoaderShared {
            parsers: ParserTable::new(self.parsers),
            packages: self.packages,
            cache,
            scene: self.scene.unwrap_or_default(),
            generations: GenerationRegistry::new(),
            lanes: Default::default(),
            config: self.config,
        };
        log::debug!(
            "Background loader ready on {} runtime with parsers {:?}",
            spawner.runtime_name(),
            shared.parsers.names()
        );

        let loader = BackgroundLoader {
            shared: Arc::new(shared),
            spawner,
            events: tx,
        };
        (loader, JobEvents { rx })
    }
}

/// Runs route and package jobs off the consumer's thread
pub struct BackgroundLoader<S: WorkerSpawner = ThreadSpawner> {
    shared: Arc<LoaderShared>,
    spawner: S,
    events: Sender<JobEvent>,
}

impl<S: WorkerSpawner> std::fmt::Debug for BackgroundLoader<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundLoader")
            .field("spawner", &self.spawner)
            .field("parsers", &self.shared.parsers)
            .finish()
    }
}

impl<S: WorkerSpawner> BackgroundLoader<S> {
    /// Enqueue a job and return without waiting for it
    ///
    /// An empty path is a no-op and returns `None`. Otherwise the job gets a
    /// new generation, superseding any earlier job of the same kind.
    pub fn submit<P: AsRef<Path>>(&self, kind: JobKind, target: P) -> Option<JobTicket> {
        let target = target.as_ref();
        if target.as_os_str().is_empty() {
            log::debug!("Ignoring {kind:?} request without a target file");
            return None;
        }

        let ticket = JobTicket {
            kind,
            generation: self.shared.generations.advance(kind),
            target: target.to_path_buf(),
        };
        log::debug!(
            "Submitting {kind:?} generation {} for {}",
            ticket.generation.0,
            target.display()
        );

        let shared = Arc::clone(&self.shared);
        let events = self.events.clone();
        let job = ticket.clone();
        self.spawner.spawn(
            kind.lane(),
            Box::new(move || worker::run(&shared, job, &events)),
        );

        Some(ticket)
    }

    pub fn config(&self) -> &LoaderConfig {
        &self.shared.config
    }

    pub fn cache(&self) -> &Arc<ImageCache> {
        &self.shared.cache
    }

    pub fn scene(&self) -> &Arc<SharedScene> {
        &self.shared.scene
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn parsers(&self) -> &ParserTable {
        &self.shared.parsers
    }

    /// Whether `ticket` is still the latest job of its kind
    pub fn is_current(&self, ticket: &JobTicket) -> bool {
        self.shared.generations.is_current(ticket.kind, ticket.generation)
    }
}
