//! Consumer side of the pipeline
//!
//! A [`PreviewPanel`] lives on the render thread. Once per frame the host
//! calls [`PreviewPanel::update`], which applies whatever the workers have
//! finished without ever waiting for them, then draws [`PreviewPanel::display`].

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::codec::DecodedImage;
use crate::job::{JobKind, JobState, LoadJob};
use crate::loader::{BackgroundLoader, JobEvents};
use crate::route::Scene;
use crate::runtime::{ThreadSpawner, WorkerSpawner};
use crate::sentinel::SentinelImages;

/// What to draw for one job kind this frame
#[derive(Debug, Clone, Copy)]
pub struct PreviewDisplay<'a> {
    pub image: &'a DecodedImage,
    /// RGBA pixels of the current frame of `image`
    pub pixels: &'a [u8],
    pub text: &'a str,
    pub state: JobState,
}

pub struct PreviewPanel<S: WorkerSpawner = ThreadSpawner> {
    loader: BackgroundLoader<S>,
    events: JobEvents,
    sentinels: SentinelImages,
    jobs: [LoadJob; 2],
    shown_for: [Duration; 2],
}

impl<S: WorkerSpawner> PreviewPanel<S> {
    pub fn new(loader: BackgroundLoader<S>, events: JobEvents, sentinels: SentinelImages) -> Self {
        Self {
            loader,
            events,
            sentinels,
            jobs: [
                LoadJob::idle(JobKind::RouteLoad),
                LoadJob::idle(JobKind::PackagePreview),
            ],
            shown_for: [Duration::ZERO; 2],
        }
    }

    /// Ask for `path` to be loaded; safe to call every frame
    ///
    /// Returns whether a new job was submitted. An empty path does nothing,
    /// and so does repeating the request for the file the current job is
    /// already processing or has finished. Use [`PreviewPanel::reload`] to
    /// load the same file again.
    pub fn request<P: AsRef<Path>>(&mut self, kind: JobKind, path: P) -> bool {
        let path = path.as_ref();
        let current = &self.jobs[kind.index()];
        if current.state() != JobState::Idle && current.target_file() == path {
            return false;
        }
        self.submit(kind, path)
    }

    /// Load the current file of `kind` again, whatever state its job is in
    ///
    /// Returns false when nothing was ever requested for `kind`.
    pub fn reload(&mut self, kind: JobKind) -> bool {
        let current = &self.jobs[kind.index()];
        if current.state() == JobState::Idle {
            return false;
        }
        let path = current.target_file().to_path_buf();
        self.submit(kind, &path)
    }

    fn submit(&mut self, kind: JobKind, path: &Path) -> bool {
        let Some(ticket) = self.loader.submit(kind, path) else {
            return false;
        };
        let text = match kind {
            JobKind::RouteLoad => self.loader.config().processing_text.clone(),
            JobKind::PackagePreview => String::new(),
        };
        self.jobs[kind.index()] = LoadJob::begin(&ticket, text);
        self.shown_for[kind.index()] = Duration::ZERO;
        true
    }

    pub fn request_route<P: AsRef<Path>>(&mut self, path: P) -> bool {
        self.request(JobKind::RouteLoad, path)
    }

    pub fn request_package<P: AsRef<Path>>(&mut self, path: P) -> bool {
        self.request(JobKind::PackagePreview, path)
    }

    /// Per-frame update; returns how many worker events were applied
    pub fn update(&mut self, elapsed: Duration) -> usize {
        let mut applied = 0;
        while let Some(event) = self.events.try_next() {
            let index = event.kind.index();
            if self.jobs[index].apply(event) {
                applied += 1;
            }
        }

        self.loader.scene().update_animated(elapsed);
        for shown in &mut self.shown_for {
            *shown += elapsed;
        }
        applied
    }

    pub fn job(&self, kind: JobKind) -> &LoadJob {
        &self.jobs[kind.index()]
    }

    /// Image and text to draw for `kind` right now
    pub fn display(&self, kind: JobKind) -> PreviewDisplay<'_> {
        let job = &self.jobs[kind.index()];
        let image: &Arc<DecodedImage> = self.sentinels.resolve(job.preview());
        PreviewDisplay {
            image,
            pixels: image.pixels_at(self.shown_for[kind.index()]),
            text: job.text(),
            state: job.state(),
        }
    }

    pub fn scene(&self) -> Option<Arc<Scene>> {
        self.loader.scene().current()
    }

    pub fn loader(&self) -> &BackgroundLoader<S> {
        &self.loader
    }

    pub fn sentinels(&self) -> &SentinelImages {
        &self.sentinels
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoaderConfig;
    use crate::loader::LoaderBuilder;
    use crate::runtime::MockSpawner;
    use crate::sentinel::SentinelKind;

    fn panel(spawner: MockSpawner) -> PreviewPanel<MockSpawner> {
        let (loader, events) = LoaderBuilder::new(LoaderConfig::default()).build(spawner);
        PreviewPanel::new(loader, events, SentinelImages::builtin())
    }

    #[test]
    fn test_idle_panel_shows_loading_sentinel() {
        let panel = panel(MockSpawner::new());
        let display = panel.display(JobKind::RouteLoad);
        assert_eq!(display.state, JobState::Idle);
        assert_eq!(
            display.image,
            panel.sentinels().get(SentinelKind::Loading).as_ref()
        );
        assert_eq!(display.text, "");
    }

    #[test]
    fn test_empty_request_stays_idle() {
        let mut panel = panel(MockSpawner::deferred());
        assert!(!panel.request_route(""));
        assert_eq!(panel.job(JobKind::RouteLoad).state(), JobState::Idle);
        assert_eq!(panel.loader().spawner().pending_count(), 0);
        assert_eq!(panel.update(Duration::from_millis(16)), 0);
    }

    #[test]
    fn test_repeated_request_is_deduplicated() {
        let mut panel = panel(MockSpawner::deferred());
        assert!(panel.request_route("line.csv"));
        assert!(!panel.request_route("line.csv"));
        assert!(!panel.request_route("line.csv"));
        assert_eq!(panel.loader().spawner().pending_count(), 1);

        assert!(panel.request_route("other.csv"));
        assert_eq!(panel.loader().spawner().pending_count(), 2);
        assert_eq!(
            panel.job(JobKind::RouteLoad).target_file(),
            Path::new("other.csv")
        );
    }

    #[test]
    fn test_finished_job_is_not_requested_again() {
        let mut panel = panel(MockSpawner::blocking());
        assert!(panel.request_route("missing.csv"));
        for _ in 0..6 {
            assert!(!panel.request_route("missing.csv"));
            panel.update(Duration::from_millis(16));
        }

        let job = panel.job(JobKind::RouteLoad);
        assert_eq!(job.state(), JobState::Error);
        assert_eq!(job.generation().0, 1);
    }

    #[test]
    fn test_reload_submits_same_file() {
        let mut panel = panel(MockSpawner::deferred());
        assert!(!panel.reload(JobKind::RouteLoad));

        panel.request_route("line.csv");
        assert!(panel.reload(JobKind::RouteLoad));
        assert_eq!(panel.loader().spawner().pending_count(), 2);

        let job = panel.job(JobKind::RouteLoad);
        assert_eq!(job.target_file(), Path::new("line.csv"));
        assert_eq!(job.generation().0, 2);
        assert_eq!(job.state(), JobState::Processing);
    }

    #[test]
    fn test_request_shows_processing_text() {
        let mut panel = panel(MockSpawner::deferred());
        panel.request_route("line.csv");
        let display = panel.display(JobKind::RouteLoad);
        assert_eq!(display.state, JobState::Processing);
        assert_eq!(display.text, LoaderConfig::default().processing_text);
    }
}
