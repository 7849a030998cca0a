//! route_preview - Background route and package preview loading
//!
//! # Features
//! - Route and package jobs run on worker lanes, never on the frame loop
//! - Generation-based superseding: only the latest request of a kind lands
//! - Pluggable route parsers and package readers
//! - Pixel codec for static and animated previews, with palette capture
//! - Memory-bounded decoded image cache
//!
//! # Quick Start
//!
//! ```ignore
//! use route_preview::{
//!     ImageCache, LoaderBuilder, LoaderConfig, PreviewPanel, SentinelImages, ThreadSpawner,
//! };
//!
//! let config = LoaderConfig::from_file("viewer.json")?;
//! let cache = std::sync::Arc::new(ImageCache::new(config.cache_budget_bytes));
//! let sentinels = SentinelImages::load(&config, &cache);
//! let (loader, events) = LoaderBuilder::new(config)
//!     .parser(MyCsvParser)
//!     .cache(cache)
//!     .build(ThreadSpawner::new());
//! let mut panel = PreviewPanel::new(loader, events, sentinels);
//!
//! // Every frame; repeating the same path does not reload it
//! panel.request_route(selected_route);
//! panel.update(frame_time);
//! let display = panel.display(JobKind::RouteLoad);
//! ```
//!
//! # Feature Flags
//!
//! - `runtime-tokio`: Run worker lanes on Tokio's blocking pool

// Core modules
pub mod cache;
pub mod codec;
pub mod job;
pub mod loader;
pub mod runtime;

// Support modules
pub mod config;
pub mod package;
pub mod panel;
pub mod route;
pub mod sentinel;

// Error types
mod error;
pub use error::{AssetError, Result};

// Re-export codec types
pub use codec::{decode, decode_bytes, AnimatedImage, CodecError, DecodedImage, RawImage, Rgb24};

// Re-export cache types
pub use cache::metrics::{CacheMetrics, CacheMetricsHandle};
pub use cache::ImageCache;

// Re-export job and loader types
pub use job::{
    Generation, JobEvent, JobEventKind, JobKind, JobOutcome, JobResult, JobState, JobTicket,
    LoadJob, Preview,
};
pub use loader::{BackgroundLoader, JobEvents, LoaderBuilder};

// Re-export runtime types
pub use runtime::mock::{MockSpawnBehavior, MockSpawner};
pub use runtime::thread_impl::ThreadSpawner;
#[cfg(feature = "runtime-tokio")]
pub use runtime::tokio_impl::TokioSpawner;
pub use runtime::{Task, WorkerSpawner};

// Re-export capability traits and consumer types
pub use config::{LoaderConfig, SentinelPaths};
pub use package::{ManifestPackageReader, PackageInfo, PackageReader};
pub use panel::{PreviewDisplay, PreviewPanel};
pub use route::{ParserTable, RouteParser, RouteRequest, Scene, SceneObject, SharedScene, TextEncoding};
pub use sentinel::{SentinelImages, SentinelKind};

// Version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
