//! Preview route example for route_preview
//!
//! Run with: cargo run --example preview_route -- path/to/route.csv [data-root]

use anyhow::Context;
use route_preview::{
    ImageCache, JobKind, JobState, LoaderBuilder, LoaderConfig, PreviewPanel, RouteParser,
    RouteRequest, Scene, SentinelImages, ThreadSpawner,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Treats the first `;` comment block of a CSV route as its description
struct CommentOnlyParser;

impl RouteParser for CommentOnlyParser {
    fn name(&self) -> &str {
        "csv-comment"
    }

    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    }

    fn load(&self, request: &RouteRequest) -> anyhow::Result<Scene> {
        let bytes = std::fs::read(&request.path)
            .with_context(|| format!("reading {}", request.path.display()))?;
        let text = request.encoding.decode(&bytes);
        let comment = text
            .lines()
            .map_while(|line| line.strip_prefix(';'))
            .map(str::trim)
            .collect::<Vec<_>>()
            .join("\n");
        Ok(Scene {
            comment,
            ..Scene::default()
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let route = PathBuf::from(args.next().unwrap_or_default());
    let config = match args.next() {
        Some(root) => LoaderConfig::with_data_root(root),
        None => LoaderConfig::default(),
    };

    println!("route_preview v{}", route_preview::VERSION);

    let cache = Arc::new(ImageCache::new(config.cache_budget_bytes));
    let sentinels = SentinelImages::load(&config, &cache);
    let (loader, events) = LoaderBuilder::new(config)
        .parser(CommentOnlyParser)
        .cache(cache)
        .build(ThreadSpawner::new());
    let mut panel = PreviewPanel::new(loader, events, sentinels);

    panel.request(JobKind::RouteLoad, &route);

    // A host would do this once per frame
    let frame = Duration::from_millis(16);
    let started = Instant::now();
    loop {
        panel.update(frame);

        let display = panel.display(JobKind::RouteLoad);
        match display.state {
            JobState::Idle => {
                println!("No route selected.");
                break;
            }
            JobState::Processing if started.elapsed() < Duration::from_secs(10) => {
                std::thread::sleep(frame);
            }
            _ => {
                let (width, height) = display.image.dimensions();
                println!("State: {:?}", display.state);
                println!("Preview: {width}x{height}");
                println!("{}", display.text);
                break;
            }
        }
    }

    Ok(())
}
