//! Integration tests for ImageCache

use route_preview::{ImageCache, LoaderConfig, SentinelImages, SentinelKind};
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn write_png(path: &Path, size: u32) {
    image::RgbaImage::from_pixel(size, size, image::Rgba([10, 20, 30, 255]))
        .save(path)
        .unwrap();
}

#[test]
fn test_cache_starts_empty() {
    let cache = ImageCache::new(100 * 1024 * 1024); // 100MB

    assert_eq!(cache.memory_usage(), 0);
    assert!(cache.is_empty());
    assert_eq!(cache.metrics().cache_hit_rate(), 0.0);
}

#[test]
fn test_shared_between_threads() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preview.png");
    write_png(&path, 4);

    let cache = Arc::new(ImageCache::new(1024 * 1024));
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let cache = Arc::clone(&cache);
            let path = path.clone();
            std::thread::spawn(move || cache.get_or_decode(&path).unwrap())
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap().dimensions(), (4, 4));
    }
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.memory_usage(), 4 * 4 * 4);
}

#[test]
fn test_edited_file_is_decoded_again() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("preview.png");
    write_png(&path, 2);

    let cache = ImageCache::new(1024 * 1024);
    assert_eq!(cache.get_or_decode(&path).unwrap().dimensions(), (2, 2));

    write_png(&path, 3);
    let file = std::fs::File::options().write(true).open(&path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(10))
        .unwrap();
    drop(file);

    assert!(!cache.contains(&path));
    assert_eq!(cache.get_or_decode(&path).unwrap().dimensions(), (3, 3));
    assert_eq!(cache.metrics().cache_misses(), 2);
}

#[test]
fn test_sentinels_go_through_cache() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::create_dir(dir.path().join("Menu")).unwrap();
    write_png(&dir.path().join("Menu").join("route_error.png"), 2);

    let config = LoaderConfig::with_data_root(dir.path());
    let cache = ImageCache::new(1024 * 1024);
    let sentinels = SentinelImages::load(&config, &cache);

    assert_eq!(sentinels.get(SentinelKind::Error).dimensions(), (2, 2));
    assert!(cache.contains(config.error_image()));
}
