//! Placeholder images for the loading, unknown and error states
//!
//! Sentinels are decoded once when the host starts, so the frame loop never
//! touches the disk to show one. A sentinel file that is missing or broken is
//! replaced by a built-in single-color image.

use crate::cache::ImageCache;
use crate::codec::{DecodedImage, RawImage};
use crate::config::LoaderConfig;
use crate::job::Preview;
use std::path::Path;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SentinelKind {
    Loading,
    Unknown,
    Error,
}

impl SentinelKind {
    fn fallback_color(self) -> [u8; 4] {
        match self {
            SentinelKind::Loading => [96, 96, 96, 255],
            SentinelKind::Unknown => [48, 48, 48, 255],
            SentinelKind::Error => [192, 32, 32, 255],
        }
    }
}

/// The three decoded placeholders
#[derive(Debug, Clone)]
pub struct SentinelImages {
    loading: Arc<DecodedImage>,
    unknown: Arc<DecodedImage>,
    error: Arc<DecodedImage>,
}

impl SentinelImages {
    /// Decode the sentinels named by `config` under its data root
    pub fn load(config: &LoaderConfig, cache: &ImageCache) -> Self {
        Self {
            loading: Self::load_one(SentinelKind::Loading, &config.loading_image(), cache),
            unknown: Self::load_one(SentinelKind::Unknown, &config.unknown_image(), cache),
            error: Self::load_one(SentinelKind::Error, &config.error_image(), cache),
        }
    }

    /// Built-in placeholders only
    pub fn builtin() -> Self {
        Self {
            loading: Self::fallback(SentinelKind::Loading),
            unknown: Self::fallback(SentinelKind::Unknown),
            error: Self::fallback(SentinelKind::Error),
        }
    }

    fn load_one(kind: SentinelKind, path: &Path, cache: &ImageCache) -> Arc<DecodedImage> {
        match cache.get_or_decode(path) {
            Ok(image) => image,
            Err(e) => {
                log::warn!(
                    "{kind:?} placeholder {} unavailable, using built-in: {e}",
                    path.display()
                );
                Self::fallback(kind)
            }
        }
    }

    fn fallback(kind: SentinelKind) -> Arc<DecodedImage> {
        Arc::new(DecodedImage::Static(RawImage::solid(
            1,
            1,
            kind.fallback_color(),
        )))
    }

    pub fn get(&self, kind: SentinelKind) -> &Arc<DecodedImage> {
        match kind {
            SentinelKind::Loading => &self.loading,
            SentinelKind::Unknown => &self.unknown,
            SentinelKind::Error => &self.error,
        }
    }

    /// Image to draw for `preview`
    pub fn resolve<'a>(&'a self, preview: &'a Preview) -> &'a Arc<DecodedImage> {
        match preview {
            Preview::Loading => self.get(SentinelKind::Loading),
            Preview::Unknown => self.get(SentinelKind::Unknown),
            Preview::Error => self.get(SentinelKind::Error),
            Preview::Image(image) => image,
        }
    }
}
