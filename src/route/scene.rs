//! Parsed scene and the shared slot it lives in

use parking_lot::{Mutex, RwLock};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// An object placed by the route
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SceneObject {
    pub name: String,
    /// Whether the frame loop advances this object's animation
    pub animated: bool,
}

/// Result of a successful route parse
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Scene {
    /// Preview image named by the route itself
    pub image: Option<PathBuf>,
    /// Route description, in whatever line endings the file used
    pub comment: String,
    pub objects: Vec<SceneObject>,
}

/// Per-frame animation state of one animated object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnimatedObjectState {
    pub name: String,
    pub elapsed: Duration,
    pub updates: u64,
}

/// The current scene, shared between worker lanes and the frame loop
///
/// A scene is only ever replaced as a whole. Animated object state is
/// touched by both sides, so every access to it goes through one lock.
#[derive(Debug, Default)]
pub struct SharedScene {
    current: RwLock<Option<Arc<Scene>>>,
    animated: Mutex<Vec<AnimatedObjectState>>,
}

impl SharedScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Option<Arc<Scene>> {
        self.current.read().clone()
    }

    /// Install `scene`, resetting animation state to its objects
    pub fn replace(&self, scene: Arc<Scene>) {
        self.replace_if(scene, || true);
    }

    /// Install `scene` only if `still_wanted` holds once the locks are taken
    pub fn replace_if(&self, scene: Arc<Scene>, still_wanted: impl FnOnce() -> bool) -> bool {
        let mut animated = self.animated.lock();
        let mut current = self.current.write();
        if !still_wanted() {
            return false;
        }

        *animated = scene
            .objects
            .iter()
            .filter(|object| object.animated)
            .map(|object| AnimatedObjectState {
                name: object.name.clone(),
                elapsed: Duration::ZERO,
                updates: 0,
            })
            .collect();
        *current = Some(scene);
        true
    }

    /// Advance every animated object by one frame
    pub fn update_animated(&self, elapsed: Duration) {
        for state in self.animated.lock().iter_mut() {
            state.elapsed += elapsed;
            state.updates += 1;
        }
    }

    /// Run `f` with exclusive access to the animation state
    pub fn with_animated<R>(&self, f: impl FnOnce(&mut [AnimatedObjectState]) -> R) -> R {
        f(&mut self.animated.lock())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scene(comment: &str) -> Arc<Scene> {
        Arc::new(Scene {
            image: None,
            comment: comment.to_string(),
            objects: vec![
                SceneObject {
                    name: "signal".into(),
                    animated: true,
                },
                SceneObject {
                    name: "platform".into(),
                    animated: false,
                },
            ],
        })
    }

    #[test]
    fn test_replace_resets_animation() {
        let shared = SharedScene::new();
        assert!(shared.current().is_none());

        shared.replace(scene("first"));
        shared.update_animated(Duration::from_millis(16));
        shared.with_animated(|states| {
            assert_eq!(states.len(), 1);
            assert_eq!(states[0].name, "signal");
            assert_eq!(states[0].updates, 1);
        });

        shared.replace(scene("second"));
        assert_eq!(shared.current().unwrap().comment, "second");
        shared.with_animated(|states| assert_eq!(states[0].updates, 0));
    }

    #[test]
    fn test_replace_if_rejected_keeps_scene() {
        let shared = SharedScene::new();
        shared.replace(scene("kept"));
        assert!(!shared.replace_if(scene("dropped"), || false));
        assert_eq!(shared.current().unwrap().comment, "kept");
    }
}
