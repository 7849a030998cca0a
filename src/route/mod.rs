//! Route parser capability
//!
//! Route grammars are interpreted by external parsers implementing
//! [`RouteParser`]. The loader only needs to pick one and call it: a
//! [`ParserTable`] is built once, in priority order, and is read-only
//! afterwards.

pub mod encoding;
pub mod folders;
pub mod scene;

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use encoding::TextEncoding;
pub use scene::{AnimatedObjectState, Scene, SceneObject, SharedScene};

/// Everything a parser receives for one load
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRequest {
    pub path: PathBuf,
    pub encoding: TextEncoding,
    pub object_folder: PathBuf,
    pub sound_folder: PathBuf,
}

impl RouteRequest {
    /// Request for `path` with object and sound folders under its railway folder
    pub fn for_file(path: impl Into<PathBuf>, encoding: TextEncoding) -> Self {
        let path = path.into();
        let railway = folders::railway_folder(&path);
        Self {
            object_folder: railway.join("Object"),
            sound_folder: railway.join("Sound"),
            path,
            encoding,
        }
    }
}

/// A route description parser
pub trait RouteParser: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this parser claims `path`
    fn can_load(&self, path: &Path) -> bool;

    /// Parse the route; the returned error reaches the user unchanged
    fn load(&self, request: &RouteRequest) -> anyhow::Result<Scene>;
}

/// Registered parsers in priority order
#[derive(Clone, Default)]
pub struct ParserTable {
    parsers: Vec<Arc<dyn RouteParser>>,
}

impl fmt::Debug for ParserTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

impl ParserTable {
    pub fn new(parsers: Vec<Arc<dyn RouteParser>>) -> Self {
        Self { parsers }
    }

    /// First parser that claims `path`
    pub fn resolve(&self, path: &Path) -> Option<&dyn RouteParser> {
        self.parsers
            .iter()
            .find(|parser| parser.can_load(path))
            .map(|parser| parser.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.parsers.iter().map(|parser| parser.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.parsers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parsers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct ExtensionParser {
        name: &'static str,
        extension: &'static str,
    }

    impl RouteParser for ExtensionParser {
        fn name(&self) -> &str {
            self.name
        }

        fn can_load(&self, path: &Path) -> bool {
            path.extension().and_then(|e| e.to_str()) == Some(self.extension)
        }

        fn load(&self, _request: &RouteRequest) -> anyhow::Result<Scene> {
            Ok(Scene::default())
        }
    }

    fn table() -> ParserTable {
        ParserTable::new(vec![
            Arc::new(ExtensionParser {
                name: "csv",
                extension: "csv",
            }),
            Arc::new(ExtensionParser {
                name: "fallback-csv",
                extension: "csv",
            }),
            Arc::new(ExtensionParser {
                name: "rw",
                extension: "rw",
            }),
        ])
    }

    #[test]
    fn test_resolve_uses_priority_order() {
        let table = table();
        let parser = table.resolve(Path::new("line.csv")).unwrap();
        assert_eq!(parser.name(), "csv");
        assert_eq!(table.resolve(Path::new("line.rw")).unwrap().name(), "rw");
    }

    #[test]
    fn test_resolve_not_found() {
        assert!(table().resolve(Path::new("line.txt")).is_none());
        assert!(ParserTable::default().resolve(Path::new("line.csv")).is_none());
    }

    #[test]
    fn test_request_folders_fall_back_to_containing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let route = dir.path().join("line.csv");
        let request = RouteRequest::for_file(&route, TextEncoding::utf8());
        assert_eq!(request.object_folder, dir.path().join("Object"));
        assert_eq!(request.sound_folder, dir.path().join("Sound"));
    }
}
