//! Preprocessor registry.
//!
//! Maps a file extension to a transform producing servable content and its
//! content type. The registry is populated once at startup and consulted by
//! both the page renderer (templated entry pages) and the local server
//! (preprocessed asset requests).

mod markdown;
mod stylesheet;

pub use markdown::MarkdownPreprocessor;
pub use stylesheet::StylesheetPreprocessor;

use std::path::Path;

use rustc_hash::FxHashMap;

use crate::config::BuildMode;
use crate::error::YokeError;

/// Output of a preprocessor run.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub content: String,
    pub content_type: &'static str,
}

/// A transform from a templating or stylesheet source format to servable
/// HTML/CSS content.
pub trait Preprocessor: Send + Sync {
    fn transform(&self, source: &Path) -> Result<Transformed, YokeError>;
}

/// Extension -> implementation registry.
pub struct PreprocessorRegistry {
    map: FxHashMap<&'static str, Box<dyn Preprocessor>>,
}

impl PreprocessorRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self {
            map: FxHashMap::default(),
        }
    }

    /// The default registrations: markdown pages and stylesheet lowering
    /// (minified for release builds).
    pub fn with_defaults(mode: BuildMode) -> Self {
        let mut registry = Self::new();
        registry.register("md", Box::new(MarkdownPreprocessor::default()));
        registry.register(
            "css",
            Box::new(StylesheetPreprocessor::new(mode == BuildMode::Release)),
        );
        registry
    }

    pub fn register(&mut self, extension: &'static str, preprocessor: Box<dyn Preprocessor>) {
        self.map.insert(extension, preprocessor);
    }

    /// Look up the preprocessor registered for a path's extension.
    pub fn for_path(&self, path: &Path) -> Option<&dyn Preprocessor> {
        let ext = path.extension()?.to_str()?;
        self.map.get(ext).map(Box::as_ref)
    }
}

impl Default for PreprocessorRegistry {
    fn default() -> Self {
        Self::new()
    }
}
