//! Markdown preprocessor: templated entry pages (`index.md`, `login.md`)
//! and markdown assets become servable HTML documents.

use std::fs;
use std::path::Path;

use pulldown_cmark::{Options, Parser, html};

use super::{Preprocessor, Transformed};
use crate::error::YokeError;
use crate::utils::mime;

/// Markdown -> HTML with the common extensions enabled.
#[derive(Debug, Clone, Default)]
pub struct MarkdownPreprocessor;

impl MarkdownPreprocessor {
    fn options() -> Options {
        let mut opts = Options::empty();
        opts.insert(Options::ENABLE_TABLES);
        opts.insert(Options::ENABLE_FOOTNOTES);
        opts.insert(Options::ENABLE_STRIKETHROUGH);
        opts.insert(Options::ENABLE_TASKLISTS);
        opts
    }
}

impl Preprocessor for MarkdownPreprocessor {
    fn transform(&self, source: &Path) -> Result<Transformed, YokeError> {
        let markdown = fs::read_to_string(source).map_err(|e| YokeError::PageRead {
            path: source.to_path_buf(),
            source: e,
        })?;

        let parser = Parser::new_ext(&markdown, Self::options());
        let mut body = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut body, parser);

        let title = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("page");

        // Wrapped in a full document so script injection has a head and body
        // to target.
        let content = format!(
            "<!doctype html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{title}</title>\n</head>\n<body>\n{body}</body>\n</html>\n"
        );

        Ok(Transformed {
            content,
            content_type: mime::types::HTML,
        })
    }
}
