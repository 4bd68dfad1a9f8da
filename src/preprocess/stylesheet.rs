//! Stylesheet preprocessor: parses stylesheets and prints plain CSS,
//! minified for release builds.

use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};

use super::{Preprocessor, Transformed};
use crate::error::YokeError;
use crate::utils::mime;

/// Stylesheet source -> plain CSS via lightningcss.
#[derive(Debug, Clone)]
pub struct StylesheetPreprocessor {
    minify: bool,
}

impl StylesheetPreprocessor {
    pub fn new(minify: bool) -> Self {
        Self { minify }
    }
}

impl Preprocessor for StylesheetPreprocessor {
    fn transform(&self, source: &Path) -> Result<Transformed, YokeError> {
        let raw = fs::read_to_string(source).map_err(|e| YokeError::PageRead {
            path: source.to_path_buf(),
            source: e,
        })?;

        let stylesheet = match StyleSheet::parse(&raw, ParserOptions::default()) {
            Ok(sheet) => sheet,
            Err(e) => {
                return Err(YokeError::Preprocess {
                    path: source.to_path_buf(),
                    message: e.to_string(),
                });
            }
        };

        let output = stylesheet
            .to_css(PrinterOptions {
                minify: self.minify,
                ..PrinterOptions::default()
            })
            .map_err(|e| YokeError::Preprocess {
                path: source.to_path_buf(),
                message: e.to_string(),
            })?;

        Ok(Transformed {
            content: output.code,
            content_type: mime::types::CSS,
        })
    }
}
