// roseread-parsers/src/traits.rs
//! Core traits defining the decoder interface for all asset formats.
//!
//! Every format is decoded from a complete in-memory byte slice. This module
//! establishes:
//! - The error taxonomy shared by all decoders
//! - Decode options (validation strictness, file loading limits)
//! - The `Parser` trait with file loading built on top of slice decoding

use std::fs::File;
use std::io::Read;
use std::path::Path;

use memmap2::Mmap;
use serde::Serialize;
use thiserror::Error;

/// Errors that can occur during decoding
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Truncated input at offset {offset}: requested {requested} bytes, {available} available")]
    TruncatedInput {
        offset: u64,
        requested: usize,
        available: usize,
    },

    #[error("Invalid EUC-KR text at offset {offset} ({length} bytes)")]
    TextDecode { offset: u64, length: usize },

    #[error("Unrecognized {format} identifier: {found:?}")]
    UnrecognizedFormat { format: &'static str, found: String },

    #[error("Unsupported {format} version: {version:?}")]
    UnsupportedVersion {
        format: &'static str,
        version: String,
    },

    #[error("Invalid bone hierarchy: bone {bone} has parent {parent} (bone count {bone_count})")]
    InvalidHierarchy {
        bone: usize,
        parent: i32,
        bone_count: usize,
    },

    #[error("Invalid structure: {0}")]
    InvalidStructure(String),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Input too large: {size} bytes exceeds limit of {limit} bytes")]
    InputTooLarge { size: u64, limit: u64 },

    #[error("Nested error in {context}: {source}")]
    Nested {
        context: String,
        #[source]
        source: Box<ParseError>,
    },
}

impl ParseError {
    /// Wrap this error with additional context
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ParseError::Nested {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, skipping any context wrappers
    pub fn root_cause(&self) -> &ParseError {
        match self {
            ParseError::Nested { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Create an invalid structure error
    pub fn invalid(message: impl Into<String>) -> Self {
        ParseError::InvalidStructure(message.into())
    }
}

/// Result type alias for decoding operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Configuration options for decoding
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Run cross-checks that are not needed to read the layout
    /// (bone parent order, stored patch bounds against the height grid)
    pub strict_validation: bool,
    /// Whether to use memory mapping for large files
    pub use_memory_mapping: bool,
    /// Minimum file size to enable memory mapping
    pub memory_mapping_threshold: u64,
    /// Files larger than this are rejected before any byte is decoded
    pub max_input_size: u64,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            strict_validation: true,
            use_memory_mapping: true,
            memory_mapping_threshold: 10 * 1024 * 1024, // 10 MB
            max_input_size: 256 * 1024 * 1024,          // 256 MB
        }
    }
}

impl ParseOptions {
    /// Options with every optional cross-check disabled
    pub fn lenient() -> Self {
        Self {
            strict_validation: false,
            ..Self::default()
        }
    }
}

/// Core trait for all asset decoders
///
/// Implementors are stateless; one value can decode any number of files,
/// from any number of threads.
pub trait Parser: Send + Sync {
    /// The decoded record type
    type Output: Send + Sync;

    /// Returns a human-readable name for this parser
    fn name(&self) -> &str;

    /// Returns the file extensions this parser handles (e.g., ["zms"])
    fn extensions(&self) -> &[&str];

    /// Decode from a byte slice with default options
    fn parse(&self, data: &[u8]) -> ParseResult<Self::Output> {
        self.parse_with_options(data, &ParseOptions::default())
    }

    /// Decode from a byte slice with custom options
    fn parse_with_options(&self, data: &[u8], options: &ParseOptions) -> ParseResult<Self::Output>;

    /// Decode from a file path
    fn parse_file(&self, path: &Path) -> ParseResult<Self::Output> {
        self.parse_file_with_options(path, &ParseOptions::default())
    }

    /// Decode from a file path with options
    ///
    /// The file is opened, loaded (or mapped) and closed within this call.
    fn parse_file_with_options(&self, path: &Path, options: &ParseOptions) -> ParseResult<Self::Output> {
        crate::logging::instrument_parse(self.name(), path, || {
            let result = load_and_parse(self, path, options);
            if let Err(ref error) = result {
                crate::log_parse_error!(self.name(), error);
            }
            result.map_err(|e| e.with_context(path.display().to_string()))
        })
    }

    /// Check if this parser handles the given file, by extension
    fn can_parse(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .is_some_and(|ext| self.extensions().iter().any(|e| e.eq_ignore_ascii_case(&ext)))
    }
}

fn load_and_parse<P: Parser + ?Sized>(
    parser: &P,
    path: &Path,
    options: &ParseOptions,
) -> ParseResult<P::Output> {
    let mut file = File::open(path)?;
    let size = file.metadata()?.len();

    if size > options.max_input_size {
        return Err(ParseError::InputTooLarge {
            size,
            limit: options.max_input_size,
        });
    }

    if options.use_memory_mapping && size > 0 && size >= options.memory_mapping_threshold {
        // SAFETY: the mapping is read-only and dropped before this call returns.
        let map = unsafe { Mmap::map(&file)? };
        return parser.parse_with_options(&map, options);
    }

    let mut data = Vec::with_capacity(usize::try_from(size).unwrap_or_default());
    file.read_to_end(&mut data)?;
    parser.parse_with_options(&data, options)
}

/// Trait for converting decoded records to human-readable formats
pub trait HumanReadable {
    /// Convert to a short multi-line text summary
    fn to_readable_string(&self) -> String;

    /// Convert to JSON
    fn to_json(&self) -> serde_json::Value
    where
        Self: Serialize,
    {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoParser;

    impl Parser for EchoParser {
        type Output = usize;

        fn name(&self) -> &str {
            "Echo"
        }

        fn extensions(&self) -> &[&str] {
            &["echo"]
        }

        fn parse_with_options(&self, data: &[u8], _options: &ParseOptions) -> ParseResult<usize> {
            Ok(data.len())
        }
    }

    #[test]
    fn test_parse_error_context() {
        let error = ParseError::UnrecognizedFormat {
            format: "mesh",
            found: "ABC".into(),
        };

        let contextualized = error.with_context("parsing header").with_context("file.zms");

        match &contextualized {
            ParseError::Nested { context, .. } => assert_eq!(context, "file.zms"),
            _ => panic!("Expected Nested error"),
        }
        assert!(matches!(
            contextualized.root_cause(),
            ParseError::UnrecognizedFormat { .. }
        ));
    }

    #[test]
    fn test_can_parse_is_case_insensitive() {
        assert!(EchoParser.can_parse(Path::new("data/FILE.ECHO")));
        assert!(EchoParser.can_parse(Path::new("file.echo")));
        assert!(!EchoParser.can_parse(Path::new("file.txt")));
        assert!(!EchoParser.can_parse(Path::new("echo")));
    }

    #[test]
    fn test_parse_file_rejects_oversized_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.echo");
        std::fs::write(&path, [0u8; 64]).unwrap();

        let options = ParseOptions {
            max_input_size: 16,
            ..ParseOptions::default()
        };
        let err = EchoParser.parse_file_with_options(&path, &options).unwrap_err();
        assert!(matches!(
            err.root_cause(),
            ParseError::InputTooLarge { size: 64, limit: 16 }
        ));

        assert_eq!(EchoParser.parse_file(&path).unwrap(), 64);
    }

    #[test]
    fn test_parse_file_memory_mapped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapped.echo");
        std::fs::write(&path, [7u8; 32]).unwrap();

        let options = ParseOptions {
            memory_mapping_threshold: 1,
            ..ParseOptions::default()
        };
        assert_eq!(EchoParser.parse_file_with_options(&path, &options).unwrap(), 32);
    }
}
