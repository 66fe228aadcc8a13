//! Error types for specstream-rs

use thiserror::Error;

/// Result type alias for specstream operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for specstream operations
#[derive(Error, Debug)]
pub enum Error {
    /// The engine options argument was not a JSON object
    #[error("Malformed configuration: {message}")]
    MalformedConfig { message: String },

    /// Parse error in a spec file
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A spec or helper file could not be discovered or read
    #[error("Discovery failed for '{path}': {message}")]
    Discovery { path: String, message: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Regex error
    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// WalkDir error
    #[error("Directory walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// Generic error with message
    #[error("{0}")]
    Generic(String),

    /// Spec file error with surrounding-line context
    #[error("Error in {spec_file} at line {line_num}:\n{context}")]
    SpecFileError {
        spec_file: String,
        line_num: usize,
        context: String,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create a malformed-configuration error
    pub fn malformed_config(message: impl Into<String>) -> Self {
        Error::MalformedConfig {
            message: message.into(),
        }
    }

    /// Create a parse error
    pub fn parse_error(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a discovery error
    pub fn discovery_error(path: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Discovery {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a spec file error with context
    pub fn spec_file_error(
        spec_file: impl Into<String>,
        line_num: usize,
        spec_content: &str,
        source: Error,
    ) -> Self {
        let context = generate_error_context(spec_content, line_num);
        Error::SpecFileError {
            spec_file: spec_file.into(),
            line_num,
            context,
            source: Box::new(source),
        }
    }
}

/// Generate error context showing surrounding lines
fn generate_error_context(spec_content: &str, error_line: usize) -> String {
    let lines: Vec<&str> = spec_content.lines().collect();
    let mut context = String::new();

    let start = error_line.saturating_sub(3).max(1);
    let end = (error_line + 2).min(lines.len());

    for line_num in start..=end {
        if line_num == 0 {
            continue;
        }

        let line_content = lines.get(line_num - 1).unwrap_or(&"");

        if line_num == error_line {
            context.push_str(&format!("> {} | {}\n", line_num, line_content));
        } else {
            context.push_str(&format!("  {} | {}\n", line_num, line_content));
        }
    }

    context.trim_end().to_string()
}
