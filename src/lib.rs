//! # specstream-rs
//!
//! Runs declarative test spec files and streams the run as newline-delimited
//! JSON: one line with a snapshot of the discovered suite tree, then one line
//! per lifecycle event (`suiteStarted`, `suiteDone`, `specStarted`,
//! `specDone`) as the run progresses, so a consuming process can observe
//! results live.
//!
//! The adapter is engine-agnostic: anything implementing [`engine::Engine`]
//! can sit behind it. The crate ships [`engine::ScriptEngine`], which runs
//! plain-text spec files declaring each spec's verdict.

pub mod adapter;
pub mod engine;
pub mod error;
pub mod parser;
pub mod tree;

pub use adapter::{Adapter, RunConfig};
pub use engine::{DiscoveredNode, Engine, ExecutionSummary, Lifecycle, ScriptEngine, Subscription};
pub use error::{Error, Result};
pub use tree::{snapshot, TestNode};

use serde_json::{Map, Value};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Expand a glob pattern like `specs/*.spec` relative to a base directory
///
/// Only the final path component may contain wildcards. Matches are sorted
/// for a deterministic load order.
pub(crate) fn expand_glob(base: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    use walkdir::WalkDir;

    let (sub_dir, file_pattern) = if let Some(slash_pos) = pattern.rfind('/') {
        (&pattern[..slash_pos], &pattern[slash_pos + 1..])
    } else {
        (".", pattern)
    };

    let pattern_regex = file_pattern.replace('.', "\\.").replace('*', ".*");
    let regex = regex::Regex::new(&format!("^{}$", pattern_regex))?;

    let dir = base.join(sub_dir);
    let mut matches = Vec::new();
    for entry in WalkDir::new(&dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if entry.file_type().is_file() {
            if let Some(file_name) = entry.file_name().to_str() {
                if regex.is_match(file_name) {
                    matches.push(entry.path().to_path_buf());
                }
            }
        }
    }

    matches.sort();
    Ok(matches)
}

/// Builder for configuring and running a spec stream
///
/// # Examples
///
/// ```no_run
/// use specstream_rs::specstream;
///
/// // Run every .spec file under testdata, streaming JSON lines to stdout
/// let summary = specstream::run("testdata")
///     .spec_glob("*.spec")
///     .execute()
///     .unwrap();
/// assert_eq!(summary.failures, 0);
/// ```
pub struct Builder {
    base_dir: PathBuf,
    options_json: Option<String>,
    options: Map<String, Value>,
    spec_files: Vec<PathBuf>,
    spec_globs: Vec<String>,
    explicit_load: bool,
    suppress_default_reporter: bool,
}

impl Builder {
    fn new(base_dir: impl Into<PathBuf>) -> Self {
        Builder {
            base_dir: base_dir.into(),
            options_json: None,
            options: Map::new(),
            spec_files: Vec::new(),
            spec_globs: Vec::new(),
            explicit_load: true,
            suppress_default_reporter: true,
        }
    }

    /// Supply the engine options as a raw JSON string
    ///
    /// Parsed at execution time; a string that is not a JSON object fails the
    /// run with `MalformedConfig` before anything else happens.
    pub fn options_json(mut self, options_json: impl Into<String>) -> Self {
        self.options_json = Some(options_json.into());
        self
    }

    /// Set a single engine option
    pub fn option(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.options.insert(key.to_string(), value.into());
        self
    }

    /// Register one spec file, resolved against the spec directory
    pub fn spec_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.spec_files.push(path.into());
        self
    }

    /// Register every spec file matching a glob pattern
    ///
    /// Expanded at execution time against the spec directory; a pattern that
    /// matches nothing fails the run.
    pub fn spec_glob(mut self, pattern: impl Into<String>) -> Self {
        self.spec_globs.push(pattern.into());
        self
    }

    /// Load helpers and specs explicitly before the snapshot (default on)
    pub fn explicit_load(mut self, explicit: bool) -> Self {
        self.explicit_load = explicit;
        self
    }

    /// Silence the engine's built-in progress reporter (default on)
    pub fn suppress_default_reporter(mut self, suppress: bool) -> Self {
        self.suppress_default_reporter = suppress;
        self
    }

    fn into_config(self) -> Result<(RunConfig, bool, bool)> {
        let options = match &self.options_json {
            Some(raw) => {
                let value: Value = serde_json::from_str(raw)
                    .map_err(|e| Error::malformed_config(e.to_string()))?;
                let Value::Object(mut options) = value else {
                    return Err(Error::malformed_config("options must be a JSON object"));
                };
                for (key, value) in self.options {
                    options.insert(key, value);
                }
                options
            }
            None => self.options,
        };

        let spec_dir = options
            .get("spec_dir")
            .and_then(Value::as_str)
            .unwrap_or(".");
        let spec_root = self.base_dir.join(spec_dir);

        let mut spec_files = self.spec_files;
        for pattern in &self.spec_globs {
            let matches = expand_glob(&spec_root, pattern)?;
            if matches.is_empty() {
                return Err(Error::Generic(format!(
                    "No spec files found matching pattern: {}",
                    pattern
                )));
            }
            // expand_glob returns paths rooted at spec_root, but registered
            // spec files are resolved against spec_root again by the engine,
            // so register them relative to it
            for path in matches {
                let relative = match path.strip_prefix(&spec_root) {
                    Ok(rel) => rel.to_path_buf(),
                    Err(_) => path,
                };
                spec_files.push(relative);
            }
        }

        let config = RunConfig::from_options(&self.base_dir, options, spec_files);
        Ok((config, self.explicit_load, self.suppress_default_reporter))
    }

    /// Run with the built-in script engine, streaming to stdout
    pub fn execute(self) -> Result<ExecutionSummary> {
        let stdout = std::io::stdout();
        self.execute_to(stdout.lock())
    }

    /// Run with the built-in script engine, streaming to the given writer
    pub fn execute_to<W: Write>(self, out: W) -> Result<ExecutionSummary> {
        let (config, explicit_load, suppress) = self.into_config()?;
        let mut engine = ScriptEngine::new(&config.base_dir);
        Adapter::new(config)
            .explicit_load(explicit_load)
            .suppress_default_reporter(suppress)
            .run(&mut engine, out)
    }
}

/// Create a new builder for the given base directory
///
/// # Examples
///
/// ```no_run
/// use specstream_rs::specstream;
///
/// specstream::run(".").spec_file("a.spec").execute().unwrap();
/// ```
pub mod specstream {
    use super::*;

    /// Create a new builder for the given base directory
    pub fn run(base_dir: impl Into<PathBuf>) -> Builder {
        Builder::new(base_dir)
    }
}
