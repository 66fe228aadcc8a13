//! Event-forwarding adapter
//!
//! Bridges an engine's callback-based reporting to newline-delimited JSON on
//! a single output stream: one snapshot line describing the discovered tree,
//! then one line per lifecycle event, each flushed as it is written.

use crate::engine::{Engine, ExecutionSummary, Lifecycle, Subscription};
use crate::error::{Error, Result};
use crate::tree;
use serde::Serialize;
use serde_json::{Map, Value};
use std::cell::RefCell;
use std::io::Write;
use std::path::PathBuf;
use std::rc::Rc;

/// Immutable per-run configuration, built once from process input
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Base project directory the engine is scoped to
    pub base_dir: PathBuf,
    /// Engine options, forwarded unexamined
    pub options: Map<String, Value>,
    /// Spec files to register, in order
    pub spec_files: Vec<PathBuf>,
}

impl RunConfig {
    /// Build a configuration, parsing the options argument
    ///
    /// # Errors
    /// `MalformedConfig` if `options_json` is not a JSON object. Nothing is
    /// applied to any engine before this succeeds.
    pub fn new(
        base_dir: impl Into<PathBuf>,
        options_json: &str,
        spec_files: Vec<PathBuf>,
    ) -> Result<Self> {
        let value: Value = serde_json::from_str(options_json)
            .map_err(|e| Error::malformed_config(e.to_string()))?;
        let Value::Object(options) = value else {
            return Err(Error::malformed_config("options must be a JSON object"));
        };

        Ok(RunConfig {
            base_dir: base_dir.into(),
            options,
            spec_files,
        })
    }

    /// Build a configuration from an already-parsed options object
    pub fn from_options(
        base_dir: impl Into<PathBuf>,
        options: Map<String, Value>,
        spec_files: Vec<PathBuf>,
    ) -> Self {
        RunConfig {
            base_dir: base_dir.into(),
            options,
            spec_files,
        }
    }
}

/// One event line on the wire
#[derive(Serialize)]
struct EventRecord<'a> {
    event: &'a str,
    data: &'a Value,
}

/// Drives one engine run and forwards its reporting
///
/// The two flags cover both historical deployment modes of the runner: with
/// `explicit_load` the adapter loads helpers and specs itself before taking
/// the snapshot, otherwise the engine loads lazily; `suppress_default_reporter`
/// replaces the engine's built-in progress output with a no-op so the output
/// stream carries nothing but JSON lines. Both default to on.
pub struct Adapter {
    config: RunConfig,
    explicit_load: bool,
    suppress_default_reporter: bool,
}

impl Adapter {
    /// Create an adapter with both flags enabled
    pub fn new(config: RunConfig) -> Self {
        Adapter {
            config,
            explicit_load: true,
            suppress_default_reporter: true,
        }
    }

    /// Load helpers and specs explicitly before the snapshot
    pub fn explicit_load(mut self, explicit: bool) -> Self {
        self.explicit_load = explicit;
        self
    }

    /// Replace the engine's built-in reporter output with a no-op
    pub fn suppress_default_reporter(mut self, suppress: bool) -> Self {
        self.suppress_default_reporter = suppress;
        self
    }

    /// Configure the engine, emit the snapshot line, then run to completion
    ///
    /// Startup order is strict: options and spec files are applied first, the
    /// listener is registered before anything can execute, and the snapshot
    /// line is written before any event line. Discovery errors propagate
    /// unmodified; when discovery fails no snapshot line is emitted.
    pub fn run<W: Write>(&self, engine: &mut dyn Engine, out: W) -> Result<ExecutionSummary> {
        engine.configure(&self.config.options)?;
        engine.add_spec_files(&self.config.spec_files);

        if self.suppress_default_reporter {
            engine.set_print_handler(Box::new(|_| {}));
        }

        let out = Rc::new(RefCell::new(out));
        let mut subscription = Subscription::new();
        for event in Lifecycle::ALL {
            let out = Rc::clone(&out);
            subscription.subscribe(event, move |data| {
                write_line(
                    &out,
                    &EventRecord {
                        event: event.as_str(),
                        data,
                    },
                )
            });
        }

        if self.explicit_load {
            engine.load()?;
        }

        let top = engine.top_suite()?;
        write_line(&out, &tree::snapshot(&top))?;

        engine.execute(&mut subscription)
    }
}

/// Write one record as a single flushed line
///
/// The line is formatted in full before any byte reaches the writer, so each
/// write is atomic at line granularity.
fn write_line<W: Write>(out: &Rc<RefCell<W>>, record: &impl Serialize) -> Result<()> {
    let line = serde_json::to_string(record)?;
    let mut out = out.borrow_mut();
    out.write_all(line.as_bytes())?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
