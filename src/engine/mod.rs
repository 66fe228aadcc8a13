//! Engine abstraction and lifecycle event contract
//!
//! The adapter never talks to a concrete engine directly; it drives anything
//! implementing [`Engine`]. The built-in [`script::ScriptEngine`] runs
//! declarative spec files, and tests substitute fakes behind the same
//! four-event contract.

pub mod script;

pub use script::ScriptEngine;

use crate::error::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;

/// The four lifecycle events an engine reports during a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifecycle {
    SuiteStarted,
    SuiteDone,
    SpecStarted,
    SpecDone,
}

impl Lifecycle {
    /// Every event, in no particular order
    pub const ALL: [Lifecycle; 4] = [
        Lifecycle::SuiteStarted,
        Lifecycle::SuiteDone,
        Lifecycle::SpecStarted,
        Lifecycle::SpecDone,
    ];

    /// The event name as it appears on the wire
    pub fn as_str(self) -> &'static str {
        match self {
            Lifecycle::SuiteStarted => "suiteStarted",
            Lifecycle::SuiteDone => "suiteDone",
            Lifecycle::SpecStarted => "specStarted",
            Lifecycle::SpecDone => "specDone",
        }
    }

    fn index(self) -> usize {
        match self {
            Lifecycle::SuiteStarted => 0,
            Lifecycle::SuiteDone => 1,
            Lifecycle::SpecStarted => 2,
            Lifecycle::SpecDone => 3,
        }
    }
}

impl fmt::Display for Lifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Handler invoked with the engine-supplied payload of one event
pub type Handler<'a> = Box<dyn FnMut(&Value) -> Result<()> + 'a>;

/// Handler for the engine's built-in progress reporter output
pub type PrintHandler = Box<dyn FnMut(&str)>;

/// A per-run listener registry
///
/// Constructed fresh for every run and passed explicitly into
/// [`Engine::execute`]; there is no process-wide reporter state. Events with
/// no registered handler are dropped silently.
#[derive(Default)]
pub struct Subscription<'a> {
    handlers: [Option<Handler<'a>>; 4],
}

impl<'a> Subscription<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for one lifecycle event, replacing any previous one
    pub fn subscribe<F>(&mut self, event: Lifecycle, handler: F)
    where
        F: FnMut(&Value) -> Result<()> + 'a,
    {
        self.handlers[event.index()] = Some(Box::new(handler));
    }

    /// Dispatch an event to its handler, if any
    pub fn emit(&mut self, event: Lifecycle, data: &Value) -> Result<()> {
        match &mut self.handlers[event.index()] {
            Some(handler) => handler(data),
            None => Ok(()),
        }
    }
}

/// A node of the discovered suite tree, as every engine reports it
///
/// The same shape is used for suites and specs; only the presence of children
/// distinguishes them. All fields default so that a sparsely populated node
/// still round-trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveredNode {
    pub id: String,
    pub description: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    pub children: Vec<DiscoveredNode>,
}

/// Counts reported by the engine once a run completes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    /// Specs executed
    pub specs: usize,
    /// Specs that finished with a failed status
    pub failures: usize,
}

/// The contract between the adapter and a test engine
///
/// Call order matters: `configure` and `add_spec_files` before `load`,
/// `load` (or a lazy `top_suite`) before `execute`. `load` is idempotent.
pub trait Engine {
    /// Apply an options object. Keys the engine does not recognize are
    /// accepted and ignored.
    fn configure(&mut self, options: &Map<String, Value>) -> Result<()>;

    /// Register spec files for discovery, in order
    fn add_spec_files(&mut self, files: &[PathBuf]);

    /// Replace the built-in progress reporter's output sink
    fn set_print_handler(&mut self, handler: PrintHandler);

    /// Load helpers and spec files and build the suite tree
    fn load(&mut self) -> Result<()>;

    /// The root of the discovered tree, loading on demand
    fn top_suite(&mut self) -> Result<DiscoveredNode>;

    /// Run every discovered spec, reporting through the subscription
    fn execute(&mut self, subscription: &mut Subscription<'_>) -> Result<ExecutionSummary>;
}
