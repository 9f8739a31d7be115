pub mod classify;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod lexer;
pub mod slots;
pub mod stream;
pub mod syntax;
pub mod token;
pub mod trace;
pub mod tracker;

use std::path::Path;

use rayon::prelude::*;

pub use classify::{classify, AmbiguityLevel, AnalysisError, Category, Classification, Occurrence};
pub use config::{BarewordToml, Mode, OutputFormat};
pub use diagnostics::{
    render_report, AnalysisSummary, Group, Notice, Outcome, Reporter, Severity, UnitReport,
};
pub use engine::{analyze_unit, UnitAnalyzer};
pub use lexer::lex;
pub use slots::infer_slots;
pub use stream::{
    expand_target, load_unit, unit_from_document, unit_from_source, StreamError, TokenDocument,
    Unit,
};
pub use token::{Position, Slot, SlottedToken, Token, TokenKind};
pub use trace::{debug_trace_enabled, with_debug_trace};
pub use tracker::{DeclarationKind, DeclarationTracker, DuplicateBenignDeclaration, Snapshot};

#[derive(Debug)]
pub enum BarewordError {
    Io(std::io::Error),
    InvalidPath(String),
    InvalidCommand(String),
    Config(String),
    Stream(StreamError),
    Json(serde_json::Error),
    /// Findings were already printed; the process should exit non-zero.
    Diagnostics,
}

impl std::fmt::Display for BarewordError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BarewordError::Io(err) => write!(f, "IO error: {err}"),
            BarewordError::InvalidPath(path) => write!(f, "Invalid path: {path}"),
            BarewordError::InvalidCommand(command) => write!(f, "Invalid command: {command}"),
            BarewordError::Config(message) => write!(f, "Config error: {message}"),
            BarewordError::Stream(err) => write!(f, "Token stream error: {err}"),
            BarewordError::Json(err) => write!(f, "JSON error: {err}"),
            BarewordError::Diagnostics => write!(f, "Analysis reported failures"),
        }
    }
}

impl std::error::Error for BarewordError {}

impl From<std::io::Error> for BarewordError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for BarewordError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<StreamError> for BarewordError {
    fn from(err: StreamError) -> Self {
        Self::Stream(err)
    }
}

/// Analyzes one unit with a fresh tracker.
pub fn analyze(unit: Unit, mode: Mode) -> UnitReport {
    let Unit {
        name,
        tokens,
        notices,
    } = unit;
    UnitAnalyzer::new(tokens, mode)
        .with_notices(notices)
        .run(&name)
}

/// Maps `items` on the rayon pool, keeping input order. The calling thread's
/// trace setting is re-applied on the workers, which do not inherit overrides.
fn par_map<T, U, F>(items: Vec<T>, f: F) -> Vec<U>
where
    T: Send,
    U: Send,
    F: Fn(T) -> U + Sync,
{
    let trace = debug_trace_enabled();
    items
        .into_par_iter()
        .map(|item| with_debug_trace(trace, || f(item)))
        .collect()
}

/// Analyzes independent units in parallel; reports keep the input order.
pub fn analyze_units(units: Vec<Unit>, mode: Mode) -> AnalysisSummary {
    let reports = par_map(units, |unit| analyze(unit, mode));
    AnalysisSummary { units: reports }
}

pub fn analyze_source(name: &str, content: &str, mode: Mode) -> UnitReport {
    analyze(unit_from_source(name, content), mode)
}

pub fn analyze_file(path: &Path, mode: Mode) -> Result<UnitReport, BarewordError> {
    Ok(analyze(load_unit(path)?, mode))
}

pub fn analyze_target(target: &str, mode: Mode) -> Result<AnalysisSummary, BarewordError> {
    let paths = expand_target(target)?;
    let units = par_map(paths, |path| load_unit(&path))
        .into_iter()
        .collect::<Result<Vec<_>, _>>()?;
    Ok(analyze_units(units, mode))
}
