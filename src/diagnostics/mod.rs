use crate::span::Span;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("Syntax error: {msg}")]
    Syntax { msg: String, span: Span },

    #[error("Config error: {msg}")]
    Config { msg: String, path: PathBuf },

    #[error("I/O error: {msg}")]
    Io { msg: String },

    #[error("analysis failed with {count} error(s)")]
    Analysis { count: usize },

    #[error("Standard library error: {msg}")]
    Stdlib { msg: String },

    #[error("Runtime error: {0}")]
    Runtime(#[from] crate::interpreter::RuntimeError),
}

impl CompileError {
    pub fn syntax(msg: impl Into<String>, span: Span) -> Self {
        Self::Syntax { msg: msg.into(), span }
    }

    pub fn config(msg: impl Into<String>, path: PathBuf) -> Self {
        Self::Config { msg: msg.into(), path }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::Io { msg: msg.into() }
    }
}

/// Invariant violations inside the analyzer or evaluator.
///
/// These are never caused by user input alone. They abort the whole run via
/// [`internal_error`].
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InternalError {
    #[error("placeholder '{name}' is already bound and cannot be rebound")]
    PlaceholderRebound { name: String },

    #[error("placeholder '{name}' cannot be bound to itself")]
    PlaceholderCycle { name: String },

    #[error("cannot pop the outermost scope")]
    PopLastScope,

    #[error("cannot overwrite read-only entry '{name}'")]
    ReadonlyOverwrite { name: String },

    /// Two composites share an id but not their field names or field count.
    /// Field types are not compared: instances of one generic declaration
    /// legitimately differ there.
    #[error("composites with id '{id}' disagree on their fields")]
    InconsistentComposite { id: String },

    #[error("no type was recorded for the node at {start}..{end}; was it analyzed?")]
    UnresolvedNode { start: usize, end: usize },

    #[error("symbol '{name}' was not found at runtime")]
    UnknownSymbol { name: String },

    #[error("{0}")]
    Other(String),
}

/// Abort the current analysis or interpretation run.
#[track_caller]
pub fn internal_error(err: InternalError) -> ! {
    panic!("internal error: {err}")
}

/// A recoverable, user-facing analysis diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub message: String,
    pub span: Span,
    pub secondary: Option<Span>,
    pub highlight: Option<String>,
}

impl Finding {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self { message: message.into(), span, secondary: None, highlight: None }
    }

    pub fn with_secondary(mut self, span: Span) -> Self {
        self.secondary = Some(span);
        self
    }

    pub fn with_highlight(mut self, msg: impl Into<String>) -> Self {
        self.highlight = Some(msg.into());
        self
    }
}

/// Errors and warnings accumulated by `analyze()` calls, merged bottom-up.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Findings {
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
}

impl Findings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error(finding: Finding) -> Self {
        Self { errors: vec![finding], warnings: Vec::new() }
    }

    pub fn push_error(&mut self, finding: Finding) {
        self.errors.push(finding);
    }

    pub fn push_warning(&mut self, finding: Finding) {
        self.warnings.push(finding);
    }

    pub fn merge(mut self, other: Findings) -> Findings {
        self.extend(other);
        self
    }

    pub fn extend(&mut self, other: Findings) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
    }

    pub fn is_erroneous(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Render a CompileError with ariadne for nice terminal output.
pub fn render_error(source: &str, _filename: &str, err: &CompileError) {
    use ariadne::{Label, Report, ReportKind, Source};

    match err {
        CompileError::Syntax { msg, span } => {
            let _ = Report::build(ReportKind::Error, (), span.start)
                .with_message("syntax error")
                .with_label(Label::new(span.range()).with_message(msg))
                .finish()
                .eprint(Source::from(source));
        }
        CompileError::Config { msg, path } => {
            eprintln!("error[config]: {msg}");
            eprintln!("  --> {}", path.display());
        }
        CompileError::Io { msg } => {
            eprintln!("error: {msg}");
        }
        CompileError::Analysis { count } => {
            eprintln!("error: analysis failed with {count} error(s)");
        }
        CompileError::Stdlib { msg } => {
            eprintln!("error[stdlib]: {msg}");
        }
        CompileError::Runtime(err) => {
            eprintln!("error[runtime]: {err}");
        }
    }
}

fn build_report(finding: &Finding, kind: ariadne::ReportKind<'static>, color: bool) -> ariadne::Report<'static, std::ops::Range<usize>> {
    use ariadne::{Config, Label, Report};

    let mut primary = Label::new(finding.span.range());
    if let Some(highlight) = &finding.highlight {
        primary = primary.with_message(highlight);
    }
    let mut report = Report::build(kind, (), finding.span.start)
        .with_config(Config::default().with_color(color))
        .with_message(&finding.message)
        .with_label(primary);
    if let Some(secondary) = finding.secondary {
        report = report.with_label(Label::new(secondary.range()));
    }
    report.finish()
}

/// Render every finding to stderr, errors first.
pub fn render_findings(source: &str, findings: &Findings) {
    use ariadne::{ReportKind, Source};

    for finding in &findings.errors {
        let _ = build_report(finding, ReportKind::Error, true).eprint(Source::from(source));
    }
    for finding in &findings.warnings {
        let _ = build_report(finding, ReportKind::Warning, true).eprint(Source::from(source));
    }
}

/// Render findings into a plain (uncolored) string.
pub fn render_findings_to_string(source: &str, findings: &Findings) -> String {
    use ariadne::{ReportKind, Source};

    let mut out = Vec::new();
    for finding in &findings.errors {
        let _ = build_report(finding, ReportKind::Error, false).write(Source::from(source), &mut out);
    }
    for finding in &findings.warnings {
        let _ = build_report(finding, ReportKind::Warning, false).write(Source::from(source), &mut out);
    }
    String::from_utf8_lossy(&out).into_owned()
}
