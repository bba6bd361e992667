pub mod span;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
pub mod typeck;
pub mod stdlib;
pub mod interpreter;
pub mod config;

use std::io::Write;
use std::path::Path;

use config::Config;
use diagnostics::{CompileError, Findings};
use interpreter::Interpreter;
use parser::ast::{Program, Stmt};
use typeck::types::SymbolType;
use typeck::AnalysisContext;

/// A parsed and analyzed program, with the standard library it was
/// analyzed against.
pub struct Checked {
    pub program: Program,
    pub prelude: Option<Program>,
    pub ctx: AnalysisContext,
    pub findings: Findings,
}

/// Analyze a source string (lex → parse → stdlib → analyze).
///
/// Syntax errors and a broken standard library are returned as `Err`;
/// analysis findings in user code are returned in [`Checked::findings`].
pub fn check_source(source: &str, config: &Config) -> Result<Checked, CompileError> {
    let mut ctx = AnalysisContext::new();

    let prelude = match config.prelude_source()? {
        Some(text) => {
            let prelude = stdlib::parse_prelude(&text)
                .map_err(|e| CompileError::Stdlib { msg: e.to_string() })?;
            let findings = stdlib::inject_stdlib(&prelude, &mut ctx);
            if let Some(first) = findings.errors.first() {
                return Err(CompileError::Stdlib { msg: first.message.clone() });
            }
            Some(prelude)
        }
        None => None,
    };

    let program = parser::parse_source(source)?;
    let findings = typeck::analyze_program(&program, &mut ctx);
    Ok(Checked { program, prelude, ctx, findings })
}

/// Read and analyze a file, using the `keel.toml` discovered next to it
/// unless `config` is given.
pub fn check_file(path: &Path, config: Option<&Config>) -> Result<(String, Checked), CompileError> {
    let source = std::fs::read_to_string(path)
        .map_err(|e| CompileError::io(format!("failed to read '{}': {e}", path.display())))?;
    let discovered;
    let config = match config {
        Some(c) => c,
        None => {
            let dir = path.parent().unwrap_or(Path::new("."));
            discovered = Config::discover(dir)?;
            &discovered
        }
    };
    let checked = check_source(&source, config)?;
    Ok((source, checked))
}

/// Evaluate an analyzed program. Refuses to run when analysis reported
/// errors.
pub fn run_checked<W: Write>(checked: &Checked, out: W) -> Result<W, CompileError> {
    if checked.findings.is_erroneous() {
        return Err(CompileError::Analysis { count: checked.findings.errors.len() });
    }
    let mut interp = Interpreter::new(&checked.ctx, out);
    if let Some(prelude) = &checked.prelude {
        interp.inject_stdlib(prelude)?;
    }
    interp.run(&checked.program)?;
    Ok(interp.into_output())
}

pub fn run_source<W: Write>(source: &str, config: &Config, out: W) -> Result<W, CompileError> {
    let checked = check_source(source, config)?;
    run_checked(&checked, out)
}

/// One line per top-level declaration with the type analysis gave it.
pub fn describe_declarations(checked: &Checked) -> Vec<String> {
    let ctx = &checked.ctx;
    let mut lines = Vec::new();
    for item in &checked.program.items {
        let (keyword, name) = match &item.node {
            Stmt::TypeDecl(decl) => (decl.kind.keyword(), &decl.name),
            Stmt::Function(func) => ("function", &func.name),
            Stmt::Let { name, is_const, .. } => (if *is_const { "const" } else { "let" }, name),
            _ => continue,
        };
        let Some(ty) = ctx.try_resolve_type(name.span) else {
            continue;
        };
        let line = match (&item.node, ctx.arena.get(ctx.arena.peel(ty))) {
            (Stmt::TypeDecl(_), SymbolType::Composite(c)) => {
                let fields: Vec<String> = c.fields.iter()
                    .map(|(field, t)| format!("{field}: {}", ctx.arena.display(*t)))
                    .collect();
                format!("{keyword} {} {{ {} }}", ctx.arena.display(ty), fields.join(", "))
            }
            _ => format!("{keyword} {}: {}", name.node, ctx.arena.display(ty)),
        };
        lines.push(line);
    }
    lines
}
