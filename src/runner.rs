use crate::config::Config;
use crate::error::{ParseError, RuntimeError, SlimError};
use crate::evaluator::Evaluator;
use crate::lexer::lex;
use crate::parser::parse_program;

/// Result of pushing one source text through the whole pipeline.
#[derive(Debug)]
pub enum RunOutcome {
    Success,
    /// The program was not evaluated.
    SyntaxErrors(Vec<ParseError>),
    RuntimeError(RuntimeError),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, RunOutcome::Success)
    }

    /// Process exit status for the outcome (sysexits-style).
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Success => 0,
            RunOutcome::SyntaxErrors(_) => 65,
            RunOutcome::RuntimeError(_) => 70,
        }
    }
}

/// Lexes, parses and evaluates `source` with `evaluator`. Nothing is
/// reported; the caller decides what to do with the outcome.
pub fn run_source(source: &str, evaluator: &mut Evaluator) -> RunOutcome {
    let tokens = lex(source);
    let (program, errors) = parse_program(tokens);
    if !errors.is_empty() {
        return RunOutcome::SyntaxErrors(errors);
    }

    match evaluator.evaluate_program(&program) {
        Ok(()) => RunOutcome::Success,
        Err(error) => RunOutcome::RuntimeError(error),
    }
}

/// Runs `source` against stdout/stdin and reports any diagnostics to
/// stderr.
pub fn run(source: &str, config: &Config) -> RunOutcome {
    let mut evaluator = Evaluator::new();
    let outcome = run_source(source, &mut evaluator);
    report(source, config, &outcome);
    outcome
}

pub fn report(source: &str, config: &Config, outcome: &RunOutcome) {
    let filename = config.filename.as_deref();
    let diagnostics: Vec<SlimError> = match outcome {
        RunOutcome::Success => return,
        RunOutcome::SyntaxErrors(errors) => {
            for error in errors {
                tracing::debug!("{}", error.summary());
            }
            errors.iter().map(SlimError::from).collect()
        }
        RunOutcome::RuntimeError(error) => vec![SlimError::from(error)],
    };

    for diagnostic in diagnostics {
        if let Err(error) = diagnostic.report(source, filename, config.color) {
            tracing::warn!(%error, "failed to write diagnostic");
            eprintln!("{}", diagnostic);
        }
    }
}
