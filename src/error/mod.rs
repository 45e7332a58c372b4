//! Error types for compilation and execution.

use thiserror::Error;

/// Compilation failed. Individual diagnostics have already been reported
/// to stderr by the compiler's panic-mode machinery; this value records
/// how many survived suppression.
#[derive(Debug, Error)]
#[error("compilation failed")]
pub struct CompileError {
    pub errors: usize,
}

/// Runtime errors. Each variant carries the source line of the faulting
/// instruction so the interpret layer can report `[line N] in script`.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Operand must be a number.")]
    OperandNotNumber { line: usize },

    #[error("Operands must be numbers.")]
    OperandsNotNumbers { line: usize },

    #[error("Operands must be two numbers or two strings.")]
    AddOperands { line: usize },

    #[error("Undefined variable '{name}'.")]
    UndefinedVariable { name: String, line: usize },

    #[error("Stack overflow")]
    StackOverflow { line: usize },

    #[error("Unknown opcode {opcode}.")]
    UnknownOpcode { opcode: u8, line: usize },
}

impl RuntimeError {
    pub fn line(&self) -> usize {
        match self {
            Self::OperandNotNumber { line }
            | Self::OperandsNotNumbers { line }
            | Self::AddOperands { line }
            | Self::UndefinedVariable { line, .. }
            | Self::StackOverflow { line }
            | Self::UnknownOpcode { line, .. } => *line,
        }
    }
}

/// A unified error type for the top-level API and the CLI.
#[derive(Debug, Error)]
pub enum ClockworkError {
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] RuntimeError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
