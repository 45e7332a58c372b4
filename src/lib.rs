//! Clockwork: a small dynamically-typed scripting language.
//!
//! Source text is scanned into tokens, compiled in a single pass to
//! bytecode (no AST is materialized), and executed on a stack-based
//! virtual machine. Strings are interned, so string equality is pointer
//! equality.
//!
//! ```
//! clockwork::interpret("print 1 + 2 * 3;").unwrap();
//! ```

#![allow(clippy::module_inception)]

pub mod error;
pub mod lexer;
pub mod vm;

pub use error::{ClockworkError, CompileError, RuntimeError};
pub use vm::{disassemble_chunk, Chunk, Heap, Value, Vm};

/// Compile and run `source` on a fresh VM.
pub fn interpret(source: &str) -> Result<(), ClockworkError> {
    Vm::new().interpret(source)
}

/// Compile `source` to bytecode without executing it.
///
/// Strings are interned into a private heap that the returned chunk's
/// constants keep alive. Useful for inspection and tests; execution goes
/// through [`Vm::interpret`] so the VM and compiler share one heap.
pub fn compile(source: &str) -> Result<Chunk, CompileError> {
    let mut heap = Heap::new();
    vm::compiler::compile(source, &mut heap)
}
