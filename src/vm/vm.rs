//! Stack-based virtual machine executing Clockwork bytecode.

use std::rc::Rc;

use crate::error::{ClockworkError, RuntimeError};

use super::chunk::Chunk;
use super::compiler;
use super::opcode::OpCode;
use super::table::Table;
use super::value::{Heap, Obj, Value};

/// Maximum value-stack depth.
pub const STACK_MAX: usize = 256;

/// The virtual machine.
///
/// One `Vm` owns one heap (object registry plus intern table), one globals
/// table, and one value stack. Dropping the `Vm` frees every object it
/// ever allocated; there is no garbage collector.
pub struct Vm {
    stack: Vec<Value>,
    globals: Table,
    heap: Heap,
    ip: usize,
}

impl Vm {
    pub fn new() -> Self {
        Self {
            stack: Vec::with_capacity(STACK_MAX),
            globals: Table::new(),
            heap: Heap::new(),
            ip: 0,
        }
    }

    /// Compile and run `source`.
    ///
    /// Strings are interned into this VM's heap, so literals, globals, and
    /// concatenation results stay pointer-comparable across calls — a REPL
    /// reuses one `Vm` for the whole session. A runtime error is printed
    /// with its source line, resets the stack, and aborts the call.
    pub fn interpret(&mut self, source: &str) -> Result<(), ClockworkError> {
        let chunk = compiler::compile(source, &mut self.heap)?;
        self.run(&chunk).map_err(|err| {
            eprintln!("{}", err);
            eprintln!("[line {}] in script", err.line());
            self.stack.clear();
            ClockworkError::Runtime(err)
        })
    }

    /// The fetch-decode-execute loop.
    fn run(&mut self, chunk: &Chunk) -> Result<(), RuntimeError> {
        self.ip = 0;
        loop {
            let byte = self.read_byte(chunk);
            let Some(op) = OpCode::from_u8(byte) else {
                return Err(RuntimeError::UnknownOpcode {
                    opcode: byte,
                    line: self.line(chunk),
                });
            };

            match op {
                OpCode::Constant => {
                    let index = self.read_byte(chunk) as usize;
                    let value = chunk.constants[index].clone();
                    self.push(value, chunk)?;
                }
                OpCode::Null => self.push(Value::Null, chunk)?,
                OpCode::True => self.push(Value::Bool(true), chunk)?,
                OpCode::False => self.push(Value::Bool(false), chunk)?,
                OpCode::Pop => {
                    self.pop();
                }

                OpCode::DefineGlobal => {
                    let name = self.read_string_constant(chunk);
                    let value = self.pop();
                    self.globals.insert(name, value);
                }
                OpCode::GetGlobal => {
                    let name = self.read_string_constant(chunk);
                    match self.globals.get(&name) {
                        Some(value) => self.push(value, chunk)?,
                        None => {
                            return Err(RuntimeError::UndefinedVariable {
                                name: name.as_str().to_string(),
                                line: self.line(chunk),
                            })
                        }
                    }
                }
                OpCode::SetGlobal => {
                    let name = self.read_string_constant(chunk);
                    let value = self.peek(0).clone();
                    if self.globals.insert(name.clone(), value) {
                        // The name was never defined: undo and report.
                        self.globals.remove(&name);
                        return Err(RuntimeError::UndefinedVariable {
                            name: name.as_str().to_string(),
                            line: self.line(chunk),
                        });
                    }
                }
                OpCode::GetLocal => {
                    let slot = self.read_byte(chunk) as usize;
                    let value = self.stack[slot].clone();
                    self.push(value, chunk)?;
                }
                OpCode::SetLocal => {
                    let slot = self.read_byte(chunk) as usize;
                    self.stack[slot] = self.peek(0).clone();
                }

                OpCode::Equal => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a == b), chunk)?;
                }
                OpCode::NotEqual => {
                    let b = self.pop();
                    let a = self.pop();
                    self.push(Value::Bool(a != b), chunk)?;
                }
                OpCode::Less => self.binary_number_op(chunk, |a, b| Value::Bool(a < b))?,
                OpCode::LessEqual => self.binary_number_op(chunk, |a, b| Value::Bool(a <= b))?,
                OpCode::Greater => self.binary_number_op(chunk, |a, b| Value::Bool(a > b))?,
                OpCode::GreaterEqual => self.binary_number_op(chunk, |a, b| Value::Bool(a >= b))?,

                OpCode::Add => {
                    let b = self.pop();
                    let a = self.pop();
                    match (&a, &b) {
                        (Value::Number(x), Value::Number(y)) => {
                            let sum = x + y;
                            self.push(Value::Number(sum), chunk)?;
                        }
                        (Value::Object(x), Value::Object(y)) => {
                            let obj = self.heap.concat(x, y);
                            self.push(Value::Object(obj), chunk)?;
                        }
                        _ => {
                            return Err(RuntimeError::AddOperands {
                                line: self.line(chunk),
                            })
                        }
                    }
                }
                OpCode::Subtract => self.binary_number_op(chunk, |a, b| Value::Number(a - b))?,
                OpCode::Multiply => self.binary_number_op(chunk, |a, b| Value::Number(a * b))?,
                // Division by zero yields an IEEE infinity, not an error.
                OpCode::Divide => self.binary_number_op(chunk, |a, b| Value::Number(a / b))?,

                OpCode::Not => {
                    let value = self.pop();
                    self.push(Value::Bool(value.is_falsey()), chunk)?;
                }
                OpCode::Negate => match self.pop() {
                    Value::Number(n) => self.push(Value::Number(-n), chunk)?,
                    _ => {
                        return Err(RuntimeError::OperandNotNumber {
                            line: self.line(chunk),
                        })
                    }
                },

                OpCode::Print => {
                    println!("{}", self.pop());
                }

                OpCode::Jump => {
                    let offset = self.read_u16(chunk) as usize;
                    self.ip += offset;
                }
                OpCode::JumpIfFalse => {
                    let offset = self.read_u16(chunk) as usize;
                    if self.peek(0).is_falsey() {
                        self.ip += offset;
                    }
                }
                OpCode::JumpIfTrue => {
                    let offset = self.read_u16(chunk) as usize;
                    if !self.peek(0).is_falsey() {
                        self.ip += offset;
                    }
                }
                OpCode::Loop => {
                    let offset = self.read_u16(chunk) as usize;
                    self.ip -= offset;
                }

                OpCode::Return => return Ok(()),
            }
        }
    }

    fn read_byte(&mut self, chunk: &Chunk) -> u8 {
        let byte = chunk.code[self.ip];
        self.ip += 1;
        byte
    }

    fn read_u16(&mut self, chunk: &Chunk) -> u16 {
        let value = chunk.read_u16(self.ip);
        self.ip += 2;
        value
    }

    /// Read a one-byte constant index and resolve it to an interned name.
    fn read_string_constant(&mut self, chunk: &Chunk) -> Rc<Obj> {
        let index = self.read_byte(chunk) as usize;
        match &chunk.constants[index] {
            Value::Object(obj) => obj.clone(),
            _ => unreachable!("identifier constant must be a string"),
        }
    }

    fn line(&self, chunk: &Chunk) -> usize {
        chunk.lines[self.ip - 1]
    }

    fn push(&mut self, value: Value, chunk: &Chunk) -> Result<(), RuntimeError> {
        if self.stack.len() == STACK_MAX {
            return Err(RuntimeError::StackOverflow {
                line: self.line(chunk),
            });
        }
        self.stack.push(value);
        Ok(())
    }

    fn pop(&mut self) -> Value {
        // Underflow is a compiler bug, not a user error.
        self.stack.pop().expect("value stack underflow")
    }

    fn peek(&self, distance: usize) -> &Value {
        &self.stack[self.stack.len() - 1 - distance]
    }

    /// Pop two numbers and push the result, or fail on non-number operands.
    fn binary_number_op(
        &mut self,
        chunk: &Chunk,
        op: impl FnOnce(f64, f64) -> Value,
    ) -> Result<(), RuntimeError> {
        let b = self.pop();
        let a = self.pop();
        match (a, b) {
            (Value::Number(a), Value::Number(b)) => self.push(op(a, b), chunk),
            _ => Err(RuntimeError::OperandsNotNumbers {
                line: self.line(chunk),
            }),
        }
    }
}

impl Default for Vm {
    fn default() -> Self {
        Self::new()
    }
}
