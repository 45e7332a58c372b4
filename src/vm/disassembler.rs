//! Bytecode disassembler for debugging.

use std::fmt::Write;

use super::chunk::Chunk;
use super::opcode::OpCode;

/// Disassemble a whole chunk under a header name.
pub fn disassemble_chunk(chunk: &Chunk, name: &str) -> String {
    let mut output = String::new();
    writeln!(&mut output, "== {} ==", name).unwrap();

    let mut offset = 0;
    while offset < chunk.code.len() {
        offset = disassemble_instruction(chunk, offset, &mut output);
    }
    output
}

/// Disassemble one instruction, returning the offset of the next.
pub fn disassemble_instruction(chunk: &Chunk, offset: usize, output: &mut String) -> usize {
    write!(output, "{:04} ", offset).unwrap();
    if offset > 0 && chunk.lines[offset] == chunk.lines[offset - 1] {
        write!(output, "   | ").unwrap();
    } else {
        write!(output, "{:4} ", chunk.lines[offset]).unwrap();
    }

    let byte = chunk.code[offset];
    let Some(op) = OpCode::from_u8(byte) else {
        writeln!(output, "Unknown opcode {}", byte).unwrap();
        return offset + 1;
    };

    match op.operand_size() {
        1 => {
            let operand = chunk.code[offset + 1];
            match op {
                OpCode::Constant
                | OpCode::DefineGlobal
                | OpCode::GetGlobal
                | OpCode::SetGlobal => {
                    writeln!(
                        output,
                        "{:<16} {:4} '{}'",
                        format!("{:?}", op),
                        operand,
                        chunk.constants[operand as usize]
                    )
                    .unwrap();
                }
                _ => {
                    writeln!(output, "{:<16} {:4}", format!("{:?}", op), operand).unwrap();
                }
            }
            offset + 2
        }
        2 => {
            let operand = chunk.read_u16(offset + 1);
            writeln!(output, "{:<16} {:4}", format!("{:?}", op), operand).unwrap();
            offset + 3
        }
        _ => {
            writeln!(output, "{:?}", op).unwrap();
            offset + 1
        }
    }
}
