//! Property-based tests for the compiler and VM invariants.
//!
//! Programs are generated from small statement templates; expected results
//! are encoded into the program itself (the `else` branch reads an
//! undefined variable, so a wrong value turns into a runtime error the
//! test can observe through `interpret`'s result).

use proptest::prelude::*;

use clockwork::vm::OpCode;
use clockwork::{Chunk, Vm};

/// Decode a chunk into (offset, opcode) pairs.
fn decode(chunk: &Chunk) -> Vec<(usize, OpCode)> {
    let mut ops = Vec::new();
    let mut offset = 0;
    while offset < chunk.code.len() {
        let op = OpCode::from_u8(chunk.code[offset]).expect("invalid opcode byte");
        ops.push((offset, op));
        offset += 1 + op.operand_size();
    }
    ops
}

/// A program that must run without errors.
fn assert_runs(source: &str) {
    let result = Vm::new().interpret(source);
    assert!(result.is_ok(), "program failed: {}\nsource: {}", result.unwrap_err(), source);
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,5}".prop_map(|s| format!("v{}", s))
}

fn arb_small_int() -> impl Strategy<Value = i64> {
    -10_000i64..10_000
}

fn arb_stmt() -> impl Strategy<Value = String> {
    prop_oneof![
        (arb_small_int(), arb_small_int())
            .prop_map(|(a, b)| format!("print {} + {};", a, b)),
        (arb_name(), arb_small_int()).prop_map(|(n, v)| format!("let {} = {};", n, v)),
        (arb_name(), arb_small_int())
            .prop_map(|(n, v)| format!("{{ let {} = {}; print {}; }}", n, v, n)),
        arb_small_int()
            .prop_map(|n| format!("if ({} < 0) print true; else print false;", n)),
        (arb_name(), 0u8..5).prop_map(|(n, limit)| {
            format!(
                "let mut {0} = 0; while ({0} < {1}) {{ {0} = {0} + 1; }}",
                n, limit
            )
        }),
    ]
}

fn arb_program() -> impl Strategy<Value = String> {
    prop::collection::vec(arb_stmt(), 1..12).prop_map(|stmts| stmts.join("\n"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// Every successful compile yields a chunk that ends with RETURN, has
    /// parallel line info, and only jumps to offsets inside the chunk.
    #[test]
    fn compiled_chunks_are_well_formed(source in arb_program()) {
        let chunk = clockwork::compile(&source).expect("generated program should compile");

        prop_assert_eq!(chunk.code.len(), chunk.lines.len());
        prop_assert_eq!(*chunk.code.last().unwrap(), OpCode::Return as u8);

        for (offset, op) in decode(&chunk) {
            match op {
                OpCode::Jump | OpCode::JumpIfFalse | OpCode::JumpIfTrue => {
                    let target = offset + 3 + chunk.read_u16(offset + 1) as usize;
                    prop_assert!(target <= chunk.len());
                }
                OpCode::Loop => {
                    let back = chunk.read_u16(offset + 1) as usize;
                    prop_assert!(back <= offset + 3);
                }
                _ => {}
            }
        }
    }

    /// Generated programs execute without runtime errors.
    #[test]
    fn generated_programs_run(source in arb_program()) {
        assert_runs(&source);
    }

    /// `+ - *` on integer operands match native f64 arithmetic exactly.
    #[test]
    fn arithmetic_matches_f64(a in -10_000i64..10_000, b in -10_000i64..10_000) {
        for (op, expected) in [
            ("+", a as f64 + b as f64),
            ("-", a as f64 - b as f64),
            ("*", a as f64 * b as f64),
        ] {
            let source = format!(
                "let r = {a} {op} ({b});\nif (r == ({expected})) r = 0; else wrong_result;",
            );
            assert_runs(&source);
        }
    }

    /// Division of an exact integer product recovers the quotient.
    #[test]
    fn division_recovers_exact_quotients(q in -1_000i64..1_000, b in 1i64..1_000) {
        let a = q * b;
        let source = format!("let r = ({a}) / {b};\nif (r == ({q})) r = 0; else wrong_result;");
        assert_runs(&source);
    }

    /// Any two byte-equal string expressions are equal, however they were
    /// assembled (concatenation results are interned).
    #[test]
    fn concatenation_is_interned(s1 in "[a-z0-9]{0,8}", s2 in "[a-z0-9]{0,8}") {
        let source = format!(
            "let ok = (\"{s1}\" + \"{s2}\") == \"{s1}{s2}\";\nif (ok) ok; else not_interned;",
        );
        assert_runs(&source);
    }

    /// The scanner and compiler survive arbitrary input without panicking.
    #[test]
    fn compile_never_panics(source in any::<String>()) {
        let _ = clockwork::compile(&source);
    }

    /// Closing a block emits exactly one POP per local it declared.
    #[test]
    fn block_exit_pops_each_local(count in 1usize..=20) {
        let mut source = String::from("{\n");
        for i in 0..count {
            source.push_str(&format!("let l{} = {};\n", i, i));
        }
        source.push('}');

        let chunk = clockwork::compile(&source).expect("block should compile");
        let pops = decode(&chunk)
            .into_iter()
            .filter(|(_, op)| *op == OpCode::Pop)
            .count();
        prop_assert_eq!(pops, count);
    }
}

#[test]
fn falsiness_is_exactly_null_and_false() {
    for (value, falsey) in [
        ("null", true),
        ("false", true),
        ("true", false),
        ("0", false),
        ("1", false),
        ("\"\"", false),
        ("\"x\"", false),
    ] {
        let source = if falsey {
            format!("if ({}) was_truthy; else print 1;", value)
        } else {
            format!("if ({}) print 1; else was_falsey;", value)
        };
        assert_runs(&source);
    }
}
