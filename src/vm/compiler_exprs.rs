//! Pratt expression rules for the single-pass compiler.

use crate::lexer::token::{Base, TokenKind};

use super::compiler::Compiler;
use super::opcode::OpCode;
use super::value::Value;

/// Operator precedence levels (higher binds tighter).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Precedence {
    None = 0,
    Assignment, // =
    Or,         // or
    And,        // and
    Equality,   // == !=
    Comparison, // < <= > >=
    Term,       // + -
    Factor,     // * /
    Unary,      // ! -
    Call,       // . ()
    Primary,
}

impl Precedence {
    fn next(self) -> Precedence {
        match self {
            Precedence::None => Precedence::Assignment,
            Precedence::Assignment => Precedence::Or,
            Precedence::Or => Precedence::And,
            Precedence::And => Precedence::Equality,
            Precedence::Equality => Precedence::Comparison,
            Precedence::Comparison => Precedence::Term,
            Precedence::Term => Precedence::Factor,
            Precedence::Factor => Precedence::Unary,
            Precedence::Unary => Precedence::Call,
            Precedence::Call => Precedence::Primary,
            Precedence::Primary => Precedence::Primary,
        }
    }
}

type ParseFn<'src, 'h> = fn(&mut Compiler<'src, 'h>, bool);

/// How a token parses in prefix and infix position.
struct ParseRule<'src, 'h> {
    prefix: Option<ParseFn<'src, 'h>>,
    infix: Option<ParseFn<'src, 'h>>,
    precedence: Precedence,
}

fn get_rule<'src, 'h>(kind: TokenKind) -> ParseRule<'src, 'h> {
    let (prefix, infix, precedence): (
        Option<ParseFn<'src, 'h>>,
        Option<ParseFn<'src, 'h>>,
        Precedence,
    ) = match kind {
        TokenKind::LeftParen => (Some(Compiler::grouping), None, Precedence::None),
        TokenKind::Minus => (
            Some(Compiler::unary),
            Some(Compiler::binary),
            Precedence::Term,
        ),
        TokenKind::Plus => (None, Some(Compiler::binary), Precedence::Term),
        TokenKind::Star | TokenKind::Slash => (None, Some(Compiler::binary), Precedence::Factor),
        TokenKind::Bang => (Some(Compiler::unary), None, Precedence::None),
        TokenKind::EqualEqual | TokenKind::BangEqual => {
            (None, Some(Compiler::binary), Precedence::Equality)
        }
        TokenKind::Less | TokenKind::LessEqual | TokenKind::Greater | TokenKind::GreaterEqual => {
            (None, Some(Compiler::binary), Precedence::Comparison)
        }
        TokenKind::Identifier => (Some(Compiler::variable), None, Precedence::None),
        TokenKind::Int(_) => (Some(Compiler::number), None, Precedence::None),
        TokenKind::Str => (Some(Compiler::string), None, Precedence::None),
        TokenKind::Null | TokenKind::True | TokenKind::False => {
            (Some(Compiler::literal), None, Precedence::None)
        }
        TokenKind::And => (None, Some(Compiler::and_), Precedence::And),
        TokenKind::Or => (None, Some(Compiler::or_), Precedence::Or),
        _ => (None, None, Precedence::None),
    };
    ParseRule {
        prefix,
        infix,
        precedence,
    }
}

impl<'src, 'h> Compiler<'src, 'h> {
    pub(crate) fn expression(&mut self) {
        self.parse_precedence(Precedence::Assignment);
    }

    /// The Pratt core: run the prefix rule for the token just consumed,
    /// then fold infix rules while they bind at least as tightly.
    fn parse_precedence(&mut self, precedence: Precedence) {
        self.advance();
        let Some(prefix) = get_rule(self.previous.kind).prefix else {
            self.error("Expect expression.");
            return;
        };

        // Assignment may only be consumed by a rule reached at the lowest
        // expression precedence; anything tighter is not a valid target.
        let can_assign = precedence <= Precedence::Assignment;
        prefix(self, can_assign);

        while precedence <= get_rule(self.current.kind).precedence {
            self.advance();
            if let Some(infix) = get_rule(self.previous.kind).infix {
                infix(self, can_assign);
            }
        }

        if can_assign && self.matches(TokenKind::Equal) {
            self.error("Invalid assignment target.");
        }
    }

    fn grouping(&mut self, _can_assign: bool) {
        self.expression();
        self.consume(TokenKind::RightParen, "Expect ')' after expression.");
    }

    /// Integer literal; the value is re-parsed here using the base the
    /// scanner recorded on the token.
    fn number(&mut self, _can_assign: bool) {
        let TokenKind::Int(base) = self.previous.kind else {
            unreachable!("number rule on a non-integer token");
        };
        let value = match base {
            Base::Decimal => self.previous.lexeme.parse::<f64>().ok(),
            _ => u64::from_str_radix(&self.previous.lexeme[2..], base.radix())
                .ok()
                .map(|n| n as f64),
        };
        match value {
            Some(n) => self.emit_constant(Value::Number(n)),
            None => self.error("Integer literal too large."),
        }
    }

    fn string(&mut self, _can_assign: bool) {
        let lexeme = self.previous.lexeme;
        let chars = &lexeme[1..lexeme.len() - 1]; // trim the quotes
        let obj = self.heap.intern(chars);
        self.emit_constant(Value::Object(obj));
    }

    fn literal(&mut self, _can_assign: bool) {
        match self.previous.kind {
            TokenKind::Null => self.emit_op(OpCode::Null),
            TokenKind::True => self.emit_op(OpCode::True),
            TokenKind::False => self.emit_op(OpCode::False),
            _ => unreachable!("literal rule on a non-literal token"),
        }
    }

    fn unary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        self.parse_precedence(Precedence::Unary);
        match operator {
            TokenKind::Minus => self.emit_op(OpCode::Negate),
            TokenKind::Bang => self.emit_op(OpCode::Not),
            _ => unreachable!("unary rule on a non-unary token"),
        }
    }

    fn binary(&mut self, _can_assign: bool) {
        let operator = self.previous.kind;
        let rule = get_rule(operator);
        self.parse_precedence(rule.precedence.next());
        match operator {
            TokenKind::Plus => self.emit_op(OpCode::Add),
            TokenKind::Minus => self.emit_op(OpCode::Subtract),
            TokenKind::Star => self.emit_op(OpCode::Multiply),
            TokenKind::Slash => self.emit_op(OpCode::Divide),
            TokenKind::EqualEqual => self.emit_op(OpCode::Equal),
            TokenKind::BangEqual => self.emit_op(OpCode::NotEqual),
            TokenKind::Less => self.emit_op(OpCode::Less),
            TokenKind::LessEqual => self.emit_op(OpCode::LessEqual),
            TokenKind::Greater => self.emit_op(OpCode::Greater),
            TokenKind::GreaterEqual => self.emit_op(OpCode::GreaterEqual),
            _ => unreachable!("binary rule on a non-binary token"),
        }
    }

    /// Identifier: local slot access when resolution succeeds, otherwise a
    /// late-bound global lookup by interned name.
    fn variable(&mut self, can_assign: bool) {
        let name = self.previous.lexeme;
        let (get_op, set_op, arg) = match self.resolve_local(name) {
            Some(slot) => (OpCode::GetLocal, OpCode::SetLocal, slot),
            None => {
                let index = self.identifier_constant(name);
                (OpCode::GetGlobal, OpCode::SetGlobal, index)
            }
        };

        if can_assign && self.matches(TokenKind::Equal) {
            self.expression();
            self.emit_op(set_op);
        } else {
            self.emit_op(get_op);
        }
        self.emit_byte(arg);
    }

    /// Short-circuit `and`: skip the right operand when the left is falsey.
    fn and_(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfFalse);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::And);
        self.patch_jump(end_jump);
    }

    /// Short-circuit `or`: skip the right operand when the left is truthy.
    fn or_(&mut self, _can_assign: bool) {
        let end_jump = self.emit_jump(OpCode::JumpIfTrue);
        self.emit_op(OpCode::Pop);
        self.parse_precedence(Precedence::Or);
        self.patch_jump(end_jump);
    }
}
