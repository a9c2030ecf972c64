use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::ast::{Node, NodeKind};
use crate::token::{Span, Token, TokenKind};

mod expression;
mod statement;

/// Nesting limit for statements and expressions; deeper input is
/// reported instead of recursing further.
const MAX_DEPTH: usize = 128;

/// Classifies a parser diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticKind {
    /// Expected some construct, found something else or end of input.
    Expected {
        expected: &'static str,
        found: Option<String>,
    },
    /// A block construct ended without its closing keyword.
    MissingCloser {
        closer: &'static str,
        construct: &'static str,
    },
    /// A token that cannot start a statement.
    UnexpectedToken { found: String },
    /// A keyword the parser does not support; its line is skipped.
    UnsupportedKeyword { keyword: String },
    /// A closing keyword with no open construct.
    StrayCloser { keyword: String },
    /// Nesting beyond [`MAX_DEPTH`].
    TooDeep,
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Expected {
                expected,
                found: None,
            } => write!(f, "expected {expected}, got end of input"),
            Self::Expected {
                expected,
                found: Some(t),
            } => write!(f, "expected {expected}, got '{t}'"),
            Self::MissingCloser { closer, construct } => {
                write!(f, "missing '{closer}' to close '{construct}'")
            }
            Self::UnexpectedToken { found } => write!(f, "unexpected token '{found}'"),
            Self::UnsupportedKeyword { keyword } => {
                write!(f, "unsupported keyword '{keyword}', line skipped")
            }
            Self::StrayCloser { keyword } => {
                write!(f, "'{keyword}' without a matching opener")
            }
            Self::TooDeep => write!(f, "nesting too deep"),
        }
    }
}

/// An error or warning produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub span: Span,
    /// The offending source line, rebuilt from its tokens.
    pub context: Option<String>,
}

impl Diagnostic {
    /// The diagnostic text without its location.
    #[must_use]
    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Result of parsing: always a `Program`, plus everything that went
/// wrong along the way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parse {
    pub program: Node,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
}

impl Parse {
    /// Whether parsing produced neither errors nor warnings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.warnings.is_empty()
    }
}

/// Parse a token stream into a `Program` tree.
///
/// Never fails: malformed input yields diagnostics and `Missing`
/// placeholders, and the rest of the input is still parsed.
#[must_use]
pub fn parse(tokens: Vec<Token>) -> Parse {
    Parser::new(tokens).parse()
}

struct Parser {
    tokens: Vec<Token>,
    /// `continued[i]`: token `i` followed a line continuation `\`.
    continued: Vec<bool>,
    pos: usize,
    errors: Vec<Diagnostic>,
    warnings: Vec<Diagnostic>,
    /// Closing words of every open block, innermost last.
    closers: Vec<&'static [&'static str]>,
    /// Open brackets; inside them newlines do not end the line.
    nesting: usize,
    depth: usize,
}

impl Parser {
    fn new(input: Vec<Token>) -> Self {
        let mut tokens = Vec::with_capacity(input.len());
        let mut continued = Vec::with_capacity(input.len());
        let mut pending = false;
        for token in input {
            if token.kind == TokenKind::LineContinuation {
                pending = true;
                continue;
            }
            continued.push(pending);
            pending = false;
            tokens.push(token);
        }

        Self {
            tokens,
            continued,
            pos: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            closers: Vec::new(),
            nesting: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Parse {
        let body = self.block(&[]);
        tracing::trace!(
            statements = body.len(),
            errors = self.errors.len(),
            warnings = self.warnings.len(),
            "parsed"
        );
        Parse {
            program: Node::new(NodeKind::Program { body }, Span::default()),
            errors: self.errors,
            warnings: self.warnings,
        }
    }

    // -- cursor --

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().is_some_and(|t| t.kind == kind)
    }

    fn check_operator(&self, op: &str) -> bool {
        self.peek().is_some_and(|t| t.is_operator(op))
    }

    fn check_word(&self, word: &str) -> bool {
        self.peek().is_some_and(|t| t.is(TokenKind::Identifier, word))
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// The current token directly follows the previous one.
    fn touches_previous(&self) -> bool {
        match (self.pos.checked_sub(1).and_then(|i| self.tokens.get(i)), self.peek()) {
            (Some(prev), Some(cur)) => prev.touches(cur),
            _ => false,
        }
    }

    /// The current token begins a new logical line.
    fn starts_new_line(&self) -> bool {
        self.line_breaks_before(self.pos)
    }

    fn line_breaks_before(&self, index: usize) -> bool {
        let Some(token) = self.tokens.get(index) else {
            return true;
        };
        if index == 0 {
            return true;
        }
        if self.nesting > 0 || self.continued[index] {
            return false;
        }
        token.span.line > end_line(&self.tokens[index - 1])
    }

    /// Nothing more belongs to the current command.
    fn at_statement_end(&self) -> bool {
        match self.peek() {
            None => true,
            Some(t) => {
                matches!(t.kind, TokenKind::Bar | TokenKind::Comment) || self.starts_new_line()
            }
        }
    }

    fn skip_separators(&mut self) {
        while self.eat(TokenKind::Bar) {}
    }

    /// Inside brackets comments may sit between elements.
    fn skip_nested_comments(&mut self) {
        while self.nesting > 0 && self.eat(TokenKind::Comment) {}
    }

    /// Skip the rest of the current command.
    fn skip_line(&mut self) {
        while !self.at_statement_end() {
            self.pos += 1;
        }
    }

    /// Consume the rest of the logical line and return it as written.
    fn raw_rest(&mut self, stop_at_bar: bool) -> String {
        let start = self.pos;
        while self.peek().is_some()
            && !self.starts_new_line()
            && !(stop_at_bar && self.check(TokenKind::Bar))
        {
            self.pos += 1;
        }
        join_tokens(&self.tokens[start..self.pos])
    }

    /// `!` written directly after a command name.
    fn bang(&mut self) -> bool {
        if self.check_operator("!") && self.touches_previous() {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // -- diagnostics --

    fn eof_span(&self) -> Span {
        self.tokens.last().map_or_else(Span::default, |last| last.span)
    }

    fn current_span(&self) -> Span {
        self.peek().map_or_else(|| self.eof_span(), |t| t.span)
    }

    /// Tokens are ordered by position, so the tokens starting on `line`
    /// form one contiguous run.
    fn line_context(&self, line: u32) -> Option<String> {
        let start = self.tokens.partition_point(|t| t.span.line < line);
        let end = self.tokens.partition_point(|t| t.span.line <= line);
        let on_line = &self.tokens[start..end];
        if on_line.is_empty() {
            None
        } else {
            Some(join_tokens(on_line))
        }
    }

    fn error(&mut self, kind: DiagnosticKind, span: Span) {
        let context = self.line_context(span.line);
        self.errors.push(Diagnostic {
            kind,
            span,
            context,
        });
    }

    fn warning(&mut self, kind: DiagnosticKind, span: Span) {
        let context = self.line_context(span.line);
        self.warnings.push(Diagnostic {
            kind,
            span,
            context,
        });
    }

    /// Record that `expected` was wanted at the cursor.
    fn expected(&mut self, expected: &'static str) {
        let found = self.peek().map(|t| t.text.clone());
        let span = self.current_span();
        self.error(DiagnosticKind::Expected { expected, found }, span);
    }

    fn expect(&mut self, kind: TokenKind, expected: &'static str) -> Option<Token> {
        if self.check(kind) {
            self.advance()
        } else {
            self.expected(expected);
            None
        }
    }

    // -- blocks --

    /// The closing word at the cursor, if any: a keyword, `augroup END`,
    /// or a `}` opening its own line.
    fn closer_word(&self) -> Option<&str> {
        let token = self.peek()?;
        match token.kind {
            TokenKind::Keyword if token.text == "augroup" => self
                .peek_at(1)
                .filter(|next| next.text.eq_ignore_ascii_case("end"))
                .map(|_| "augroup END"),
            TokenKind::Keyword => Some(token.text.as_str()),
            TokenKind::BraceClose if self.starts_new_line() => Some("}"),
            _ => None,
        }
    }

    fn is_claimed(&self, word: &str) -> bool {
        self.closers.iter().any(|set| set.contains(&word))
    }

    fn consume_closer(&mut self) {
        let width = if self.closer_word() == Some("augroup END") {
            2
        } else {
            1
        };
        self.pos = (self.pos + width).min(self.tokens.len());
    }

    /// Statements up to one of `closers`, or up to a closer some
    /// enclosing block is waiting for. The closer is left in place.
    fn block(&mut self, closers: &'static [&'static str]) -> Vec<Node> {
        let saved_nesting = std::mem::take(&mut self.nesting);
        self.closers.push(closers);

        let mut body = Vec::new();
        loop {
            self.skip_separators();
            if self.peek().is_none() || self.closer_word().is_some_and(|w| self.is_claimed(w)) {
                break;
            }
            let start = self.pos;
            if let Some(statement) = self.statement() {
                body.push(statement);
            }
            if self.pos == start {
                self.pos += 1;
            }
        }

        self.closers.pop();
        self.nesting = saved_nesting;
        body
    }

    /// Consume a closer from `closers`, or report `construct` (which
    /// started at `span`) as unterminated.
    fn close_block(
        &mut self,
        construct: &'static str,
        closers: &'static [&'static str],
        span: Span,
    ) -> bool {
        if self.closer_word().is_some_and(|w| closers.contains(&w)) {
            self.consume_closer();
            true
        } else {
            let closer = closers.first().copied().unwrap_or("end");
            self.error(DiagnosticKind::MissingCloser { closer, construct }, span);
            false
        }
    }
}

/// Last physical line a token occupies.
fn end_line(token: &Token) -> u32 {
    let breaks = token.text.matches('\n').count();
    token
        .span
        .line
        .saturating_add(u32::try_from(breaks).unwrap_or(u32::MAX))
}

/// Rebuild source text from consecutive tokens, restoring the gaps
/// between tokens on the same line and joining lines with one space.
pub(crate) fn join_tokens(tokens: &[Token]) -> String {
    let mut out = String::new();
    let mut prev: Option<&Token> = None;
    for token in tokens {
        if let Some(p) = prev {
            if p.span.line == token.span.line && !p.text.contains('\n') {
                let gap = token.span.column.saturating_sub(p.end_column());
                out.push_str(&" ".repeat(usize::try_from(gap).unwrap_or(1)));
            } else {
                out.push(' ');
            }
        }
        out.push_str(&token.text);
        prev = Some(token);
    }
    out
}

/// Speculative parsing guard. Dropping it without [`Rewind::commit`]
/// restores the cursor, bracket nesting, and diagnostics.
struct Rewind<'p> {
    parser: &'p mut Parser,
    pos: usize,
    nesting: usize,
    errors: usize,
    warnings: usize,
    committed: bool,
}

impl<'p> Rewind<'p> {
    fn new(parser: &'p mut Parser) -> Self {
        Self {
            pos: parser.pos,
            nesting: parser.nesting,
            errors: parser.errors.len(),
            warnings: parser.warnings.len(),
            committed: false,
            parser,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Deref for Rewind<'_> {
    type Target = Parser;

    fn deref(&self) -> &Parser {
        self.parser
    }
}

impl DerefMut for Rewind<'_> {
    fn deref_mut(&mut self) -> &mut Parser {
        self.parser
    }
}

impl Drop for Rewind<'_> {
    fn drop(&mut self) {
        if !self.committed {
            self.parser.pos = self.pos;
            self.parser.nesting = self.nesting;
            self.parser.errors.truncate(self.errors);
            self.parser.warnings.truncate(self.warnings);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_input(input: &str) -> Parse {
        parse(tokenize(input))
    }

    fn body(input: &str) -> Vec<Node> {
        let result = parse_input(input);
        assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
        result.program.body().to_vec()
    }

    #[test]
    fn empty_input() {
        let result = parse_input("");
        assert!(result.program.body().is_empty());
        assert!(result.is_clean());
    }

    #[test]
    fn program_root_is_always_returned() {
        let result = parse_input("if\n)))");
        assert!(matches!(result.program.kind, NodeKind::Program { .. }));
        assert!(!result.errors.is_empty());
    }

    #[test]
    fn rewind_restores_state() {
        let mut parser = Parser::new(tokenize("a b c"));
        {
            let mut attempt = Rewind::new(&mut parser);
            attempt.pos = 2;
            attempt.expected("nothing");
        }
        assert_eq!(parser.pos, 0);
        assert!(parser.errors.is_empty());

        {
            let mut attempt = Rewind::new(&mut parser);
            attempt.pos = 1;
            attempt.commit();
        }
        assert_eq!(parser.pos, 1);
    }

    #[test]
    fn continuation_marks_tokens() {
        let parser = Parser::new(tokenize("call Foo(1,\n      \\ 2)"));
        assert!(parser.tokens.iter().all(|t| t.kind != TokenKind::LineContinuation));
        let two = parser
            .tokens
            .iter()
            .position(|t| t.text == "2")
            .expect("token 2");
        assert!(parser.continued[two]);
    }

    #[test]
    fn missing_closer_reported_at_construct() {
        let result = parse_input("if x\n  echo 1\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(
            result.errors[0].kind,
            DiagnosticKind::MissingCloser {
                closer: "endif",
                construct: "if"
            }
        );
        assert_eq!(result.errors[0].span, Span::new(1, 1));
    }

    #[test]
    fn enclosing_closer_ends_inner_block() {
        let result = parse_input("def F()\n  if x\n    echo 1\nenddef\n");
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(
            result.errors[0].kind,
            DiagnosticKind::MissingCloser { closer: "endif", .. }
        ));
        let nodes = result.program.body();
        assert_eq!(nodes.len(), 1);
        assert!(matches!(nodes[0].kind, NodeKind::DefFunction { .. }));
    }

    #[test]
    fn stray_closer_becomes_marker() {
        let result = parse_input("echo 1\nendif\n");
        let nodes = result.program.body();
        assert!(matches!(
            &nodes[1].kind,
            NodeKind::BlockEnd { keyword } if keyword == "endif"
        ));
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn diagnostic_display_and_context() {
        let result = parse_input("var x = )");
        let error = &result.errors[0];
        assert_eq!(error.message(), "expected expression, got ')'");
        assert_eq!(
            error.to_string(),
            "expected expression, got ')' at line 1, column 9"
        );
        assert_eq!(error.context.as_deref(), Some("var x = )"));
    }

    #[test]
    fn bar_separates_commands() {
        let nodes = body("if c | echo 1 | endif");
        assert_eq!(nodes.len(), 1);
        let NodeKind::If { then_branch, .. } = &nodes[0].kind else {
            panic!("expected if, got {:?}", nodes[0].kind);
        };
        assert_eq!(then_branch.len(), 1);
    }

    #[test]
    fn join_tokens_restores_spacing() {
        let tokens = tokenize("set  ts=2 sw=4");
        assert_eq!(join_tokens(&tokens), "set  ts=2 sw=4");
    }

    fn too_deep(result: &Parse) -> usize {
        result
            .errors
            .iter()
            .filter(|e| e.kind == DiagnosticKind::TooDeep)
            .count()
    }

    #[test]
    fn long_elseif_chain_is_bounded() {
        let mut input = String::from("if n == 0\n  echo 0\n");
        for i in 1..=3_000 {
            input.push_str(&format!("elseif n == {i}\n  echo {i}\n"));
        }
        input.push_str("else\n  echo -1\nendif\necho 'after'\n");
        let result = parse_input(&input);
        assert_eq!(too_deep(&result), 1);
        assert_eq!(result.errors.len(), 1);
        assert!(result.warnings.is_empty());
        assert_eq!(result.program.body().len(), 2);

        let mut branches = 0;
        result.program.walk(&mut |n| {
            if matches!(n.kind, NodeKind::If { .. }) {
                branches += 1;
            }
        });
        assert_eq!(branches, 3_001);
    }

    #[test]
    fn short_elseif_chain_still_nests() {
        let nodes = body("if a\nelseif b\nelseif c\nelse\n  echo 1\nendif\n");
        let NodeKind::If { else_branch, .. } = &nodes[0].kind else {
            panic!("expected if, got {:?}", nodes[0].kind);
        };
        let NodeKind::If { else_branch, .. } = &else_branch[0].kind else {
            panic!("expected nested if");
        };
        assert!(matches!(else_branch[0].kind, NodeKind::If { .. }));
    }

    #[test]
    fn nested_generic_types_are_bounded() {
        let input = format!("var x: {}number{} = []\n", "list<".repeat(2_000), ">".repeat(2_000));
        let result = parse_input(&input);
        assert!(too_deep(&result) >= 1);
    }

    #[test]
    fn long_concatenation_is_bounded() {
        let input = format!("var x: string = 'a'{}\necho x\n", " .. 'a'".repeat(5_000));
        let result = parse_input(&input);
        assert_eq!(too_deep(&result), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.program.body().len(), 2);
    }

    #[test]
    fn long_method_chain_is_bounded() {
        let input = format!("var x = y{}\necho x\n", "->F()".repeat(5_000));
        let result = parse_input(&input);
        assert_eq!(too_deep(&result), 1);
        assert_eq!(result.program.body().len(), 2);
    }

    #[test]
    fn long_ternary_chain_is_bounded() {
        let input = format!("var x = {}0\necho x\n", "a ? 1 : ".repeat(5_000));
        let result = parse_input(&input);
        assert_eq!(too_deep(&result), 1);
        assert_eq!(result.program.body().len(), 2);
    }

    #[test]
    fn diagnostic_context_is_the_offending_line() {
        let result = parse_input("echo 1\nvar x = )\n)\necho 2\n");
        let contexts: Vec<Option<&str>> = result
            .errors
            .iter()
            .chain(&result.warnings)
            .map(|d| d.context.as_deref())
            .collect();
        assert!(contexts.contains(&Some("var x = )")));
        assert!(contexts.contains(&Some(")")));
    }

    #[test]
    fn deep_nesting_is_reported() {
        let input = format!("var x = {}1{}", "(".repeat(400), ")".repeat(400));
        let result = parse_input(&input);
        assert!(
            result
                .errors
                .iter()
                .any(|e| e.kind == DiagnosticKind::TooDeep)
        );
    }
}
