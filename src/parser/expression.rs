use super::{DiagnosticKind, MAX_DEPTH, Parser, Rewind, join_tokens};
use crate::ast::{DictEntry, LiteralKind, Node, NodeKind, Scope, TypeExpr};
use crate::builtins::is_builtin_function;
use crate::token::{Token, TokenKind};

/// Operators that may begin a line and still continue the expression
/// on the line before.
const LEADING_OPERATORS: &[&str] = &[
    "..", "??", "||", "&&", "->", "+", "*", "/", "%", "==", "!=", ">", "<", ">=", "<=", "=~",
    "!~",
];

/// Binding power of a binary operator; higher binds tighter.
fn binary_precedence(token: &Token) -> Option<u8> {
    match token.kind {
        TokenKind::Operator => {
            let op = token.text.as_str();
            // `==#`, `=~?`: case suffixes do not change binding power
            let base = match op.strip_suffix('#').or_else(|| op.strip_suffix('?')) {
                Some(stem) if stem.len() >= 2 => stem,
                _ => op,
            };
            match base {
                ".." | "??" => Some(1),
                "||" => Some(2),
                "&&" => Some(3),
                "==" | "!=" | ">" | "<" | ">=" | "<=" | "=~" | "!~" => Some(4),
                "+" | "-" => Some(5),
                "*" | "/" | "%" => Some(6),
                "." => Some(7),
                _ => None,
            }
        }
        TokenKind::Identifier if matches!(token.text.as_str(), "is" | "isnot") => Some(4),
        _ => None,
    }
}

const fn scope_of(kind: TokenKind) -> Scope {
    match kind {
        TokenKind::GlobalVariable => Scope::Global,
        TokenKind::ScriptLocal => Scope::Script,
        TokenKind::BufferLocal => Scope::Buffer,
        TokenKind::WindowLocal => Scope::Window,
        TokenKind::TabLocal => Scope::Tab,
        TokenKind::ArgumentVariable => Scope::Argument,
        TokenKind::LocalVariable => Scope::Local,
        TokenKind::VimVariable => Scope::Vim,
        TokenKind::OptionVariable | TokenKind::ScopedOption => Scope::Option,
        TokenKind::EnvVariable => Scope::Environment,
        _ => Scope::Unscoped,
    }
}

fn literal(kind: LiteralKind, token: Token) -> Node {
    Node::new(
        NodeKind::Literal {
            kind,
            value: token.text,
        },
        token.span,
    )
}

impl Parser {
    pub(super) fn expression(&mut self) -> Node {
        self.ternary()
    }

    /// Whether the operator at the cursor continues the current
    /// expression: same logical line, or a leading operator on the next.
    fn operator_continues(&self) -> bool {
        if !self.starts_new_line() {
            return true;
        }
        self.peek().is_some_and(|t| {
            (t.kind == TokenKind::Operator && LEADING_OPERATORS.contains(&t.text.as_str()))
                || t.kind == TokenKind::QuestionMark
        })
    }

    fn ternary_follows(&self) -> bool {
        self.check(TokenKind::QuestionMark) && self.operator_continues()
    }

    fn ternary(&mut self) -> Node {
        let condition = self.binary(1);
        if !self.ternary_follows() {
            return condition;
        }
        if self.depth + 1 >= MAX_DEPTH {
            self.too_deep_expression();
            return condition;
        }
        self.pos += 1;
        self.depth += 1;
        let then_expr = self.ternary();
        let else_expr = if self.eat(TokenKind::Colon) {
            self.ternary()
        } else {
            self.expected("':'");
            Node::new(NodeKind::Missing, self.current_span())
        };
        self.depth -= 1;
        let span = condition.span;
        Node::new(
            NodeKind::Ternary {
                condition: Box::new(condition),
                then_expr: Box::new(then_expr),
                else_expr: Box::new(else_expr),
            },
            span,
        )
    }

    /// Precedence climbing over [`binary_precedence`]. Every operator
    /// folded into `left` nests the tree one level deeper, so a chain
    /// counts against the depth limit.
    fn binary(&mut self, min_precedence: u8) -> Node {
        let mut left = self.unary();
        let base = self.depth;
        loop {
            let Some(precedence) = self.peek().and_then(binary_precedence) else {
                break;
            };
            if precedence < min_precedence || !self.operator_continues() {
                break;
            }
            // the right operand needs a level of its own
            if self.depth + 1 >= MAX_DEPTH {
                self.too_deep_expression();
                break;
            }
            self.depth += 1;
            let operator = self.advance().map(|t| t.text).unwrap_or_default();
            let right = self.binary(precedence + 1);
            let span = left.span;
            left = Node::new(
                NodeKind::Binary {
                    operator,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        self.depth = base;
        left
    }

    fn unary(&mut self) -> Node {
        if self.depth >= MAX_DEPTH {
            let span = self.current_span();
            self.error(DiagnosticKind::TooDeep, span);
            return Node::new(NodeKind::Missing, span);
        }
        self.depth += 1;
        let node = self.unary_inner();
        self.depth -= 1;
        node
    }

    fn unary_inner(&mut self) -> Node {
        let is_prefix = self.peek().is_some_and(|t| {
            t.kind == TokenKind::Operator && matches!(t.text.as_str(), "!" | "-" | "+")
        });
        if is_prefix {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            let operand = Box::new(self.unary());
            return Node::new(
                NodeKind::Unary {
                    operator: token.text,
                    operand,
                },
                token.span,
            );
        }
        let primary = self.primary();
        self.postfix(primary)
    }

    /// Apply `.name`, `->method()`, `[index]`, `[a : b]` and `(args)`
    /// until none matches. Like binary chains, each step nests `node`
    /// one level deeper.
    pub(super) fn postfix(&mut self, mut node: Node) -> Node {
        let base = self.depth;
        while self.postfix_follows() {
            if self.depth + 1 >= MAX_DEPTH {
                self.too_deep_expression();
                break;
            }
            self.depth += 1;
            node = self.postfix_step(node);
        }
        self.depth = base;
        node
    }

    /// Report an expression nested past the limit and skip what is left
    /// of it without parsing: up to the end of the command, or up to a
    /// `,` or closing bracket that belongs to an enclosing construct.
    fn too_deep_expression(&mut self) {
        let span = self.current_span();
        self.error(DiagnosticKind::TooDeep, span);
        let mut open = 0usize;
        while let Some(token) = self.peek() {
            match token.kind {
                TokenKind::ParenOpen | TokenKind::BracketOpen | TokenKind::BraceOpen => open += 1,
                TokenKind::ParenClose | TokenKind::BracketClose | TokenKind::BraceClose => {
                    if open == 0 {
                        return;
                    }
                    open -= 1;
                }
                TokenKind::Comma if open == 0 && self.nesting > 0 => return,
                _ => {}
            }
            let leading_operator = self.starts_new_line() && self.operator_continues();
            if open == 0 && self.at_statement_end() && !leading_operator {
                return;
            }
            self.pos += 1;
        }
    }

    fn postfix_follows(&self) -> bool {
        let Some(token) = self.peek() else {
            return false;
        };
        match token.kind {
            TokenKind::Operator if token.text == "." => self.is_property_access(),
            TokenKind::Operator if token.text == "->" => self.operator_continues(),
            TokenKind::BracketOpen | TokenKind::ParenOpen => self.touches_previous(),
            _ => false,
        }
    }

    /// One postfix operation on `node`; the cursor is on its first token.
    fn postfix_step(&mut self, node: Node) -> Node {
        let span = node.span;
        if self.check(TokenKind::BracketOpen) {
            return self.index(node);
        }
        if self.check(TokenKind::ParenOpen) {
            let arguments = self.arguments();
            return Node::new(
                NodeKind::Call {
                    callee: Box::new(node),
                    arguments,
                },
                span,
            );
        }
        if self.check_operator("->") {
            self.pos += 1;
            return self.method_call(node);
        }
        self.pos += 1;
        let property = self.advance().map(|t| t.text).unwrap_or_default();
        Node::new(
            NodeKind::PropertyAccess {
                object: Box::new(node),
                property,
            },
            span,
        )
    }

    /// `.` glued to both neighbours: `dict.key`.
    fn is_property_access(&self) -> bool {
        let Some(next) = self.peek_at(1) else {
            return false;
        };
        self.touches_previous()
            && self.tokens[self.pos].touches(next)
            && (next.kind == TokenKind::Identifier
                || next.kind == TokenKind::Keyword
                || next.kind == TokenKind::Number)
    }

    fn method_call(&mut self, object: Node) -> Node {
        let span = object.span;

        // `x->(lambda)(args)` calls the lambda with `x` first
        if self.check(TokenKind::ParenOpen) {
            let callee = self.primary();
            let mut arguments = vec![object];
            if self.check(TokenKind::ParenOpen) && self.touches_previous() {
                arguments.extend(self.arguments());
            }
            return Node::new(
                NodeKind::Call {
                    callee: Box::new(callee),
                    arguments,
                },
                span,
            );
        }

        let method = match self.peek() {
            Some(t) if t.kind.is_identifier_like() || t.kind == TokenKind::Keyword => {
                t.text.clone()
            }
            _ => {
                self.expected("method name");
                return object;
            }
        };
        self.pos += 1;
        let arguments = if self.check(TokenKind::ParenOpen) && self.touches_previous() {
            self.arguments()
        } else {
            Vec::new()
        };
        Node::new(
            NodeKind::MethodCall {
                object: Box::new(object),
                method,
                arguments,
            },
            span,
        )
    }

    /// `[index]` or `[start : end]` after `object`.
    fn index(&mut self, object: Node) -> Node {
        let span = object.span;
        self.pos += 1;
        self.nesting += 1;

        let start = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.expression()))
        };
        let node = if self.eat(TokenKind::Colon) {
            let end = if self.check(TokenKind::BracketClose) {
                None
            } else {
                Some(Box::new(self.expression()))
            };
            NodeKind::Slice {
                object: Box::new(object),
                start,
                end,
            }
        } else {
            NodeKind::Index {
                object: Box::new(object),
                index: start.unwrap_or_else(|| Node::boxed(NodeKind::Missing, span)),
            }
        };

        self.nesting -= 1;
        self.expect(TokenKind::BracketClose, "']'");
        Node::new(node, span)
    }

    /// `(a, b, ...)` call arguments; the cursor is on `(`.
    fn arguments(&mut self) -> Vec<Node> {
        self.pos += 1;
        self.nesting += 1;
        let mut arguments = Vec::new();
        loop {
            self.skip_nested_comments();
            if self.peek().is_none() || self.check(TokenKind::ParenClose) {
                break;
            }
            let start = self.pos;
            let argument = self.expression();
            if self.pos == start {
                break;
            }
            arguments.push(argument);
            self.skip_nested_comments();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.nesting -= 1;
        self.expect(TokenKind::ParenClose, "')'");
        arguments
    }

    pub(super) fn primary(&mut self) -> Node {
        let Some(token) = self.peek().cloned() else {
            self.expected("expression");
            return Node::new(NodeKind::Missing, self.eof_span());
        };

        match token.kind {
            TokenKind::Number => self.take_literal(LiteralKind::Number),
            TokenKind::String => self.take_literal(LiteralKind::String),
            TokenKind::InterpolatedString => self.take_literal(LiteralKind::InterpolatedString),
            TokenKind::Regex => self.take_literal(LiteralKind::Regex),
            TokenKind::Heredoc => self.take_literal(LiteralKind::Heredoc),
            TokenKind::HexColor => self.take_literal(LiteralKind::HexColor),
            TokenKind::Placeholder => self.take_literal(LiteralKind::KeyNotation),
            TokenKind::SpecialKey => {
                let sid_call = token.text.eq_ignore_ascii_case("<SID>")
                    && self
                        .peek_at(1)
                        .is_some_and(|next| next.kind.is_identifier_like() && token.touches(next));
                if sid_call {
                    self.name_or_call()
                } else {
                    self.take_literal(LiteralKind::KeyNotation)
                }
            }
            TokenKind::Register => {
                self.pos += 1;
                let name = token.text.chars().skip(1).collect();
                Node::new(NodeKind::Register { name }, token.span)
            }
            TokenKind::NamespacePrefix => {
                self.pos += 1;
                let scope = token
                    .text
                    .chars()
                    .next()
                    .and_then(Scope::from_prefix)
                    .unwrap_or(Scope::Unscoped);
                Node::new(NodeKind::ScopeDict { scope }, token.span)
            }
            TokenKind::Identifier
                if matches!(token.text.as_str(), "function" | "funcref")
                    && self.peek_at(1).is_some_and(|next| {
                        next.kind == TokenKind::ParenOpen && next.span.line == token.span.line
                    }) =>
            {
                self.function_reference()
            }
            kind if kind.is_identifier_like() => self.name_or_call(),
            TokenKind::BracketOpen => self.list_literal(),
            TokenKind::BraceOpen => self.brace(),
            TokenKind::ParenOpen => self.paren_or_lambda(),
            _ => {
                self.expected("expression");
                let consumable = !matches!(
                    token.kind,
                    TokenKind::Keyword
                        | TokenKind::Bar
                        | TokenKind::Comment
                        | TokenKind::ParenClose
                        | TokenKind::BracketClose
                        | TokenKind::BraceClose
                        | TokenKind::Comma
                );
                if consumable && !self.starts_new_line() {
                    self.pos += 1;
                }
                Node::new(NodeKind::Missing, token.span)
            }
        }
    }

    fn take_literal(&mut self, kind: LiteralKind) -> Node {
        match self.advance() {
            Some(token) => literal(kind, token),
            None => Node::new(NodeKind::Missing, self.eof_span()),
        }
    }

    /// A variable, `true`/`null` literal, or a call of a named function.
    fn name_or_call(&mut self) -> Node {
        let first = self.tokens[self.pos].clone();
        let mut name = first.text.clone();
        let mut kind = first.kind;
        self.pos += 1;
        if first.kind == TokenKind::SpecialKey {
            // `<SID>Name`
            if let Some(rest) = self.advance() {
                name.push_str(&rest.text);
                kind = rest.kind;
            }
        }

        if self.check(TokenKind::ParenOpen) && self.touches_previous() {
            let arguments = self.arguments();
            let builtin = first.kind == TokenKind::Identifier && is_builtin_function(&name);
            return Node::new(
                NodeKind::FunctionCall {
                    name,
                    arguments,
                    builtin,
                },
                first.span,
            );
        }

        let literal_kind = match (kind, name.as_str()) {
            (TokenKind::Identifier, "true" | "false")
            | (TokenKind::VimVariable, "v:true" | "v:false") => Some(LiteralKind::Boolean),
            (TokenKind::Identifier, "null") | (TokenKind::VimVariable, "v:null" | "v:none") => {
                Some(LiteralKind::Null)
            }
            (TokenKind::Identifier, typed) if typed.starts_with("null_") => Some(LiteralKind::Null),
            _ => None,
        };
        if let Some(literal_kind) = literal_kind {
            return Node::new(
                NodeKind::Literal {
                    kind: literal_kind,
                    value: name,
                },
                first.span,
            );
        }

        Node::new(
            NodeKind::Identifier {
                scope: scope_of(kind),
                name,
            },
            first.span,
        )
    }

    /// `function('Name', [args])` or `funcref(...)`.
    fn function_reference(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let mut arguments = self.arguments().into_iter();
        let target = arguments.next().unwrap_or_else(|| {
            self.error(
                DiagnosticKind::Expected {
                    expected: "function name",
                    found: None,
                },
                token.span,
            );
            Node::new(NodeKind::Missing, token.span)
        });
        Node::new(
            NodeKind::FunctionReference {
                function: token.text,
                target: Box::new(target),
                arguments: arguments.collect(),
            },
            token.span,
        )
    }

    fn list_literal(&mut self) -> Node {
        let span = self.current_span();
        self.pos += 1;
        self.nesting += 1;
        let mut elements = Vec::new();
        loop {
            self.skip_nested_comments();
            if self.peek().is_none() || self.check(TokenKind::BracketClose) {
                break;
            }
            let start = self.pos;
            let element = self.expression();
            if self.pos == start {
                break;
            }
            elements.push(element);
            self.skip_nested_comments();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.nesting -= 1;
        self.expect(TokenKind::BracketClose, "']'");

        let list = Node::new(NodeKind::List { elements }, span);
        if self.check(TokenKind::BracketOpen)
            && self.touches_previous()
            && self.bracket_holds_list(self.pos)
        {
            let right = self.list_literal();
            return Node::new(
                NodeKind::ListConcat {
                    left: Box::new(list),
                    right: Box::new(right),
                },
                span,
            );
        }
        list
    }

    /// Whether the brackets opening at `open` hold a list literal rather
    /// than an index: empty, or with a comma at the top level.
    fn bracket_holds_list(&self, open: usize) -> bool {
        let mut depth = 0usize;
        for (i, token) in self.tokens.iter().enumerate().skip(open + 1) {
            match token.kind {
                TokenKind::BracketOpen | TokenKind::ParenOpen | TokenKind::BraceOpen => depth += 1,
                TokenKind::BracketClose if depth == 0 => return i == open + 1,
                TokenKind::BracketClose | TokenKind::ParenClose | TokenKind::BraceClose => {
                    depth = depth.saturating_sub(1);
                }
                TokenKind::Comma if depth == 0 => return true,
                _ => {}
            }
        }
        false
    }

    /// `{`: a legacy lambda `{a, b -> expr}` or a dictionary.
    fn brace(&mut self) -> Node {
        let span = self.current_span();
        if self.peek().is_some_and(|t| t.text == "{") {
            if let Some(params) = self.legacy_lambda_head() {
                self.nesting += 1;
                let body = Box::new(self.expression());
                self.nesting -= 1;
                self.expect(TokenKind::BraceClose, "'}'");
                return Node::new(
                    NodeKind::Lambda {
                        params,
                        return_type: None,
                        body,
                        legacy: true,
                    },
                    span,
                );
            }
        }
        self.dict_literal()
    }

    /// Parameters of `{a, b -> ...}` up to and including `->`.
    fn legacy_lambda_head(&mut self) -> Option<Vec<Node>> {
        let mut attempt = Rewind::new(self);
        attempt.pos += 1;
        attempt.nesting += 1;
        let mut params = Vec::new();
        while !attempt.check_operator("->") {
            let token = attempt.peek()?.clone();
            let variadic = token.kind == TokenKind::Ellipsis;
            if token.kind != TokenKind::Identifier && !variadic {
                return None;
            }
            attempt.pos += 1;
            params.push(Node::new(
                NodeKind::Parameter {
                    name: token.text,
                    type_annotation: None,
                    default: None,
                    variadic,
                },
                token.span,
            ));
            if !attempt.eat(TokenKind::Comma) {
                break;
            }
        }
        if !attempt.check_operator("->") {
            return None;
        }
        attempt.pos += 1;
        attempt.nesting -= 1;
        attempt.commit();
        Some(params)
    }

    fn dict_literal(&mut self) -> Node {
        let span = self.current_span();
        self.pos += 1;
        self.nesting += 1;
        let mut entries = Vec::new();
        loop {
            self.skip_nested_comments();
            if self.peek().is_none() || self.check(TokenKind::BraceClose) {
                break;
            }
            let Some(key) = self.dict_key() else {
                break;
            };
            if self.expect(TokenKind::Colon, "':'").is_none() {
                break;
            }
            let value = self.expression();
            entries.push(DictEntry { key, value });
            self.skip_nested_comments();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.nesting -= 1;
        self.expect(TokenKind::BraceClose, "'}'");
        Node::new(NodeKind::Dict { entries }, span)
    }

    /// A dictionary key as written: `'name'`, `name`, `1`, or `[expr]`.
    fn dict_key(&mut self) -> Option<String> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::String
            | TokenKind::Identifier
            | TokenKind::Keyword
            | TokenKind::Number
            | TokenKind::NamespacePrefix => {
                self.pos += 1;
                Some(token.text)
            }
            TokenKind::BracketOpen => {
                let start = self.pos;
                self.pos += 1;
                self.expression();
                self.expect(TokenKind::BracketClose, "']'");
                Some(join_tokens(&self.tokens[start..self.pos]))
            }
            _ => {
                self.expected("dictionary key");
                None
            }
        }
    }

    /// `(`: a lambda `(params): type => body` or a parenthesized
    /// expression, decided by speculative lookahead.
    fn paren_or_lambda(&mut self) -> Node {
        let span = self.current_span();
        if let Some((params, return_type)) = self.lambda_head() {
            let body = Box::new(self.lambda_body());
            return Node::new(
                NodeKind::Lambda {
                    params,
                    return_type,
                    body,
                    legacy: false,
                },
                span,
            );
        }

        self.pos += 1;
        self.nesting += 1;
        let inner = self.expression();
        self.nesting -= 1;
        self.expect(TokenKind::ParenClose, "')'");
        inner
    }

    /// Parameters and return type of `(a: number, b): type =>`, up to
    /// and including `=>`.
    fn lambda_head(&mut self) -> Option<(Vec<Node>, Option<TypeExpr>)> {
        let mut attempt = Rewind::new(self);
        attempt.pos += 1;
        attempt.nesting += 1;

        let mut params = Vec::new();
        while !attempt.check(TokenKind::ParenClose) {
            let span = attempt.current_span();
            let variadic = attempt.eat(TokenKind::Ellipsis);
            let name = match attempt.peek() {
                Some(t) if t.kind == TokenKind::Identifier => t.text.clone(),
                _ => return None,
            };
            attempt.pos += 1;
            let type_annotation = if attempt.eat(TokenKind::Colon) {
                Some(attempt.type_expr()?)
            } else {
                None
            };
            params.push(Node::new(
                NodeKind::Parameter {
                    name,
                    type_annotation,
                    default: None,
                    variadic,
                },
                span,
            ));
            if !attempt.eat(TokenKind::Comma) {
                break;
            }
        }
        if !attempt.eat(TokenKind::ParenClose) {
            return None;
        }
        attempt.nesting -= 1;

        let return_type = if attempt.eat(TokenKind::Colon) {
            Some(attempt.type_expr()?)
        } else {
            None
        };
        if !attempt.check_operator("=>") {
            return None;
        }
        attempt.pos += 1;
        attempt.commit();
        Some((params, return_type))
    }

    /// An expression, or a `{` ... `}` statement block when the brace
    /// ends its line.
    fn lambda_body(&mut self) -> Node {
        let opens_block = self.peek().is_some_and(|t| t.is(TokenKind::BraceOpen, "{"))
            && self.block_follows();
        if !opens_block {
            return self.expression();
        }

        let span = self.current_span();
        self.pos += 1;
        let body = self.block(&["}"]);
        self.close_block("lambda", &["}"], span);
        Node::new(NodeKind::Block { body }, span)
    }

    /// The token after the cursor sits on a later physical line.
    fn block_follows(&self) -> bool {
        match (self.peek(), self.peek_at(1)) {
            (Some(open), Some(next)) => {
                !self.continued[self.pos + 1] && next.span.line > open.span.line
            }
            _ => false,
        }
    }
}
