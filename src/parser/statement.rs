use super::{DiagnosticKind, MAX_DEPTH, Parser, join_tokens};
use crate::ast::{DeclarationKind, ForTarget, LiteralKind, Node, NodeKind, TypeExpr};
use crate::token::{Span, Token, TokenKind};

const IF_CLOSERS: &[&str] = &["elseif", "else", "endif"];

/// `elseif` branches nest no deeper than this, leaving the rest of the
/// depth budget to their contents.
const MAX_ELSEIF_DEPTH: usize = MAX_DEPTH / 2;
const TRY_CLOSERS: &[&str] = &["catch", "finally", "endtry"];
const FUNCTION_CLOSERS: &[&str] = &["endfunction", "endfunc", "endf"];

/// Closing keywords; outside their construct they become `BlockEnd`.
const CLOSERS: &[&str] = &[
    "endif",
    "endwhile",
    "endfor",
    "enddef",
    "endfunction",
    "endfunc",
    "endf",
    "endtry",
    "else",
    "elseif",
    "catch",
    "finally",
];

const UNSUPPORTED: &[&str] = &[
    "class",
    "endclass",
    "interface",
    "endinterface",
    "enum",
    "endenum",
    "abort",
];

/// Keywords parsed as opaque `ExCommand`s.
const RAW_COMMANDS: &[&str] = &[
    "unlet",
    "set",
    "setlocal",
    "setglobal",
    "syntax",
    "highlight",
    "sleep",
    "source",
    "normal",
    "redraw",
    "echohl",
    "scriptencoding",
];

/// Ex commands with no keyword of their own, recognised at the start
/// of a statement when not used as an expression.
const EX_COMMANDS: &[&str] = &[
    "abbreviate",
    "au",
    "badd",
    "bdelete",
    "bufdo",
    "cabbrev",
    "cd",
    "close",
    "cnoreabbrev",
    "colorscheme",
    "defcompile",
    "delcommand",
    "delfunction",
    "doautoall",
    "doautocmd",
    "edit",
    "exec",
    "filetype",
    "hi",
    "iabbrev",
    "keepalt",
    "keepjumps",
    "keeppatterns",
    "lcd",
    "lockvar",
    "mapclear",
    "new",
    "noautocmd",
    "nohlsearch",
    "norm",
    "packadd",
    "quit",
    "redir",
    "setl",
    "sil",
    "split",
    "startinsert",
    "stopinsert",
    "tabnew",
    "unlockvar",
    "unmap",
    "nunmap",
    "vunmap",
    "xunmap",
    "ounmap",
    "iunmap",
    "cunmap",
    "tunmap",
    "update",
    "vnew",
    "vsplit",
    "wincmd",
    "windo",
    "write",
];

const MAPPING_COMMANDS: &[&str] = &[
    "map", "nmap", "vmap", "xmap", "smap", "omap", "imap", "lmap", "cmap", "tmap", "noremap",
    "nnoremap", "vnoremap", "xnoremap", "snoremap", "onoremap", "inoremap", "lnoremap",
    "cnoremap", "tnoremap",
];

const MAP_ARGUMENTS: &[&str] = &[
    "<buffer>", "<nowait>", "<silent>", "<special>", "<script>", "<expr>", "<unique>",
];

const ECHO_COMMANDS: &[&str] = &["echo", "echon", "echom", "echomsg", "echoerr", "echowindow"];

const FUNCTION_ATTRIBUTES: &[&str] = &["range", "dict", "abort", "closure"];

impl Parser {
    pub(super) fn statement(&mut self) -> Option<Node> {
        if self.depth >= MAX_DEPTH {
            let span = self.current_span();
            self.error(DiagnosticKind::TooDeep, span);
            self.skip_line();
            return None;
        }
        self.depth += 1;
        let node = self.statement_inner();
        self.depth -= 1;
        node
    }

    fn statement_inner(&mut self) -> Option<Node> {
        let token = self.peek()?.clone();
        match token.kind {
            TokenKind::Keyword => self.keyword_statement(&token),
            TokenKind::Comment => {
                self.pos += 1;
                Some(Node::new(NodeKind::Comment { text: token.text }, token.span))
            }
            TokenKind::Identifier if EX_COMMANDS.contains(&token.text.as_str()) => {
                if self.used_as_expression() {
                    self.expression_statement()
                } else {
                    Some(self.raw_command(&token))
                }
            }
            TokenKind::BraceOpen if token.text == "{" && self.line_breaks_before(self.pos + 1) => {
                Some(self.block_statement())
            }
            _ if starts_expression(&token) => self.expression_statement(),
            _ => {
                self.warning(
                    DiagnosticKind::UnexpectedToken {
                        found: token.text.clone(),
                    },
                    token.span,
                );
                self.pos += 1;
                None
            }
        }
    }

    fn keyword_statement(&mut self, token: &Token) -> Option<Node> {
        let word = token.text.as_str();
        match word {
            "vim9script" => {
                self.pos += 1;
                if self.check_word("noclear") && !self.starts_new_line() {
                    self.pos += 1;
                }
                Some(Node::new(NodeKind::Vim9Script, token.span))
            }
            "var" | "const" | "final" => self.variable_declaration(),
            "def" => self.def_function(),
            "function" => Some(self.legacy_function()),
            "if" => Some(self.if_statement()),
            "while" => Some(self.while_statement()),
            "for" => Some(self.for_statement()),
            "try" => Some(self.try_statement()),
            "throw" => {
                self.pos += 1;
                let value = Box::new(self.expression());
                Some(Node::new(NodeKind::Throw { value }, token.span))
            }
            "return" => {
                self.pos += 1;
                let value = if self.at_statement_end() {
                    None
                } else {
                    Some(Box::new(self.expression()))
                };
                Some(Node::new(NodeKind::Return { value }, token.span))
            }
            "break" => {
                self.pos += 1;
                Some(Node::new(NodeKind::Break, token.span))
            }
            "continue" => {
                self.pos += 1;
                Some(Node::new(NodeKind::Continue, token.span))
            }
            "import" => Some(self.import_statement()),
            "export" => self.export_statement(),
            "let" => Some(self.let_statement()),
            "execute" | "exe" => {
                self.pos += 1;
                let arguments = self.command_arguments();
                Some(Node::new(NodeKind::Execute { arguments }, token.span))
            }
            "call" => {
                self.pos += 1;
                let expression = Box::new(self.expression());
                Some(Node::new(NodeKind::CallStatement { expression }, token.span))
            }
            "autocmd" => {
                self.pos += 1;
                let bang = self.bang();
                let raw = self.raw_rest(false);
                Some(Node::new(NodeKind::Autocmd { bang, raw }, token.span))
            }
            "augroup" if self.closer_word() != Some("augroup END") => Some(self.augroup()),
            "command" => Some(self.command_definition()),
            "filter" => {
                self.pos += 1;
                let bang = self.bang();
                let pattern = self.advance_on_line().map(|t| t.text).unwrap_or_default();
                let command = self.nested_command();
                Some(Node::new(
                    NodeKind::Filter {
                        bang,
                        pattern,
                        command,
                    },
                    token.span,
                ))
            }
            "runtime" => {
                self.pos += 1;
                let bang = self.bang();
                let raw = self.raw_rest(true);
                Some(Node::new(NodeKind::Runtime { bang, raw }, token.span))
            }
            "silent" => {
                self.pos += 1;
                let bang = self.bang();
                let command = self.nested_command();
                Some(Node::new(NodeKind::Silent { bang, command }, token.span))
            }
            _ if ECHO_COMMANDS.contains(&word) => {
                self.pos += 1;
                let arguments = self.command_arguments();
                Some(Node::new(
                    NodeKind::Echo {
                        command: token.text.clone(),
                        arguments,
                    },
                    token.span,
                ))
            }
            _ if MAPPING_COMMANDS.contains(&word) => Some(self.mapping(token)),
            _ if RAW_COMMANDS.contains(&word) => Some(self.raw_command(token)),
            _ if CLOSERS.contains(&word) || self.closer_word() == Some("augroup END") => {
                let keyword = self.closer_word().unwrap_or(word).to_string();
                self.consume_closer();
                self.warning(
                    DiagnosticKind::StrayCloser {
                        keyword: keyword.clone(),
                    },
                    token.span,
                );
                self.skip_line();
                Some(Node::new(NodeKind::BlockEnd { keyword }, token.span))
            }
            _ => {
                if !UNSUPPORTED.contains(&word) {
                    tracing::debug!(keyword = word, "no statement form for keyword");
                }
                self.warning(
                    DiagnosticKind::UnsupportedKeyword {
                        keyword: token.text.clone(),
                    },
                    token.span,
                );
                self.pos += 1;
                self.skip_line();
                None
            }
        }
    }

    /// Whether an identifier that names an Ex command is really the
    /// start of an expression (`edit = true`, `split(line)`).
    fn used_as_expression(&self) -> bool {
        let Some(next) = self.peek_at(1) else {
            return false;
        };
        if self.line_breaks_before(self.pos + 1) {
            return false;
        }
        let touching = self.tokens[self.pos].touches(next);
        match next.kind {
            TokenKind::ParenOpen | TokenKind::BracketOpen => touching,
            TokenKind::CompoundOperator => true,
            TokenKind::Operator => {
                next.text == "=" || next.text == "->" || (next.text == "." && touching)
            }
            _ => false,
        }
    }

    fn raw_command(&mut self, token: &Token) -> Node {
        self.pos += 1;
        let bang = self.bang();
        let raw = self.raw_rest(true);
        Node::new(
            NodeKind::ExCommand {
                name: token.text.clone(),
                bang,
                raw,
            },
            token.span,
        )
    }

    /// The next token, if it is still part of the current command.
    fn advance_on_line(&mut self) -> Option<Token> {
        if self.at_statement_end() {
            None
        } else {
            self.advance()
        }
    }

    /// A command that is the argument of `silent` or `filter`.
    fn nested_command(&mut self) -> Option<Box<Node>> {
        if self.at_statement_end() {
            return None;
        }
        self.statement().map(Box::new)
    }

    /// Space separated expressions up to the end of the command.
    fn command_arguments(&mut self) -> Vec<Node> {
        let mut arguments = Vec::new();
        while !self.at_statement_end() {
            let start = self.pos;
            arguments.push(self.expression());
            if self.pos == start {
                break;
            }
        }
        arguments
    }

    fn expression_statement(&mut self) -> Option<Node> {
        let expression = self.expression();
        let span = expression.span;

        let is_assignment = !self.starts_new_line()
            && (self.check_operator("=") || self.check(TokenKind::CompoundOperator));
        if is_assignment {
            let operator = self.advance().map(|t| t.text).unwrap_or_default();
            let value = Box::new(self.expression());
            return Some(Node::new(
                NodeKind::Assignment {
                    target: Box::new(expression),
                    operator,
                    value,
                },
                span,
            ));
        }

        Some(Node::new(
            NodeKind::ExpressionStatement {
                expression: Box::new(expression),
            },
            span,
        ))
    }

    fn block_statement(&mut self) -> Node {
        let span = self.current_span();
        self.pos += 1;
        let body = self.block(&["}"]);
        self.close_block("{", &["}"], span);
        Node::new(NodeKind::Block { body }, span)
    }

    // -- declarations --

    fn variable_declaration(&mut self) -> Option<Node> {
        let token = self.advance()?;
        let keyword = DeclarationKind::from_keyword(&token.text)?;

        let name = if self.check(TokenKind::BracketOpen) {
            // `var [a, b] = pair`
            let start = self.pos;
            while !self.at_statement_end() && !self.check(TokenKind::BracketClose) {
                self.pos += 1;
            }
            self.eat(TokenKind::BracketClose);
            join_tokens(&self.tokens[start..self.pos])
        } else if self.peek().is_some_and(|t| t.kind.is_identifier_like()) && !self.starts_new_line()
        {
            self.advance().map(|t| t.text).unwrap_or_default()
        } else {
            self.expected("variable name");
            self.skip_line();
            return None;
        };

        let type_annotation = if self.eat(TokenKind::Colon) {
            self.type_expr()
        } else {
            None
        };

        let initializer = if self.check(TokenKind::Heredoc) {
            self.advance().map(|t| {
                Node::boxed(
                    NodeKind::Literal {
                        kind: LiteralKind::Heredoc,
                        value: t.text,
                    },
                    t.span,
                )
            })
        } else if self.check_operator("=") && !self.starts_new_line() {
            self.pos += 1;
            Some(Box::new(self.expression()))
        } else {
            None
        };

        Some(Node::new(
            NodeKind::VariableDeclaration {
                keyword,
                name,
                type_annotation,
                initializer,
            },
            token.span,
        ))
    }

    /// A function name: `Name`, `s:Name`, `<SID>Name`, `g:Name`,
    /// `auto#load#Name`, `dict.Method`.
    fn function_name(&mut self) -> Option<String> {
        if self.at_statement_end() || self.check(TokenKind::ParenOpen) {
            return None;
        }
        let start = self.pos;
        self.pos += 1;
        while self.peek().is_some_and(|t| t.kind != TokenKind::ParenOpen) && self.touches_previous()
        {
            self.pos += 1;
        }
        Some(join_tokens(&self.tokens[start..self.pos]))
    }

    fn def_function(&mut self) -> Option<Node> {
        let token = self.advance()?;
        let Some(name) = self.function_name() else {
            self.expected("function name");
            self.skip_line();
            return None;
        };

        let params = if self.check(TokenKind::ParenOpen) {
            self.parameters(true)
        } else {
            self.expected("'('");
            Vec::new()
        };

        let return_type = if self.check(TokenKind::Colon) && !self.starts_new_line() {
            self.pos += 1;
            self.type_expr()
        } else {
            None
        };

        let body = self.block(&["enddef"]);
        self.close_block("def", &["enddef"], token.span);

        Some(Node::new(
            NodeKind::DefFunction {
                name,
                params,
                return_type,
                body,
            },
            token.span,
        ))
    }

    fn legacy_function(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let bang = self.bang();

        let name = self.function_name().unwrap_or_default();
        if name.is_empty() || !self.check(TokenKind::ParenOpen) {
            // `function` alone lists functions; `function Name` shows one.
            let raw = format!("{name}{}", self.raw_rest(true));
            return Node::new(
                NodeKind::ExCommand {
                    name: token.text,
                    bang,
                    raw: raw.trim().to_string(),
                },
                token.span,
            );
        }

        let params = self.parameters(false);

        let mut attributes = Vec::new();
        while !self.at_statement_end() {
            let Some(next) = self.peek() else { break };
            if !FUNCTION_ATTRIBUTES.contains(&next.text.as_str()) {
                break;
            }
            attributes.push(next.text.clone());
            self.pos += 1;
        }

        let body = self.block(FUNCTION_CLOSERS);
        self.close_block("function", FUNCTION_CLOSERS, token.span);

        Node::new(
            NodeKind::LegacyFunction {
                name,
                bang,
                params,
                attributes,
                body,
            },
            token.span,
        )
    }

    /// `(a: number, b = 1, ...rest: list<any>)`; `typed` selects `def`
    /// syntax, otherwise legacy `(a, b, ...)`.
    fn parameters(&mut self, typed: bool) -> Vec<Node> {
        self.pos += 1;
        self.nesting += 1;
        let mut params = Vec::new();
        loop {
            self.skip_nested_comments();
            if self.peek().is_none() || self.check(TokenKind::ParenClose) {
                break;
            }
            let start = self.pos;
            if let Some(param) = self.parameter(typed) {
                params.push(param);
            }
            if self.pos == start {
                break;
            }
            self.skip_nested_comments();
            if !self.eat(TokenKind::Comma) {
                break;
            }
        }
        self.nesting -= 1;
        self.expect(TokenKind::ParenClose, "')'");
        params
    }

    fn parameter(&mut self, typed: bool) -> Option<Node> {
        let span = self.current_span();

        // legacy `. . .`
        if !typed && (0..3).all(|i| self.peek_at(i).is_some_and(|t| t.is_operator("."))) {
            self.pos += 3;
            return Some(variadic_parameter("...", span));
        }

        let variadic = self.eat(TokenKind::Ellipsis);
        if variadic && !typed {
            return Some(variadic_parameter("...", span));
        }

        let name = match self.peek() {
            Some(t) if t.kind.is_identifier_like() => t.text.clone(),
            _ => {
                self.expected("parameter name");
                return None;
            }
        };
        self.pos += 1;

        let type_annotation = if typed && self.eat(TokenKind::Colon) {
            self.type_expr()
        } else {
            None
        };
        let default = if self.check_operator("=") {
            self.pos += 1;
            Some(Box::new(self.expression()))
        } else {
            None
        };

        Some(Node::new(
            NodeKind::Parameter {
                name,
                type_annotation,
                default,
                variadic,
            },
            span,
        ))
    }

    pub(super) fn import_statement(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;

        let autoload = self.check_word("autoload");
        if autoload {
            self.pos += 1;
        }

        let mut module = None;
        if self.check(TokenKind::BraceOpen) {
            // `import {A, B} from 'file'`
            let start = self.pos;
            while !self.at_statement_end() && !self.check(TokenKind::BraceClose) {
                self.pos += 1;
            }
            self.eat(TokenKind::BraceClose);
            module = Some(join_tokens(&self.tokens[start..self.pos]));
        } else if !autoload
            && self.peek().is_some_and(|t| {
                t.kind == TokenKind::Identifier && t.text != "from" && !self.starts_new_line()
            })
        {
            module = self.advance().map(|t| t.text);
        }
        if module.is_some() && self.check_word("from") {
            self.pos += 1;
        }

        let path = if self.check(TokenKind::String) && !self.starts_new_line() {
            self.advance().map(|t| unquote(&t.text))
        } else {
            if autoload {
                self.expected("string path after 'autoload'");
            } else if module.is_none() {
                self.expected("import path");
            }
            None
        };

        let alias = if self.check_word("as") && !self.starts_new_line() {
            self.pos += 1;
            match self.peek() {
                Some(t) if t.kind == TokenKind::Identifier && !self.starts_new_line() => {
                    self.advance().map(|t| t.text)
                }
                _ => {
                    self.expected("identifier after 'as'");
                    None
                }
            }
        } else {
            None
        };

        Node::new(
            NodeKind::Import {
                path,
                module,
                autoload,
                alias,
            },
            token.span,
        )
    }

    fn export_statement(&mut self) -> Option<Node> {
        let token = self.advance()?;
        let exportable = self.peek().is_some_and(|t| {
            t.kind == TokenKind::Keyword
                && matches!(t.text.as_str(), "def" | "var" | "const" | "final" | "function")
        });
        if !exportable || self.starts_new_line() {
            self.expected("declaration after export");
            self.skip_line();
            return None;
        }

        let item = self.statement()?;
        Some(Node::new(
            NodeKind::Export {
                item: Box::new(item),
            },
            token.span,
        ))
    }

    // -- control flow --

    /// `if` or `elseif`; an `elseif` chain nests and the innermost
    /// `If` consumes the shared `endif`.
    fn if_statement(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let condition = Box::new(self.expression());
        let then_branch = self.block(IF_CLOSERS);

        let else_branch = match self.closer_word() {
            Some("elseif") if self.depth >= MAX_ELSEIF_DEPTH => {
                let span = self.current_span();
                self.error(DiagnosticKind::TooDeep, span);
                self.flat_elseif_chain(token.span)
            }
            Some("elseif") => {
                self.depth += 1;
                let nested = self.if_statement();
                self.depth -= 1;
                vec![nested]
            }
            Some("else") => {
                self.pos += 1;
                let branch = self.block(&["endif"]);
                self.close_block("if", &["endif"], token.span);
                branch
            }
            _ => {
                self.close_block("if", &["endif"], token.span);
                Vec::new()
            }
        };

        Node::new(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            token.span,
        )
    }

    /// Past the nesting limit the remaining `elseif` branches become
    /// sibling `If` nodes, followed by the `else` statements.
    fn flat_elseif_chain(&mut self, opener: Span) -> Vec<Node> {
        let mut branches = Vec::new();
        while self.closer_word() == Some("elseif") {
            let token = self.tokens[self.pos].clone();
            self.pos += 1;
            let condition = Box::new(self.expression());
            let then_branch = self.block(IF_CLOSERS);
            branches.push(Node::new(
                NodeKind::If {
                    condition,
                    then_branch,
                    else_branch: Vec::new(),
                },
                token.span,
            ));
        }
        if self.closer_word() == Some("else") {
            self.pos += 1;
            branches.extend(self.block(&["endif"]));
        }
        self.close_block("if", &["endif"], opener);
        branches
    }

    fn while_statement(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let condition = Box::new(self.expression());
        let body = self.block(&["endwhile"]);
        self.close_block("while", &["endwhile"], token.span);
        Node::new(NodeKind::While { condition, body }, token.span)
    }

    fn for_statement(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;

        let target = match self.peek().map(|t| t.kind) {
            Some(TokenKind::BracketOpen) => ForTarget::List(self.target_names(TokenKind::BracketClose)),
            Some(TokenKind::ParenOpen) => ForTarget::Tuple(self.target_names(TokenKind::ParenClose)),
            Some(kind) if kind.is_identifier_like() => {
                let name = self.advance().map(|t| t.text).unwrap_or_default();
                // typed loop variable: `for i: number in range(3)`
                if self.eat(TokenKind::Colon) {
                    self.type_expr();
                }
                ForTarget::Single(name)
            }
            _ => {
                self.expected("loop variable");
                ForTarget::Single(String::new())
            }
        };

        let iterable = if self.check_word("in") {
            self.pos += 1;
            Box::new(self.expression())
        } else {
            self.expected("'in'");
            let span = self.current_span();
            self.skip_line();
            Node::boxed(NodeKind::Missing, span)
        };

        let body = self.block(&["endfor"]);
        self.close_block("for", &["endfor"], token.span);

        Node::new(
            NodeKind::For {
                target,
                iterable,
                body,
            },
            token.span,
        )
    }

    /// `[a, b]` or `(k, v)` loop targets.
    fn target_names(&mut self, close: TokenKind) -> Vec<String> {
        self.pos += 1;
        let mut names = Vec::new();
        while let Some(t) = self.peek() {
            if t.kind == close || self.starts_new_line() {
                break;
            }
            if t.kind.is_identifier_like() {
                names.push(t.text.clone());
            } else if t.kind != TokenKind::Comma && t.kind != TokenKind::Semicolon {
                self.expected("identifier in loop target");
                break;
            }
            self.pos += 1;
        }
        if close == TokenKind::BracketClose {
            self.expect(close, "']'");
        } else {
            self.expect(close, "')'");
        }
        names
    }

    fn try_statement(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let body = self.block(TRY_CLOSERS);

        let mut catches = Vec::new();
        while self.closer_word() == Some("catch") {
            let catch = self.tokens[self.pos].clone();
            self.pos += 1;
            let pattern = Some(self.raw_rest(true)).filter(|p| !p.is_empty());
            let catch_body = self.block(TRY_CLOSERS);
            catches.push(Node::new(
                NodeKind::Catch {
                    pattern,
                    body: catch_body,
                },
                catch.span,
            ));
        }

        let finally = if self.closer_word() == Some("finally") {
            self.pos += 1;
            Some(self.block(&["endtry"]))
        } else {
            None
        };
        self.close_block("try", &["endtry"], token.span);

        Node::new(
            NodeKind::Try {
                body,
                catches,
                finally,
            },
            token.span,
        )
    }

    // -- assignment --

    fn let_statement(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;

        let target = if self.at_statement_end() {
            self.expected("variable name");
            Node::new(NodeKind::Missing, self.current_span())
        } else {
            let primary = self.primary();
            self.postfix(primary)
        };

        let (operator, value) = if self.check(TokenKind::Heredoc) {
            let heredoc = self.advance().map(|t| {
                Node::boxed(
                    NodeKind::Literal {
                        kind: LiteralKind::Heredoc,
                        value: t.text,
                    },
                    t.span,
                )
            });
            (Some("=<<".to_string()), heredoc)
        } else if !self.starts_new_line()
            && (self.check_operator("=") || self.check(TokenKind::CompoundOperator))
        {
            let operator = self.advance().map(|t| t.text);
            (operator, Some(Box::new(self.expression())))
        } else {
            (None, None)
        };

        Node::new(
            NodeKind::Let {
                target: Box::new(target),
                operator,
                value,
            },
            token.span,
        )
    }

    // -- commands --

    fn augroup(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let name = self.raw_rest(true);
        let body = self.block(&["augroup END"]);
        self.close_block("augroup", &["augroup END"], token.span);
        Node::new(NodeKind::Augroup { name, body }, token.span)
    }

    fn mapping(&mut self, token: &Token) -> Node {
        self.pos += 1;
        let bang = self.bang();

        let mut arguments = Vec::new();
        while let Some(next) = self.peek() {
            if self.starts_new_line()
                || next.kind != TokenKind::SpecialKey
                || !MAP_ARGUMENTS.iter().any(|a| a.eq_ignore_ascii_case(&next.text))
            {
                break;
            }
            arguments.push(next.text.clone());
            self.pos += 1;
        }

        let mut lhs = String::new();
        if self.peek().is_some() && !self.starts_new_line() {
            let start = self.pos;
            self.pos += 1;
            while self.peek().is_some() && self.touches_previous() {
                self.pos += 1;
            }
            lhs = join_tokens(&self.tokens[start..self.pos]);
        }
        let rhs = self.raw_rest(false);

        Node::new(
            NodeKind::Mapping {
                command: token.text.clone(),
                bang,
                arguments,
                lhs,
                rhs,
            },
            token.span,
        )
    }

    /// `command[!] [-attr...] Name implementation`
    fn command_definition(&mut self) -> Node {
        let token = self.tokens[self.pos].clone();
        self.pos += 1;
        let bang = self.bang();

        let mut attributes = Vec::new();
        while self.check_operator("-") && !self.starts_new_line() {
            let start = self.pos;
            self.pos += 1;
            while self.peek().is_some() && self.touches_previous() {
                self.pos += 1;
            }
            attributes.push(join_tokens(&self.tokens[start..self.pos]));
        }

        let Some(name) = self.advance_on_line().map(|t| t.text) else {
            // `command` alone lists user commands
            return Node::new(
                NodeKind::ExCommand {
                    name: token.text,
                    bang,
                    raw: attributes.join(" "),
                },
                token.span,
            );
        };
        let implementation = self.raw_rest(false);

        Node::new(
            NodeKind::CommandDefinition {
                bang,
                attributes,
                name,
                implementation,
            },
            token.span,
        )
    }

    /// A type after `:`. Records a diagnostic and returns `None` when
    /// no type is there.
    pub(super) fn type_expr(&mut self) -> Option<TypeExpr> {
        if self.depth >= MAX_DEPTH {
            let span = self.current_span();
            self.error(DiagnosticKind::TooDeep, span);
            return None;
        }
        self.depth += 1;
        let ty = self.type_expr_inner();
        self.depth -= 1;
        ty
    }

    fn type_expr_inner(&mut self) -> Option<TypeExpr> {
        let token = match self.peek() {
            Some(t)
                if matches!(t.kind, TokenKind::Identifier | TokenKind::Keyword)
                    && !self.starts_new_line() =>
            {
                t.clone()
            }
            _ => {
                self.expected("type");
                return None;
            }
        };
        self.pos += 1;

        if token.text == "func" && self.check(TokenKind::ParenOpen) && self.touches_previous() {
            self.pos += 1;
            let mut params = Vec::new();
            while !self.check(TokenKind::ParenClose) {
                // `?number` optional and `...list<any>` variadic argument types
                if self.check(TokenKind::QuestionMark) || self.check(TokenKind::Ellipsis) {
                    self.pos += 1;
                }
                params.push(self.type_expr()?);
                if !self.eat(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::ParenClose, "')'")?;
            let return_type = if self.check(TokenKind::Colon) && !self.starts_new_line() {
                self.pos += 1;
                Some(Box::new(self.type_expr()?))
            } else {
                None
            };
            return Some(TypeExpr::Func {
                params,
                return_type,
            });
        }

        if self.check_operator("<") && self.touches_previous() {
            self.pos += 1;
            let mut args = vec![self.type_expr()?];
            while self.eat(TokenKind::Comma) {
                args.push(self.type_expr()?);
            }
            if self.check_operator(">") {
                self.pos += 1;
            } else {
                self.expected("'>'");
                return None;
            }
            return Some(TypeExpr::Generic {
                base: token.text,
                args,
            });
        }

        Some(TypeExpr::Named(token.text))
    }
}

fn variadic_parameter(name: &str, span: Span) -> Node {
    Node::new(
        NodeKind::Parameter {
            name: name.to_string(),
            type_annotation: None,
            default: None,
            variadic: true,
        },
        span,
    )
}

/// Whether `token` can begin an expression statement.
fn starts_expression(token: &Token) -> bool {
    token.kind.is_identifier_like()
        || matches!(
            token.kind,
            TokenKind::Number
                | TokenKind::String
                | TokenKind::InterpolatedString
                | TokenKind::Heredoc
                | TokenKind::Regex
                | TokenKind::SpecialKey
                | TokenKind::Placeholder
                | TokenKind::Register
                | TokenKind::NamespacePrefix
                | TokenKind::HexColor
                | TokenKind::BracketOpen
                | TokenKind::BraceOpen
                | TokenKind::ParenOpen
        )
        || (token.kind == TokenKind::Operator && matches!(token.text.as_str(), "!" | "-" | "+"))
}

/// Strip one pair of surrounding quotes.
fn unquote(text: &str) -> String {
    let inner = text
        .strip_prefix('\'')
        .and_then(|t| t.strip_suffix('\''))
        .or_else(|| text.strip_prefix('"').and_then(|t| t.strip_suffix('"')));
    inner.unwrap_or(text).to_string()
}
