use crate::token::Span;

/// A syntax tree node: what it is, and where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

/// Every syntactic form the parser produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    /// Root of a parsed file.
    Program { body: Vec<Node> },

    // -- declarations --
    /// `vim9script [noclear]`
    Vim9Script,
    /// `var`, `const`, or `final` declaration.
    VariableDeclaration {
        keyword: DeclarationKind,
        name: String,
        type_annotation: Option<TypeExpr>,
        initializer: Option<Box<Node>>,
    },
    /// `def Name(params): type ... enddef`
    DefFunction {
        name: String,
        params: Vec<Node>,
        return_type: Option<TypeExpr>,
        body: Vec<Node>,
    },
    /// `function[!] Name(params) [attributes] ... endfunction`
    LegacyFunction {
        name: String,
        bang: bool,
        params: Vec<Node>,
        attributes: Vec<String>,
        body: Vec<Node>,
    },
    /// A function or lambda parameter.
    Parameter {
        name: String,
        type_annotation: Option<TypeExpr>,
        default: Option<Box<Node>>,
        variadic: bool,
    },
    /// `import [autoload] 'path' [as Name]`
    Import {
        path: Option<String>,
        module: Option<String>,
        autoload: bool,
        alias: Option<String>,
    },
    /// `export <declaration>`
    Export { item: Box<Node> },

    // -- control flow --
    /// `if`/`elseif`/`else`/`endif`. An `elseif` is an `If` that is
    /// the only statement of `else_branch`.
    If {
        condition: Box<Node>,
        then_branch: Vec<Node>,
        else_branch: Vec<Node>,
    },
    While {
        condition: Box<Node>,
        body: Vec<Node>,
    },
    For {
        target: ForTarget,
        iterable: Box<Node>,
        body: Vec<Node>,
    },
    Try {
        body: Vec<Node>,
        catches: Vec<Node>,
        finally: Option<Vec<Node>>,
    },
    /// `catch [pattern]`; the pattern is kept as written.
    Catch {
        pattern: Option<String>,
        body: Vec<Node>,
    },
    Throw { value: Box<Node> },
    Return { value: Option<Box<Node>> },
    Break,
    Continue,

    // -- assignment --
    /// Legacy `let target = value`, `let target += value`, or bare `let name`.
    Let {
        target: Box<Node>,
        operator: Option<String>,
        value: Option<Box<Node>>,
    },
    /// Modern `target = value` or `target += value`.
    Assignment {
        target: Box<Node>,
        operator: String,
        value: Box<Node>,
    },

    // -- expressions --
    Literal { kind: LiteralKind, value: String },
    Identifier { scope: Scope, name: String },
    /// A bare scope dictionary such as `g:`.
    ScopeDict { scope: Scope },
    /// Register access `@a`.
    Register { name: String },
    Binary {
        operator: String,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary { operator: String, operand: Box<Node> },
    Ternary {
        condition: Box<Node>,
        then_expr: Box<Node>,
        else_expr: Box<Node>,
    },
    /// `{ ... }` statement block: a scope of its own, or a lambda body.
    Block { body: Vec<Node> },
    /// `(params): type => body`, or legacy `{params -> body}`.
    Lambda {
        params: Vec<Node>,
        return_type: Option<TypeExpr>,
        body: Box<Node>,
        legacy: bool,
    },
    /// Call of a named function; `builtin` marks Vim built-ins.
    FunctionCall {
        name: String,
        arguments: Vec<Node>,
        builtin: bool,
    },
    /// Call of any other callee expression, e.g. `Handlers[0](x)`.
    Call { callee: Box<Node>, arguments: Vec<Node> },
    /// `function('Name')`, `funcref({...})`: a reference, not a call.
    FunctionReference {
        function: String,
        target: Box<Node>,
        arguments: Vec<Node>,
    },
    /// `object->method(args)`
    MethodCall {
        object: Box<Node>,
        method: String,
        arguments: Vec<Node>,
    },
    /// `object.property`
    PropertyAccess { object: Box<Node>, property: String },
    /// `object[index]`
    Index { object: Box<Node>, index: Box<Node> },
    /// `object[start : end]`, either bound optional.
    Slice {
        object: Box<Node>,
        start: Option<Box<Node>>,
        end: Option<Box<Node>>,
    },
    List { elements: Vec<Node> },
    /// Entries in source order; duplicate keys are kept.
    Dict { entries: Vec<DictEntry> },
    /// Two list literals written back to back: `[1, 2][3, 4]`.
    ListConcat { left: Box<Node>, right: Box<Node> },
    /// Placeholder for an expression that failed to parse.
    Missing,

    // -- commands --
    /// `echo`, `echon`, `echom`, `echomsg`, `echoerr`, `echowindow`
    Echo { command: String, arguments: Vec<Node> },
    /// `execute expr...`
    Execute { arguments: Vec<Node> },
    /// Legacy `call Func(args)`.
    CallStatement { expression: Box<Node> },
    /// `autocmd[!] ...`, kept as written.
    Autocmd { bang: bool, raw: String },
    /// `augroup Name ... augroup END`
    Augroup { name: String, body: Vec<Node> },
    /// `nnoremap <silent> lhs rhs` and friends. `rhs` is opaque.
    Mapping {
        command: String,
        bang: bool,
        arguments: Vec<String>,
        lhs: String,
        rhs: String,
    },
    /// `command[!] -attr Name implementation`. `implementation` is opaque.
    CommandDefinition {
        bang: bool,
        attributes: Vec<String>,
        name: String,
        implementation: String,
    },
    /// `filter[!] pattern command`
    Filter {
        bang: bool,
        pattern: String,
        command: Option<Box<Node>>,
    },
    /// `runtime[!] ...`
    Runtime { bang: bool, raw: String },
    /// `silent[!] command`
    Silent {
        bang: bool,
        command: Option<Box<Node>>,
    },
    /// Any other recognised Ex command (`set`, `highlight`, ...), kept raw.
    ExCommand {
        name: String,
        bang: bool,
        raw: String,
    },
    ExpressionStatement { expression: Box<Node> },
    Comment { text: String },
    /// A closing keyword (`endif`, `endfor`, ...) with nothing open to close.
    BlockEnd { keyword: String },
}

/// `var`, `const`, or `final`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclarationKind {
    Var,
    Const,
    Final,
}

impl DeclarationKind {
    #[must_use]
    pub fn from_keyword(word: &str) -> Option<Self> {
        match word {
            "var" => Some(Self::Var),
            "const" => Some(Self::Const),
            "final" => Some(Self::Final),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Var => "var",
            Self::Const => "const",
            Self::Final => "final",
        }
    }
}

/// Variable scope encoded in an identifier's prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// No prefix.
    Unscoped,
    Global,
    Script,
    Buffer,
    Window,
    Tab,
    Argument,
    Local,
    Vim,
    /// `&name`, `&l:name`, `&g:name`
    Option,
    /// `$NAME`
    Environment,
}

impl Scope {
    /// Scope named by a one-letter prefix (`g`, `s`, ...).
    #[must_use]
    pub const fn from_prefix(prefix: char) -> Option<Self> {
        match prefix {
            'g' => Some(Self::Global),
            's' => Some(Self::Script),
            'b' => Some(Self::Buffer),
            'w' => Some(Self::Window),
            't' => Some(Self::Tab),
            'a' => Some(Self::Argument),
            'l' => Some(Self::Local),
            'v' => Some(Self::Vim),
            _ => None,
        }
    }
}

/// Literal value category. `value` keeps the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Number,
    String,
    InterpolatedString,
    Regex,
    Heredoc,
    /// `true`, `false`, `v:true`, ...
    Boolean,
    /// `null` and the typed `null_*` values.
    Null,
    /// Key notation or command placeholder used as a value.
    KeyNotation,
    HexColor,
}

/// A dictionary entry. Keys keep their source text (`'name'`, `name`,
/// `[expr]`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictEntry {
    pub key: String,
    pub value: Node,
}

/// Looks up `key` in dictionary entries. Later entries shadow earlier
/// ones, matching how Vim evaluates a literal with repeated keys.
#[must_use]
pub fn dict_lookup<'a>(entries: &'a [DictEntry], key: &str) -> Option<&'a Node> {
    entries.iter().rev().find(|e| e.key == key).map(|e| &e.value)
}

/// Loop variable(s) of a `for` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ForTarget {
    /// `for item in items`
    Single(String),
    /// `for [a, b] in pairs`
    List(Vec<String>),
    /// `for (key, value) in items(dict)`
    Tuple(Vec<String>),
}

/// A type annotation such as `number`, `list<string>`, or
/// `func(number): bool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeExpr {
    Named(String),
    Generic { base: String, args: Vec<TypeExpr> },
    Func {
        params: Vec<TypeExpr>,
        return_type: Option<Box<TypeExpr>>,
    },
}

impl std::fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Named(name) => write!(f, "{name}"),
            Self::Generic { base, args } => {
                write!(f, "{base}<")?;
                write_joined(f, args)?;
                write!(f, ">")
            }
            Self::Func {
                params,
                return_type,
            } => {
                write!(f, "func(")?;
                write_joined(f, params)?;
                write!(f, ")")?;
                if let Some(ret) = return_type {
                    write!(f, ": {ret}")?;
                }
                Ok(())
            }
        }
    }
}

fn write_joined(f: &mut std::fmt::Formatter<'_>, types: &[TypeExpr]) -> std::fmt::Result {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{ty}")?;
    }
    Ok(())
}

impl Node {
    #[must_use]
    pub const fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }

    /// Boxed form, for child positions.
    #[must_use]
    pub fn boxed(kind: NodeKind, span: Span) -> Box<Self> {
        Box::new(Self::new(kind, span))
    }

    /// Direct children in source order.
    #[must_use]
    pub fn children(&self) -> Vec<&Self> {
        let mut out = Vec::new();
        match &self.kind {
            NodeKind::Program { body }
            | NodeKind::Block { body }
            | NodeKind::Augroup { body, .. }
            | NodeKind::Catch { body, .. } => out.extend(body),
            NodeKind::VariableDeclaration { initializer, .. } => out.extend(initializer.as_deref()),
            NodeKind::DefFunction { params, body, .. }
            | NodeKind::LegacyFunction { params, body, .. } => {
                out.extend(params);
                out.extend(body);
            }
            NodeKind::Parameter { default, .. } => out.extend(default.as_deref()),
            NodeKind::Export { item } => out.push(item),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(condition);
                out.extend(then_branch);
                out.extend(else_branch);
            }
            NodeKind::While { condition, body } => {
                out.push(condition);
                out.extend(body);
            }
            NodeKind::For { iterable, body, .. } => {
                out.push(iterable);
                out.extend(body);
            }
            NodeKind::Try {
                body,
                catches,
                finally,
            } => {
                out.extend(body);
                out.extend(catches);
                out.extend(finally.iter().flatten());
            }
            NodeKind::Throw { value }
            | NodeKind::Unary { operand: value, .. }
            | NodeKind::ExpressionStatement { expression: value }
            | NodeKind::CallStatement { expression: value }
            | NodeKind::PropertyAccess { object: value, .. } => out.push(value),
            NodeKind::Return { value } => out.extend(value.as_deref()),
            NodeKind::Let { target, value, .. } => {
                out.push(target);
                out.extend(value.as_deref());
            }
            NodeKind::Assignment { target, value, .. } => {
                out.push(target);
                out.push(value);
            }
            NodeKind::Binary { left, right, .. } | NodeKind::ListConcat { left, right } => {
                out.push(left);
                out.push(right);
            }
            NodeKind::Ternary {
                condition,
                then_expr,
                else_expr,
            } => {
                out.push(condition);
                out.push(then_expr);
                out.push(else_expr);
            }
            NodeKind::Lambda { params, body, .. } => {
                out.extend(params);
                out.push(body);
            }
            NodeKind::FunctionCall { arguments, .. }
            | NodeKind::Echo { arguments, .. }
            | NodeKind::Execute { arguments } => out.extend(arguments),
            NodeKind::Call { callee, arguments } => {
                out.push(callee);
                out.extend(arguments);
            }
            NodeKind::FunctionReference {
                target, arguments, ..
            } => {
                out.push(target);
                out.extend(arguments);
            }
            NodeKind::MethodCall {
                object, arguments, ..
            } => {
                out.push(object);
                out.extend(arguments);
            }
            NodeKind::Index { object, index } => {
                out.push(object);
                out.push(index);
            }
            NodeKind::Slice { object, start, end } => {
                out.push(object);
                out.extend(start.as_deref());
                out.extend(end.as_deref());
            }
            NodeKind::List { elements } => out.extend(elements),
            NodeKind::Dict { entries } => out.extend(entries.iter().map(|e| &e.value)),
            NodeKind::Filter { command, .. } | NodeKind::Silent { command, .. } => {
                out.extend(command.as_deref());
            }
            NodeKind::Vim9Script
            | NodeKind::Import { .. }
            | NodeKind::Break
            | NodeKind::Continue
            | NodeKind::Literal { .. }
            | NodeKind::Identifier { .. }
            | NodeKind::ScopeDict { .. }
            | NodeKind::Register { .. }
            | NodeKind::Missing
            | NodeKind::Autocmd { .. }
            | NodeKind::Mapping { .. }
            | NodeKind::CommandDefinition { .. }
            | NodeKind::Runtime { .. }
            | NodeKind::ExCommand { .. }
            | NodeKind::Comment { .. }
            | NodeKind::BlockEnd { .. } => {}
        }
        out
    }

    /// Pre-order traversal: `visit` sees this node, then every
    /// descendant, children in source order. Uses an explicit stack, so
    /// tree depth is not bounded by the call stack.
    pub fn walk<'a>(&'a self, visit: &mut dyn FnMut(&'a Self)) {
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            visit(node);
            stack.extend(node.children().into_iter().rev());
        }
    }

    /// Every node in this subtree, in pre-order, for which `predicate`
    /// holds.
    #[must_use]
    pub fn collect<'a>(&'a self, predicate: impl Fn(&Self) -> bool) -> Vec<&'a Self> {
        let mut found = Vec::new();
        self.walk(&mut |node| {
            if predicate(node) {
                found.push(node);
            }
        });
        found
    }

    /// Top-level statements when this is a `Program`, otherwise empty.
    #[must_use]
    pub fn body(&self) -> &[Self] {
        match &self.kind {
            NodeKind::Program { body } => body,
            _ => &[],
        }
    }

    /// Short name of this node's kind, for diagnostics and dumps.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match &self.kind {
            NodeKind::Program { .. } => "program",
            NodeKind::Vim9Script => "vim9script",
            NodeKind::VariableDeclaration { .. } => "variable_declaration",
            NodeKind::DefFunction { .. } => "def_function",
            NodeKind::LegacyFunction { .. } => "legacy_function",
            NodeKind::Parameter { .. } => "parameter",
            NodeKind::Import { .. } => "import",
            NodeKind::Export { .. } => "export",
            NodeKind::If { .. } => "if",
            NodeKind::While { .. } => "while",
            NodeKind::For { .. } => "for",
            NodeKind::Try { .. } => "try",
            NodeKind::Catch { .. } => "catch",
            NodeKind::Throw { .. } => "throw",
            NodeKind::Return { .. } => "return",
            NodeKind::Break => "break",
            NodeKind::Continue => "continue",
            NodeKind::Let { .. } => "let",
            NodeKind::Assignment { .. } => "assignment",
            NodeKind::Literal { .. } => "literal",
            NodeKind::Identifier { .. } => "identifier",
            NodeKind::ScopeDict { .. } => "scope_dict",
            NodeKind::Register { .. } => "register",
            NodeKind::Binary { .. } => "binary",
            NodeKind::Unary { .. } => "unary",
            NodeKind::Ternary { .. } => "ternary",
            NodeKind::Block { .. } => "block",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::FunctionCall { .. } => "function_call",
            NodeKind::Call { .. } => "call",
            NodeKind::FunctionReference { .. } => "function_reference",
            NodeKind::MethodCall { .. } => "method_call",
            NodeKind::PropertyAccess { .. } => "property_access",
            NodeKind::Index { .. } => "index",
            NodeKind::Slice { .. } => "slice",
            NodeKind::List { .. } => "list",
            NodeKind::Dict { .. } => "dict",
            NodeKind::ListConcat { .. } => "list_concat",
            NodeKind::Missing => "missing",
            NodeKind::Echo { .. } => "echo",
            NodeKind::Execute { .. } => "execute",
            NodeKind::CallStatement { .. } => "call_statement",
            NodeKind::Autocmd { .. } => "autocmd",
            NodeKind::Augroup { .. } => "augroup",
            NodeKind::Mapping { .. } => "mapping",
            NodeKind::CommandDefinition { .. } => "command_definition",
            NodeKind::Filter { .. } => "filter",
            NodeKind::Runtime { .. } => "runtime",
            NodeKind::Silent { .. } => "silent",
            NodeKind::ExCommand { .. } => "ex_command",
            NodeKind::ExpressionStatement { .. } => "expression_statement",
            NodeKind::Comment { .. } => "comment",
            NodeKind::BlockEnd { .. } => "block_end",
        }
    }
}
