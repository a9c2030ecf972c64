use serde::Serialize;

/// Source location for error reporting. Both fields are 1-based;
/// columns count characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    #[must_use]
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Reserved command or statement word (`if`, `def`, `nnoremap`, ...).
    Keyword,
    /// Bare word, including autoload names (`foo#bar#Baz`).
    Identifier,
    /// Scoped option `&l:tw`, `&g:tw`.
    ScopedOption,
    /// Option `&tw`.
    OptionVariable,
    /// `g:name`
    GlobalVariable,
    /// `s:name`
    ScriptLocal,
    /// `b:name`
    BufferLocal,
    /// `w:name`
    WindowLocal,
    /// `t:name`
    TabLocal,
    /// `a:name`, `a:1`, `a:000`
    ArgumentVariable,
    /// `l:name`
    LocalVariable,
    /// `v:name`
    VimVariable,
    /// `$HOME`
    EnvVariable,
    /// A bare scope dictionary such as `g:` in `get(g:, 'x')`.
    NamespacePrefix,
    Number,
    /// `'...'` or `"..."`, quotes included.
    String,
    /// `$'...{expr}...'` or `$"..."`.
    InterpolatedString,
    /// `/pattern/` in a pattern context.
    Regex,
    /// `=<< [trim] [eval] MARKER` through the closing marker line.
    Heredoc,
    /// `# ...` or a line-leading `" ...`.
    Comment,
    Operator,
    /// `+=`, `-=`, `*=`, `/=`, `%=`, `.=`, `..=`
    CompoundOperator,
    ParenOpen,
    ParenClose,
    BracketOpen,
    BracketClose,
    /// `{` or the legacy literal-dictionary opener `#{`.
    BraceOpen,
    BraceClose,
    Colon,
    Semicolon,
    Comma,
    QuestionMark,
    /// Command separator `|`.
    Bar,
    /// Key notation such as `<CR>`, `<C-w>`, `<silent>`, `<SID>`.
    SpecialKey,
    /// User command placeholders such as `<q-args>`, `<bang>`.
    Placeholder,
    /// Register access `@a`, `@"`.
    Register,
    /// `#33FF33`
    HexColor,
    /// `...`
    Ellipsis,
    /// `\` continuing the previous line.
    LineContinuation,
    /// Any character no other rule accepts.
    Unknown,
}

impl TokenKind {
    /// Whether this kind names a variable (bare or scoped).
    #[must_use]
    pub const fn is_identifier_like(self) -> bool {
        matches!(
            self,
            Self::Identifier
                | Self::ScopedOption
                | Self::OptionVariable
                | Self::GlobalVariable
                | Self::ScriptLocal
                | Self::BufferLocal
                | Self::WindowLocal
                | Self::TabLocal
                | Self::ArgumentVariable
                | Self::LocalVariable
                | Self::VimVariable
                | Self::EnvVariable
        )
    }
}

/// A single token with its kind, exact source text, and location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub span: Span,
}

impl Token {
    /// Whether this token is `kind` with exactly `text`.
    #[must_use]
    pub fn is(&self, kind: TokenKind, text: &str) -> bool {
        self.kind == kind && self.text == text
    }

    /// Whether this token is the keyword `word`.
    #[must_use]
    pub fn is_keyword(&self, word: &str) -> bool {
        self.is(TokenKind::Keyword, word)
    }

    /// Whether this token is the operator `op`.
    #[must_use]
    pub fn is_operator(&self, op: &str) -> bool {
        self.is(TokenKind::Operator, op)
    }

    /// Column just past the last character of this token, when the
    /// token does not span lines.
    #[must_use]
    pub fn end_column(&self) -> u32 {
        let width = u32::try_from(self.text.chars().count()).unwrap_or(u32::MAX);
        self.span.column.saturating_add(width)
    }

    /// Whether `next` starts exactly where this token ends, with no
    /// whitespace in between.
    #[must_use]
    pub fn touches(&self, next: &Self) -> bool {
        !self.text.contains('\n')
            && self.span.line == next.span.line
            && self.end_column() == next.span.column
    }
}
