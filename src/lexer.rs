use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::builtins::is_builtin_function;
use crate::token::{Span, Token, TokenKind};

/// Words the lexer reports as [`TokenKind::Keyword`].
static KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        // statements
        "if", "else", "elseif", "endif", "while", "endwhile", "for", "endfor", "def", "enddef",
        "function", "endfunction", "endfunc", "endf", "return", "const", "var", "final", "import",
        "export", "let", "unlet", "continue", "break", "try", "catch", "finally", "endtry",
        "throw", "vim9script", "scriptencoding", "abort",
        // unsupported declarations
        "class", "endclass", "interface", "endinterface", "enum", "endenum",
        // commands
        "echo", "echon", "echom", "echomsg", "echoerr", "echohl", "echowindow", "execute", "exe",
        "call", "autocmd", "augroup", "command", "runtime", "silent", "filter", "set", "setlocal",
        "setglobal", "syntax", "highlight", "sleep", "source", "normal", "redraw",
        // mappings
        "map", "nmap", "vmap", "xmap", "smap", "omap", "imap", "lmap", "cmap", "tmap", "noremap",
        "nnoremap", "vnoremap", "xnoremap", "snoremap", "onoremap", "inoremap", "lnoremap",
        "cnoremap", "tnoremap",
    ]
    .into_iter()
    .collect()
});

/// Whether `word` is lexed as a keyword when it stands alone.
#[must_use]
pub fn is_keyword(word: &str) -> bool {
    KEYWORDS.contains(word)
}

fn pattern(source: &str) -> Regex {
    match Regex::new(source) {
        Ok(re) => re,
        Err(err) => panic!("invalid token pattern {source:?}: {err}"),
    }
}

static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| pattern(r"^<(?:q-args|f-args|args|bang|line1|line2|count|range|reg|q-mods|mods)>"));

static SPECIAL_KEY: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"^<(?i:cr|nl|esc|tab|space|bs|del|up|down|left|right|home|end|bar|bslash|lt|gt|nop|leader|localleader|plug|sid|buffer|silent|expr|nowait|unique|script|special|cmd|enter|return|insert|pageup|pagedown|f[0-9]{1,2}|[csmad]-[^>\s]+)>",
    )
});

static NUMBER: Lazy<Regex> = Lazy::new(|| {
    pattern(
        r"^(?:0[xX][0-9A-Fa-f]+|0[oO][0-7]+|0[bB][01]+|0[zZ][0-9A-Fa-f.]+|[0-9]+(?:\.[0-9]+)?(?:[eE][+-]?[0-9]+)?(?:ms|[smh])?)",
    )
});

static HEREDOC_HEADER: Lazy<Regex> =
    Lazy::new(|| pattern(r"^=<<[ \t]*((?:(?:trim|eval)[ \t]+)*)([A-Za-z_][A-Za-z0-9_]*)[ \t]*"));

/// Scope-prefixed identifiers, most specific first.
static SCOPED: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    vec![
        (TokenKind::ScopedOption, pattern(r"^&[lg]:[A-Za-z_][A-Za-z0-9_]*")),
        (TokenKind::OptionVariable, pattern(r"^&[A-Za-z_][A-Za-z0-9_]*")),
        (TokenKind::GlobalVariable, pattern(r"^g:[A-Za-z_][A-Za-z0-9_#]*")),
        (TokenKind::ScriptLocal, pattern(r"^s:[A-Za-z_][A-Za-z0-9_#]*")),
        (TokenKind::BufferLocal, pattern(r"^b:[A-Za-z_][A-Za-z0-9_#]*")),
        (TokenKind::WindowLocal, pattern(r"^w:[A-Za-z_][A-Za-z0-9_#]*")),
        (TokenKind::TabLocal, pattern(r"^t:[A-Za-z_][A-Za-z0-9_#]*")),
        (TokenKind::ArgumentVariable, pattern(r"^a:(?:[A-Za-z_][A-Za-z0-9_]*|[0-9]+)")),
        (TokenKind::LocalVariable, pattern(r"^l:[A-Za-z_][A-Za-z0-9_]*")),
        (TokenKind::VimVariable, pattern(r"^v:[A-Za-z_][A-Za-z0-9_]*")),
        (TokenKind::EnvVariable, pattern(r"^\$[A-Za-z_][A-Za-z0-9_]*")),
    ]
});

static WORD: Lazy<Regex> = Lazy::new(|| pattern(r"^[A-Za-z_][A-Za-z0-9_#]*"));

static COMPOUND_OPERATOR: Lazy<Regex> = Lazy::new(|| pattern(r"^(?:\.\.=|\+=|-=|\*=|/=|%=|\.=)"));

static MULTI_CHAR_OPERATOR: Lazy<Regex> = Lazy::new(|| {
    pattern(r"^(?:==[#?]|=~[#?]|!~[#?]|!=[#?]|>=[#?]|<=[#?]|==|!=|=~|!~|>=|<=|=>|->|\.\.|\|\||&&|\?\?)")
});

/// Remaining token kinds, tried in order; first match wins.
static TOKEN_TABLE: Lazy<Vec<(TokenKind, Regex)>> = Lazy::new(|| {
    vec![
        (TokenKind::HexColor, pattern(r"^#[0-9A-Fa-f]{6}\b")),
        (TokenKind::Register, pattern(r#"^@[A-Za-z0-9":.%#=*+~_/\-]"#)),
        (TokenKind::BraceOpen, pattern(r"^#\{")),
        (TokenKind::Comment, pattern(r"^#[^\r\n]*")),
        (TokenKind::BraceOpen, pattern(r"^\{")),
        (TokenKind::BraceClose, pattern(r"^\}")),
        (TokenKind::ParenOpen, pattern(r"^\(")),
        (TokenKind::ParenClose, pattern(r"^\)")),
        (TokenKind::BracketOpen, pattern(r"^\[")),
        (TokenKind::BracketClose, pattern(r"^\]")),
        (TokenKind::Colon, pattern(r"^:")),
        (TokenKind::Semicolon, pattern(r"^;")),
        (TokenKind::Comma, pattern(r"^,")),
        (TokenKind::QuestionMark, pattern(r"^\?")),
        (TokenKind::Bar, pattern(r"^\|")),
        (TokenKind::Operator, pattern(r"^[+\-*/=%<>!&.]")),
    ]
});

const PATTERN_KEYWORDS: &[&str] = &["syntax", "catch", "filter"];
const PATTERN_IDENTIFIERS: &[&str] = &["match", "region", "keyword"];
const MATCH_OPERATORS: &[&str] = &["=~", "!~", "=~#", "!~#", "=~?", "!~?"];

/// Tokenize Vim9 script source text.
///
/// Never fails: characters no rule accepts become
/// [`TokenKind::Unknown`] tokens. Whitespace is skipped, so the
/// concatenated token texts plus the skipped whitespace reproduce
/// `input` exactly.
#[must_use]
pub fn tokenize(input: &str) -> Vec<Token> {
    Lexer::new(input).tokenize()
}

fn is_blank(ch: char) -> bool {
    ch.is_whitespace() || ch == '\u{feff}'
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: u32,
    col: u32,
    tokens: Vec<Token>,
    /// Brackets opened and not yet closed; newlines inside them do not
    /// start a new logical line.
    brackets: usize,
}

impl<'a> Lexer<'a> {
    const fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            line: 1,
            col: 1,
            tokens: Vec::new(),
            brackets: 0,
        }
    }

    fn tokenize(mut self) -> Vec<Token> {
        while let Some(ch) = self.peek() {
            if is_blank(ch) {
                self.advance_over(ch.len_utf8());
                continue;
            }

            let (kind, len) = self.next_token(ch);
            self.emit(kind, len);
        }

        tracing::trace!(count = self.tokens.len(), "tokenized");
        self.tokens
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Decide the kind and byte length of the token starting at the
    /// cursor. The length is always at least one character.
    fn next_token(&self, ch: char) -> (TokenKind, usize) {
        self.line_comment()
            .or_else(|| self.interpolated_string())
            .or_else(|| self.plain_string())
            .or_else(|| self.fixed_form())
            .or_else(|| self.scoped_identifier())
            .or_else(|| self.word())
            .or_else(|| self.operator())
            .or_else(|| self.regex_literal())
            .or_else(|| self.table_entry())
            .unwrap_or((TokenKind::Unknown, ch.len_utf8()))
    }

    fn emit(&mut self, kind: TokenKind, len: usize) {
        let text = self.rest()[..len].to_string();
        let span = Span::new(self.line, self.col);
        self.advance_over(len);
        match kind {
            TokenKind::ParenOpen | TokenKind::BracketOpen | TokenKind::BraceOpen => {
                self.brackets += 1;
            }
            TokenKind::ParenClose | TokenKind::BracketClose | TokenKind::BraceClose => {
                self.brackets = self.brackets.saturating_sub(1);
            }
            _ => {}
        }
        self.tokens.push(Token { kind, text, span });
    }

    fn advance_over(&mut self, len: usize) {
        for ch in self.input[self.pos..self.pos + len].chars() {
            if ch == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        self.pos += len;
    }

    /// Only spaces and tabs lie between the previous newline and the
    /// cursor.
    fn at_line_start(&self) -> bool {
        self.input[..self.pos]
            .chars()
            .rev()
            .take_while(|c| *c != '\n')
            .all(|c| c == ' ' || c == '\t' || c == '\u{feff}')
    }

    /// A `"` comment opens a logical line: not inside brackets, not
    /// after a `\` continuation.
    fn line_comment(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        if !rest.starts_with('"')
            || self.brackets > 0
            || self
                .tokens
                .last()
                .is_some_and(|t| t.kind == TokenKind::LineContinuation)
            || !self.at_line_start()
        {
            return None;
        }
        let len = rest.find(&['\n', '\r'][..]).unwrap_or(rest.len());
        Some((TokenKind::Comment, len))
    }

    fn interpolated_string(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        let quote = if rest.starts_with("$'") {
            '\''
        } else if rest.starts_with("$\"") {
            '"'
        } else {
            return None;
        };

        let mut depth = 0usize;
        let mut chars = rest.char_indices().skip(2).peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' if quote == '"' => {
                    chars.next();
                }
                '{' if depth == 0 && chars.peek().map(|(_, n)| *n) == Some('{') => {
                    chars.next();
                }
                '}' if depth == 0 && chars.peek().map(|(_, n)| *n) == Some('}') => {
                    chars.next();
                }
                '{' => depth += 1,
                '}' if depth > 0 => depth -= 1,
                '\n' if depth == 0 => return Some((TokenKind::InterpolatedString, i)),
                c if c == quote && depth == 0 => {
                    if quote == '\'' && chars.peek().map(|(_, n)| *n) == Some('\'') {
                        chars.next();
                    } else {
                        return Some((TokenKind::InterpolatedString, i + 1));
                    }
                }
                _ => {}
            }
        }
        Some((TokenKind::InterpolatedString, rest.len()))
    }

    fn plain_string(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        let quote = rest.chars().next().filter(|c| *c == '\'' || *c == '"')?;

        let mut chars = rest.char_indices().skip(1).peekable();
        while let Some((i, c)) = chars.next() {
            match c {
                '\n' | '\r' => return Some((TokenKind::String, i)),
                '\\' if quote == '"' => {
                    if chars.peek().is_some_and(|(_, n)| *n != '\n' && *n != '\r') {
                        chars.next();
                    }
                }
                c if c == quote => {
                    if chars.peek().map(|(_, n)| *n) == Some(quote) {
                        chars.next();
                    } else {
                        return Some((TokenKind::String, i + 1));
                    }
                }
                _ => {}
            }
        }
        Some((TokenKind::String, rest.len()))
    }

    fn fixed_form(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        if let Some(len) = self.heredoc() {
            return Some((TokenKind::Heredoc, len));
        }
        if let Some(m) = PLACEHOLDER.find(rest) {
            return Some((TokenKind::Placeholder, m.end()));
        }
        if let Some(m) = SPECIAL_KEY.find(rest) {
            return Some((TokenKind::SpecialKey, m.end()));
        }
        if rest.starts_with('\\') {
            return Some((TokenKind::LineContinuation, 1));
        }
        NUMBER.find(rest).map(|m| (TokenKind::Number, m.end()))
    }

    /// `=<< [trim] [eval] MARKER` followed by lines up to one holding
    /// only the marker. Without a closing marker the literal runs to
    /// the end of input.
    fn heredoc(&self) -> Option<usize> {
        let rest = self.rest();
        let caps = HEREDOC_HEADER.captures(rest)?;
        let header_end = caps.get(0)?.end();
        let marker = caps.get(2)?.as_str();

        let after_header = &rest[header_end..];
        let line_end = after_header.find('\n');
        let header_tail = &after_header[..line_end.unwrap_or(after_header.len())];
        if !header_tail.trim().is_empty() {
            return None;
        }

        let Some(first_newline) = line_end else {
            return Some(rest.len());
        };

        let mut offset = header_end + first_newline + 1;
        while offset < rest.len() {
            let line = &rest[offset..];
            let len = line.find('\n').unwrap_or(line.len());
            let text = line[..len].trim_end_matches('\r');
            if text.trim_start() == marker {
                return Some(offset + text.len());
            }
            offset += len + 1;
        }
        Some(rest.len())
    }

    fn scoped_identifier(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        for (kind, re) in SCOPED.iter() {
            if let Some(m) = re.find(rest) {
                return Some((*kind, m.end()));
            }
        }

        // bare scope dictionary: `g:` in `get(g:, 'name')`
        let mut chars = rest.chars();
        let scope = chars.next()?;
        if "gbwtvsl".contains(scope) && chars.next() == Some(':') {
            match chars.next() {
                None | Some(',' | ')' | ']') => return Some((TokenKind::NamespacePrefix, 2)),
                _ => {}
            }
        }
        None
    }

    fn word(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        let m = WORD.find(rest)?;
        let word = m.as_str();
        if !is_keyword(word) {
            return Some((TokenKind::Identifier, m.end()));
        }

        // A keyword that names a built-in function and is called as one
        // is an ordinary identifier: `filter(items, ...)`, `function ('Name')`.
        let after = &rest[m.end()..];
        let called = if word == "function" {
            after.trim_start_matches(&[' ', '\t'][..]).starts_with('(')
        } else {
            after.starts_with('(')
        };
        if called && is_builtin_function(word) {
            Some((TokenKind::Identifier, m.end()))
        } else {
            Some((TokenKind::Keyword, m.end()))
        }
    }

    fn operator(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        if let Some(m) = COMPOUND_OPERATOR.find(rest) {
            return Some((TokenKind::CompoundOperator, m.end()));
        }
        if rest.starts_with("...") {
            return Some((TokenKind::Ellipsis, 3));
        }
        MULTI_CHAR_OPERATOR
            .find(rest)
            .map(|m| (TokenKind::Operator, m.end()))
    }

    /// Whether the recently emitted tokens put the cursor in a pattern
    /// context, where `/` opens a regex instead of dividing.
    fn expects_pattern(&self) -> bool {
        self.tokens.iter().rev().take(3).any(|t| match t.kind {
            TokenKind::Keyword => PATTERN_KEYWORDS.contains(&t.text.as_str()),
            TokenKind::Identifier => PATTERN_IDENTIFIERS.contains(&t.text.as_str()),
            TokenKind::Operator => MATCH_OPERATORS.contains(&t.text.as_str()),
            _ => false,
        })
    }

    fn regex_literal(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        if !rest.starts_with('/') || !self.expects_pattern() {
            return None;
        }

        let mut escaped = false;
        for (i, c) in rest.char_indices().skip(1) {
            match c {
                '\n' | '\r' => return None,
                '\\' if !escaped => escaped = true,
                '/' if !escaped => return Some((TokenKind::Regex, i + 1)),
                _ => escaped = false,
            }
        }
        None
    }

    fn table_entry(&self) -> Option<(TokenKind, usize)> {
        let rest = self.rest();
        TOKEN_TABLE
            .iter()
            .find_map(|(kind, re)| re.find(rest).map(|m| (*kind, m.end())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        tokenize(input).into_iter().map(|t| t.kind).collect()
    }

    fn texts(input: &str) -> Vec<String> {
        tokenize(input).into_iter().map(|t| t.text).collect()
    }

    #[test]
    fn keywords() {
        let tokens = tokenize("if while def vim9script");
        assert_eq!(tokens.len(), 4);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Keyword));
        assert_eq!(tokens[3].text, "vim9script");
    }

    #[test]
    fn identifiers() {
        let tokens = tokenize("myVar _test Function#1");
        assert_eq!(tokens.len(), 3);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Identifier));
        assert_eq!(tokens[2].text, "Function#1");
    }

    #[test]
    fn operators() {
        let tokens = tokenize("+ - * / == != => ->");
        assert_eq!(tokens.len(), 8);
        assert!(tokens.iter().all(|t| t.kind == TokenKind::Operator));
        assert_eq!(tokens[6].text, "=>");
        assert_eq!(tokens[7].text, "->");
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(texts("a ==# b"), ["a", "==#", "b"]);
        assert_eq!(texts("a !~? b"), ["a", "!~?", "b"]);
        assert_eq!(texts("s ..= 'x'"), ["s", "..=", "'x'"]);
    }

    #[test]
    fn strings_keep_quotes() {
        let tokens = tokenize("'single quoted' \"double quoted\"");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::String);
        assert_eq!(tokens[0].text, "'single quoted'");
        assert_eq!(tokens[1].text, "\"double quoted\"");
    }

    #[test]
    fn doubled_quote_escape() {
        assert_eq!(texts("echo 'it''s'"), ["echo", "'it''s'"]);
        assert_eq!(texts(r#"echo "say \"hi\"""#), ["echo", r#""say \"hi\"""#]);
    }

    #[test]
    fn unterminated_string_stops_at_line_end() {
        let tokens = tokenize("echo 'oops\nvar x = 1");
        assert_eq!(tokens[1].text, "'oops");
        assert_eq!(tokens[2].text, "var");
        assert_eq!(tokens[2].span, Span::new(2, 1));
    }

    #[test]
    fn hash_comment() {
        let tokens = tokenize("var x = 10 # This is a comment");
        assert_eq!(tokens.len(), 5);
        assert_eq!(tokens[4].kind, TokenKind::Comment);
        assert_eq!(tokens[4].text, "# This is a comment");
    }

    #[test]
    fn quote_comment_only_at_line_start() {
        let tokens = tokenize("  \" legacy comment\necho \"text\"");
        assert_eq!(tokens[0].kind, TokenKind::Comment);
        assert_eq!(tokens[0].text, "\" legacy comment");
        assert_eq!(tokens[2].kind, TokenKind::String);
    }

    #[test]
    fn quote_inside_open_list_is_a_string() {
        let tokens = tokenize("var names = [\n  \"alice\",\n  \"bob\",\n]\n\" done");
        let strings: Vec<&str> = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::String)
            .map(|t| t.text.as_str())
            .collect();
        assert_eq!(strings, ["\"alice\"", "\"bob\""]);
        let last = tokens.last().expect("tokens");
        assert_eq!(last.kind, TokenKind::Comment);
        assert_eq!(last.span, Span::new(5, 1));
    }

    #[test]
    fn quote_inside_open_dict_is_a_string() {
        let tokens = tokenize("var d = {\n  \"k\": \"v\",\n}");
        assert_eq!(
            kinds("var d = {\n  \"k\": \"v\",\n}"),
            [
                TokenKind::Keyword,
                TokenKind::Identifier,
                TokenKind::Operator,
                TokenKind::BraceOpen,
                TokenKind::String,
                TokenKind::Colon,
                TokenKind::String,
                TokenKind::Comma,
                TokenKind::BraceClose,
            ]
        );
        assert_eq!(tokens[4].span, Span::new(2, 3));
    }

    #[test]
    fn interpolated_string_tracks_braces() {
        let tokens = tokenize("echo $'{x ? 'a' : 'b'} done' .. y");
        assert_eq!(tokens[1].kind, TokenKind::InterpolatedString);
        assert_eq!(tokens[1].text, "$'{x ? 'a' : 'b'} done'");
        assert_eq!(tokens[2].text, "..");
    }

    #[test]
    fn scoped_identifiers() {
        assert_eq!(
            kinds("g:x s:y b:z w:a t:b a:c l:d v:true &tw &l:sw $HOME"),
            [
                TokenKind::GlobalVariable,
                TokenKind::ScriptLocal,
                TokenKind::BufferLocal,
                TokenKind::WindowLocal,
                TokenKind::TabLocal,
                TokenKind::ArgumentVariable,
                TokenKind::LocalVariable,
                TokenKind::VimVariable,
                TokenKind::OptionVariable,
                TokenKind::ScopedOption,
                TokenKind::EnvVariable,
            ]
        );
    }

    #[test]
    fn argument_count_variables() {
        assert_eq!(
            kinds("a:000 a:1"),
            [TokenKind::ArgumentVariable, TokenKind::ArgumentVariable]
        );
    }

    #[test]
    fn namespace_prefix_as_dictionary() {
        let tokens = tokenize("get(g:, 'name', 1)");
        assert_eq!(tokens[2].kind, TokenKind::NamespacePrefix);
        assert_eq!(tokens[2].text, "g:");
    }

    #[test]
    fn builtin_keyword_called_as_function() {
        let tokens = tokenize("filter(list, (k, v) => v > 0)");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
        let tokens = tokenize("filter /pat/ ls");
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
        let tokens = tokenize("function ('Name')");
        assert_eq!(tokens[0].kind, TokenKind::Identifier);
    }

    #[test]
    fn regex_only_in_pattern_context() {
        let tokens = tokenize("syntax match Foo /bar/");
        assert_eq!(tokens[3].kind, TokenKind::Regex);
        assert_eq!(tokens[3].text, "/bar/");

        let tokens = tokenize("var half = total / 2 / 3");
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Regex));
    }

    #[test]
    fn numbers() {
        assert_eq!(
            texts("0x1F 0o17 0b101 3.14 1e10 100ms"),
            ["0x1F", "0o17", "0b101", "3.14", "1e10", "100ms"]
        );
        assert!(kinds("0x1F 3.14 100ms").iter().all(|k| *k == TokenKind::Number));
    }

    #[test]
    fn special_keys_and_placeholders() {
        assert_eq!(
            kinds("<silent> <C-w> <CR> <q-args> <SID>"),
            [
                TokenKind::SpecialKey,
                TokenKind::SpecialKey,
                TokenKind::SpecialKey,
                TokenKind::Placeholder,
                TokenKind::SpecialKey,
            ]
        );
    }

    #[test]
    fn heredoc_spans_lines() {
        let input = "var lines =<< trim END\n  one\n  two\n  END\necho lines";
        let tokens = tokenize(input);
        assert_eq!(tokens[2].kind, TokenKind::Heredoc);
        assert_eq!(tokens[2].text, "=<< trim END\n  one\n  two\n  END");
        assert_eq!(tokens[3].text, "echo");
        assert_eq!(tokens[3].span, Span::new(5, 1));
    }

    #[test]
    fn line_continuation() {
        let tokens = tokenize("call Foo(1,\n      \\ 2)");
        let cont = tokens
            .iter()
            .find(|t| t.kind == TokenKind::LineContinuation)
            .expect("continuation token");
        assert_eq!(cont.span, Span::new(2, 7));
    }

    #[test]
    fn unknown_characters_make_progress() {
        let tokens = tokenize("var x = 1 ` ~");
        assert_eq!(tokens[4].kind, TokenKind::Unknown);
        assert_eq!(tokens[4].text, "`");
        assert_eq!(tokens[5].kind, TokenKind::Unknown);
    }

    #[test]
    fn span_tracking() {
        let tokens = tokenize("a\nb c");
        assert_eq!(tokens[0].span, Span::new(1, 1));
        assert_eq!(tokens[1].span, Span::new(2, 1));
        assert_eq!(tokens[2].span, Span::new(2, 3));
    }

    #[test]
    fn columns_count_characters() {
        let tokens = tokenize("echo 'héllo' x");
        assert_eq!(tokens[2].span, Span::new(1, 14));
    }

    #[test]
    fn bom_is_skipped() {
        let tokens = tokenize("\u{FEFF}vim9script");
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].kind, TokenKind::Keyword);
    }
}
