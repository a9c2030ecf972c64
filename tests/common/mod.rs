#![allow(dead_code)]

use vinter::{Issue, IssueKind, Linter, Node, NodeKind, Parse, Token, parse, tokenize};

pub fn parse_str(input: &str) -> Parse {
    parse(tokenize(input))
}

/// Parse `input` and assert no errors or warnings were reported.
pub fn parse_clean(input: &str) -> Node {
    let result = parse_str(input);
    assert!(
        result.is_clean(),
        "unexpected diagnostics\n--- input ---\n{input}\n--- errors ---\n{:?}\n--- warnings ---\n{:?}",
        result.errors,
        result.warnings
    );
    result.program
}

/// The initializer of `var x = <input>`.
pub fn init(input: &str) -> Node {
    let program = parse_clean(&format!("var x = {input}"));
    match &program.body()[0].kind {
        NodeKind::VariableDeclaration {
            initializer: Some(value),
            ..
        } => (**value).clone(),
        other => panic!("expected declaration, got {other:?}"),
    }
}

pub fn lint(input: &str) -> Vec<Issue> {
    Linter::default().lint(input)
}

/// Rule ids of the rule issues, in report order.
pub fn rule_ids(issues: &[Issue]) -> Vec<&str> {
    issues
        .iter()
        .filter(|i| i.kind == IssueKind::Rule)
        .filter_map(|i| i.rule.as_deref())
        .collect()
}

pub fn count_kind(issues: &[Issue], kind: IssueKind) -> usize {
    issues.iter().filter(|i| i.kind == kind).count()
}

/// Character offset of every `(line, column)` position in `input`.
fn positions(input: &str) -> Vec<(u32, u32)> {
    let mut out = Vec::with_capacity(input.len() + 1);
    let (mut line, mut column) = (1, 1);
    for ch in input.chars() {
        out.push((line, column));
        if ch == '\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    out.push((line, column));
    out
}

/// Assert that `tokens` cover `input` exactly: each token's text sits at
/// its span, tokens do not overlap, and only whitespace lies between them.
pub fn assert_covers(input: &str, tokens: &[Token]) {
    let chars: Vec<char> = input.chars().collect();
    let positions = positions(input);
    let mut cursor = 0;
    for token in tokens {
        let start = positions
            .iter()
            .position(|&p| p == (token.span.line, token.span.column))
            .unwrap_or_else(|| panic!("token {token:?} outside input {input:?}"));
        assert!(start >= cursor, "token {token:?} overlaps previous in {input:?}");
        assert!(
            chars[cursor..start]
                .iter()
                .all(|c| c.is_whitespace() || *c == '\u{feff}'),
            "non-whitespace skipped before {token:?} in {input:?}"
        );
        let len = token.text.chars().count();
        let text: String = chars[start..start + len].iter().collect();
        assert_eq!(text, token.text, "token text mismatch in {input:?}");
        cursor = start + len;
    }
    assert!(
        chars[cursor..]
            .iter()
            .all(|c| c.is_whitespace() || *c == '\u{feff}'),
        "trailing input not covered in {input:?}"
    );
}

/// A realistic Vim9 plugin file with no lint issues.
pub const CLEAN_PLUGIN: &str = r#"vim9script
# Buffer utilities.

import autoload 'buftools.vim'

const DEFAULT_WIDTH = 80
var history: list<string> = []
final cache: dict<number> = {}

export def Width(bufnr: number): number
  var width: number = getbufvar(bufnr, '&textwidth')
  return width > 0 ? width : DEFAULT_WIDTH
enddef

def Remember(entry: string, ...rest: list<string>): void
  history->add(entry)
  for item in rest
    if item =~# '^\s*$'
      continue
    elseif has_key(cache, item)
      cache[item] += 1
    else
      cache[item] = 1
    endif
  endfor
enddef

def Pick(items: list<string>): list<string>
  return items->filter((_, v) => v !=# '')->sort()
enddef

augroup BufTools
  autocmd!
  autocmd BufWritePost *.vim Remember(expand('<afile>'))
augroup END

nnoremap <silent> <leader>w <ScriptCmd>echo Width(bufnr())<CR>
command! -nargs=1 BufRemember Remember(<q-args>)
"#;
