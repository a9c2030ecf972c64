mod common;

use common::assert_covers;
use vinter::{TokenKind, tokenize};

fn kinds(input: &str) -> Vec<TokenKind> {
    tokenize(input).into_iter().map(|t| t.kind).collect()
}

#[test]
fn declaration_line() {
    let tokens = tokenize("var name: string = 'vinter'");
    let summary: Vec<(TokenKind, &str)> =
        tokens.iter().map(|t| (t.kind, t.text.as_str())).collect();
    assert_eq!(
        summary,
        [
            (TokenKind::Keyword, "var"),
            (TokenKind::Identifier, "name"),
            (TokenKind::Colon, ":"),
            (TokenKind::Identifier, "string"),
            (TokenKind::Operator, "="),
            (TokenKind::String, "'vinter'"),
        ]
    );
}

#[test]
fn def_signature() {
    assert_eq!(
        kinds("def Add(a: number, ...rest: list<number>): number"),
        [
            TokenKind::Keyword,
            TokenKind::Identifier,
            TokenKind::ParenOpen,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::Comma,
            TokenKind::Ellipsis,
            TokenKind::Identifier,
            TokenKind::Colon,
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::Identifier,
            TokenKind::Operator,
            TokenKind::ParenClose,
            TokenKind::Colon,
            TokenKind::Identifier,
        ]
    );
}

#[test]
fn compound_assignment() {
    let tokens = tokenize("count += 1\nname ..= 'x'");
    assert_eq!(tokens[1].kind, TokenKind::CompoundOperator);
    assert_eq!(tokens[1].text, "+=");
    assert_eq!(tokens[4].kind, TokenKind::CompoundOperator);
    assert_eq!(tokens[4].text, "..=");
}

#[test]
fn lambda_arrow_and_method_arrow() {
    let tokens = tokenize("items->map((_, v) => v * 2)");
    let arrows: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Operator && t.text.len() == 2)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(arrows, ["->", "=>"]);
}

#[test]
fn comment_after_code() {
    let tokens = tokenize("var x: number = 1 # the answer");
    let last = tokens.last().expect("tokens");
    assert_eq!(last.kind, TokenKind::Comment);
    assert_eq!(last.text, "# the answer");
    assert_eq!(last.span.column, 19);
}

#[test]
fn legacy_dictionary_opener() {
    let tokens = tokenize("let d = #{a: 1}");
    assert_eq!(tokens[3].kind, TokenKind::BraceOpen);
    assert_eq!(tokens[3].text, "#{");
}

#[test]
fn hex_color_is_not_a_comment() {
    let tokens = tokenize("hi Normal guifg=#33FF33");
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::HexColor));
}

#[test]
fn mapping_line_tokens() {
    let tokens = tokenize("nnoremap <silent> <leader>f :call Find()<CR>");
    assert_eq!(tokens[0].kind, TokenKind::Keyword);
    assert_eq!(tokens[1].kind, TokenKind::SpecialKey);
    assert_eq!(tokens[2].kind, TokenKind::SpecialKey);
    assert_eq!(tokens.last().map(|t| t.kind), Some(TokenKind::SpecialKey));
}

#[test]
fn spans_across_lines() {
    let tokens = tokenize("vim9script\n\n  def F(): void\n  enddef");
    let spans: Vec<(u32, u32)> = tokens
        .iter()
        .map(|t| (t.span.line, t.span.column))
        .collect();
    assert_eq!(
        spans,
        [(1, 1), (3, 3), (3, 7), (3, 8), (3, 9), (3, 10), (3, 12), (4, 3)]
    );
}

#[test]
fn covers_realistic_plugin() {
    assert_covers(common::CLEAN_PLUGIN, &tokenize(common::CLEAN_PLUGIN));
}

#[test]
fn covers_legacy_script() {
    let input = "\" Legacy header\nlet s:count = 0\nfunction! s:Bump(...) abort\n  let s:count += a:0\n  return s:count\nendfunction\n";
    assert_covers(input, &tokenize(input));
}

#[test]
fn covers_heredoc_and_continuation() {
    let input = "var lines =<< trim END\n  one\n  two\nEND\nvar total = 1\n      \\ + 2\n";
    let tokens = tokenize(input);
    assert!(tokens.iter().any(|t| t.kind == TokenKind::Heredoc));
    assert!(tokens.iter().any(|t| t.kind == TokenKind::LineContinuation));
    assert_covers(input, &tokens);
}

#[test]
fn covers_crlf_and_unicode() {
    let input = "vim9script\r\nvar café = 'naïve'\r\necho café\r\n";
    assert_covers(input, &tokenize(input));
}

#[test]
fn empty_and_blank_input() {
    assert!(tokenize("").is_empty());
    assert!(tokenize("  \n\t\n").is_empty());
}
