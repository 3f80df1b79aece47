//! Inline markup for label text.
//!
//! Supported syntax is `**bold**`, `__bold__`, `*italic*`, `_italic_` and
//! `<u>...</u>`, which is unwrapped and rendered as plain text. Spans do not
//! nest and there is no escape character; a marker without a closing partner
//! on the same line is kept as literal text.

use serde::Serialize;

const BOLD_MARKERS: &[&str] = &["**", "__"];
const ITALIC_MARKERS: &[&str] = &["*", "_"];
const UNDERLINE_OPEN: &str = "<u>";
const UNDERLINE_CLOSE: &str = "</u>";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StyledRun {
    pub content: String,
    pub bold: bool,
    pub italic: bool,
}

impl StyledRun {
    fn plain(content: String) -> Self {
        Self {
            content,
            bold: false,
            italic: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Literal(&'a str),
    BoldOpen,
    BoldClose,
    ItalicOpen,
    ItalicClose,
}

#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    inner_start: usize,
    inner_end: usize,
    end: usize,
}

/// Splits `text` into styled runs, left to right.
///
/// Plain text between styled spans is always emitted as its own run, even
/// when empty, so `"**a**"` yields `["", bold "a", ""]`.
pub fn parse_runs(text: &str) -> Vec<StyledRun> {
    let text = unwrap_underline(text);
    runs_from_tokens(&tokenize(&text))
}

/// Returns the text with every marker removed, as it will be displayed.
pub fn plain_text(text: &str) -> String {
    let text = unwrap_underline(text);
    tokenize(&text)
        .into_iter()
        .filter_map(|token| match token {
            Token::Literal(value) => Some(value),
            _ => None,
        })
        .collect()
}

pub(crate) fn tokenize(text: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut cursor = 0;
    for span in find_spans(text, BOLD_MARKERS) {
        push_italic_tokens(&text[cursor..span.start], &mut tokens);
        tokens.push(Token::BoldOpen);
        push_literal(&text[span.inner_start..span.inner_end], &mut tokens);
        tokens.push(Token::BoldClose);
        cursor = span.end;
    }
    push_italic_tokens(&text[cursor..], &mut tokens);
    tokens
}

// Italic spans are only searched between bold spans, so a `*` inside
// `**bold**` never opens an italic run.
fn push_italic_tokens<'a>(gap: &'a str, tokens: &mut Vec<Token<'a>>) {
    let mut cursor = 0;
    for span in find_spans(gap, ITALIC_MARKERS) {
        push_literal(&gap[cursor..span.start], tokens);
        tokens.push(Token::ItalicOpen);
        push_literal(&gap[span.inner_start..span.inner_end], tokens);
        tokens.push(Token::ItalicClose);
        cursor = span.end;
    }
    push_literal(&gap[cursor..], tokens);
}

fn push_literal<'a>(value: &'a str, tokens: &mut Vec<Token<'a>>) {
    if !value.is_empty() {
        tokens.push(Token::Literal(value));
    }
}

fn runs_from_tokens(tokens: &[Token<'_>]) -> Vec<StyledRun> {
    let mut runs = Vec::new();
    let mut buffer = String::new();
    for token in tokens {
        match token {
            Token::Literal(value) => buffer.push_str(value),
            Token::BoldOpen | Token::ItalicOpen => {
                runs.push(StyledRun::plain(std::mem::take(&mut buffer)));
            }
            Token::BoldClose => runs.push(StyledRun {
                content: std::mem::take(&mut buffer),
                bold: true,
                italic: false,
            }),
            Token::ItalicClose => runs.push(StyledRun {
                content: std::mem::take(&mut buffer),
                bold: false,
                italic: true,
            }),
        }
    }
    runs.push(StyledRun::plain(buffer));
    runs
}

/// Finds non-overlapping `marker ... marker` spans, trying markers in order
/// at each position. Content may be empty but never crosses a newline.
fn find_spans(text: &str, markers: &[&str]) -> Vec<Span> {
    let mut spans = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let rest = &text[pos..];
        let matched = markers.iter().find_map(|marker| {
            if !rest.starts_with(marker) {
                return None;
            }
            let inner_start = pos + marker.len();
            find_on_line(text, inner_start, marker).map(|inner_end| Span {
                start: pos,
                inner_start,
                inner_end,
                end: inner_end + marker.len(),
            })
        });
        match matched {
            Some(span) => {
                spans.push(span);
                pos = span.end;
            }
            None => pos += rest.chars().next().map_or(1, char::len_utf8),
        }
    }
    spans
}

fn find_on_line(text: &str, from: usize, needle: &str) -> Option<usize> {
    let rest = &text[from..];
    let line = match rest.find('\n') {
        Some(end) => &rest[..end],
        None => rest,
    };
    line.find(needle).map(|offset| from + offset)
}

fn unwrap_underline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(start) = rest.find(UNDERLINE_OPEN) {
        let inner_start = start + UNDERLINE_OPEN.len();
        match find_on_line(rest, inner_start, UNDERLINE_CLOSE) {
            Some(end) => {
                out.push_str(&rest[..start]);
                out.push_str(&rest[inner_start..end]);
                rest = &rest[end + UNDERLINE_CLOSE.len()..];
            }
            None => {
                out.push_str(&rest[..inner_start]);
                rest = &rest[inner_start..];
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(content: &str, bold: bool, italic: bool) -> StyledRun {
        StyledRun {
            content: content.to_string(),
            bold,
            italic,
        }
    }

    fn joined(runs: &[StyledRun]) -> String {
        runs.iter().map(|run| run.content.as_str()).collect()
    }

    #[test]
    fn plain_text_is_a_single_run() {
        assert_eq!(parse_runs("Photo: Jane Doe"), vec![run("Photo: Jane Doe", false, false)]);
    }

    #[test]
    fn bold_and_italic_spans_alternate_with_plain_runs() {
        let runs = parse_runs("Hello **World** and _friends_!");
        assert_eq!(
            runs,
            vec![
                run("Hello ", false, false),
                run("World", true, false),
                run(" and ", false, false),
                run("friends", false, true),
                run("!", false, false),
            ]
        );
    }

    #[test]
    fn underscore_bold_and_star_italic() {
        let runs = parse_runs("__b__*i*");
        assert_eq!(
            runs,
            vec![
                run("", false, false),
                run("b", true, false),
                run("", false, false),
                run("i", false, true),
                run("", false, false),
            ]
        );
    }

    #[test]
    fn empty_bold_span_yields_empty_bold_run() {
        let runs = parse_runs("****");
        assert_eq!(
            runs,
            vec![run("", false, false), run("", true, false), run("", false, false)]
        );
        assert_eq!(plain_text("****"), "");
    }

    #[test]
    fn unmatched_markers_stay_literal() {
        assert_eq!(parse_runs("5 * 3"), vec![run("5 * 3", false, false)]);
        assert_eq!(parse_runs("snake_case"), vec![run("snake_case", false, false)]);
        assert_eq!(plain_text("a * b _ c"), "a * b _ c");
    }

    #[test]
    fn bold_takes_precedence_over_italic() {
        let runs = parse_runs("**a*b**");
        assert_eq!(
            runs,
            vec![run("", false, false), run("a*b", true, false), run("", false, false)]
        );

        let runs = parse_runs("*a**b**");
        assert_eq!(
            runs,
            vec![run("*a", false, false), run("b", true, false), run("", false, false)]
        );
    }

    #[test]
    fn spans_do_not_cross_newlines() {
        assert_eq!(parse_runs("*a\nb*"), vec![run("*a\nb*", false, false)]);
    }

    #[test]
    fn underline_tags_are_unwrapped() {
        assert_eq!(plain_text("<u>Credit</u> line"), "Credit line");
        assert_eq!(plain_text("<u></u>x"), "x");
        assert_eq!(
            parse_runs("<u>**Bold**</u>"),
            vec![run("", false, false), run("Bold", true, false), run("", false, false)]
        );
        assert_eq!(plain_text("<u>open"), "<u>open");
    }

    #[test]
    fn multibyte_text_is_preserved() {
        let runs = parse_runs("café *été* 写真");
        assert_eq!(
            runs,
            vec![
                run("café ", false, false),
                run("été", false, true),
                run(" 写真", false, false),
            ]
        );
    }

    #[test]
    fn concatenated_runs_match_plain_text() {
        let samples = [
            "",
            "plain",
            "Hello **World**!",
            "__a__ b *c* _d_",
            "**x** and **y** with *z*",
            "<u>under</u> **bold** _it_",
            "****",
            "*a**b**",
            "a * b _ c",
            "__a **b__ c**",
        ];
        for sample in samples {
            let runs = parse_runs(sample);
            assert_eq!(joined(&runs), plain_text(sample), "sample: {sample:?}");
        }
    }

    #[test]
    fn plain_text_strips_balanced_markers() {
        assert_eq!(plain_text("Hello **World**!"), "Hello World!");
        assert_eq!(plain_text("__Bold__ and *it*"), "Bold and it");
    }

    #[test]
    fn tokens_use_tagged_variants() {
        assert_eq!(
            tokenize("a **b** *c*"),
            vec![
                Token::Literal("a "),
                Token::BoldOpen,
                Token::Literal("b"),
                Token::BoldClose,
                Token::Literal(" "),
                Token::ItalicOpen,
                Token::Literal("c"),
                Token::ItalicClose,
            ]
        );
    }
}
