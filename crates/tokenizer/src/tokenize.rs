use crate::error::{Result, TokenizerError};
use grepplus_protocol::{CodeLine, Token};
use tree_sitter::{Node, Parser};

/// Keywords that get a dedicated symbolic token type.
fn keyword_type(word: &str) -> Option<&'static str> {
    let name = match word {
        "def" => "DEF",
        "print" => "PRINT",
        "if" => "IF",
        "else" => "ELSE",
        "elif" => "ELSE_IF",
        "for" => "FOR",
        "while" => "WHILE",
        "try" => "TRY",
        "except" => "EXCEPT",
        "finally" => "FINALLY",
        "return" => "RETURN",
        "import" => "IMPORT",
        "from" => "FROM",
        "as" => "AS",
        "pass" => "PASS",
        "continue" => "CONTINUE",
        "break" => "BREAK",
        "assert" => "ASSERT",
        "raise" => "RAISE",
        "global" => "GLOBAL",
        "nonlocal" => "NONLOCAL",
        "lambda" => "LAMBDA",
        "with" => "WITH",
        "yield" => "YIELD",
        "in" => "IN",
        "is" => "IS",
        "not" => "NOT",
        "and" => "AND",
        "or" => "OR",
        "True" => "BOOLEAN_TRUE",
        "False" => "BOOLEAN_FALSE",
        _ => return None,
    };
    Some(name)
}

/// Operators with a dedicated symbolic token type. Everything else the
/// grammar emits as an operator falls back to the generic `OP`.
fn operator_type(text: &str) -> Option<&'static str> {
    let name = match text {
        "==" => "EQUALS_EQUALS",
        "//" => "FLOOR_DIVIDE",
        "(" => "LEFT_PARENTHESIS",
        ")" => "RIGHT_PARENTHESIS",
        "[" => "LEFT_SQUARE_BRACKET",
        "]" => "RIGHT_SQUARE_BRACKET",
        ":" => "COLON",
        "," => "COMMA",
        ";" => "SEMICOLON",
        "." => "DOT",
        "+" => "ADD",
        "-" => "SUBTRACT",
        "*" => "MULTIPLY",
        "/" => "DIVIDE",
        "%" => "MODULO",
        "=" => "ASSIGN",
        "|" => "BITWISE_OR",
        "&" => "BITWISE_AND",
        "^" => "BITWISE_XOR",
        "~" => "BITWISE_NOT",
        "@" => "AT",
        _ => return None,
    };
    Some(name)
}

fn token_name(kind: &str, text: &str) -> &'static str {
    if let Some(name) = keyword_type(text) {
        return name;
    }
    match kind {
        "identifier" | "none" => "NAME",
        "integer" | "float" => "NUMBER",
        "comment" => "COMMENT",
        _ => {
            if let Some(name) = operator_type(text) {
                name
            } else if text
                .chars()
                .next()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
            {
                // soft keywords (match, case, async, ...) stay NAME
                "NAME"
            } else {
                "OP"
            }
        }
    }
}

/// One mapped token plus the grouping state it carries: the 0-based rows
/// it spans and its bracket-nesting contribution.
struct RawToken {
    token: Token,
    start_row: usize,
    end_row: usize,
    delta: i32,
}

fn bracket_delta(text: &str) -> i32 {
    match text {
        "(" | "[" | "{" => 1,
        ")" | "]" | "}" => -1,
        _ => 0,
    }
}

fn make_token(name: &str, node: Node, source: &str) -> Option<RawToken> {
    let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
    if text.is_empty() {
        return None;
    }
    let start = node.start_position();
    let end = node.end_position();
    Some(RawToken {
        token: Token::new(
            name,
            text,
            (start.row + 1, start.column),
            (end.row + 1, end.column),
        ),
        start_row: start.row,
        end_row: end.row,
        delta: bracket_delta(text),
    })
}

/// Collect leaf tokens in document order. A `string` node is emitted
/// whole (prefix, quotes, interpolations and all) instead of being
/// descended into, so multi-line literals stay one token.
fn collect_tokens(node: Node, source: &str, out: &mut Vec<RawToken>) {
    if node.kind() == "string" {
        if let Some(raw) = make_token("STRING", node, source) {
            out.push(raw);
        }
        return;
    }
    if node.child_count() == 0 {
        if node.kind() == "line_continuation" {
            return;
        }
        let text = node.utf8_text(source.as_bytes()).unwrap_or_default();
        if let Some(raw) = make_token(token_name(node.kind(), text), node, source) {
            out.push(raw);
        }
        return;
    }
    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_tokens(child, source, out);
    }
}

/// Group tokens into logical lines: a new line starts at a token on a
/// fresh physical row, unless the group is still inside open brackets.
/// Multi-line strings span rows within one token, so they never split.
fn group_logical_lines(raw: Vec<RawToken>, source: &str) -> Vec<CodeLine> {
    let rows: Vec<&str> = source.lines().collect();
    let mut lines: Vec<CodeLine> = Vec::new();
    let mut group: Vec<RawToken> = Vec::new();
    let mut depth: i32 = 0;

    for token in raw {
        if depth == 0
            && group
                .last()
                .is_some_and(|last| token.start_row > last.end_row)
        {
            flush_group(&mut group, &rows, &mut lines);
        }
        depth = (depth + token.delta).max(0);
        group.push(token);
    }
    flush_group(&mut group, &rows, &mut lines);
    lines
}

fn flush_group(group: &mut Vec<RawToken>, rows: &[&str], lines: &mut Vec<CodeLine>) {
    if group.is_empty() {
        return;
    }
    let start_row = group[0].start_row;
    let end_row = group[group.len() - 1]
        .end_row
        .min(rows.len().saturating_sub(1));

    let code = rows[start_row..=end_row]
        .iter()
        .map(|row| row.trim())
        .filter(|row| !row.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    let tokens = std::mem::take(group)
        .into_iter()
        .map(|raw| raw.token)
        .collect();
    lines.push(CodeLine {
        tokens,
        code,
        line: lines.len(),
    });
}

/// Python tokenizer over the tree-sitter grammar.
///
/// Maps the grammar's leaf tokens onto symbolic names and groups them
/// into logical lines; the grammar, not this crate, owns the lexing of
/// strings, numbers, and comments.
pub struct Tokenizer {
    parser: Parser,
}

impl Tokenizer {
    pub fn new() -> Result<Self> {
        let mut parser = Parser::new();
        let language: tree_sitter::Language = tree_sitter_python::LANGUAGE.into();
        parser.set_language(&language)?;
        Ok(Self { parser })
    }

    /// Tokenize a whole source document into logical lines.
    ///
    /// Blank lines produce no entry; `line` numbers are the positions in
    /// the returned vector, not physical rows. `code` is the stripped
    /// source text of the rows the line spans.
    pub fn tokenize(&mut self, source: &str) -> Result<Vec<CodeLine>> {
        let tree = self
            .parser
            .parse(source, None)
            .ok_or(TokenizerError::Parse)?;
        let mut raw = Vec::new();
        collect_tokens(tree.root_node(), source, &mut raw);
        Ok(group_logical_lines(raw, source))
    }
}
