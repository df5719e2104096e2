//! Writers for the seven output files (§6), each grounded on the exact
//! byte format `original_source/compiler.py`'s driver loop and the two
//! `error_logger.py` files produce.

use std::fs;
use std::path::{Path, PathBuf};

use cminus_lex::Token;
use cminus_par::{Node, Parser};
use cminus_util::{Diagnostic, Handler, Interner};

type IoResult = Result<(), (PathBuf, std::io::Error)>;

fn write(dir: &Path, name: &str, contents: &str) -> IoResult {
    let path = dir.join(name);
    fs::write(&path, contents).map_err(|source| (path, source))
}

/// Groups source-ordered items by line number. Consecutive items share a
/// group as soon as their line numbers match; since both tokens and
/// diagnostics are produced in non-decreasing line order, one linear pass
/// suffices (mirrors Python's `dict` preserving first-seen key order).
fn group_by_line<T>(items: impl IntoIterator<Item = (u32, T)>) -> Vec<(u32, Vec<T>)> {
    let mut groups: Vec<(u32, Vec<T>)> = Vec::new();
    for (line, item) in items {
        match groups.last_mut() {
            Some((last_line, bucket)) if *last_line == line => bucket.push(item),
            _ => groups.push((line, vec![item])),
        }
    }
    groups
}

/// `tokens.txt`: `<lineno>.\t(KIND, lexeme) (KIND, lexeme) ... \n` per
/// source line that produced at least one non-trivia token. The trailing
/// space before the newline matches `compiler.py`'s `end=' \n'`.
pub fn write_tokens_file(dir: &Path, tokens: &[Token<'_>]) -> IoResult {
    let groups = group_by_line(tokens.iter().map(|t| (t.line, t)));
    let mut out = String::new();
    for (line, toks) in groups {
        out.push_str(&format!("{line}.\t"));
        let rendered: Vec<String> = toks.iter().map(|t| t.display()).collect();
        out.push_str(&rendered.join(" "));
        out.push_str(" \n");
    }
    write(dir, "tokens.txt", &out)
}

/// `lexical_errors.txt`: same per-line grouping as `tokens.txt`, or the
/// sentinel with no trailing newline (`compiler.py`'s `end=''`) when the
/// source has no lexical errors.
pub fn write_lexical_errors_file(dir: &Path, lexical: &Handler) -> IoResult {
    let diagnostics = lexical.diagnostics();
    if diagnostics.is_empty() {
        return write(dir, "lexical_errors.txt", "There is no lexical error.");
    }
    let groups = group_by_line(diagnostics.iter().map(|d| (d.line, d.message.as_str())));
    let mut out = String::new();
    for (line, messages) in groups {
        out.push_str(&format!("{line}.\t"));
        out.push_str(&messages.join(" "));
        out.push_str(" \n");
    }
    write(dir, "lexical_errors.txt", &out)
}

/// `symbol_table.txt`: `<index>.\t<lexeme>` per interned lexeme, 1-indexed
/// insertion order — includes the nine reserved words and the `output`/
/// `main` builtins pre-registered ahead of the scan, the same way the
/// reserved words themselves are unconditionally present whether or not
/// the source uses them (`DESIGN.md`).
pub fn write_symbol_table_file(dir: &Path, interner: &Interner<'_>) -> IoResult {
    let mut out = String::new();
    for (index, lexeme) in interner.entries() {
        out.push_str(&format!("{index}.\t{lexeme}\n"));
    }
    write(dir, "symbol_table.txt", &out)
}

/// `syntax_errors.txt`: `#<lineno> : syntax error, <message>` per
/// diagnostic (each already reads `missing <x>` / `illegal <x>` /
/// `Unexpected EOF`), or the clean-parse sentinel.
pub fn write_syntax_errors_file(dir: &Path, parser: &Parser<'_, '_>) -> IoResult {
    let rendered = parser
        .syntax_errors()
        .render("There is no syntax error.", |d: &Diagnostic| format!("#{} : syntax error, {}", d.line, d.message));
    write(dir, "syntax_errors.txt", &rendered)
}

/// `semantic_errors.txt`: `#<lineno> : Semantic Error! <message>` per
/// diagnostic, or the clean-program sentinel.
pub fn write_semantic_errors_file(dir: &Path, parser: &Parser<'_, '_>) -> IoResult {
    let handler = parser.codegen().semantic_errors();
    let rendered =
        handler.render("The input program is semantically correct.", |d: &Diagnostic| {
            format!("#{} : Semantic Error! {}", d.line, d.message)
        });
    write(dir, "semantic_errors.txt", &rendered)
}

const BRANCH: &str = "\u{251c}\u{2500}\u{2500} "; // "├── "
const LAST_BRANCH: &str = "\u{2514}\u{2500}\u{2500} "; // "└── "
const PIPE: &str = "\u{2502}   "; // "│   "
const BLANK: &str = "    ";

/// `parse_tree.txt`: a box-drawing indented tree. Non-terminals print
/// their production name; terminals print `(KIND, lexeme)` (`$` for
/// `EOF`, matching the grammar's own end marker); `epsilon` leaves print
/// literally.
pub fn write_parse_tree_file(dir: &Path, tree: &Node<'_>) -> IoResult {
    let mut out = String::new();
    render_node(tree, "", true, &mut out);
    write(dir, "parse_tree.txt", &out)
}

fn render_node(node: &Node<'_>, prefix: &str, is_last: bool, out: &mut String) {
    let connector = if prefix.is_empty() { "" } else if is_last { LAST_BRANCH } else { BRANCH };
    out.push_str(prefix);
    out.push_str(connector);
    out.push_str(&node_label(node));
    out.push('\n');

    if let Node::NonTerminal { children, .. } = node {
        let child_prefix = if prefix.is_empty() {
            String::new()
        } else {
            format!("{prefix}{}", if is_last { BLANK } else { PIPE })
        };
        let count = children.len();
        for (i, child) in children.iter().enumerate() {
            render_node(child, &child_prefix, i + 1 == count, out);
        }
    }
}

fn node_label(node: &Node<'_>) -> String {
    match node {
        Node::NonTerminal { name, .. } => name.to_string(),
        Node::Epsilon { .. } => "epsilon".to_string(),
        Node::Terminal(token) => {
            if token.is_eof() {
                "$".to_string()
            } else {
                token.display()
            }
        }
    }
}

/// `output.txt`: one line per emitted instruction, `<index>\t(OP, a1, a2,
/// a3)` — omitted entirely when any semantic error occurred (§7).
pub fn write_program_output_file(dir: &Path, parser: &Parser<'_, '_>) -> IoResult {
    let codegen = parser.codegen();
    if codegen.has_semantic_errors() {
        return Ok(());
    }
    debug_assert!(
        !codegen.program_block().has_unpatched_slots(),
        "a semantically correct program must not retain unpatched EMPTY slots"
    );
    let mut out = String::new();
    for (index, instruction) in codegen.program_block().iter() {
        out.push_str(&format!("{index}\t{instruction}\n"));
    }
    write(dir, "output.txt", &out)
}

/// Writes all seven files.
pub fn write_all(
    dir: &Path,
    tree: &Node<'_>,
    interner: &Interner<'_>,
    lexical: &Handler,
    parser: &Parser<'_, '_>,
) -> IoResult {
    write_tokens_file(dir, parser.recorded_tokens())?;
    write_lexical_errors_file(dir, lexical)?;
    write_symbol_table_file(dir, interner)?;
    write_syntax_errors_file(dir, parser)?;
    write_semantic_errors_file(dir, parser)?;
    write_parse_tree_file(dir, tree)?;
    write_program_output_file(dir, parser)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cminus_lex::TokenKind;

    #[test]
    fn groups_consecutive_same_line_items() {
        let items = vec![(1u32, "a"), (1, "b"), (2, "c")];
        let groups = group_by_line(items);
        assert_eq!(groups, vec![(1, vec!["a", "b"]), (2, vec!["c"])]);
    }

    #[test]
    fn tokens_file_groups_by_line_with_trailing_space() {
        let dir = tempfile_dir();
        let tokens = vec![
            Token::new(TokenKind::Keyword, "int", 1),
            Token::new(TokenKind::Id, "x", 1),
            Token::new(TokenKind::Symbol, ";", 2),
        ];
        write_tokens_file(dir.path(), &tokens).unwrap();
        let contents = fs::read_to_string(dir.path().join("tokens.txt")).unwrap();
        assert_eq!(contents, "1.\t(KEYWORD, int) (ID, x) \n2.\t(SYMBOL, ;) \n");
    }

    #[test]
    fn lexical_errors_file_reports_sentinel_without_trailing_newline() {
        let dir = tempfile_dir();
        let handler = Handler::new();
        write_lexical_errors_file(dir.path(), &handler).unwrap();
        let contents = fs::read_to_string(dir.path().join("lexical_errors.txt")).unwrap();
        assert_eq!(contents, "There is no lexical error.");
    }

    #[test]
    fn parse_tree_renders_root_with_no_connector() {
        let mut root = Node::non_terminal("program", 1);
        root.push_child(Node::Epsilon { line: 1 });
        let dir = tempfile_dir();
        write_parse_tree_file(dir.path(), &root).unwrap();
        let contents = fs::read_to_string(dir.path().join("parse_tree.txt")).unwrap();
        assert_eq!(contents, "program\n\u{2514}\u{2500}\u{2500} epsilon\n");
    }

    fn tempfile_dir() -> tempfile::TempDir {
        tempfile::tempdir().unwrap()
    }
}
