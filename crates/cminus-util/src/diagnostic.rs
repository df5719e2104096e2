//! Diagnostic collection shared by the compiler's three independent error
//! taxonomies (lexical, syntactic, semantic — §7).
//!
//! Grounded on `faxc-util::diagnostic::Handler`, simplified: the teacher's
//! `Diagnostic` carries a `Level`, an error code, notes/helps and source
//! snippets because `faxc` reports developer-facing rustc-style
//! diagnostics. Every message this compiler emits is instead one of the
//! fixed literal templates of §6/§7, already fully formatted by the caller
//! (the lexical scanner, the parser, or the code generator each know their
//! own message shape) — so `Diagnostic` here is just a line number plus a
//! finished message, and `Handler` is the ordered collector plus the
//! sentinel-on-empty rendering that all three logs share.

use std::cell::RefCell;

/// One recorded error, already rendered to its final message text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl Diagnostic {
    pub fn new(line: u32, message: impl Into<String>) -> Self {
        Self { line, message: message.into() }
    }
}

/// Collects diagnostics for a single error taxonomy, in source order.
///
/// A session holds one `Handler` per taxonomy (lexical/syntactic/semantic),
/// matching §5's "error loggers acquire their output file on session start
/// and guarantee release on session exit, writing a 'no error' sentinel if
/// nothing was logged" — `render` is that release-time step.
#[derive(Default)]
pub struct Handler {
    diagnostics: RefCell<Vec<Diagnostic>>,
}

impl Handler {
    pub fn new() -> Self {
        Self { diagnostics: RefCell::new(Vec::new()) }
    }

    pub fn emit(&self, line: u32, message: impl Into<String>) {
        self.diagnostics.borrow_mut().push(Diagnostic::new(line, message));
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.borrow().is_empty()
    }

    pub fn count(&self) -> usize {
        self.diagnostics.borrow().len()
    }

    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics.borrow().clone()
    }

    /// Renders one line per diagnostic via `format_line`, or `sentinel` if
    /// nothing was ever emitted — matching the three "There is no ... error"
    /// style sentinels of §6.
    pub fn render(&self, sentinel: &str, format_line: impl Fn(&Diagnostic) -> String) -> String {
        let diagnostics = self.diagnostics.borrow();
        if diagnostics.is_empty() {
            format!("{sentinel}\n")
        } else {
            let mut out = String::new();
            for d in diagnostics.iter() {
                out.push_str(&format_line(d));
                out.push('\n');
            }
            out
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_handler_renders_sentinel() {
        let handler = Handler::new();
        assert_eq!(handler.render("clean", |d| d.message.clone()), "clean\n");
        assert!(!handler.has_errors());
    }

    #[test]
    fn emitted_diagnostics_render_in_order() {
        let handler = Handler::new();
        handler.emit(1, "first");
        handler.emit(2, "second");
        assert!(handler.has_errors());
        assert_eq!(handler.count(), 2);
        let rendered = handler.render("clean", |d| format!("{}: {}", d.line, d.message));
        assert_eq!(rendered, "1: first\n2: second\n");
    }
}
