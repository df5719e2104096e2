//! Shared infrastructure for the C-minus compiler: source spans, string
//! interning, and the diagnostic collector used by the three independent
//! error taxonomies.

pub mod diagnostic;
pub mod span;
pub mod symbol;

pub use diagnostic::{Diagnostic, Handler};
pub use span::Span;
pub use symbol::{Interner, Symbol};
