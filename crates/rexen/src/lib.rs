// Rexen
// A backtracking regular-expression engine with named captures, zero-width
// negation and a tunable backtracking budget
//
// Pattern text is `<sep><body><sep><flags>`, e.g. `/@<year>(\d{4})-\d\d/i`.
// Compilation goes text -> parser -> node chain -> optimizer -> Pattern;
// every search evaluates the chain with its own cursor.

#[cfg(test)]
mod test;

mod captures;
mod class;
mod engine;
mod node;
mod parser;
mod pattern;
mod quantifier;
mod template;

pub mod config;
pub mod error;
pub mod limits;
pub mod optimizer;

pub use captures::{Match, Span};
pub use config::{Budget, CompileOptions, Flags, Locale};
pub use error::{CompileError, ErrorKind, TemplateError};
pub use optimizer::OptConfig;
pub use pattern::{Pattern, escape};
pub use quantifier::Quantifier;
