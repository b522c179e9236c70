//! Diagnostic system for the weft transpiler.
//!
//! - Error codes for searchability (`E0xxx` lexical, `E1xxx` syntax,
//!   `W2xxx` warnings)
//! - Clear messages (what went wrong)
//! - Absolute spans resolved to line/column on demand
//! - Caret-annotated excerpts located in the original template text,
//!   never in generated code

mod code;
mod diagnostic;
mod emitter;
mod excerpt;

pub use code::ErrorCode;
pub use diagnostic::{Diagnostic, Severity, Warning};
pub use emitter::{ColorMode, TerminalEmitter};
pub use excerpt::render_excerpt;
