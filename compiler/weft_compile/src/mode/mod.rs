//! Parsing modes.
//!
//! Each mode is a set of `Driver` methods: `logic` is the template
//! default (statements, tags, text, interpolation), `code` is raw
//! host-language code with sigil rewriting, `text` is literal text
//! with interpolation only, and `style` flattens declarative CSS
//! blocks. Mode names resolve through [`crate::table::ModeTable`].

pub(crate) mod code;
pub(crate) mod expr;
pub(crate) mod logic;
pub(crate) mod state;
pub(crate) mod style;
pub(crate) mod text;
