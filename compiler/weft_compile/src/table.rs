//! The mode table.
//!
//! Each parsing mode is registered under its name; `<#name>` tags and
//! the `entry_mode` option resolve against this table. The table is
//! ordered so that the first matching entry wins, which lets aliases
//! shadow nothing by accident.

use weft_scan::Span;

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) enum ModeKind {
    /// Statements, tags, text, and interpolation. The template default.
    Logic,
    /// Raw host-language code with sigil rewriting.
    Code,
    /// Literal text with interpolation only.
    Text,
    /// Declarative style blocks.
    Style,
}

#[derive(Debug)]
pub(crate) struct ModeEntry {
    pub name: &'static str,
    pub kind: ModeKind,
    /// Deprecated alias: still resolves but produces a warning.
    pub deprecated: bool,
}

#[derive(Debug)]
pub(crate) struct ModeTable {
    entries: Vec<ModeEntry>,
}

impl ModeTable {
    /// The standard table, built once per [`Engine`](crate::Engine).
    pub fn standard() -> Self {
        ModeTable {
            entries: vec![
                ModeEntry {
                    name: "logic",
                    kind: ModeKind::Logic,
                    deprecated: false,
                },
                ModeEntry {
                    name: "code",
                    kind: ModeKind::Code,
                    deprecated: false,
                },
                ModeEntry {
                    name: "text",
                    kind: ModeKind::Text,
                    deprecated: false,
                },
                ModeEntry {
                    name: "style",
                    kind: ModeKind::Style,
                    deprecated: false,
                },
                ModeEntry {
                    name: "script",
                    kind: ModeKind::Code,
                    deprecated: true,
                },
            ],
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&ModeEntry> {
        self.entries.iter().find(|e| e.name == name)
    }
}

/// How a region knows it is over.
#[derive(Clone, Eq, PartialEq, Debug)]
pub(crate) enum Closer {
    /// Whole-template region; ends at end of input.
    Root,
    /// Any closing tag ends it (computed tag names).
    Any,
    /// Only `</name>` ends it; anything else warns.
    Name(String),
}

/// One nested parse region: the template root or a tag body.
#[derive(Debug)]
pub(crate) struct Region {
    pub closer: Closer,
    /// Where the region's opening construct sits, for unclosed errors.
    pub open_span: Span,
    /// Open-statement stack depth at entry. Statements opened inside
    /// the region must close inside it.
    pub stmt_mark: usize,
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::{ModeKind, ModeTable};
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_table_resolves_all_modes() {
        let t = ModeTable::standard();
        assert_eq!(t.lookup("logic").map(|e| e.kind), Some(ModeKind::Logic));
        assert_eq!(t.lookup("style").map(|e| e.kind), Some(ModeKind::Style));
        assert!(t.lookup("markdown").is_none());
    }

    #[test]
    fn script_is_a_deprecated_code_alias() {
        let t = ModeTable::standard();
        let e = t.lookup("script").expect("alias resolves");
        assert_eq!(e.kind, ModeKind::Code);
        assert!(e.deprecated);
    }
}
