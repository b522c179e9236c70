//! Per-region emission state: op chains and text runs.

use crate::buffer::GenBuffer;

/// Buffered `wf.at(node)` op chain.
///
/// Consecutive tag-body operations that need no closure of their own
/// merge into a single chained call. The chain flushes when a
/// closure-opening construct (statement, child tag) arrives or the
/// region ends.
#[derive(Debug)]
pub(crate) struct Chain {
    node: String,
    ops: Vec<String>,
}

impl Chain {
    pub fn new(node: impl Into<String>) -> Self {
        Chain {
            node: node.into(),
            ops: Vec::new(),
        }
    }

    /// Queue one op, e.g. `.txt("hi")`.
    pub fn push_op(&mut self, op: String) {
        self.ops.push(op);
    }

    /// Emit the buffered chain, if any, and reset.
    pub fn flush(&mut self, buf: &mut GenBuffer) -> bool {
        if self.ops.is_empty() {
            return false;
        }
        buf.push(format!("wf.at({})", self.node));
        for op in self.ops.drain(..) {
            buf.push(op);
        }
        buf.push(";");
        true
    }
}

/// Coalesces adjacent literal text before it becomes one `.txt` op.
///
/// Whitespace runs collapse to a single space; a run that is nothing
/// but whitespace spanning a line break (indentation between tags)
/// disappears entirely.
#[derive(Default, Debug)]
pub(crate) struct TextRun {
    raw: String,
}

impl TextRun {
    pub fn push_str(&mut self, s: &str) {
        self.raw.push_str(s);
    }

    /// Collapse and take the accumulated text. `None` when nothing
    /// printable accumulated.
    pub fn take(&mut self) -> Option<String> {
        let raw = std::mem::take(&mut self.raw);
        if raw.is_empty() {
            return None;
        }
        if raw.chars().all(char::is_whitespace) {
            if raw.contains('\n') {
                return None;
            }
            return Some(" ".to_string());
        }
        let mut out = String::with_capacity(raw.len());
        let mut in_ws = false;
        for ch in raw.chars() {
            if ch.is_whitespace() {
                in_ws = true;
            } else {
                if in_ws {
                    if !out.is_empty() || raw.starts_with(char::is_whitespace) {
                        out.push(' ');
                    }
                    in_ws = false;
                }
                out.push(ch);
            }
        }
        if in_ws {
            out.push(' ');
        }
        Some(out)
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::{Chain, TextRun};
    use crate::buffer::GenBuffer;
    use pretty_assertions::assert_eq;

    #[test]
    fn chain_merges_ops_into_one_call() {
        let mut buf = GenBuffer::new();
        let mut chain = Chain::new("_n2");
        chain.push_op(".txt(\"hi \")".to_string());
        chain.push_op(".exp(() => (x), [\"x\"])".to_string());
        assert!(chain.flush(&mut buf));
        assert_eq!(buf.assemble(), "wf.at(_n2).txt(\"hi \").exp(() => (x), [\"x\"]);");
    }

    #[test]
    fn empty_chain_emits_nothing() {
        let mut buf = GenBuffer::new();
        let mut chain = Chain::new("_n1");
        assert!(!chain.flush(&mut buf));
        assert_eq!(buf.assemble(), "");
    }

    #[test]
    fn text_collapses_inner_whitespace() {
        let mut run = TextRun::default();
        run.push_str("  lots \n  of   text ");
        assert_eq!(run.take().as_deref(), Some(" lots of text "));
    }

    #[test]
    fn indentation_between_tags_disappears() {
        let mut run = TextRun::default();
        run.push_str("\n    ");
        assert_eq!(run.take(), None);
    }

    #[test]
    fn inline_space_survives_as_one_space() {
        let mut run = TextRun::default();
        run.push_str("   ");
        assert_eq!(run.take().as_deref(), Some(" "));
    }
}
