//! The generated buffer: immutable fragments plus named slots.
//!
//! The transpiler is single-pass, but some output cannot be final when
//! first emitted: a statement head may later become a reactive rebuild
//! call, a `{` may later turn out to open a function body. Those places
//! are reserved as *slots*, placeholders filled exactly once, after
//! later parsing determines their final content. Everything else is
//! plain appended text. Downstream assembly never assumes append-only
//! semantics.

/// One piece of generated output.
#[derive(Clone, Debug)]
enum Fragment {
    Text(String),
    Slot {
        /// What the slot stands for; used in trace output only.
        label: &'static str,
        content: Option<String>,
    },
}

/// Reference to a reserved slot. Only valid for the buffer that
/// created it.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub(crate) struct SlotRef(usize);

/// Append-mostly ordered fragment list for one transpile call.
#[derive(Default, Debug)]
pub(crate) struct GenBuffer {
    frags: Vec<Fragment>,
}

impl GenBuffer {
    pub fn new() -> Self {
        GenBuffer { frags: Vec::new() }
    }

    /// Append immutable text.
    pub fn push(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        // Coalesce with a trailing text fragment to keep the list short.
        if let Some(Fragment::Text(prev)) = self.frags.last_mut() {
            prev.push_str(&text);
        } else {
            self.frags.push(Fragment::Text(text));
        }
    }

    /// Reserve a named slot at the current position.
    pub fn reserve(&mut self, label: &'static str) -> SlotRef {
        self.frags.push(Fragment::Slot {
            label,
            content: None,
        });
        SlotRef(self.frags.len() - 1)
    }

    /// Fill a reserved slot. Each slot is written exactly once; a second
    /// fill is a transpiler bug and is ignored outside debug builds.
    pub fn fill(&mut self, slot: SlotRef, text: impl Into<String>) {
        match &mut self.frags[slot.0] {
            Fragment::Slot { content, label } => {
                debug_assert!(content.is_none(), "slot `{label}` filled twice");
                if content.is_none() {
                    *content = Some(text.into());
                }
            }
            Fragment::Text(_) => {
                debug_assert!(false, "slot reference points at plain text");
            }
        }
    }

    /// Whether a slot has been filled.
    #[cfg(test)]
    pub fn is_filled(&self, slot: SlotRef) -> bool {
        matches!(
            &self.frags[slot.0],
            Fragment::Slot {
                content: Some(_),
                ..
            }
        )
    }

    /// Concatenate everything. Unfilled slots contribute nothing.
    pub fn assemble(&self) -> String {
        let mut out = String::with_capacity(4096);
        for frag in &self.frags {
            match frag {
                Fragment::Text(t) => out.push_str(t),
                Fragment::Slot { content, .. } => {
                    if let Some(c) = content {
                        out.push_str(c);
                    }
                }
            }
        }
        out
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::GenBuffer;
    use pretty_assertions::assert_eq;

    #[test]
    fn plain_text_concatenates() {
        let mut b = GenBuffer::new();
        b.push("a");
        b.push("b");
        assert_eq!(b.assemble(), "ab");
    }

    #[test]
    fn slot_filled_later_lands_in_place() {
        let mut b = GenBuffer::new();
        b.push("if ");
        let s = b.reserve("head");
        b.push(" body ");
        b.fill(s, "(cond) {");
        assert_eq!(b.assemble(), "if (cond) { body ");
    }

    #[test]
    fn unfilled_slot_is_empty() {
        let mut b = GenBuffer::new();
        b.push("x");
        let _s = b.reserve("capture");
        b.push("y");
        assert_eq!(b.assemble(), "xy");
    }

    #[test]
    fn is_filled_tracks_state() {
        let mut b = GenBuffer::new();
        let s = b.reserve("tail");
        assert!(!b.is_filled(s));
        b.fill(s, "}");
        assert!(b.is_filled(s));
    }

    #[test]
    fn interleaved_slots_fill_independently() {
        let mut b = GenBuffer::new();
        let a = b.reserve("a");
        b.push("-");
        let c = b.reserve("c");
        b.fill(c, "2");
        b.fill(a, "1");
        assert_eq!(b.assemble(), "1-2");
    }
}
