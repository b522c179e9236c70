//! Runtime feature tracking.
//!
//! The transpiler only knows the call shape of the `wf` runtime entry
//! points. Each entry point actually used is flagged here, so a bundler
//! can link only the runtime pieces a template needs.

use bitflags::bitflags;

bitflags! {
    /// One flag per runtime entry point used by the generated code.
    #[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
    pub struct FeatureSet: u16 {
        /// `wf.el`: create-or-update element.
        const EL = 1 << 0;
        /// `wf.at`: chained tag-body operation group.
        const CHAIN = 1 << 1;
        /// `wf.get` / `wf.maybe`: coerce value from reactive reference.
        const GET = 1 << 2;
        /// `wf.watch`: subscribe-and-rerun.
        const WATCH = 1 << 3;
        /// `wf.cond`: rebuild conditional chain.
        const COND = 1 << 4;
        /// `wf.eachA` / `wf.eachO` / `wf.eachR`: reactive iteration.
        const EACH = 1 << 5;
        /// `wf.style`: build stylesheet from declarative block.
        const STYLE = 1 << 6;
        /// `wf.widget`: register widget instance.
        const WIDGET = 1 << 7;
        /// `wf.dbg`: debug wrapping requested by a `:debug` directive.
        const DBG = 1 << 8;
        /// `wf.set`: write a reactive reference (`*model` expansion).
        const SET = 1 << 9;
        /// `wf.check`: the runtime version guard.
        const CHECK = 1 << 10;
    }
}

impl FeatureSet {
    /// The runtime entry-point names this set covers, in a stable order.
    pub fn entry_points(self) -> Vec<&'static str> {
        const TABLE: &[(FeatureSet, &str)] = &[
            (FeatureSet::EL, "el"),
            (FeatureSet::CHAIN, "at"),
            (FeatureSet::GET, "get"),
            (FeatureSet::WATCH, "watch"),
            (FeatureSet::COND, "cond"),
            (FeatureSet::EACH, "each"),
            (FeatureSet::STYLE, "style"),
            (FeatureSet::WIDGET, "widget"),
            (FeatureSet::DBG, "dbg"),
            (FeatureSet::SET, "set"),
            (FeatureSet::CHECK, "check"),
        ];
        TABLE
            .iter()
            .filter(|(f, _)| self.contains(*f))
            .map(|&(_, name)| name)
            .collect()
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::FeatureSet;
    use pretty_assertions::assert_eq;

    #[test]
    fn entry_points_are_stable_and_filtered() {
        let f = FeatureSet::EL | FeatureSet::GET | FeatureSet::STYLE;
        assert_eq!(f.entry_points(), vec!["el", "get", "style"]);
    }

    #[test]
    fn empty_set_has_no_entries() {
        assert!(FeatureSet::empty().entry_points().is_empty());
    }
}
