//! Compile options.
//!
//! Deserializable so callers (the CLI, build tooling) can load them from
//! a JSON config file; every field has a sensible default so `Options`
//! can also be built with struct-update syntax in code.

use rustc_hash::FxHashMap;
use serde::Deserialize;

/// JavaScript dialect to target.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// `function () {}` closures; `arguments` is captured explicitly
    /// into `$args` where a nested closure needs it.
    Es5,
    /// Arrow functions throughout.
    #[default]
    Es6,
}

/// Module wrapper around the emitted factory.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleKind {
    /// Bare factory expression, no wrapper.
    #[default]
    None,
    /// `module.exports = ...`
    CommonJs,
    /// `export default ...`
    Esm,
    /// Immediately-invoked wrapper assigning to a global.
    Iife,
}

/// Options for one [`Engine`](crate::Engine).
#[derive(Clone, Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Options {
    /// Mode the source starts in. Templates normally start in logic
    /// mode, which accepts statements, tags, and interpolated text.
    pub entry_mode: String,
    pub dialect: Dialect,
    /// Identifier namespace; feeds the short hash prefixed to element
    /// ids so ids from different templates never collide.
    pub namespace: String,
    pub module: ModuleKind,
    /// Raw JS prepended verbatim before the factory.
    pub prepend: String,
    /// Raw JS appended verbatim after the factory.
    pub append: String,
    /// Emit a runtime version guard at the top of the factory.
    pub version_check: bool,
    /// Attribute-name rewrites applied after classification,
    /// e.g. `"class" -> "className"`.
    pub attr_overrides: FxHashMap<String, String>,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            entry_mode: "logic".to_string(),
            dialect: Dialect::default(),
            namespace: "main".to_string(),
            module: ModuleKind::default(),
            prepend: String::new(),
            append: String::new(),
            version_check: false,
            attr_overrides: FxHashMap::default(),
        }
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::expect_used,
    reason = "test assertions use unwrap/expect for clarity"
)]
mod tests {
    use super::{Dialect, ModuleKind, Options};
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_are_logic_es6_bare() {
        let opts = Options::default();
        assert_eq!(opts.entry_mode, "logic");
        assert_eq!(opts.dialect, Dialect::Es6);
        assert_eq!(opts.module, ModuleKind::None);
        assert!(!opts.version_check);
    }

    #[test]
    fn deserializes_partial_json() {
        let opts: Options = serde_json::from_str(
            r#"{ "dialect": "es5", "module": "commonjs", "namespace": "app" }"#,
        )
        .expect("valid options json");
        assert_eq!(opts.dialect, Dialect::Es5);
        assert_eq!(opts.module, ModuleKind::CommonJs);
        assert_eq!(opts.namespace, "app");
        assert_eq!(opts.entry_mode, "logic");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let r: Result<Options, _> = serde_json::from_str(r#"{ "dialekt": "es5" }"#);
        assert!(r.is_err());
    }
}
