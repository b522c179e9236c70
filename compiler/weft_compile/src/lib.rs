//! Single-pass template-to-JavaScript transpiler.
//!
//! A weft template interleaves markup, logic statements, and style
//! blocks; compilation is one forward scan that emits JavaScript as it
//! goes. There is no host-language AST: places whose final text depends
//! on later input (statement heads that may become reactive rebuild
//! calls, function-body openings) are reserved as buffer slots and
//! filled by a rewrite pass at the end of the scan.
//!
//! ```
//! use weft_compile::{Engine, IdGen, Options};
//!
//! let engine = Engine::new(Options::default());
//! let mut ids = IdGen::new("docs");
//! let out = engine
//!     .compile("<div> hello {name} </div>", &mut ids)
//!     .expect("template compiles");
//! assert!(out.code.contains("wf.el"));
//! ```

mod buffer;
mod config;
mod deps;
mod driver;
mod error;
mod features;
mod idgen;
mod js;
mod mode;
mod statement;
mod table;
mod tag;

use std::time::Duration;

pub use config::{Dialect, ModuleKind, Options};
pub use error::CompileError;
pub use features::FeatureSet;
pub use idgen::IdGen;
pub use weft_diagnostic::{Diagnostic, ErrorCode, Warning};

use table::ModeTable;

/// A configured compiler, reusable across templates.
///
/// The options and the mode table are resolved once; each
/// [`compile`](Engine::compile) call is independent apart from the
/// caller-owned [`IdGen`].
pub struct Engine {
    options: Options,
    table: ModeTable,
}

impl Engine {
    pub fn new(options: Options) -> Self {
        Engine {
            options,
            table: ModeTable::standard(),
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Transpile one template. Identifier state lives in `ids` so the
    /// caller decides what shares an id sequence and when it resets.
    pub fn compile(&self, source: &str, ids: &mut IdGen) -> Result<Output, CompileError> {
        driver::run(&self.options, &self.table, source, ids)
    }
}

/// Result of one successful compile.
#[derive(Debug)]
pub struct Output {
    /// Generated JavaScript, module wrapping applied.
    pub code: String,
    /// Runtime entry points the generated code calls.
    pub features: FeatureSet,
    /// Non-fatal conditions encountered along the way.
    pub warnings: Vec<Warning>,
    /// Wall-clock compile time.
    pub elapsed: Duration,
}
