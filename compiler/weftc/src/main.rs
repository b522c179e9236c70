//! Weft Compiler CLI
//!
//! Reads a `.weft` template, prints the generated JavaScript or the
//! diagnostics that stopped it.

use std::io::IsTerminal;
use std::path::Path;
use std::process::exit;

use tracing_subscriber::EnvFilter;
use weft_compile::{Dialect, Engine, IdGen, ModuleKind, Options};
use weft_diagnostic::{ColorMode, TerminalEmitter};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        exit(1);
    }

    match args[1].as_str() {
        "compile" => {
            if args.len() < 3 {
                eprintln!("Usage: weftc compile <file.weft> [options]");
                eprintln!();
                eprintln!("Options:");
                eprintln!("  -o <path>             Output file (default: stdout)");
                eprintln!("  --config=<file.json>  Load compile options from JSON");
                eprintln!("  --dialect=<es5|es6>   Target dialect");
                eprintln!("  --module=<kind>       Wrapper: none, commonjs, esm, iife");
                eprintln!("  --namespace=<ns>      Identifier namespace");
                eprintln!("  --features            Print used runtime entry points");
                eprintln!("  --color=<mode>        Color: auto, always, never");
                exit(1);
            }
            let cli = match CliOptions::parse(&args[2..]) {
                Ok(cli) => cli,
                Err(msg) => {
                    eprintln!("error: {msg}");
                    exit(1);
                }
            };
            compile_file(&cli, false);
        }
        "check" => {
            if args.len() < 3 {
                eprintln!("Usage: weftc check <file.weft> [options]");
                exit(1);
            }
            let cli = match CliOptions::parse(&args[2..]) {
                Ok(cli) => cli,
                Err(msg) => {
                    eprintln!("error: {msg}");
                    exit(1);
                }
            };
            compile_file(&cli, true);
        }
        "--help" | "-h" | "help" => print_usage(),
        other => {
            eprintln!("error: unknown command `{other}`");
            print_usage();
            exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Weft template compiler");
    eprintln!();
    eprintln!("Usage: weftc <command> [options]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  compile <file.weft>  Compile a template to JavaScript");
    eprintln!("  check <file.weft>    Compile without writing output");
}

struct CliOptions {
    input: String,
    output: Option<String>,
    options: Options,
    namespace: Option<String>,
    print_features: bool,
    color: ColorMode,
}

impl CliOptions {
    fn parse(args: &[String]) -> Result<CliOptions, String> {
        let mut input = None;
        let mut output = None;
        let mut options = Options::default();
        let mut namespace = None;
        let mut print_features = false;
        let mut color = ColorMode::Auto;

        let mut i = 0;
        while i < args.len() {
            let arg = &args[i];
            if arg == "-o" {
                let Some(path) = args.get(i + 1) else {
                    return Err("`-o` requires a path".to_string());
                };
                output = Some(path.clone());
                i += 2;
                continue;
            }
            if let Some(path) = arg.strip_prefix("--config=") {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| format!("cannot read config `{path}`: {e}"))?;
                options = serde_json::from_str(&text)
                    .map_err(|e| format!("invalid config `{path}`: {e}"))?;
            } else if let Some(d) = arg.strip_prefix("--dialect=") {
                options.dialect = match d {
                    "es5" => Dialect::Es5,
                    "es6" => Dialect::Es6,
                    other => return Err(format!("unknown dialect `{other}`")),
                };
            } else if let Some(m) = arg.strip_prefix("--module=") {
                options.module = match m {
                    "none" => ModuleKind::None,
                    "commonjs" => ModuleKind::CommonJs,
                    "esm" => ModuleKind::Esm,
                    "iife" => ModuleKind::Iife,
                    other => return Err(format!("unknown module kind `{other}`")),
                };
            } else if let Some(ns) = arg.strip_prefix("--namespace=") {
                namespace = Some(ns.to_string());
            } else if arg == "--features" {
                print_features = true;
            } else if let Some(c) = arg.strip_prefix("--color=") {
                color = match c {
                    "auto" => ColorMode::Auto,
                    "always" => ColorMode::Always,
                    "never" => ColorMode::Never,
                    other => return Err(format!("unknown color mode `{other}`")),
                };
            } else if !arg.starts_with('-') && input.is_none() {
                input = Some(arg.clone());
            } else {
                return Err(format!("unknown option `{arg}`"));
            }
            i += 1;
        }

        let Some(input) = input else {
            return Err("missing input file".to_string());
        };
        Ok(CliOptions {
            input,
            output,
            options,
            namespace,
            print_features,
            color,
        })
    }
}

fn compile_file(cli: &CliOptions, check_only: bool) {
    let source = match std::fs::read_to_string(&cli.input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: cannot read `{}`: {e}", cli.input);
            exit(1);
        }
    };

    let namespace = cli.namespace.clone().unwrap_or_else(|| {
        Path::new(&cli.input)
            .file_stem()
            .map_or_else(|| "main".to_string(), |s| s.to_string_lossy().into_owned())
    });
    let mut options = cli.options.clone();
    options.namespace.clone_from(&namespace);

    let engine = Engine::new(options);
    let mut ids = IdGen::new(&namespace);
    let is_tty = std::io::stderr().is_terminal();
    let mut emitter = TerminalEmitter::with_color_mode(std::io::stderr(), cli.color, is_tty);

    match engine.compile(&source, &mut ids) {
        Ok(out) => {
            for warning in &out.warnings {
                emitter.emit(&warning.to_diagnostic(), &source);
            }
            if cli.print_features {
                eprintln!("features: {}", out.features.entry_points().join(", "));
            }
            if check_only {
                eprintln!(
                    "ok: `{}` ({} warnings, {:?})",
                    cli.input,
                    out.warnings.len(),
                    out.elapsed
                );
                return;
            }
            match &cli.output {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, &out.code) {
                        eprintln!("error: cannot write `{path}`: {e}");
                        exit(1);
                    }
                }
                None => println!("{}", out.code),
            }
        }
        Err(err) => {
            emitter.emit(&err.diagnostic, &source);
            exit(1);
        }
    }
}
