#![deny(clippy::expect_used)]
//! tabc Command-Line Interface
//!
//! Usage:
//!   tabc compile <name> [--opt] [--run] [--parse-only] [--typecheck-only] [--verbose]
//!
//! Reads `playground/<name>.py`, runs it through the five compilation
//! stages, and writes `<name>.c`, `<name>.ir.txt`, and (with `--run`) a
//! compiled executable that is then invoked.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{self, Command};

use tabc::pipeline::{compile_source, dump_ir};
use tabc::type_checker::TypeChecker;

/// Parsed command-line arguments for `tabc compile`.
#[derive(Debug)]
struct Args {
    name: Option<String>,
    optimize: bool,
    run: bool,
    parse_only: bool,
    typecheck_only: bool,
    verbose: bool,
    show_help: bool,
}

impl Args {
    fn parse(raw: &[String]) -> Self {
        let mut parsed = Args {
            name: None,
            optimize: false,
            run: false,
            parse_only: false,
            typecheck_only: false,
            verbose: false,
            show_help: false,
        };

        for arg in raw {
            match arg.as_str() {
                "-h" | "--help" => parsed.show_help = true,
                "--opt" => parsed.optimize = true,
                "--run" => parsed.run = true,
                "-p" | "--parse-only" => parsed.parse_only = true,
                "-t" | "--typecheck-only" => parsed.typecheck_only = true,
                "-v" | "--verbose" => parsed.verbose = true,
                arg if !arg.starts_with('-') => {
                    if parsed.name.is_none() {
                        parsed.name = Some(arg.to_string());
                    }
                }
                other => {
                    eprintln!("Unknown option: {}", other);
                }
            }
        }

        parsed
    }
}

fn print_help() {
    println!(
        r#"tabc - tab-indented scripting language to C compiler

USAGE:
    tabc compile <name> [OPTIONS]

OPTIONS:
    --opt              Enable the constant-folding / dead-branch optimizer
    --run              Compile the emitted C with a system C compiler and run it
    -p, --parse-only   Stop after parsing
    -t, --typecheck-only  Stop after type-checking
    -v, --verbose      Print progress at each stage
    -h, --help         Show this help message

INPUT / OUTPUT:
    Reads playground/<name>.py
    Writes <name>.c, <name>.ir.txt, and (with --run) an executable <name>
"#
    );
}

fn main() {
    let raw: Vec<String> = env::args().skip(1).collect();

    if raw.is_empty() || raw[0] != "compile" {
        print_help();
        process::exit(if raw.is_empty() { 0 } else { 1 });
    }

    let args = Args::parse(&raw[1..]);

    if args.show_help {
        print_help();
        return;
    }

    let name = args.name.unwrap_or_else(|| {
        eprintln!("Error: compile requires a program name");
        print_help();
        process::exit(1);
    });

    let source_path = PathBuf::from("playground").join(format!("{}.py", name));
    if args.verbose {
        println!("* Reading file {}", source_path.display());
    }
    let source = fs::read_to_string(&source_path).unwrap_or_else(|e| {
        eprintln!("Error reading {}: {}", source_path.display(), e);
        process::exit(1);
    });

    if args.verbose {
        println!("* Scanning and Parsing...");
    }
    let block = tabc_parser::parse(&source).unwrap_or_else(|e| {
        eprintln!("{}", tabc::CompileError::from(e));
        process::exit(1);
    });

    if args.parse_only {
        println!("Parsed {} successfully ({} statements)", source_path.display(), block.len());
        return;
    }

    if args.verbose {
        println!("* Typechecking...");
    }
    let mut checker = TypeChecker::new();
    if let Err(e) = checker.check_program(&block) {
        eprintln!("{}", e);
        process::exit(1);
    }

    if args.typecheck_only {
        println!("Typechecked {} successfully", source_path.display());
        return;
    }

    if args.verbose {
        println!("* Generating IR, building the C AST, and emitting C...");
    }
    let artifacts = compile_source(&source, args.optimize).unwrap_or_else(|e| {
        eprintln!("{}", e);
        process::exit(1);
    });

    let c_path = format!("{}.c", name);
    let ir_path = format!("{}.ir.txt", name);

    if let Err(e) = fs::write(&c_path, &artifacts.c_source) {
        eprintln!("Error writing {}: {}", c_path, e);
        process::exit(1);
    }
    if let Err(e) = fs::write(&ir_path, dump_ir(&artifacts.ir)) {
        eprintln!("Error writing {}: {}", ir_path, e);
        process::exit(1);
    }

    println!("Compiled {} -> {}", source_path.display(), c_path);

    if args.run {
        let exe_path = name.clone();
        let status = invoke_c_toolchain(&c_path, &exe_path);
        let status = status.unwrap_or_else(|e| {
            eprintln!("Toolchain Error: {}", e);
            process::exit(1);
        });
        if !status.success() {
            process::exit(status.code().unwrap_or(1));
        }

        let run_status = Command::new(Path::new(".").join(&exe_path))
            .status()
            .unwrap_or_else(|e| {
                eprintln!("Toolchain Error: failed to run {}: {}", exe_path, e);
                process::exit(1);
            });
        process::exit(run_status.code().unwrap_or(0));
    }
}

/// Invokes the system C compiler, returning its exit status. stderr is
/// inherited so a compile failure in the emitted C is visible verbatim.
fn invoke_c_toolchain(c_path: &str, exe_path: &str) -> std::io::Result<process::ExitStatus> {
    let cc = env::var("CC").unwrap_or_else(|_| "cc".to_string());
    Command::new(cc).arg(c_path).arg("-o").arg(exe_path).status()
}
