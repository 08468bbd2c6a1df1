//! Vela compiler CLI.
//!
//! Command-line interface for compiling .vela programs to x86-64 assembly
//! and inspecting the compiler's intermediate representation.

use clap::{CommandFactory, Parser as ClapParser, Subcommand};
use clap_complete::{Shell, generate};
use std::io;
use std::path::{Path, PathBuf};
use std::process;

#[derive(ClapParser)]
#[command(name = "velac")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Vela compiler - compile .vela programs to x86-64 assembly", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a .vela file to GNU-assembler text
    Build {
        /// Input .vela source file
        input: PathBuf,

        /// Output assembly path (defaults to the input with a .s extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the intermediate representation of a .vela file
    Ir {
        /// Input .vela source file
        input: PathBuf,
    },

    /// Type-check and execute a .vela file in the interpreter
    Run {
        /// Input .vela source file
        input: PathBuf,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { input, output } => {
            let output = output.unwrap_or_else(|| input.with_extension("s"));
            run_build(&input, &output);
        }
        Commands::Ir { input } => run_ir(&input),
        Commands::Run { input } => run_interpreted(&input),
        Commands::Completions { shell } => run_completions(shell),
    }
}

fn run_build(input: &Path, output: &Path) {
    match velac::compile_file(input, output) {
        Ok(()) => {
            println!("Compiled {} -> {}", input.display(), output.display());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_ir(input: &Path) {
    let source = match std::fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Failed to read source file: {}", e);
            process::exit(1);
        }
    };
    match velac::compile_to_ir(&source, &input.display().to_string()) {
        Ok(functions) => println!("{}", velac::ir_to_string(&functions)),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_interpreted(input: &Path) {
    let source = match std::fs::read_to_string(input) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error: Failed to read source file: {}", e);
            process::exit(1);
        }
    };
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut reader = stdin.lock();
    let mut writer = stdout.lock();
    if let Err(e) = velac::run_program(
        &source,
        &input.display().to_string(),
        &mut reader,
        &mut writer,
    ) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "velac", &mut io::stdout());
}
