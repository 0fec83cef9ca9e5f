use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use codesnake::{Block, CodeWidth, Label, LineIndex};
use thaumgen::SymbolTable;
use tracing_subscriber::filter::EnvFilter;
use yansi::Paint;

#[derive(Parser)]
#[command(name = "thaumgen", version, about = "Instruction-table compiler for the Thaum VM")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the switch-case dispatch fragment for a bytecode set
    DispatchTable {
        spec: Option<PathBuf>,
        out: Option<PathBuf>,
    },
    /// Generate the per-slot bytecode macro table
    BytecodeTable {
        spec: Option<PathBuf>,
        out: Option<PathBuf>,
    },
    /// Generate the numbered-primitive C table
    PrimitiveTable {
        /// Primitive specification, `-` for standard input
        spec: Option<String>,
        /// Output file, standard output when omitted
        out: Option<PathBuf>,
        /// Header to harvest symbolic primitive numbers from
        #[arg(long)]
        symbols: Option<PathBuf>,
        /// Recognized prefix of symbolic definitions
        #[arg(long, default_value = "THAUM_VM_SYSTEM_PRIMITIVE_NUMBER_")]
        prefix: String,
    },
}

fn main() -> anyhow::Result<()> {
    // stdout belongs to the generated fragment when OUT is omitted
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("warn".parse()?))
        .with_writer(io::stderr)
        .init();

    let Some(command) = Cli::parse().command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        Command::DispatchTable { spec, out } => bytecode_command(
            spec,
            out,
            "thaumgen dispatch-table <BytecodeSet.json> <DispatchTable.inc>",
            thaumgen::dispatch_table,
        ),
        Command::BytecodeTable { spec, out } => bytecode_command(
            spec,
            out,
            "thaumgen bytecode-table <BytecodeSet.json> <BytecodeTable.inc>",
            thaumgen::bytecode_table,
        ),
        Command::PrimitiveTable {
            spec,
            out,
            symbols,
            prefix,
        } => primitive_command(spec, out, symbols, &prefix),
    }
}

fn bytecode_command(
    spec: Option<PathBuf>,
    out: Option<PathBuf>,
    usage: &str,
    compile: fn(&str) -> Result<String, thaumgen::Error>,
) -> anyhow::Result<()> {
    let (Some(spec), Some(out)) = (spec, out) else {
        println!("{usage}");
        return Ok(());
    };
    let source = read_to_string(&spec)?;
    let fragment =
        compile(&source).map_err(|err| diagnose(&spec.display().to_string(), &source, err))?;
    fs::write(&out, fragment).with_context(|| format!("writing {}", out.display()))
}

fn primitive_command(
    spec: Option<String>,
    out: Option<PathBuf>,
    symbols: Option<PathBuf>,
    prefix: &str,
) -> anyhow::Result<()> {
    let symbols = match symbols {
        Some(path) => Some(SymbolTable::parse(&read_to_string(&path)?, prefix)),
        None => None,
    };
    let (origin, source) = match spec.as_deref() {
        None | Some("-") => {
            let piped = io::read_to_string(io::stdin()).context("reading standard input")?;
            (String::from("<stdin>"), piped)
        }
        Some(path) => (path.to_string(), read_to_string(Path::new(path))?),
    };
    let fragment = thaumgen::primitive_table(&source, symbols.as_ref())
        .map_err(|err| diagnose(&origin, &source, err))?;
    match out {
        Some(out) => {
            fs::write(&out, fragment).with_context(|| format!("writing {}", out.display()))
        }
        None => {
            print!("{fragment}");
            Ok(())
        }
    }
}

fn read_to_string(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
}

/// Points at the offending input when the error knows where it came from,
/// then hands the error itself back for the usual exit path.
fn diagnose(origin: &str, source: &str, err: thaumgen::Error) -> anyhow::Error {
    if let Some(span) = err.span() {
        let idx = LineIndex::new(source);
        let label = Label::new(span).with_text(err.to_string().red().to_string());
        if let Some(block) = Block::new(&idx, [label]) {
            let block = block.map_code(|c| CodeWidth::new(c, c.len()));
            eprintln!("{}[{origin}]", block.prologue());
            eprint!("{block}");
            eprintln!("{}", block.epilogue());
        }
    }
    anyhow::Error::new(err)
}
