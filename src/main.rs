use std::fs;
use std::path::PathBuf;

use clap::Parser;
use log::info;
use partlogica::{analyze_with, realize, CompileOptions, CompileStack};

/// Compile a logic program into an encoded list of parts.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Source program
    input: PathBuf,

    /// Where to write the encoded parts
    output: PathBuf,

    /// Add a hidden `_INIT` button input that primes every inverter
    #[arg(long)]
    init_pulse: bool,

    /// Print the analyzed name table as JSON
    #[arg(long)]
    dump_names: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let code = fs::read_to_string(&args.input)?;
    let options = CompileOptions {
        init_pulse: args.init_pulse,
    };

    let table = analyze_with(&code, &options)?;
    if args.dump_names {
        println!("{}", serde_json::to_string_pretty(&table)?);
    }

    let mut stack = CompileStack::new();
    realize(&table, &mut stack)?;
    fs::write(&args.output, stack.terminate()?)?;

    info!(
        "wrote {} parts for {} names to {}",
        stack.len(),
        table.len(),
        args.output.display()
    );
    Ok(())
}
