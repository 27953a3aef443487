use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use env_logger::Env;

use vmil_translator::{driver, Options};

#[derive(Parser)]
#[command(name = "vmil")]
#[command(about = "Translates VM code (.vm) into Hack assembly (.asm)")]
#[command(version)]
struct Cli {
    /// A .vm file, or a directory whose .vm files form one program
    #[arg(default_value = ".")]
    input: PathBuf,

    /// Output assembly file (defaults to the input with an .asm extension)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Function the bootstrap code calls
    #[arg(long, default_value = "Sys.init")]
    entry: String,

    /// Initial stack pointer
    #[arg(long, default_value = "256", value_parser = clap::value_parser!(u16).range(0..=32767))]
    stack_base: u16,

    /// Do not emit a comment line before each command's instructions
    #[arg(long)]
    no_annotate: bool,

    /// Log each unit and function as it is translated
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    let options = Options {
        entry: cli.entry,
        stack_base: cli.stack_base,
        annotate: !cli.no_annotate,
    };
    let written = driver::run(&cli.input, cli.output.as_deref(), options)?;
    println!("{}", written.display());
    Ok(())
}
