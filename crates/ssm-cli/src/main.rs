//! Simple Stack Machine - CLI
//!
//! Assemble and execute SSM programs.
//!
//! Usage:
//!   `ssm run <FILE> [--asm] [--tape-capacity N] [--max-stack N]`
//!   `ssm asm <SOURCE> -o <OUT>`

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use ssm_core::bytecode::assemble_for_capacity;
use ssm_core::{Machine, MachineConfig, SsmError};

#[derive(Parser, Debug)]
#[command(name = "ssm")]
#[command(about = "Simple Stack Machine: assemble and run tape programs")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Execute a program on the console
    Run {
        /// Raw bytecode, or assembly source with --asm (or a .ssm extension)
        file: PathBuf,

        /// Treat FILE as assembly source
        #[arg(long)]
        asm: bool,

        /// Tape size in bytes
        #[arg(long, default_value_t = ssm_core::TAPE_CAPACITY)]
        tape_capacity: usize,

        /// Operand stack depth limit
        #[arg(long)]
        max_stack: Option<usize>,
    },

    /// Assemble source into raw bytecode
    Asm {
        /// Assembly source file
        source: PathBuf,

        /// Output bytecode file
        #[arg(short, long)]
        output: PathBuf,
    },
}

/// Logs go to stderr so program output on stdout stays clean.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Run {
            file,
            asm,
            tape_capacity,
            max_stack,
        } => {
            let mut config = MachineConfig::with_tape_capacity(tape_capacity);
            if let Some(depth) = max_stack {
                config.max_stack_depth = depth;
            }
            run(&file, asm, config)
        }
        Command::Asm { source, output } => assemble_file(&source, &output),
    };

    if let Err(e) = result {
        error!("{}", e);
        process::exit(1);
    }
}

fn is_source(path: &Path, asm: bool) -> bool {
    asm || path.extension().map_or(false, |ext| ext == "ssm")
}

fn read_program(path: &Path, asm: bool, capacity: usize) -> Result<Vec<u8>, SsmError> {
    if is_source(path, asm) {
        let source = fs::read_to_string(path)?;
        assemble_for_capacity(&source, capacity)
    } else {
        Ok(fs::read(path)?)
    }
}

fn run(path: &Path, asm: bool, config: MachineConfig) -> Result<(), SsmError> {
    let program = read_program(path, asm, config.tape_capacity)?;
    info!(path = %path.display(), bytes = program.len(), "loading program");

    let mut vm = Machine::new(config, ssm_host::console());
    vm.load(&program)?;
    let outcome = vm.run();
    vm.host_mut().flush()?;

    match outcome {
        Ok(()) => {
            info!(steps = vm.steps(), "program halted");
            Ok(())
        }
        Err(e) => {
            error!(ip = vm.instruction_pointer(), steps = vm.steps(), "runtime error");
            Err(e)
        }
    }
}

fn assemble_file(source: &Path, output: &Path) -> Result<(), SsmError> {
    let text = fs::read_to_string(source)?;
    let program = assemble_for_capacity(&text, ssm_core::TAPE_CAPACITY)?;
    fs::write(output, &program)?;
    info!(output = %output.display(), bytes = program.len(), "assembled");
    Ok(())
}
