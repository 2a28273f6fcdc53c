use anyhow::Context;
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use xwordcsp::{render_grid, Puzzle, Solver, SolverConfig, Vocabulary, DEFAULT_BLOCKED_MARKER};

/// Fill a crossword structure with words from a word list.
#[derive(Parser)]
#[command(name = "xwordcsp")]
#[command(version)]
struct Cli {
    /// Grid layout, one row per line
    #[arg(value_name = "STRUCTURE")]
    structure: PathBuf,

    /// Word list, one word per line
    #[arg(value_name = "WORDS")]
    words: PathBuf,

    /// Where to write the filled grid
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Character marking blocked cells in the structure file
    #[arg(long, default_value_t = DEFAULT_BLOCKED_MARKER)]
    blocked: char,

    /// Maintain arc consistency during the search
    #[arg(long)]
    inference: bool,
}

fn run(cli: Cli) -> anyhow::Result<bool> {
    let template = fs::read_to_string(&cli.structure)
        .with_context(|| format!("failed to read structure {}", cli.structure.display()))?;
    let puzzle = Puzzle::from_template(&template, cli.blocked)
        .with_context(|| format!("invalid structure {}", cli.structure.display()))?;
    let vocabulary = Vocabulary::load(&cli.words)?;

    log::info!(
        "Solving {}x{} grid with {} slots and {} words",
        puzzle.width,
        puzzle.height,
        puzzle.variables.len(),
        vocabulary.len()
    );

    let config = SolverConfig { inference: cli.inference };
    let solution = match Solver::new(&puzzle, &vocabulary, config).solve() {
        Ok(solution) => solution,
        Err(failure) => {
            log::info!("{}", failure);
            println!("No solution.");
            return Ok(false);
        }
    };

    let display_grid = render_grid(&puzzle, &solution);
    println!("{:?}", solution.statistics);
    println!("{}", display_grid);

    if let Some(output) = &cli.output {
        fs::write(output, display_grid + "\n")
            .with_context(|| format!("failed to write {}", output.display()))?;
        println!("written file to {}", output.display());
    }

    Ok(true)
}

fn main() -> ExitCode {
    env_logger::init();

    match run(Cli::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {:#}", err);
            ExitCode::from(2)
        }
    }
}
