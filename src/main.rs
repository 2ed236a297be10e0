use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::{Args, Parser, Subcommand};
use console::{Key, Term};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;

use slide_solver::solve::{Outcome, Search, SearchConfig, Stats, DEFAULT_BATCH_SIZE};
use slide_solver::{Move, PieceId, Puzzle, Vec2};

/// Finds shortest hint sequences for sliding-block levels.
#[derive(Parser)]
#[command(name = "slide-solver")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Solve one level and print its hint sequence.
    Solve {
        map: PathBuf,
        #[command(flatten)]
        opts: SearchOpts,
    },
    /// Check many levels in parallel and report their minimum move counts.
    Check {
        #[arg(required = true)]
        maps: Vec<PathBuf>,
        #[command(flatten)]
        opts: SearchOpts,
    },
    /// Play a level in the terminal, asking for hints on demand.
    Play {
        map: PathBuf,
        #[command(flatten)]
        opts: SearchOpts,
    },
}

#[derive(Args, Clone, Copy)]
struct SearchOpts {
    /// Queue pops per batch between progress updates.
    #[arg(long, default_value_t = DEFAULT_BATCH_SIZE)]
    batch_size: usize,
    /// Give up after this many batches.
    #[arg(long)]
    max_batches: Option<usize>,
}

impl SearchOpts {
    fn config(&self) -> SearchConfig {
        SearchConfig {
            batch_size: self.batch_size,
        }
    }

    fn search(&self, puzzle: Puzzle, mut on_batch: impl FnMut(&Stats)) -> Outcome {
        Search::new(puzzle, self.config()).run(|stats| {
            on_batch(stats);
            match self.max_batches {
                Some(max) if stats.batches >= max => ControlFlow::Break(()),
                _ => ControlFlow::Continue(()),
            }
        })
    }

    /// Searches with a spinner on stderr.
    fn search_with_spinner(&self, puzzle: Puzzle) -> Result<Outcome> {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} [{elapsed}] {msg}")?);
        let outcome = self.search(puzzle, |stats| {
            pb.set_message(format!(
                "depth {}, {} states, {} duplicates",
                stats.depth, stats.expanded, stats.duplicates,
            ));
            pb.tick();
        });
        pb.finish_and_clear();
        Ok(outcome)
    }
}

fn load(path: &Path) -> Result<Puzzle> {
    let map_data = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    map_data
        .parse::<Puzzle>()
        .with_context(|| format!("Failed to parse {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Solve { map, opts } => {
            let outcome = opts.search_with_spinner(load(&map)?)?;
            println!("{outcome}");
            Ok(())
        }
        Command::Check { maps, opts } => run_check(&maps, opts),
        Command::Play { map, opts } => run_play(load(&map)?, opts),
    }
}

fn run_check(maps: &[PathBuf], opts: SearchOpts) -> Result<()> {
    let pb = ProgressBar::new(maps.len() as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {wide_msg}")?);

    let results = maps
        .par_iter()
        .map(|path| {
            let result = load(path).map(|puzzle| opts.search(puzzle, |_| {}));
            pb.inc(1);
            pb.set_message(path.display().to_string());
            (path, result)
        })
        .collect::<Vec<_>>();
    pb.finish_and_clear();

    let mut failed_cnt = 0;
    for (path, result) in &results {
        let path = path.display();
        match result {
            Ok(Outcome::Solved(moves)) => println!("{path}: {} moves", moves.len()),
            Ok(Outcome::NoSolution) => println!("{path}: unsolvable"),
            Ok(Outcome::Cancelled) => println!("{path}: gave up"),
            Err(err) => {
                println!("{path}: {err:#}");
                failed_cnt += 1;
            }
        }
    }
    log::info!("Checked {} levels", results.len());
    ensure!(failed_cnt == 0, "{failed_cnt}/{} levels failed to load", results.len());
    Ok(())
}

enum Action {
    Exit,
    Select(PieceId),
    Slide(Vec2),
    Hint,
    Undo,
    Reset,
}

impl TryFrom<Key> for Action {
    type Error = ();

    fn try_from(key: Key) -> Result<Self, Self::Error> {
        Ok(match key {
            Key::ArrowLeft => Self::Slide(Vec2(-1, 0)),
            Key::ArrowRight => Self::Slide(Vec2(1, 0)),
            Key::ArrowUp => Self::Slide(Vec2(0, -1)),
            Key::ArrowDown => Self::Slide(Vec2(0, 1)),
            Key::Char(ch) if ch.is_ascii_alphabetic() => Self::Select(PieceId(ch as u8)),
            Key::Char('?') => Self::Hint,
            Key::Backspace | Key::Char('-') => Self::Undo,
            Key::Char('!') => Self::Reset,
            Key::Escape => Self::Exit,
            _ => return Err(()),
        })
    }
}

fn run_play(init_puzzle: Puzzle, opts: SearchOpts) -> Result<()> {
    let mut puzzle = init_puzzle.clone();
    let mut history = Vec::new();
    let level = init_puzzle.level();
    let mut selected = level.main_index().map(|i| level.pieces()[i].id());

    let term = Term::stderr();
    eprintln!("Type a piece letter to select it, arrows to slide, ? for a hint, - to undo, ! to reset, Esc to quit.");
    loop {
        eprintln!("{puzzle}");
        if puzzle.is_solved() {
            eprintln!("Solved in {} moves", history.len());
            break;
        }
        if let Some(id) = selected {
            eprintln!("Selected: {id}");
        }

        let action = loop {
            if let Ok(action) = Action::try_from(term.read_key()?) {
                break action;
            }
        };

        match action {
            Action::Exit => break,
            Action::Select(id) => {
                if puzzle.level().index_of(id).is_some() {
                    selected = Some(id);
                }
            }
            Action::Slide(dir) => {
                let Some(id) = selected else { continue };
                let Some(index) = puzzle.level().index_of(id) else { continue };
                let axis = puzzle.level().pieces()[index].axis();
                let distance = if dir == axis {
                    1
                } else if dir == axis * -1 {
                    -1
                } else {
                    continue;
                };
                let mut new_puzzle = puzzle.clone();
                if new_puzzle.apply(Move { piece: id, distance }).is_ok() {
                    history.push(puzzle);
                    puzzle = new_puzzle;
                }
            }
            Action::Hint => match opts.search_with_spinner(puzzle.clone())? {
                Outcome::Solved(moves) => match moves.first() {
                    Some(mv) => {
                        eprintln!("Hint: {mv} ({} moves left)", moves.len());
                        selected = Some(mv.piece);
                    }
                    None => eprintln!("Already solved"),
                },
                Outcome::NoSolution => eprintln!("No hint available"),
                Outcome::Cancelled => {}
            },
            Action::Undo => {
                if let Some(last_puzzle) = history.pop() {
                    puzzle = last_puzzle;
                }
            }
            Action::Reset => {
                history.push(puzzle);
                puzzle = init_puzzle.clone();
            }
        }
    }

    Ok(())
}
