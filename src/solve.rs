use std::collections::VecDeque;
use std::ops::ControlFlow;
use std::rc::Rc;
use std::task::Poll;

use log::{debug, trace};

use crate::{movegen, Board, Layout, Level, Move, Puzzle};

type IndexSet<K> = indexmap::IndexSet<K, fxhash::FxBuildHasher>;

/// Queue pops processed per [`Search::step`] unless configured otherwise.
pub const DEFAULT_BATCH_SIZE: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    pub batch_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Shortest move sequence, first move first. Empty if already solved.
    Solved(Vec<Move>),
    NoSolution,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ready,
    Running,
    Solved,
    Exhausted,
    Cancelled,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub batches: usize,
    /// States dequeued, goal-checked and expanded.
    pub expanded: usize,
    /// States dropped because an equal layout was already visited.
    pub duplicates: usize,
    pub enqueued: usize,
    /// Move count of the most recently dequeued state.
    pub depth: usize,
}

/// Link of the move chain. A node keeps only its last move; earlier moves are
/// shared with its siblings and released once no queued node refers to them.
#[derive(Debug)]
struct MoveLink {
    mv: Move,
    prev: Option<Rc<MoveLink>>,
}

struct Node {
    layout: Layout,
    last_move: Option<Rc<MoveLink>>,
    depth: usize,
}

/// Walks the chain back to the seed and returns the moves start to goal.
fn reconstruct(last_move: Option<&Rc<MoveLink>>) -> Vec<Move> {
    let mut moves = std::iter::successors(last_move.map(Rc::as_ref), |link| link.prev.as_deref())
        .map(|link| link.mv)
        .collect::<Vec<_>>();
    moves.reverse();
    moves
}

/// A time-sliced breadth-first search over piece layouts.
///
/// Owns its own copy of the puzzle, so the host may keep mutating its board
/// while a search is in flight. Call [`Search::step`] until it is ready, or
/// [`Search::cancel`] to abandon it.
pub struct Search {
    level: Level,
    config: SearchConfig,
    status: Status,
    queue: VecDeque<Node>,
    visited: IndexSet<Layout>,
    stats: Stats,
    outcome: Option<Outcome>,
}

impl Search {
    pub fn new(puzzle: Puzzle, config: SearchConfig) -> Self {
        let Puzzle { level, layout } = puzzle;
        let mut search = Self {
            level,
            config: SearchConfig {
                batch_size: config.batch_size.max(1),
            },
            status: Status::Ready,
            queue: VecDeque::new(),
            visited: IndexSet::default(),
            stats: Stats::default(),
            outcome: None,
        };
        if search.level.main_index().is_none() {
            debug!("No main piece, skipping search");
            search.finish(Status::Exhausted, Outcome::NoSolution);
        } else {
            search.queue.push_back(Node {
                layout,
                last_move: None,
                depth: 0,
            });
        }
        search
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn stats(&self) -> &Stats {
        &self.stats
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    fn finish(&mut self, status: Status, outcome: Outcome) -> Outcome {
        self.queue = VecDeque::new();
        self.visited = IndexSet::default();
        self.status = status;
        self.outcome = Some(outcome.clone());
        outcome
    }

    /// Processes at most one batch of queued states.
    ///
    /// Once terminal, every further call returns the same outcome.
    pub fn step(&mut self) -> Poll<Outcome> {
        if let Some(outcome) = &self.outcome {
            return Poll::Ready(outcome.clone());
        }
        if self.status == Status::Ready {
            debug!(
                "Searching {} pieces on {}x{}",
                self.level.pieces().len(),
                self.level.bounds().width,
                self.level.bounds().height,
            );
            self.status = Status::Running;
        }
        self.stats.batches += 1;

        for _ in 0..self.config.batch_size {
            #[cfg(feature = "coz")]
            coz::scope!("Pop");

            let Some(node) = self.queue.pop_front() else {
                debug!("Exhausted after {} states", self.stats.expanded);
                return Poll::Ready(self.finish(Status::Exhausted, Outcome::NoSolution));
            };
            self.stats.depth = node.depth;

            let (index, fresh) = self.visited.insert_full(node.layout);
            if !fresh {
                self.stats.duplicates += 1;
                continue;
            }
            self.stats.expanded += 1;
            let layout = &self.visited[index];

            if layout.is_goal(&self.level) {
                let moves = reconstruct(node.last_move.as_ref());
                debug!(
                    "Solved in {} moves after {} states",
                    moves.len(),
                    self.stats.expanded,
                );
                return Poll::Ready(self.finish(Status::Solved, Outcome::Solved(moves)));
            }

            let board = Board::of(&self.level, layout);
            for (i, piece) in self.level.pieces().iter().enumerate() {
                for sign in [1, -1] {
                    for (distance, next) in movegen::slides(&self.level, layout, &board, i, sign) {
                        #[cfg(feature = "coz")]
                        coz::progress!("Enqueue");

                        let link = MoveLink {
                            mv: Move {
                                piece: piece.id(),
                                distance,
                            },
                            prev: node.last_move.clone(),
                        };
                        self.queue.push_back(Node {
                            layout: next,
                            last_move: Some(Rc::new(link)),
                            depth: node.depth + 1,
                        });
                        self.stats.enqueued += 1;
                    }
                }
            }
        }

        trace!("Batch {}: {:?}", self.stats.batches, self.stats);
        Poll::Pending
    }

    /// Abandons the search, dropping the queue and visited set.
    ///
    /// A search that already finished keeps its outcome.
    pub fn cancel(&mut self) -> Outcome {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        debug!("Cancelled after {} states", self.stats.expanded);
        self.finish(Status::Cancelled, Outcome::Cancelled)
    }

    /// Drives the search to the end, calling `on_batch` between batches.
    /// Breaking from the callback cancels the search.
    pub fn run(&mut self, mut on_batch: impl FnMut(&Stats) -> ControlFlow<()>) -> Outcome {
        loop {
            if let Poll::Ready(outcome) = self.step() {
                return outcome;
            }
            if on_batch(&self.stats).is_break() {
                return self.cancel();
            }
        }
    }
}

/// Searches for the shortest hint sequence with the default configuration.
pub fn bfs(puzzle: Puzzle, mut on_batch: impl FnMut(&Stats)) -> Outcome {
    Search::new(puzzle, SearchConfig::default()).run(|stats| {
        on_batch(stats);
        ControlFlow::Continue(())
    })
}
