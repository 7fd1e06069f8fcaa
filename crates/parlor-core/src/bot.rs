//! Computer opponent for chess.
//!
//! Difficulty levels:
//! - Easy: a random legal move
//! - Medium: one ply of material search
//! - Hard: two plies of material search

use crate::chess::{ChessError, ChessMove, ChessPosition, MaterialTable, MoveDescriptor};
use crate::search::GameTreeSearch;
use rand::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Opponent difficulty level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

impl Difficulty {
    /// Search depth, `None` for random play
    pub fn depth(self) -> Option<u32> {
        match self {
            Difficulty::Easy => None,
            Difficulty::Medium => Some(1),
            Difficulty::Hard => Some(2),
        }
    }
}

/// A computer player that picks moves for whichever side is to move
pub struct ComputerOpponent {
    pub difficulty: Difficulty,
    search: GameTreeSearch<MaterialTable>,
    rng: StdRng,
}

impl ComputerOpponent {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            search: GameTreeSearch::new(MaterialTable::default()),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn with_seed(difficulty: Difficulty, seed: u64) -> Self {
        Self {
            difficulty,
            search: GameTreeSearch::new(MaterialTable::default()),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Pick a move in `position`, leaving it unchanged
    pub fn choose(&mut self, position: &mut ChessPosition) -> Option<ChessMove> {
        match self.difficulty.depth() {
            None => position.legal_moves().choose(&mut self.rng).copied(),
            Some(depth) => {
                let report = self.search.search(position, depth);
                debug!(
                    difficulty = ?self.difficulty,
                    nodes = report.nodes,
                    "computer move searched"
                );
                report.best.map(|(mv, _)| mv)
            }
        }
    }

    /// Pick a move for the position given as FEN
    pub fn choose_move(&mut self, fen: &str) -> Result<Option<MoveDescriptor>, ChessError> {
        let mut position = ChessPosition::from_fen(fen)?;
        Ok(self.choose(&mut position).map(|mv| mv.descriptor()))
    }
}
