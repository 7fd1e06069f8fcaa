//! Minimax search with alpha-beta pruning for two-player games.
//!
//! The engine works against any [`Position`]: a mutable game state that can
//! list legal moves, apply one in place, and undo the most recent apply. Every
//! apply made during a search is matched by an undo, so the position is back
//! in its original state when the search returns.
//!
//! Scores are always from the point of view of the side that was to move at
//! the root. Mate is worth a flat [`MATE_SCORE`] regardless of how deep it was
//! found.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Score of a checkmate, not scaled by ply
pub const MATE_SCORE: i32 = 10_000;

/// One of the two players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    White,
    Black,
}

impl Side {
    pub fn opponent(self) -> Side {
        match self {
            Side::White => Side::Black,
            Side::Black => Side::White,
        }
    }
}

/// Game state the search can walk.
///
/// `apply` must flip the side to move, and `undo` must exactly reverse the
/// latest `apply` that has not been undone yet.
pub trait Position {
    type Move: Clone;
    type Piece;

    fn side_to_move(&self) -> Side;

    /// Legal moves for the side to move, in a stable generation order
    fn legal_moves(&mut self) -> Vec<Self::Move>;

    fn apply(&mut self, mv: &Self::Move);

    fn undo(&mut self);

    /// The side to move has lost (checkmate or the game's equivalent)
    fn is_checkmate(&mut self) -> bool;

    fn is_draw(&mut self) -> bool;

    /// Every piece on the board with its owner
    fn pieces(&self) -> Vec<(Side, Self::Piece)>;
}

/// Material value of a piece
pub trait MaterialEvaluator<P> {
    fn value(&self, piece: &P) -> i32;
}

impl<P, F: Fn(&P) -> i32> MaterialEvaluator<P> for F {
    fn value(&self, piece: &P) -> i32 {
        self(piece)
    }
}

/// Signed material sum: `root_side`'s pieces count for, the rest against.
pub fn evaluate<P, E>(position: &P, root_side: Side, evaluator: &E) -> i32
where
    P: Position,
    E: MaterialEvaluator<P::Piece>,
{
    position
        .pieces()
        .iter()
        .map(|(side, piece)| {
            let value = evaluator.value(piece);
            if *side == root_side {
                value
            } else {
                -value
            }
        })
        .sum()
}

/// Outcome of a root search
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchReport<M> {
    /// Best move and its score, `None` if there was nothing to play
    pub best: Option<(M, i32)>,
    /// Positions visited, root children included
    pub nodes: u64,
}

/// Alpha-beta searcher bound to one material table
#[derive(Debug, Clone)]
pub struct GameTreeSearch<E> {
    evaluator: E,
    nodes: u64,
}

impl<E> GameTreeSearch<E> {
    pub fn new(evaluator: E) -> Self {
        Self {
            evaluator,
            nodes: 0,
        }
    }

    /// Positions visited since this searcher was created
    pub fn nodes(&self) -> u64 {
        self.nodes
    }

    /// Score `position` by searching `depth` plies.
    ///
    /// Moves are tried in generation order and the loop stops as soon as
    /// `beta <= alpha`; the value returned is the same an unpruned minimax
    /// would give.
    pub fn minimax<P>(
        &mut self,
        position: &mut P,
        depth: u32,
        mut alpha: i32,
        mut beta: i32,
        maximizing: bool,
        root_side: Side,
    ) -> i32
    where
        P: Position,
        E: MaterialEvaluator<P::Piece>,
    {
        if position.is_checkmate() {
            return if position.side_to_move() == root_side {
                -MATE_SCORE
            } else {
                MATE_SCORE
            };
        }
        if position.is_draw() {
            return 0;
        }
        if depth == 0 {
            return evaluate(position, root_side, &self.evaluator);
        }

        let moves = position.legal_moves();
        if moves.is_empty() {
            // Not mate and not a draw, but nothing to play: score it as a leaf
            return evaluate(position, root_side, &self.evaluator);
        }

        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for mv in &moves {
            position.apply(mv);
            self.nodes += 1;
            let score = self.minimax(position, depth - 1, alpha, beta, !maximizing, root_side);
            position.undo();

            if maximizing {
                best = best.max(score);
                alpha = alpha.max(best);
            } else {
                best = best.min(score);
                beta = beta.min(best);
            }
            if beta <= alpha {
                break;
            }
        }
        best
    }

    /// Search every root move and report the first one with the highest score.
    pub fn search<P>(&mut self, position: &mut P, depth: u32) -> SearchReport<P::Move>
    where
        P: Position,
        E: MaterialEvaluator<P::Piece>,
    {
        let start_nodes = self.nodes;
        let root_side = position.side_to_move();
        let moves = position.legal_moves();

        let mut best: Option<(P::Move, i32)> = None;
        for mv in moves {
            position.apply(&mv);
            self.nodes += 1;
            let score = self.minimax(
                position,
                depth.saturating_sub(1),
                i32::MIN,
                i32::MAX,
                false,
                root_side,
            );
            position.undo();

            if best.as_ref().map_or(true, |(_, best_score)| score > *best_score) {
                best = Some((mv, score));
            }
        }

        let nodes = self.nodes - start_nodes;
        debug!(
            ?root_side,
            depth,
            nodes,
            score = ?best.as_ref().map(|(_, s)| *s),
            "search finished"
        );
        SearchReport { best, nodes }
    }

    /// Best move for the side to move, or `None` when it has no legal move.
    pub fn pick_best_move<P>(&mut self, position: &mut P, depth: u32) -> Option<P::Move>
    where
        P: Position,
        E: MaterialEvaluator<P::Piece>,
    {
        self.search(position, depth).best.map(|(mv, _)| mv)
    }
}

/// One-shot [`GameTreeSearch::pick_best_move`]
pub fn pick_best_move<P, E>(position: &mut P, depth: u32, evaluator: E) -> Option<P::Move>
where
    P: Position,
    E: MaterialEvaluator<P::Piece>,
{
    GameTreeSearch::new(evaluator).pick_best_move(position, depth)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A hand-written game tree. Leaves carry material for White ("gain")
    /// as a single piece; interior nodes list children.
    #[derive(Debug, Clone, PartialEq)]
    enum Node {
        Leaf(i32),
        Mate,
        Draw,
        Branch(Vec<Node>),
    }

    #[derive(Debug, Clone, PartialEq)]
    struct TreeGame {
        root: Node,
        path: Vec<usize>,
        start: Side,
    }

    impl TreeGame {
        fn new(root: Node) -> Self {
            Self {
                root,
                path: Vec::new(),
                start: Side::White,
            }
        }

        fn current(&self) -> &Node {
            let mut node = &self.root;
            for &i in &self.path {
                match node {
                    Node::Branch(children) => node = &children[i],
                    _ => unreachable!("path walks through a leaf"),
                }
            }
            node
        }
    }

    impl Position for TreeGame {
        type Move = usize;
        type Piece = i32;

        fn side_to_move(&self) -> Side {
            if self.path.len() % 2 == 0 {
                self.start
            } else {
                self.start.opponent()
            }
        }

        fn legal_moves(&mut self) -> Vec<usize> {
            match self.current() {
                Node::Branch(children) => (0..children.len()).collect(),
                _ => Vec::new(),
            }
        }

        fn apply(&mut self, mv: &usize) {
            self.path.push(*mv);
        }

        fn undo(&mut self) {
            self.path.pop();
        }

        fn is_checkmate(&mut self) -> bool {
            matches!(self.current(), Node::Mate)
        }

        fn is_draw(&mut self) -> bool {
            matches!(self.current(), Node::Draw)
        }

        fn pieces(&self) -> Vec<(Side, i32)> {
            match self.current() {
                Node::Leaf(v) if *v >= 0 => vec![(Side::White, *v)],
                Node::Leaf(v) => vec![(Side::Black, -*v)],
                _ => Vec::new(),
            }
        }
    }

    fn identity(piece: &i32) -> i32 {
        *piece
    }

    fn leaf(v: i32) -> Node {
        Node::Leaf(v)
    }

    fn branch(children: Vec<Node>) -> Node {
        Node::Branch(children)
    }

    /// Plain minimax without cutoffs
    fn full_minimax(pos: &mut TreeGame, depth: u32, maximizing: bool, root: Side) -> i32 {
        if pos.is_checkmate() {
            return if pos.side_to_move() == root { -MATE_SCORE } else { MATE_SCORE };
        }
        if pos.is_draw() {
            return 0;
        }
        if depth == 0 {
            return evaluate(pos, root, &identity);
        }
        let moves = pos.legal_moves();
        if moves.is_empty() {
            return evaluate(pos, root, &identity);
        }
        let scores: Vec<i32> = moves
            .iter()
            .map(|mv| {
                pos.apply(mv);
                let s = full_minimax(pos, depth - 1, !maximizing, root);
                pos.undo();
                s
            })
            .collect();
        if maximizing {
            scores.into_iter().max().unwrap()
        } else {
            scores.into_iter().min().unwrap()
        }
    }

    fn textbook_tree() -> Node {
        branch(vec![
            branch(vec![branch(vec![leaf(3), leaf(5)]), branch(vec![leaf(6), leaf(9)])]),
            branch(vec![branch(vec![leaf(1), leaf(2)]), branch(vec![leaf(0), leaf(-1)])]),
            branch(vec![branch(vec![leaf(7), leaf(4)]), branch(vec![leaf(8), leaf(-3)])]),
        ])
    }

    #[test]
    fn test_picks_best_root_move() {
        let mut game = TreeGame::new(textbook_tree());
        let report = GameTreeSearch::new(identity).search(&mut game, 3);
        // Root child scores: min(max(3,5), max(6,9)) = 5, min(2, 0) = 0, min(7, 8) = 7
        assert_eq!(report.best, Some((2, 7)));
        assert!(game.path.is_empty(), "search must undo every move");
    }

    #[test]
    fn test_pruning_matches_full_minimax() {
        let tree = textbook_tree();
        for depth in 1..=3 {
            let mut game = TreeGame::new(tree.clone());
            let mut search = GameTreeSearch::new(identity);
            let pruned = search.minimax(&mut game, depth, i32::MIN, i32::MAX, true, Side::White);
            let full = full_minimax(&mut game, depth, true, Side::White);
            assert_eq!(pruned, full, "depth {depth}");
        }
    }

    #[test]
    fn test_pruning_skips_nodes() {
        let mut pruned = GameTreeSearch::new(identity);
        let mut game = TreeGame::new(textbook_tree());
        pruned.minimax(&mut game, 3, i32::MIN, i32::MAX, true, Side::White);
        // 3 + 6 + 12 nodes without any cutoff
        assert!(pruned.nodes() < 21, "visited {}", pruned.nodes());
    }

    #[test]
    fn test_ties_keep_first_move() {
        let tree = branch(vec![leaf(1), leaf(4), leaf(4), leaf(2)]);
        for _ in 0..3 {
            let mut game = TreeGame::new(tree.clone());
            assert_eq!(pick_best_move(&mut game, 1, identity), Some(1));
        }
    }

    #[test]
    fn test_no_moves_returns_none() {
        let mut game = TreeGame::new(leaf(0));
        assert_eq!(pick_best_move(&mut game, 2, identity), None);
    }

    #[test]
    fn test_mate_scores_are_flat() {
        // Mate right away vs mate two plies later: both score MATE_SCORE
        let tree = branch(vec![
            Node::Mate,
            branch(vec![branch(vec![Node::Mate])]),
            leaf(50),
        ]);
        let mut game = TreeGame::new(tree);
        let report = GameTreeSearch::new(identity).search(&mut game, 3);
        assert_eq!(report.best, Some((0, MATE_SCORE)));
    }

    #[test]
    fn test_being_mated_is_negative() {
        // After White's only move, White is mated two plies on
        let tree = branch(vec![branch(vec![branch(vec![branch(vec![]), Node::Mate])])]);
        let mut game = TreeGame::new(tree);
        let mut search = GameTreeSearch::new(identity);
        game.path = vec![0, 0];
        assert!(game.side_to_move() == Side::White);
        let score = search.minimax(&mut game, 1, i32::MIN, i32::MAX, true, Side::White);
        // White moves to the mate leaf where Black is to move: good for White
        assert_eq!(score, MATE_SCORE);

        game.path = vec![0, 0, 1];
        let score = search.minimax(&mut game, 0, i32::MIN, i32::MAX, false, Side::Black);
        assert_eq!(score, -MATE_SCORE);
    }

    #[test]
    fn test_draw_scores_zero() {
        let tree = branch(vec![Node::Draw, leaf(-5)]);
        let mut game = TreeGame::new(tree);
        assert_eq!(
            GameTreeSearch::new(identity).search(&mut game, 1).best,
            Some((0, 0))
        );
    }

    #[test]
    fn test_evaluate_is_relative_to_root() {
        let game = TreeGame {
            root: leaf(-30),
            path: Vec::new(),
            start: Side::White,
        };
        assert_eq!(evaluate(&game, Side::White, &identity), -30);
        assert_eq!(evaluate(&game, Side::Black, &identity), 30);
    }
}
