//! Chess as a searchable [`Position`].
//!
//! This module contains:
//! - Piece, square and move types
//! - FEN parsing and printing
//! - `ChessPosition`: a mailbox board with in-place apply and a move-record
//!   stack for exact undo
//! - Terminal detection (checkmate, stalemate, fifty-move rule, insufficient
//!   material, threefold repetition)
//! - The default material table used by the computer opponent
//!
//! Squares are numbered 0 (a1) through 63 (h8).

use crate::movegen;
use crate::search::{MaterialEvaluator, Position, Side};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The standard starting position
pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Board square index, a1 = 0, h8 = 63
pub type Square = u8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PieceKind {
    Pawn,
    Knight,
    Bishop,
    Rook,
    Queen,
    King,
}

impl PieceKind {
    /// Promotion choices in generation order
    pub const PROMOTIONS: [PieceKind; 4] = [
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
    ];

    fn from_char(c: char) -> Option<Self> {
        match c {
            'p' => Some(PieceKind::Pawn),
            'n' => Some(PieceKind::Knight),
            'b' => Some(PieceKind::Bishop),
            'r' => Some(PieceKind::Rook),
            'q' => Some(PieceKind::Queen),
            'k' => Some(PieceKind::King),
            _ => None,
        }
    }

    /// Lowercase letter used by FEN and UCI
    pub fn to_char(self) -> char {
        match self {
            PieceKind::Pawn => 'p',
            PieceKind::Knight => 'n',
            PieceKind::Bishop => 'b',
            PieceKind::Rook => 'r',
            PieceKind::Queen => 'q',
            PieceKind::King => 'k',
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Piece {
    pub side: Side,
    pub kind: PieceKind,
}

impl Piece {
    pub const fn new(side: Side, kind: PieceKind) -> Self {
        Self { side, kind }
    }

    fn fen_char(self) -> char {
        match self.side {
            Side::White => self.kind.to_char().to_ascii_uppercase(),
            Side::Black => self.kind.to_char(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChessError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("illegal or malformed move: {0}")]
    IllegalMove(String),
}

pub fn file_of(sq: Square) -> i8 {
    (sq % 8) as i8
}

pub fn rank_of(sq: Square) -> i8 {
    (sq / 8) as i8
}

/// Square at (file, rank), or `None` off the board
pub fn square(file: i8, rank: i8) -> Option<Square> {
    if (0..8).contains(&file) && (0..8).contains(&rank) {
        Some((rank as u8) * 8 + file as u8)
    } else {
        None
    }
}

/// Algebraic name such as `e4`
pub fn square_name(sq: Square) -> String {
    let file = (b'a' + sq % 8) as char;
    let rank = (b'1' + sq / 8) as char;
    format!("{file}{rank}")
}

pub fn parse_square(name: &str) -> Option<Square> {
    match name.as_bytes() {
        [f @ b'a'..=b'h', r @ b'1'..=b'8'] => Some((r - b'1') * 8 + (f - b'a')),
        _ => None,
    }
}

/// A chess move as produced by move generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChessMove {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<PieceKind>,
    pub castle: bool,
    pub en_passant: bool,
}

impl ChessMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
            castle: false,
            en_passant: false,
        }
    }

    /// Long algebraic form, e.g. `e7e8q`
    pub fn to_uci(&self) -> String {
        let mut text = square_name(self.from);
        text.push_str(&square_name(self.to));
        if let Some(kind) = self.promotion {
            text.push(kind.to_char());
        }
        text
    }

    pub fn descriptor(&self) -> MoveDescriptor {
        MoveDescriptor {
            from: square_name(self.from),
            to: square_name(self.to),
            promotion: self.promotion.map(PieceKind::to_char),
        }
    }
}

/// Move as handed to the per-game rule engine: squares by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveDescriptor {
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub promotion: Option<char>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct CastlingRights {
    pub white_king: bool,
    pub white_queen: bool,
    pub black_king: bool,
    pub black_queen: bool,
}

impl CastlingRights {
    /// Drop the rights tied to a king or rook home square
    fn touch(&mut self, sq: Square) {
        match sq {
            0 => self.white_queen = false,
            7 => self.white_king = false,
            4 => {
                self.white_king = false;
                self.white_queen = false;
            }
            56 => self.black_queen = false,
            63 => self.black_king = false,
            60 => {
                self.black_king = false;
                self.black_queen = false;
            }
            _ => {}
        }
    }

    pub fn can_castle(&self, side: Side, king_side: bool) -> bool {
        match (side, king_side) {
            (Side::White, true) => self.white_king,
            (Side::White, false) => self.white_queen,
            (Side::Black, true) => self.black_king,
            (Side::Black, false) => self.black_queen,
        }
    }
}

/// Everything needed to take one applied move back
#[derive(Debug, Clone, PartialEq, Eq)]
struct MoveRecord {
    mv: ChessMove,
    moved: Option<Piece>,
    captured: Option<(Square, Piece)>,
    rook_move: Option<(Square, Square)>,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
}

/// Mutable chess position with apply/undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChessPosition {
    board: [Option<Piece>; 64],
    side_to_move: Side,
    castling: CastlingRights,
    en_passant: Option<Square>,
    halfmove_clock: u32,
    fullmove_number: u32,
    history: Vec<MoveRecord>,
    /// Positions from the loaded one onward, for repetition
    keys: Vec<PositionKey>,
}

/// The parts of a position that decide whether it repeats
#[derive(Debug, Clone, PartialEq, Eq)]
struct PositionKey {
    board: [Option<Piece>; 64],
    side_to_move: Side,
    castling: CastlingRights,
    en_passant: Option<Square>,
}

impl ChessPosition {
    pub fn startpos() -> Self {
        match Self::from_fen(START_FEN) {
            Ok(pos) => pos,
            Err(e) => unreachable!("start position is valid: {e}"),
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, ChessError> {
        let invalid = |why: &str| ChessError::InvalidFen(format!("{why} in {fen:?}"));

        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 {
            return Err(invalid("expected at least 4 fields"));
        }

        let mut board = [None; 64];
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(invalid("expected 8 ranks"));
        }
        for (row, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - row as i8;
            let mut file: i8 = 0;
            for ch in rank_text.chars() {
                if let Some(skip) = ch.to_digit(10) {
                    let skip = skip as i8;
                    if skip == 0 || file + skip > 8 {
                        return Err(invalid("bad empty square count"));
                    }
                    file += skip;
                    continue;
                }
                let kind = PieceKind::from_char(ch.to_ascii_lowercase())
                    .ok_or_else(|| invalid("unknown piece letter"))?;
                let side = if ch.is_ascii_uppercase() {
                    Side::White
                } else {
                    Side::Black
                };
                let sq = square(file, rank).ok_or_else(|| invalid("rank too long"))?;
                board[sq as usize] = Some(Piece::new(side, kind));
                file += 1;
            }
            if file != 8 {
                return Err(invalid("rank does not cover 8 files"));
            }
        }

        for side in [Side::White, Side::Black] {
            let kings = board
                .iter()
                .flatten()
                .filter(|p| **p == Piece::new(side, PieceKind::King))
                .count();
            if kings != 1 {
                return Err(invalid("each side needs exactly one king"));
            }
        }

        let side_to_move = match parts[1] {
            "w" => Side::White,
            "b" => Side::Black,
            _ => return Err(invalid("side to move must be w or b")),
        };

        let mut castling = CastlingRights::default();
        if parts[2] != "-" {
            for c in parts[2].chars() {
                match c {
                    'K' => castling.white_king = true,
                    'Q' => castling.white_queen = true,
                    'k' => castling.black_king = true,
                    'q' => castling.black_queen = true,
                    _ => return Err(invalid("bad castling field")),
                }
            }
        }

        let en_passant = match parts[3] {
            "-" => None,
            name => Some(parse_square(name).ok_or_else(|| invalid("bad en passant square"))?),
        };

        let halfmove_clock = match parts.get(4) {
            Some(text) => text.parse().map_err(|_| invalid("bad halfmove clock"))?,
            None => 0,
        };
        let fullmove_number = match parts.get(5) {
            Some(text) => text.parse().map_err(|_| invalid("bad fullmove number"))?,
            None => 1,
        };

        let mut pos = Self {
            board,
            side_to_move,
            castling,
            en_passant,
            halfmove_clock,
            fullmove_number,
            history: Vec::new(),
            keys: Vec::new(),
        };
        pos.keys.push(pos.key());
        Ok(pos)
    }

    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut empty = 0;
            for file in 0..8 {
                match self.board[(rank * 8 + file) as usize] {
                    Some(piece) => {
                        if empty > 0 {
                            fen.push_str(&empty.to_string());
                            empty = 0;
                        }
                        fen.push(piece.fen_char());
                    }
                    None => empty += 1,
                }
            }
            if empty > 0 {
                fen.push_str(&empty.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.side_to_move {
            Side::White => 'w',
            Side::Black => 'b',
        });

        fen.push(' ');
        let rights = [
            (self.castling.white_king, 'K'),
            (self.castling.white_queen, 'Q'),
            (self.castling.black_king, 'k'),
            (self.castling.black_queen, 'q'),
        ];
        let castling: String = rights.iter().filter(|(on, _)| *on).map(|(_, c)| *c).collect();
        fen.push_str(if castling.is_empty() { "-" } else { &castling });

        fen.push(' ');
        match self.en_passant {
            Some(sq) => fen.push_str(&square_name(sq)),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    // ==================== Queries ====================

    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.board[sq as usize]
    }

    pub fn side(&self) -> Side {
        self.side_to_move
    }

    pub fn castling(&self) -> CastlingRights {
        self.castling
    }

    pub fn en_passant(&self) -> Option<Square> {
        self.en_passant
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    /// Number of applied moves that can still be undone
    pub fn ply(&self) -> usize {
        self.history.len()
    }

    pub fn king_square(&self, side: Side) -> Option<Square> {
        (0..64u8).find(|&sq| self.piece_at(sq) == Some(Piece::new(side, PieceKind::King)))
    }

    pub fn in_check(&self, side: Side) -> bool {
        match self.king_square(side) {
            Some(sq) => self.is_square_attacked(sq, side.opponent()),
            None => false,
        }
    }

    fn has_piece(&self, sq: Option<Square>, side: Side, kinds: &[PieceKind]) -> bool {
        sq.and_then(|s| self.piece_at(s))
            .is_some_and(|p| p.side == side && kinds.contains(&p.kind))
    }

    /// Whether `by` attacks `target`
    pub fn is_square_attacked(&self, target: Square, by: Side) -> bool {
        let tf = file_of(target);
        let tr = rank_of(target);

        // A white pawn attacks upward, so it sits one rank below its target
        let pawn_rank = match by {
            Side::White => tr - 1,
            Side::Black => tr + 1,
        };
        for df in [-1, 1] {
            if self.has_piece(square(tf + df, pawn_rank), by, &[PieceKind::Pawn]) {
                return true;
            }
        }

        for (df, dr) in movegen::KNIGHT_DELTAS {
            if self.has_piece(square(tf + df, tr + dr), by, &[PieceKind::Knight]) {
                return true;
            }
        }

        for (df, dr) in movegen::KING_DELTAS {
            if self.has_piece(square(tf + df, tr + dr), by, &[PieceKind::King]) {
                return true;
            }
        }

        let sliders = [
            (movegen::DIAGONALS, [PieceKind::Bishop, PieceKind::Queen]),
            (movegen::ORTHOGONALS, [PieceKind::Rook, PieceKind::Queen]),
        ];
        for (dirs, kinds) in sliders {
            for (df, dr) in dirs {
                let mut f = tf + df;
                let mut r = tr + dr;
                while let Some(sq) = square(f, r) {
                    if let Some(piece) = self.piece_at(sq) {
                        if piece.side == by && kinds.contains(&piece.kind) {
                            return true;
                        }
                        break;
                    }
                    f += df;
                    r += dr;
                }
            }
        }

        false
    }

    pub fn legal_moves(&mut self) -> Vec<ChessMove> {
        movegen::legal_moves(self)
    }

    /// Find the legal move written in long algebraic form (`e2e4`, `e7e8q`)
    pub fn parse_uci_move(&mut self, text: &str) -> Result<ChessMove, ChessError> {
        let illegal = || ChessError::IllegalMove(text.to_string());
        if !(4..=5).contains(&text.len()) || !text.is_ascii() {
            return Err(illegal());
        }
        let from = parse_square(&text[0..2]).ok_or_else(illegal)?;
        let to = parse_square(&text[2..4]).ok_or_else(illegal)?;
        let promotion = match text[4..].chars().next() {
            Some(c) => Some(PieceKind::from_char(c.to_ascii_lowercase()).ok_or_else(illegal)?),
            None => None,
        };

        self.legal_moves()
            .into_iter()
            .find(|m| m.from == from && m.to == to && m.promotion == promotion)
            .ok_or_else(illegal)
    }

    // ==================== Apply / Undo ====================

    /// Play a move in place. The move is assumed to come from
    /// [`ChessPosition::legal_moves`]; a move from an empty square only passes
    /// the turn.
    pub fn apply_move(&mut self, mv: &ChessMove) {
        let mut record = MoveRecord {
            mv: *mv,
            moved: self.piece_at(mv.from),
            captured: None,
            rook_move: None,
            castling: self.castling,
            en_passant: self.en_passant,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
        };

        self.en_passant = None;
        let mut reset_clock = false;

        if let Some(piece) = record.moved {
            let from = mv.from;
            let to = mv.to;

            let capture_sq = if mv.en_passant {
                square(file_of(to), rank_of(from))
            } else {
                Some(to)
            };
            if let Some(cap) = capture_sq {
                if let Some(victim) = self.board[cap as usize].take() {
                    record.captured = Some((cap, victim));
                    reset_clock = true;
                }
            }

            self.board[from as usize] = None;
            let promotion_rank = match piece.side {
                Side::White => 7,
                Side::Black => 0,
            };
            let placed = if piece.kind == PieceKind::Pawn && rank_of(to) == promotion_rank {
                Piece::new(piece.side, mv.promotion.unwrap_or(PieceKind::Queen))
            } else {
                piece
            };
            self.board[to as usize] = Some(placed);

            if mv.castle && piece.kind == PieceKind::King {
                let rank = rank_of(from);
                let (rook_file, rook_target) = if file_of(to) == 6 { (7, 5) } else { (0, 3) };
                if let (Some(rf), Some(rt)) = (square(rook_file, rank), square(rook_target, rank)) {
                    self.board[rt as usize] = self.board[rf as usize].take();
                    record.rook_move = Some((rf, rt));
                }
            }

            self.castling.touch(from);
            self.castling.touch(to);

            if piece.kind == PieceKind::Pawn {
                reset_clock = true;
                if (rank_of(to) - rank_of(from)).abs() == 2 {
                    self.en_passant = square(file_of(from), (rank_of(from) + rank_of(to)) / 2);
                }
            }
        }

        self.halfmove_clock = if reset_clock {
            0
        } else {
            self.halfmove_clock.saturating_add(1)
        };
        if self.side_to_move == Side::Black {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side_to_move = self.side_to_move.opponent();

        self.history.push(record);
        self.keys.push(self.key());
    }

    /// Take back the most recent [`ChessPosition::apply_move`]. Does nothing
    /// when there is nothing to undo.
    pub fn undo_move(&mut self) {
        let Some(record) = self.history.pop() else {
            return;
        };
        self.keys.pop();

        self.side_to_move = self.side_to_move.opponent();
        self.castling = record.castling;
        self.en_passant = record.en_passant;
        self.halfmove_clock = record.halfmove_clock;
        self.fullmove_number = record.fullmove_number;

        if let Some(piece) = record.moved {
            if let Some((rf, rt)) = record.rook_move {
                self.board[rf as usize] = self.board[rt as usize].take();
            }
            self.board[record.mv.to as usize] = None;
            self.board[record.mv.from as usize] = Some(piece);
            if let Some((sq, victim)) = record.captured {
                self.board[sq as usize] = Some(victim);
            }
        }
    }

    // ==================== Terminal states ====================

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Same position reached three times since the position was loaded
    pub fn is_threefold_repetition(&self) -> bool {
        match self.keys.last() {
            Some(current) => self.keys.iter().filter(|k| *k == current).count() >= 3,
            None => false,
        }
    }

    /// Bare kings, a single minor piece, or same-colored bishops one each
    pub fn is_insufficient_material(&self) -> bool {
        let mut minors = Vec::new();
        for (sq, piece) in self.occupied() {
            match piece.kind {
                PieceKind::King => {}
                PieceKind::Knight | PieceKind::Bishop => minors.push((sq, piece)),
                _ => return false,
            }
        }
        match minors.as_slice() {
            [] | [_] => true,
            [(a, pa), (b, pb)] => {
                pa.kind == PieceKind::Bishop
                    && pb.kind == PieceKind::Bishop
                    && pa.side != pb.side
                    && (file_of(*a) + rank_of(*a)) % 2 == (file_of(*b) + rank_of(*b)) % 2
            }
            _ => false,
        }
    }

    fn occupied(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        self.board
            .iter()
            .enumerate()
            .filter_map(|(sq, piece)| piece.map(|p| (sq as Square, p)))
    }

    fn key(&self) -> PositionKey {
        PositionKey {
            board: self.board,
            side_to_move: self.side_to_move,
            castling: self.castling,
            en_passant: self.en_passant,
        }
    }
}

impl Default for ChessPosition {
    fn default() -> Self {
        Self::startpos()
    }
}

impl Position for ChessPosition {
    type Move = ChessMove;
    type Piece = Piece;

    fn side_to_move(&self) -> Side {
        self.side_to_move
    }

    fn legal_moves(&mut self) -> Vec<ChessMove> {
        movegen::legal_moves(self)
    }

    fn apply(&mut self, mv: &ChessMove) {
        self.apply_move(mv);
    }

    fn undo(&mut self) {
        self.undo_move();
    }

    fn is_checkmate(&mut self) -> bool {
        self.in_check(self.side_to_move) && movegen::legal_moves(self).is_empty()
    }

    fn is_draw(&mut self) -> bool {
        if self.is_fifty_move_draw() || self.is_insufficient_material() || self.is_threefold_repetition() {
            return true;
        }
        !self.in_check(self.side_to_move) && movegen::legal_moves(self).is_empty()
    }

    fn pieces(&self) -> Vec<(Side, Piece)> {
        self.occupied().map(|(_, p)| (p.side, p)).collect()
    }
}

/// Per-kind piece values in centipawns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialTable {
    pub pawn: i32,
    pub knight: i32,
    pub bishop: i32,
    pub rook: i32,
    pub queen: i32,
    pub king: i32,
}

impl Default for MaterialTable {
    fn default() -> Self {
        Self {
            pawn: 100,
            knight: 320,
            bishop: 330,
            rook: 500,
            queen: 900,
            king: 0,
        }
    }
}

impl MaterialEvaluator<Piece> for MaterialTable {
    fn value(&self, piece: &Piece) -> i32 {
        match piece.kind {
            PieceKind::Pawn => self.pawn,
            PieceKind::Knight => self.knight,
            PieceKind::Bishop => self.bishop,
            PieceKind::Rook => self.rook,
            PieceKind::Queen => self.queen,
            PieceKind::King => self.king,
        }
    }
}
