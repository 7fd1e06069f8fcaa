//! Legal move generation for [`ChessPosition`].
//!
//! Pseudo-legal moves are generated square by square, then filtered by
//! playing each one and checking whether the mover's king is left attacked.

use crate::chess::{file_of, rank_of, square, ChessMove, ChessPosition, PieceKind, Square};
use crate::search::Side;

pub(crate) const KNIGHT_DELTAS: [(i8, i8); 8] = [
    (1, 2),
    (2, 1),
    (-1, 2),
    (-2, 1),
    (1, -2),
    (2, -1),
    (-1, -2),
    (-2, -1),
];

pub(crate) const KING_DELTAS: [(i8, i8); 8] = [
    (1, 1),
    (1, 0),
    (1, -1),
    (0, 1),
    (0, -1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

pub(crate) const DIAGONALS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

pub(crate) const ORTHOGONALS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Every legal move for the side to move. The position is borrowed mutably
/// for the legality probe and left exactly as it was.
pub fn legal_moves(pos: &mut ChessPosition) -> Vec<ChessMove> {
    let mut moves = Vec::with_capacity(48);
    pseudo_moves(pos, &mut moves);

    let mover = pos.side();
    moves.retain(|mv| {
        pos.apply_move(mv);
        let illegal = pos.in_check(mover);
        pos.undo_move();
        !illegal
    });
    moves
}

fn pseudo_moves(pos: &ChessPosition, out: &mut Vec<ChessMove>) {
    let side = pos.side();
    for from in 0..64u8 {
        let Some(piece) = pos.piece_at(from) else {
            continue;
        };
        if piece.side != side {
            continue;
        }
        match piece.kind {
            PieceKind::Pawn => gen_pawn(pos, from, side, out),
            PieceKind::Knight => gen_steps(pos, from, side, &KNIGHT_DELTAS, out),
            PieceKind::Bishop => gen_slides(pos, from, side, &DIAGONALS, out),
            PieceKind::Rook => gen_slides(pos, from, side, &ORTHOGONALS, out),
            PieceKind::Queen => {
                gen_slides(pos, from, side, &DIAGONALS, out);
                gen_slides(pos, from, side, &ORTHOGONALS, out);
            }
            PieceKind::King => {
                gen_steps(pos, from, side, &KING_DELTAS, out);
                gen_castles(pos, from, side, out);
            }
        }
    }
}

fn push_pawn_move(from: Square, to: Square, promotion_rank: i8, out: &mut Vec<ChessMove>) {
    if rank_of(to) == promotion_rank {
        for kind in PieceKind::PROMOTIONS {
            out.push(ChessMove {
                promotion: Some(kind),
                ..ChessMove::new(from, to)
            });
        }
    } else {
        out.push(ChessMove::new(from, to));
    }
}

fn gen_pawn(pos: &ChessPosition, from: Square, side: Side, out: &mut Vec<ChessMove>) {
    let f = file_of(from);
    let r = rank_of(from);
    let (dir, start_rank, promotion_rank) = match side {
        Side::White => (1, 1, 7),
        Side::Black => (-1, 6, 0),
    };

    if let Some(to) = square(f, r + dir) {
        if pos.piece_at(to).is_none() {
            push_pawn_move(from, to, promotion_rank, out);
            if r == start_rank {
                if let Some(double) = square(f, r + 2 * dir) {
                    if pos.piece_at(double).is_none() {
                        out.push(ChessMove::new(from, double));
                    }
                }
            }
        }
    }

    for df in [-1, 1] {
        let Some(to) = square(f + df, r + dir) else {
            continue;
        };
        match pos.piece_at(to) {
            Some(target) if target.side != side => push_pawn_move(from, to, promotion_rank, out),
            Some(_) => {}
            None if pos.en_passant() == Some(to) => out.push(ChessMove {
                en_passant: true,
                ..ChessMove::new(from, to)
            }),
            None => {}
        }
    }
}

fn gen_steps(
    pos: &ChessPosition,
    from: Square,
    side: Side,
    deltas: &[(i8, i8)],
    out: &mut Vec<ChessMove>,
) {
    let f = file_of(from);
    let r = rank_of(from);
    for (df, dr) in deltas {
        if let Some(to) = square(f + df, r + dr) {
            if pos.piece_at(to).map_or(true, |p| p.side != side) {
                out.push(ChessMove::new(from, to));
            }
        }
    }
}

fn gen_slides(
    pos: &ChessPosition,
    from: Square,
    side: Side,
    dirs: &[(i8, i8)],
    out: &mut Vec<ChessMove>,
) {
    for (df, dr) in dirs {
        let mut f = file_of(from) + df;
        let mut r = rank_of(from) + dr;
        while let Some(to) = square(f, r) {
            match pos.piece_at(to) {
                None => out.push(ChessMove::new(from, to)),
                Some(p) => {
                    if p.side != side {
                        out.push(ChessMove::new(from, to));
                    }
                    break;
                }
            }
            f += df;
            r += dr;
        }
    }
}

fn gen_castles(pos: &ChessPosition, from: Square, side: Side, out: &mut Vec<ChessMove>) {
    let home_rank = match side {
        Side::White => 0,
        Side::Black => 7,
    };
    if square(4, home_rank) != Some(from) || pos.in_check(side) {
        return;
    }
    let enemy = side.opponent();
    let rights = pos.castling();

    // (king side, rook file, files that must be empty, files the king crosses)
    let wings: [(bool, i8, &[i8], [i8; 2]); 2] = [
        (true, 7, &[5, 6], [5, 6]),
        (false, 0, &[1, 2, 3], [3, 2]),
    ];
    for (king_side, rook_file, empty, crossed) in wings {
        if !rights.can_castle(side, king_side) {
            continue;
        }
        let rook_home = square(rook_file, home_rank).and_then(|sq| pos.piece_at(sq));
        if !rook_home.is_some_and(|p| p.side == side && p.kind == PieceKind::Rook) {
            continue;
        }
        let clear = empty
            .iter()
            .all(|&f| square(f, home_rank).is_some_and(|sq| pos.piece_at(sq).is_none()));
        let safe = crossed
            .iter()
            .all(|&f| square(f, home_rank).is_some_and(|sq| !pos.is_square_attacked(sq, enemy)));
        if clear && safe {
            if let Some(to) = square(crossed[1], home_rank) {
                out.push(ChessMove {
                    castle: true,
                    ..ChessMove::new(from, to)
                });
            }
        }
    }
}
