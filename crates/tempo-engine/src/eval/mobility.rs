//! Piece mobility evaluation for HCE (Handcrafted Evaluation).
//!
//! Mobility measures how many safe squares each piece can reach. Pieces with
//! greater freedom of movement receive a bonus proportional to their mobility.
//! Safe squares exclude friendly-occupied squares and squares controlled by
//! enemy pawns.

use tempo_core::{bishop_attacks, knight_attacks, queen_attacks, rook_attacks};
use tempo_core::{Bitboard, Board, Color, PieceKind};

use crate::eval::score::{Score, S};

// ---------------------------------------------------------------------------
// Mobility bonus tables
// ---------------------------------------------------------------------------

/// Per-square mobility bonus for knights.
const KNIGHT_MOBILITY: Score = S(4, 4);

/// Per-square mobility bonus for bishops.
const BISHOP_MOBILITY: Score = S(3, 5);

/// Per-square mobility bonus for rooks.
const ROOK_MOBILITY: Score = S(2, 3);

/// Per-square mobility bonus for queens.
const QUEEN_MOBILITY: Score = S(1, 2);

// ---------------------------------------------------------------------------
// Helper: bulk pawn attack span
// ---------------------------------------------------------------------------

/// Compute all squares attacked by pawns of the given color.
///
/// Uses bitboard shifts for O(1) bulk computation instead of per-pawn
/// iteration. Masks out wraparound across the A and H files.
///
/// - White pawns attack NE (`<< 9`, not FILE_A) and NW (`<< 7`, not FILE_H).
/// - Black pawns attack SE (`>> 7`, not FILE_A) and SW (`>> 9`, not FILE_H).
fn pawn_attack_span(pawns: Bitboard, color: Color) -> Bitboard {
    match color {
        Color::White => {
            let ne = (pawns << 9u8) & !Bitboard::FILE_A;
            let nw = (pawns << 7u8) & !Bitboard::FILE_H;
            ne | nw
        }
        Color::Black => {
            let se = (pawns >> 7u8) & !Bitboard::FILE_A;
            let sw = (pawns >> 9u8) & !Bitboard::FILE_H;
            se | sw
        }
    }
}

// ---------------------------------------------------------------------------
// Per-side evaluation
// ---------------------------------------------------------------------------

/// Evaluate piece mobility for one side, returning the raw mobility score.
///
/// Counts safe squares reachable by each knight, bishop, rook, and queen.
/// Safe squares exclude squares occupied by friendly pieces and squares
/// attacked by enemy pawns.
fn evaluate_mobility_for_side(board: &Board, color: Color) -> Score {
    let occupied = board.occupied();
    let friendly = board.side(color);
    let enemy_pawns = board.pieces(PieceKind::Pawn) & board.side(!color);
    let enemy_pawn_attacks = pawn_attack_span(enemy_pawns, !color);
    let safe = !friendly & !enemy_pawn_attacks;

    let mut score = Score::ZERO;

    let knights = board.pieces(PieceKind::Knight) & friendly;
    for sq in knights {
        let attacks = knight_attacks(sq) & safe;
        score += KNIGHT_MOBILITY * attacks.count() as i16;
    }

    let bishops = board.pieces(PieceKind::Bishop) & friendly;
    for sq in bishops {
        let attacks = bishop_attacks(sq, occupied) & safe;
        score += BISHOP_MOBILITY * attacks.count() as i16;
    }

    let rooks = board.pieces(PieceKind::Rook) & friendly;
    for sq in rooks {
        let attacks = rook_attacks(sq, occupied) & safe;
        score += ROOK_MOBILITY * attacks.count() as i16;
    }

    let queens = board.pieces(PieceKind::Queen) & friendly;
    for sq in queens {
        let attacks = queen_attacks(sq, occupied) & safe;
        score += QUEEN_MOBILITY * attacks.count() as i16;
    }

    score
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Evaluate piece mobility from White's perspective.
///
/// For each side, counts the number of safe squares each piece (knight,
/// bishop, rook, queen) can access. Safe squares exclude squares occupied by
/// friendly pieces and squares attacked by enemy pawns. Returns the difference
/// `white_mobility - black_mobility`.
pub fn evaluate_mobility(board: &Board) -> Score {
    evaluate_mobility_for_side(board, Color::White)
        - evaluate_mobility_for_side(board, Color::Black)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
