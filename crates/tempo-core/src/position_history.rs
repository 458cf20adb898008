//! Game-level repetition bookkeeping, independent of any single [`Board`](crate::Board).
//!
//! A [`PositionHistory`] records the Zobrist hash after every move played in
//! the current game (root search excluded — that path is tracked separately
//! by the searcher for in-tree repetition detection). It answers exactly one
//! question for the UCI loop and the search root: has this position already
//! occurred twice before, making a third occurrence a draw by repetition.

/// Ordered log of Zobrist hashes for the moves played so far in the game.
#[derive(Debug, Clone, Default)]
pub struct PositionHistory {
    hashes: Vec<u64>,
}

impl PositionHistory {
    /// Create an empty history.
    pub fn new() -> Self {
        Self { hashes: Vec::new() }
    }

    /// Record a position reached by playing a move.
    pub fn push(&mut self, hash: u64) {
        self.hashes.push(hash);
    }

    /// Discard the most recently pushed hash (used when unwinding a
    /// speculative line, e.g. during UCI `position ... moves ...` replay).
    pub fn pop(&mut self) {
        self.hashes.pop();
    }

    /// Forget all recorded positions (called on `ucinewgame`).
    pub fn clear(&mut self) {
        self.hashes.clear();
    }

    /// Number of positions recorded.
    pub fn len(&self) -> usize {
        self.hashes.len()
    }

    /// `true` if no positions have been recorded yet.
    pub fn is_empty(&self) -> bool {
        self.hashes.is_empty()
    }

    /// The recorded hashes in play order.
    pub fn hashes(&self) -> &[u64] {
        &self.hashes
    }

    /// Count how many times `hash` has occurred in the recorded history.
    pub fn occurrences(&self, hash: u64) -> usize {
        self.hashes.iter().filter(|&&h| h == hash).count()
    }

    /// `true` if the most recently pushed position has now occurred a third
    /// time (threefold repetition — an automatic draw under FIDE rules).
    pub fn is_threefold_repetition(&self) -> bool {
        match self.hashes.last() {
            Some(&hash) => self.occurrences(hash) >= 3,
            None => false,
        }
    }
}
