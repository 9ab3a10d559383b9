//! Defines the `Value` type and its related constants.

/// Evaluation value in centipawns.
///
/// Positive values mean that the position is favorable for the side
/// to move. Negative values mean the position is favorable for the
/// other side (not to move). A value of `0` means that the chances
/// are equal. For example: a value of `100` might mean that the side
/// to move is a pawn ahead.
///
/// # Constants:
///
/// * `VALUE_MAX` designates a checkmate (a win).
///
///    * `VALUE_MAX - 1` designates an inevitable checkmate (a win) in
///      1 half-move.
///
///    * `VALUE_MAX - 2` designates an inevitable checkmate (a win) in
///      2 half-moves.
///
///    * and so forth.
///
/// * `VALUE_MIN` designates a checkmate (a loss), with the loss
///   distance encoded the same way (`VALUE_MIN + 1`, `VALUE_MIN + 2`,
///   ...).
///
/// * Values of `VALUE_MATE_THRESHOLD` or above (or `-VALUE_MATE_THRESHOLD`
///   or below) always designate a forced checkmate; everything
///   strictly inside the interval is an ordinary material evaluation.
pub type Value = i16;

pub const VALUE_MAX: Value = 10_000;
pub const VALUE_MIN: Value = -VALUE_MAX;
pub const VALUE_DRAW: Value = 0;
pub const VALUE_MATE_THRESHOLD: Value = VALUE_MAX - 255;
