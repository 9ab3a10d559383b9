//! Defines the `Depth` type and its related constants.

/// Remaining search depth in half-moves.
///
/// The remaining search depth tells how many half-moves should be
/// added to the current line of play before a leaf node is reached
/// and the quiescence search takes over. Searches are started with
/// some positive number as their remaining search depth, which is
/// decreased by one when a move is tried. The check extension may
/// keep the depth at one when the side to move is in check.
pub type Depth = u8;

pub const DEPTH_MAX: Depth = 255;
