/// Errors produced by the combinatorial solver.
#[derive(thiserror::Error, Debug)]
pub enum SolveError {
    #[error("a frame piece has no non-flat edges adjacent to its flat edge")]
    MalformedFramePiece,

    #[error("no valid rectangular frame could be assembled from the scored matchings")]
    FrameInfeasible,

    #[error("no open position with enough placed neighbours remains for the leftover pieces")]
    NoPlaceablePosition,
}
