use thiserror::Error;

/// Errors surfaced at the public boundary of the engine.
///
/// Recoverable events inside a run (an îlot that cannot be placed, an A*
/// search that finds no path) are handled in place and never reach the
/// caller. Cancellation is not an error either: a cancelled run still
/// returns its best-so-far result, tagged [`Termination::Cancelled`](crate::result::Termination).
#[derive(Debug, Error)]
pub enum LayoutError {
    /// A configuration parameter is out of range or inconsistent.
    /// The engine does not start.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// The floor plan violates an input precondition (degenerate bounds,
    /// non-finite coordinate, self-intersecting polygon). The engine does
    /// not start.
    #[error("invalid floor plan: {0}")]
    InvalidFloorPlan(String),

    /// The initial population could not produce a single candidate with at
    /// least one îlot. `obstacle_fraction` is the share of the drawing area
    /// covered by walls and restricted zones.
    #[error("no feasible placement: obstacles cover {obstacle_fraction:.3} of the drawing")]
    NoFeasiblePlacement { obstacle_fraction: f64 },

    /// An internal invariant was violated (dangling corridor reference,
    /// fitness outside [0,1]). Fatal for the run.
    #[error("internal invariant violated at generation {generation}, candidate {candidate}: {message}")]
    InternalInvariant {
        generation: usize,
        candidate: usize,
        message: String,
    },
}
