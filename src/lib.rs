//! Layout optimization engine for 2D architectural floor plans: places
//! rectangular workstations (îlots) under wall / restricted-zone /
//! clearance constraints and synthesizes an orthogonal corridor network
//! connecting them, driven by an evolutionary search with a weighted
//! multi-objective fitness.

pub mod candidate;
pub mod classify;
pub mod config;
pub mod corridor;
pub mod engine;
pub mod error;
pub mod fitness;
pub mod floor_plan;
pub mod geometry;
pub mod ilot;
pub mod obstacle;
pub mod result;
pub mod route;
pub mod rows;

pub use config::{FitnessWeights, LayoutConfig, SizeMix};
pub use engine::{optimize, NullProgress, Optimizer, ProgressSink, RunBudget};
pub use error::LayoutError;
pub use floor_plan::{FloorPlan, Opening, OpeningKind, RestrictedZone, Wall};
pub use result::{LayoutResult, Termination};
