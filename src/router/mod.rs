// Router module - main routing and execution plane
// This file wires the quote table builder, split optimizer and multi-hop
// selector into the router, and exposes the execution seam
//
// Numan Thabit 2025 Nov

pub mod execution;
pub mod routes;
pub mod selector;
pub mod split;
pub mod table;
pub mod validation;

#[allow(clippy::module_inception)]
pub mod router;

pub use execution::{ExecutionPlan, ExecutionStats, SimulatedExecutor, SwapExecutor};
pub use router::{create_api_router, Router, SwapOrder};
pub use routes::{Distribution, HopResult, RouteKind, RoutingResult};
pub use selector::{RequestContext, RouteSelector, RouteStage};
pub use split::{optimize, SplitOutcome};
pub use table::{QuoteTable, QuoteTableBuilder};
