// Library root module for split-aggr
// This file defines the public API and module structure for the split-aggr library
// It exports the routing engine that splits a swap across liquidity sources
//
// Numan Thabit 2025 Nov

pub mod config;
pub mod control;
pub mod errors;
pub mod flags;
pub mod metrics;
pub mod quant;
pub mod router;
pub mod venues;
