// Venue module
// Liquidity sources, their identity types and the source registry
//
// Numan Thabit 2025 Nov

pub mod adapter;
pub mod amm;
pub mod http;
pub mod registry;
pub mod wrapper;

pub use adapter::{Asset, AssetPair, LiquiditySource, SourceDescriptor, SourceId};
pub use amm::ConstantProductPool;
pub use http::HttpQuoteSource;
pub use registry::SourceRegistry;
pub use wrapper::RateWrapper;
