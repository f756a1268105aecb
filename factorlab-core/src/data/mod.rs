//! Data acquisition and persistence.

pub mod chunker;
pub mod client;
pub mod endpoints;
pub mod panel;
pub mod provider;
pub mod refresh;
pub mod store;
pub mod universe;

pub use chunker::{date_windows, DEFAULT_WINDOW_DAYS};
pub use client::RateLimitedClient;
pub use endpoints::{
    MarketCapEndpoint, PricesEndpoint, ProfileEndpoint, SecFilingsEndpoint, StatementsEndpoint,
};
pub use provider::{ChunkSpec, DateWindow, Endpoint, FetchError, FetchOutcome, RequestUnit};
pub use refresh::{RefreshEngine, RefreshSummary};
pub use store::{ArtifactMeta, DataStore, DirectorySnapshot, StoreError, StoredArtifact};
pub use universe::{fetch_sp500_constituents, Universe};
