//! Resolution engine: turns a natural-language phrase into one node of a live page.
//!
//! The caller owns a [`PageContext`] per page and asks a shared [`Resolver`]
//! to resolve phrases against it. Everything the engine knows about the page
//! comes through the [`PageAccessor`] trait.

pub mod accessor;
pub mod cache;
pub mod config;
pub mod context;
pub mod resolution;
pub mod scorer;
pub mod snapshot;
pub mod strategy;

pub use accessor::PageAccessor;
pub use cache::ResultCache;
pub use config::{ConfigError, ConfigLoader, ResolveOptions, ResolverConfig};
pub use context::PageContext;
pub use resolution::{ElementNotFoundError, Resolution, Resolver};
pub use scorer::Scorer;
pub use snapshot::SnapshotAccessor;
pub use strategy::{DetectorBackend, Strategy, StrategyBackends, StrategyChain, StrategyKind};
