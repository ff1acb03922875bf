//! Weight caching: in-memory per-signature slots plus an optional on-disk store.

mod store;
mod weight_cache;

pub use store::WeightStore;
pub use weight_cache::WeightCache;
