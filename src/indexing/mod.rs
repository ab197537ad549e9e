//! Index construction: visits, snapshots, the dependency graph and the
//! incremental reindexer

pub mod builder;
pub mod graph;
pub mod incremental;

pub use builder::{
    Edge, IndexSnapshot, ModuleFrame, ModuleVisit, PassStats, RegistrationScan, StoreBuilder,
    VisitKey, VisitTarget,
};
pub use graph::DependencyGraph;
pub use incremental::{IncrementalReindexer, ReindexPlan};
