//! Core business logic - framework-agnostic mapping, validation and shift operations.
//!
//! Every function takes a database handle and returns [`crate::errors::Result`]. Mutations
//! open their own transaction; read helpers are generic over `ConnectionTrait` so they can
//! run inside a caller's transaction as well.

/// Lookups of miqaats, definitions, positions and payment definitions
pub mod catalog;
/// Direction-aware sub-mapping lookup and mapping completeness checks
pub mod completeness;
/// Undirected adjacency graph over definitions used for cycle detection
pub mod graph;
/// Definition mapping edges: creation, deletion, activation and notes
pub mod mapping;
/// Sharaf membership management
pub mod member;
/// Sharaf lifecycle: creation, deletion, clearance, payment and confirmation
pub mod sharaf;
/// Atomic shifting of sharafs across a mapping, plus shift audits
pub mod shift;
/// Position and payment sub-mappings attached to a definition mapping
pub mod sub_mapping;
