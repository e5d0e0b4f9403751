//! Single-container 3D packing engine with a thin HTTP service around it.
//!
//! The engine places rectangular items into one fixed-size container using an
//! extreme point heuristic: items are tried largest first, in all six
//! orientations, at every candidate point, and the placement with the lowest
//! fit score is committed. See [`optimizer::pack_items`].

pub mod api;
pub mod config;
pub mod extreme_points;
pub mod geometry;
pub mod model;
pub mod optimizer;
pub mod types;
