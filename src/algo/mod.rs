//! Atlas generation algorithms.
//!
//! The pipeline runs in three stages, each usable on its own:
//!
//! - **Charts**: greedy face clustering into near-planar, compact charts
//! - **Parameterization**: LSCM flattening with a planar fallback and fold
//!   splitting
//! - **Packing**: conservative rasterization and first-fit placement into
//!   texel pages
//!
//! [`crate::Atlas`] chains them; call them directly for finer control.

pub mod charts;
pub mod pack;
pub mod parameterize;
mod progress;

pub use progress::Progress;
