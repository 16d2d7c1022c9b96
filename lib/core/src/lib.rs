//! # reelmatch Core
//!
//! Core types shared by every reelmatch crate.
//!
//! - [`CatalogRecord`] - One catalog row (movie or show) and its descriptive fields
//! - [`SparseVector`] - Non-negative term-weight vector with cosine similarity
//! - [`Neighbor`] / [`RankedNeighbors`] - Scored rows in deterministic rank order
//! - [`Error`] - The error kinds of the build and query pipeline
//!
//! ## Example
//!
//! ```rust
//! use reelmatch_core::{Neighbor, RankedNeighbors, SparseVector};
//!
//! let a = SparseVector::from_pairs(4, vec![(0, 1.0), (2, 1.0)]).unwrap();
//! let b = SparseVector::from_pairs(4, vec![(2, 1.0)]).unwrap();
//! assert!(a.cosine_similarity(&b) > 0.7);
//!
//! let ranked = RankedNeighbors::top_k(vec![Neighbor::new(2, 0.1), Neighbor::new(1, 0.8)], 1);
//! assert_eq!(ranked.first().unwrap().row, 1);
//! ```

pub mod error;
pub mod rank;
pub mod record;
pub mod vector;

pub use error::{Error, Result};
pub use rank::{Neighbor, RankedNeighbors};
pub use record::{CatalogField, CatalogRecord};
pub use vector::{cosine_with_norms, SparseVector};
