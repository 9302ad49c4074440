//! A pure-Rust library providing lazy, composable elementwise pipelines over
//! dense multi-dimensional arrays.
//!
//! [`Pipeline`] describes a sequence of per-element transformations over an
//! array without allocating an intermediate array after every step. A
//! pipeline starts from any [`Source`] (the crate's own [`Dense<T>`] array,
//! a flat `Vec`/slice, or your own array type), accumulates [`map`] and
//! [`filter`] steps as an immutable chain of operation descriptors, and only
//! computes when materialized by [`build`] (into any [`Target`] container)
//! or [`reduce`].
//!
//! Elements are produced in row-major order (last dimension varies fastest)
//! and each output cell is produced exactly once. The element type of each
//! step — its *grain* — is tracked statically: a `map` can change it, a
//! `filter` cannot, and an array deeper than the pipeline's depth folds its
//! trailing dimensions into the grain via [`Dense::blocks()`].
//!
//! One deliberate wrinkle in the laziness: `filter` cannot know its output
//! length in advance, so preparing a filtered pipeline drains everything
//! upstream of the filter once, at `build`/`reduce` time. See
//! [`Pipeline::filter()`] for the exact contract.
//!
//! ```
//! use ndpipeline::{Pipeline, Dense};
//! let a: Dense<u32> = Dense::new([10], (1..=10).collect::<Vec<u32>>());
//! let out: Vec<u32> = Pipeline::from_array(&a, 1).unwrap()
//!     .map(|i| i + 1)
//!     .filter(|&i| i > 5).unwrap()
//!     .build().unwrap();
//! assert_eq!(out, [6, 7, 8, 9, 10, 11]);
//! ```
//!
//! [`map`]: Pipeline::map
//! [`filter`]: Pipeline::filter
//! [`build`]: Pipeline::build
//! [`reduce`]: Pipeline::reduce

pub mod shape;

mod error;
pub use error::{PipelineError, Result};

mod array;
pub use array::{Source, Target, Dense, Blocks};

mod op;
pub use op::{Op, Supply, MapTo, TryMapTo, Filter, TryFilter};

mod state;
pub use state::{State, SupplyState, MapState, TryMapState, FilterState};

mod pipeline;
pub use pipeline::{Pipeline};
