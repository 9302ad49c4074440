//! The immutable operation chain behind a [`Pipeline`].
//!
//! Every pipeline step is described by one of the structs in this module:
//! [`Supply`] wraps the source array, and each of the others exclusively owns
//! its predecessor, forming a backward-linked chain with no cycles. The chain
//! is purely structural; no element is produced until [`Op::prepare()`] turns
//! it into a [`State`] chain.
//!
//! [`Pipeline`]: super::Pipeline

use log::trace;

use super::{PipelineError, Result, Source};
use super::shape::{element_count};
use super::state::{State, SupplyState, MapState, TryMapState, FilterState};

mod sealed {
    pub trait Sealed {}
}

/// One step of a pending computation.
///
/// The set of operations is closed: `Op` cannot be implemented outside this
/// crate, so every chain is built from [`Supply`], [`MapTo`], [`TryMapTo`],
/// [`Filter`] and [`TryFilter`] only.
pub trait Op: sealed::Sealed {
    /// The element type this operation produces.
    type Grain: Clone;

    /// The runtime cursor chain for one materialization pass.
    type State<'a>: State<Grain = Self::Grain> where Self: 'a;

    /// The number of dimensions this operation produces.
    fn rank(&self) -> usize;

    /// Instantiate the state chain for one pass over the elements.
    ///
    /// Preparation is cheap for every operation except [`Filter`] and
    /// [`TryFilter`], which drain their predecessor completely here; see
    /// [`Pipeline::filter()`].
    ///
    /// Each prepared state is single-use; preparing the same chain again
    /// yields a fresh, independent pass.
    ///
    /// [`Pipeline::filter()`]: super::Pipeline::filter
    fn prepare(&self) -> Result<Self::State<'_>>;
}

// ----------------------------------------------------------------------------

/// The root operation: a source array plus the captured pipeline shape.
#[derive(Debug, Clone)]
pub struct Supply<S> {
    source: S,
    shape: Box<[usize]>,
}

impl<S: Source> Supply<S> {
    pub(crate) fn new(source: S, depth: usize) -> Result<Self> {
        if depth == 0 {
            return Err(PipelineError::InvalidDepth(depth));
        }
        let rank = source.rank();
        if depth != rank {
            return Err(PipelineError::ShapeMismatch { depth, rank });
        }
        let shape = (0..depth).map(|axis| source.extent(axis)).collect();
        Ok(Self { source, shape })
    }
}

impl<S> sealed::Sealed for Supply<S> {}

impl<S: Source> Op for Supply<S> {
    type Grain = S::Grain;
    type State<'a> = SupplyState<'a, S> where Self: 'a;

    fn rank(&self) -> usize { self.shape.len() }

    fn prepare(&self) -> Result<Self::State<'_>> {
        Ok(SupplyState::new(&self.source, &self.shape))
    }
}

// ----------------------------------------------------------------------------

/// The return type of [`Pipeline::map_to()`].
///
/// The target grain type is the output type of `F`; rank is unchanged.
///
/// [`Pipeline::map_to()`]: super::Pipeline::map_to
#[derive(Debug, Copy, Clone)]
pub struct MapTo<P, F>(pub(crate) P, pub(crate) F);

impl<P, F> sealed::Sealed for MapTo<P, F> {}

impl<P: Op, U: Clone, F: Fn(P::Grain) -> U> Op for MapTo<P, F> {
    type Grain = U;
    type State<'a> = MapState<'a, P::State<'a>, F> where Self: 'a;

    fn rank(&self) -> usize { self.0.rank() }

    fn prepare(&self) -> Result<Self::State<'_>> {
        Ok(MapState::new(self.0.prepare()?, &self.1))
    }
}

// ----------------------------------------------------------------------------

/// The return type of [`Pipeline::try_map()`].
///
/// [`Pipeline::try_map()`]: super::Pipeline::try_map
#[derive(Debug, Copy, Clone)]
pub struct TryMapTo<P, F>(pub(crate) P, pub(crate) F);

impl<P, F> sealed::Sealed for TryMapTo<P, F> {}

impl<P: Op, U: Clone, E, F> Op for TryMapTo<P, F> where
    F: Fn(P::Grain) -> std::result::Result<U, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Grain = U;
    type State<'a> = TryMapState<'a, P::State<'a>, F> where Self: 'a;

    fn rank(&self) -> usize { self.0.rank() }

    fn prepare(&self) -> Result<Self::State<'_>> {
        Ok(TryMapState::new(self.0.prepare()?, &self.1))
    }
}

// ----------------------------------------------------------------------------

/// The return type of [`Pipeline::filter()`].
///
/// Rank is unconditionally 1; the facade only constructs a `Filter` on a
/// rank-1 predecessor.
///
/// [`Pipeline::filter()`]: super::Pipeline::filter
#[derive(Debug, Copy, Clone)]
pub struct Filter<P, F>(pub(crate) P, pub(crate) F);

impl<P, F> sealed::Sealed for Filter<P, F> {}

impl<P: Op, F: Fn(&P::Grain) -> bool> Op for Filter<P, F> {
    type Grain = P::Grain;
    type State<'a> = FilterState<P::Grain> where Self: 'a;

    fn rank(&self) -> usize { 1 }

    // The output length is unknown until every predecessor element exists,
    // so preparation drains the predecessor completely, exactly once.
    fn prepare(&self) -> Result<Self::State<'_>> {
        let mut prev = self.0.prepare()?;
        let total = element_count(prev.shape());
        let mut items = Vec::with_capacity(total);
        for _ in 0..total {
            items.push(prev.next()?);
        }
        let keep: Vec<bool> = items.iter().map(&self.1).collect();
        let state = FilterState::new(items, keep);
        trace!("filter retained {} of {} elements", state.shape()[0], total);
        Ok(state)
    }
}

// ----------------------------------------------------------------------------

/// The return type of [`Pipeline::try_filter()`].
///
/// [`Pipeline::try_filter()`]: super::Pipeline::try_filter
#[derive(Debug, Copy, Clone)]
pub struct TryFilter<P, F>(pub(crate) P, pub(crate) F);

impl<P, F> sealed::Sealed for TryFilter<P, F> {}

impl<P: Op, E, F> Op for TryFilter<P, F> where
    F: Fn(&P::Grain) -> std::result::Result<bool, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Grain = P::Grain;
    type State<'a> = FilterState<P::Grain> where Self: 'a;

    fn rank(&self) -> usize { 1 }

    fn prepare(&self) -> Result<Self::State<'_>> {
        let mut prev = self.0.prepare()?;
        let total = element_count(prev.shape());
        let mut items = Vec::with_capacity(total);
        for _ in 0..total {
            items.push(prev.next()?);
        }
        let mut keep = Vec::with_capacity(total);
        for item in &items {
            keep.push((self.1)(item).map_err(|e| PipelineError::UserFunction(e.into()))?);
        }
        let state = FilterState::new(items, keep);
        trace!("filter retained {} of {} elements", state.shape()[0], total);
        Ok(state)
    }
}
