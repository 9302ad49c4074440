//! The runtime counterpart of the operation chain.
//!
//! Preparing an [`Op`] chain yields a chain of states, one per operation
//! (except that a filter collapses into a single buffer-walking state). Each
//! state produces one element per [`State::next()`] call, in row-major order,
//! and knows its own output shape. States are single-pass and
//! non-restartable: a chain is consumed by exactly one materialization.
//!
//! [`Op`]: super::Op

use log::debug;

use super::{PipelineError, Result, Source, Target};
use super::shape::{element_count, advance};

/// A cursor that produces the elements of a prepared pipeline.
pub trait State {
    /// The element type produced.
    type Grain;

    /// The output shape.
    fn shape(&self) -> &[usize];

    /// Produce the next element in row-major order.
    ///
    /// Calling `next()` more than `element_count(self.shape())` times is a
    /// contract violation, not a recoverable error.
    fn next(&mut self) -> Result<Self::Grain>;
}

// ----------------------------------------------------------------------------

/// The state of a [`Supply`]: a position cursor over the source array.
///
/// [`Supply`]: super::Supply
pub struct SupplyState<'a, S> {
    source: &'a S,
    shape: &'a [usize],
    position: Box<[usize]>,
}

impl<'a, S: Source> SupplyState<'a, S> {
    pub(crate) fn new(source: &'a S, shape: &'a [usize]) -> Self {
        Self { source, shape, position: vec![0; shape.len()].into() }
    }
}

impl<'a, S: Source> State for SupplyState<'a, S> {
    type Grain = S::Grain;

    fn shape(&self) -> &[usize] { self.shape }

    fn next(&mut self) -> Result<S::Grain> {
        let value = self.source.fetch(&self.position);
        advance(&mut self.position, self.shape);
        Ok(value)
    }
}

// ----------------------------------------------------------------------------

/// The state of a [`MapTo`]: applies the transform to each predecessor
/// element as it is produced.
///
/// [`MapTo`]: super::MapTo
pub struct MapState<'a, St, F> {
    prev: St,
    f: &'a F,
}

impl<'a, St, F> MapState<'a, St, F> {
    pub(crate) fn new(prev: St, f: &'a F) -> Self {
        Self { prev, f }
    }
}

impl<'a, St: State, U: Clone, F: Fn(St::Grain) -> U> State for MapState<'a, St, F> {
    type Grain = U;

    fn shape(&self) -> &[usize] { self.prev.shape() }

    fn next(&mut self) -> Result<U> {
        Ok((self.f)(self.prev.next()?))
    }
}

// ----------------------------------------------------------------------------

/// The state of a [`TryMapTo`]: like [`MapState`], but a transform failure
/// aborts the pass as [`PipelineError::UserFunction`].
///
/// [`TryMapTo`]: super::TryMapTo
pub struct TryMapState<'a, St, F> {
    prev: St,
    f: &'a F,
}

impl<'a, St, F> TryMapState<'a, St, F> {
    pub(crate) fn new(prev: St, f: &'a F) -> Self {
        Self { prev, f }
    }
}

impl<'a, St: State, U: Clone, E, F> State for TryMapState<'a, St, F> where
    F: Fn(St::Grain) -> std::result::Result<U, E>,
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    type Grain = U;

    fn shape(&self) -> &[usize] { self.prev.shape() }

    fn next(&mut self) -> Result<U> {
        (self.f)(self.prev.next()?).map_err(|e| PipelineError::UserFunction(e.into()))
    }
}

// ----------------------------------------------------------------------------

/// The state of a [`Filter`]: the fully buffered predecessor elements, the
/// keep-mask, and a read cursor that skips discarded positions.
///
/// The shape is `[kept]` where `kept` is the number of `true` entries in the
/// mask, so relative order and count are fixed before the first `next()`.
///
/// [`Filter`]: super::Filter
pub struct FilterState<T> {
    items: Box<[T]>,
    keep: Box<[bool]>,
    shape: [usize; 1],
    cursor: usize,
}

impl<T> FilterState<T> {
    pub(crate) fn new(items: Vec<T>, keep: Vec<bool>) -> Self {
        assert_eq!(items.len(), keep.len());
        let kept = keep.iter().filter(|&&k| k).count();
        Self { items: items.into(), keep: keep.into(), shape: [kept], cursor: 0 }
    }
}

impl<T: Clone> State for FilterState<T> {
    type Grain = T;

    fn shape(&self) -> &[usize] { &self.shape }

    fn next(&mut self) -> Result<T> {
        while !self.keep[self.cursor] {
            self.cursor += 1;
        }
        let value = self.items[self.cursor].clone();
        self.cursor += 1;
        Ok(value)
    }
}

// ----------------------------------------------------------------------------

/// Drive `state` to completion, writing into a freshly allocated `A`.
///
/// Calls `state.next()` exactly once per output cell, storing each value at
/// strictly increasing row-major coordinates.
pub(crate) fn materialize<St, A>(state: &mut St) -> Result<A> where
    St: State,
    A: Target<Grain = St::Grain>,
{
    let shape = state.shape().to_vec();
    let total = element_count(&shape);
    debug!("materializing {} elements into shape {:?}", total, shape);
    let mut result = A::allocate(&shape);
    let mut position = vec![0; shape.len()];
    for _ in 0..total {
        result.store(&position, state.next()?);
        advance(&mut position, &shape);
    }
    Ok(result)
}
