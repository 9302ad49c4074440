use super::{PipelineError, Result, Source, Target};
use super::op::{Op, Supply, MapTo, TryMapTo, Filter, TryFilter};
use super::shape::{element_count};
use super::state::{State, materialize};

/// A lazy, chainable description of elementwise work over an array.
///
/// A `Pipeline` wraps an [`Op`] chain. Each builder method consumes the
/// pipeline and returns a longer one; nothing is computed until
/// [`build()`] or [`reduce()`]. The one exception to laziness is documented
/// on [`filter()`].
///
/// Building takes `&self`: the same pipeline definition can be materialized
/// any number of times, each time preparing a fresh state chain.
///
/// ```
/// use ndpipeline::{Pipeline, Dense};
/// let a: Dense<u32> = Dense::new([10], (1..=10).collect::<Vec<u32>>());
/// let out: Vec<u32> = Pipeline::from_array(&a, 1).unwrap()
///     .map(|i| i + 1)
///     .filter(|&i| i > 5).unwrap()
///     .build().unwrap();
/// assert_eq!(out, [6, 7, 8, 9, 10, 11]);
/// ```
///
/// [`build()`]: Pipeline::build
/// [`reduce()`]: Pipeline::reduce
/// [`filter()`]: Pipeline::filter
#[derive(Debug, Clone)]
pub struct Pipeline<O>(O);

impl<S: Source> Pipeline<Supply<S>> {
    /// Start a pipeline over `source`, exposing `depth` dimensions.
    ///
    /// The pipeline's shape is the source's first `depth` extents, captured
    /// now; its grain is the source's element type. The source must present
    /// exactly `depth` dimensions — to run a shallower pipeline over a
    /// deeper array, fold the trailing dimensions into the grain first with
    /// [`Dense::blocks()`].
    ///
    /// ```
    /// use ndpipeline::{Pipeline, Dense};
    /// let a = Dense::from_fn([5, 5], |p| p[0] * 5 + p[1]);
    /// let p = Pipeline::from_array(&a, 2).unwrap();
    /// assert_eq!(p.rank(), 2);
    /// ```
    ///
    /// # Errors
    ///
    /// [`InvalidDepth`] if `depth` is zero; [`ShapeMismatch`] if `depth`
    /// differs from the source's rank.
    ///
    /// [`Dense::blocks()`]: super::Dense::blocks
    /// [`InvalidDepth`]: PipelineError::InvalidDepth
    /// [`ShapeMismatch`]: PipelineError::ShapeMismatch
    pub fn from_array(source: S, depth: usize) -> Result<Self> {
        Ok(Pipeline(Supply::new(source, depth)?))
    }
}

impl<O: Op> Pipeline<O> {
    /// The number of dimensions of the pipeline's result.
    pub fn rank(&self) -> usize { self.0.rank() }

    /// Append a lazy elementwise transform.
    ///
    /// `f` must be pure: it may be called any number of times, including
    /// zero, for elements later discarded by a downstream filter. It is not
    /// invoked until materialization.
    ///
    /// ```
    /// use ndpipeline::Pipeline;
    /// let input: Vec<u32> = (0..5).collect();
    /// let out: Vec<u32> = Pipeline::from_array(&input, 1).unwrap()
    ///     .map(|x| x * x)
    ///     .build().unwrap();
    /// assert_eq!(out, [0, 1, 4, 9, 16]);
    /// ```
    pub fn map<U: Clone, F: Fn(O::Grain) -> U>(self, f: F) -> Pipeline<MapTo<O, F>> {
        self.map_to(f)
    }

    /// [`map()`], with the target grain type named at the call site.
    ///
    /// The grain type of the new pipeline is `U`, which may differ from the
    /// current grain; rank is unchanged.
    ///
    /// ```
    /// use ndpipeline::Pipeline;
    /// let input: Vec<u32> = (1..=3).collect();
    /// let out: Vec<f64> = Pipeline::from_array(&input, 1).unwrap()
    ///     .map_to::<f64, _>(|i| i as f64 / 2.0)
    ///     .build().unwrap();
    /// assert_eq!(out, [0.5, 1.0, 1.5]);
    /// ```
    ///
    /// [`map()`]: Pipeline::map
    pub fn map_to<U: Clone, F: Fn(O::Grain) -> U>(self, f: F) -> Pipeline<MapTo<O, F>> {
        Pipeline(MapTo(self.0, f))
    }

    /// Append a lazy, fallible elementwise transform.
    ///
    /// An `Err` returned by `f` during materialization aborts the whole
    /// `build`/`reduce` call as [`PipelineError::UserFunction`], carrying the
    /// original error as its source.
    pub fn try_map<U, E, F>(self, f: F) -> Pipeline<TryMapTo<O, F>> where
        U: Clone,
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
        F: Fn(O::Grain) -> std::result::Result<U, E>,
    {
        Pipeline(TryMapTo(self.0, f))
    }

    /// Keep only the elements for which `predicate` returns true, preserving
    /// relative order.
    ///
    /// The result is rank-1 with length equal to the number of kept
    /// elements. Calling `filter` is cheap and performs no work, but it
    /// breaks pure laziness later: because the output length is unknown
    /// until every upstream element exists, *preparation* (at `build`/
    /// `reduce` time) drains everything upstream of the filter exactly once,
    /// buffering each value and its verdict, before elements flow lazily
    /// again. Do not assume O(1) preparation cost for a filtered pipeline.
    ///
    /// ```
    /// use ndpipeline::Pipeline;
    /// let input: Vec<u32> = (1..=10).collect();
    /// let out: Vec<u32> = Pipeline::from_array(&input, 1).unwrap()
    ///     .filter(|&i| i % 3 == 0).unwrap()
    ///     .build().unwrap();
    /// assert_eq!(out, [3, 6, 9]);
    /// ```
    ///
    /// # Errors
    ///
    /// [`UnsupportedRank`] unless the pipeline's rank is exactly 1.
    ///
    /// [`UnsupportedRank`]: PipelineError::UnsupportedRank
    pub fn filter<F: Fn(&O::Grain) -> bool>(self, predicate: F) -> Result<Pipeline<Filter<O, F>>> {
        self.check_rank_one()?;
        Ok(Pipeline(Filter(self.0, predicate)))
    }

    /// [`filter()`], with a fallible predicate.
    ///
    /// A predicate `Err` surfaces as [`PipelineError::UserFunction`] when the
    /// filter's buffering pass runs; the partially built buffer is discarded
    /// and the whole pipeline fails.
    ///
    /// [`filter()`]: Pipeline::filter
    pub fn try_filter<E, F>(self, predicate: F) -> Result<Pipeline<TryFilter<O, F>>> where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
        F: Fn(&O::Grain) -> std::result::Result<bool, E>,
    {
        self.check_rank_one()?;
        Ok(Pipeline(TryFilter(self.0, predicate)))
    }

    /// Materialize the pipeline into a freshly allocated container.
    ///
    /// Prepares the operation chain into a state chain, allocates an `A` of
    /// the final shape, and fills it with exactly one produced element per
    /// cell, in row-major order. The caller owns the result.
    ///
    /// ```
    /// use ndpipeline::{Pipeline, Dense};
    /// let a = Dense::from_fn([2, 3], |p| p[0] * 3 + p[1]);
    /// let out: Dense<usize> = Pipeline::from_array(&a, 2).unwrap()
    ///     .map(|x| x * 10)
    ///     .build().unwrap();
    /// assert_eq!(out.shape(), [2, 3]);
    /// assert_eq!(out.as_ref(), [0, 10, 20, 30, 40, 50]);
    /// ```
    pub fn build<A: Target<Grain = O::Grain>>(&self) -> Result<A> {
        let mut state = self.0.prepare()?;
        materialize(&mut state)
    }

    /// Left-fold the rank-1 result, seeding the accumulator with the first
    /// element.
    ///
    /// ```
    /// use ndpipeline::Pipeline;
    /// let input: Vec<u32> = (1..=10).collect();
    /// let total = Pipeline::from_array(&input, 1).unwrap()
    ///     .reduce(|a, b| a + b).unwrap();
    /// assert_eq!(total, 55);
    /// ```
    ///
    /// # Errors
    ///
    /// [`UnsupportedRank`] unless the pipeline's rank is exactly 1 (checked
    /// before any element is produced); [`EmptyReduce`] if the pipeline
    /// produces no elements.
    ///
    /// [`UnsupportedRank`]: PipelineError::UnsupportedRank
    /// [`EmptyReduce`]: PipelineError::EmptyReduce
    pub fn reduce<F: Fn(O::Grain, O::Grain) -> O::Grain>(&self, combine: F) -> Result<O::Grain> {
        self.check_rank_one()?;
        let mut state = self.0.prepare()?;
        let total = element_count(state.shape());
        if total == 0 {
            return Err(PipelineError::EmptyReduce);
        }
        let mut accumulator = state.next()?;
        for _ in 1..total {
            accumulator = combine(accumulator, state.next()?);
        }
        Ok(accumulator)
    }

    fn check_rank_one(&self) -> Result<()> {
        match self.0.rank() {
            1 => Ok(()),
            rank => Err(PipelineError::UnsupportedRank { rank }),
        }
    }
}
