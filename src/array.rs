use std::ops::{Deref};

use super::{PipelineError, Result};
use super::shape::{element_count, advance, offset};

/// The source array provider: shape introspection plus coordinate reads.
///
/// A `Source` presents a value as a dense array of [`Source::Grain`]s. The
/// grain is whatever one pipeline element is: a scalar for a fully-indexed
/// array, or a whole sub-array when only the leading dimensions are exposed
/// (see [`Dense::blocks()`]).
///
/// ### Ownership
///
/// If `S` implements `Source`, then so do `&S`, `Box<S>`, `Rc<S>` and all
/// other types that [`Deref`] to `S`. Pipelines are therefore agnostic about
/// the ownership of the data they read.
pub trait Source {
    /// The element type.
    type Grain: Clone;

    /// The number of dimensions.
    fn rank(&self) -> usize;

    /// The extent of dimension `axis`.
    fn extent(&self, axis: usize) -> usize;

    /// Clone out the element at `position`.
    ///
    /// `position.len()` must equal [`rank()`] and every coordinate must be in
    /// bounds.
    ///
    /// [`rank()`]: Source::rank
    fn fetch(&self, position: &[usize]) -> Self::Grain;
}

impl<S: Source + ?Sized, D: Deref<Target = S>> Source for D {
    type Grain = S::Grain;
    #[inline(always)]
    fn rank(&self) -> usize { S::rank(self) }
    #[inline(always)]
    fn extent(&self, axis: usize) -> usize { S::extent(self, axis) }
    #[inline(always)]
    fn fetch(&self, position: &[usize]) -> Self::Grain { S::fetch(self, position) }
}

/// A flat sequence is a rank-1 `Source`. Via the [`Deref`] blanket
/// implementation this covers `Vec<T>` and `&[T]` too.
impl<T: Clone> Source for [T] {
    type Grain = T;

    fn rank(&self) -> usize { 1 }

    fn extent(&self, axis: usize) -> usize {
        assert_eq!(axis, 0, "Axis {:?} is out of bounds for a flat sequence", axis);
        self.len()
    }

    fn fetch(&self, position: &[usize]) -> T {
        assert_eq!(position.len(), 1);
        self[position[0]].clone()
    }
}

// ----------------------------------------------------------------------------

/// The result array provider: allocation plus coordinate writes.
///
/// [`Pipeline::build()`] can materialize into any `Target` whose `Grain`
/// matches the pipeline's. Allocation leaves every element default-valued;
/// the materializer then overwrites each position exactly once.
///
/// [`Pipeline::build()`]: super::Pipeline::build
pub trait Target {
    /// The element type.
    type Grain;

    /// Construct a container of shape `shape` with default-valued elements.
    fn allocate(shape: &[usize]) -> Self;

    /// Overwrite the element at `position`.
    fn store(&mut self, position: &[usize], value: Self::Grain);
}

/// A rank-1 `Target`.
impl<T: Clone + Default> Target for Vec<T> {
    type Grain = T;

    fn allocate(shape: &[usize]) -> Self {
        assert_eq!(shape.len(), 1, "A Vec can only hold a rank-1 result, got shape {:?}", shape);
        vec![T::default(); shape[0]]
    }

    fn store(&mut self, position: &[usize], value: T) {
        self[position[0]] = value;
    }
}

// ----------------------------------------------------------------------------

/// A dense row-major array of `T` with a runtime shape.
///
/// This is the crate's reference implementation of both [`Source`] and
/// [`Target`]. The elements are stored flat in a `Box<[T]>`; the shape maps
/// coordinate vectors onto that storage, last dimension varying fastest.
#[derive(Debug, Clone, PartialEq)]
pub struct Dense<T> {
    shape: Box<[usize]>,
    items: Box<[T]>,
}

impl<T> Dense<T> {
    fn new_inner(shape: Box<[usize]>, items: Box<[T]>) -> Self {
        assert_eq!(element_count(&shape), items.len());
        Self { shape, items }
    }

    /// Constructs a `Dense` of shape `shape` given its elements in row-major
    /// order.
    ///
    /// ```
    /// use ndpipeline::Dense;
    /// let a: Dense<f32> = Dense::new([3, 2], [0.0, 1.0, -1.0, 2.0, 3.0, -2.0]);
    /// assert_eq!(a[&[0, 1][..]], 1.0);
    /// assert_eq!(a[&[2, 0][..]], 3.0);
    /// ```
    pub fn new(shape: impl Into<Box<[usize]>>, items: impl Into<Box<[T]>>) -> Self {
        Self::new_inner(shape.into(), items.into())
    }

    /// Construct a `Dense` of shape `shape` from a function of the position.
    ///
    /// ```
    /// use ndpipeline::Dense;
    /// let a = Dense::from_fn([2, 3], |p| p[0] * 10 + p[1]);
    /// assert_eq!(a.as_ref(), [0, 1, 2, 10, 11, 12]);
    /// ```
    pub fn from_fn(
        shape: impl Into<Box<[usize]>>,
        mut f: impl FnMut(&[usize]) -> T,
    ) -> Self {
        let shape = shape.into();
        let count = element_count(&shape);
        let mut items = Vec::with_capacity(count);
        let mut position = vec![0; shape.len()];
        for _ in 0..count {
            items.push(f(&position));
            advance(&mut position, &shape);
        }
        Self::new_inner(shape, items.into())
    }

    /// The per-dimension extents.
    pub fn shape(&self) -> &[usize] { &self.shape }

    /// The number of dimensions.
    pub fn rank(&self) -> usize { self.shape.len() }

    /// The total number of elements.
    pub fn len(&self) -> usize { self.items.len() }

    /// Whether the array holds no elements.
    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    /// Returns the raw row-major elements.
    pub fn to_raw(self) -> Box<[T]> { self.items }
}

impl<T: Clone> Dense<T> {
    /// A [`Source`] view of this array truncated to its first `depth`
    /// dimensions.
    ///
    /// The trailing dimensions fold into the element type: each element of
    /// the view is an owned `Dense<T>` sub-block. Use this to run a pipeline
    /// whose requested depth is shallower than the array's rank.
    ///
    /// ```
    /// use ndpipeline::{Dense, Source};
    /// let a = Dense::from_fn([2, 3], |p| p[0] * 10 + p[1]);
    /// let rows = a.blocks(1).unwrap();
    /// assert_eq!(rows.rank(), 1);
    /// assert_eq!(rows.fetch(&[1]).as_ref(), [10, 11, 12]);
    /// ```
    ///
    /// # Errors
    ///
    /// [`InvalidDepth`] if `depth` is zero; [`ShapeMismatch`] if `depth`
    /// exceeds the array's rank.
    ///
    /// [`InvalidDepth`]: PipelineError::InvalidDepth
    /// [`ShapeMismatch`]: PipelineError::ShapeMismatch
    pub fn blocks(&self, depth: usize) -> Result<Blocks<'_, T>> {
        if depth == 0 {
            return Err(PipelineError::InvalidDepth(depth));
        }
        if depth > self.rank() {
            return Err(PipelineError::ShapeMismatch { depth, rank: self.rank() });
        }
        Ok(Blocks { array: self, depth })
    }
}

impl<T> std::convert::AsRef<[T]> for Dense<T> {
    fn as_ref(&self) -> &[T] { &self.items }
}

impl<T> std::convert::AsMut<[T]> for Dense<T> {
    fn as_mut(&mut self) -> &mut [T] { &mut self.items }
}

impl<T> std::ops::Index<&[usize]> for Dense<T> {
    type Output = T;
    #[inline(always)]
    fn index(&self, position: &[usize]) -> &T {
        &self.items[offset(position, &self.shape)]
    }
}

impl<T> std::ops::IndexMut<&[usize]> for Dense<T> {
    #[inline(always)]
    fn index_mut(&mut self, position: &[usize]) -> &mut T {
        &mut self.items[offset(position, &self.shape)]
    }
}

impl<T: Clone> Source for Dense<T> {
    type Grain = T;
    #[inline(always)]
    fn rank(&self) -> usize { self.shape.len() }
    #[inline(always)]
    fn extent(&self, axis: usize) -> usize { self.shape[axis] }
    #[inline(always)]
    fn fetch(&self, position: &[usize]) -> T { self[position].clone() }
}

impl<T: Clone + Default> Target for Dense<T> {
    type Grain = T;

    fn allocate(shape: &[usize]) -> Self {
        let count = element_count(shape);
        Self::new_inner(shape.into(), vec![T::default(); count].into())
    }

    fn store(&mut self, position: &[usize], value: T) {
        self[position] = value;
    }
}

// ----------------------------------------------------------------------------

/// The return type of [`Dense::blocks()`].
#[derive(Debug, Copy, Clone)]
pub struct Blocks<'a, T> {
    array: &'a Dense<T>,
    depth: usize,
}

impl<'a, T: Clone> Source for Blocks<'a, T> {
    type Grain = Dense<T>;

    fn rank(&self) -> usize { self.depth }

    fn extent(&self, axis: usize) -> usize {
        assert!(axis < self.depth, "Axis {:?} is out of bounds for depth {:?}", axis, self.depth);
        self.array.shape[axis]
    }

    fn fetch(&self, position: &[usize]) -> Dense<T> {
        let inner = &self.array.shape[self.depth..];
        let block = element_count(inner);
        let start = offset(position, &self.array.shape[..self.depth]) * block;
        Dense::new_inner(inner.into(), self.array.items[start..start + block].into())
    }
}
