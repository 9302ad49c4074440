//! Pure utilities for runtime shapes and positions.
//!
//! A *shape* is an ordered sequence of per-dimension extents; its length is
//! the *rank*. A *position* is a coordinate vector of the same length,
//! satisfying `position[i] < shape[i]` for every dimension. All traversal in
//! this crate is row-major: the last dimension varies fastest.

/// The number of elements in an array of shape `shape`.
///
/// A rank-0 shape describes a single element.
///
/// ```
/// use ndpipeline::shape::element_count;
/// assert_eq!(element_count(&[2, 3]), 6);
/// assert_eq!(element_count(&[4, 0]), 0);
/// assert_eq!(element_count(&[]), 1);
/// ```
pub fn element_count(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Row-major odometer increment.
///
/// Advances `position` in place to the next coordinate of `shape`. The last
/// dimension varies fastest; a carry wraps its dimension to zero and
/// increments the dimension to its left. After the final coordinate the
/// position wraps back to all zeros; callers must not advance more than
/// [`element_count`] times per traversal.
///
/// ```
/// use ndpipeline::shape::advance;
/// let mut position = vec![0, 2];
/// advance(&mut position, &[2, 3]);
/// assert_eq!(position, [1, 0]);
/// ```
///
/// # Panics
///
/// Panics if `position` and `shape` have different lengths.
pub fn advance(position: &mut [usize], shape: &[usize]) {
    assert_eq!(position.len(), shape.len());
    for i in (0..shape.len()).rev() {
        position[i] += 1;
        if position[i] < shape[i] {
            return;
        }
        position[i] = 0;
    }
}

/// The flat row-major offset of `position` within `shape`.
///
/// ```
/// use ndpipeline::shape::offset;
/// assert_eq!(offset(&[0, 2], &[2, 3]), 2);
/// assert_eq!(offset(&[1, 0], &[2, 3]), 3);
/// ```
///
/// # Panics
///
/// Panics if the lengths differ or a coordinate is out of bounds.
pub fn offset(position: &[usize], shape: &[usize]) -> usize {
    assert_eq!(position.len(), shape.len());
    position.iter().zip(shape).fold(0, |off, (&p, &extent)| {
        assert!(p < extent, "Position {:?} is out of bounds for shape {:?}", position, shape);
        off * extent + p
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_visits_row_major_order() {
        let shape = [2, 3];
        let mut position = vec![0; 2];
        let mut visited = Vec::new();
        for _ in 0..element_count(&shape) {
            visited.push((position[0], position[1]));
            advance(&mut position, &shape);
        }
        assert_eq!(visited, [(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
        // The cursor has carried past every dimension and wrapped.
        assert_eq!(position, [0, 0]);
    }

    #[test]
    fn offset_matches_traversal_order() {
        let shape = [2, 3, 4];
        let mut position = vec![0; 3];
        for expected in 0..element_count(&shape) {
            assert_eq!(offset(&position, &shape), expected);
            advance(&mut position, &shape);
        }
    }

    #[test]
    #[should_panic]
    fn offset_rejects_out_of_bounds() {
        offset(&[0, 3], &[2, 3]);
    }
}
