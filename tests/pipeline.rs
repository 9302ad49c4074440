use std::cell::Cell;
use std::error::Error;

use ndpipeline::{Dense, Pipeline, PipelineError};

#[test_log::test]
fn map_chain_preserves_shape_and_values() {
    let input: Vec<u32> = (1..=10).collect();
    let output: Vec<u32> = Pipeline::from_array(&input, 1).unwrap()
        .map(|i| i + 1)
        .map(|i| i * 2)
        .build()
        .unwrap();
    assert_eq!(output.len(), input.len());
    for (i, o) in input.iter().zip(&output) {
        assert_eq!((i + 1) * 2, *o);
    }
}

#[test_log::test]
fn map_composition_is_observationally_fused() {
    let f = |x: u32| x + 7;
    let g = |x: u32| x * 3;
    let input: Vec<u32> = (0..20).collect();
    let chained: Vec<u32> = Pipeline::from_array(&input, 1).unwrap()
        .map(f)
        .map(g)
        .build()
        .unwrap();
    let fused: Vec<u32> = Pipeline::from_array(&input, 1).unwrap()
        .map_to::<u32, _>(move |x| g(f(x)))
        .build()
        .unwrap();
    assert_eq!(chained, fused);
}

#[test_log::test]
fn filter_keeps_matching_elements_in_order() {
    let input: Vec<u32> = (1..=10).collect();
    let output: Vec<u32> = Pipeline::from_array(&input, 1).unwrap()
        .map(|i| i + 1)
        .filter(|&i| i > 5).unwrap()
        .build()
        .unwrap();
    assert_eq!(output, [6, 7, 8, 9, 10, 11]);
}

#[test_log::test]
fn depth_two_map_over_square_array() {
    let input = Dense::from_fn([5, 5], |p| ((p[0] + 1) * 10 + p[1] + 1) as u32);
    let output: Dense<u32> = Pipeline::from_array(&input, 2).unwrap()
        .map(|i| i + 1)
        .build()
        .unwrap();
    assert_eq!(output.shape(), [5, 5]);
    assert_eq!(output[&[0, 0][..]], 12);
    assert_eq!(output[&[2, 3][..]], 35);
    assert_eq!(output[&[4, 4][..]], 56);
}

#[test_log::test]
fn reduce_folds_left_to_right() {
    let input: Vec<u32> = (1..=10).collect();
    let total = Pipeline::from_array(&input, 1).unwrap()
        .map_to::<f64, _>(|i| i as f64 + 0.22)
        .reduce(|a, b| a + b)
        .unwrap();
    assert!((total - 57.2).abs() < 0.001);
}

#[test_log::test]
fn reduce_order_is_observable() {
    // Subtraction is not associative, so the fold order shows through.
    let input: Vec<i64> = vec![100, 1, 2, 3];
    let result = Pipeline::from_array(&input, 1).unwrap()
        .reduce(|a, b| a - b)
        .unwrap();
    assert_eq!(result, 94);
}

#[test_log::test]
fn depth_validation() {
    let flat: Vec<u32> = (1..=10).collect();
    assert!(matches!(
        Pipeline::from_array(&flat, 0),
        Err(PipelineError::InvalidDepth(0)),
    ));
    assert!(matches!(
        Pipeline::from_array(&flat, 2),
        Err(PipelineError::ShapeMismatch { depth: 2, rank: 1 }),
    ));

    let square = Dense::from_fn([5, 5], |p| p[0] * 5 + p[1]);
    assert_eq!(Pipeline::from_array(&square, 2).unwrap().rank(), 2);
    assert!(matches!(
        Pipeline::from_array(&square, 3),
        Err(PipelineError::ShapeMismatch { depth: 3, rank: 2 }),
    ));
    assert!(matches!(square.blocks(0), Err(PipelineError::InvalidDepth(0))));
    assert!(matches!(
        square.blocks(3),
        Err(PipelineError::ShapeMismatch { depth: 3, rank: 2 }),
    ));
}

#[test_log::test]
fn filter_and_reduce_require_rank_one() {
    let square = Dense::from_fn([2, 3], |p| (p[0] * 3 + p[1]) as u32);
    let transforms = Cell::new(0);

    let p = Pipeline::from_array(&square, 2).unwrap()
        .map(|x| { transforms.set(transforms.get() + 1); x });
    assert!(matches!(
        p.filter(|_| true),
        Err(PipelineError::UnsupportedRank { rank: 2 }),
    ));

    let p = Pipeline::from_array(&square, 2).unwrap()
        .map(|x| { transforms.set(transforms.get() + 1); x });
    assert!(matches!(
        p.reduce(|a, b| a + b),
        Err(PipelineError::UnsupportedRank { rank: 2 }),
    ));

    // The precondition failed fast: nothing was materialized.
    assert_eq!(transforms.get(), 0);
}

#[test_log::test]
fn filter_buffers_upstream_exactly_once_per_build() {
    let input: Vec<u32> = (1..=6).collect();
    let transforms = Cell::new(0);
    let p = Pipeline::from_array(&input, 1).unwrap()
        .map(|x| { transforms.set(transforms.get() + 1); x })
        .filter(|&x| x % 2 == 0).unwrap();

    // filter() itself ran nothing.
    assert_eq!(transforms.get(), 0);

    let output: Vec<u32> = p.build().unwrap();
    assert_eq!(output, [2, 4, 6]);
    // The buffering pass visited every upstream element once, kept or not.
    assert_eq!(transforms.get(), 6);
}

#[test_log::test]
fn building_twice_yields_identical_results() {
    let input: Vec<u32> = (1..=10).collect();
    let p = Pipeline::from_array(&input, 1).unwrap().map(|i| i * 3);
    let first: Vec<u32> = p.build().unwrap();
    let second: Vec<u32> = p.build().unwrap();
    assert_eq!(first, second);

    let filtered = p.filter(|&i| i % 2 == 0).unwrap();
    let first: Vec<u32> = filtered.build().unwrap();
    let second: Vec<u32> = filtered.build().unwrap();
    assert_eq!(first, second);
}

#[test_log::test]
fn reduce_on_empty_result_is_an_error() {
    let empty: Vec<u32> = Vec::new();
    assert!(matches!(
        Pipeline::from_array(&empty, 1).unwrap().reduce(|a, b| a + b),
        Err(PipelineError::EmptyReduce),
    ));

    // Filtering everything away reduces to the same error.
    let input: Vec<u32> = (1..=10).collect();
    assert!(matches!(
        Pipeline::from_array(&input, 1).unwrap()
            .filter(|_| false).unwrap()
            .reduce(|a, b| a + b),
        Err(PipelineError::EmptyReduce),
    ));
}

#[test_log::test]
fn failing_transform_aborts_the_build() {
    let input: Vec<u32> = (1..=10).collect();
    let result = Pipeline::from_array(&input, 1).unwrap()
        .try_map(|i| if i == 5 { Err("boom") } else { Ok(i) })
        .build::<Vec<u32>>();
    match result {
        Err(e @ PipelineError::UserFunction(_)) => {
            assert_eq!(e.source().unwrap().to_string(), "boom");
        }
        other => panic!("expected UserFunction, got {:?}", other),
    }
}

#[test_log::test]
fn failing_predicate_aborts_the_buffering_pass() {
    let input: Vec<u32> = (1..=10).collect();
    let result = Pipeline::from_array(&input, 1).unwrap()
        .try_filter(|&x| if x > 7 { Err("bad element") } else { Ok(x % 2 == 0) }).unwrap()
        .build::<Vec<u32>>();
    assert!(matches!(result, Err(PipelineError::UserFunction(_))));
}

#[test_log::test]
fn blocks_fold_trailing_dimensions_into_the_grain() {
    let a = Dense::from_fn([2, 3], |p| (p[0] * 10 + p[1]) as u32);
    let sums: Vec<u32> = Pipeline::from_array(a.blocks(1).unwrap(), 1).unwrap()
        .map(|row| row.as_ref().iter().sum::<u32>())
        .build()
        .unwrap();
    assert_eq!(sums, [0 + 1 + 2, 10 + 11 + 12]);
}

#[test_log::test]
fn build_into_dense_and_vec_agree() {
    let input: Vec<u32> = (1..=6).collect();
    let p = Pipeline::from_array(&input, 1).unwrap().map(|i| i * i);
    let d: Dense<u32> = p.build().unwrap();
    let v: Vec<u32> = p.build().unwrap();
    assert_eq!(d.shape(), [6]);
    assert_eq!(d.as_ref(), v.as_slice());
}
