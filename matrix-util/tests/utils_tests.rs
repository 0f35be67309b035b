use matrix_util::traits::MatOps;
use matrix_util::utils::{generate_even_slices, generate_minibatch_intervals};

#[test]
fn minibatch_intervals_cover_everything() {
    let intervals = generate_minibatch_intervals(10, 4);
    assert_eq!(intervals, vec![(0, 4), (4, 8), (8, 10)]);

    assert_eq!(generate_minibatch_intervals(8, 4), vec![(0, 4), (4, 8)]);
    assert!(generate_minibatch_intervals(0, 4).is_empty());
    assert!(generate_minibatch_intervals(3, 0).is_empty());
}

#[test]
fn even_slices_differ_by_at_most_one() {
    assert_eq!(generate_even_slices(10, 3), vec![(0, 4), (4, 7), (7, 10)]);
    assert_eq!(generate_even_slices(3, 8), vec![(0, 1), (1, 2), (2, 3)]);
    assert!(generate_even_slices(0, 4).is_empty());

    for ntot in 1..30 {
        for nslices in 1..8 {
            let slices = generate_even_slices(ntot, nslices);
            assert_eq!(slices.first().unwrap().0, 0);
            assert_eq!(slices.last().unwrap().1, ntot);
            for w in slices.windows(2) {
                assert_eq!(w[0].1, w[1].0);
            }
            let sizes = slices.iter().map(|(lb, ub)| ub - lb).collect::<Vec<_>>();
            let max = *sizes.iter().max().unwrap();
            let min = *sizes.iter().min().unwrap();
            assert!(max - min <= 1);
        }
    }
}

#[test]
fn sum_to_one_rows_test() {
    let xx = ndarray::array![[1.0, 3.0], [0.0, 0.0], [2.0, 2.0]];
    let yy = xx.sum_to_one_rows();
    approx::assert_abs_diff_eq!(yy, ndarray::array![[0.25, 0.75], [0.0, 0.0], [0.5, 0.5]]);
}
