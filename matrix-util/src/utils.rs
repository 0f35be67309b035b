/// Generate minibatch intervals `[lb, ub)`; the last one may be
/// shorter than the others
/// * `ntot` - number of total samples
/// * `batch_size` - the size of each batch
pub fn generate_minibatch_intervals(ntot: usize, batch_size: usize) -> Vec<(usize, usize)> {
    if batch_size == 0 {
        return vec![];
    }
    let num_batches = ntot.div_ceil(batch_size);
    (0..num_batches)
        .map(|b| {
            let lb: usize = b * batch_size;
            let ub: usize = ((b + 1) * batch_size).min(ntot);
            (lb, ub)
        })
        .collect::<Vec<_>>()
}

/// Split `[0, ntot)` into `num_slices` contiguous intervals `[lb, ub)`
/// whose sizes differ by at most one; the first `ntot % num_slices`
/// intervals take the extra element. Empty intervals are not
/// generated.
/// * `ntot` - number of total samples
/// * `num_slices` - number of intervals
pub fn generate_even_slices(ntot: usize, num_slices: usize) -> Vec<(usize, usize)> {
    let num_slices = num_slices.min(ntot);
    if num_slices == 0 {
        return vec![];
    }

    let base = ntot / num_slices;
    let extra = ntot % num_slices;

    let mut lb = 0;
    (0..num_slices)
        .map(|s| {
            let size = if s < extra { base + 1 } else { base };
            let interval = (lb, lb + size);
            lb += size;
            interval
        })
        .collect::<Vec<_>>()
}
