use std::ops::Range;

/// Split the byte range `[start, start + count)` into at most `workers`
/// contiguous, non-overlapping ranges of near-equal size. The first
/// `count % workers` ranges carry one extra byte. Empty ranges are dropped,
/// so fewer ranges than workers come back when `count < workers`.
pub fn plan_ranges(start: usize, count: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let base = count / workers;
    let extra = count % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut offset = start;
    for w in 0..workers {
        let len = base + usize::from(w < extra);
        if len == 0 {
            break;
        }
        ranges.push(offset..offset + len);
        offset += len;
    }

    ranges
}
