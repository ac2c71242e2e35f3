//! Row-range scheduling.
//!
//! Rows of a reduction are independent. The output buffer is cut into
//! disjoint row ranges with `split_at_mut` and the halves are handed to
//! `rayon::join` recursively until a range falls below the threshold.
//! Without the `parallel` feature every range runs on the calling thread.

/// Default minimum number of input elements before rows are split across
/// threads. Matches Strided.jl's `MINTHREADLENGTH = 1 << 15`.
pub const MIN_PARALLEL_LEN: usize = 1 << 15;

/// Run `f` over every row of `out`, where each row occupies `width`
/// consecutive slots.
///
/// `f(first_row, chunk)` receives a chunk holding a whole number of rows,
/// starting at row index `first_row`. `work_per_row` is the number of input
/// elements one row touches; ranges whose total work is at most `threshold`
/// are not split further.
#[cfg(feature = "parallel")]
pub(crate) fn for_each_row_chunk<T, F>(
    out: &mut [T],
    width: usize,
    work_per_row: usize,
    threshold: usize,
    f: &F,
) where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    if width == 0 {
        return;
    }
    split_rows(out, 0, width, work_per_row.max(1), threshold, f);
}

#[cfg(feature = "parallel")]
fn split_rows<T, F>(
    out: &mut [T],
    first_row: usize,
    width: usize,
    work_per_row: usize,
    threshold: usize,
    f: &F,
) where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    let rows = out.len() / width;
    if rows <= 1 || rows.saturating_mul(work_per_row) <= threshold {
        f(first_row, out);
        return;
    }
    let mid = rows / 2;
    let (left, right) = out.split_at_mut(mid * width);
    rayon::join(
        || split_rows(left, first_row, width, work_per_row, threshold, f),
        || split_rows(right, first_row + mid, width, work_per_row, threshold, f),
    );
}

#[cfg(not(feature = "parallel"))]
pub(crate) fn for_each_row_chunk<T, F>(
    out: &mut [T],
    width: usize,
    _work_per_row: usize,
    _threshold: usize,
    f: &F,
) where
    F: Fn(usize, &mut [T]),
{
    if width == 0 {
        return;
    }
    f(0, out);
}
