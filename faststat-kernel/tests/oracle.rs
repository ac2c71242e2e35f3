//! Every kernel on random arrays and axis subsets, compared group by group
//! against the reference implementation.

use approx::assert_relative_eq;
use faststat_kernel::{
    reference_reduce, reference_zscore, AxisInput, EngineConfig, Kernel, Quantiles,
    ReductionEngine, Strategy,
};
use faststat_view::NdArray;
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::StandardNormal;

fn random_array(rng: &mut StdRng, dims: &[usize], nan_rate: f64) -> NdArray<f64> {
    NdArray::from_fn_row_major(dims, |_| {
        if rng.gen::<f64>() < nan_rate {
            f64::NAN
        } else {
            rng.sample(StandardNormal)
        }
    })
}

fn random_dims(rng: &mut StdRng) -> Vec<usize> {
    let rank = rng.gen_range(1..=5);
    (0..rank).map(|_| rng.gen_range(1..=4)).collect()
}

fn random_axes(rng: &mut StdRng, rank: usize) -> Vec<usize> {
    loop {
        let axes: Vec<usize> = (0..rank).filter(|_| rng.gen_bool(0.5)).collect();
        if !axes.is_empty() {
            return axes;
        }
    }
}

fn next_index(idx: &mut [usize], dims: &[usize]) {
    for d in (0..dims.len()).rev() {
        idx[d] += 1;
        if idx[d] < dims[d] {
            return;
        }
        idx[d] = 0;
    }
}

/// Input positions of every group, in row-major order over the kept axes.
fn groups(dims: &[usize], axes: &[usize]) -> Vec<Vec<Vec<usize>>> {
    let keep: Vec<usize> = (0..dims.len()).filter(|a| !axes.contains(a)).collect();
    let keep_dims: Vec<usize> = keep.iter().map(|&a| dims[a]).collect();
    let red_dims: Vec<usize> = axes.iter().map(|&a| dims[a]).collect();
    let num_rows: usize = keep_dims.iter().product();
    let count: usize = red_dims.iter().product();

    let mut out = Vec::with_capacity(num_rows);
    let mut kidx = vec![0; keep.len()];
    for _ in 0..num_rows {
        let mut group = Vec::with_capacity(count);
        let mut ridx = vec![0; axes.len()];
        for _ in 0..count {
            let mut full = vec![0; dims.len()];
            for (&a, &i) in keep.iter().zip(&kidx) {
                full[a] = i;
            }
            for (&a, &i) in axes.iter().zip(&ridx) {
                full[a] = i;
            }
            group.push(full);
            next_index(&mut ridx, &red_dims);
        }
        out.push(group);
        next_index(&mut kidx, &keep_dims);
    }
    out
}

fn assert_close(got: f64, want: f64, what: &str) {
    if want.is_nan() {
        assert!(got.is_nan(), "{what}: expected NaN, got {got}");
    } else {
        assert_relative_eq!(got, want, epsilon = 1e-9, max_relative = 1e-9);
    }
}

fn engines() -> Vec<ReductionEngine> {
    vec![
        ReductionEngine::default(),
        ReductionEngine::new(EngineConfig::default().with_parallel_threshold(0)),
        ReductionEngine::new(
            EngineConfig::default()
                .with_strategy(Strategy::Strided)
                .with_parallel_threshold(0),
        ),
    ]
}

fn q_for(kernel: Kernel, rng: &mut StdRng) -> Option<f64> {
    kernel
        .param_family()
        .map(|f| f.bounds().1 * rng.gen::<f64>())
}

#[test]
fn test_reducing_kernels_match_reference() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    for trial in 0..40 {
        let dims = random_dims(&mut rng);
        let axes = random_axes(&mut rng, dims.len());
        let nan_rate = if trial % 3 == 0 { 0.0 } else { 0.15 };
        let a = random_array(&mut rng, &dims, nan_rate);
        let groups = groups(&dims, &axes);

        for kernel in Kernel::ALL.into_iter().filter(|k| !k.info().is_elementwise) {
            let q = q_for(kernel, &mut rng);
            for engine in engines() {
                let out = engine
                    .reduce(
                        &a.view(),
                        kernel,
                        AxisInput::from(axes.as_slice()),
                        false,
                        q.map(Quantiles::from),
                    )
                    .unwrap()
                    .into_array();
                let got = out.to_row_major_vec();
                assert_eq!(got.len(), groups.len());
                for (g, positions) in got.iter().zip(&groups) {
                    let values: Vec<f64> = positions.iter().map(|p| a.get(p)).collect();
                    let want = reference_reduce(&values, kernel, q).unwrap();
                    assert_close(*g, want, &format!("{kernel} dims={dims:?} axes={axes:?}"));
                }
            }
        }
    }
}

#[test]
fn test_vector_q_matches_reference() {
    let mut rng = StdRng::seed_from_u64(99);
    for _ in 0..15 {
        let dims = random_dims(&mut rng);
        let axes = random_axes(&mut rng, dims.len());
        let a = random_array(&mut rng, &dims, 0.1);
        let groups = groups(&dims, &axes);
        let qs = vec![0.0, 0.1, 0.5, 0.9, 1.0];

        for kernel in [Kernel::Quantile, Kernel::NanQuantile] {
            for engine in engines() {
                let out = engine
                    .reduce(
                        &a.view(),
                        kernel,
                        AxisInput::from(axes.as_slice()),
                        true,
                        Some(qs.clone().into()),
                    )
                    .unwrap()
                    .into_array();
                assert_eq!(out.dims()[0], qs.len());
                let flat = out.to_row_major_vec();
                for (qi, &q) in qs.iter().enumerate() {
                    for (row, positions) in groups.iter().enumerate() {
                        let values: Vec<f64> = positions.iter().map(|p| a.get(p)).collect();
                        let want = reference_reduce(&values, kernel, Some(q)).unwrap();
                        assert_close(flat[qi * groups.len() + row], want, "vector q");
                    }
                }
            }
        }
    }
}

#[test]
fn test_elementwise_kernels_match_reference() {
    let mut rng = StdRng::seed_from_u64(2024);
    for _ in 0..30 {
        let dims = random_dims(&mut rng);
        let axes = random_axes(&mut rng, dims.len());
        let a = random_array(&mut rng, &dims, 0.1);
        let groups = groups(&dims, &axes);

        for kernel in [Kernel::ZScore, Kernel::NanZScore] {
            for engine in engines() {
                let out = engine
                    .reduce(
                        &a.view(),
                        kernel,
                        AxisInput::from(axes.as_slice()),
                        false,
                        None,
                    )
                    .unwrap()
                    .into_array();
                assert_eq!(out.dims(), dims.as_slice());
                for positions in &groups {
                    let values: Vec<f64> = positions.iter().map(|p| a.get(p)).collect();
                    let want = reference_zscore(&values, kernel.info().nan_aware);
                    for (p, w) in positions.iter().zip(want) {
                        assert_close(out.get(p), w, "zscore");
                    }
                }
            }
        }
    }
}

#[test]
fn test_strided_inputs_match_dense() {
    let mut rng = StdRng::seed_from_u64(7);
    let dims = [3, 4, 5];
    let dense = random_array(&mut rng, &dims, 0.0);
    let col = NdArray::from_fn_col_major(&dims, |idx| dense.get(idx));
    let permuted_src =
        NdArray::from_fn_row_major(&[5, 3, 4], |idx| dense.get(&[idx[1], idx[2], idx[0]]));
    let permuted = permuted_src.view().permute(&[1, 2, 0]).unwrap();
    assert_eq!(permuted.dims(), &dims);

    // Last axis stored back to front: element (i, j, k) lives at 20i + 5j + 4 - k.
    let mut buf = vec![0.0; 60];
    for i in 0..3 {
        for j in 0..4 {
            for k in 0..5 {
                buf[20 * i + 5 * j + 4 - k] = dense.get(&[i, j, k]);
            }
        }
    }
    let reversed = NdArray::from_parts(buf, &dims, &[20, 5, -1], 4).unwrap();

    for engine in engines() {
        for kernel in [Kernel::Mean, Kernel::Median, Kernel::Std, Kernel::Ptp] {
            let want = engine
                .reduce(&dense.view(), kernel, [0isize, 2], false, None)
                .unwrap()
                .into_array()
                .to_row_major_vec();
            for view in [col.view(), permuted.clone(), reversed.view()] {
                let got = engine
                    .reduce(&view, kernel, [0isize, 2], false, None)
                    .unwrap()
                    .into_array()
                    .to_row_major_vec();
                for (g, w) in got.iter().zip(&want) {
                    assert_relative_eq!(*g, *w, epsilon = 1e-12, max_relative = 1e-12);
                }
            }
        }
    }
}
