use burn::module::Param;
use burn::nn::{Linear, LinearConfig};
use burn::prelude::*;
use burn::tensor::TensorData;
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::StandardNormal;

/// Dense layer whose kernel is orthogonally initialized. Burn's default
/// bias initialization is kept.
pub(crate) fn orthogonal_linear<B: Backend>(
    d_input: usize,
    d_output: usize,
    rng: &mut StdRng,
    device: &B::Device,
) -> Linear<B> {
    let mut linear = LinearConfig::new(d_input, d_output).init(device);
    let weight = orthogonal_weight(d_input, d_output, rng);
    linear.weight = Param::from_tensor(
        Tensor::<B, 1>::from_data(TensorData::from(weight.as_slice()), device)
            .reshape([d_input as i32, d_output as i32]),
    );
    linear
}

/// Row-major `[d_input, d_output]` kernel with orthonormal columns when
/// `d_input >= d_output`, orthonormal rows otherwise.
pub(crate) fn orthogonal_weight(d_input: usize, d_output: usize, rng: &mut StdRng) -> Vec<f32> {
    let count = d_input.min(d_output);
    let len = d_input.max(d_output);
    let basis = orthonormal_set(count, len, rng);

    let mut weight = vec![0.0f32; d_input * d_output];
    if d_input >= d_output {
        // basis vectors become the kernel's columns
        for (col, v) in basis.iter().enumerate() {
            for (row, &x) in v.iter().enumerate() {
                weight[row * d_output + col] = x;
            }
        }
    } else {
        for (row, v) in basis.iter().enumerate() {
            weight[row * d_output..(row + 1) * d_output].copy_from_slice(v);
        }
    }
    weight
}

/// `count` orthonormal vectors of length `len`, built by modified
/// Gram-Schmidt over standard-normal draws. A draw that collapses under
/// projection (norm below tolerance) is resampled.
fn orthonormal_set(count: usize, len: usize, rng: &mut StdRng) -> Vec<Vec<f32>> {
    let mut basis: Vec<Vec<f32>> = Vec::with_capacity(count);
    while basis.len() < count {
        let mut v: Vec<f32> = (0..len).map(|_| rng.sample(StandardNormal)).collect();
        for b in &basis {
            let dot: f32 = v.iter().zip(b).map(|(x, y)| x * y).sum();
            for (x, y) in v.iter_mut().zip(b) {
                *x -= dot * y;
            }
        }
        let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-4 {
            continue;
        }
        for x in v.iter_mut() {
            *x /= norm;
        }
        basis.push(v);
    }
    basis
}
