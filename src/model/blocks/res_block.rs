use burn::nn::conv::Conv2d;
use burn::nn::{Initializer, LeakyRelu, LeakyReluConfig};
use burn::prelude::*;

use super::conv::conv_layer;

/// Fixed multiplier applied to every residual transform before it is added
/// back onto the block input. Keeps deep stacks close to identity early in
/// training; not a learned parameter.
pub(crate) const RESIDUAL_SCALE: f32 = 0.2;

/// Residual block with eight parallel dilated 3x3 branches (rates 1..8).
///
/// The branch outputs are combined as a running left-to-right accumulation and
/// concatenated, fused back to `nc` channels by a 1x1 convolution, scaled and
/// added onto the input.
#[derive(Module, Debug)]
pub struct DilatedResBlock<B: Backend> {
    entry: Conv2d<B>,
    branches: Vec<Conv2d<B>>,
    fuse: Conv2d<B>,
    act: LeakyRelu,
}

impl<B: Backend> DilatedResBlock<B> {
    /// `nc` must be even: each branch emits `nc / 2` channels.
    pub fn new(device: &B::Device, nc: usize, initializer: &Initializer) -> Self {
        let entry = conv_layer(device, nc, nc, 3, 1, 1, 1, initializer);
        let branches = (1..=8)
            .map(|rate| conv_layer(device, nc, nc / 2, 3, 1, rate, 1, initializer))
            .collect();
        // 8 parts of nc/2 channels each: 4*nc back down to nc
        let fuse = conv_layer(device, nc * 4, nc, 1, 1, 1, 1, initializer);
        let act = LeakyReluConfig::new().with_negative_slope(0.2).init();

        Self {
            entry,
            branches,
            fuse,
            act,
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let features = self.act.forward(self.entry.forward(x.clone()));
        let branches: Vec<Tensor<B, 4>> = self
            .branches
            .iter()
            .map(|conv| conv.forward(features.clone()))
            .collect();
        let combined = cascade_concat(&branches);
        let fused = self.fuse.forward(self.act.forward(combined));
        x + fused * RESIDUAL_SCALE
    }
}

/// Concatenates the first branch followed by the running partial sums of all
/// branches: `[b1, b1+b2, b1+b2+b3, ...]` on the channel axis.
///
/// The sums are evaluated strictly left to right. Floating-point addition is
/// not associative, so a tree-shaped reduction would drift from this result;
/// the sequential order is part of the contract.
pub(crate) fn cascade_concat<B: Backend>(branches: &[Tensor<B, 4>]) -> Tensor<B, 4> {
    let mut parts: Vec<Tensor<B, 4>> = Vec::with_capacity(branches.len());
    let mut running: Option<Tensor<B, 4>> = None;
    for branch in branches {
        let part = match running.take() {
            None => branch.clone(),
            Some(sum) => sum + branch.clone(),
        };
        parts.push(part.clone());
        running = Some(part);
    }
    Tensor::cat(parts, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn scalar_tensor(value: f32, device: &<B as Backend>::Device) -> Tensor<B, 4> {
        Tensor::<B, 1>::from_floats([value], device).reshape([1, 1, 1, 1])
    }

    #[test]
    fn test_cascade_concat_channel_width() {
        let device = Default::default();
        // nc = 64: eight branches of 32 channels concatenate to 256
        let branches: Vec<Tensor<B, 4>> = (0..8)
            .map(|_| Tensor::zeros([1, 32, 4, 4], &device))
            .collect();
        assert_eq!(cascade_concat(&branches).dims(), [1, 256, 4, 4]);
    }

    #[test]
    fn test_cascade_concat_running_sums() {
        let device = Default::default();
        let values = [1.0f32, 2.0, 4.0, 8.0, 16.0, 32.0, 64.0, 128.0];
        let branches: Vec<Tensor<B, 4>> = values
            .iter()
            .map(|v| scalar_tensor(*v, &device))
            .collect();
        let out = cascade_concat(&branches).reshape([8]).into_data();
        let expected = TensorData::from([1.0f32, 3.0, 7.0, 15.0, 31.0, 63.0, 127.0, 255.0]);
        out.assert_approx_eq(&expected, 5);
    }

    #[test]
    fn test_cascade_concat_is_left_to_right() {
        let device = Default::default();
        // chosen so that left-to-right f32 summation differs from a pairwise
        // tree reduction: the 1.0 following 1e8 is absorbed, the 1.0 after
        // the cancellation survives
        let values = [1.0e8f32, 1.0, -1.0e8, 1.0, 0.0, 0.0, 0.0, 0.0];
        let branches: Vec<Tensor<B, 4>> = values
            .iter()
            .map(|v| scalar_tensor(*v, &device))
            .collect();
        let out = cascade_concat(&branches)
            .reshape([8])
            .into_data()
            .to_vec::<f32>()
            .unwrap();

        let mut acc = values[0];
        let mut expected = vec![acc];
        for v in &values[1..] {
            acc += v;
            expected.push(acc);
        }
        // bitwise equality: the implementation must perform the same f32
        // additions in the same order
        assert_eq!(out, expected);

        let tree = ((values[0] + values[1]) + (values[2] + values[3]))
            + ((values[4] + values[5]) + (values[6] + values[7]));
        assert_ne!(
            tree, *expected.last().unwrap(),
            "test values must distinguish tree reduction from sequential summation"
        );
    }

    #[test]
    fn test_block_preserves_shape() {
        let device = Default::default();
        let block = DilatedResBlock::<B>::new(&device, 8, &Initializer::Zeros);
        let x = Tensor::<B, 4>::zeros([2, 8, 9, 7], &device);
        assert_eq!(block.forward(x).dims(), [2, 8, 9, 7]);
    }

    #[test]
    fn test_zero_weights_reduce_to_identity() {
        let device = Default::default();
        let block = DilatedResBlock::<B>::new(&device, 4, &Initializer::Zeros);
        let x = Tensor::<B, 4>::random(
            [1, 4, 6, 6],
            burn::tensor::Distribution::Uniform(-1.0, 1.0),
            &device,
        );
        let y = block.forward(x.clone());
        assert_eq!(y.into_data(), x.into_data());
    }
}
