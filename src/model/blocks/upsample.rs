use burn::nn::Initializer;
use burn::prelude::*;

use super::activation::{ActKind, Activation};
use super::conv::conv_layer;
use super::sequential::{flatten, Layer, Sequential};

/// Nearest-neighbor spatial upsample, `[B, C, H, W] -> [B, C, H*s, W*s]`.
///
/// Implemented as reshape + repeat: each pixel is expanded into an s*s tile,
/// which avoids the checkerboard artifacts of learned transposed convolutions.
#[derive(Module, Debug, Clone)]
pub struct Upsample2d {
    scale_factor: usize,
}

impl Upsample2d {
    pub fn new(scale_factor: usize) -> Self {
        Self { scale_factor }
    }

    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let [batch, channels, height, width] = x.dims();

        // [B, C, H, W] -> [B, C, H, 1, W, 1] -> [B, C, H, s, W, s]
        let x = x.reshape([batch, channels, height, 1, width, 1]);
        let x = x.repeat_dim(3, self.scale_factor);
        let x = x.repeat_dim(5, self.scale_factor);

        x.reshape([
            batch,
            channels,
            height * self.scale_factor,
            width * self.scale_factor,
        ])
    }
}

/// One reconstruction stage: upsample, then a 3x3 convolution to refine the
/// replicated signal, then an activation.
pub fn upconv_block<B: Backend>(
    device: &B::Device,
    in_channels: usize,
    out_channels: usize,
    upscale_factor: usize,
    act_kind: ActKind,
    initializer: &Initializer,
) -> Sequential<B> {
    flatten(vec![
        Some(Sequential::single(Layer::Upsample(Upsample2d::new(
            upscale_factor,
        )))),
        Some(Sequential::single(conv_layer(
            device,
            in_channels,
            out_channels,
            3,
            1,
            1,
            1,
            initializer,
        ))),
        Some(Sequential::single(Activation::new(device, act_kind))),
    ])
}
