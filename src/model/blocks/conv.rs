use burn::nn::conv::{Conv2d, Conv2dConfig};
use burn::nn::{Initializer, PaddingConfig2d};
use burn::prelude::*;

use super::activation::{ActKind, Activation};
use super::norm::{norm_layer, NormKind};
use super::padding::{pad_layer, PadKind};
use super::sequential::{flatten, Layer, Sequential};

/// Padding that keeps stride-1 convolutions spatially size-preserving for any
/// dilation rate: `((kernel - 1) / 2) * dilation`.
pub fn valid_padding(kernel_size: usize, dilation: usize) -> usize {
    (kernel_size - 1) / 2 * dilation
}

/// Plain convolution with size-preserving zero padding.
#[allow(clippy::too_many_arguments)]
pub fn conv_layer<B: Backend>(
    device: &B::Device,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    dilation: usize,
    groups: usize,
    initializer: &Initializer,
) -> Conv2d<B> {
    let padding = valid_padding(kernel_size, dilation);
    Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(padding, padding))
        .with_dilation([dilation, dilation])
        .with_groups(groups)
        .with_initializer(initializer.clone())
        .init(device)
}

/// `[pad?] -> conv -> [norm?] -> [act?]`, flattened into one sequence.
///
/// With `PadKind::Zero` the padding is folded into the convolution itself;
/// otherwise an explicit reflect/replicate layer runs first and the
/// convolution pads nothing.
#[allow(clippy::too_many_arguments)]
pub fn conv_block<B: Backend>(
    device: &B::Device,
    in_channels: usize,
    out_channels: usize,
    kernel_size: usize,
    stride: usize,
    dilation: usize,
    groups: usize,
    pad_kind: PadKind,
    norm_kind: NormKind,
    act_kind: Option<ActKind>,
    initializer: &Initializer,
) -> Sequential<B> {
    let padding = valid_padding(kernel_size, dilation);
    let pad = pad_layer(pad_kind, padding);
    let conv_padding = if pad.is_some() { 0 } else { padding };

    let conv = Conv2dConfig::new([in_channels, out_channels], [kernel_size, kernel_size])
        .with_stride([stride, stride])
        .with_padding(PaddingConfig2d::Explicit(conv_padding, conv_padding))
        .with_dilation([dilation, dilation])
        .with_groups(groups)
        .with_initializer(initializer.clone())
        .init(device);
    let norm = norm_layer::<B>(device, norm_kind, out_channels);
    let act = act_kind.map(|kind| Activation::new(device, kind));

    flatten(vec![
        pad.map(|p| Sequential::single(Layer::Pad(p))),
        Some(Sequential::single(Layer::Conv(conv))),
        norm.map(|n| Sequential::single(Layer::Norm(n))),
        act.map(|a| Sequential::single(Layer::Act(a))),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_valid_padding() {
        assert_eq!(valid_padding(3, 1), 1);
        assert_eq!(valid_padding(3, 4), 4);
        assert_eq!(valid_padding(3, 8), 8);
        assert_eq!(valid_padding(1, 1), 0);
    }

    #[test]
    fn test_dilated_conv_preserves_spatial_size() {
        let device = Default::default();
        for dilation in 1..=8 {
            let conv = conv_layer::<B>(&device, 4, 2, 3, 1, dilation, 1, &Initializer::Zeros);
            let x = Tensor::<B, 4>::zeros([1, 4, 9, 7], &device);
            let y = conv.forward(x);
            assert_eq!(y.dims(), [1, 2, 9, 7], "dilation {dilation} changed spatial size");
        }
    }

    #[test]
    fn test_conv_block_layer_counts() {
        let device = Default::default();
        let init = Initializer::Zeros;

        // zero padding is folded into the conv: conv + act
        let block = conv_block::<B>(
            &device, 4, 4, 3, 1, 1, 1,
            PadKind::Zero, NormKind::None, Some(ActKind::Relu), &init,
        );
        assert_eq!(block.len(), 2);

        // explicit reflect pad adds a layer
        let block = conv_block::<B>(
            &device, 4, 4, 3, 1, 1, 1,
            PadKind::Reflect, NormKind::None, Some(ActKind::Relu), &init,
        );
        assert_eq!(block.len(), 3);

        // norm slots in between conv and act
        let block = conv_block::<B>(
            &device, 4, 4, 3, 1, 1, 1,
            PadKind::Zero, NormKind::Batch, Some(ActKind::Relu), &init,
        );
        assert_eq!(block.len(), 3);

        // bare convolution
        let block = conv_block::<B>(
            &device, 4, 4, 3, 1, 1, 1,
            PadKind::Zero, NormKind::None, None, &init,
        );
        assert_eq!(block.len(), 1);
    }

    #[test]
    fn test_conv_block_reflect_pad_preserves_size() {
        let device = Default::default();
        let block = conv_block::<B>(
            &device, 3, 5, 3, 1, 1, 1,
            PadKind::Reflect, NormKind::None, Some(ActKind::Relu), &Initializer::Zeros,
        );
        let x = Tensor::<B, 4>::zeros([2, 3, 8, 6], &device);
        assert_eq!(block.forward(x).dims(), [2, 5, 8, 6]);
    }
}
