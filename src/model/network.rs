use burn::prelude::*;

use super::blocks::{
    conv_block, conv_layer, flatten, upconv_block, NormKind, ResInResBlock, Sequential,
    ShortcutBlock,
};
use super::config::ContentNetConfig;
use crate::error::{ModelError, Result};

/// Number of upsampling stages and the scale of each, for a given overall
/// upscale factor.
///
/// Powers of two stack log2(upscale) stages of x2; the special case 3 uses a
/// single x3 stage. Everything else is rejected at construction instead of
/// letting a logarithm produce a bogus stage count.
pub(crate) fn upscale_stages(upscale: usize) -> Result<(usize, usize)> {
    match upscale {
        3 => Ok((1, 3)),
        u if u >= 2 && u.is_power_of_two() => Ok((u.trailing_zeros() as usize, 2)),
        _ => Err(ModelError::UnsupportedUpscale(upscale)),
    }
}

/// Content-reconstruction network: a resolution-preserving feature extractor
/// followed by an upsampling reconstruction head.
///
/// Stateless at evaluation time; `forward` maps `[B, in_ch, H, W]` to
/// `[B, out_ch, H*upscale, W*upscale]`.
#[derive(Module, Debug)]
pub struct ContentNet<B: Backend> {
    features: Sequential<B>,
    recon: Sequential<B>,
}

impl<B: Backend> ContentNet<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        self.recon.forward(self.features.forward(x))
    }

    #[cfg(test)]
    pub(crate) fn recon_len(&self) -> usize {
        self.recon.len()
    }
}

impl ContentNetConfig {
    pub fn init<B: Backend>(&self, device: &B::Device) -> Result<ContentNet<B>> {
        self.validate()?;
        let (n_stages, stage_scale) = upscale_stages(self.upscale)?;
        let nf = self.num_features;
        let init = &self.initializer;

        // trunk: nb residual-in-residual blocks plus a closing 3x3 conv,
        // wrapped in an identity shortcut
        let mut trunk: Vec<Option<Sequential<B>>> = (0..self.num_blocks)
            .map(|_| Some(Sequential::single(ResInResBlock::new(device, nf, init))))
            .collect();
        trunk.push(Some(Sequential::single(conv_layer(
            device, nf, nf, 3, 1, 1, 1, init,
        ))));

        let features = flatten(vec![
            Some(Sequential::single(conv_layer(
                device,
                self.in_channels,
                nf,
                3,
                1,
                1,
                1,
                init,
            ))),
            Some(Sequential::single(ShortcutBlock::new(flatten(trunk)))),
        ]);

        let mut recon: Vec<Option<Sequential<B>>> = (0..n_stages)
            .map(|_| {
                Some(upconv_block(
                    device,
                    nf,
                    nf,
                    stage_scale,
                    self.activation,
                    init,
                ))
            })
            .collect();
        recon.push(Some(conv_block(
            device,
            nf,
            nf,
            3,
            1,
            1,
            1,
            self.padding,
            self.normalization,
            Some(self.activation),
            init,
        )));
        // output head: no normalization, no activation
        recon.push(Some(conv_block(
            device,
            nf,
            self.out_channels,
            3,
            1,
            1,
            1,
            self.padding,
            NormKind::None,
            None,
            init,
        )));

        Ok(ContentNet {
            features,
            recon: flatten(recon),
        })
    }

    fn validate(&self) -> Result<()> {
        if self.in_channels == 0 || self.out_channels == 0 {
            return Err(ModelError::InvalidConfiguration(
                "channel counts must be positive".to_string(),
            ));
        }
        if self.num_features == 0 || self.num_features % 2 != 0 {
            return Err(ModelError::InvalidConfiguration(format!(
                "num_features must be positive and even, got {}",
                self.num_features
            )));
        }
        if self.num_blocks == 0 {
            return Err(ModelError::InvalidConfiguration(
                "num_blocks must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::blocks::ActKind;
    use burn::backend::NdArray;
    use burn::nn::Initializer;

    type B = NdArray;

    fn small_config(upscale: usize) -> ContentNetConfig {
        ContentNetConfig {
            num_features: 4,
            num_blocks: 1,
            upscale,
            initializer: Initializer::Zeros,
            ..Default::default()
        }
    }

    #[test]
    fn test_upscale_stage_table() {
        assert_eq!(upscale_stages(2).unwrap(), (1, 2));
        assert_eq!(upscale_stages(4).unwrap(), (2, 2));
        assert_eq!(upscale_stages(8).unwrap(), (3, 2));
        assert_eq!(upscale_stages(3).unwrap(), (1, 3));
        for bad in [0, 1, 5, 6, 7, 12] {
            assert!(matches!(
                upscale_stages(bad),
                Err(ModelError::UnsupportedUpscale(_))
            ));
        }
    }

    #[test]
    fn test_unsupported_upscale_fails_at_construction() {
        let device = Default::default();
        assert!(matches!(
            small_config(5).init::<B>(&device),
            Err(ModelError::UnsupportedUpscale(5))
        ));
    }

    #[test]
    fn test_invalid_hyperparameters_rejected() {
        let device = Default::default();
        let mut config = small_config(2);
        config.num_features = 5;
        assert!(matches!(
            config.init::<B>(&device),
            Err(ModelError::InvalidConfiguration(_))
        ));
        let mut config = small_config(2);
        config.num_blocks = 0;
        assert!(config.init::<B>(&device).is_err());
    }

    #[test]
    fn test_zero_input_zero_weights_gives_zero_output() {
        let device = Default::default();
        let net = small_config(2).init::<B>(&device).unwrap();
        let x = Tensor::<B, 4>::zeros([1, 3, 8, 8], &device);
        let y = net.forward(x);
        assert_eq!(y.dims(), [1, 3, 16, 16]);
        let max_abs: f32 = y.abs().max().into_scalar();
        assert_eq!(max_abs, 0.0);
    }

    #[test]
    fn test_output_shape_law() {
        let device = Default::default();
        for (upscale, h, w) in [(2, 8, 8), (3, 5, 7), (4, 6, 4)] {
            let net = small_config(upscale).init::<B>(&device).unwrap();
            let x = Tensor::<B, 4>::zeros([1, 3, h, w], &device);
            let y = net.forward(x);
            assert_eq!(y.dims(), [1, 3, h * upscale, w * upscale]);
        }
    }

    #[test]
    fn test_stage_counts_in_reconstruction_head() {
        let device = Default::default();
        // each upsampling stage contributes 3 layers; the two head conv
        // blocks contribute 2 (conv + act) and 1 (conv)
        let net = small_config(4).init::<B>(&device).unwrap();
        assert_eq!(net.recon_len(), 2 * 3 + 3);
        let net = small_config(3).init::<B>(&device).unwrap();
        assert_eq!(net.recon_len(), 3 + 3);
        let net = small_config(8).init::<B>(&device).unwrap();
        assert_eq!(net.recon_len(), 3 * 3 + 3);
    }

    #[test]
    fn test_activation_kinds_build() {
        let device = Default::default();
        for act in [ActKind::Relu, ActKind::LeakyRelu, ActKind::PRelu] {
            let config = ContentNetConfig {
                activation: act,
                ..small_config(2)
            };
            let net = config.init::<B>(&device).unwrap();
            let x = Tensor::<B, 4>::zeros([1, 3, 4, 4], &device);
            assert_eq!(net.forward(x).dims(), [1, 3, 8, 8]);
        }
    }
}
