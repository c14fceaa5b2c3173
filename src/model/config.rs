use burn::nn::Initializer;
use serde::{Deserialize, Serialize};

use super::blocks::{ActKind, NormKind, PadKind};

/// Hyperparameters of the content network.
///
/// Defaults follow the reference architecture: RGB in and out, 64 feature
/// channels, 24 residual-in-residual blocks, 4x upscale, leaky-relu
/// activations, zero padding, no normalization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentNetConfig {
    pub in_channels: usize,
    /// Base feature width; must be even (dilated branches emit half of it).
    pub num_features: usize,
    /// Number of residual-in-residual blocks in the trunk.
    pub num_blocks: usize,
    pub out_channels: usize,
    /// Spatial scale factor: a power of two, or 3.
    pub upscale: usize,
    pub activation: ActKind,
    pub padding: PadKind,
    pub normalization: NormKind,
    /// Weight initializer threaded into every convolution.
    pub initializer: Initializer,
}

impl Default for ContentNetConfig {
    fn default() -> Self {
        Self {
            in_channels: 3,
            num_features: 64,
            num_blocks: 24,
            out_channels: 3,
            upscale: 4,
            activation: ActKind::LeakyRelu,
            padding: PadKind::Zero,
            normalization: NormKind::None,
            initializer: Initializer::KaimingUniform {
                gain: 1.0 / 3.0_f64.sqrt(),
                fan_out_only: false,
            },
        }
    }
}

impl ContentNetConfig {
    pub fn from_yaml(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let content = std::fs::read_to_string(path)?;
        let config: ContentNetConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContentNetConfig::default();
        assert_eq!(config.in_channels, 3);
        assert_eq!(config.num_features, 64);
        assert_eq!(config.num_blocks, 24);
        assert_eq!(config.upscale, 4);
        assert_eq!(config.activation, ActKind::LeakyRelu);
        assert_eq!(config.padding, PadKind::Zero);
        assert_eq!(config.normalization, NormKind::None);
    }

    #[test]
    fn test_yaml_round_trip() {
        let config = ContentNetConfig {
            upscale: 3,
            activation: ActKind::PRelu,
            ..Default::default()
        };
        let yaml = serde_yaml::to_string(&config).unwrap();
        let back: ContentNetConfig = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back.upscale, 3);
        assert_eq!(back.activation, ActKind::PRelu);
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let yaml = "
in_channels: 3
num_features: 64
num_blocks: 24
out_channels: 3
upscale: 4
activation: swish
padding: zero
normalization: none
initializer: Zeros
";
        assert!(serde_yaml::from_str::<ContentNetConfig>(yaml).is_err());
    }
}
