use std::str::FromStr;

use burn::nn::{BatchNorm, BatchNormConfig, InstanceNorm, InstanceNormConfig};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Optional normalization in generic conv blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NormKind {
    None,
    Batch,
    Instance,
}

impl FromStr for NormKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(NormKind::None),
            "batch" => Ok(NormKind::Batch),
            "instance" => Ok(NormKind::Instance),
            other => Err(ModelError::UnsupportedNorm(other.to_string())),
        }
    }
}

#[derive(Module, Debug)]
pub enum Norm<B: Backend> {
    Batch(BatchNorm<B, 2>),
    Instance(InstanceNorm<B>),
}

pub fn norm_layer<B: Backend>(
    device: &B::Device,
    kind: NormKind,
    channels: usize,
) -> Option<Norm<B>> {
    match kind {
        NormKind::None => None,
        NormKind::Batch => Some(Norm::Batch(BatchNormConfig::new(channels).init(device))),
        NormKind::Instance => Some(Norm::Instance(
            InstanceNormConfig::new(channels).init(device),
        )),
    }
}

impl<B: Backend> Norm<B> {
    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Norm::Batch(norm) => norm.forward(x),
            Norm::Instance(norm) => norm.forward(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    #[test]
    fn test_kind_parsing() {
        assert_eq!("none".parse::<NormKind>().unwrap(), NormKind::None);
        assert_eq!("batch".parse::<NormKind>().unwrap(), NormKind::Batch);
        assert_eq!("Instance".parse::<NormKind>().unwrap(), NormKind::Instance);
        assert!(matches!(
            "group".parse::<NormKind>(),
            Err(ModelError::UnsupportedNorm(_))
        ));
    }

    #[test]
    fn test_none_yields_no_layer() {
        let device = Default::default();
        assert!(norm_layer::<B>(&device, NormKind::None, 8).is_none());
    }

    #[test]
    fn test_forward_shapes() {
        let device = Default::default();
        let x = Tensor::<B, 4>::zeros([2, 8, 4, 4], &device);
        for kind in [NormKind::Batch, NormKind::Instance] {
            let norm = norm_layer::<B>(&device, kind, 8).unwrap();
            assert_eq!(norm.forward(x.clone()).dims(), [2, 8, 4, 4]);
        }
    }
}
