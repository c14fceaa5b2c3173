use std::str::FromStr;

use burn::nn::{LeakyRelu, LeakyReluConfig, PRelu, PReluConfig, Relu};
use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Supported activation kinds. Unknown kind strings are rejected when parsed,
/// before any layer is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActKind {
    Relu,
    #[serde(rename = "lrelu")]
    LeakyRelu,
    #[serde(rename = "prelu")]
    PRelu,
}

impl FromStr for ActKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relu" => Ok(ActKind::Relu),
            "lrelu" => Ok(ActKind::LeakyRelu),
            "prelu" => Ok(ActKind::PRelu),
            other => Err(ModelError::UnsupportedActivation(other.to_string())),
        }
    }
}

#[derive(Module, Debug)]
pub enum Activation<B: Backend> {
    Relu(Relu),
    LeakyRelu(LeakyRelu),
    PRelu(PRelu<B>),
}

impl<B: Backend> Activation<B> {
    /// Activation with the default 0.2 negative slope and a single PReLU parameter.
    pub fn new(device: &B::Device, kind: ActKind) -> Self {
        Self::with_options(device, kind, 0.2, 1)
    }

    pub fn with_options(
        device: &B::Device,
        kind: ActKind,
        negative_slope: f64,
        num_parameters: usize,
    ) -> Self {
        match kind {
            ActKind::Relu => Activation::Relu(Relu::new()),
            ActKind::LeakyRelu => Activation::LeakyRelu(
                LeakyReluConfig::new()
                    .with_negative_slope(negative_slope)
                    .init(),
            ),
            ActKind::PRelu => Activation::PRelu(
                PReluConfig::new()
                    .with_num_parameters(num_parameters)
                    .with_alpha(negative_slope)
                    .init(device),
            ),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        match self {
            Activation::Relu(act) => act.forward(x),
            Activation::LeakyRelu(act) => act.forward(x),
            Activation::PRelu(act) => act.forward(x),
        }
    }
}
