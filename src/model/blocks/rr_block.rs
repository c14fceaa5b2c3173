use burn::nn::Initializer;
use burn::prelude::*;

use super::res_block::{DilatedResBlock, RESIDUAL_SCALE};

/// Residual-in-residual block: three chained dilated residual blocks with a
/// scaled outer shortcut around the whole chain.
#[derive(Module, Debug)]
pub struct ResInResBlock<B: Backend> {
    rb1: DilatedResBlock<B>,
    rb2: DilatedResBlock<B>,
    rb3: DilatedResBlock<B>,
}

impl<B: Backend> ResInResBlock<B> {
    pub fn new(device: &B::Device, nc: usize, initializer: &Initializer) -> Self {
        Self {
            rb1: DilatedResBlock::new(device, nc, initializer),
            rb2: DilatedResBlock::new(device, nc, initializer),
            rb3: DilatedResBlock::new(device, nc, initializer),
        }
    }

    pub fn forward(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let out = self.rb1.forward(x.clone());
        let out = self.rb2.forward(out);
        let out = self.rb3.forward(out);
        out * RESIDUAL_SCALE + x
    }
}
