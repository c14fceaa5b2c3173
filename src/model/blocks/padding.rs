use std::str::FromStr;

use burn::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Spatial padding strategy for generic conv blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PadKind {
    Zero,
    Reflect,
    Replicate,
}

impl FromStr for PadKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "zero" => Ok(PadKind::Zero),
            "reflect" => Ok(PadKind::Reflect),
            "replicate" => Ok(PadKind::Replicate),
            other => Err(ModelError::UnsupportedPadding(other.to_string())),
        }
    }
}

/// Explicit spatial padding layer. Burn has no built-in reflect/replicate
/// padding, so both are assembled from plane slices and `cat`.
#[derive(Module, Debug, Clone)]
pub struct Pad {
    amount: usize,
    replicate: bool,
}

impl Pad {
    /// Mirror padding without repeating the edge plane.
    pub fn reflect(amount: usize) -> Self {
        Self {
            amount,
            replicate: false,
        }
    }

    /// Edge-repeat padding.
    pub fn replicate(amount: usize) -> Self {
        Self {
            amount,
            replicate: true,
        }
    }

    pub fn forward<B: Backend>(&self, x: Tensor<B, 4>) -> Tensor<B, 4> {
        let x = pad_axis(x, 2, self.amount, self.replicate);
        pad_axis(x, 3, self.amount, self.replicate)
    }
}

/// `None` when no explicit layer is needed: zero amount, or zero padding
/// (which the convolution handles itself).
pub fn pad_layer(kind: PadKind, amount: usize) -> Option<Pad> {
    if amount == 0 {
        return None;
    }
    match kind {
        PadKind::Zero => None,
        PadKind::Reflect => Some(Pad::reflect(amount)),
        PadKind::Replicate => Some(Pad::replicate(amount)),
    }
}

/// Single row (axis 2) or column (axis 3) of `x`, kept 4-dimensional.
fn take_plane<B: Backend>(x: &Tensor<B, 4>, axis: usize, index: usize) -> Tensor<B, 4> {
    let [b, c, h, w] = x.dims();
    match axis {
        2 => x.clone().slice([0..b, 0..c, index..index + 1, 0..w]),
        _ => x.clone().slice([0..b, 0..c, 0..h, index..index + 1]),
    }
}

fn pad_axis<B: Backend>(x: Tensor<B, 4>, axis: usize, amount: usize, replicate: bool) -> Tensor<B, 4> {
    let n = x.dims()[axis];
    let mut parts = Vec::with_capacity(2 * amount + 1);
    for i in 0..amount {
        let src = if replicate { 0 } else { amount - i };
        parts.push(take_plane(&x, axis, src));
    }
    parts.push(x.clone());
    for i in 0..amount {
        let src = if replicate { n - 1 } else { n - 2 - i };
        parts.push(take_plane(&x, axis, src));
    }
    Tensor::cat(parts, axis)
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn::backend::NdArray;

    type B = NdArray;

    fn ramp_3x3(device: &<B as Backend>::Device) -> Tensor<B, 4> {
        Tensor::<B, 1>::from_floats(
            [0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0],
            device,
        )
        .reshape([1, 1, 3, 3])
    }

    #[test]
    fn test_kind_parsing() {
        assert_eq!("zero".parse::<PadKind>().unwrap(), PadKind::Zero);
        assert_eq!("Reflect".parse::<PadKind>().unwrap(), PadKind::Reflect);
        assert!(matches!(
            "circular".parse::<PadKind>(),
            Err(ModelError::UnsupportedPadding(_))
        ));
    }

    #[test]
    fn test_zero_amount_yields_no_layer() {
        assert!(pad_layer(PadKind::Reflect, 0).is_none());
        assert!(pad_layer(PadKind::Zero, 1).is_none());
        assert!(pad_layer(PadKind::Replicate, 2).is_some());
    }

    #[test]
    fn test_reflect_values() {
        let device = Default::default();
        let y = Pad::reflect(1).forward(ramp_3x3(&device));
        assert_eq!(y.dims(), [1, 1, 5, 5]);
        let v = y.into_data().to_vec::<f32>().unwrap();
        // row order: [r1, r0, r1, r2, r1]; columns mirror the same way
        let expected = [
            4.0, 3.0, 4.0, 5.0, 4.0,
            1.0, 0.0, 1.0, 2.0, 1.0,
            4.0, 3.0, 4.0, 5.0, 4.0,
            7.0, 6.0, 7.0, 8.0, 7.0,
            4.0, 3.0, 4.0, 5.0, 4.0,
        ];
        assert_eq!(v, expected);
    }

    #[test]
    fn test_replicate_values() {
        let device = Default::default();
        let y = Pad::replicate(1).forward(ramp_3x3(&device));
        assert_eq!(y.dims(), [1, 1, 5, 5]);
        let v = y.into_data().to_vec::<f32>().unwrap();
        let expected = [
            0.0, 0.0, 1.0, 2.0, 2.0,
            0.0, 0.0, 1.0, 2.0, 2.0,
            3.0, 3.0, 4.0, 5.0, 5.0,
            6.0, 6.0, 7.0, 8.0, 8.0,
            6.0, 6.0, 7.0, 8.0, 8.0,
        ];
        assert_eq!(v, expected);
    }

    #[test]
    fn test_wider_amount() {
        let device = Default::default();
        let y = Pad::replicate(2).forward(ramp_3x3(&device));
        assert_eq!(y.dims(), [1, 1, 7, 7]);
    }
}
