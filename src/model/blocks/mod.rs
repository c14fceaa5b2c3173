pub mod activation;
pub mod conv;
pub mod norm;
pub mod padding;
pub mod res_block;
pub mod rr_block;
pub mod sequential;
pub mod upsample;

pub use activation::{ActKind, Activation};
pub use conv::{conv_block, conv_layer, valid_padding};
pub use norm::{norm_layer, Norm, NormKind};
pub use padding::{pad_layer, Pad, PadKind};
pub use res_block::DilatedResBlock;
pub use rr_block::ResInResBlock;
pub use sequential::{flatten, Layer, Sequential, ShortcutBlock};
pub use upsample::{upconv_block, Upsample2d};
