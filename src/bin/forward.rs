use burn::backend::NdArray;
use burn::prelude::*;
use burn::tensor::Distribution;

use ppon_content::ContentNetConfig;

type BackendType = NdArray;

/// Builds the content network (optionally from a YAML config passed as the
/// first argument) and runs a single forward pass on random input.
fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => ContentNetConfig::from_yaml(&path)?,
        None => ContentNetConfig::default(),
    };
    log::info!(
        "building content network: nf={} nb={} upscale=x{}",
        config.num_features,
        config.num_blocks,
        config.upscale
    );

    let device = Default::default();
    let net = config.init::<BackendType>(&device)?;
    log::info!("model built: {} parameters", net.num_params());

    let input = Tensor::<BackendType, 4>::random(
        [1, config.in_channels, 32, 32],
        Distribution::Uniform(0.0, 1.0),
        &device,
    );
    let output = net.forward(input);
    log::info!("input [1, {}, 32, 32] -> output {:?}", config.in_channels, output.dims());

    Ok(())
}
