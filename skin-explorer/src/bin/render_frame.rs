use std::path::Path;

use skin_explorer::{
    config::ViewerConfig, rig::DemoScene, state::save_png, v::VRenderer, RenderError,
};
use skinning::shader::ShaderConstants;

const CONFIG_PATH: &str = "conf.ini";

pub fn main() {
    env_logger::init();

    if let Err(e) = pollster::block_on(run()) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), RenderError> {
    let config = if Path::new(CONFIG_PATH).exists() {
        ViewerConfig::load(CONFIG_PATH)?
    } else {
        log::warn!("{CONFIG_PATH} not found, using defaults");
        ViewerConfig::default()
    };

    let constants = ShaderConstants {
        checker_width: config.checker_width,
    };
    let renderer = VRenderer::new_headless(config.width, config.height, &constants).await?;

    let scene = DemoScene::upload(&renderer, &config)?;
    let frame = scene.frame(&config)?;
    renderer.render(&frame)?;

    let pixels = renderer.read_color()?;
    save_png(&config.output, config.width, config.height, pixels)?;
    log::info!("Wrote {}", config.output.display());
    Ok(())
}
