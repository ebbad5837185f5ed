use arix::{Scene, SceneConfig, ViewerError};

fn main() -> Result<(), ViewerError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = match std::env::args().nth(1) {
        Some(path) => SceneConfig::load(path)?,
        None => SceneConfig::default(),
    };

    let scene = Scene::new(config)?;
    arix::run(scene)
}
