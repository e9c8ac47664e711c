use scene_ngin::{config::ViewerConfig, flow};

fn main() -> anyhow::Result<()> {
    let config = ViewerConfig::from_args(std::env::args().skip(1))?;
    flow::run(config)
}
