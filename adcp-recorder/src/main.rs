use adcp_common::config::Config;
use adcp_recorder::Recorder;
use std::path::Path;

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "recorder.json".to_owned());
    let config = Config::from_file(Path::new(&config_path))?;
    adcp_recorder::enable_logging(&config.log_level);

    let mut recorder = Recorder::new(config);
    recorder.start()?;
    recorder.wait()
}
