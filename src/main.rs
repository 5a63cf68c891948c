use anyhow::Result;
use cityscope_core::Config;

fn main() -> Result<()> {
    // Logs go next to the config file; the terminal belongs to the UI
    let log_file = Config::config_path()?.with_file_name("cityscope.log");
    cityscope_core::init(Some(&log_file))?;

    let (config, _validation) = Config::load_validated()?;
    tracing::info!("cityscope started");

    cityscope_ui::run(&config)
}
