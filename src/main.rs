use std::io::{self, BufWriter};

use anyhow::{Context, Result};
use log::debug;

use marc_validate::{
    Cli, ConfigManager, InputOptions, RecordValidator, VerbosityLevel, open_input,
};

fn init_logging(verbosity: VerbosityLevel) {
    // RUST_LOG, when set, overrides the level picked from the flags
    env_logger::Builder::new()
        .filter_level(verbosity.level_filter())
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    let config = ConfigManager::load_config(&cli).context("Failed to load configuration")?;
    init_logging(config.verbosity());
    debug!("Effective configuration: {:?}", config);

    let options = InputOptions::from_config(&config.input);
    let validator = RecordValidator::from_config(&config.schema)
        .context("Failed to load schema")?
        .with_encoding(options.encoding());

    let source = cli.input_source();
    let input = open_input(&source, &options)?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    validator
        .validate(input, &mut out)
        .with_context(|| format!("Failed to validate {}", source.display_name()))?;

    Ok(())
}
