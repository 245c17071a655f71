use anyhow::{Context, Result};
use averager::{Config, Processor, Registry};

fn main() {
    if let Err(error) = run() {
        eprintln!("{error:#?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cfg = Config::load().context("failed to load config")?;

    let mut registry = Registry::new();
    let logger = registry
        .configure_named(&cfg.log.name, &cfg.log.file, cfg.log.level)
        .context("failed to configure logger")?;
    logger.debug(format_args!("{cfg:?}"));

    let processor = Processor::new(logger);
    match processor.process(&cfg.sample) {
        Ok(mean) => println!("Result: {mean:?}"),
        Err(error) => println!("Error: {error}"),
    }

    registry.flush();

    Ok(())
}
