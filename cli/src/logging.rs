use jobctl_client::config::LoggingConfig;
use log::LevelFilter;

/// Level from config, shifted by `-v`/`-q`.
pub fn level_filter(configured: &str, verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    let base = configured.parse::<LevelFilter>().unwrap_or(LevelFilter::Warn);
    let levels = [
        LevelFilter::Off,
        LevelFilter::Error,
        LevelFilter::Warn,
        LevelFilter::Info,
        LevelFilter::Debug,
        LevelFilter::Trace,
    ];
    let idx = levels.iter().position(|l| *l == base).unwrap_or(2);
    levels[(idx + verbose as usize).min(levels.len() - 1)]
}

/// Stdout carries command output, so log lines go to stderr and, optionally, a file.
pub fn setup_logging(config: &LoggingConfig, verbose: u8, quiet: bool) -> anyhow::Result<()> {
    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{}][{}][{}] {}",
                chrono::Local::now().format("%Y-%m-%d][%H:%M:%S"),
                record.target(),
                record.level(),
                message
            ))
        })
        .level(level_filter(&config.level, verbose, quiet))
        .chain(std::io::stderr());

    if let Some(path) = &config.output {
        dispatch = dispatch.chain(fern::log_file(path)?);
    }

    dispatch.apply()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_shifts() {
        assert_eq!(level_filter("warn", 0, false), LevelFilter::Warn);
        assert_eq!(level_filter("warn", 2, false), LevelFilter::Debug);
        assert_eq!(level_filter("info", 9, false), LevelFilter::Trace);
        assert_eq!(level_filter("debug", 0, true), LevelFilter::Error);
        assert_eq!(level_filter("nonsense", 0, false), LevelFilter::Warn);
    }
}
