use crate::config::LoggingConfig;
use crate::error::Result;
use std::path::PathBuf;

pub fn default_log_file() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join("join").join("join.log"))
}

/// Sends `log` records to a file; the terminal belongs to the UI.
/// Returns the file in use, or `None` when logging is off.
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    if !config.enabled {
        return Ok(None);
    }
    let Some(path) = config.file.clone().or_else(default_log_file) else {
        return Ok(None);
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "{} [{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(config.level_filter())
        .level_for("reqwest", log::LevelFilter::Warn)
        .level_for("hyper", log::LevelFilter::Warn)
        .chain(fern::log_file(&path)?)
        .apply()?;

    Ok(Some(path))
}
