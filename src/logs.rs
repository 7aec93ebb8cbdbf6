use std::path::Path;

use anyhow::Result;
use file_rotate::{
    compression::Compression,
    suffix::{AppendTimestamp, FileLimit},
    {ContentLimit, FileRotate},
};
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};

/// Sets up the global logger writing to a small set of rotating files under
/// `cache_dir`. Call once at process start; a second call fails.
pub fn init(cache_dir: &str) -> Result<()> {
    let dir = Path::new(cache_dir).join("logs");
    std::fs::create_dir_all(&dir)?;
    let log = FileRotate::new(
        dir.join("main.log"),
        AppendTimestamp::default(FileLimit::MaxFiles(3)),
        ContentLimit::Lines(1000),
        Compression::None,
        #[cfg(unix)]
        None,
    );
    let config = ConfigBuilder::new().set_time_format_rfc3339().build();
    WriteLogger::init(LevelFilter::Info, config, log)?;
    info!("logging initialized");
    Ok(())
}
