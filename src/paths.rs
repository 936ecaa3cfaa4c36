use std::path::PathBuf;
use std::sync::OnceLock;

static BASE_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Returns the base output directory (the current working directory).
pub fn get_base_dir() -> &'static PathBuf {
    BASE_DIR.get_or_init(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Returns the results directory: `<base>/results/`
pub fn get_results_dir() -> PathBuf {
    get_base_dir().join("results")
}

/// Returns the capture copies directory: `<base>/images/`
pub fn get_images_dir() -> PathBuf {
    get_base_dir().join("images")
}

/// Returns the logs directory: `<base>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_base_dir().join("logs")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_results_dir())?;
    std::fs::create_dir_all(get_images_dir())?;
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}
