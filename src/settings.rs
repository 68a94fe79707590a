use std::path::PathBuf;

/// Directory holding persisted rule sets. `BANKREC_DATA_DIR` overrides the
/// default for tests and scripting.
pub fn data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("BANKREC_DATA_DIR") {
        return PathBuf::from(dir);
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config")
        .join("bankrec")
}
