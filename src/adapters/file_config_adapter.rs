//! INI file configuration adapter.

use crate::domain::error::SigtraderError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::path::Path;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SigtraderError> {
        let path = path.as_ref();
        let mut config = Ini::new();
        config.load(path).map_err(|reason| SigtraderError::ConfigParse {
            file: path.display().to_string(),
            reason,
        })?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, SigtraderError> {
        let mut config = Ini::new();
        config
            .read(content.to_string())
            .map_err(|reason| SigtraderError::ConfigParse {
                file: "<string>".to_string(),
                reason,
            })?;
        Ok(Self { config })
    }

    /// Settings with every key at its default.
    pub fn empty() -> Self {
        Self { config: Ini::new() }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> i64 {
        self.config
            .getint(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> f64 {
        self.config
            .getfloat(section, key)
            .ok()
            .flatten()
            .unwrap_or(default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn from_string_parses_config() {
        let content = r#"
[scoring]
policy = strict
threshold = 0.5

[risk]
stop_loss_pct = 3
take_profit_pct = 9
"#;
        let adapter = FileConfigAdapter::from_string(content).unwrap();
        assert_eq!(
            adapter.get_string("scoring", "policy"),
            Some("strict".to_string())
        );
        assert_eq!(adapter.get_double("scoring", "threshold", 0.0), 0.5);
        assert_eq!(adapter.get_double("risk", "take_profit_pct", 0.0), 9.0);
    }

    #[test]
    fn get_string_returns_none_for_missing_key() {
        let adapter = FileConfigAdapter::from_string("[backtest]\nwarmup = 50\n").unwrap();
        assert_eq!(adapter.get_string("backtest", "missing"), None);
        assert_eq!(adapter.get_string("missing_section", "key"), None);
        assert!(adapter.contains("backtest", "warmup"));
        assert!(!adapter.contains("backtest", "min_bars"));
    }

    #[test]
    fn get_int_returns_value() {
        let adapter = FileConfigAdapter::from_string("[enrichment]\nlookback = 14\n").unwrap();
        assert_eq!(adapter.get_int("enrichment", "lookback", 0), 14);
        assert_eq!(adapter.get_usize("enrichment", "lookback", 0), 14);
    }

    #[test]
    fn get_int_returns_default_for_missing_or_non_numeric() {
        let adapter = FileConfigAdapter::from_string("[enrichment]\nlookback = abc\n").unwrap();
        assert_eq!(adapter.get_int("enrichment", "lookback", 28), 28);
        assert_eq!(adapter.get_int("enrichment", "missing", 42), 42);
    }

    #[test]
    fn get_usize_rejects_negative() {
        let adapter = FileConfigAdapter::from_string("[live]\nsignal_window = -5\n").unwrap();
        assert_eq!(adapter.get_usize("live", "signal_window", 50), 50);
    }

    #[test]
    fn get_double_returns_default_for_non_numeric() {
        let adapter =
            FileConfigAdapter::from_string("[backtest]\nstarting_balance = lots\n").unwrap();
        assert_eq!(
            adapter.get_double("backtest", "starting_balance", 10_000.0),
            10_000.0
        );
    }

    #[test]
    fn empty_has_no_keys() {
        let adapter = FileConfigAdapter::empty();
        assert_eq!(adapter.get_string("scoring", "policy"), None);
        assert_eq!(adapter.get_double("scoring", "threshold", 0.35), 0.35);
    }

    #[test]
    fn from_file_reads_config() {
        let file = create_temp_config("[backtest]\nstarting_balance = 2500\n");
        let adapter = FileConfigAdapter::from_file(file.path()).unwrap();
        assert_eq!(
            adapter.get_double("backtest", "starting_balance", 0.0),
            2500.0
        );
    }

    #[test]
    fn from_file_returns_error_for_missing_file() {
        let result = FileConfigAdapter::from_file("/nonexistent/path/sigtrader.ini");
        assert!(matches!(result, Err(SigtraderError::ConfigParse { .. })));
    }
}
