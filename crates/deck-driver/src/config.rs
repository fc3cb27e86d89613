//! 驱动配置
//!
//! TOML 格式，所有字段都有默认值，缺失字段按默认值补齐：
//!
//! ```toml
//! slow_loop_interval_ms = 500
//! speed_gain = 1.0
//! show_collisions = false
//! show_treadmill_velocity = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// 默认重连检查间隔（毫秒）
pub const DEFAULT_SLOW_LOOP_INTERVAL_MS: u64 = 500;

/// 驱动配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeckConfig {
    /// 重连检查间隔（毫秒）
    pub slow_loop_interval_ms: u64,

    /// 速度增益
    pub speed_gain: f64,

    /// 输出碰撞观测日志
    pub show_collisions: bool,

    /// 每次位移换算时输出原始地面速度
    pub show_treadmill_velocity: bool,
}

impl Default for DeckConfig {
    fn default() -> Self {
        Self {
            slow_loop_interval_ms: DEFAULT_SLOW_LOOP_INTERVAL_MS,
            speed_gain: 1.0,
            show_collisions: false,
            show_treadmill_velocity: false,
        }
    }
}

impl DeckConfig {
    /// 从 TOML 字符串解析并校验
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// 从文件加载
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// 保存到文件（父目录不存在时创建）
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// 校验配置
    ///
    /// - 重连间隔必须大于 0
    /// - 速度增益必须是有限值
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.slow_loop_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "slow_loop_interval_ms must be greater than 0".to_string(),
            ));
        }
        if !self.speed_gain.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "speed_gain must be finite, got {}",
                self.speed_gain
            )));
        }
        Ok(())
    }

    /// 重连检查间隔
    pub fn slow_loop_interval(&self) -> Duration {
        Duration::from_millis(self.slow_loop_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DeckConfig::default();
        assert_eq!(config.slow_loop_interval(), Duration::from_millis(500));
        assert_eq!(config.speed_gain, 1.0);
        assert!(!config.show_collisions);
        assert!(!config.show_treadmill_velocity);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = DeckConfig::from_toml_str("speed_gain = 1.5\n").unwrap();
        assert_eq!(config.speed_gain, 1.5);
        assert_eq!(config.slow_loop_interval_ms, DEFAULT_SLOW_LOOP_INTERVAL_MS);

        let empty = DeckConfig::from_toml_str("").unwrap();
        assert_eq!(empty, DeckConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = DeckConfig::from_toml_str("slow_loop_interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config = DeckConfig {
            speed_gain: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_error() {
        let err = DeckConfig::from_toml_str("speed_gain = \"fast\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = DeckConfig {
            slow_loop_interval_ms: 250,
            speed_gain: 0.75,
            show_collisions: true,
            show_treadmill_velocity: false,
        };
        config.save_to_file(&path).unwrap();

        let loaded = DeckConfig::load_from_file(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = DeckConfig::load_from_file(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
