//! 配置管理命令
//!
//! 配置文件默认位于 `<config_dir>/deckbridge/config.toml`。

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use deck_driver::DeckConfig;
use std::path::{Path, PathBuf};

/// 默认配置文件路径
pub fn default_config_path() -> Result<PathBuf> {
    let mut path = dirs::config_dir().ok_or_else(|| anyhow::anyhow!("无法确定配置目录"))?;
    path.push("deckbridge");
    path.push("config.toml");
    Ok(path)
}

/// 加载配置
///
/// 显式指定的路径必须存在；默认路径不存在时使用默认配置。
pub fn load_config(path: Option<&Path>) -> Result<DeckConfig> {
    if let Some(path) = path {
        return DeckConfig::load_from_file(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()));
    }

    let path = default_config_path()?;
    if !path.exists() {
        tracing::debug!("No config file at {}, using defaults", path.display());
        return Ok(DeckConfig::default());
    }
    DeckConfig::load_from_file(&path)
        .with_context(|| format!("读取配置文件失败: {}", path.display()))
}

/// 配置命令
#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// 写入默认配置
    Init {
        /// 配置文件路径（默认为用户配置目录）
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// 覆盖已有文件
        #[arg(short, long)]
        force: bool,
    },

    /// 显示当前生效的配置
    Show {
        /// 配置文件路径（默认为用户配置目录）
        #[arg(short, long)]
        path: Option<PathBuf>,
    },
}

impl ConfigCommand {
    pub fn execute(self) -> Result<()> {
        match self {
            ConfigCommand::Init { path, force } => Self::init_(path, force),
            ConfigCommand::Show { path } => Self::show_(path),
        }
    }

    fn init_(path: Option<PathBuf>, force: bool) -> Result<()> {
        let path = match path {
            Some(path) => path,
            None => default_config_path()?,
        };
        if path.exists() && !force {
            bail!("配置文件已存在: {}（使用 --force 覆盖）", path.display());
        }

        DeckConfig::default()
            .save_to_file(&path)
            .with_context(|| format!("写入配置文件失败: {}", path.display()))?;
        println!("✅ 已写入默认配置: {}", path.display());
        Ok(())
    }

    fn show_(path: Option<PathBuf>) -> Result<()> {
        let config = load_config(path.as_deref())?;
        match path {
            Some(path) => println!("# {}", path.display()),
            None => println!("# {}", default_config_path()?.display()),
        }
        print!("{}", config.to_toml_string()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        ConfigCommand::Init {
            path: Some(path.clone()),
            force: false,
        }
        .execute()
        .unwrap();

        let config = load_config(Some(path.as_path())).unwrap();
        assert_eq!(config, DeckConfig::default());
    }

    #[test]
    fn test_init_refuses_overwrite() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "speed_gain = 2.0\n").unwrap();

        let result = ConfigCommand::Init {
            path: Some(path.clone()),
            force: false,
        }
        .execute();
        assert!(result.is_err());
        assert_eq!(load_config(Some(path.as_path())).unwrap().speed_gain, 2.0);

        ConfigCommand::Init {
            path: Some(path.clone()),
            force: true,
        }
        .execute()
        .unwrap();
        assert_eq!(load_config(Some(path.as_path())).unwrap().speed_gain, 1.0);
    }

    #[test]
    fn test_explicit_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        assert!(load_config(Some(dir.path().join("absent.toml").as_path())).is_err());
    }
}
