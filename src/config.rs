//! 配置模块
//!
//! ## 配置格式
//!
//! ```toml
//! [corpus]
//! whitelist = ["*.md"]
//! blacklist = [".git/**/*", "logseq/bak/**/*"]
//!
//! [query]
//! properties = ["page", "tags"]
//! sort_by = "page"
//! sort_descending = true
//!
//! [store]
//! path = "/var/lib/notequery/store"
//! ```
//!
//! 所有字段都可省略，缺省值与 [`Config::default`] 相同。

use crate::core::walk_config::WalkConfig;
use crate::query::QueryOptions;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

/// 当前目录下的默认配置文件名
pub const CONFIG_FILE_NAME: &str = "notequery.toml";

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error in `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),
}

/// 应用配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 语料遍历
    pub corpus: WalkConfig,
    /// 查询默认选项
    pub query: QueryOptions,
    /// 页面存储
    pub store: StoreConfig,
}

/// 页面存储配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Oxigraph 存储目录
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

/// 默认存储目录：`<数据目录>/notequery/store`
pub fn default_store_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("notequery")
        .join("store")
}

impl Config {
    /// 加载配置
    ///
    /// # Arguments
    ///
    /// * `path` - 显式指定的配置文件；为 None 时尝试当前目录下的 `notequery.toml`
    ///
    /// # Returns
    ///
    /// 文件不存在时返回默认配置；文件无法读取或格式错误时返回错误
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map_or_else(|| PathBuf::from(CONFIG_FILE_NAME), Path::to_path_buf);

        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        Self::from_file(&path)
    }

    /// 从文件读取配置
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        let config =
            toml::from_str(&content).map_err(|e| ConfigError::Toml(path.to_path_buf(), e))?;
        debug!("Loaded config from {:?}", path);
        Ok(config)
    }
}
