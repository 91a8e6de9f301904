use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// 指向配置文件的环境变量。
pub const CONFIG_ENV_VAR: &str = "CARDCUT_CONFIG";

/// 应用配置的根结构。
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl AppConfig {
    /// 从显式路径加载配置。
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 自动发现配置文件：优先读取环境变量 `CARDCUT_CONFIG`，否则寻找 `./config/default.toml`。
    /// 若文件缺失，则返回默认配置。
    pub fn discover() -> Result<Self, ConfigError> {
        let working_dir = env::current_dir().map_err(|source| ConfigError::Context {
            message: "获取当前工作目录失败".to_string(),
            source,
        })?;
        Self::discover_in(env::var_os(CONFIG_ENV_VAR).map(PathBuf::from), &working_dir)
    }

    /// 与 [`AppConfig::discover`] 相同的查找顺序，但由调用方提供环境变量值与工作目录。
    pub fn discover_in(
        env_path: Option<PathBuf>,
        working_dir: &Path,
    ) -> Result<Self, ConfigError> {
        if let Some(path) = env_path {
            return Self::from_file(path);
        }

        let default_path = working_dir.join("config").join("default.toml");
        if default_path.exists() {
            Self::from_file(default_path)
        } else {
            Ok(Self::default())
        }
    }
}

/// 日志配置，支持设置默认等级。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// 排版默认值，命令行参数可逐项覆盖。
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LayoutConfig {
    #[serde(default = "LayoutConfig::default_machine")]
    pub machine: String,
    #[serde(default = "LayoutConfig::default_paper_size")]
    pub paper_size: String,
    #[serde(default)]
    pub card_type: Option<String>,
    #[serde(default)]
    pub sensor_safe: bool,
}

impl LayoutConfig {
    fn default_machine() -> String {
        "silhouette".to_string()
    }

    fn default_paper_size() -> String {
        "letter".to_string()
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            machine: Self::default_machine(),
            paper_size: Self::default_paper_size(),
            card_type: None,
            sensor_safe: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "OutputConfig::default_directory")]
    pub directory: PathBuf,
}

impl OutputConfig {
    fn default_directory() -> PathBuf {
        PathBuf::from("output")
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: Self::default_directory(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("读取配置文件 {path:?} 失败: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析配置文件 {path:?} 失败: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("{message}")]
    Context {
        message: String,
        #[source]
        source: std::io::Error,
    },
}
