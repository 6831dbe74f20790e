//! 容器配置
//!
//! 通过 `config` crate 读取 TOML 文件与 `BEANS` 前缀的环境变量，
//! 例如 `BEANS__EAGER_SINGLETONS=true`、`BEANS__LOGGING__LEVEL=debug`。

use config::{Config, Environment, File, FileFormat};
use di_abstractions::ResolveOptions;
use infrastructure_common::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

/// 环境变量前缀
pub const ENV_PREFIX: &str = "BEANS";

/// 容器配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerSettings {
    /// 启动时预先实例化所有非懒加载单例
    pub eager_singletons: bool,
    /// 单次解析的最大递归深度
    pub max_resolution_depth: usize,
    /// 是否允许同名 Bean 定义覆盖
    pub allow_definition_overriding: bool,
    pub logging: LoggingSettings,
}

impl Default for ContainerSettings {
    fn default() -> Self {
        Self {
            eager_singletons: false,
            max_resolution_depth: 100,
            allow_definition_overriding: true,
            logging: LoggingSettings::default(),
        }
    }
}

impl ContainerSettings {
    /// 从可选的 TOML 文件与环境变量加载
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("加载容器配置文件: {}", path.display());
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator("__")
                .try_parsing(true),
        );
        Self::finish(builder.build())
    }

    /// 从 TOML 文本加载，不读取环境变量
    pub fn from_toml_str(text: &str) -> ConfigResult<Self> {
        let built = Config::builder()
            .add_source(File::from_str(text, FileFormat::Toml))
            .build();
        Self::finish(built)
    }

    fn finish(built: Result<Config, config::ConfigError>) -> ConfigResult<Self> {
        let settings: Self = built
            .and_then(|config| config.try_deserialize::<Self>())
            .map_err(|e| ConfigError::ParseError { source: Box::new(e) })?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.max_resolution_depth == 0 {
            return Err(ConfigError::ValidationError {
                message: "max_resolution_depth 必须大于 0".to_string(),
            });
        }
        self.logging.level()?;
        Ok(())
    }

    pub fn resolve_options(&self) -> ResolveOptions {
        ResolveOptions {
            max_depth: self.max_resolution_depth,
        }
    }
}

/// 日志配置项
///
/// `enabled` 为真时由容器安装全局 subscriber；`RUST_LOG` 存在时覆盖 `level`。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub enabled: bool,
    pub level: String,
    pub json: bool,
    pub show_target: bool,
    pub show_thread_ids: bool,
    pub show_file: bool,
    pub show_line_number: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            json: false,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
        }
    }
}

impl LoggingSettings {
    /// 开发预设：debug 级别，输出线程与源码位置
    pub fn development() -> Self {
        Self {
            enabled: true,
            level: "debug".to_string(),
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            ..Self::default()
        }
    }

    /// 生产预设：JSON 输出
    pub fn production() -> Self {
        Self {
            enabled: true,
            json: true,
            show_target: false,
            ..Self::default()
        }
    }

    pub fn level(&self) -> ConfigResult<tracing::Level> {
        tracing::Level::from_str(self.level.trim()).map_err(|_| ConfigError::ValidationError {
            message: format!("未知的日志级别: {}", self.level),
        })
    }

    pub(crate) fn filter(&self) -> ConfigResult<EnvFilter> {
        let level = LevelFilter::from_level(self.level()?);
        Ok(EnvFilter::builder()
            .with_default_directive(level.into())
            .from_env_lossy())
    }
}
