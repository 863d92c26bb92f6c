//! 定位器构建器

use di_abstractions::{MutableBeanLocator, Publisher};
use di_impl::{DefaultBeanLocator, LocatorConfig, ModuleBindingsBuilder};
use infrastructure_common::{ConfigError, InfrastructureError, InfrastructureResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info};

/// 配置文件的顶层结构，定位器配置位于 `[locator]` 表下
#[derive(Debug, Default, Deserialize)]
struct Settings {
    #[serde(default)]
    locator: LocatorConfig,
}

/// 定位器构建器
///
/// 使用建造者模式加载配置、初始化日志并注册发布者
pub struct LocatorBuilder {
    /// 配置文件列表，后添加的覆盖先添加的
    config_files: Vec<PathBuf>,
    /// 环境变量前缀
    env_prefix: Option<String>,
    /// 显式配置，优先于配置文件和环境变量
    config: Option<LocatorConfig>,
    /// 预先构建好的发布者
    publishers: Vec<Arc<dyn Publisher>>,
    /// 待构建的模块
    modules: Vec<ModuleBindingsBuilder>,
    /// 是否启用日志初始化
    logging_enabled: bool,
    /// 日志配置
    logging_config: LoggingConfig,
}

impl LocatorBuilder {
    /// 创建新的定位器构建器
    pub fn new() -> Self {
        Self {
            config_files: Vec::new(),
            env_prefix: None,
            config: None,
            publishers: Vec::new(),
            modules: Vec::new(),
            logging_enabled: false, // 默认不启用日志初始化
            logging_config: LoggingConfig::default(),
        }
    }

    /// 添加配置文件，格式由扩展名决定（toml、json、yaml）
    pub fn add_config_file<P: AsRef<Path>>(mut self, path: P) -> InfrastructureResult<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.display().to_string(),
            }
            .into());
        }

        info!("添加配置文件: {}", path.display());
        self.config_files.push(path.to_path_buf());
        Ok(self)
    }

    /// 从带前缀的环境变量读取配置，例如 `ADSP_LOCATOR__IMPLICIT_BINDINGS=false`
    pub fn with_env_prefix<S: Into<String>>(mut self, prefix: S) -> Self {
        let prefix = prefix.into();
        info!("添加环境变量配置源，前缀: {}", prefix);
        self.env_prefix = Some(prefix);
        self
    }

    /// 直接指定配置，跳过文件和环境变量
    pub fn with_config(mut self, config: LocatorConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// 添加发布者
    pub fn add_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        debug!("添加发布者: {:?}", publisher);
        self.publishers.push(publisher);
        self
    }

    /// 添加模块，未设置主排名时使用配置中的默认排名
    pub fn add_module(mut self, module: ModuleBindingsBuilder) -> Self {
        self.modules.push(module);
        self
    }

    /// 配置日志
    pub fn with_logging(mut self, config: LoggingConfig) -> Self {
        self.logging_config = config;
        self.logging_enabled = true;
        self
    }

    /// 加载并验证定位器配置
    pub fn load_config(&self) -> InfrastructureResult<LocatorConfig> {
        let config = match &self.config {
            Some(config) => config.clone(),
            None => self.read_sources()?,
        };
        config.validate()?;
        debug!("定位器配置: {:?}", config);
        Ok(config)
    }

    fn read_sources(&self) -> InfrastructureResult<LocatorConfig> {
        let mut builder = config::Config::builder();
        for path in &self.config_files {
            builder = builder.add_source(config::File::from(path.as_path()));
        }
        if let Some(prefix) = &self.env_prefix {
            builder = builder.add_source(
                config::Environment::with_prefix(prefix)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );
        }

        let settings = builder
            .build()
            .and_then(|settings| settings.try_deserialize::<Settings>())
            .map_err(|e| {
                error!("配置加载失败: {}", e);
                ConfigError::ParseError {
                    source: Box::new(e),
                }
            })?;
        Ok(settings.locator)
    }

    /// 构建定位器
    pub fn build(self) -> InfrastructureResult<Arc<DefaultBeanLocator>> {
        info!("开始构建组件定位器");

        // 只有在明确配置了日志时才初始化日志
        if self.logging_enabled {
            self.logging_config.init()?;
        }

        let config = self.load_config()?;
        let default_rank = config.default_publisher_rank;
        let locator = Arc::new(DefaultBeanLocator::with_config(config));

        for publisher in self.publishers {
            locator.add(publisher)?;
        }
        for module in self.modules {
            let module = module.rank_if_unset(default_rank).build()?;
            locator.add(module)?;
        }

        info!(
            "组件定位器构建完成，发布者数量: {}",
            locator.publishers().len()
        );
        Ok(locator)
    }
}

impl Default for LocatorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// 日志配置
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// 日志级别
    pub level: tracing::Level,
    /// 是否显示目标
    pub show_target: bool,
    /// 是否显示线程ID
    pub show_thread_ids: bool,
    /// 是否显示文件名
    pub show_file: bool,
    /// 是否显示行号
    pub show_line_number: bool,
    /// 是否使用 JSON 格式
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: true,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: false,
        }
    }
}

impl LoggingConfig {
    /// 创建开发环境日志配置
    pub fn development() -> Self {
        Self {
            level: tracing::Level::DEBUG,
            show_target: true,
            show_thread_ids: true,
            show_file: true,
            show_line_number: true,
            json_format: false,
        }
    }

    /// 创建生产环境日志配置
    pub fn production() -> Self {
        Self {
            level: tracing::Level::INFO,
            show_target: false,
            show_thread_ids: false,
            show_file: false,
            show_line_number: false,
            json_format: true,
        }
    }

    /// 初始化全局日志订阅者
    ///
    /// 已有全局订阅者时返回 `BootstrapFailed`。
    pub fn init(&self) -> InfrastructureResult<()> {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(self.level)
            .with_target(self.show_target)
            .with_thread_ids(self.show_thread_ids)
            .with_file(self.show_file)
            .with_line_number(self.show_line_number);

        if self.json_format {
            subscriber.json().try_init()
        } else {
            subscriber.try_init()
        }
        .map_err(|e| InfrastructureError::BootstrapFailed {
            message: format!("日志初始化失败: {}", e),
        })?;

        info!("日志系统初始化完成");
        Ok(())
    }
}
