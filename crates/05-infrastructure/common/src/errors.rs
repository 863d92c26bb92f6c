//! 错误类型定义

use thiserror::Error;

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    #[error("配置解析失败: {source}")]
    ParseError {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("配置验证失败: {message}")]
    ValidationError { message: String },
}

impl ConfigError {
    /// 创建配置验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum DependencyError {
    #[error("组件创建失败: {type_name}, 原因: {source}")]
    ComponentCreationFailed {
        type_name: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("组件类型不匹配: 期望 {expected}, 实际 {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("发布者调用失败: {publisher}, 原因: {message}")]
    PublisherFailed { publisher: String, message: String },

    #[error("排名无效: {rank}, 主排名必须是非负数")]
    InvalidRank { rank: i32 },

    #[error("观察者通知失败: {watcher}, 原因: {message}")]
    MediatorFailed { watcher: String, message: String },

    #[error("隐式绑定解析失败: {type_name}, 原因: {message}")]
    ImplicitResolutionFailed { type_name: String, message: String },
}

impl DependencyError {
    /// 创建发布者调用错误
    pub fn publisher_failed(publisher: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PublisherFailed {
            publisher: publisher.into(),
            message: message.into(),
        }
    }

    /// 创建观察者通知错误
    pub fn mediator_failed(watcher: impl Into<String>, message: impl Into<String>) -> Self {
        Self::MediatorFailed {
            watcher: watcher.into(),
            message: message.into(),
        }
    }

    /// 创建组件创建错误
    pub fn creation_failed(
        type_name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::ComponentCreationFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }
}

/// 基础设施错误类型
#[derive(Error, Debug)]
pub enum InfrastructureError {
    #[error("配置错误: {source}")]
    ConfigError {
        #[from]
        source: ConfigError,
    },

    #[error("依赖注入错误: {source}")]
    DependencyError {
        #[from]
        source: DependencyError,
    },

    #[error("基础设施启动失败: {message}")]
    BootstrapFailed { message: String },
}

/// 结果类型别名
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type DependencyResult<T> = Result<T, DependencyError>;
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;
