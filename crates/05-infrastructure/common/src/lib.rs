//! # Infrastructure Common
//!
//! 这个 crate 提供了 Lorn ADSP 组件定位器的公共类型、错误定义和工具。
//!
//! ## 核心类型
//!
//! - [`TypeKey`] - 请求类型的描述（类型ID + 定义类空间）
//! - [`Space`] - 定义类型的类空间（模块或插件）
//! - [`Qualifier`] / [`Key`] - 限定符与查找键
//! - [`Identity`] - 基于引用身份而不是值相等的比较
//! - [`DependencyError`] / [`ConfigError`] / [`InfrastructureError`] - 错误分类
//!
//! ## 设计原则
//!
//! - 绑定与发布者按引用身份比较，结构相等的两个注册仍然相互区分
//! - 查找失败返回空结果，而不是错误

pub mod errors;
pub mod identity;
pub mod metadata;
pub mod qualifier;

pub use errors::*;
pub use identity::*;
pub use metadata::*;
pub use qualifier::*;
