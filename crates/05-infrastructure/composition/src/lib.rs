//! # 定位器组合层
//!
//! 负责把配置、日志和发布者组装成一个可用的组件定位器。
//!
//! ## 基本使用
//!
//! ```rust,no_run
//! use di_abstractions::BeanLocator;
//! use di_impl::ModuleBindings;
//! use infrastructure_common::{Key, TypeKey};
//! use infrastructure_composition::{LocatorBuilder, LoggingConfig};
//! use std::sync::Arc;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let locator = LocatorBuilder::new()
//!         .add_config_file("config/locator.toml")?
//!         .with_env_prefix("ADSP")
//!         .with_logging(LoggingConfig::development())
//!         .add_module(
//!             ModuleBindings::builder("app")
//!                 .bind_instance(TypeKey::of::<String>(), Arc::new("hello".to_string())),
//!         )
//!         .build()?;
//!
//!     for bean in locator.locate(&Key::of::<String>()) {
//!         println!("{}", bean);
//!     }
//!     Ok(())
//! }
//! ```

pub mod builder;

pub use builder::{LocatorBuilder, LoggingConfig};

// 重新导出错误类型
pub use infrastructure_common::InfrastructureError;

#[cfg(test)]
mod tests {
    mod integration_tests;
}
