//! # 组件定位器具体实现
//!
//! 提供并发的、按排名排列的组件定位器：
//!
//! - [`RankedSequence`] - 无锁的写时复制排名序列
//! - [`BeanCache`] - 每个绑定只包装一次的条目缓存
//! - [`RankedBindings`] - 按类型缓存的绑定，延迟订阅发布者
//! - [`DefaultBeanLocator`] - 可变的组件定位器
//! - [`ModuleBindings`] - 基于固定绑定集合的发布者
//!
//! 查找从不阻塞在其他读者上；发布者的添加和移除在短暂的写锁内完成，
//! 对外部发布者的调用发生在降级后的读锁内。

pub mod bean_cache;
pub mod binding;
pub mod config;
pub mod implicit;
pub mod located;
pub mod locator;
pub mod mild;
pub mod module;
pub mod qualifying;
pub mod ranked_bindings;
pub mod ranked_sequence;
pub mod ranking;
pub mod watched;

pub use bean_cache::{BeanCache, BeanMap};
pub use binding::{ComponentBinding, ProviderFn};
pub use config::LocatorConfig;
pub use implicit::ConstructorResolver;
pub use located::{LocatedBeans, LocatedIter};
pub use locator::DefaultBeanLocator;
pub use mild::{Lookup, MildElements, MildKeys, MildValues};
pub use module::{ModuleBindings, ModuleBindingsBuilder};
pub use qualifying::QualifyingStrategy;
pub use ranked_bindings::{RankedBindings, RankedBindingsIter};
pub use ranked_sequence::{RankedIter, RankedSequence};
pub use ranking::DefaultRankingFunction;
pub use watched::WatchedBeans;
