//! # Dependency Injection Abstractions
//!
//! 组件定位抽象层，定义绑定来源（发布者）与定位器之间的边界协议。
//!
//! ## 核心接口
//!
//! - [`Binding`] - 一个已注册的组件实现
//! - [`Publisher`] - 可订阅的绑定来源
//! - [`Subscriber`] - 发布者推送绑定的目标
//! - [`RankingFunction`] - 绑定排名策略
//! - [`Mediator`] - 在观察者与组件条目之间传递变更
//! - [`BeanLocator`] / [`MutableBeanLocator`] - 组件定位器接口

pub mod bean;
pub mod binding;
pub mod implicit;
pub mod locator;
pub mod mediator;
pub mod publisher;
pub mod ranking;

pub use bean::*;
pub use binding::*;
pub use implicit::*;
pub use locator::*;
pub use mediator::*;
pub use publisher::*;
pub use ranking::*;
