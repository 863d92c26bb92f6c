//! 观察者中介抽象接口

use crate::bean::BeanEntry;
use infrastructure_common::DependencyResult;
use std::sync::Arc;

/// 观察者中介 trait
///
/// 当匹配的组件出现或消失时，定位器通过中介通知观察者。
pub trait Mediator<W>: Send + Sync + 'static
where
    W: Send + Sync + 'static,
{
    /// 组件条目出现
    fn add(&self, bean: &Arc<BeanEntry>, watcher: &W) -> DependencyResult<()>;

    /// 组件条目消失
    fn remove(&self, bean: &Arc<BeanEntry>, watcher: &W) -> DependencyResult<()>;
}
