//! 组件定位器抽象接口

use crate::bean::BeanEntry;
use crate::mediator::Mediator;
use crate::publisher::Publisher;
use infrastructure_common::{DependencyResult, Key};
use std::sync::Arc;

/// 组件定位器 trait
///
/// 按类型和限定符查找、观察组件实现
pub trait BeanLocator: Send + Sync {
    /// 查找结果，延迟迭代并按排名降序产出
    type Beans: IntoIterator<Item = Arc<BeanEntry>>;

    /// 查找匹配的组件条目
    fn locate(&self, key: &Key) -> Self::Beans;

    /// 观察匹配的组件条目，观察者只被弱引用持有
    fn watch<W, M>(&self, key: &Key, mediator: M, watcher: &Arc<W>) -> DependencyResult<()>
    where
        W: Send + Sync + 'static,
        M: Mediator<W>;
}

/// 可变组件定位器 trait
pub trait MutableBeanLocator: BeanLocator {
    /// 添加发布者，已存在时返回 `false`
    fn add(&self, publisher: Arc<dyn Publisher>) -> DependencyResult<bool>;

    /// 移除发布者，不存在时返回 `false`
    fn remove(&self, publisher: &Arc<dyn Publisher>) -> DependencyResult<bool>;

    /// 当前发布者快照，按排名降序
    fn publishers(&self) -> Vec<Arc<dyn Publisher>>;

    /// 移除所有发布者
    fn clear(&self) -> DependencyResult<()>;
}
