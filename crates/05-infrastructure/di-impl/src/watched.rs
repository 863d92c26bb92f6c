//! 观察记录
//!
//! 作为订阅者注册到每个发布者上：匹配的绑定出现或消失时，通过中介通知观察者。
//! 观察者只被弱引用持有，回收之后不再通知。

use crate::bean_cache::BeanCache;
use crate::qualifying::QualifyingStrategy;
use di_abstractions::{Binding, Mediator, Subscriber};
use infrastructure_common::{Key, TypeKey};
use std::sync::{Arc, Weak};
use tracing::warn;

/// 观察记录
pub struct WatchedBeans<W, M> {
    key: Key,
    strategy: QualifyingStrategy,
    mediator: M,
    watcher: Weak<W>,
    beans: BeanCache,
}

impl<W, M> WatchedBeans<W, M>
where
    W: Send + Sync + 'static,
    M: Mediator<W>,
{
    pub fn new(key: Key, mediator: M, watcher: &Arc<W>) -> Self {
        Self {
            strategy: QualifyingStrategy::for_key(&key),
            key,
            mediator,
            watcher: Arc::downgrade(watcher),
            beans: BeanCache::new(),
        }
    }

    /// 观察者是否仍然存活
    pub fn is_watching(&self) -> bool {
        self.watcher.strong_count() > 0
    }
}

impl<W, M> Subscriber for WatchedBeans<W, M>
where
    W: Send + Sync + 'static,
    M: Mediator<W>,
{
    fn type_key(&self) -> &TypeKey {
        self.key.type_key()
    }

    fn add(&self, binding: Arc<dyn Binding>, rank: i32) {
        let Some(qualifier) = self.strategy.qualify(&self.key, binding.as_ref()) else {
            return;
        };
        let Some(watcher) = self.watcher.upgrade() else {
            return;
        };
        let bean = self.beans.create(&qualifier, &binding, rank);
        if let Err(error) = self.mediator.add(&bean, &watcher) {
            warn!("通知观察者失败: {} 添加 {}, 原因: {}", self.key, bean, error);
        }
    }

    fn remove(&self, binding: &Arc<dyn Binding>) {
        let Some(bean) = self.beans.remove(binding) else {
            return;
        };
        let Some(watcher) = self.watcher.upgrade() else {
            return;
        };
        if let Err(error) = self.mediator.remove(&bean, &watcher) {
            warn!("通知观察者失败: {} 移除 {}, 原因: {}", self.key, bean, error);
        }
    }

    fn bindings(&self) -> Vec<Arc<dyn Binding>> {
        self.beans.bindings()
    }
}
