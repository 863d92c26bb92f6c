//! 按排名排列的类型绑定
//!
//! 每个请求类型一份：已订阅发布者推送的绑定，加上尚未订阅的发布者。
//! 迭代时只有当待订阅发布者的最高排名可能影响后续顺序时才去订阅它，
//! 排名低的发布者在迭代提前结束时永远不会被订阅。

use crate::bean_cache::BeanCache;
use crate::mild::MildElements;
use crate::ranked_sequence::{RankedIter, RankedSequence};
use di_abstractions::{Binding, Publisher, Subscriber};
use infrastructure_common::{arc_address, Identity, TypeKey};
use parking_lot::ReentrantMutex;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// 定位器持有的发布者引用
///
/// 携带发布者的最高排名和订阅锁。同一个发布者的所有克隆共享同一把锁，
/// 保证它对同一个订阅者最多被订阅一次。
#[derive(Clone)]
pub(crate) struct PublisherRef {
    publisher: Arc<dyn Publisher>,
    rank: i32,
    lock: Arc<ReentrantMutex<()>>,
}

impl PublisherRef {
    pub(crate) fn new(publisher: Arc<dyn Publisher>) -> Self {
        let rank = publisher.max_binding_rank();
        Self {
            publisher,
            rank,
            lock: Arc::new(ReentrantMutex::new(())),
        }
    }

    pub(crate) fn publisher(&self) -> &Arc<dyn Publisher> {
        &self.publisher
    }

    pub(crate) fn rank(&self) -> i32 {
        self.rank
    }

    pub(crate) fn is(&self, publisher: &Arc<dyn Publisher>) -> bool {
        self.identity() == arc_address(publisher)
    }
}

impl Identity for PublisherRef {
    fn identity(&self) -> usize {
        arc_address(&self.publisher)
    }
}

impl fmt::Debug for PublisherRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PublisherRef")
            .field("publisher", &self.publisher)
            .field("rank", &self.rank)
            .finish()
    }
}

/// 类型绑定
pub struct RankedBindings {
    type_key: TypeKey,
    bindings: RankedSequence<Arc<dyn Binding>>,
    pending_publishers: RankedSequence<PublisherRef>,
    cached_beans: MildElements<BeanCache>,
}

impl RankedBindings {
    /// 以定位器当前的发布者作为待订阅发布者
    pub(crate) fn new(type_key: TypeKey, publishers: &RankedSequence<PublisherRef>) -> Arc<Self> {
        Arc::new(Self {
            type_key,
            bindings: RankedSequence::new(),
            pending_publishers: RankedSequence::copy_of(publishers),
            cached_beans: MildElements::new(),
        })
    }

    /// 请求类型
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// 创建跟随本类型绑定变化的条目缓存
    ///
    /// 绑定被移除时，所有仍然存活的缓存都会丢弃对应的条目。
    pub fn new_bean_cache(&self) -> Arc<BeanCache> {
        let cache = Arc::new(BeanCache::new());
        self.cached_beans.push(&cache);
        cache
    }

    pub(crate) fn add_publisher(&self, publisher: PublisherRef) {
        let rank = publisher.rank;
        self.pending_publishers.insert(publisher, rank);
    }

    /// 移除发布者，返回它是否已经订阅过本类型
    pub(crate) fn remove_publisher(&self, publisher: &PublisherRef) -> bool {
        let _guard = publisher.lock.lock();
        !self.pending_publishers.remove_this(publisher)
    }

    /// 待订阅发布者数量
    pub fn pending_count(&self) -> usize {
        self.pending_publishers.len()
    }

    /// 已解析的绑定数量，不会触发订阅
    pub fn resolved_count(&self) -> usize {
        self.bindings.len()
    }

    /// 按排名迭代绑定，必要时订阅待订阅发布者
    pub fn iter(self: &Arc<Self>) -> RankedBindingsIter {
        RankedBindingsIter {
            owner: Arc::clone(self),
            bindings: self.bindings.iter(),
        }
    }

    fn subscribe_pending(self: &Arc<Self>, publisher: &PublisherRef) {
        let _guard = publisher.lock.lock();

        // 其他线程可能已经完成订阅或移除了该发布者
        let still_top = self
            .pending_publishers
            .peek()
            .is_some_and(|top| top.same_as(publisher));
        if !still_top {
            return;
        }

        debug!("订阅发布者: {:?} -> {}", publisher.publisher, self.type_key);
        let subscriber: Arc<dyn Subscriber> = Arc::clone(self) as Arc<dyn Subscriber>;
        if let Err(error) = publisher.publisher.subscribe(subscriber) {
            warn!(
                "发布者订阅失败，视为已订阅: {:?} -> {}, 原因: {}",
                publisher.publisher, self.type_key, error
            );
        }
        self.pending_publishers.remove_this(publisher);
    }
}

impl Subscriber for RankedBindings {
    fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    fn add(&self, binding: Arc<dyn Binding>, rank: i32) {
        self.bindings.insert(binding, rank);
    }

    fn remove(&self, binding: &Arc<dyn Binding>) {
        if self.bindings.remove_this(binding) {
            for cache in self.cached_beans.live() {
                cache.remove(binding);
            }
        }
    }

    fn bindings(&self) -> Vec<Arc<dyn Binding>> {
        self.bindings.snapshot()
    }
}

impl fmt::Debug for RankedBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RankedBindings")
            .field("type_key", &self.type_key)
            .field("bindings", &self.bindings.len())
            .field("pending_publishers", &self.pending_publishers.len())
            .finish()
    }
}

/// 类型绑定迭代器
pub struct RankedBindingsIter {
    owner: Arc<RankedBindings>,
    bindings: RankedIter<Arc<dyn Binding>>,
}

impl RankedBindingsIter {
    /// 返回下一个绑定及其排名
    pub fn next_ranked(&mut self) -> Option<(Arc<dyn Binding>, i32)> {
        // 待订阅发布者的最高排名不低于下一个绑定时，先订阅它
        while let Some(top) = self.owner.pending_publishers.peek() {
            if self.bindings.has_next_above(top.rank) {
                break;
            }
            self.owner.subscribe_pending(&top);
        }
        self.bindings.next_ranked()
    }
}

impl Iterator for RankedBindingsIter {
    type Item = Arc<dyn Binding>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_ranked().map(|(binding, _)| binding)
    }
}
