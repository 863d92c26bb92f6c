//! 默认组件定位器
//!
//! 维护按排名排列的发布者、按类型缓存的 [`RankedBindings`] 以及观察记录。
//!
//! 结构性修改（添加、移除发布者，注册观察者）在写锁内完成，然后把写锁降级为读锁，
//! 再在读锁内调用外部发布者。这样并发的查找不会看到不一致的状态，
//! 而耗时的外部调用也不会阻塞其他读者。
//!
//! 类型绑定缓存由独立的互斥锁保护，只在探测、创建和推送待订阅发布者时短暂持有。
//! 查找从不等待上面的读写锁，所以观察者回调里可以放心地再次查找。
//!
//! ```rust
//! use di_abstractions::{BeanLocator, MutableBeanLocator};
//! use di_impl::{DefaultBeanLocator, ModuleBindings};
//! use infrastructure_common::{Key, TypeKey};
//! use std::sync::Arc;
//!
//! let locator = DefaultBeanLocator::new();
//! let module = ModuleBindings::builder("greetings")
//!     .bind_instance(TypeKey::of::<String>(), Arc::new("hello".to_string()))
//!     .build()
//!     .unwrap();
//! locator.add(module).unwrap();
//!
//! let bean = locator.locate(&Key::of::<String>()).first().unwrap();
//! assert_eq!(*bean.value_as::<String>().unwrap(), "hello");
//! ```

use crate::config::LocatorConfig;
use crate::implicit::ImplicitBindings;
use crate::located::LocatedBeans;
use crate::mild::{Lookup, MildKeys, MildValues};
use crate::ranked_bindings::{PublisherRef, RankedBindings};
use crate::ranked_sequence::RankedSequence;
use crate::watched::WatchedBeans;
use di_abstractions::{BeanLocator, Mediator, MutableBeanLocator, Publisher, Subscriber};
use infrastructure_common::{DependencyError, DependencyResult, Key, TypeKey};
use parking_lot::{Mutex, RwLock, RwLockWriteGuard};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

type TypeCache = MildValues<u64, RankedBindings>;
type WatcherRecords = MildKeys<Vec<Arc<dyn Subscriber>>>;

/// 类型缓存键：高 32 位为类型哈希，低 32 位为类空间的身份哈希
fn cache_key(type_key: &TypeKey) -> u64 {
    (u64::from(type_key.structural_hash()) << 32) | u64::from(type_key.space_hash())
}

/// 线性探测查找类型绑定，遇到空槽位或已回收槽位时停止
fn probe(cache: &TypeCache, type_key: &TypeKey) -> Result<Arc<RankedBindings>, u64> {
    let mut slot = cache_key(type_key);
    loop {
        match cache.lookup(&slot) {
            Lookup::Live(bindings) if bindings.type_key() == type_key => return Ok(bindings),
            Lookup::Live(_) => slot = slot.wrapping_add(1),
            Lookup::Absent | Lookup::Reclaimed => return Err(slot),
        }
    }
}

fn live_watchers(records: &WatcherRecords) -> Vec<Arc<dyn Subscriber>> {
    records.values().flatten().cloned().collect()
}

/// 默认组件定位器
pub struct DefaultBeanLocator {
    publishers: Arc<RankedSequence<PublisherRef>>,
    /// 发布者序列的修改也在这把锁内完成，新建的类型绑定不会漏掉或重复推送发布者
    cached_bindings: Mutex<TypeCache>,
    watchers: RwLock<WatcherRecords>,
    implicit: ImplicitBindings,
    config: LocatorConfig,
}

impl DefaultBeanLocator {
    /// 使用默认配置创建定位器
    pub fn new() -> Self {
        Self::with_config(LocatorConfig::default())
    }

    /// 使用指定配置创建定位器
    pub fn with_config(config: LocatorConfig) -> Self {
        let publishers = Arc::new(RankedSequence::new());
        Self {
            implicit: ImplicitBindings::new(Arc::clone(&publishers)),
            publishers,
            cached_bindings: Mutex::new(TypeCache::new()),
            watchers: RwLock::new(WatcherRecords::new()),
            config,
        }
    }

    /// 定位器配置
    pub fn config(&self) -> &LocatorConfig {
        &self.config
    }

    /// 当前缓存的类型绑定数量（包括尚未清理的已回收槽位）
    pub fn cached_types(&self) -> usize {
        self.cached_bindings.lock().len()
    }

    /// 当前记录的观察者数量（包括尚未清理的已回收观察者）
    pub fn cached_watchers(&self) -> usize {
        self.watchers.read().len()
    }

    /// 立即清理已回收的缓存
    pub fn compact(&self) {
        let mut watchers = self.watchers.write();
        compact(&mut self.cached_bindings.lock(), &mut watchers);
    }

    fn fetch_bindings(&self, type_key: &TypeKey) -> Arc<RankedBindings> {
        let mut cache = self.cached_bindings.lock();
        match probe(&cache, type_key) {
            Ok(bindings) => bindings,
            Err(slot) => {
                let bindings = RankedBindings::new(type_key.clone(), &self.publishers);
                cache.insert(slot, &bindings);
                debug!("缓存类型绑定: {} (slot {:#x})", type_key, slot);
                bindings
            }
        }
    }

    fn maybe_compact(&self, cache: &mut TypeCache, watchers: &mut WatcherRecords) {
        if self.config.compact_on_mutation {
            compact(cache, watchers);
        }
    }
}

fn compact(cache: &mut TypeCache, watchers: &mut WatcherRecords) {
    let bindings = cache.compact();
    let watchers = watchers.compact();
    if bindings + watchers > 0 {
        debug!("清理缓存: {} 个类型绑定, {} 个观察者", bindings, watchers);
    }
}

/// 依次调用发布者，全部调用完成后返回第一个错误
fn call_each(
    publisher: &Arc<dyn Publisher>,
    subscribers: impl IntoIterator<Item = Arc<dyn Subscriber>>,
    action: &str,
    call: impl Fn(&dyn Publisher, Arc<dyn Subscriber>) -> DependencyResult<()>,
) -> DependencyResult<()> {
    let mut first_error = None;
    for subscriber in subscribers {
        let type_key = subscriber.type_key().clone();
        if let Err(error) = call(publisher.as_ref(), subscriber) {
            warn!("发布者{}失败: {:?} -> {}, 原因: {}", action, publisher, type_key, error);
            first_error.get_or_insert(error);
        }
    }
    first_error.map_or(Ok(()), Err)
}

impl Default for DefaultBeanLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl BeanLocator for DefaultBeanLocator {
    type Beans = LocatedBeans;

    fn locate(&self, key: &Key) -> LocatedBeans {
        let type_key = key.type_key();
        let explicit = self.fetch_bindings(type_key);
        let implicit = (self.config.implicit_bindings && key.is_unqualified() && type_key.is_concrete())
            .then(|| self.implicit.clone());
        LocatedBeans::new(key.clone(), explicit, implicit)
    }

    fn watch<W, M>(&self, key: &Key, mediator: M, watcher: &Arc<W>) -> DependencyResult<()>
    where
        W: Send + Sync + 'static,
        M: Mediator<W>,
    {
        let subscriber: Arc<dyn Subscriber> =
            Arc::new(WatchedBeans::new(key.clone(), mediator, watcher));

        let mut watchers = self.watchers.write();
        watchers
            .entry_or_insert_with(watcher, Vec::new)
            .push(Arc::clone(&subscriber));
        let publishers = self.publishers.snapshot();
        self.maybe_compact(&mut self.cached_bindings.lock(), &mut watchers);
        let _watchers = RwLockWriteGuard::downgrade(watchers);

        info!("注册观察者: {} ({} 个发布者)", key, publishers.len());
        let mut first_error = None;
        for publisher in publishers {
            if let Err(error) = publisher.publisher().subscribe(Arc::clone(&subscriber)) {
                warn!("发布者订阅失败: {:?} -> {}, 原因: {}", publisher.publisher(), key, error);
                first_error.get_or_insert(error);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl MutableBeanLocator for DefaultBeanLocator {
    fn add(&self, publisher: Arc<dyn Publisher>) -> DependencyResult<bool> {
        let publisher = PublisherRef::new(publisher);

        let mut watchers = self.watchers.write();
        if self.publishers.contains_this(&publisher) {
            return Ok(false);
        }
        {
            let mut cache = self.cached_bindings.lock();
            self.publishers.insert(publisher.clone(), publisher.rank());
            for bindings in cache.values() {
                bindings.add_publisher(publisher.clone());
            }
            self.maybe_compact(&mut cache, &mut watchers);
        }
        let subscribers = live_watchers(&watchers);
        let _watchers = RwLockWriteGuard::downgrade(watchers);

        info!(
            "添加发布者: {:?} (最高排名 {}, {} 个观察者)",
            publisher.publisher(),
            publisher.rank(),
            subscribers.len()
        );
        call_each(publisher.publisher(), subscribers, "订阅", |publisher, subscriber| {
            publisher.subscribe(subscriber)
        })?;
        Ok(true)
    }

    fn remove(&self, publisher: &Arc<dyn Publisher>) -> DependencyResult<bool> {
        let mut watchers = self.watchers.write();
        let Some(publisher) = self.publishers.find(|candidate| candidate.is(publisher)) else {
            return Ok(false);
        };
        let cached = {
            let mut cache = self.cached_bindings.lock();
            self.publishers.remove_this(&publisher);
            let cached = cache.values();
            self.maybe_compact(&mut cache, &mut watchers);
            cached
        };
        // 等待正在进行的延迟订阅时不持有类型缓存锁
        let subscribed: Vec<Arc<dyn Subscriber>> = cached
            .into_iter()
            .filter(|bindings| bindings.remove_publisher(&publisher))
            .map(|bindings| bindings as Arc<dyn Subscriber>)
            .collect();
        let subscribers = live_watchers(&watchers);
        let _watchers = RwLockWriteGuard::downgrade(watchers);

        info!(
            "移除发布者: {:?} ({} 个已订阅类型, {} 个观察者)",
            publisher.publisher(),
            subscribed.len(),
            subscribers.len()
        );
        call_each(
            publisher.publisher(),
            subscribed.into_iter().chain(subscribers),
            "取消订阅",
            |publisher, subscriber| publisher.unsubscribe(subscriber),
        )?;
        Ok(true)
    }

    fn publishers(&self) -> Vec<Arc<dyn Publisher>> {
        self.publishers
            .snapshot()
            .into_iter()
            .map(|publisher| Arc::clone(publisher.publisher()))
            .collect()
    }

    fn clear(&self) -> DependencyResult<()> {
        let mut first_error: Option<DependencyError> = None;
        for publisher in self.publishers() {
            if let Err(error) = self.remove(&publisher) {
                first_error.get_or_insert(error);
            }
        }
        info!("清空所有发布者");
        first_error.map_or(Ok(()), Err)
    }
}

impl fmt::Debug for DefaultBeanLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultBeanLocator")
            .field("publishers", &self.publishers)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::ModuleBindings;
    use infrastructure_common::Space;

    fn module(name: &str, rank: i32, value: &str) -> Arc<dyn Publisher> {
        ModuleBindings::builder(name)
            .rank(rank)
            .bind_instance(TypeKey::of::<String>(), Arc::new(value.to_string()))
            .build()
            .unwrap()
    }

    fn values(locator: &DefaultBeanLocator, key: &Key) -> Vec<String> {
        locator
            .locate(key)
            .into_iter()
            .map(|bean| bean.value_as::<String>().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_add_is_idempotent() {
        let locator = DefaultBeanLocator::new();
        let publisher = module("a", 0, "a");

        assert!(locator.add(Arc::clone(&publisher)).unwrap());
        assert!(!locator.add(Arc::clone(&publisher)).unwrap());
        assert_eq!(locator.publishers().len(), 1);

        assert!(locator.remove(&publisher).unwrap());
        assert!(!locator.remove(&publisher).unwrap());
        assert!(locator.publishers().is_empty());
    }

    #[test]
    fn test_publishers_in_rank_order() {
        let locator = DefaultBeanLocator::new();
        let low = module("low", 1, "low");
        let high = module("high", 9, "high");
        locator.add(Arc::clone(&low)).unwrap();
        locator.add(Arc::clone(&high)).unwrap();

        let publishers = locator.publishers();
        assert!(Arc::ptr_eq(&publishers[0], &high));
        assert!(Arc::ptr_eq(&publishers[1], &low));
        assert_eq!(values(&locator, &Key::of::<String>()), vec!["high", "low"]);
    }

    #[test]
    fn test_locate_reuses_type_bindings() {
        let locator = DefaultBeanLocator::new();
        let first = locator.locate(&Key::of::<String>());
        let second = locator.locate(&Key::of::<String>().named("x"));

        assert_eq!(locator.cached_types(), 1);
        drop((first, second));

        locator.compact();
        assert_eq!(locator.cached_types(), 0);
    }

    #[test]
    fn test_colliding_cache_keys_probe_to_next_slot() {
        let locator = DefaultBeanLocator::new();
        let root = TypeKey::of::<String>();
        let plugin = TypeKey::of::<String>().in_space(&Space::new("plugin"));

        // 占据插件类型的槽位，迫使它探测下一个槽位
        let squatter = RankedBindings::new(root.clone(), &locator.publishers);
        locator
            .cached_bindings
            .lock()
            .insert(cache_key(&plugin), &squatter);

        let located = locator.fetch_bindings(&plugin);
        assert_eq!(located.type_key(), &plugin);
        assert!(!Arc::ptr_eq(&located, &squatter));
        assert!(Arc::ptr_eq(&locator.fetch_bindings(&plugin), &located));

        let cache = locator.cached_bindings.lock();
        let next = cache.get(&cache_key(&plugin).wrapping_add(1));
        assert!(next.is_some_and(|bindings| Arc::ptr_eq(&bindings, &located)));
    }

    #[test]
    fn test_types_in_different_spaces_are_distinct() {
        let locator = DefaultBeanLocator::new();
        let plugin = Space::new("plugin");
        locator.add(module("root", 0, "root")).unwrap();

        let plugin_key = Key::for_type(TypeKey::of::<String>().in_space(&plugin));
        assert!(values(&locator, &plugin_key).is_empty());
        assert_eq!(values(&locator, &Key::of::<String>()), vec!["root"]);
    }

    #[test]
    fn test_clear_removes_everything() {
        let locator = DefaultBeanLocator::new();
        let located = locator.locate(&Key::of::<String>());
        locator.add(module("a", 0, "a")).unwrap();
        locator.add(module("b", 1, "b")).unwrap();
        assert_eq!(located.iter().count(), 2);

        locator.clear().unwrap();

        assert!(locator.publishers().is_empty());
        assert!(located.is_empty());
    }
}
