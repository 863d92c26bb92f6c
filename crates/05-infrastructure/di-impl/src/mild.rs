//! 弱引用集合
//!
//! 值或键只被弱引用持有，外部不再使用时即可回收。回收后留下的空槽位
//! 在下一次修改时通过 `compact` 清理，没有后台清理线程。

use parking_lot::Mutex;
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Weak};
use tracing::trace;

/// 弱引用槽位的查找结果
pub enum Lookup<V> {
    /// 从未写入
    Absent,
    /// 写入过但已被回收
    Reclaimed,
    /// 仍然存活
    Live(Arc<V>),
}

/// 弱引用值映射
pub struct MildValues<K, V> {
    entries: HashMap<K, Weak<V>>,
}

impl<K: Eq + Hash + Copy, V> MildValues<K, V> {
    /// 创建空映射
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 查找槽位，区分未写入和已回收
    pub fn lookup(&self, key: &K) -> Lookup<V> {
        match self.entries.get(key) {
            None => Lookup::Absent,
            Some(weak) => weak.upgrade().map_or(Lookup::Reclaimed, Lookup::Live),
        }
    }

    /// 存活的值
    pub fn get(&self, key: &K) -> Option<Arc<V>> {
        self.entries.get(key).and_then(Weak::upgrade)
    }

    /// 写入值，只保留弱引用
    pub fn insert(&mut self, key: K, value: &Arc<V>) {
        self.entries.insert(key, Arc::downgrade(value));
    }

    /// 移除槽位，值仍存活时返回
    pub fn remove(&mut self, key: &K) -> Option<Arc<V>> {
        self.entries.remove(key).and_then(|weak| weak.upgrade())
    }

    /// 所有存活的值
    pub fn values(&self) -> Vec<Arc<V>> {
        self.entries.values().filter_map(Weak::upgrade).collect()
    }

    /// 清理已回收的槽位，返回清理数量
    pub fn compact(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, weak| weak.strong_count() > 0);
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!("清理已回收的缓存值: {}", removed);
        }
        removed
    }

    /// 槽位数量，包括尚未清理的已回收槽位
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何槽位
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空所有槽位
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<K: Eq + Hash + Copy, V> Default for MildValues<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

/// 弱引用键映射
///
/// 键按引用身份比较。键被回收后，对应的值在下一次 `compact` 时丢弃。
pub struct MildKeys<V> {
    entries: HashMap<usize, (Weak<dyn Any + Send + Sync>, V)>,
}

impl<V> MildKeys<V> {
    /// 创建空映射
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// 获取键对应的值，不存在时插入
    pub fn entry_or_insert_with<K>(&mut self, key: &Arc<K>, make: impl FnOnce() -> V) -> &mut V
    where
        K: Any + Send + Sync,
    {
        let address = Arc::as_ptr(key).cast::<()>() as usize;
        let erased: Arc<dyn Any + Send + Sync> = Arc::clone(key) as Arc<dyn Any + Send + Sync>;
        let slot = match self.entries.entry(address) {
            Entry::Occupied(mut occupied) => {
                // 同一地址上的旧键已被回收，旧值随之丢弃
                if occupied.get().0.strong_count() == 0 {
                    occupied.insert((Arc::downgrade(&erased), make()));
                }
                occupied.into_mut()
            }
            Entry::Vacant(vacant) => vacant.insert((Arc::downgrade(&erased), make())),
        };
        &mut slot.1
    }

    /// 键仍然存活时返回对应的值
    pub fn get<K>(&self, key: &Arc<K>) -> Option<&V>
    where
        K: Any + Send + Sync,
    {
        let address = Arc::as_ptr(key).cast::<()>() as usize;
        self.entries
            .get(&address)
            .filter(|(weak, _)| weak.strong_count() > 0)
            .map(|(_, value)| value)
    }

    /// 移除键对应的条目
    pub fn remove<K>(&mut self, key: &Arc<K>) -> Option<V>
    where
        K: Any + Send + Sync,
    {
        let address = Arc::as_ptr(key).cast::<()>() as usize;
        self.entries.remove(&address).map(|(_, value)| value)
    }

    /// 存活键对应的值
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.entries
            .values()
            .filter(|(weak, _)| weak.strong_count() > 0)
            .map(|(_, value)| value)
    }

    /// 丢弃键已被回收的条目，返回清理数量
    pub fn compact(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, (weak, _)| weak.strong_count() > 0);
        let removed = before - self.entries.len();
        if removed > 0 {
            trace!("清理已回收的观察者: {}", removed);
        }
        removed
    }

    /// 条目数量，包括键已被回收的条目
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 是否没有任何条目
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 清空所有条目
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<V> Default for MildKeys<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// 弱引用元素列表
pub struct MildElements<T> {
    elements: Mutex<Vec<Weak<T>>>,
}

impl<T> MildElements<T> {
    /// 创建空列表
    pub fn new() -> Self {
        Self {
            elements: Mutex::new(Vec::new()),
        }
    }

    /// 追加元素，顺带清理已回收的元素
    pub fn push(&self, element: &Arc<T>) {
        let mut elements = self.elements.lock();
        elements.retain(|weak| weak.strong_count() > 0);
        elements.push(Arc::downgrade(element));
    }

    /// 所有存活的元素
    pub fn live(&self) -> Vec<Arc<T>> {
        self.elements
            .lock()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }

    /// 清理已回收的元素，返回清理数量
    pub fn compact(&self) -> usize {
        let mut elements = self.elements.lock();
        let before = elements.len();
        elements.retain(|weak| weak.strong_count() > 0);
        before - elements.len()
    }

    /// 元素数量，包括尚未清理的已回收元素
    pub fn len(&self) -> usize {
        self.elements.lock().len()
    }

    /// 是否没有任何元素
    pub fn is_empty(&self) -> bool {
        self.elements.lock().is_empty()
    }
}

impl<T> Default for MildElements<T> {
    fn default() -> Self {
        Self::new()
    }
}
