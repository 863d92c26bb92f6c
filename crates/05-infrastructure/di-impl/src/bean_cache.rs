//! 组件条目缓存
//!
//! 每个绑定只包装一次：同一个绑定并发调用 [`BeanCache::create`] 总是得到同一个条目。
//! 缓存状态只向前推进 `Empty -> Single -> Map`，只有最后一个条目被移除时才回到 `Empty`。
//! 前两次转换通过 CAS 完成，映射状态下的修改在互斥锁内进行。

use arc_swap::ArcSwap;
use di_abstractions::{BeanEntry, Binding, BindingId};
use infrastructure_common::{same_arc, Qualifier};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// 按绑定身份索引的条目映射
pub type BeanMap = HashMap<BindingId, Arc<BeanEntry>>;

/// 可变映射，`None` 表示该映射已经退役，持有者必须重新读取缓存状态
struct SharedMap {
    entries: Mutex<Option<BeanMap>>,
}

enum State {
    Empty,
    Single(Arc<BeanEntry>),
    Map(Arc<SharedMap>),
}

/// 组件条目缓存
pub struct BeanCache {
    state: ArcSwap<State>,
    mutated: AtomicBool,
    flush_lock: Mutex<()>,
    flushed: ArcSwap<BeanMap>,
}

impl BeanCache {
    /// 创建空缓存
    pub fn new() -> Self {
        Self {
            state: ArcSwap::from_pointee(State::Empty),
            mutated: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
            flushed: ArcSwap::from_pointee(BeanMap::new()),
        }
    }

    /// 为绑定创建条目；已存在时返回已有条目
    pub fn create(
        &self,
        qualifier: &Qualifier,
        binding: &Arc<dyn Binding>,
        rank: i32,
    ) -> Arc<BeanEntry> {
        let new_bean = || Arc::new(BeanEntry::new(qualifier.clone(), Arc::clone(binding), rank));

        loop {
            let current = self.state.load_full();
            match &*current {
                State::Empty => {
                    let bean = new_bean();
                    let next = Arc::new(State::Single(Arc::clone(&bean)));
                    let previous = self.state.compare_and_swap(&current, next);
                    if Arc::ptr_eq(&previous, &current) {
                        self.mutated.store(true, Ordering::Release);
                        return bean;
                    }
                }
                State::Single(existing) => {
                    if same_arc(existing.binding(), binding) {
                        return Arc::clone(existing);
                    }
                    let bean = new_bean();
                    let mut entries = BeanMap::with_capacity(2);
                    entries.insert(BindingId::of(existing.binding()), Arc::clone(existing));
                    entries.insert(BindingId::of(binding), Arc::clone(&bean));
                    let next = Arc::new(State::Map(Arc::new(SharedMap {
                        entries: Mutex::new(Some(entries)),
                    })));
                    let previous = self.state.compare_and_swap(&current, next);
                    if Arc::ptr_eq(&previous, &current) {
                        self.mutated.store(true, Ordering::Release);
                        return bean;
                    }
                }
                State::Map(shared) => {
                    let mut guard = shared.entries.lock();
                    if let Some(entries) = guard.as_mut() {
                        let bean = Arc::clone(
                            entries
                                .entry(BindingId::of(binding))
                                .or_insert_with(new_bean),
                        );
                        self.mutated.store(true, Ordering::Release);
                        return bean;
                    }
                }
            }
        }
    }

    /// 移除绑定对应的条目
    pub fn remove(&self, binding: &Arc<dyn Binding>) -> Option<Arc<BeanEntry>> {
        loop {
            let current = self.state.load_full();
            match &*current {
                State::Empty => return None,
                State::Single(existing) => {
                    if !same_arc(existing.binding(), binding) {
                        return None;
                    }
                    let previous = self
                        .state
                        .compare_and_swap(&current, Arc::new(State::Empty));
                    if Arc::ptr_eq(&previous, &current) {
                        self.mutated.store(true, Ordering::Release);
                        return Some(Arc::clone(existing));
                    }
                }
                State::Map(shared) => {
                    let mut guard = shared.entries.lock();
                    let Some(entries) = guard.as_mut() else {
                        continue;
                    };
                    let removed = entries.remove(&BindingId::of(binding));
                    if entries.is_empty() {
                        // 先退役再发布 Empty，等待锁的写者会重新读取状态
                        *guard = None;
                        self.state.store(Arc::new(State::Empty));
                    }
                    if removed.is_some() {
                        self.mutated.store(true, Ordering::Release);
                    }
                    return removed;
                }
            }
        }
    }

    /// 当前缓存的绑定
    pub fn bindings(&self) -> Vec<Arc<dyn Binding>> {
        match &**self.state.load() {
            State::Empty => Vec::new(),
            State::Single(bean) => vec![Arc::clone(bean.binding())],
            State::Map(shared) => shared
                .entries
                .lock()
                .as_ref()
                .map(|entries| {
                    entries
                        .values()
                        .map(|bean| Arc::clone(bean.binding()))
                        .collect()
                })
                .unwrap_or_default(),
        }
    }

    /// 当前条目数量
    pub fn len(&self) -> usize {
        match &**self.state.load() {
            State::Empty => 0,
            State::Single(_) => 1,
            State::Map(shared) => shared.entries.lock().as_ref().map_or(0, HashMap::len),
        }
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 只读视图，自上次刷新后没有修改时直接复用
    pub fn flush(&self) -> Arc<BeanMap> {
        if self.mutated.load(Ordering::Acquire) {
            let _guard = self.flush_lock.lock();
            if self.mutated.swap(false, Ordering::AcqRel) {
                self.flushed.store(Arc::new(self.read_view()));
            }
        }
        self.flushed.load_full()
    }

    fn read_view(&self) -> BeanMap {
        match &**self.state.load() {
            State::Empty => BeanMap::new(),
            State::Single(bean) => {
                let mut view = BeanMap::with_capacity(1);
                view.insert(BindingId::of(bean.binding()), Arc::clone(bean));
                view
            }
            State::Map(shared) => shared.entries.lock().clone().unwrap_or_default(),
        }
    }

    #[cfg(test)]
    fn representation(&self) -> &'static str {
        match &**self.state.load() {
            State::Empty => "empty",
            State::Single(_) => "single",
            State::Map(_) => "map",
        }
    }
}

impl Default for BeanCache {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for BeanCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BeanCache").field("len", &self.len()).finish()
    }
}
