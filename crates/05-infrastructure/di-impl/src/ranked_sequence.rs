//! 无锁排名序列
//!
//! 写时复制的有序集合，按排名降序排列，同排名按插入顺序排列。
//! 每次修改都基于当前快照构造新快照，并通过 CAS 原子替换；读者迭代私有快照，
//! 永远不会被写者阻塞。
//!
//! 每个元素带一个 64 位 uid：高 32 位是排名的按位取反，低 32 位是序列内的插入计数。
//! uid 升序即排名降序。插入计数在 2^32 次插入后回绕，回绕之后同排名元素的先后顺序
//! 不再保证。

use arc_swap::ArcSwap;
use infrastructure_common::Identity;
use std::sync::Arc;

/// 将排名和插入计数打包成 uid
#[inline]
fn rank_to_uid(rank: i32, counter: u32) -> i64 {
    (i64::from(!rank) << 32) | i64::from(counter)
}

/// 从 uid 还原排名
#[inline]
fn uid_to_rank(uid: i64) -> i32 {
    !((uid >> 32) as i32)
}

/// 插入位置，结果总在 `[0, len]` 之内
#[inline]
fn insertion_index(uids: &[i64], uid: i64) -> usize {
    uids.partition_point(|&existing| existing < uid)
}

/// 不可变快照
struct Content<T> {
    objs: Vec<T>,
    uids: Vec<i64>,
    counter: u32,
}

impl<T: Clone> Content<T> {
    fn empty() -> Self {
        Self {
            objs: Vec::new(),
            uids: Vec::new(),
            counter: 0,
        }
    }

    /// 插入元素后的新快照
    fn with(&self, element: T, rank: i32) -> Self {
        let uid = rank_to_uid(rank, self.counter);
        let index = insertion_index(&self.uids, uid);

        let mut objs = Vec::with_capacity(self.objs.len() + 1);
        objs.extend_from_slice(&self.objs[..index]);
        objs.push(element);
        objs.extend_from_slice(&self.objs[index..]);

        let mut uids = Vec::with_capacity(self.uids.len() + 1);
        uids.extend_from_slice(&self.uids[..index]);
        uids.push(uid);
        uids.extend_from_slice(&self.uids[index..]);

        Self {
            objs,
            uids,
            counter: self.counter.wrapping_add(1),
        }
    }

    /// 移除指定位置元素后的新快照
    fn without(&self, index: usize) -> Self {
        let mut objs = self.objs.clone();
        objs.remove(index);
        let mut uids = self.uids.clone();
        uids.remove(index);

        Self {
            objs,
            uids,
            counter: self.counter,
        }
    }
}

/// 排名序列
pub struct RankedSequence<T> {
    content: Arc<ArcSwap<Content<T>>>,
}

impl<T: Clone> RankedSequence<T> {
    /// 创建空序列
    pub fn new() -> Self {
        Self {
            content: Arc::new(ArcSwap::from_pointee(Content::empty())),
        }
    }

    /// 复制另一个序列的当前快照
    pub fn copy_of(other: &Self) -> Self {
        Self {
            content: Arc::new(ArcSwap::new(other.content.load_full())),
        }
    }

    /// 插入元素，不阻塞读者
    pub fn insert(&self, element: T, rank: i32) {
        self.content
            .rcu(|current| current.with(element.clone(), rank));
    }

    /// 按值相等移除第一个匹配的元素
    pub fn remove(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        self.remove_first(|candidate| candidate == element)
    }

    /// 按引用身份移除第一个匹配的元素
    pub fn remove_this(&self, element: &T) -> bool
    where
        T: Identity,
    {
        self.remove_first(|candidate| candidate.same_as(element))
    }

    fn remove_first(&self, matches: impl Fn(&T) -> bool) -> bool {
        loop {
            let current = self.content.load_full();
            let Some(index) = current.objs.iter().position(&matches) else {
                return false;
            };

            let next = Arc::new(current.without(index));
            let previous = self.content.compare_and_swap(&current, next);
            if Arc::ptr_eq(&previous, &current) {
                return true;
            }
        }
    }

    /// 是否包含值相等的元素
    pub fn contains(&self, element: &T) -> bool
    where
        T: PartialEq,
    {
        self.content.load().objs.contains(element)
    }

    /// 是否包含同一个元素
    pub fn contains_this(&self, element: &T) -> bool
    where
        T: Identity,
    {
        self.find(|candidate| candidate.same_as(element)).is_some()
    }

    /// 查找第一个满足条件的元素
    pub fn find(&self, matches: impl Fn(&T) -> bool) -> Option<T> {
        self.content
            .load()
            .objs
            .iter()
            .find(|candidate| matches(candidate))
            .cloned()
    }

    /// 当前排名最高的元素
    pub fn peek(&self) -> Option<T> {
        self.content.load().objs.first().cloned()
    }

    /// 当前有序快照
    pub fn snapshot(&self) -> Vec<T> {
        self.content.load().objs.clone()
    }

    /// 当前有序快照，附带排名
    pub fn ranked_snapshot(&self) -> Vec<(T, i32)> {
        let content = self.content.load();
        content
            .objs
            .iter()
            .cloned()
            .zip(content.uids.iter().map(|&uid| uid_to_rank(uid)))
            .collect()
    }

    /// 元素数量
    pub fn len(&self) -> usize {
        self.content.load().objs.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.content.load().objs.is_empty()
    }

    /// 清空序列
    pub fn clear(&self) {
        self.content.store(Arc::new(Content::empty()));
    }

    /// 容忍并发修改的迭代器
    pub fn iter(&self) -> RankedIter<T> {
        RankedIter::new(Arc::clone(&self.content))
    }
}

impl<T: Clone> Default for RankedSequence<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> IntoIterator for &RankedSequence<T> {
    type Item = T;
    type IntoIter = RankedIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Clone + std::fmt::Debug> std::fmt::Debug for RankedSequence<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.ranked_snapshot()).finish()
    }
}

/// 排名序列迭代器
///
/// 持有最近一次看到的快照；快照被替换后，通过在新快照中查找最后返回的 uid 重新定位。
/// 当前位置之前的修改不可见，之后的修改从生效点开始可见，任何元素都不会被返回两次。
pub struct RankedIter<T> {
    source: Arc<ArcSwap<Content<T>>>,
    content: Arc<Content<T>>,
    last_uid: Option<i64>,
    index: usize,
}

impl<T: Clone> RankedIter<T> {
    fn new(source: Arc<ArcSwap<Content<T>>>) -> Self {
        let content = source.load_full();
        Self {
            source,
            content,
            last_uid: None,
            index: 0,
        }
    }

    /// 同步到最新快照
    fn refresh(&mut self) {
        let latest = self.source.load_full();
        if !Arc::ptr_eq(&latest, &self.content) {
            self.index = match self.last_uid {
                Some(last) => latest.uids.partition_point(|&uid| uid <= last),
                None => 0,
            };
            self.content = latest;
        }
    }

    /// 是否还有下一个元素
    pub fn has_next(&mut self) -> bool {
        self.refresh();
        self.index < self.content.objs.len()
    }

    /// 下一个元素的排名是否严格高于给定排名
    pub fn has_next_above(&mut self, rank: i32) -> bool {
        self.has_next() && self.content.uids[self.index] < rank_to_uid(rank, 0)
    }

    /// 下一个元素的排名
    pub fn peek_rank(&mut self) -> Option<i32> {
        if self.has_next() {
            Some(uid_to_rank(self.content.uids[self.index]))
        } else {
            None
        }
    }

    /// 返回下一个元素及其排名
    pub fn next_ranked(&mut self) -> Option<(T, i32)> {
        if !self.has_next() {
            return None;
        }
        let uid = self.content.uids[self.index];
        let element = self.content.objs[self.index].clone();
        self.last_uid = Some(uid);
        self.index += 1;
        Some((element, uid_to_rank(uid)))
    }
}

impl<T: Clone> Iterator for RankedIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.next_ranked().map(|(element, _)| element)
    }
}
