//! 查找结果
//!
//! [`LocatedBeans`] 是一个可重复迭代的视图：每次迭代都反映发布者的最新状态，
//! 按排名降序延迟产出组件条目。同一个视图内，同一个绑定始终对应同一个条目。

use crate::bean_cache::{BeanCache, BeanMap};
use crate::implicit::ImplicitBindings;
use crate::qualifying::QualifyingStrategy;
use crate::ranked_bindings::{RankedBindings, RankedBindingsIter};
use di_abstractions::{BeanEntry, BindingId};
use infrastructure_common::{Key, Qualifier};
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// 查找结果
pub struct LocatedBeans {
    key: Key,
    strategy: QualifyingStrategy,
    explicit: Arc<RankedBindings>,
    beans: Arc<BeanCache>,
    implicit: Option<ImplicitBindings>,
}

impl LocatedBeans {
    pub(crate) fn new(
        key: Key,
        explicit: Arc<RankedBindings>,
        implicit: Option<ImplicitBindings>,
    ) -> Self {
        let strategy = QualifyingStrategy::for_key(&key);
        let beans = explicit.new_bean_cache();
        Self {
            key,
            strategy,
            explicit,
            beans,
            implicit,
        }
    }

    /// 查找键
    pub fn key(&self) -> &Key {
        &self.key
    }

    /// 按排名迭代匹配的组件条目
    pub fn iter(&self) -> LocatedIter {
        LocatedIter {
            key: self.key.clone(),
            strategy: self.strategy,
            bindings: self.explicit.iter(),
            cached: self.beans.flush(),
            beans: Arc::clone(&self.beans),
            implicit: self.implicit.clone(),
            found: false,
        }
    }

    /// 排名最高的条目
    pub fn first(&self) -> Option<Arc<BeanEntry>> {
        self.iter().next()
    }

    /// 是否没有匹配的条目
    pub fn is_empty(&self) -> bool {
        self.first().is_none()
    }
}

impl IntoIterator for LocatedBeans {
    type Item = Arc<BeanEntry>;
    type IntoIter = LocatedIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for &LocatedBeans {
    type Item = Arc<BeanEntry>;
    type IntoIter = LocatedIter;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Debug for LocatedBeans {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocatedBeans")
            .field("key", &self.key)
            .field("strategy", &self.strategy)
            .field("cached", &self.beans.len())
            .finish()
    }
}

/// 查找结果迭代器
pub struct LocatedIter {
    key: Key,
    strategy: QualifyingStrategy,
    bindings: RankedBindingsIter,
    /// 迭代开始时的只读视图，未命中时才创建条目
    cached: Arc<BeanMap>,
    beans: Arc<BeanCache>,
    implicit: Option<ImplicitBindings>,
    found: bool,
}

impl Iterator for LocatedIter {
    type Item = Arc<BeanEntry>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((binding, rank)) = self.bindings.next_ranked() {
            let Some(qualifier) = self.strategy.qualify(&self.key, binding.as_ref()) else {
                continue;
            };
            self.found = true;

            if let Some(bean) = self.cached.get(&BindingId::of(&binding)) {
                return Some(Arc::clone(bean));
            }
            return Some(self.beans.create(&qualifier, &binding, rank));
        }

        // 没有任何显式条目时才尝试隐式绑定，并且只尝试一次
        if self.found {
            return None;
        }
        let implicit = self.implicit.take()?;
        let binding = implicit.resolve(self.key.type_key())?;
        trace!("使用隐式绑定: {}", self.key);
        Some(
            self.beans
                .create(&Qualifier::default_name(), &binding, i32::MIN),
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::locator::DefaultBeanLocator;
    use crate::module::ModuleBindings;
    use di_abstractions::{BeanLocator, MutableBeanLocator};
    use infrastructure_common::{Key, TypeKey};
    use std::sync::Arc;

    fn strings(name: &str, rank: i32, count: usize) -> Arc<ModuleBindings> {
        (0..count)
            .fold(ModuleBindings::builder(name).rank(rank), |builder, i| {
                builder.bind_named_instance(
                    TypeKey::of::<String>(),
                    format!("{name}-{i}"),
                    Arc::new(format!("{name}-{i}")),
                )
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_repeated_passes_share_beans() {
        let locator = DefaultBeanLocator::new();
        locator.add(strings("bulk", 0, 100)).unwrap();
        let located = locator.locate(&Key::of::<String>());

        let first: Vec<_> = located.iter().collect();
        let second: Vec<_> = located.iter().collect();

        assert_eq!(first.len(), 100);
        assert_eq!(located.beans.len(), 100);
        assert!(first
            .iter()
            .zip(&second)
            .all(|(a, b)| Arc::ptr_eq(a, b)));
    }

    #[test]
    fn test_bindings_added_mid_iteration_are_cached() {
        let locator = DefaultBeanLocator::new();
        locator.add(strings("early", 5, 2)).unwrap();
        let located = locator.locate(&Key::of::<String>());

        let mut iter = located.iter();
        let head = iter.next().unwrap();
        locator.add(strings("late", 1, 1)).unwrap();
        let rest: Vec<_> = iter.collect();

        assert_eq!(rest.len(), 2);
        let late = Arc::clone(&rest[1]);
        assert_eq!(*late.value_as::<String>().unwrap(), "late-0");

        let again: Vec<_> = located.iter().collect();
        assert!(Arc::ptr_eq(&again[0], &head));
        assert!(Arc::ptr_eq(&again[2], &late));
    }
}
