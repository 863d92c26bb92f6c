//! 隐式绑定
//!
//! 没有任何显式绑定时，按排名依次询问发布者暴露的 [`ImplicitSource`]，
//! 为具体类型即时解析一个绑定。

use crate::binding::{ComponentBinding, ProviderFn};
use crate::ranked_bindings::PublisherRef;
use crate::ranked_sequence::RankedSequence;
use di_abstractions::{adapt, Binding, ImplicitResolver, ImplicitSource};
use infrastructure_common::{DependencyResult, TypeKey};
use parking_lot::Mutex;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

/// 定位器一侧的隐式绑定解析
#[derive(Clone)]
pub(crate) struct ImplicitBindings {
    publishers: Arc<RankedSequence<PublisherRef>>,
}

impl ImplicitBindings {
    pub(crate) fn new(publishers: Arc<RankedSequence<PublisherRef>>) -> Self {
        Self { publishers }
    }

    /// 返回第一个成功解析的绑定，失败的候选记录日志后跳过
    pub(crate) fn resolve(&self, type_key: &TypeKey) -> Option<Arc<dyn Binding>> {
        for publisher in self.publishers.iter() {
            let Some(source) = adapt::<ImplicitSource>(publisher.publisher().as_ref()) else {
                continue;
            };
            match source.resolve(type_key) {
                Ok(Some(binding)) => {
                    debug!("隐式解析成功: {} <- {:?}", type_key, publisher.publisher());
                    return Some(binding);
                }
                Ok(None) => {}
                Err(error) => {
                    warn!(
                        "隐式解析失败，跳过该候选: {} <- {:?}, 原因: {}",
                        type_key,
                        publisher.publisher(),
                        error
                    );
                }
            }
        }
        None
    }
}

impl fmt::Debug for ImplicitBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplicitBindings")
            .field("publishers", &self.publishers.len())
            .finish()
    }
}

/// 基于构造函数的隐式解析器
///
/// 登记具体类型的构造函数，首次解析时生成绑定并缓存，之后返回同一个绑定。
#[derive(Default)]
pub struct ConstructorResolver {
    constructors: HashMap<TypeId, (&'static str, ProviderFn)>,
    resolved: Mutex<HashMap<TypeId, Arc<dyn Binding>>>,
}

impl ConstructorResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记具体类型的构造函数
    pub fn register<T, F>(mut self, constructor: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> DependencyResult<T> + Send + Sync + 'static,
    {
        let erased: ProviderFn = Arc::new(move || {
            constructor().map(|instance| Arc::new(instance) as Arc<dyn Any + Send + Sync>)
        });
        self.constructors
            .insert(TypeId::of::<T>(), (std::any::type_name::<T>(), erased));
        self
    }

    /// 包装为隐式绑定来源
    pub fn into_source(self) -> ImplicitSource {
        ImplicitSource::new(Arc::new(self))
    }
}

impl ImplicitResolver for ConstructorResolver {
    fn resolve(&self, type_key: &TypeKey) -> DependencyResult<Option<Arc<dyn Binding>>> {
        if !type_key.is_concrete() {
            return Ok(None);
        }
        let Some((name, constructor)) = self.constructors.get(&type_key.type_id()) else {
            return Ok(None);
        };

        let mut resolved = self.resolved.lock();
        let binding = resolved.entry(type_key.type_id()).or_insert_with(|| {
            ComponentBinding::provider(type_key.clone(), *name, Arc::clone(constructor))
                .with_source(format!("implicit {name}"))
                .into_binding()
        });
        Ok(Some(Arc::clone(binding)))
    }
}

impl fmt::Debug for ConstructorResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<_> = self.constructors.values().map(|(name, _)| *name).collect();
        f.debug_struct("ConstructorResolver")
            .field("constructors", &names)
            .finish()
    }
}
