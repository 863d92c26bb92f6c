//! 模块绑定
//!
//! 一组固定绑定组成的发布者，对应一个可加载或卸载的模块。

use crate::binding::ComponentBinding;
use crate::ranking::DefaultRankingFunction;
use di_abstractions::{
    Binding, ImplicitResolver, ImplicitSource, Publisher, RankingFunction, Subscriber,
};
use infrastructure_common::{same_arc, DependencyResult, TypeKey};
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

struct ModuleBinding {
    binding: Arc<dyn Binding>,
    rank: Option<i32>,
}

/// 模块绑定发布者
pub struct ModuleBindings {
    name: String,
    ranking: Arc<dyn RankingFunction>,
    bindings: Vec<ModuleBinding>,
    implicit: Option<ImplicitSource>,
}

impl ModuleBindings {
    /// 创建模块构建器
    pub fn builder(name: impl Into<String>) -> ModuleBindingsBuilder {
        ModuleBindingsBuilder::new(name)
    }

    /// 模块名称
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 模块中的所有绑定
    pub fn bindings(&self) -> Vec<Arc<dyn Binding>> {
        self.bindings
            .iter()
            .map(|entry| Arc::clone(&entry.binding))
            .collect()
    }

    fn rank_of(&self, entry: &ModuleBinding) -> i32 {
        entry
            .rank
            .unwrap_or_else(|| self.ranking.rank(entry.binding.as_ref()))
    }

    fn owns(&self, binding: &Arc<dyn Binding>) -> bool {
        self.bindings
            .iter()
            .any(|entry| same_arc(&entry.binding, binding))
    }
}

impl Publisher for ModuleBindings {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber>) -> DependencyResult<()> {
        let type_key = subscriber.type_key().clone();
        let mut pushed = 0;
        for entry in &self.bindings {
            if entry.binding.type_key() == &type_key {
                subscriber.add(Arc::clone(&entry.binding), self.rank_of(entry));
                pushed += 1;
            }
        }
        debug!("模块 {} 推送 {} 个绑定: {}", self.name, pushed, type_key);
        Ok(())
    }

    fn unsubscribe(&self, subscriber: Arc<dyn Subscriber>) -> DependencyResult<()> {
        for binding in subscriber.bindings() {
            if self.owns(&binding) {
                subscriber.remove(&binding);
            }
        }
        debug!("模块 {} 撤回绑定: {}", self.name, subscriber.type_key());
        Ok(())
    }

    fn max_binding_rank(&self) -> i32 {
        self.bindings
            .iter()
            .filter_map(|entry| entry.rank)
            .fold(self.ranking.max_rank(), i32::max)
    }

    fn adapt(&self, target: TypeId) -> Option<Arc<dyn Any + Send + Sync>> {
        if target == TypeId::of::<ImplicitSource>() {
            self.implicit
                .clone()
                .map(|source| Arc::new(source) as Arc<dyn Any + Send + Sync>)
        } else {
            None
        }
    }
}

impl fmt::Debug for ModuleBindings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleBindings")
            .field("name", &self.name)
            .field("bindings", &self.bindings.len())
            .field("max_rank", &self.max_binding_rank())
            .field("implicit", &self.implicit.is_some())
            .finish()
    }
}

/// 模块构建器
pub struct ModuleBindingsBuilder {
    name: String,
    primary_rank: Option<i32>,
    ranking: Option<Arc<dyn RankingFunction>>,
    bindings: Vec<ModuleBinding>,
    implicit: Option<ImplicitSource>,
}

impl ModuleBindingsBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_rank: None,
            ranking: None,
            bindings: Vec::new(),
            implicit: None,
        }
    }

    /// 设置默认排名函数的主排名
    pub fn rank(mut self, primary_rank: i32) -> Self {
        self.primary_rank = Some(primary_rank);
        self
    }

    /// 未设置主排名时使用给定值
    pub fn rank_if_unset(mut self, primary_rank: i32) -> Self {
        self.primary_rank.get_or_insert(primary_rank);
        self
    }

    /// 使用自定义排名函数
    pub fn ranking(mut self, ranking: Arc<dyn RankingFunction>) -> Self {
        self.ranking = Some(ranking);
        self
    }

    /// 添加绑定，排名由排名函数决定
    pub fn bind(mut self, binding: Arc<dyn Binding>) -> Self {
        self.bindings.push(ModuleBinding {
            binding,
            rank: None,
        });
        self
    }

    /// 添加指定排名的绑定
    pub fn bind_with_rank(mut self, binding: Arc<dyn Binding>, rank: i32) -> Self {
        self.bindings.push(ModuleBinding {
            binding,
            rank: Some(rank),
        });
        self
    }

    /// 绑定现成实例
    pub fn bind_instance<T>(self, type_key: TypeKey, instance: Arc<T>) -> Self
    where
        T: Any + Send + Sync,
    {
        let binding = ComponentBinding::instance(type_key, instance).with_source(self.name.clone());
        self.bind(binding.into_binding())
    }

    /// 绑定命名实例
    pub fn bind_named_instance<T>(
        self,
        type_key: TypeKey,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> Self
    where
        T: Any + Send + Sync,
    {
        let binding = ComponentBinding::instance(type_key, instance)
            .named(name)
            .with_source(self.name.clone());
        self.bind(binding.into_binding())
    }

    /// 绑定工厂函数
    pub fn bind_factory<T, F>(self, type_key: TypeKey, factory: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn() -> DependencyResult<Arc<T>> + Send + Sync + 'static,
    {
        let binding = ComponentBinding::factory(type_key, factory).with_source(self.name.clone());
        self.bind(binding.into_binding())
    }

    /// 提供隐式绑定解析器
    pub fn implicit(mut self, resolver: Arc<dyn ImplicitResolver>) -> Self {
        self.implicit = Some(ImplicitSource::new(resolver));
        self
    }

    /// 构建模块
    pub fn build(self) -> DependencyResult<Arc<ModuleBindings>> {
        let ranking = match self.ranking {
            Some(ranking) => ranking,
            None => Arc::new(DefaultRankingFunction::new(self.primary_rank.unwrap_or(0))?),
        };

        info!("构建模块: {} ({} 个绑定)", self.name, self.bindings.len());
        Ok(Arc::new(ModuleBindings {
            name: self.name,
            ranking,
            bindings: self.bindings,
            implicit: self.implicit,
        }))
    }
}
