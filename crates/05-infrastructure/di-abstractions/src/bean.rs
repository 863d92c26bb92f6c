//! 组件条目
//!
//! 一个已限定的绑定：限定符、绑定、排名，以及延迟提供的组件实例。

use crate::binding::Binding;
use infrastructure_common::{DependencyError, DependencyResult, Qualifier};
use once_cell::sync::OnceCell;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// 组件条目
pub struct BeanEntry {
    qualifier: Qualifier,
    binding: Arc<dyn Binding>,
    rank: i32,
    value: OnceCell<Arc<dyn Any + Send + Sync>>,
}

impl BeanEntry {
    /// 创建新的组件条目
    pub fn new(qualifier: Qualifier, binding: Arc<dyn Binding>, rank: i32) -> Self {
        Self {
            qualifier,
            binding,
            rank,
            value: OnceCell::new(),
        }
    }

    /// 限定符
    pub fn qualifier(&self) -> &Qualifier {
        &self.qualifier
    }

    /// 底层绑定
    pub fn binding(&self) -> &Arc<dyn Binding> {
        &self.binding
    }

    /// 排名
    pub fn rank(&self) -> i32 {
        self.rank
    }

    /// 组件实例，首次访问时由绑定提供，之后返回同一个实例
    pub fn value(&self) -> DependencyResult<Arc<dyn Any + Send + Sync>> {
        self.value
            .get_or_try_init(|| self.binding.provide())
            .map(Arc::clone)
    }

    /// 以具体类型获取组件实例
    pub fn value_as<T: Any + Send + Sync>(&self) -> DependencyResult<Arc<T>> {
        self.value()?
            .downcast::<T>()
            .map_err(|_| DependencyError::TypeMismatch {
                expected: std::any::type_name::<T>().to_string(),
                actual: self
                    .binding
                    .implementation()
                    .unwrap_or_else(|| self.binding.type_key().name())
                    .to_string(),
            })
    }

    /// 组件实例是否已经提供
    pub fn is_provided(&self) -> bool {
        self.value.get().is_some()
    }

    /// 实现类型名称
    pub fn implementation(&self) -> Option<&str> {
        self.binding.implementation()
    }

    /// 绑定来源描述
    pub fn source(&self) -> Option<&str> {
        self.binding.source()
    }

    /// 条目描述
    pub fn description(&self) -> String {
        match self.implementation() {
            Some(implementation) => format!("{} {}", self.qualifier, implementation),
            None => format!("{} {}", self.qualifier, self.binding.type_key()),
        }
    }
}

impl fmt::Debug for BeanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanEntry")
            .field("qualifier", &self.qualifier)
            .field("binding", &self.binding)
            .field("rank", &self.rank)
            .field("provided", &self.is_provided())
            .finish()
    }
}

impl fmt::Display for BeanEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (rank {})", self.description(), self.rank)
    }
}
