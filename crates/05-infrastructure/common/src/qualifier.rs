//! 限定符与查找键

use crate::metadata::TypeKey;
use std::fmt;

/// 组件限定符
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Qualifier {
    /// 命名限定符
    Named(String),
    /// 标记限定符
    Marker(&'static str),
}

impl Qualifier {
    /// 默认名称
    pub const DEFAULT_NAME: &'static str = "default";

    /// 创建命名限定符
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }

    /// 默认限定符，未限定的绑定等价于它
    pub fn default_name() -> Self {
        Self::Named(Self::DEFAULT_NAME.to_string())
    }

    /// 是否为默认限定符（空名称也视为默认）
    pub fn is_default(&self) -> bool {
        matches!(self, Self::Named(name) if name.is_empty() || name == Self::DEFAULT_NAME)
    }

    /// 命名限定符的名称
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name),
            Self::Marker(_) => None,
        }
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Named(name) => write!(f, "@Named({name:?})"),
            Self::Marker(marker) => write!(f, "@{marker}"),
        }
    }
}

/// 查找键上的限定条件
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyQualifier {
    /// 不限定，匹配所有绑定
    Unrestricted,
    /// 匹配任意命名绑定
    AnyNamed,
    /// 匹配带指定标记的绑定
    Marker(&'static str),
    /// 精确匹配限定符
    Exact(Qualifier),
}

/// 查找键
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    type_key: TypeKey,
    qualifier: KeyQualifier,
}

impl Key {
    /// 具体类型的查找键
    pub fn of<T: 'static>() -> Self {
        Self::for_type(TypeKey::of::<T>())
    }

    /// trait object 的查找键
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        Self::for_type(TypeKey::of_trait::<T>())
    }

    /// 从类型描述创建查找键
    pub fn for_type(type_key: TypeKey) -> Self {
        Self {
            type_key,
            qualifier: KeyQualifier::Unrestricted,
        }
    }

    /// 限定为指定名称
    pub fn named(self, name: impl Into<String>) -> Self {
        self.with_qualifier(Qualifier::named(name))
    }

    /// 限定为指定标记
    pub fn marked(mut self, marker: &'static str) -> Self {
        self.qualifier = KeyQualifier::Marker(marker);
        self
    }

    /// 限定为任意命名绑定
    pub fn any_named(mut self) -> Self {
        self.qualifier = KeyQualifier::AnyNamed;
        self
    }

    /// 精确限定
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Self {
        self.qualifier = KeyQualifier::Exact(qualifier);
        self
    }

    /// 请求类型
    pub fn type_key(&self) -> &TypeKey {
        &self.type_key
    }

    /// 限定条件
    pub fn qualifier(&self) -> &KeyQualifier {
        &self.qualifier
    }

    /// 是否未限定（或仅限定为默认名称）
    pub fn is_unqualified(&self) -> bool {
        match &self.qualifier {
            KeyQualifier::Unrestricted => true,
            KeyQualifier::Exact(qualifier) => qualifier.is_default(),
            KeyQualifier::AnyNamed | KeyQualifier::Marker(_) => false,
        }
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            KeyQualifier::Unrestricted => write!(f, "Key[{}]", self.type_key),
            KeyQualifier::AnyNamed => write!(f, "Key[{}, @Named]", self.type_key),
            KeyQualifier::Marker(marker) => write!(f, "Key[{}, @{marker}]", self.type_key),
            KeyQualifier::Exact(qualifier) => write!(f, "Key[{}, {qualifier}]", self.type_key),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Service;

    #[test]
    fn test_default_qualifier() {
        assert!(Qualifier::default_name().is_default());
        assert!(Qualifier::named("").is_default());
        assert!(!Qualifier::named("primary").is_default());
        assert!(!Qualifier::Marker("Primary").is_default());
    }

    #[test]
    fn test_unqualified_keys() {
        assert!(Key::of::<Service>().is_unqualified());
        assert!(Key::of::<Service>().named("default").is_unqualified());
        assert!(!Key::of::<Service>().named("fast").is_unqualified());
        assert!(!Key::of::<Service>().any_named().is_unqualified());
    }
}
