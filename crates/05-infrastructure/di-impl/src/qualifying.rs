//! 限定策略
//!
//! 根据查找键的限定条件决定一个绑定是否匹配，并给出匹配时使用的限定符。

use di_abstractions::Binding;
use infrastructure_common::{Key, KeyQualifier, Qualifier};

/// 限定策略
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualifyingStrategy {
    /// 匹配所有绑定
    Unrestricted,
    /// 匹配任意命名绑定（包括默认绑定）
    Named,
    /// 匹配带指定标记的绑定
    Marked,
    /// 精确匹配限定符
    Exact,
}

impl QualifyingStrategy {
    /// 为查找键选择策略
    pub fn for_key(key: &Key) -> Self {
        match key.qualifier() {
            KeyQualifier::Unrestricted => Self::Unrestricted,
            KeyQualifier::AnyNamed => Self::Named,
            KeyQualifier::Marker(_) => Self::Marked,
            KeyQualifier::Exact(_) => Self::Exact,
        }
    }

    /// 限定绑定，不匹配时返回 `None`
    pub fn qualify(self, key: &Key, binding: &dyn Binding) -> Option<Qualifier> {
        let qualifier = binding
            .qualifier()
            .cloned()
            .unwrap_or_else(Qualifier::default_name);

        match (self, key.qualifier()) {
            (Self::Unrestricted, _) => Some(qualifier),
            (Self::Named, _) => qualifier.name().is_some().then_some(qualifier),
            (Self::Marked, KeyQualifier::Marker(marker)) => {
                matches!(qualifier, Qualifier::Marker(found) if found == *marker).then_some(qualifier)
            }
            (Self::Exact, KeyQualifier::Exact(expected)) => {
                let matched = if expected.is_default() {
                    qualifier.is_default()
                } else {
                    qualifier == *expected
                };
                matched.then_some(qualifier)
            }
            _ => None,
        }
    }
}
