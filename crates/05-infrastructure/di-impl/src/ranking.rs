//! 默认排名策略

use di_abstractions::{Binding, RankingFunction};
use infrastructure_common::{DependencyError, DependencyResult};

/// 默认排名函数
///
/// 默认（未限定或限定为 `default`）绑定获得主排名 `primary_rank`，其余绑定获得
/// `primary_rank + i32::MIN`，落在负数区间。所以任何发布者的默认实现都排在所有
/// 非默认实现之前。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultRankingFunction {
    primary_rank: i32,
}

impl DefaultRankingFunction {
    /// 创建排名函数，主排名必须非负
    pub fn new(primary_rank: i32) -> DependencyResult<Self> {
        if primary_rank < 0 {
            return Err(DependencyError::InvalidRank { rank: primary_rank });
        }
        Ok(Self { primary_rank })
    }

    /// 主排名
    pub fn primary_rank(&self) -> i32 {
        self.primary_rank
    }
}

impl Default for DefaultRankingFunction {
    fn default() -> Self {
        Self { primary_rank: 0 }
    }
}

impl RankingFunction for DefaultRankingFunction {
    fn max_rank(&self) -> i32 {
        self.primary_rank
    }

    fn rank(&self, binding: &dyn Binding) -> i32 {
        match binding.qualifier() {
            None => self.primary_rank,
            Some(qualifier) if qualifier.is_default() => self.primary_rank,
            Some(_) => self.primary_rank + i32::MIN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::ComponentBinding;
    use infrastructure_common::{Qualifier, TypeKey};
    use std::sync::Arc;

    fn binding(qualifier: Option<Qualifier>) -> ComponentBinding {
        let binding = ComponentBinding::instance(TypeKey::of::<String>(), Arc::new(String::new()));
        match qualifier {
            Some(qualifier) => binding.with_qualifier(qualifier),
            None => binding,
        }
    }

    #[test]
    fn test_default_bindings_rank_above_qualified() {
        let ranking = DefaultRankingFunction::new(3).unwrap();

        assert_eq!(ranking.max_rank(), 3);
        assert_eq!(ranking.rank(&binding(None)), 3);
        assert_eq!(ranking.rank(&binding(Some(Qualifier::default_name()))), 3);
        assert_eq!(ranking.rank(&binding(Some(Qualifier::named("")))), 3);
        assert_eq!(
            ranking.rank(&binding(Some(Qualifier::named("backup")))),
            3 + i32::MIN
        );
    }

    #[test]
    fn test_qualified_ranks_preserve_publisher_order() {
        let low = DefaultRankingFunction::new(0).unwrap();
        let high = DefaultRankingFunction::new(i32::MAX).unwrap();
        let named = binding(Some(Qualifier::Marker("Primary")));

        assert_eq!(low.rank(&named), i32::MIN);
        assert_eq!(high.rank(&named), -1);
        assert!(high.rank(&named) < low.rank(&binding(None)));
    }

    #[test]
    fn test_negative_primary_rank_rejected() {
        let result = DefaultRankingFunction::new(-1);
        assert!(matches!(result, Err(DependencyError::InvalidRank { rank: -1 })));
        assert_eq!(DefaultRankingFunction::default().primary_rank(), 0);
    }
}
