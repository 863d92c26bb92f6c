//! 元数据定义
//!
//! 提供请求类型和类空间的元数据信息

use once_cell::sync::Lazy;
use std::any::TypeId;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

/// 根类空间
static ROOT_SPACE: Lazy<Space> = Lazy::new(|| Space {
    id: SpaceId(uuid::Uuid::nil()),
    name: "root".to_string(),
});

/// 类空间标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpaceId(uuid::Uuid);

impl SpaceId {
    /// 32 位身份哈希
    pub fn identity_hash(&self) -> u32 {
        let (high, low) = self.0.as_u64_pair();
        let folded = high ^ low;
        (folded >> 32) as u32 ^ folded as u32
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 类空间
///
/// 定义类型的模块或插件。同一个类型在不同的类空间中被视为不同的请求类型。
#[derive(Debug, Clone)]
pub struct Space {
    id: SpaceId,
    name: String,
}

impl Space {
    /// 创建新的类空间
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: SpaceId(uuid::Uuid::new_v4()),
            name: name.into(),
        }
    }

    /// 获取根类空间
    pub fn root() -> Self {
        ROOT_SPACE.clone()
    }

    /// 创建子类空间
    pub fn child(&self, name: impl Into<String>) -> Self {
        Self::new(format!("{}.{}", self.name, name.into()))
    }

    /// 类空间标识
    pub fn id(&self) -> SpaceId {
        self.id
    }

    /// 类空间名称
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for Space {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Space {}

/// 类型种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// 具体类型，可以隐式绑定
    Concrete,
    /// 抽象类型（trait object），只能显式绑定
    Abstract,
}

/// 请求类型描述
///
/// 相等性由类型ID和定义类空间决定，名称和种类只是描述信息。
#[derive(Debug, Clone)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
    kind: TypeKind,
    space: SpaceId,
}

impl TypeKey {
    /// 具体类型的类型描述
    pub fn of<T: 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Concrete,
            space: ROOT_SPACE.id,
        }
    }

    /// trait object 的类型描述
    pub fn of_trait<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: TypeKind::Abstract,
            space: ROOT_SPACE.id,
        }
    }

    /// 指定定义类空间
    pub fn in_space(mut self, space: &Space) -> Self {
        self.space = space.id();
        self
    }

    /// 类型ID
    pub fn type_id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径）
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// 类型种类
    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    /// 是否为具体类型
    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Concrete
    }

    /// 定义类空间
    pub fn space(&self) -> SpaceId {
        self.space
    }

    /// 类型的 32 位结构哈希
    pub fn structural_hash(&self) -> u32 {
        let mut hasher = DefaultHasher::new();
        self.id.hash(&mut hasher);
        let hash = hasher.finish();
        (hash >> 32) as u32 ^ hash as u32
    }

    /// 定义类空间的 32 位身份哈希
    pub fn space_hash(&self) -> u32 {
        self.space.identity_hash()
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.space == other.space
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
        self.space.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    trait Greeter {}
    struct English;

    #[test]
    fn test_type_key_kinds() {
        assert!(TypeKey::of::<English>().is_concrete());
        assert!(!TypeKey::of_trait::<dyn Greeter>().is_concrete());
        assert_eq!(TypeKey::of::<English>().short_name(), "English");
    }

    #[test]
    fn test_space_distinguishes_type_keys() {
        let plugin = Space::new("plugin");
        let root_key = TypeKey::of::<English>();
        let plugin_key = TypeKey::of::<English>().in_space(&plugin);

        assert_ne!(root_key, plugin_key);
        assert_eq!(root_key.structural_hash(), plugin_key.structural_hash());
        assert_eq!(plugin_key, TypeKey::of::<English>().in_space(&plugin));
    }

    #[test]
    fn test_root_space_is_shared() {
        assert_eq!(Space::root(), Space::root());
        assert_ne!(Space::root(), Space::root().child("module"));
    }
}
