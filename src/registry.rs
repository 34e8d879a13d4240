use indexmap::IndexMap;

/// Reserved registry key for the fallback concrete type.
pub const DEFAULT_TYPE: &str = "default";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Object,
    Interface,
}

/// Registry entry describing a schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredType {
    name: String,
    kind: TypeKind,
}

impl RegisteredType {
    pub fn object(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Object,
        }
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TypeKind::Interface,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> TypeKind {
        self.kind
    }

    pub fn is_concrete(&self) -> bool {
        self.kind == TypeKind::Object
    }

    /// Only object entries can become a resolution result.
    pub fn as_concrete(&self) -> Option<ConcreteType> {
        self.is_concrete().then(|| ConcreteType::new(self.name.clone()))
    }
}

/// The object type a runtime value resolves to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConcreteType(String);

impl ConcreteType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }

    pub fn into_name(self) -> String {
        self.0
    }
}

/// Name-keyed types collected while building a schema.
///
/// Keys are usually the type's own name, but aliases (including
/// [`DEFAULT_TYPE`]) may point at any registered type. Populated once at
/// build time and shared read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, RegisteredType>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(
        &mut self,
        key: impl Into<String>,
        ty: RegisteredType,
    ) -> Option<RegisteredType> {
        self.types.insert(key.into(), ty)
    }

    pub fn get(&self, key: &str) -> Option<&RegisteredType> {
        self.types.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.types.contains_key(key)
    }

    pub fn default_entry(&self) -> Option<&RegisteredType> {
        self.get(DEFAULT_TYPE)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RegisteredType)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, RegisteredType)> for TypeRegistry {
    fn from_iter<I: IntoIterator<Item = (String, RegisteredType)>>(iter: I) -> Self {
        Self {
            types: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interface_entry_is_never_concrete() {
        let iface = RegisteredType::interface("MyInterface");
        assert!(!iface.is_concrete());
        assert_eq!(iface.as_concrete(), None);

        let obj = RegisteredType::object("MyObject");
        assert_eq!(obj.as_concrete(), Some(ConcreteType::new("MyObject")));
    }

    #[test]
    fn test_alias_keeps_target_name() {
        let mut registry = TypeRegistry::new();
        registry.insert("MyObject", RegisteredType::object("MyObject"));
        registry.insert(DEFAULT_TYPE, RegisteredType::object("MyObject"));

        assert_eq!(registry.len(), 2);
        assert_eq!(registry.default_entry().map(|t| t.name()), Some("MyObject"));
    }

    #[test]
    fn test_insert_replaces_existing_entry() {
        let mut registry = TypeRegistry::new();
        assert!(registry.insert("A", RegisteredType::object("A")).is_none());
        let previous = registry.insert("A", RegisteredType::interface("A"));
        assert_eq!(previous, Some(RegisteredType::object("A")));
        assert_eq!(
            registry.get("A").map(|t| t.kind()),
            Some(TypeKind::Interface)
        );
    }
}
