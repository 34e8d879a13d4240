use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::MisconfiguredEntryPolicy;
use crate::error::ResolveError;
use crate::registry::{ConcreteType, TypeRegistry, DEFAULT_TYPE};
use crate::value::Node;

/// Decides which object type describes a value returned through an
/// interface-typed field.
pub trait TypeResolver: Send + Sync {
    fn resolve(&self, value: &Node) -> Option<ConcreteType>;
}

impl<F> TypeResolver for F
where
    F: Fn(&Node) -> Option<ConcreteType> + Send + Sync,
{
    fn resolve(&self, value: &Node) -> Option<ConcreteType> {
        self(value)
    }
}

/// Fallback resolver backed by the schema's [`TypeRegistry`].
///
/// Looks up the value's type name, then the [`DEFAULT_TYPE`] entry. Only
/// object entries are ever returned.
#[derive(Debug, Clone)]
pub struct RegistryTypeResolver {
    registry: Arc<TypeRegistry>,
    policy: MisconfiguredEntryPolicy,
}

impl RegistryTypeResolver {
    pub fn new(registry: Arc<TypeRegistry>) -> Self {
        Self {
            registry,
            policy: MisconfiguredEntryPolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: MisconfiguredEntryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn policy(&self) -> MisconfiguredEntryPolicy {
        self.policy
    }

    pub fn try_resolve(&self, value: &Node) -> Result<ConcreteType, ResolveError> {
        let key = value.type_name();

        if let Some(entry) = self.registry.get(key) {
            if let Some(concrete) = entry.as_concrete() {
                return Ok(concrete);
            }

            warn!(
                key,
                target_type = entry.name(),
                kind = ?entry.kind(),
                "registry entry is not a concrete object type"
            );
            if self.policy == MisconfiguredEntryPolicy::Reject {
                return Err(ResolveError::MisconfiguredEntry {
                    key: key.to_string(),
                });
            }
        }

        match self.registry.default_entry() {
            Some(entry) => match entry.as_concrete() {
                Some(concrete) => {
                    debug!(key, resolved = concrete.name(), "resolved through default entry");
                    Ok(concrete)
                }
                None => {
                    warn!(
                        key = DEFAULT_TYPE,
                        target_type = entry.name(),
                        "registry entry is not a concrete object type"
                    );
                    Err(ResolveError::MissingConcreteType {
                        type_name: key.to_string(),
                    })
                }
            },
            None => Err(ResolveError::MissingConcreteType {
                type_name: key.to_string(),
            }),
        }
    }
}

impl TypeResolver for RegistryTypeResolver {
    fn resolve(&self, value: &Node) -> Option<ConcreteType> {
        self.try_resolve(value).ok()
    }
}

/// How values of one interface are resolved.
#[derive(Clone)]
pub enum Resolution {
    /// Resolver declared on the interface. The registry is never consulted.
    Declared {
        interface: String,
        resolver: Arc<dyn TypeResolver>,
    },
    Registry(Arc<RegistryTypeResolver>),
}

impl Resolution {
    pub fn resolve(&self, value: &Node) -> Result<ConcreteType, ResolveError> {
        match self {
            Resolution::Declared {
                interface,
                resolver,
            } => resolver
                .resolve(value)
                .ok_or_else(|| ResolveError::Declined {
                    interface: interface.clone(),
                    type_name: value.type_name().to_string(),
                }),
            Resolution::Registry(registry) => registry.try_resolve(value),
        }
    }

    pub fn is_declared(&self) -> bool {
        matches!(self, Resolution::Declared { .. })
    }
}

impl fmt::Debug for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Declared { interface, .. } => f
                .debug_struct("Declared")
                .field("interface", interface)
                .finish_non_exhaustive(),
            Resolution::Registry(registry) => f.debug_tuple("Registry").field(registry).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RegisteredType;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registry(entries: &[(&str, RegisteredType)]) -> Arc<TypeRegistry> {
        Arc::new(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        )
    }

    fn base_entries() -> Vec<(&'static str, RegisteredType)> {
        vec![
            ("MyObject", RegisteredType::object("MyObject")),
            ("MyObject2", RegisteredType::object("MyObject2")),
            ("MyInterface", RegisteredType::interface("MyInterface")),
        ]
    }

    #[test]
    fn test_registered_kind_resolves_to_its_entry() {
        let resolver = RegistryTypeResolver::new(registry(&base_entries()));

        assert_eq!(
            resolver.resolve(&Node::new("MyObject")),
            Some(ConcreteType::new("MyObject"))
        );
        assert_eq!(
            resolver.resolve(&Node::new("MyObject2")),
            Some(ConcreteType::new("MyObject2"))
        );
    }

    #[test]
    fn test_unknown_kind_without_default_is_unresolved() {
        let resolver = RegistryTypeResolver::new(registry(&base_entries()));

        assert_eq!(resolver.resolve(&Node::new("Unknown")), None);
        assert_eq!(
            resolver.try_resolve(&Node::new("Unknown")),
            Err(ResolveError::MissingConcreteType {
                type_name: "Unknown".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_kind_uses_default_entry() {
        let mut entries = base_entries();
        entries.push((DEFAULT_TYPE, RegisteredType::object("MyObject")));
        let resolver = RegistryTypeResolver::new(registry(&entries));

        assert_eq!(
            resolver.resolve(&Node::new("Unknown")),
            Some(ConcreteType::new("MyObject"))
        );
    }

    #[test]
    fn test_interface_entry_falls_through_to_default() {
        let mut entries = base_entries();
        entries.push((DEFAULT_TYPE, RegisteredType::object("MyObject2")));
        let resolver = RegistryTypeResolver::new(registry(&entries));

        assert_eq!(
            resolver.resolve(&Node::new("MyInterface")),
            Some(ConcreteType::new("MyObject2"))
        );
    }

    #[test]
    fn test_interface_entry_without_default_is_unresolved() {
        let resolver = RegistryTypeResolver::new(registry(&base_entries()));
        assert_eq!(resolver.resolve(&Node::new("MyInterface")), None);
    }

    #[test]
    fn test_interface_entry_rejected_by_policy() {
        let mut entries = base_entries();
        entries.push((DEFAULT_TYPE, RegisteredType::object("MyObject")));
        let resolver = RegistryTypeResolver::new(registry(&entries))
            .with_policy(MisconfiguredEntryPolicy::Reject);

        assert_eq!(
            resolver.try_resolve(&Node::new("MyInterface")),
            Err(ResolveError::MisconfiguredEntry {
                key: "MyInterface".to_string()
            })
        );
        assert_eq!(
            resolver.resolve(&Node::new("Unknown")),
            Some(ConcreteType::new("MyObject"))
        );
    }

    #[test]
    fn test_interface_default_entry_is_never_returned() {
        let mut entries = base_entries();
        entries.push((DEFAULT_TYPE, RegisteredType::interface("MyInterface")));
        let resolver = RegistryTypeResolver::new(registry(&entries));

        assert_eq!(resolver.resolve(&Node::new("Unknown")), None);
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = RegistryTypeResolver::new(registry(&base_entries()));
        let value = Node::new("MyObject2").with("a", "a2");

        let first = resolver.try_resolve(&value);
        let second = resolver.try_resolve(&value);
        assert_eq!(first, second);
        assert_eq!(resolver.registry().len(), 3);
    }

    #[test]
    fn test_declared_resolver_takes_precedence() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let declared = Resolution::Declared {
            interface: "MyInterface".to_string(),
            resolver: Arc::new(move |_value: &Node| {
                counter.fetch_add(1, Ordering::SeqCst);
                Some(ConcreteType::new("MyObject2"))
            }),
        };

        let resolved = declared.resolve(&Node::new("MyObject")).unwrap();
        assert_eq!(resolved.name(), "MyObject2");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(declared.is_declared());
    }

    #[test]
    fn test_declared_resolver_returning_none_does_not_fall_back() {
        let declared = Resolution::Declared {
            interface: "MyInterface".to_string(),
            resolver: Arc::new(|_value: &Node| -> Option<ConcreteType> { None }),
        };

        assert_eq!(
            declared.resolve(&Node::new("MyObject")),
            Err(ResolveError::Declined {
                interface: "MyInterface".to_string(),
                type_name: "MyObject".to_string(),
            })
        );
    }
}
