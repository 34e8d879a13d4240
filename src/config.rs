use std::fmt;
use std::sync::Arc;

use crate::value::{Data, Node};

/// Strategy for reading a field's data from its parent value.
pub trait DataAccess: Send + Sync {
    fn fetch(&self, source: &Node, field: &str) -> Result<Data, String>;
}

impl<F> DataAccess for F
where
    F: Fn(&Node, &str) -> Result<Data, String> + Send + Sync,
{
    fn fetch(&self, source: &Node, field: &str) -> Result<Data, String> {
        self(source, field)
    }
}

/// Reads the field stored under the same name on the node. Missing fields are null.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyAccess;

impl DataAccess for PropertyAccess {
    fn fetch(&self, source: &Node, field: &str) -> Result<Data, String> {
        Ok(source.get(field).cloned().unwrap_or_default())
    }
}

/// What the registry resolver does when the entry found for a value is not a
/// concrete object type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MisconfiguredEntryPolicy {
    /// Continue with the `"default"` entry, as if the key were missing.
    #[default]
    FallThrough,
    /// Fail resolution for the value.
    Reject,
}

/// Defaults consulted while building a schema.
///
/// Passed to [`SchemaDefinition::build`](crate::SchemaDefinition::build);
/// each build reads the value it is handed, so concurrent builds with
/// different configurations do not interfere.
#[derive(Clone, Default)]
pub struct ResolutionConfig {
    default_generic_type: Option<String>,
    default_data_access: Option<Arc<dyn DataAccess>>,
    misconfigured_entry: MisconfiguredEntryPolicy,
}

impl ResolutionConfig {
    pub fn new(
        default_generic_type: Option<String>,
        default_data_access: Option<Arc<dyn DataAccess>>,
    ) -> Self {
        Self {
            default_generic_type,
            default_data_access,
            misconfigured_entry: MisconfiguredEntryPolicy::default(),
        }
    }

    /// Replaces both defaults. Nothing is validated until a build needs them.
    pub fn configure(
        &mut self,
        default_generic_type: Option<String>,
        default_data_access: Option<Arc<dyn DataAccess>>,
    ) {
        self.default_generic_type = default_generic_type;
        self.default_data_access = default_data_access;
    }

    pub fn with_default_generic_type(mut self, type_name: impl Into<String>) -> Self {
        self.default_generic_type = Some(type_name.into());
        self
    }

    pub fn with_default_data_access(mut self, access: impl DataAccess + 'static) -> Self {
        self.default_data_access = Some(Arc::new(access));
        self
    }

    pub fn with_misconfigured_entry(mut self, policy: MisconfiguredEntryPolicy) -> Self {
        self.misconfigured_entry = policy;
        self
    }

    pub fn default_generic_type(&self) -> Option<&str> {
        self.default_generic_type.as_deref()
    }

    pub fn default_data_access(&self) -> Option<&Arc<dyn DataAccess>> {
        self.default_data_access.as_ref()
    }

    pub fn misconfigured_entry(&self) -> MisconfiguredEntryPolicy {
        self.misconfigured_entry
    }
}

impl fmt::Debug for ResolutionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolutionConfig")
            .field("default_generic_type", &self.default_generic_type)
            .field(
                "default_data_access",
                &self.default_data_access.as_ref().map(|_| "<dyn DataAccess>"),
            )
            .field("misconfigured_entry", &self.misconfigured_entry)
            .finish()
    }
}
