//! Maps explicitly described object and interface types onto an
//! `async-graphql` dynamic schema, resolving values of interface-typed fields
//! to concrete object types through a name-keyed registry.

pub mod builder;
pub mod config;
pub mod error;
mod extension;
pub mod registry;
pub mod resolver;
pub mod service;
pub mod value;

pub use async_graphql_value::ConstValue;
pub use builder::{FieldDef, FieldType, InterfaceDef, ObjectDef, SchemaDefinition};
pub use config::{DataAccess, MisconfiguredEntryPolicy, PropertyAccess, ResolutionConfig};
pub use error::{Error, ResolveError, Result, SchemaError};
pub use registry::{ConcreteType, RegisteredType, TypeKind, TypeRegistry, DEFAULT_TYPE};
pub use resolver::{RegistryTypeResolver, Resolution, TypeResolver};
pub use service::BuiltSchema;
pub use value::{Data, GraphQLType, Node};
