use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to build GraphQL schema: {message}")]
    BuildError { message: String },

    #[error("Type '{name}' is defined more than once")]
    DuplicateType { name: String },

    #[error("Type '{name}' referenced by '{referrer}' is not defined")]
    UnknownType { name: String, referrer: String },

    #[error("Unresolvable generic type: field '{type_name}.{field}' has no type hint and no default generic type is configured")]
    UnresolvableGenericType { type_name: String, field: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("No concrete type registered for '{type_name}' and no 'default' type is registered")]
    MissingConcreteType { type_name: String },

    #[error("Registry entry '{key}' is not a concrete object type")]
    MisconfiguredEntry { key: String },

    #[error("Type resolver for interface '{interface}' could not resolve '{type_name}'")]
    Declined { interface: String, type_name: String },

    #[error("Type '{type_name}' does not implement interface '{interface}'")]
    NotImplemented { type_name: String, interface: String },

    #[error("Null value in a non-null position")]
    UnexpectedNull,

    #[error("Expected {expected} value")]
    ShapeMismatch { expected: &'static str },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

pub type Result<T> = std::result::Result<T, Error>;
