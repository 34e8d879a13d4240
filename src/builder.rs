use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use async_graphql::dynamic::{
    self, Field, FieldFuture, FieldValue, InterfaceField, ResolverContext, TypeRef,
};
use async_graphql::PathSegment;
use async_graphql_value::ConstValue;
use tracing::{debug, warn};

use crate::config::{DataAccess, PropertyAccess, ResolutionConfig};
use crate::error::{ResolveError, SchemaError};
use crate::extension::{NullItems, NulledItems};
use crate::registry::{ConcreteType, RegisteredType, TypeRegistry, DEFAULT_TYPE};
use crate::resolver::{RegistryTypeResolver, Resolution, TypeResolver};
use crate::service::{BuiltSchema, RootValue};
use crate::value::{Data, GraphQLType, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Named(String),
    List(Box<FieldType>),
    NonNull(Box<FieldType>),
    /// A type parameter. The hint, when present, names the type to use.
    Generic(Option<String>),
}

impl FieldType {
    pub fn named(name: impl Into<String>) -> Self {
        FieldType::Named(name.into())
    }

    pub fn list(inner: FieldType) -> Self {
        FieldType::List(Box::new(inner))
    }

    pub fn non_null(inner: FieldType) -> Self {
        FieldType::NonNull(Box::new(inner))
    }

    pub fn generic() -> Self {
        FieldType::Generic(None)
    }

    pub fn generic_hint(name: impl Into<String>) -> Self {
        FieldType::Generic(Some(name.into()))
    }
}

#[derive(Clone)]
pub struct FieldDef {
    name: String,
    ty: FieldType,
    access: Option<Arc<dyn DataAccess>>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            access: None,
        }
    }

    /// Overrides the configured data-access strategy for this field.
    pub fn with_access(mut self, access: impl DataAccess + 'static) -> Self {
        self.access = Some(Arc::new(access));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ty(&self) -> &FieldType {
        &self.ty
    }
}

impl fmt::Debug for FieldDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDef")
            .field("name", &self.name)
            .field("ty", &self.ty)
            .field("custom_access", &self.access.is_some())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct ObjectDef {
    name: String,
    fields: Vec<FieldDef>,
    implements: Vec<String>,
}

impl ObjectDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            implements: Vec::new(),
        }
    }

    pub fn of<T: GraphQLType>() -> Self {
        Self::new(T::TYPE_NAME)
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn implement(mut self, interface: impl Into<String>) -> Self {
        self.implements.push(interface.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

#[derive(Clone)]
pub struct InterfaceDef {
    name: String,
    fields: Vec<FieldDef>,
    resolver: Option<Arc<dyn TypeResolver>>,
}

impl InterfaceDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            resolver: None,
        }
    }

    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Declares the resolver for this interface, replacing the registry fallback.
    ///
    /// A resolved type that does not implement the interface is reported as a
    /// field error.
    pub fn resolver(mut self, resolver: impl TypeResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for InterfaceDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InterfaceDef")
            .field("name", &self.name)
            .field("fields", &self.fields)
            .field("declared_resolver", &self.resolver.is_some())
            .finish()
    }
}

/// Explicit description of the types making up a schema.
#[derive(Debug, Clone)]
pub struct SchemaDefinition {
    query: String,
    objects: Vec<ObjectDef>,
    interfaces: Vec<InterfaceDef>,
    aliases: Vec<(String, String)>,
}

impl SchemaDefinition {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            objects: Vec::new(),
            interfaces: Vec::new(),
            aliases: Vec::new(),
        }
    }

    pub fn object(mut self, object: ObjectDef) -> Self {
        self.objects.push(object);
        self
    }

    pub fn interface(mut self, interface: InterfaceDef) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Registers `target` under an additional registry key.
    pub fn alias(mut self, key: impl Into<String>, target: impl Into<String>) -> Self {
        self.aliases.push((key.into(), target.into()));
        self
    }

    /// Sets the type unresolved values fall back to.
    ///
    /// The target must implement every interface resolved through the
    /// registry; otherwise values falling back to it fail with
    /// [`ResolveError::NotImplemented`].
    pub fn default_type(self, target: impl Into<String>) -> Self {
        self.alias(DEFAULT_TYPE, target)
    }

    pub fn registry(&self) -> Result<TypeRegistry, SchemaError> {
        let mut registry = TypeRegistry::new();

        let declared = self
            .interfaces
            .iter()
            .map(|i| RegisteredType::interface(&i.name))
            .chain(self.objects.iter().map(|o| RegisteredType::object(&o.name)));

        for ty in declared {
            let name = ty.name().to_string();
            if registry.insert(name.clone(), ty).is_some() {
                return Err(SchemaError::DuplicateType { name });
            }
        }

        for (key, target) in &self.aliases {
            let ty = registry
                .get(target)
                .cloned()
                .ok_or_else(|| SchemaError::UnknownType {
                    name: target.clone(),
                    referrer: key.clone(),
                })?;
            if let Some(previous) = registry.insert(key.clone(), ty) {
                debug!(
                    key = %key,
                    previous = previous.name(),
                    alias_of = %target,
                    "alias replaced registry entry"
                );
            }
        }

        Ok(registry)
    }

    pub fn build(self, config: &ResolutionConfig) -> Result<BuiltSchema, SchemaError> {
        let registry = Arc::new(self.registry()?);
        let fallback = Arc::new(
            RegistryTypeResolver::new(registry.clone()).with_policy(config.misconfigured_entry()),
        );

        let dispatch: HashMap<&str, Arc<Dispatch>> = self
            .interfaces
            .iter()
            .map(|i| {
                let resolution = match &i.resolver {
                    Some(resolver) => Resolution::Declared {
                        interface: i.name.clone(),
                        resolver: resolver.clone(),
                    },
                    None => Resolution::Registry(fallback.clone()),
                };
                let implementors = self
                    .objects
                    .iter()
                    .filter(|o| o.implements.contains(&i.name))
                    .map(|o| o.name.clone())
                    .collect();
                let dispatch = Dispatch {
                    interface: i.name.clone(),
                    resolution,
                    implementors,
                };
                (i.name.as_str(), Arc::new(dispatch))
            })
            .collect();

        let known = self
            .objects
            .iter()
            .map(|o| o.name.as_str())
            .chain(self.interfaces.iter().map(|i| i.name.as_str()))
            .chain(BUILTIN_SCALARS.iter().copied())
            .collect();

        let assembly = Assembly {
            dispatch: &dispatch,
            known,
            config,
        };

        let mut builder = dynamic::Schema::build(&self.query, None, None).extension(NullItems);

        for def in &self.interfaces {
            let mut interface = dynamic::Interface::new(&def.name);
            for field in &def.fields {
                let (type_ref, _) = assembly.type_ref(&def.name, field, &field.ty)?;
                interface = interface.field(InterfaceField::new(&field.name, type_ref));
            }
            builder = builder.register(interface);
        }

        for def in &self.objects {
            let mut object = dynamic::Object::new(&def.name);
            for interface in &def.implements {
                object = object.implement(interface);
            }
            for field in self.object_fields(def) {
                object = object.field(assembly.field(&def.name, field)?);
            }
            builder = builder.register(object);
        }

        let graphql_schema = builder.finish().map_err(|e| SchemaError::BuildError {
            message: e.to_string(),
        })?;

        debug!(query = %self.query, types = registry.len(), "schema built");

        Ok(BuiltSchema::new(graphql_schema, registry))
    }

    /// Own fields first, then interface fields the object does not redeclare.
    fn object_fields<'a>(&'a self, object: &'a ObjectDef) -> Vec<&'a FieldDef> {
        let mut fields: Vec<&FieldDef> = object.fields.iter().collect();

        let interfaces = object
            .implements
            .iter()
            .filter_map(|name| self.interfaces.iter().find(|i| &i.name == name));

        for interface in interfaces {
            for field in &interface.fields {
                if !fields.iter().any(|f| f.name == field.name) {
                    fields.push(field);
                }
            }
        }

        fields
    }
}

const BUILTIN_SCALARS: [&str; 5] = ["String", "Int", "Float", "Boolean", "ID"];

/// How values returned through one interface are resolved, and which objects
/// may stand in for it.
struct Dispatch {
    interface: String,
    resolution: Resolution,
    implementors: HashSet<String>,
}

impl Dispatch {
    fn resolve(&self, value: &Node) -> Result<ConcreteType, ResolveError> {
        let concrete = self.resolution.resolve(value)?;
        if !self.implementors.contains(concrete.name()) {
            return Err(ResolveError::NotImplemented {
                type_name: concrete.name().to_string(),
                interface: self.interface.clone(),
            });
        }
        Ok(concrete)
    }
}

struct Assembly<'a> {
    dispatch: &'a HashMap<&'a str, Arc<Dispatch>>,
    known: HashSet<&'a str>,
    config: &'a ResolutionConfig,
}

impl Assembly<'_> {
    fn type_ref(
        &self,
        owner: &str,
        field: &FieldDef,
        ty: &FieldType,
    ) -> Result<(TypeRef, Option<Arc<Dispatch>>), SchemaError> {
        match ty {
            FieldType::Named(name) => Ok((TypeRef::named(name), self.dispatch(name))),
            FieldType::List(inner) => {
                let (inner, dispatch) = self.type_ref(owner, field, inner)?;
                Ok((TypeRef::List(Box::new(inner)), dispatch))
            }
            FieldType::NonNull(inner) => {
                let (inner, dispatch) = self.type_ref(owner, field, inner)?;
                Ok((TypeRef::NonNull(Box::new(inner)), dispatch))
            }
            FieldType::Generic(hint) => {
                let name = hint
                    .as_deref()
                    .or_else(|| self.config.default_generic_type())
                    .ok_or_else(|| SchemaError::UnresolvableGenericType {
                        type_name: owner.to_string(),
                        field: field.name.clone(),
                    })?;
                if !self.known.contains(name) {
                    return Err(SchemaError::UnknownType {
                        name: name.to_string(),
                        referrer: format!("{}.{}", owner, field.name),
                    });
                }
                debug!(owner, field = %field.name, resolved = name, "generic field type");
                Ok((TypeRef::named(name), self.dispatch(name)))
            }
        }
    }

    fn dispatch(&self, type_name: &str) -> Option<Arc<Dispatch>> {
        self.dispatch.get(type_name).cloned()
    }

    fn field(&self, owner: &str, def: &FieldDef) -> Result<Field, SchemaError> {
        let (type_ref, dispatch) = self.type_ref(owner, def, &def.ty)?;
        let access: Arc<dyn DataAccess> = def
            .access
            .clone()
            .or_else(|| self.config.default_data_access().cloned())
            .unwrap_or_else(|| Arc::new(PropertyAccess));
        let name = def.name.clone();
        let shape = Arc::new(type_ref.clone());

        Ok(Field::new(def.name.clone(), type_ref, move |ctx| {
            let access = access.clone();
            let name = name.clone();
            let dispatch = dispatch.clone();
            let shape = shape.clone();

            FieldFuture::new(async move {
                let parent = parent_node(&ctx)?;
                let mut shaper = Shaper::new(dispatch.as_deref());
                let shaped = shaper.field(access.fetch(parent, &name), &shape);
                shaper.finish(&ctx)?;
                shaped.map_err(|failure| failure.error)
            })
        }))
    }
}

fn parent_node<'a>(ctx: &ResolverContext<'a>) -> async_graphql::Result<&'a Node> {
    if let Some(node) = ctx.parent_value.downcast_ref::<Node>() {
        return Ok(node);
    }
    ctx.ctx.data::<RootValue>().map(|root| &root.0)
}

/// A value that could not be turned into a field value, located by the list
/// indices below the field.
struct Failure {
    indices: Vec<usize>,
    error: async_graphql::Error,
}

impl Failure {
    fn new(indices: &[usize], error: impl fmt::Display) -> Self {
        Self {
            indices: indices.to_vec(),
            error: async_graphql::Error::new(error.to_string()),
        }
    }
}

type Shaped = Result<Option<FieldValue<'static>>, Failure>;

/// Shapes fetched data after the field's type.
///
/// A failure is reported once and nulls the nearest nullable position at or
/// above it. Nulled list positions are handed to [`NullItems`] so sibling
/// items keep their data.
struct Shaper<'a> {
    dispatch: Option<&'a Dispatch>,
    nulled: Vec<Vec<usize>>,
    reported: Vec<Failure>,
}

impl<'a> Shaper<'a> {
    fn new(dispatch: Option<&'a Dispatch>) -> Self {
        Self {
            dispatch,
            nulled: Vec::new(),
            reported: Vec::new(),
        }
    }

    fn field(&mut self, fetched: Result<Data, String>, ty: &TypeRef) -> Shaped {
        match fetched {
            Ok(data) => self.shape(data, ty, &[]),
            Err(message) => self.absorb(ty, Failure::new(&[], message)),
        }
    }

    fn shape(&mut self, data: Data, ty: &TypeRef, at: &[usize]) -> Shaped {
        if let TypeRef::NonNull(inner) = ty {
            return match self.shape_nullable(data, inner, at)? {
                Some(value) => Ok(Some(value)),
                None => Err(Failure::new(at, ResolveError::UnexpectedNull)),
            };
        }

        let mark = self.nulled.len();
        self.shape_nullable(data, ty, at).or_else(|failure| {
            self.nulled.truncate(mark);
            self.absorb(ty, failure)
        })
    }

    fn shape_nullable(&mut self, data: Data, ty: &TypeRef, at: &[usize]) -> Shaped {
        match (ty, data) {
            (_, Data::Null) | (_, Data::Value(ConstValue::Null)) => Ok(None),
            (TypeRef::List(inner), Data::List(items)) => {
                let mut values = Vec::with_capacity(items.len());
                for (index, item) in items.into_iter().enumerate() {
                    let mut path = at.to_vec();
                    path.push(index);
                    match self.shape(item, inner, &path)? {
                        Some(value) => values.push(value),
                        None => {
                            self.nulled.push(path);
                            values.push(FieldValue::NULL);
                        }
                    }
                }
                Ok(Some(FieldValue::list(values)))
            }
            (TypeRef::List(_), _) => Err(Failure::new(
                at,
                ResolveError::ShapeMismatch { expected: "a list" },
            )),
            (_, Data::List(_)) => Err(Failure::new(
                at,
                ResolveError::ShapeMismatch { expected: "a single" },
            )),
            (_, Data::Value(value)) => Ok(Some(FieldValue::value(value))),
            (_, Data::Node(node)) => match self.dispatch {
                Some(dispatch) => {
                    let concrete = dispatch
                        .resolve(&node)
                        .map_err(|err| Failure::new(at, err))?;
                    Ok(Some(FieldValue::owned_any(node).with_type(concrete.into_name())))
                }
                None => Ok(Some(FieldValue::owned_any(node))),
            },
        }
    }

    fn absorb(&mut self, ty: &TypeRef, failure: Failure) -> Shaped {
        if let TypeRef::NonNull(_) = ty {
            return Err(failure);
        }
        self.reported.push(failure);
        Ok(None)
    }

    fn finish(self, ctx: &ResolverContext<'_>) -> async_graphql::Result<()> {
        for failure in self.reported {
            report(ctx, failure);
        }
        if !self.nulled.is_empty() {
            let field = ctx
                .ctx
                .path_node
                .as_ref()
                .ok_or_else(|| async_graphql::Error::new("field resolved outside a query path"))?;
            ctx.ctx.data::<NulledItems>()?.mark(field, self.nulled);
        }
        Ok(())
    }
}

fn report(ctx: &ResolverContext<'_>, failure: Failure) {
    warn!(
        field = %ctx.ctx.item.node.name.node,
        at = ?failure.indices,
        error = %failure.error.message,
        "value could not be resolved"
    );
    let mut error = ctx
        .ctx
        .set_error_path(failure.error.into_server_error(ctx.ctx.item.pos));
    error
        .path
        .extend(failure.indices.into_iter().map(PathSegment::Index));
    ctx.ctx.add_error(error);
}
