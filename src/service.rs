use std::fmt;
use std::sync::Arc;

use async_graphql::{dynamic, Request, Response, Variables};
use tracing::warn;

use crate::registry::TypeRegistry;
use crate::value::Node;

/// Root value made available to the query type's fields.
pub(crate) struct RootValue(pub(crate) Node);

/// A built schema together with the registry its interfaces resolve against.
///
/// Cloning is cheap; clones share the schema and registry, which are never
/// mutated once built.
#[derive(Clone)]
pub struct BuiltSchema {
    graphql_schema: dynamic::Schema,
    registry: Arc<TypeRegistry>,
}

impl BuiltSchema {
    pub(crate) fn new(graphql_schema: dynamic::Schema, registry: Arc<TypeRegistry>) -> Self {
        Self {
            graphql_schema,
            registry,
        }
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn schema(&self) -> &dynamic::Schema {
        &self.graphql_schema
    }

    pub async fn execute(&self, request: Request, root: Node) -> Response {
        self.graphql_schema
            .execute(request.data(RootValue(root)))
            .await
    }

    pub async fn execute_query(&self, query: &str, root: Node) -> Response {
        let request = Request::new(query);
        self.execute(request, root).await
    }

    /// Executes `query`; variables that do not form a JSON object are dropped
    /// with a warning.
    pub async fn execute_with_variables(
        &self,
        query: &str,
        variables: serde_json::Value,
        root: Node,
    ) -> Response {
        let mut request = Request::new(query);
        match serde_json::from_value::<Variables>(variables) {
            Ok(vars) => request = request.variables(vars),
            Err(err) => warn!(error = %err, "ignoring variables that are not a JSON object"),
        }
        self.execute(request, root).await
    }
}

impl fmt::Debug for BuiltSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuiltSchema")
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
