use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use async_graphql::extensions::{
    Extension, ExtensionContext, ExtensionFactory, NextPrepareRequest, NextResolve, ResolveInfo,
};
use async_graphql::{QueryPathNode, QueryPathSegment, Request, ServerResult, Value};

/// List positions of the current request that must come back as `null`.
///
/// Field resolvers mark positions while shaping list values; the engine only
/// learns about them through [`NullItems`].
#[derive(Debug, Default)]
pub(crate) struct NulledItems(Mutex<HashSet<String>>);

impl NulledItems {
    pub(crate) fn mark(&self, field: &QueryPathNode<'_>, positions: Vec<Vec<usize>>) {
        let field = field.to_string();
        let mut nulled = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        nulled.extend(positions.iter().map(|indices| item_key(&field, indices)));
    }

    fn contains(&self, path: &QueryPathNode<'_>) -> bool {
        let nulled = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        !nulled.is_empty() && nulled.contains(&path.to_string())
    }
}

fn item_key(field: &str, indices: &[usize]) -> String {
    let mut key = field.to_string();
    for index in indices {
        key.push('.');
        key.push_str(&index.to_string());
    }
    key
}

/// Resolves marked list items to `null` without handing them to the engine.
///
/// The dynamic engine resolves every element of an object or interface list
/// as a container and fails the whole response on the first element error,
/// so nullable elements that could not be resolved are cut off here.
pub(crate) struct NullItems;

impl ExtensionFactory for NullItems {
    fn create(&self) -> Arc<dyn Extension> {
        Arc::new(NullItems)
    }
}

#[async_trait::async_trait]
impl Extension for NullItems {
    async fn prepare_request(
        &self,
        ctx: &ExtensionContext<'_>,
        request: Request,
        next: NextPrepareRequest<'_>,
    ) -> ServerResult<Request> {
        next.run(ctx, request.data(NulledItems::default())).await
    }

    async fn resolve(
        &self,
        ctx: &ExtensionContext<'_>,
        info: ResolveInfo<'_>,
        next: NextResolve<'_>,
    ) -> ServerResult<Option<Value>> {
        if let QueryPathSegment::Index(_) = info.path_node.segment {
            let nulled = ctx
                .data_opt::<NulledItems>()
                .map_or(false, |nulled| nulled.contains(info.path_node));
            if nulled {
                return Ok(None);
            }
        }
        next.run(ctx, info).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_key_appends_indices() {
        assert_eq!(item_key("items", &[1]), "items.1");
        assert_eq!(item_key("items", &[1, 0]), "items.1.0");
        assert_eq!(item_key("outer.2.items", &[]), "outer.2.items");
    }

    #[test]
    fn test_marked_positions_are_found_by_path() {
        let nulled = NulledItems::default();
        let field = QueryPathNode {
            parent: None,
            segment: QueryPathSegment::Name("items"),
        };
        nulled.mark(&field, vec![vec![1], vec![2, 0]]);

        let item = QueryPathNode {
            parent: Some(&field),
            segment: QueryPathSegment::Index(1),
        };
        let other = QueryPathNode {
            parent: Some(&field),
            segment: QueryPathSegment::Index(0),
        };
        assert!(nulled.contains(&item));
        assert!(!nulled.contains(&other));
    }
}
