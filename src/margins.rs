//! Category-based margin resolution.
//!
//! A category's effective margin is its own value when set (> 0), otherwise
//! the parent's effective value, otherwise the system default. The walk is
//! iterative and depth-bounded: a parent chain longer than the configured
//! maximum means the category graph has a cycle, which is a data-integrity
//! bug, not a runtime condition.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::stores::CategoryStore;

/// Resolved margin floor and target for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectiveMargin {
    /// Minimum acceptable margin percentage (the floor)
    pub min: Decimal,
    /// Target margin percentage used to suggest prices
    pub normal: Decimal,
}

pub struct MarginResolver {
    categories: Arc<dyn CategoryStore>,
    defaults: EffectiveMargin,
    max_depth: usize,
}

impl MarginResolver {
    pub fn new(categories: Arc<dyn CategoryStore>, defaults: EffectiveMargin, max_depth: usize) -> Self {
        Self {
            categories,
            defaults,
            max_depth,
        }
    }

    /// Walks the parent chain upward until both margins are resolved or the
    /// forest root is reached. Unresolved values fall back to the defaults.
    #[instrument(skip(self), fields(category_id = %category_id))]
    pub async fn effective_margin(&self, category_id: Uuid) -> Result<EffectiveMargin, ServiceError> {
        let mut min: Option<Decimal> = None;
        let mut normal: Option<Decimal> = None;
        let mut cursor = Some(category_id);
        let mut depth = 0usize;

        while let Some(id) = cursor {
            if depth >= self.max_depth {
                return Err(ServiceError::ConfigurationError(format!(
                    "category parent chain exceeds {} levels starting at {}; the category graph is cyclic",
                    self.max_depth, category_id
                )));
            }
            depth += 1;

            let node = match self.categories.get_category(id).await? {
                Some(node) => node,
                None if depth == 1 => {
                    // A line pointing at a nonexistent category is a broken reference.
                    return Err(ServiceError::ConfigurationError(format!(
                        "category {} does not exist",
                        id
                    )));
                }
                // A dangling parent link terminates the walk at the last known node.
                None => break,
            };

            if min.is_none() && node.min_margin_percentage > Decimal::ZERO {
                min = Some(node.min_margin_percentage);
            }
            if normal.is_none() && node.normal_margin_percentage > Decimal::ZERO {
                normal = Some(node.normal_margin_percentage);
            }
            if min.is_some() && normal.is_some() {
                break;
            }

            cursor = node.parent_id;
        }

        Ok(EffectiveMargin {
            min: min.unwrap_or(self.defaults.min),
            normal: normal.unwrap_or(self.defaults.normal),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{CategoryNode, MockCategoryStore};
    use rust_decimal_macros::dec;

    fn defaults() -> EffectiveMargin {
        EffectiveMargin {
            min: dec!(10.00),
            normal: dec!(20.00),
        }
    }

    fn node(id: Uuid, parent: Option<Uuid>, min: Decimal, normal: Decimal) -> CategoryNode {
        CategoryNode {
            id,
            parent_id: parent,
            min_margin_percentage: min,
            normal_margin_percentage: normal,
        }
    }

    fn store_with(nodes: Vec<CategoryNode>) -> MockCategoryStore {
        let mut store = MockCategoryStore::new();
        store.expect_get_category().returning(move |id| {
            Ok(nodes.iter().find(|n| n.id == id).cloned())
        });
        store
    }

    #[tokio::test]
    async fn grandchild_inherits_root_margin() {
        let (c1, c2, c3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = store_with(vec![
            node(c1, None, dec!(15.00), dec!(25.00)),
            node(c2, Some(c1), Decimal::ZERO, Decimal::ZERO),
            node(c3, Some(c2), Decimal::ZERO, Decimal::ZERO),
        ]);
        let resolver = MarginResolver::new(Arc::new(store), defaults(), 32);

        let margin = resolver.effective_margin(c3).await.unwrap();
        assert_eq!(margin.min, dec!(15.00));
        assert_eq!(margin.normal, dec!(25.00));
    }

    #[tokio::test]
    async fn own_value_shadows_ancestors() {
        let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());
        let store = store_with(vec![
            node(c1, None, dec!(15.00), dec!(30.00)),
            node(c2, Some(c1), dec!(12.00), Decimal::ZERO),
        ]);
        let resolver = MarginResolver::new(Arc::new(store), defaults(), 32);

        let margin = resolver.effective_margin(c2).await.unwrap();
        assert_eq!(margin.min, dec!(12.00));
        // normal still inherited from the parent
        assert_eq!(margin.normal, dec!(30.00));
    }

    #[tokio::test]
    async fn unset_chain_falls_back_to_system_defaults() {
        let (c1, c2, c3) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let store = store_with(vec![
            node(c1, None, Decimal::ZERO, Decimal::ZERO),
            node(c2, Some(c1), Decimal::ZERO, Decimal::ZERO),
            node(c3, Some(c2), Decimal::ZERO, Decimal::ZERO),
        ]);
        let resolver = MarginResolver::new(Arc::new(store), defaults(), 32);

        let margin = resolver.effective_margin(c3).await.unwrap();
        assert_eq!(margin.min, dec!(10.00));
        assert_eq!(margin.normal, dec!(20.00));
    }

    #[tokio::test]
    async fn cyclic_graph_is_a_configuration_error() {
        let (c1, c2) = (Uuid::new_v4(), Uuid::new_v4());
        let store = store_with(vec![
            node(c1, Some(c2), Decimal::ZERO, Decimal::ZERO),
            node(c2, Some(c1), Decimal::ZERO, Decimal::ZERO),
        ]);
        let resolver = MarginResolver::new(Arc::new(store), defaults(), 8);

        let err = resolver.effective_margin(c1).await.unwrap_err();
        assert!(matches!(err, ServiceError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn missing_category_is_a_configuration_error() {
        let store = store_with(vec![]);
        let resolver = MarginResolver::new(Arc::new(store), defaults(), 32);

        let err = resolver.effective_margin(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::ConfigurationError(_)));
    }

    #[tokio::test]
    async fn dangling_parent_link_stops_the_walk() {
        let (c1, ghost) = (Uuid::new_v4(), Uuid::new_v4());
        let store = store_with(vec![node(c1, Some(ghost), dec!(11.00), Decimal::ZERO)]);
        let resolver = MarginResolver::new(Arc::new(store), defaults(), 32);

        let margin = resolver.effective_margin(c1).await.unwrap();
        assert_eq!(margin.min, dec!(11.00));
        assert_eq!(margin.normal, dec!(20.00));
    }
}
