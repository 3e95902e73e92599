//! Builder/product health correlation over a single snapshot.

use crate::domain::{Category, Snapshot};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Correlation {
    /// Builder and product pools are both active.
    Healthy,
    /// Anything else, including unreadable pools.
    Check,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductCorrelation {
    pub product: String,
    pub product_status: String,
    pub correlation: Correlation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuilderHealth {
    pub symbol: String,
    pub pool_status: String,
    pub healthy: bool,
    pub products: Vec<String>,
    pub product_correlations: Vec<ProductCorrelation>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImpactReport {
    pub builders: Vec<BuilderHealth>,
}

impl ImpactReport {
    pub fn builder(&self, symbol: &str) -> Option<&BuilderHealth> {
        self.builders.iter().find(|b| b.symbol == symbol)
    }
}

/// Derive the report. Depends only on `snapshot`, so re-running it later on a
/// stored snapshot gives the same answer.
pub fn analyze(snapshot: &Snapshot) -> ImpactReport {
    let builders = snapshot
        .entities
        .iter()
        .filter(|e| e.category == Category::Builder)
        .map(|builder| {
            let healthy = builder.pool.is_active();
            let product_correlations = builder
                .products
                .iter()
                .map(|product| {
                    let product_pool = snapshot.entity(product).map(|p| &p.pool);
                    let product_active = product_pool.map(|p| p.is_active()).unwrap_or(false);
                    ProductCorrelation {
                        product: product.clone(),
                        product_status: product_pool
                            .map(|p| p.status_label())
                            .unwrap_or("unavailable")
                            .to_string(),
                        correlation: if healthy && product_active {
                            Correlation::Healthy
                        } else {
                            Correlation::Check
                        },
                    }
                })
                .collect();
            BuilderHealth {
                symbol: builder.symbol.clone(),
                pool_status: builder.pool.status_label().to_string(),
                healthy,
                products: builder.products.clone(),
                product_correlations,
            }
        })
        .collect();
    ImpactReport { builders }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        Address, EntitySnapshot, PoolId, PoolKey, PoolReading, PoolState, PoolStatus, TimeMs,
        VestingReading,
    };

    fn pool(status: PoolStatus) -> PoolReading {
        PoolReading::Found(PoolState {
            status,
            key: PoolKey {
                currency0: Address::zero(),
                currency1: Address::zero(),
                fee: 0,
                tick_spacing: 1,
                hooks: Address::zero(),
            },
            pool_id: PoolId([0u8; 32]),
            numeraire: Address::zero(),
            far_tick: 0,
        })
    }

    fn entity(
        symbol: &str,
        category: Category,
        pool: PoolReading,
        products: &[&str],
    ) -> EntitySnapshot {
        EntitySnapshot {
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            category,
            address: Address::zero(),
            vesting: VestingReading::Unavailable {
                reason: "n/a".to_string(),
            },
            pool,
            products: products.iter().map(|s| s.to_string()).collect(),
            anomalies: vec![],
        }
    }

    #[test]
    fn test_both_active_is_healthy() {
        let snapshot = Snapshot::new(
            TimeMs::new(1),
            Address::zero(),
            vec![
                entity("B", Category::Builder, pool(PoolStatus::Active), &["P"]),
                entity("P", Category::Product, pool(PoolStatus::Active), &[]),
            ],
        );
        let report = analyze(&snapshot);
        let b = report.builder("B").unwrap();
        assert!(b.healthy);
        assert_eq!(b.product_correlations[0].correlation, Correlation::Healthy);
    }

    #[test]
    fn test_inactive_side_is_check() {
        let snapshot = Snapshot::new(
            TimeMs::new(1),
            Address::zero(),
            vec![
                entity("B", Category::Builder, pool(PoolStatus::Migrating), &["P"]),
                entity("P", Category::Product, pool(PoolStatus::Active), &[]),
            ],
        );
        let report = analyze(&snapshot);
        let b = report.builder("B").unwrap();
        assert!(!b.healthy);
        assert_eq!(b.product_correlations[0].correlation, Correlation::Check);
    }

    #[test]
    fn test_unreadable_product_is_check() {
        let snapshot = Snapshot::new(
            TimeMs::new(1),
            Address::zero(),
            vec![
                entity("B", Category::Builder, pool(PoolStatus::Active), &["P"]),
                entity(
                    "P",
                    Category::Product,
                    PoolReading::NotFound {
                        reason: "rpc".to_string(),
                    },
                    &[],
                ),
            ],
        );
        let report = analyze(&snapshot);
        let corr = &report.builder("B").unwrap().product_correlations[0];
        assert_eq!(corr.correlation, Correlation::Check);
        assert_eq!(corr.product_status, "unavailable");
    }

    #[test]
    fn test_products_are_not_listed_as_builders() {
        let snapshot = Snapshot::new(
            TimeMs::new(1),
            Address::zero(),
            vec![entity("P", Category::Product, pool(PoolStatus::Active), &[])],
        );
        assert!(analyze(&snapshot).builders.is_empty());
    }

    #[test]
    fn test_analysis_is_repeatable() {
        let snapshot = Snapshot::new(
            TimeMs::new(1),
            Address::zero(),
            vec![entity("B", Category::Builder, pool(PoolStatus::Active), &[])],
        );
        assert_eq!(analyze(&snapshot), analyze(&snapshot));
    }
}
