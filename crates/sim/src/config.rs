//! Simulation configuration.
//!
//! Defaults reproduce the reference demo; `DEPOTNET_*` environment variables override
//! individual parts:
//!
//! | variable                       | format                         |
//! |--------------------------------|--------------------------------|
//! | `DEPOTNET_SHOP`                | shop name                      |
//! | `DEPOTNET_WAREHOUSES`          | `name:capacity,...`            |
//! | `DEPOTNET_TRUCKS`              | `name:capacity,...`            |
//! | `DEPOTNET_PRODUCTION_RATE`     | units per batch, every factory |
//! | `DEPOTNET_OVERLOAD_THRESHOLD`  | percent, 1..=100               |
//! | `DEPOTNET_ORDER`               | `product:quantity,...`         |

use std::collections::BTreeMap;

use anyhow::{Context, bail};

use depotnet_core::Quantity;
use depotnet_inventory::DEFAULT_OVERLOAD_THRESHOLD_PERCENT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarehouseConfig {
    pub name: String,
    pub capacity: Quantity,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruckConfig {
    pub name: String,
    pub capacity: Quantity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FactoryConfig {
    pub name: String,
    pub unit_weight: f64,
    pub packaging: String,
    pub production_rate: Quantity,
}

impl FactoryConfig {
    fn boxed(name: &str, production_rate: Quantity) -> Self {
        Self {
            name: name.to_string(),
            unit_weight: 10.0,
            packaging: "Box".to_string(),
            production_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimConfig {
    pub shop: String,
    pub warehouses: Vec<WarehouseConfig>,
    pub trucks: Vec<TruckConfig>,
    /// Run in list order; the same product may be produced by several factories.
    pub factories: Vec<FactoryConfig>,
    pub overload_threshold_percent: u8,
    /// Multi-warehouse order handled by the first truck once the drains settle.
    pub order: BTreeMap<String, Quantity>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            shop: "Shop 1".to_string(),
            warehouses: vec![
                WarehouseConfig { name: "Warehouse A".to_string(), capacity: 100 },
                WarehouseConfig { name: "Warehouse B".to_string(), capacity: 100 },
            ],
            trucks: vec![
                TruckConfig { name: "Truck 1".to_string(), capacity: 10 },
                TruckConfig { name: "Truck 2".to_string(), capacity: 8 },
            ],
            factories: vec![
                FactoryConfig::boxed("Product A", 90),
                FactoryConfig::boxed("Product 1", 90),
                FactoryConfig::boxed("Product A", 90),
            ],
            overload_threshold_percent: DEFAULT_OVERLOAD_THRESHOLD_PERCENT,
            order: BTreeMap::from([("Product A".to_string(), 10), ("Product 1".to_string(), 12)]),
        }
    }
}

impl SimConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each `DEPOTNET_*` key.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(shop) = lookup("DEPOTNET_SHOP") {
            let shop = shop.trim();
            if shop.is_empty() {
                bail!("DEPOTNET_SHOP must not be empty");
            }
            config.shop = shop.to_string();
        }

        if let Some(raw) = lookup("DEPOTNET_WAREHOUSES") {
            config.warehouses = parse_pairs("DEPOTNET_WAREHOUSES", &raw)?
                .into_iter()
                .map(|(name, capacity)| WarehouseConfig { name, capacity })
                .collect();
        }

        if let Some(raw) = lookup("DEPOTNET_TRUCKS") {
            config.trucks = parse_pairs("DEPOTNET_TRUCKS", &raw)?
                .into_iter()
                .map(|(name, capacity)| TruckConfig { name, capacity })
                .collect();
        }

        if let Some(raw) = lookup("DEPOTNET_PRODUCTION_RATE") {
            let rate: Quantity = raw
                .trim()
                .parse()
                .with_context(|| format!("DEPOTNET_PRODUCTION_RATE is not a quantity: {raw:?}"))?;
            for factory in &mut config.factories {
                factory.production_rate = rate;
            }
        }

        if let Some(raw) = lookup("DEPOTNET_OVERLOAD_THRESHOLD") {
            config.overload_threshold_percent = raw
                .trim()
                .parse()
                .with_context(|| format!("DEPOTNET_OVERLOAD_THRESHOLD is not a percentage: {raw:?}"))?;
        }

        if let Some(raw) = lookup("DEPOTNET_ORDER") {
            config.order = parse_pairs("DEPOTNET_ORDER", &raw)?.into_iter().collect();
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.warehouses.is_empty() {
            bail!("at least one warehouse is required");
        }
        if self.trucks.is_empty() {
            bail!("at least one truck is required");
        }
        if !(1..=100).contains(&self.overload_threshold_percent) {
            bail!(
                "overload threshold must be between 1 and 100, got {}",
                self.overload_threshold_percent
            );
        }
        Ok(())
    }
}

/// Parse `name:quantity,name:quantity`. Names may contain spaces but not `,` or a
/// trailing `:`.
fn parse_pairs(key: &str, raw: &str) -> anyhow::Result<Vec<(String, Quantity)>> {
    let mut pairs = Vec::new();
    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (name, quantity) = entry
            .rsplit_once(':')
            .with_context(|| format!("{key}: expected name:quantity, got {entry:?}"))?;
        let name = name.trim();
        if name.is_empty() {
            bail!("{key}: empty name in {entry:?}");
        }
        let quantity: Quantity = quantity
            .trim()
            .parse()
            .with_context(|| format!("{key}: bad quantity in {entry:?}"))?;
        pairs.push((name.to_string(), quantity));
    }
    if pairs.is_empty() {
        bail!("{key} is set but lists nothing");
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_demo_network() {
        let config = SimConfig::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config, SimConfig::default());
        assert_eq!(config.shop, "Shop 1");
        assert_eq!(config.warehouses.iter().map(|w| w.capacity).collect::<Vec<_>>(), vec![100, 100]);
        assert_eq!(config.trucks.iter().map(|t| t.capacity).collect::<Vec<_>>(), vec![10, 8]);
        assert_eq!(config.factories.len(), 3);
        assert!(config.factories.iter().all(|f| f.production_rate == 90));
        assert_eq!(config.overload_threshold_percent, 95);
        assert_eq!(config.order["Product 1"], 12);
    }

    #[test]
    fn environment_overrides_are_applied() {
        let config = SimConfig::from_lookup(lookup(&[
            ("DEPOTNET_SHOP", " Corner Store "),
            ("DEPOTNET_WAREHOUSES", "North:50, South Side:75"),
            ("DEPOTNET_TRUCKS", "Van:4"),
            ("DEPOTNET_PRODUCTION_RATE", "40"),
            ("DEPOTNET_OVERLOAD_THRESHOLD", "80"),
            ("DEPOTNET_ORDER", "Product A:3"),
        ]))
        .unwrap();

        assert_eq!(config.shop, "Corner Store");
        assert_eq!(config.warehouses[1], WarehouseConfig { name: "South Side".to_string(), capacity: 75 });
        assert_eq!(config.trucks, vec![TruckConfig { name: "Van".to_string(), capacity: 4 }]);
        assert!(config.factories.iter().all(|f| f.production_rate == 40));
        assert_eq!(config.overload_threshold_percent, 80);
        assert_eq!(config.order, BTreeMap::from([("Product A".to_string(), 3)]));
    }

    #[test]
    fn malformed_values_are_rejected_with_context() {
        let err = SimConfig::from_lookup(lookup(&[("DEPOTNET_TRUCKS", "Van")])).unwrap_err();
        assert!(err.to_string().contains("DEPOTNET_TRUCKS"));

        let err = SimConfig::from_lookup(lookup(&[("DEPOTNET_PRODUCTION_RATE", "lots")])).unwrap_err();
        assert!(err.to_string().contains("DEPOTNET_PRODUCTION_RATE"));

        assert!(SimConfig::from_lookup(lookup(&[("DEPOTNET_OVERLOAD_THRESHOLD", "0")])).is_err());
        assert!(SimConfig::from_lookup(lookup(&[("DEPOTNET_WAREHOUSES", " , ")])).is_err());
        assert!(SimConfig::from_lookup(lookup(&[("DEPOTNET_SHOP", "  ")])).is_err());
    }
}
