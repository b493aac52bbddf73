//! Infraction catalog - lookup over the violation reference data

use crate::error::{CatalogError, CatalogResult};
use crate::violation::{ViolationCategory, ViolationType};
use fineflow_core::Amount;
use rust_decimal::Decimal;
use std::collections::HashMap;

/// Immutable lookup over violation types, keyed by type id.
///
/// Built once at startup; evaluation never mutates it.
pub struct InfractionCatalog {
    types: HashMap<String, ViolationType>,
}

impl InfractionCatalog {
    /// Build a catalog from a list of violation types.
    ///
    /// Rejects duplicate ids and inverted amount ranges up front, so
    /// the engines can trust every entry they read.
    pub fn new(types: impl IntoIterator<Item = ViolationType>) -> CatalogResult<Self> {
        let mut map = HashMap::new();
        for vt in types {
            if vt.min_amount > vt.max_amount {
                return Err(CatalogError::InvalidRange {
                    id: vt.id.clone(),
                    min: vt.min_amount.to_string(),
                    max: vt.max_amount.to_string(),
                });
            }
            if map.contains_key(&vt.id) {
                return Err(CatalogError::DuplicateId(vt.id));
            }
            map.insert(vt.id.clone(), vt);
        }
        Ok(Self { types: map })
    }

    /// Look up an active violation type by id.
    pub fn get(&self, id: &str) -> CatalogResult<&ViolationType> {
        let vt = self
            .types
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))?;
        if !vt.active {
            return Err(CatalogError::Inactive(id.to_string()));
        }
        Ok(vt)
    }

    /// Look up a violation type regardless of its active flag.
    ///
    /// Historical records may reference retired types; amount
    /// recomputation for existing records still needs them.
    pub fn get_any(&self, id: &str) -> CatalogResult<&ViolationType> {
        self.types
            .get(id)
            .ok_or_else(|| CatalogError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// All active types in a category
    pub fn by_category(&self, category: ViolationCategory) -> Vec<&ViolationType> {
        let mut result: Vec<_> = self
            .types
            .values()
            .filter(|vt| vt.active && vt.category == category)
            .collect();
        result.sort_by(|a, b| a.id.cmp(&b.id));
        result
    }

    /// A small seeded catalog for tests and demos
    pub fn with_defaults() -> Self {
        let amount = |v: i64| Amount::new_unchecked(Decimal::new(v, 0));
        Self::new([
            ViolationType::fixed(
                "VT-RED-LIGHT",
                "Running a red light",
                "ART-287(2)",
                ViolationCategory::Moving,
                amount(100_000),
            )
            .with_accident_penalty(amount(50_000))
            .with_recidive_percent(Decimal::new(30, 0)),
            ViolationType::variable(
                "VT-SPEEDING",
                "Exceeding the speed limit",
                "ART-287(5)",
                ViolationCategory::Moving,
                amount(250_000),
                amount(500_000),
            )
            .with_recidive_percent(Decimal::new(25, 0)),
            ViolationType::fixed(
                "VT-NO-LICENSE",
                "Driving without a license",
                "ART-281",
                ViolationCategory::Administrative,
                amount(250_000),
            )
            .with_impound(),
            ViolationType::fixed(
                "VT-NO-STNK",
                "Missing vehicle registration document",
                "ART-288(1)",
                ViolationCategory::Documentation,
                amount(50_000),
            ),
            ViolationType::fixed(
                "VT-PARKING",
                "Parking in a prohibited zone",
                "ART-287(3)",
                ViolationCategory::Parking,
                amount(25_000),
            ),
        ])
        .expect("default catalog is well-formed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn amount(v: i64) -> Amount {
        Amount::new(Decimal::new(v, 0)).unwrap()
    }

    #[test]
    fn test_get_active_type() {
        let catalog = InfractionCatalog::with_defaults();
        let vt = catalog.get("VT-RED-LIGHT").unwrap();
        assert_eq!(vt.legal_code, "ART-287(2)");
    }

    #[test]
    fn test_get_missing_type() {
        let catalog = InfractionCatalog::with_defaults();
        let result = catalog.get("VT-NOPE");
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
    }

    #[test]
    fn test_get_inactive_type() {
        let catalog = InfractionCatalog::new([ViolationType::fixed(
            "VT-OLD",
            "Retired offense",
            "ART-000",
            ViolationCategory::Equipment,
            amount(10_000),
        )
        .inactive()])
        .unwrap();

        assert!(matches!(catalog.get("VT-OLD"), Err(CatalogError::Inactive(_))));
        assert!(catalog.get_any("VT-OLD").is_ok());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let a = ViolationType::fixed(
            "VT-DUP",
            "One",
            "ART-1",
            ViolationCategory::Moving,
            amount(10_000),
        );
        let b = ViolationType::fixed(
            "VT-DUP",
            "Two",
            "ART-2",
            ViolationCategory::Moving,
            amount(20_000),
        );
        let result = InfractionCatalog::new([a, b]);
        assert!(matches!(result, Err(CatalogError::DuplicateId(_))));
    }

    #[test]
    fn test_inverted_range_rejected() {
        let mut vt = ViolationType::variable(
            "VT-BAD",
            "Bad range",
            "ART-9",
            ViolationCategory::Moving,
            amount(500_000),
            amount(250_000),
        );
        vt.min_amount = Amount::new(dec!(500_000)).unwrap();
        let result = InfractionCatalog::new([vt]);
        assert!(matches!(result, Err(CatalogError::InvalidRange { .. })));
    }

    #[test]
    fn test_by_category_sorted() {
        let catalog = InfractionCatalog::with_defaults();
        let moving = catalog.by_category(ViolationCategory::Moving);
        assert_eq!(moving.len(), 2);
        assert!(moving[0].id < moving[1].id);
    }
}
