use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::columns::{
    CATALOG_LEADING, CATALOG_RANGE_SOURCE, HASH, NAME, RANGE, slot_group_label,
    slot_option_position,
};
use crate::core_api::{CoreError, CoreErrorCode};
use crate::fingerprint::Fingerprint;
use crate::stat_schema::{StatSchema, missing_stat_columns};
use crate::table::{RowRef, Table};

/// One enumerated `Slot K Perk J` column of the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotOptionColumn {
    pub column: String,
    pub slot: u8,
    pub option: u8,
}

impl SlotOptionColumn {
    pub fn slot_label(&self) -> String {
        slot_group_label(&self.column)
    }
}

/// The reference set of weapon variants. Immutable once loaded.
#[derive(Debug, Clone)]
pub struct Catalog {
    table: Table,
    fingerprint: Fingerprint,
    by_hash: HashMap<i64, usize>,
    slot_options: Vec<SlotOptionColumn>,
    missing_stats: Vec<(StatSchema, Vec<&'static str>)>,
}

impl Catalog {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let bytes = fs::read(path).map_err(|e| {
            CoreError::new(
                CoreErrorCode::Io,
                format!("failed to read {}: {e}", path.display()),
            )
        })?;
        Self::from_bytes(&bytes, &path.display().to_string())
    }

    pub fn from_bytes(bytes: &[u8], source: &str) -> Result<Self, CoreError> {
        Self::from_table(Table::from_csv(bytes, source)?, source)
    }

    pub fn from_table(raw: Table, source: &str) -> Result<Self, CoreError> {
        let mut raw = raw;
        raw.rename(CATALOG_RANGE_SOURCE, RANGE);
        raw.require_columns(&CATALOG_LEADING, source)?;
        let table = raw.reorder_front(&CATALOG_LEADING);

        let mut by_hash = HashMap::with_capacity(table.len());
        for (index, row) in table.rows().enumerate() {
            let Some(hash) = row.get(HASH).as_i64() else {
                return Err(CoreError::new(
                    CoreErrorCode::MalformedInput,
                    format!("{source}: row {} has no integer '{HASH}'", index + 1),
                ));
            };
            if by_hash.insert(hash, index).is_some() {
                return Err(CoreError::new(
                    CoreErrorCode::MalformedInput,
                    format!("{source}: duplicate '{HASH}' {hash}"),
                ));
            }
        }

        let slot_options = table
            .columns()
            .iter()
            .filter_map(|c| {
                slot_option_position(c).map(|(slot, option)| SlotOptionColumn {
                    column: c.clone(),
                    slot,
                    option,
                })
            })
            .collect();

        let missing_stats = missing_stat_columns(&table);
        for (schema, missing) in &missing_stats {
            tracing::warn!(
                source,
                ?schema,
                missing = %missing.join(", "),
                "catalog lacks stat columns"
            );
        }

        let fingerprint = table.fingerprint();
        tracing::debug!(
            source,
            rows = table.len(),
            columns = table.columns().len(),
            fingerprint = %fingerprint.short(),
            "catalog loaded"
        );

        Ok(Self {
            table,
            fingerprint,
            by_hash,
            slot_options,
            missing_stats,
        })
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn get(&self, item_hash: i64) -> Option<RowRef<'_>> {
        self.by_hash
            .get(&item_hash)
            .and_then(|&i| self.table.row(i))
    }

    pub fn name_of(&self, item_hash: i64) -> Option<&str> {
        self.get(item_hash).and_then(|row| row.get(NAME).as_str())
    }

    /// `Slot K Perk J` columns in catalog column order.
    pub fn slot_option_columns(&self) -> &[SlotOptionColumn] {
        &self.slot_options
    }

    pub fn missing_stat_columns(&self) -> &[(StatSchema, Vec<&'static str>)] {
        &self.missing_stats
    }
}

#[cfg(test)]
mod tests {
    use super::Catalog;
    use crate::core_api::CoreErrorCode;

    const LEADING: &str = "Weapon Name With Season,Weapon Name,Weapon Season,Weapon Hash,Weapon Tier,Weapon Type,Weapon Archetype,Weapon Slot,Weapon Element,Weapon Current Version,Weapon Power Cap,Is Sunset";

    #[test]
    fn leading_columns_move_first_and_range_is_renamed() {
        let csv = format!(
            "Weapon Range,Slot 1 Perk 0,{LEADING}\n40,Outlaw,Fatebringer (S13),Fatebringer,13,1,Legendary,Hand Cannon,Adaptive,Kinetic,Arc,1,999990,No\n"
        );
        let catalog = Catalog::from_bytes(csv.as_bytes(), "manifest").expect("catalog loads");
        let columns = catalog.table().columns();
        assert_eq!(columns[0], "Weapon Name With Season");
        assert_eq!(columns[11], "Is Sunset");
        assert_eq!(columns[12], "Range");
        assert_eq!(columns[13], "Slot 1 Perk 0");
        assert_eq!(catalog.name_of(1), Some("Fatebringer"));
        assert_eq!(catalog.slot_option_columns().len(), 1);
        assert_eq!(catalog.slot_option_columns()[0].slot_label(), "Slot 1");
    }

    #[test]
    fn missing_classification_column_is_malformed() {
        let csv = "Weapon Name,Weapon Hash\nFatebringer,1\n";
        let err = Catalog::from_bytes(csv.as_bytes(), "manifest").expect_err("missing columns");
        assert_eq!(err.code, CoreErrorCode::MalformedInput);
        assert!(err.message.contains("Weapon Tier"));
    }

    #[test]
    fn duplicate_hash_is_malformed() {
        let csv = format!(
            "{LEADING}\nA,A,1,7,Legendary,Shotgun,Lightweight,Energy,Arc,1,0,No\nB,B,1,7,Legendary,Shotgun,Lightweight,Energy,Arc,1,0,No\n"
        );
        let err = Catalog::from_bytes(csv.as_bytes(), "manifest").expect_err("duplicate");
        assert!(err.message.contains("duplicate 'Weapon Hash' 7"));
    }
}
