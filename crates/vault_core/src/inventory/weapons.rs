use std::io::Read;

use crate::catalog::Catalog;
use crate::columns::{
    CATALOG_LEADING, CRAFTED, CRAFTED_LEVEL, HASH, INSTANCE_ID, INVENTORY_DENY_LIST,
    INVENTORY_LEADING, RAW_HASH, RAW_ID, perk_group_ordinal,
};
use crate::core_api::{CoreError, CoreErrorCode, CoreWarning};
use crate::fingerprint::Fingerprint;
use crate::table::{Cell, Table};

use super::perk_text::normalize_perk_cell;

/// One equipped-perk column of the normalized export (`Perks N`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerkGroupColumn {
    pub column: String,
    pub ordinal: usize,
}

/// A player's weapon export after the catalog join and perk-text cleanup.
#[derive(Debug, Clone)]
pub struct WeaponInventory {
    table: Table,
    fingerprint: Fingerprint,
    perk_groups: Vec<PerkGroupColumn>,
    warnings: Vec<CoreWarning>,
}

impl WeaponInventory {
    pub fn from_reader<R: Read>(
        reader: R,
        catalog: &Catalog,
        source: &str,
    ) -> Result<Self, CoreError> {
        Self::normalize(Table::from_csv(reader, source)?, catalog, source)
    }

    pub fn from_bytes(bytes: &[u8], catalog: &Catalog, source: &str) -> Result<Self, CoreError> {
        Self::from_reader(bytes, catalog, source)
    }

    pub fn normalize(raw: Table, catalog: &Catalog, source: &str) -> Result<Self, CoreError> {
        raw.require_columns(&[RAW_HASH, RAW_ID, CRAFTED, CRAFTED_LEVEL], source)?;
        if !raw.columns().iter().any(|c| perk_group_ordinal(c).is_some()) {
            return Err(CoreError::new(
                CoreErrorCode::MalformedInput,
                format!("{source}: no equipped-perk column ('Perks 1' or later)"),
            ));
        }

        let joined = left_join_catalog(&raw, catalog);
        let mut table = joined.table;
        table.rename(RAW_ID, INSTANCE_ID);
        let mut table = table
            .reorder_front(&INVENTORY_LEADING)
            .drop_columns(&INVENTORY_DENY_LIST);

        let mut perk_groups: Vec<PerkGroupColumn> = table
            .columns()
            .iter()
            .filter_map(|c| {
                perk_group_ordinal(c).map(|ordinal| PerkGroupColumn {
                    column: c.clone(),
                    ordinal,
                })
            })
            .collect();
        perk_groups.sort_by_key(|g| g.ordinal);

        for group in &perk_groups {
            table.map_column(&group.column, |cell| match cell {
                Cell::Text(s) => Cell::Text(normalize_perk_cell(s)),
                other => other.clone(),
            });
        }

        for warning in &joined.warnings {
            tracing::warn!(source, %warning, "inventory row without catalog entry");
        }

        let fingerprint = table.fingerprint();
        tracing::debug!(
            source,
            rows = table.len(),
            perk_groups = perk_groups.len(),
            orphans = joined.warnings.len(),
            fingerprint = %fingerprint.short(),
            "weapon inventory loaded"
        );

        Ok(Self {
            table,
            fingerprint,
            perk_groups,
            warnings: joined.warnings,
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

    /// Equipped-perk columns ordered by their group number.
    pub fn perk_groups(&self) -> &[PerkGroupColumn] {
        &self.perk_groups
    }

    pub fn warnings(&self) -> &[CoreWarning] {
        &self.warnings
    }
}

struct Joined {
    table: Table,
    warnings: Vec<CoreWarning>,
}

/// Prepend the catalog's classification columns to every export row. Rows
/// without a catalog match keep their own hash and get empty classification.
fn left_join_catalog(raw: &Table, catalog: &Catalog) -> Joined {
    let raw_columns: Vec<&str> = raw
        .columns()
        .iter()
        .map(String::as_str)
        .filter(|c| !CATALOG_LEADING.contains(c))
        .collect();

    let mut table = Table::new(CATALOG_LEADING.iter().copied().chain(raw_columns.iter().copied()));
    let mut warnings = Vec::new();

    for row in raw.rows() {
        let raw_hash = row.get(RAW_HASH).as_i64();
        let matched = raw_hash.and_then(|h| catalog.get(h));

        let mut cells: Vec<Cell> = match matched {
            Some(entry) => CATALOG_LEADING
                .iter()
                .map(|c| entry.get(c).clone())
                .collect(),
            None => {
                warnings.push(CoreWarning::UnmatchedForeignKey {
                    item_hash: raw_hash,
                    instance_id: row.get(RAW_ID).to_string(),
                });
                CATALOG_LEADING
                    .iter()
                    .map(|&c| match (c, raw_hash) {
                        (HASH, Some(h)) => Cell::Int(h),
                        _ => Cell::Empty,
                    })
                    .collect()
            }
        };
        cells.extend(raw_columns.iter().map(|c| row.get(c).clone()));
        table.push_row(cells);
    }

    Joined { table, warnings }
}
