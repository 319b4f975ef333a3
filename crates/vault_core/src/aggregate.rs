//! Summary views over catalog and inventory tables.
//!
//! Every function here is a pure function of its input tables. Rows whose
//! type or element is missing (inventory rows without a catalog match) are
//! counted under [`UNKNOWN`] rather than dropped.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::columns::{
    ARCHETYPE, CRAFTED, CRAFTED_LEVEL, ELEMENT, ELEMENTS, NAME, NAME_WITH_SEASON, TIER, TYPE,
    UNKNOWN,
};
use crate::table::{Cell, RowRef, Table};

pub const TOTAL_COUNT: &str = "Total Count";
pub const UNIQUE_COUNT: &str = "Unique Count";
pub const TOTAL_OWNED: &str = "Total Owned";
pub const UNIQUE_OWNED: &str = "Unique Owned";
pub const UNIQUE_AVAILABLE: &str = "Unique Available";
pub const COUNT: &str = "Count";

pub const TYPE_COUNT_COLUMNS: [&str; 3] = [TYPE, TOTAL_COUNT, UNIQUE_COUNT];
pub const TYPE_ELEMENT_COUNT_COLUMNS: [&str; 4] = [TYPE, ELEMENT, TOTAL_COUNT, UNIQUE_COUNT];
pub const OWNED_COUNTED_COLUMNS: [&str; 2] = [NAME, COUNT];
pub const NOT_OWNED_COLUMNS: [&str; 1] = [NAME];
pub const CRAFTED_COLUMNS: [&str; 6] = [NAME_WITH_SEASON, NAME, TIER, TYPE, ARCHETYPE, CRAFTED_LEVEL];

/// Row count and distinct-name count of one group.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupCount {
    pub total: usize,
    names: BTreeSet<String>,
}

impl GroupCount {
    pub fn unique(&self) -> usize {
        self.names.len()
    }

    fn add(&mut self, row: RowRef<'_>) {
        self.total += 1;
        if let Some(name) = row.get(NAME).key() {
            self.names.insert(name);
        }
    }
}

fn bucket(cell: &Cell) -> String {
    cell.key().unwrap_or_else(|| UNKNOWN.to_string())
}

pub fn count_by_type(table: &Table) -> BTreeMap<String, GroupCount> {
    let mut groups: BTreeMap<String, GroupCount> = BTreeMap::new();
    for row in table.rows() {
        groups.entry(bucket(row.get(TYPE))).or_default().add(row);
    }
    groups
}

pub fn count_by_type_element(table: &Table) -> BTreeMap<(String, String), GroupCount> {
    let mut groups: BTreeMap<(String, String), GroupCount> = BTreeMap::new();
    for row in table.rows() {
        let key = (bucket(row.get(TYPE)), bucket(row.get(ELEMENT)));
        groups.entry(key).or_default().add(row);
    }
    groups
}

/// Types ordered by total count descending, ties by type name.
fn ranked_types(groups: &BTreeMap<String, GroupCount>) -> Vec<(&String, &GroupCount)> {
    let mut ranked: Vec<_> = groups.iter().collect();
    ranked.sort_by(|a, b| b.1.total.cmp(&a.1.total).then_with(|| a.0.cmp(b.0)));
    ranked
}

/// `(Weapon Type, Total Count, Unique Count)`, largest groups first.
pub fn type_count(table: &Table) -> Table {
    let groups = count_by_type(table);
    let mut out = Table::new(TYPE_COUNT_COLUMNS);
    for (weapon_type, count) in ranked_types(&groups) {
        out.push_row(vec![
            Cell::text(weapon_type),
            Cell::from(count.total),
            Cell::from(count.unique()),
        ]);
    }
    out
}

/// `(Weapon Type, Weapon Element, Total Count, Unique Count)` sorted by
/// type then element.
pub fn type_element_count(table: &Table) -> Table {
    let mut out = Table::new(TYPE_ELEMENT_COUNT_COLUMNS);
    for ((weapon_type, element), count) in count_by_type_element(table) {
        out.push_row(vec![
            Cell::text(weapon_type),
            Cell::text(element),
            Cell::from(count.total),
            Cell::from(count.unique()),
        ]);
    }
    out
}

fn unique_per_element(table: &Table) -> HashMap<(String, String), usize> {
    count_by_type_element(table)
        .into_iter()
        .map(|(key, count)| (key, count.unique()))
        .collect()
}

fn element_count(counts: &HashMap<(String, String), usize>, weapon_type: &str, element: &str) -> usize {
    counts
        .get(&(weapon_type.to_string(), element.to_string()))
        .copied()
        .unwrap_or(0)
}

/// Type count plus one column per element with the distinct names available.
pub fn coverage_without_inventory(catalog: &Table) -> Table {
    let groups = count_by_type(catalog);
    let per_element = unique_per_element(catalog);

    let mut out = Table::new(TYPE_COUNT_COLUMNS.iter().chain(ELEMENTS.iter()).copied());
    for (weapon_type, count) in ranked_types(&groups) {
        let mut cells = vec![
            Cell::text(weapon_type),
            Cell::from(count.total),
            Cell::from(count.unique()),
        ];
        cells.extend(
            ELEMENTS
                .iter()
                .map(|e| Cell::from(element_count(&per_element, weapon_type, e))),
        );
        out.push_row(cells);
    }
    out
}

pub fn coverage_with_inventory_columns() -> Vec<&'static str> {
    [TYPE, TOTAL_OWNED, UNIQUE_OWNED, UNIQUE_AVAILABLE]
        .into_iter()
        .chain(ELEMENTS)
        .collect()
}

/// Owned against available per type and element, element cells rendered as
/// `owned (of available)`. Every catalog type is listed, in catalog
/// type-count order; types only the inventory knows (such as the unknown
/// bucket) follow.
pub fn coverage_with_inventory(catalog: &Table, inventory: &Table) -> Table {
    let available = count_by_type(catalog);
    let owned = count_by_type(inventory);
    let available_per_element = unique_per_element(catalog);
    let owned_per_element = unique_per_element(inventory);

    let mut order: Vec<&String> = ranked_types(&available).into_iter().map(|(t, _)| t).collect();
    order.extend(
        ranked_types(&owned)
            .into_iter()
            .map(|(t, _)| t)
            .filter(|t| !available.contains_key(*t)),
    );

    let empty = GroupCount::default();
    let mut out = Table::new(coverage_with_inventory_columns());
    for weapon_type in order {
        let have = owned.get(weapon_type).unwrap_or(&empty);
        let of = available.get(weapon_type).unwrap_or(&empty);
        let mut cells = vec![
            Cell::text(weapon_type),
            Cell::from(have.total),
            Cell::from(have.unique()),
            Cell::from(of.unique()),
        ];
        cells.extend(ELEMENTS.iter().map(|e| {
            Cell::Text(format!(
                "{} (of {})",
                element_count(&owned_per_element, weapon_type, e),
                element_count(&available_per_element, weapon_type, e)
            ))
        }));
        out.push_row(cells);
    }
    out
}

/// `(Weapon Name, Count)` of owned instances, most duplicated first.
pub fn owned_counted_list(inventory: &Table) -> Table {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in inventory.rows() {
        *counts.entry(bucket(row.get(NAME))).or_default() += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    let mut out = Table::new(OWNED_COUNTED_COLUMNS);
    for (name, count) in ranked {
        out.push_row(vec![Cell::Text(name), Cell::from(count)]);
    }
    out
}

/// Catalog names with no owned instance, ascending.
pub fn not_owned_list(catalog: &Table, inventory: &Table) -> Table {
    let owned: BTreeSet<String> = inventory.column(NAME).filter_map(Cell::key).collect();
    let mut out = Table::new(NOT_OWNED_COLUMNS);
    for name in catalog.distinct(NAME) {
        if !owned.contains(&name) {
            out.push_row(vec![Cell::Text(name)]);
        }
    }
    out
}

fn is_crafted(cell: &Cell) -> bool {
    match cell {
        Cell::Bool(v) => *v,
        Cell::Int(v) => *v != 0,
        _ => false,
    }
}

/// Crafted instances, highest crafted level first.
pub fn crafted_list(inventory: &Table) -> Table {
    let mut crafted = inventory
        .filter_rows(|row| is_crafted(row.get(CRAFTED)))
        .select(&CRAFTED_COLUMNS);
    crafted.sort_rows_by(|a, b| {
        match (a.get(CRAFTED_LEVEL).as_f64(), b.get(CRAFTED_LEVEL).as_f64()) {
            (Some(x), Some(y)) => y.partial_cmp(&x).unwrap_or(Ordering::Equal),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });
    crafted
}
