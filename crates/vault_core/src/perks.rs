//! Recovering which physical slot each equipped perk occupies.
//!
//! The export lists equipped perks as free text per `Perks N` group; the
//! catalog enumerates, per slot and option position, the perk offered
//! there. A token is placed by substring match against the enumerated
//! options of its item. This is a best-effort matcher: every candidate
//! column is kept so tokens that land in several slots, or in none, can be
//! inspected instead of silently mis-assigned.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::catalog::{Catalog, SlotOptionColumn};
use crate::columns::{HASH, INSTANCE_ID, NAME, PERK_SEPARATOR};
use crate::core_api::{CoreError, CoreErrorCode, CoreWarning};
use crate::inventory::{PerkGroupColumn, WeaponInventory};
use crate::table::{Cell, RowRef, Table};

pub const PERK_ASSIGNMENT_COLUMNS: [&str; 5] = [NAME, HASH, INSTANCE_ID, "Slot", "Perk"];

/// One equipped perk placed in one physical slot of an owned weapon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerkAssignment {
    pub weapon_name: Option<String>,
    pub item_hash: Option<i64>,
    /// Text form of the inventory's `Weapon ID` cell.
    pub instance_id: String,
    /// `Slot 1` ..= `Slot 4`.
    pub slot: String,
    pub perk: String,
    /// Group number of the `Perks N` column the token came from.
    pub group: usize,
    /// 1-based position of the token inside its cell.
    pub ordinal: usize,
    /// The token also matched options of another slot group.
    pub ambiguous: bool,
}

/// A token whose placement is not unique: no candidates, or candidates in
/// more than one slot group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PerkSlotDiagnostic {
    pub weapon_name: Option<String>,
    pub item_hash: Option<i64>,
    pub instance_id: String,
    pub perk: String,
    pub candidates: Vec<String>,
}

impl PerkSlotDiagnostic {
    pub fn is_unmatched(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn to_warning(&self) -> CoreWarning {
        CoreWarning::AmbiguousPerkSlot {
            instance_id: self.instance_id.clone(),
            perk: self.perk.clone(),
            candidates: self.candidates.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PerkExplosion {
    pub assignments: Vec<PerkAssignment>,
    pub diagnostics: Vec<PerkSlotDiagnostic>,
}

/// Equipped-perk columns and enumerated slot columns, resolved once per
/// (inventory, catalog) pair.
#[derive(Debug, Clone)]
pub struct PerkLayout<'a> {
    pub groups: &'a [PerkGroupColumn],
    pub slot_options: &'a [SlotOptionColumn],
}

impl<'a> PerkLayout<'a> {
    pub fn new(inventory: &'a WeaponInventory, catalog: &'a Catalog) -> Self {
        Self {
            groups: inventory.perk_groups(),
            slot_options: catalog.slot_option_columns(),
        }
    }
}

/// Every enumerated option column of `item` whose text contains `token`,
/// in catalog column order.
pub fn slot_candidates<'a>(
    token: &str,
    item: RowRef<'_>,
    slot_options: &'a [SlotOptionColumn],
) -> Vec<&'a SlotOptionColumn> {
    if token.is_empty() {
        return Vec::new();
    }
    slot_options
        .iter()
        .filter(|option| {
            let cell = item.get(&option.column);
            match cell {
                Cell::Empty => false,
                Cell::Text(s) => s.contains(token),
                other => other.to_string().contains(token),
            }
        })
        .collect()
}

/// Split an equipped-perk cell into its non-empty tokens.
pub fn perk_tokens(cell: &Cell) -> Vec<String> {
    match cell {
        Cell::Empty => Vec::new(),
        Cell::Text(s) => s
            .split(PERK_SEPARATOR)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect(),
        other => vec![other.to_string()],
    }
}

/// Flatten the inventory into one row per (instance, slot, perk). Rows
/// without a catalog entry are skipped; they already carry an
/// `UnmatchedForeignKey` warning from the load.
pub fn explode_perks(inventory: &WeaponInventory, catalog: &Catalog) -> PerkExplosion {
    let layout = PerkLayout::new(inventory, catalog);
    let mut out = PerkExplosion::default();

    for row in inventory.table().rows() {
        let item_hash = row.get(HASH).as_i64();
        let weapon_name = row.get(NAME).as_str().map(str::to_string);
        let instance_id = row.get(INSTANCE_ID).to_string();
        let Some(item) = item_hash.and_then(|h| catalog.get(h)) else {
            continue;
        };

        for group in layout.groups {
            for (position, token) in perk_tokens(row.get(&group.column)).into_iter().enumerate() {
                let candidates = slot_candidates(&token, item, layout.slot_options);
                let slots: BTreeSet<u8> = candidates.iter().map(|c| c.slot).collect();

                if slots.len() != 1 {
                    let diagnostic = PerkSlotDiagnostic {
                        weapon_name: weapon_name.clone(),
                        item_hash,
                        instance_id: instance_id.clone(),
                        perk: token.clone(),
                        candidates: candidates.iter().map(|c| c.column.clone()).collect(),
                    };
                    tracing::warn!(warning = %diagnostic.to_warning(), "perk slot not unique");
                    out.diagnostics.push(diagnostic);
                }

                let Some(first) = candidates.first() else {
                    continue;
                };
                out.assignments.push(PerkAssignment {
                    weapon_name: weapon_name.clone(),
                    item_hash,
                    instance_id: instance_id.clone(),
                    slot: first.slot_label(),
                    perk: token,
                    group: group.ordinal,
                    ordinal: position + 1,
                    ambiguous: slots.len() > 1,
                });
            }
        }
    }

    tracing::debug!(
        assignments = out.assignments.len(),
        diagnostics = out.diagnostics.len(),
        "perks exploded"
    );
    out
}

impl PerkExplosion {
    /// Long relation `(Weapon Name, Weapon Hash, Weapon ID, Slot, Perk)`.
    pub fn to_table(&self) -> Table {
        assignments_table(self.assignments.iter())
    }

    /// Assignments placed in `slot` whose perk is one of `perks`.
    pub fn in_slot<'a>(
        &'a self,
        slot: &'a str,
        perks: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a PerkAssignment> + 'a {
        self.assignments
            .iter()
            .filter(move |a| a.slot == slot && perks.contains(&a.perk))
    }

    /// Instances satisfying every non-empty slot predicate of `query`.
    /// An empty query matches every instance with at least one assignment.
    pub fn matching_instances(&self, query: &PerkQuery) -> BTreeSet<String> {
        let mut result: Option<BTreeSet<String>> = None;
        for (slot, perks) in query.predicates() {
            let hits: BTreeSet<String> = self
                .in_slot(slot, perks)
                .map(|a| a.instance_id.clone())
                .collect();
            result = Some(match result {
                Some(acc) => acc.intersection(&hits).cloned().collect(),
                None => hits,
            });
        }
        result.unwrap_or_else(|| {
            self.assignments
                .iter()
                .map(|a| a.instance_id.clone())
                .collect()
        })
    }

    /// Every assignment of the instances selected by `query`.
    pub fn filtered_table(&self, query: &PerkQuery) -> Table {
        let instances = self.matching_instances(query);
        assignments_table(
            self.assignments
                .iter()
                .filter(|a| instances.contains(&a.instance_id)),
        )
    }
}

fn assignments_table<'a>(assignments: impl Iterator<Item = &'a PerkAssignment>) -> Table {
    let mut table = Table::new(PERK_ASSIGNMENT_COLUMNS);
    for a in assignments {
        table.push_row(vec![
            Cell::from(a.weapon_name.clone()),
            Cell::from(a.item_hash),
            Cell::parse(&a.instance_id),
            Cell::text(&a.slot),
            Cell::text(&a.perk),
        ]);
    }
    table
}

/// Accepted perks per slot, e.g. `Slot 3 = {Outlaw, Rapid Hit}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PerkQuery {
    slots: BTreeMap<String, BTreeSet<String>>,
}

impl PerkQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, slot: impl Into<String>, perk: impl Into<String>) -> Self {
        self.insert(slot, perk);
        self
    }

    pub fn insert(&mut self, slot: impl Into<String>, perk: impl Into<String>) {
        self.slots
            .entry(slot.into())
            .or_default()
            .insert(perk.into());
    }

    /// Parse `Slot N=Perk Name`.
    pub fn parse_predicate(&mut self, predicate: &str) -> Result<(), CoreError> {
        let Some((slot, perk)) = predicate.split_once('=') else {
            return Err(CoreError::new(
                CoreErrorCode::MalformedInput,
                format!("perk filter '{predicate}' is not of the form 'Slot N=Perk'"),
            ));
        };
        let slot = slot.trim();
        let valid_slot = slot
            .strip_prefix("Slot ")
            .and_then(|n| n.parse::<u8>().ok())
            .is_some_and(|n| (1..=4).contains(&n));
        if !valid_slot || perk.trim().is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::MalformedInput,
                format!("perk filter '{predicate}' needs a slot 'Slot 1'..'Slot 4' and a perk"),
            ));
        }
        self.insert(slot, perk.trim());
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.slots.values().all(BTreeSet::is_empty)
    }

    pub fn predicates(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.slots
            .iter()
            .filter(|(_, perks)| !perks.is_empty())
            .map(|(slot, perks)| (slot.as_str(), perks))
    }
}
