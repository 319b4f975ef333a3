use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::core_api::{CoreError, CoreErrorCode};
use crate::fingerprint::Fingerprint;
use crate::table::{Cell, Table};

/// Stat bonus applied to each of the six stats by masterworking.
pub const MASTERWORK_STAT_BONUS: i64 = 2;
pub const MASTERWORK_TOTAL_BONUS: i64 = MASTERWORK_STAT_BONUS * 6;

const REQUIRED_COLUMNS: [&str; 14] = [
    "Name",
    "Hash",
    "Id",
    "Tier",
    "Type",
    "Equippable",
    "Energy Capacity",
    "Mobility (Base)",
    "Resilience (Base)",
    "Recovery (Base)",
    "Discipline (Base)",
    "Intellect (Base)",
    "Strength (Base)",
    "Total (Base)",
];

pub const ARMOUR_COLUMNS: [&str; 31] = [
    "Name",
    "Hash",
    "id",
    "Tier",
    "Type",
    "Character",
    "MW_Tier",
    "base_mob",
    "base_res",
    "base_rec",
    "base_dis",
    "base_int",
    "base_str",
    "base_total",
    "base_mob_res",
    "base_mob_rec",
    "base_res_rec",
    "base_group_1",
    "base_group_2",
    "mw_mob",
    "mw_res",
    "mw_rec",
    "mw_dis",
    "mw_int",
    "mw_str",
    "mw_total",
    "mw_mob_res",
    "mw_mob_rec",
    "mw_res_rec",
    "mw_group_1",
    "mw_group_2",
];

#[derive(Debug, Deserialize)]
struct ArmourRecord {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Hash")]
    hash: i64,
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "Tier")]
    tier: String,
    #[serde(rename = "Type")]
    item_type: String,
    #[serde(rename = "Equippable")]
    equippable: String,
    #[serde(rename = "Energy Capacity", default)]
    energy_capacity: Option<i64>,
    #[serde(rename = "Mobility (Base)", default)]
    mobility: Option<i32>,
    #[serde(rename = "Resilience (Base)", default)]
    resilience: Option<i32>,
    #[serde(rename = "Recovery (Base)", default)]
    recovery: Option<i32>,
    #[serde(rename = "Discipline (Base)", default)]
    discipline: Option<i32>,
    #[serde(rename = "Intellect (Base)", default)]
    intellect: Option<i32>,
    #[serde(rename = "Strength (Base)", default)]
    strength: Option<i32>,
    #[serde(rename = "Total (Base)", default)]
    total: Option<i32>,
}

/// The six base stats of one armour piece. A blank stat stays `None`, and
/// so does every sum that includes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ArmourStats {
    pub mob: Option<i64>,
    pub res: Option<i64>,
    pub rec: Option<i64>,
    pub dis: Option<i64>,
    pub int: Option<i64>,
    pub str: Option<i64>,
    pub total: Option<i64>,
}

impl ArmourStats {
    pub fn masterworked(&self) -> Self {
        Self {
            mob: sum(&[self.mob, Some(MASTERWORK_STAT_BONUS)]),
            res: sum(&[self.res, Some(MASTERWORK_STAT_BONUS)]),
            rec: sum(&[self.rec, Some(MASTERWORK_STAT_BONUS)]),
            dis: sum(&[self.dis, Some(MASTERWORK_STAT_BONUS)]),
            int: sum(&[self.int, Some(MASTERWORK_STAT_BONUS)]),
            str: sum(&[self.str, Some(MASTERWORK_STAT_BONUS)]),
            total: sum(&[self.total, Some(MASTERWORK_TOTAL_BONUS)]),
        }
    }

    pub fn mob_res(&self) -> Option<i64> {
        sum(&[self.mob, self.res])
    }

    pub fn mob_rec(&self) -> Option<i64> {
        sum(&[self.mob, self.rec])
    }

    pub fn res_rec(&self) -> Option<i64> {
        sum(&[self.res, self.rec])
    }

    pub fn group_1(&self) -> Option<i64> {
        sum(&[self.mob, self.res, self.rec])
    }

    pub fn group_2(&self) -> Option<i64> {
        sum(&[self.dis, self.int, self.str])
    }
}

/// `None` when any term is missing or the sum leaves `i64`.
fn sum(terms: &[Option<i64>]) -> Option<i64> {
    terms
        .iter()
        .try_fold(0i64, |acc, term| term.and_then(|v| acc.checked_add(v)))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArmourPiece {
    pub name: String,
    pub hash: i64,
    pub id: String,
    pub tier: String,
    pub item_type: String,
    pub character: String,
    pub masterwork_tier: Option<i64>,
    pub base: ArmourStats,
}

impl ArmourPiece {
    pub fn masterworked(&self) -> ArmourStats {
        self.base.masterworked()
    }
}

/// Fold class-specific and verbose type names into short categories.
pub fn normalize_armour_type(raw: &str) -> String {
    match raw.trim() {
        "Hunter Cloak" | "Warlock Bond" | "Titan Mark" => "Class Item".to_string(),
        "Chest Armor" | "Chest armour" | "Chest Armour" => "Chest".to_string(),
        "Leg Armor" | "Leg armour" | "Leg Armour" => "Legs".to_string(),
        other => other.to_string(),
    }
}

#[derive(Debug, Clone)]
pub struct ArmourInventory {
    pieces: Vec<ArmourPiece>,
    fingerprint: Fingerprint,
}

impl ArmourInventory {
    pub fn from_bytes(bytes: &[u8], source: &str) -> Result<Self, CoreError> {
        Self::from_reader(bytes, source)
    }

    pub fn from_reader<R: Read>(reader: R, source: &str) -> Result<Self, CoreError> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers().map_err(|e| malformed(source, e))?.clone();
        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !headers.iter().any(|h| h == *c))
            .collect();
        if !missing.is_empty() {
            return Err(CoreError::new(
                CoreErrorCode::MalformedInput,
                format!("{source}: missing required column(s): {}", missing.join(", ")),
            ));
        }

        let mut pieces = Vec::new();
        for (index, record) in rdr.records().enumerate() {
            let row_error = |e: &dyn std::fmt::Display| {
                CoreError::new(
                    CoreErrorCode::MalformedInput,
                    format!("{source}: row {}: {e}", index + 1),
                )
            };
            let record = record.map_err(|e| row_error(&e))?;
            if record.len() > headers.len() {
                return Err(row_error(&format!(
                    "{} fields, header has {}",
                    record.len(),
                    headers.len()
                )));
            }
            let record: ArmourRecord = record
                .deserialize(Some(&headers))
                .map_err(|e| row_error(&e))?;
            pieces.push(ArmourPiece {
                name: record.name,
                hash: record.hash,
                id: record.id,
                tier: record.tier,
                item_type: normalize_armour_type(&record.item_type),
                character: record.equippable,
                masterwork_tier: record.energy_capacity,
                base: ArmourStats {
                    mob: record.mobility.map(i64::from),
                    res: record.resilience.map(i64::from),
                    rec: record.recovery.map(i64::from),
                    dis: record.discipline.map(i64::from),
                    int: record.intellect.map(i64::from),
                    str: record.strength.map(i64::from),
                    total: record.total.map(i64::from),
                },
            });
        }

        let fingerprint = pieces_table(&pieces).fingerprint();
        tracing::debug!(source, pieces = pieces.len(), "armour inventory loaded");
        Ok(Self {
            pieces,
            fingerprint,
        })
    }

    pub fn pieces(&self) -> &[ArmourPiece] {
        &self.pieces
    }

    pub fn len(&self) -> usize {
        self.pieces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pieces.is_empty()
    }

    pub fn fingerprint(&self) -> Fingerprint {
        self.fingerprint
    }

    /// Base stats, renamed columns and the derived base/masterworked sums.
    pub fn to_table(&self) -> Table {
        pieces_table(&self.pieces)
    }
}

fn pieces_table(pieces: &[ArmourPiece]) -> Table {
    let mut table = Table::new(ARMOUR_COLUMNS);
    for piece in pieces {
        let b = piece.base;
        let mw = piece.masterworked();
        table.push_row(vec![
            Cell::text(&piece.name),
            Cell::Int(piece.hash),
            Cell::text(&piece.id),
            Cell::text(&piece.tier),
            Cell::text(&piece.item_type),
            Cell::text(&piece.character),
            Cell::from(piece.masterwork_tier),
            Cell::from(b.mob),
            Cell::from(b.res),
            Cell::from(b.rec),
            Cell::from(b.dis),
            Cell::from(b.int),
            Cell::from(b.str),
            Cell::from(b.total),
            Cell::from(b.mob_res()),
            Cell::from(b.mob_rec()),
            Cell::from(b.res_rec()),
            Cell::from(b.group_1()),
            Cell::from(b.group_2()),
            Cell::from(mw.mob),
            Cell::from(mw.res),
            Cell::from(mw.rec),
            Cell::from(mw.dis),
            Cell::from(mw.int),
            Cell::from(mw.str),
            Cell::from(mw.total),
            Cell::from(mw.mob_res()),
            Cell::from(mw.mob_rec()),
            Cell::from(mw.res_rec()),
            Cell::from(mw.group_1()),
            Cell::from(mw.group_2()),
        ]);
    }
    table
}

fn malformed(source: &str, e: csv::Error) -> CoreError {
    CoreError::new(CoreErrorCode::MalformedInput, format!("{source}: {e}"))
}

#[cfg(test)]
mod tests {
    use super::{ArmourStats, normalize_armour_type};

    #[test]
    fn masterwork_adds_two_per_stat_and_twelve_total() {
        let base = ArmourStats {
            mob: Some(10),
            res: Some(10),
            rec: Some(10),
            dis: Some(2),
            int: Some(2),
            str: Some(2),
            total: Some(36),
        };
        let mw = base.masterworked();
        assert_eq!(mw.mob, Some(12));
        assert_eq!(base.group_1(), Some(30));
        assert_eq!(mw.group_1(), Some(36));
        assert_eq!(mw.group_2(), Some(12));
        assert_eq!(mw.total, Some(48));
        assert_eq!(mw.mob_res(), Some(24));
    }

    #[test]
    fn sums_never_overflow() {
        let base = ArmourStats {
            mob: Some(i64::MAX),
            res: Some(1),
            ..ArmourStats::default()
        };
        assert_eq!(base.masterworked().mob, None);
        assert_eq!(base.mob_res(), None);
    }

    #[test]
    fn class_items_collapse() {
        assert_eq!(normalize_armour_type("Hunter Cloak"), "Class Item");
        assert_eq!(normalize_armour_type("Warlock Bond"), "Class Item");
        assert_eq!(normalize_armour_type("Titan Mark"), "Class Item");
        assert_eq!(normalize_armour_type("Chest Armor"), "Chest");
        assert_eq!(normalize_armour_type("Leg armour"), "Legs");
        assert_eq!(normalize_armour_type("Helmet"), "Helmet");
    }
}
