//! Column names of the catalog and of the exported inventory files.
//!
//! These are exact-match contracts: a renamed column in an upload is a load
//! failure, not a silently empty field.

pub const NAME_WITH_SEASON: &str = "Weapon Name With Season";
pub const NAME: &str = "Weapon Name";
pub const SEASON: &str = "Weapon Season";
pub const HASH: &str = "Weapon Hash";
pub const INSTANCE_ID: &str = "Weapon ID";
pub const TIER: &str = "Weapon Tier";
pub const TYPE: &str = "Weapon Type";
pub const ARCHETYPE: &str = "Weapon Archetype";
pub const SLOT: &str = "Weapon Slot";
pub const ELEMENT: &str = "Weapon Element";
pub const CURRENT_VERSION: &str = "Weapon Current Version";
pub const POWER_CAP: &str = "Weapon Power Cap";
pub const IS_SUNSET: &str = "Is Sunset";

pub const CATALOG_RANGE_SOURCE: &str = "Weapon Range";
pub const RANGE: &str = "Range";

pub const CRAFTED: &str = "Crafted";
pub const CRAFTED_LEVEL: &str = "Crafted Level";

/// Identity and classification columns of a catalog row, in display order.
pub const CATALOG_LEADING: [&str; 12] = [
    NAME_WITH_SEASON,
    NAME,
    SEASON,
    HASH,
    TIER,
    TYPE,
    ARCHETYPE,
    SLOT,
    ELEMENT,
    CURRENT_VERSION,
    POWER_CAP,
    IS_SUNSET,
];

/// Same as [`CATALOG_LEADING`] with the owned-instance id after the hash.
pub const INVENTORY_LEADING: [&str; 13] = [
    NAME_WITH_SEASON,
    NAME,
    SEASON,
    HASH,
    INSTANCE_ID,
    TIER,
    TYPE,
    ARCHETYPE,
    SLOT,
    ELEMENT,
    CURRENT_VERSION,
    POWER_CAP,
    IS_SUNSET,
];

pub const RAW_HASH: &str = "Hash";
pub const RAW_ID: &str = "Id";

/// Raw export columns superseded by the catalog join or irrelevant to it.
pub const INVENTORY_DENY_LIST: [&str; 41] = [
    "Name",
    "Hash",
    "Tag",
    "Source",
    "Tier",
    "Type",
    "Category",
    "Element",
    "Power",
    "Power Limit",
    "Owner",
    "Locked",
    "Equipped",
    "Year",
    "Season",
    "Event",
    "Recoil",
    "AA",
    "Impact",
    "Range",
    "Zoom",
    "Blast Radius",
    "Velocity",
    "Stability",
    "ROF",
    "Reload",
    "Mag",
    "Handling",
    "Charge Time",
    "Guard Resistance",
    "Draw Time",
    "Accuracy",
    "Charge Rate",
    "Guard Efficiency",
    "Swing Speed",
    "Shield Duration",
    "Kill Tracker",
    "Foundry",
    "Loadouts",
    "Notes",
    "Perks 0",
];

pub const ELEMENTS: [&str; 6] = ["Kinetic", "Stasis", "Strand", "Arc", "Solar", "Void"];

pub const TIERS: [&str; 5] = ["Exotic", "Legendary", "Rare", "Common", "Basic"];
pub const DEFAULT_TIER: &str = "Legendary";

/// Grouping bucket for rows whose classification is missing (orphaned
/// inventory rows).
pub const UNKNOWN: &str = "Unknown";

pub const PERK_GROUP_PREFIX: &str = "Perks ";
pub const PERK_SEPARATOR: &str = ", ";

/// `Perks N` with N >= 1; `Perks 0` is intrinsic and never a perk group.
pub fn perk_group_ordinal(column: &str) -> Option<usize> {
    let n: usize = column.strip_prefix(PERK_GROUP_PREFIX)?.parse().ok()?;
    (n >= 1).then_some(n)
}

/// `Slot K Perk J` -> `(K, J)`.
pub fn slot_option_position(column: &str) -> Option<(u8, u8)> {
    let mut parts = column.split_whitespace();
    if parts.next()? != "Slot" {
        return None;
    }
    let slot: u8 = parts.next()?.parse().ok()?;
    if parts.next()? != "Perk" {
        return None;
    }
    let option: u8 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || !(1..=4).contains(&slot) {
        return None;
    }
    Some((slot, option))
}

/// Collapse an enumerated option label to its slot group:
/// `Slot 1 Perk 0` -> `Slot 1`.
pub fn slot_group_label(column: &str) -> String {
    column.split_whitespace().take(2).collect::<Vec<_>>().join(" ")
}
