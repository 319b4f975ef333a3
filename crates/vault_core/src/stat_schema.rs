//! Which stat columns are meaningful for which weapon type.
//!
//! The catalog is a union schema: every row carries every stat column, and
//! the weapon type decides which of them are read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::columns::{CATALOG_LEADING, RANGE};
use crate::core_api::{CoreError, CoreErrorCode};
use crate::table::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeaponType {
    AutoRifle,
    HandCannon,
    MachineGun,
    PulseRifle,
    ScoutRifle,
    Shotgun,
    Sidearm,
    SniperRifle,
    SubmachineGun,
    TraceRifle,
    CombatBow,
    FusionRifle,
    LinearFusionRifle,
    GrenadeLauncher,
    RocketLauncher,
    Glaive,
    Sword,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatSchema {
    Primary,
    Bow,
    Fusion,
    Explosive,
    Glaive,
    Sword,
}

const PRIMARY_STATS: &[&str] = &[
    "Impact",
    RANGE,
    "Stability",
    "Handling",
    "Reload Speed",
    "Aim Assistance",
    "Zoom",
    "Airborne Effectiveness",
    "Recoil Direction",
    "Rounds Per Minute",
    "Magazine",
];

const BOW_STATS: &[&str] = &[
    "Impact",
    "Accuracy",
    "Stability",
    "Handling",
    "Reload Speed",
    "Aim Assistance",
    "Zoom",
    "Airborne Effectiveness",
    "Recoil Direction",
    "Draw Time",
];

const FUSION_STATS: &[&str] = &[
    "Impact",
    RANGE,
    "Stability",
    "Handling",
    "Reload Speed",
    "Aim Assistance",
    "Zoom",
    "Airborne Effectiveness",
    "Recoil Direction",
    "Charge Time",
    "Magazine",
];

const EXPLOSIVE_STATS: &[&str] = &[
    "Blast Radius",
    "Velocity",
    "Stability",
    "Handling",
    "Reload Speed",
    "Aim Assistance",
    "Zoom",
    "Airborne Effectiveness",
    "Recoil Direction",
    "Rounds Per Minute",
    "Magazine",
];

const GLAIVE_STATS: &[&str] = &[
    "Impact",
    RANGE,
    "Shield Duration",
    "Handling",
    "Reload Speed",
    "Aim Assistance",
    "Airborne Effectiveness",
    "Rounds Per Minute",
    "Charge Time",
    "Magazine",
];

const SWORD_STATS: &[&str] = &[
    "Impact",
    "Swing Speed",
    "Guard Efficiency",
    "Guard Resistance",
    "Charge Rate",
    "Ammo Capacity",
];

impl StatSchema {
    pub const ALL: [StatSchema; 6] = [
        StatSchema::Primary,
        StatSchema::Bow,
        StatSchema::Fusion,
        StatSchema::Explosive,
        StatSchema::Glaive,
        StatSchema::Sword,
    ];

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Self::Primary => PRIMARY_STATS,
            Self::Bow => BOW_STATS,
            Self::Fusion => FUSION_STATS,
            Self::Explosive => EXPLOSIVE_STATS,
            Self::Glaive => GLAIVE_STATS,
            Self::Sword => SWORD_STATS,
        }
    }
}

impl WeaponType {
    pub const ALL: [WeaponType; 17] = [
        WeaponType::AutoRifle,
        WeaponType::HandCannon,
        WeaponType::MachineGun,
        WeaponType::PulseRifle,
        WeaponType::ScoutRifle,
        WeaponType::Shotgun,
        WeaponType::Sidearm,
        WeaponType::SniperRifle,
        WeaponType::SubmachineGun,
        WeaponType::TraceRifle,
        WeaponType::CombatBow,
        WeaponType::FusionRifle,
        WeaponType::LinearFusionRifle,
        WeaponType::GrenadeLauncher,
        WeaponType::RocketLauncher,
        WeaponType::Glaive,
        WeaponType::Sword,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::AutoRifle => "Auto Rifle",
            Self::HandCannon => "Hand Cannon",
            Self::MachineGun => "Machine Gun",
            Self::PulseRifle => "Pulse Rifle",
            Self::ScoutRifle => "Scout Rifle",
            Self::Shotgun => "Shotgun",
            Self::Sidearm => "Sidearm",
            Self::SniperRifle => "Sniper Rifle",
            Self::SubmachineGun => "Submachine Gun",
            Self::TraceRifle => "Trace Rifle",
            Self::CombatBow => "Combat Bow",
            Self::FusionRifle => "Fusion Rifle",
            Self::LinearFusionRifle => "Linear Fusion Rifle",
            Self::GrenadeLauncher => "Grenade Launcher",
            Self::RocketLauncher => "Rocket Launcher",
            Self::Glaive => "Glaive",
            Self::Sword => "Sword",
        }
    }

    pub fn schema(self) -> StatSchema {
        match self {
            Self::AutoRifle
            | Self::HandCannon
            | Self::MachineGun
            | Self::PulseRifle
            | Self::ScoutRifle
            | Self::Shotgun
            | Self::Sidearm
            | Self::SniperRifle
            | Self::SubmachineGun
            | Self::TraceRifle => StatSchema::Primary,
            Self::CombatBow => StatSchema::Bow,
            Self::FusionRifle | Self::LinearFusionRifle => StatSchema::Fusion,
            Self::GrenadeLauncher | Self::RocketLauncher => StatSchema::Explosive,
            Self::Glaive => StatSchema::Glaive,
            Self::Sword => StatSchema::Sword,
        }
    }

    /// Identity columns followed by this type's stat columns.
    pub fn projection(self) -> Vec<&'static str> {
        CATALOG_LEADING
            .iter()
            .chain(self.schema().columns())
            .copied()
            .collect()
    }
}

impl fmt::Display for WeaponType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeaponType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                CoreError::new(
                    CoreErrorCode::UnknownWeaponType,
                    format!("no stat schema for weapon type '{s}'"),
                )
            })
    }
}

/// Schemas whose columns are not all present in `table`, with the missing
/// column names.
pub fn missing_stat_columns(table: &Table) -> Vec<(StatSchema, Vec<&'static str>)> {
    StatSchema::ALL
        .iter()
        .filter_map(|&schema| {
            let missing: Vec<&'static str> = schema
                .columns()
                .iter()
                .copied()
                .filter(|c| !table.has_column(c))
                .collect();
            (!missing.is_empty()).then_some((schema, missing))
        })
        .collect()
}

/// Horizontal slice for one weapon type: identity columns plus the stats
/// that type uses. Rows are taken as given; narrow them beforehand.
pub fn stat_table(table: &Table, weapon_type: WeaponType) -> Table {
    table.select(&weapon_type.projection())
}
