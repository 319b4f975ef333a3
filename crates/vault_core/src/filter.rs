//! Cascading categorical filters.
//!
//! Filters narrow a table in a fixed order: tier, type, archetype, slot,
//! element, sunset status. The options offered for each picker are computed
//! from the table narrowed only by the pickers upstream of it, so a choice
//! can never offer an option that would produce an empty result upstream.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::columns::{ARCHETYPE, ELEMENT, IS_SUNSET, SLOT, TIER, TIERS, TYPE};
use crate::fingerprint::Fingerprinter;
use crate::table::{Cell, RowRef, Table};

/// Sentinel accepted by single-select pickers for "no restriction".
pub const SELECT_ALL: &str = "Select all";

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Selector {
    #[default]
    All,
    Only(String),
}

impl Selector {
    pub fn only(value: impl Into<String>) -> Self {
        Self::Only(value.into())
    }

    pub fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    pub fn matches(&self, cell: &Cell) -> bool {
        match self {
            Self::All => true,
            Self::Only(value) => cell.key().as_deref() == Some(value.as_str()),
        }
    }

    fn feed(&self, hasher: &mut Fingerprinter) {
        match self {
            Self::All => {
                hasher.tag(0);
            }
            Self::Only(value) => {
                hasher.tag(1).str(value);
            }
        }
    }
}

impl FromStr for Selector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s == SELECT_ALL {
            Ok(Self::All)
        } else {
            Ok(Self::Only(s.to_string()))
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(SELECT_ALL),
            Self::Only(value) => f.write_str(value),
        }
    }
}

/// Picker positions, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterStage {
    Tier,
    Type,
    Archetype,
    Slot,
    Element,
    Sunset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct FilterSelection {
    /// Empty means every tier.
    pub tiers: BTreeSet<String>,
    pub weapon_type: Selector,
    pub archetype: Selector,
    pub slot: Selector,
    pub element: Selector,
    /// Keep only rows whose `Is Sunset` is `No`.
    pub exclude_sunset: bool,
}

impl FilterSelection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tiers<I, S>(mut self, tiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tiers = tiers.into_iter().map(Into::into).collect();
        self
    }

    fn keeps(&self, stage: FilterStage, row: RowRef<'_>) -> bool {
        match stage {
            FilterStage::Tier => {
                self.tiers.is_empty()
                    || row
                        .get(TIER)
                        .key()
                        .is_some_and(|tier| self.tiers.contains(&tier))
            }
            FilterStage::Type => self.weapon_type.matches(row.get(TYPE)),
            FilterStage::Archetype => self.archetype.matches(row.get(ARCHETYPE)),
            FilterStage::Slot => self.slot.matches(row.get(SLOT)),
            FilterStage::Element => self.element.matches(row.get(ELEMENT)),
            FilterStage::Sunset => {
                !self.exclude_sunset || row.get(IS_SUNSET).as_str() == Some("No")
            }
        }
    }

    fn apply_stages(&self, table: &Table, stages: &[FilterStage]) -> Table {
        table.filter_rows(|row| stages.iter().all(|&stage| self.keeps(stage, row)))
    }

    /// Rows surviving every filter stage strictly before `stage`.
    pub fn apply_upstream_of(&self, table: &Table, stage: FilterStage) -> Table {
        let stages: Vec<FilterStage> = ALL_STAGES.into_iter().filter(|s| *s < stage).collect();
        self.apply_stages(table, &stages)
    }

    /// Full cascade.
    pub fn apply(&self, table: &Table) -> Table {
        self.apply_stages(table, &ALL_STAGES)
    }

    /// Tier and sunset only, for summary views that group by the other
    /// classifications themselves.
    pub fn apply_reduced(&self, table: &Table) -> Table {
        self.apply_stages(table, &[FilterStage::Tier, FilterStage::Sunset])
    }

    pub fn feed(&self, hasher: &mut Fingerprinter) {
        hasher.u64(self.tiers.len() as u64);
        for tier in &self.tiers {
            hasher.str(tier);
        }
        self.weapon_type.feed(hasher);
        self.archetype.feed(hasher);
        self.slot.feed(hasher);
        self.element.feed(hasher);
        hasher.tag(u8::from(self.exclude_sunset));
    }
}

const ALL_STAGES: [FilterStage; 6] = [
    FilterStage::Tier,
    FilterStage::Type,
    FilterStage::Archetype,
    FilterStage::Slot,
    FilterStage::Element,
    FilterStage::Sunset,
];

pub fn tier_options() -> Vec<String> {
    TIERS.iter().map(|t| t.to_string()).collect()
}

pub fn type_options(table: &Table, selection: &FilterSelection) -> Vec<String> {
    selection
        .apply_upstream_of(table, FilterStage::Type)
        .distinct(TYPE)
}

pub fn archetype_options(table: &Table, selection: &FilterSelection) -> Vec<String> {
    selection
        .apply_upstream_of(table, FilterStage::Archetype)
        .distinct(ARCHETYPE)
}

pub fn slot_options(table: &Table, selection: &FilterSelection) -> Vec<String> {
    selection
        .apply_upstream_of(table, FilterStage::Slot)
        .distinct(SLOT)
}

pub fn element_options(table: &Table, selection: &FilterSelection) -> Vec<String> {
    selection
        .apply_upstream_of(table, FilterStage::Element)
        .distinct(ELEMENT)
}

/// Every picker's options under one selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterOptions {
    pub tiers: Vec<String>,
    pub types: Vec<String>,
    pub archetypes: Vec<String>,
    pub slots: Vec<String>,
    pub elements: Vec<String>,
}

impl FilterOptions {
    pub fn compute(table: &Table, selection: &FilterSelection) -> Self {
        Self {
            tiers: tier_options(),
            types: type_options(table, selection),
            archetypes: archetype_options(table, selection),
            slots: slot_options(table, selection),
            elements: element_options(table, selection),
        }
    }
}
