mod armour;
mod perk_text;
mod weapons;

pub use armour::{
    ARMOUR_COLUMNS, ArmourInventory, ArmourPiece, ArmourStats, MASTERWORK_STAT_BONUS,
    MASTERWORK_TOTAL_BONUS, normalize_armour_type,
};
pub use perk_text::{PROTECTED_PERK, normalize_perk_cell, strip_enhanced, strip_markers};
pub use weapons::{PerkGroupColumn, WeaponInventory};
