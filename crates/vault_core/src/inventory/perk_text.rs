//! Recovering bare perk names from the export's equipped-perk text.
//!
//! Exports mark the enhanced variant of a perk with `*` and, for some perks,
//! an `Enhanced ` prefix. Both are removed so an equipped perk compares equal
//! to its catalog option. One perk's real name begins with `Enhanced`; it is
//! left alone.

use crate::columns::PERK_SEPARATOR;

pub const PROTECTED_PERK: &str = "Enhanced Battery";
const ENHANCED_PREFIX: &str = "Enhanced ";
const ENHANCED_MARKER: char = '*';

pub fn strip_markers(cell: &str) -> String {
    cell.chars().filter(|&c| c != ENHANCED_MARKER).collect()
}

pub fn strip_enhanced_token(token: &str) -> &str {
    let mut token = token;
    while token != PROTECTED_PERK {
        match token.strip_prefix(ENHANCED_PREFIX) {
            Some(rest) => token = rest,
            None => break,
        }
    }
    token
}

/// Strip the enhanced prefix from every token of a comma-joined cell.
pub fn strip_enhanced(cell: &str) -> String {
    cell.split(PERK_SEPARATOR)
        .map(strip_enhanced_token)
        .collect::<Vec<_>>()
        .join(PERK_SEPARATOR)
}

pub fn normalize_perk_cell(cell: &str) -> String {
    strip_enhanced(&strip_markers(cell))
}
