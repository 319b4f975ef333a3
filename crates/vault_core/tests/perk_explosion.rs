use std::fs;
use std::path::PathBuf;

use vault_core::catalog::Catalog;
use vault_core::core_api::CoreErrorCode;
use vault_core::inventory::WeaponInventory;
use vault_core::perks::{PERK_ASSIGNMENT_COLUMNS, PerkQuery, explode_perks};
use vault_core::table::Cell;

const LEADING: &str = "Weapon Name With Season,Weapon Name,Weapon Season,Weapon Hash,Weapon Tier,Weapon Type,Weapon Archetype,Weapon Slot,Weapon Element,Weapon Current Version,Weapon Power Cap,Is Sunset";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

fn fixture_inventory() -> (Catalog, WeaponInventory) {
    let catalog = Catalog::load(&fixture("manifest.csv")).expect("catalog loads");
    let bytes = fs::read(fixture("dim_weapons.csv")).expect("weapon fixture readable");
    let inventory =
        WeaponInventory::from_bytes(&bytes, &catalog, "dim_weapons.csv").expect("weapons load");
    (catalog, inventory)
}

#[test]
fn single_token_single_option_yields_one_row() {
    let catalog_csv = format!(
        "{LEADING},Slot 1 Perk 0,Slot 1 Perk 1,Slot 2 Perk 0\n\
         Test (S1),Test,1,42,Legendary,Sidearm,Adaptive,Energy,Arc,1,0,No,Outlaw,Rapid Hit,Kill Clip\n"
    );
    let catalog = Catalog::from_bytes(catalog_csv.as_bytes(), "catalog").expect("catalog");
    let inventory = WeaponInventory::from_bytes(
        b"Name,Hash,Id,Crafted,Crafted Level,Perks 1\nTest,42,7,false,,Outlaw\n",
        &catalog,
        "export",
    )
    .expect("inventory");

    let explosion = explode_perks(&inventory, &catalog);
    assert!(explosion.diagnostics.is_empty());
    assert_eq!(explosion.assignments.len(), 1);
    let assignment = &explosion.assignments[0];
    assert_eq!(assignment.slot, "Slot 1");
    assert_eq!(assignment.perk, "Outlaw");
    assert_eq!(assignment.item_hash, Some(42));
    assert_eq!(assignment.instance_id, "7");
    assert!(!assignment.ambiguous);

    let table = explosion.to_table();
    assert_eq!(table.columns(), PERK_ASSIGNMENT_COLUMNS);
    let row = table.row(0).expect("row");
    assert_eq!(row.get("Weapon Name"), &Cell::text("Test"));
    assert_eq!(row.get("Slot"), &Cell::text("Slot 1"));

    let value = serde_json::to_value(assignment).expect("assignment serializes");
    assert_eq!(value["slot"], "Slot 1");
    assert_eq!(value["item_hash"], 42);
}

#[test]
fn multi_value_cell_emits_one_row_per_token_with_ordinals() {
    let catalog_csv = format!(
        "{LEADING},Slot 3 Perk 0,Slot 3 Perk 1\n\
         Test (S1),Test,1,42,Legendary,Sidearm,Adaptive,Energy,Arc,1,0,No,Outlaw,Rampage\n"
    );
    let catalog = Catalog::from_bytes(catalog_csv.as_bytes(), "catalog").expect("catalog");
    let inventory = WeaponInventory::from_bytes(
        b"Name,Hash,Id,Crafted,Crafted Level,Perks 3\nTest,42,7,false,,\"Outlaw*, Enhanced Rampage\"\n",
        &catalog,
        "export",
    )
    .expect("inventory");

    let explosion = explode_perks(&inventory, &catalog);
    let pairs: Vec<(usize, &str, &str)> = explosion
        .assignments
        .iter()
        .map(|a| (a.ordinal, a.slot.as_str(), a.perk.as_str()))
        .collect();
    assert_eq!(pairs, [(1, "Slot 3", "Outlaw"), (2, "Slot 3", "Rampage")]);
    assert!(explosion.assignments.iter().all(|a| a.group == 3));
}

#[test]
fn fixture_assignments_stay_inside_enumerated_options() {
    let (catalog, inventory) = fixture_inventory();
    let explosion = explode_perks(&inventory, &catalog);

    assert_eq!(explosion.assignments.len(), 17);
    for a in &explosion.assignments {
        assert!(
            ["Slot 1", "Slot 2", "Slot 3", "Slot 4"].contains(&a.slot.as_str()),
            "slot {}",
            a.slot
        );
        let item = catalog
            .get(a.item_hash.expect("assigned rows have a hash"))
            .expect("assigned rows have a catalog entry");
        let offered = catalog
            .slot_option_columns()
            .iter()
            .filter(|c| c.slot_label() == a.slot)
            .any(|c| item.get(&c.column).as_str().is_some_and(|o| o.contains(&a.perk)));
        assert!(offered, "{} not offered in {}", a.perk, a.slot);
    }
}

#[test]
fn ambiguous_and_unmatched_tokens_are_reported() {
    let (catalog, inventory) = fixture_inventory();
    let explosion = explode_perks(&inventory, &catalog);

    assert_eq!(explosion.diagnostics.len(), 2);
    let ambiguous = explosion
        .diagnostics
        .iter()
        .find(|d| d.perk == "Rampage")
        .expect("rampage diagnostic");
    assert_eq!(ambiguous.candidates, ["Slot 3 Perk 1", "Slot 4 Perk 0"]);
    assert_eq!(ambiguous.instance_id, "6917529000000000005");

    let chosen = explosion
        .assignments
        .iter()
        .find(|a| a.instance_id == "6917529000000000005" && a.perk == "Rampage")
        .expect("ambiguous token still assigned");
    assert_eq!(chosen.slot, "Slot 3");
    assert!(chosen.ambiguous);

    let unmatched: Vec<&str> = explosion
        .diagnostics
        .iter()
        .filter(|d| d.is_unmatched())
        .map(|d| d.perk.as_str())
        .collect();
    assert_eq!(unmatched, ["Moonwalker"]);
    assert!(
        !explosion
            .assignments
            .iter()
            .any(|a| a.perk == "Moonwalker")
    );
}

#[test]
fn rows_without_catalog_entry_get_no_slot_diagnostics() {
    let (catalog, inventory) = fixture_inventory();
    assert_eq!(inventory.warnings().len(), 1);

    let explosion = explode_perks(&inventory, &catalog);
    let orphan_id = "6917529000000000006";
    assert!(explosion.diagnostics.iter().all(|d| d.instance_id != orphan_id));
    assert!(explosion.assignments.iter().all(|a| a.instance_id != orphan_id));
}

#[test]
fn weapon_id_keeps_the_inventory_cell_type() {
    let (catalog, inventory) = fixture_inventory();
    let table = explode_perks(&inventory, &catalog).to_table();
    let row = table.row(0).expect("row");
    assert_eq!(row.get("Weapon ID"), &Cell::Int(6917529000000000001));

    let ids: Vec<&Cell> = inventory.table().column("Weapon ID").collect();
    assert!(ids.contains(&row.get("Weapon ID")));
}

#[test]
fn protected_perk_is_matched_by_its_full_name() {
    let (catalog, inventory) = fixture_inventory();
    let explosion = explode_perks(&inventory, &catalog);
    let battery = explosion
        .assignments
        .iter()
        .find(|a| a.perk == "Enhanced Battery")
        .expect("protected perk assigned");
    assert_eq!(battery.slot, "Slot 2");
    assert_eq!(battery.weapon_name.as_deref(), Some("The Palindrome"));
}

#[test]
fn query_combines_slots_with_and() {
    let (catalog, inventory) = fixture_inventory();
    let explosion = explode_perks(&inventory, &catalog);

    let outlaw = PerkQuery::new().with("Slot 3", "Outlaw");
    let ids = explosion.matching_instances(&outlaw);
    assert_eq!(
        ids.into_iter().collect::<Vec<_>>(),
        ["6917529000000000002", "6917529000000000003"]
    );

    let outlaw_firefly = outlaw.clone().with("Slot 4", "Firefly");
    let ids = explosion.matching_instances(&outlaw_firefly);
    assert_eq!(ids.into_iter().collect::<Vec<_>>(), ["6917529000000000003"]);

    let either = PerkQuery::new()
        .with("Slot 3", "Outlaw")
        .with("Slot 3", "Rampage");
    assert_eq!(explosion.matching_instances(&either).len(), 4);

    let table = explosion.filtered_table(&outlaw_firefly);
    assert_eq!(table.len(), 2);
}

#[test]
fn query_predicates_are_parsed() {
    let mut query = PerkQuery::new();
    query.parse_predicate("Slot 2=Tactical Mag").expect("valid");
    query.parse_predicate(" Slot 2 = Appended Mag ").expect("valid");
    let predicates: Vec<(&str, usize)> = query.predicates().map(|(s, p)| (s, p.len())).collect();
    assert_eq!(predicates, [("Slot 2", 2)]);

    let err = query.parse_predicate("Slot 5=Outlaw").expect_err("no slot 5");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
    assert!(query.parse_predicate("Outlaw").is_err());
    assert!(query.parse_predicate("Slot 1=").is_err());
}
