use std::fs;
use std::path::PathBuf;

use vault_core::catalog::Catalog;
use vault_core::columns::{CATALOG_LEADING, HASH, INSTANCE_ID, INVENTORY_LEADING, NAME, TYPE};
use vault_core::core_api::{CoreErrorCode, CoreWarning};
use vault_core::inventory::{
    ARMOUR_COLUMNS, ArmourInventory, PROTECTED_PERK, WeaponInventory, strip_enhanced,
};
use vault_core::table::Cell;

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

fn catalog() -> Catalog {
    Catalog::load(&fixture("manifest.csv")).expect("catalog fixture loads")
}

fn weapons(catalog: &Catalog) -> WeaponInventory {
    let bytes = fs::read(fixture("dim_weapons.csv")).expect("weapon fixture readable");
    WeaponInventory::from_bytes(&bytes, catalog, "dim_weapons.csv").expect("weapons load")
}

#[test]
fn classification_is_copied_from_the_catalog() {
    let catalog = catalog();
    let inventory = weapons(&catalog);

    for row in inventory.table().rows() {
        let Some(hash) = row.get(HASH).as_i64() else {
            panic!("every fixture row has a hash");
        };
        let Some(entry) = catalog.get(hash) else {
            continue;
        };
        for column in CATALOG_LEADING {
            assert_eq!(row.get(column), entry.get(column), "column {column}");
        }
    }
}

#[test]
fn columns_are_reordered_and_raw_duplicates_dropped() {
    let catalog = catalog();
    let inventory = weapons(&catalog);
    let columns = inventory.table().columns();

    let leading: Vec<&str> = columns
        .iter()
        .take(INVENTORY_LEADING.len())
        .map(String::as_str)
        .collect();
    assert_eq!(leading, INVENTORY_LEADING);
    for dropped in ["Name", "Hash", "Id", "Tag", "Power", "Notes", "Perks 0"] {
        assert!(
            !columns.iter().any(|c| c == dropped),
            "{dropped} should be dropped"
        );
    }
    for kept in ["Crafted", "Crafted Level", "Perks 1", "Perks 4"] {
        assert!(columns.iter().any(|c| c == kept), "{kept} should be kept");
    }
    assert_eq!(inventory.perk_groups().len(), 4);
    assert_eq!(inventory.perk_groups()[0].column, "Perks 1");
}

#[test]
fn orphan_rows_are_kept_with_a_warning() {
    let catalog = catalog();
    let inventory = weapons(&catalog);

    assert_eq!(inventory.len(), 6);
    assert_eq!(
        inventory.warnings(),
        [CoreWarning::UnmatchedForeignKey {
            item_hash: Some(9999),
            instance_id: "6917529000000000006".to_string(),
        }]
    );
    let orphan = inventory
        .table()
        .rows()
        .find(|r| r.get(HASH).as_i64() == Some(9999))
        .expect("orphan retained");
    assert_eq!(orphan.get(NAME), &Cell::Empty);
    assert_eq!(orphan.get(TYPE), &Cell::Empty);
    assert_eq!(orphan.get(INSTANCE_ID), &Cell::Int(6917529000000000006));
}

#[test]
fn perk_text_is_normalized() {
    let catalog = catalog();
    let inventory = weapons(&catalog);
    let perks_3: Vec<String> = inventory
        .table()
        .column("Perks 3")
        .map(|c| c.to_string())
        .collect();
    assert_eq!(
        perks_3,
        [
            "Explosive Payload",
            "Outlaw",
            "Outlaw",
            "Rampage",
            "Rampage",
            "Outlaw"
        ]
    );
    let perks_2: Vec<String> = inventory
        .table()
        .column("Perks 2")
        .map(|c| c.to_string())
        .collect();
    assert_eq!(perks_2[3], PROTECTED_PERK);

    for cell in inventory.table().column("Perks 4").filter_map(Cell::as_str) {
        assert_eq!(strip_enhanced(cell), cell);
        assert!(!cell.contains('*'));
    }
}

#[test]
fn weapon_export_without_id_is_malformed() {
    let catalog = catalog();
    let err = WeaponInventory::from_bytes(b"Name,Hash\nFatebringer,1001\n", &catalog, "bad.csv")
        .expect_err("missing Id");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
    assert!(err.message.contains("Id"));
}

#[test]
fn weapon_export_without_crafted_columns_is_malformed() {
    let catalog = catalog();
    let err = WeaponInventory::from_bytes(
        b"Hash,Id,Perks 1\n1001,1,Outlaw\n",
        &catalog,
        "bad.csv",
    )
    .expect_err("missing crafted columns");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
    assert!(err.message.contains("Crafted, Crafted Level"));

    let err = WeaponInventory::from_bytes(b"Hash,Id\n1001,1\n1001,2\n", &catalog, "bad.csv")
        .expect_err("bare export");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
}

#[test]
fn weapon_export_needs_an_equipped_perk_group() {
    let catalog = catalog();
    let err = WeaponInventory::from_bytes(
        b"Hash,Id,Crafted,Crafted Level,Perks 0\n1001,1,false,,Adaptive Frame\n",
        &catalog,
        "bad.csv",
    )
    .expect_err("only the intrinsic column");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
    assert!(err.message.contains("Perks 1"));
}

#[test]
fn weapon_rows_missing_trailing_perk_fields_load() {
    let catalog = catalog();
    let inventory = WeaponInventory::from_bytes(
        b"Hash,Id,Crafted,Crafted Level,Perks 1,Perks 2\n1001,1,false,,Outlaw\n",
        &catalog,
        "short.csv",
    )
    .expect("short row loads");
    let row = inventory.table().row(0).expect("row");
    assert_eq!(row.get("Perks 1"), &Cell::text("Outlaw"));
    assert_eq!(row.get("Perks 2"), &Cell::Empty);
    assert_eq!(row.get(NAME), &Cell::text("Fatebringer"));
}

#[test]
fn armour_masterwork_scenario() {
    let bytes = fs::read(fixture("dim_armour.csv")).expect("armour fixture readable");
    let armour = ArmourInventory::from_bytes(&bytes, "dim_armour.csv").expect("armour loads");
    let table = armour.to_table();
    assert_eq!(table.columns(), ARMOUR_COLUMNS);

    let helm = table.row(0).expect("first piece");
    assert_eq!(helm.get("mw_mob"), &Cell::Int(12));
    assert_eq!(helm.get("base_group_1"), &Cell::Int(30));
    assert_eq!(helm.get("mw_group_1"), &Cell::Int(36));
    assert_eq!(helm.get("base_total"), &Cell::Int(36));
    assert_eq!(helm.get("mw_total"), &Cell::Int(48));
    assert_eq!(helm.get("Character"), &Cell::text("Titan"));
}

#[test]
fn armour_types_are_folded() {
    let bytes = fs::read(fixture("dim_armour.csv")).expect("armour fixture readable");
    let armour = ArmourInventory::from_bytes(&bytes, "dim_armour.csv").expect("armour loads");
    let types: Vec<&str> = armour.pieces().iter().map(|p| p.item_type.as_str()).collect();
    assert_eq!(types, ["Helmet", "Class Item", "Chest", "Legs"]);
    assert_eq!(armour.pieces()[2].masterwork_tier, None);
}

#[test]
fn armour_export_missing_stat_is_malformed() {
    let err = ArmourInventory::from_bytes(b"Name,Hash,Id\nHelm,1,2\n", "bad.csv")
        .expect_err("missing columns");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
    assert!(err.message.contains("Mobility (Base)"));
}

const ARMOUR_HEADER: &str = "Name,Hash,Id,Tier,Type,Equippable,Energy Capacity,Mobility (Base),Resilience (Base),Recovery (Base),Discipline (Base),Intellect (Base),Strength (Base),Total (Base)";

#[test]
fn blank_armour_stat_leaves_dependent_sums_empty() {
    let csv = format!("{ARMOUR_HEADER}\nHelm,1,2,Legendary,Helmet,Titan,10,,10,10,2,2,2,26\n");
    let armour = ArmourInventory::from_bytes(csv.as_bytes(), "blank.csv").expect("armour loads");
    let table = armour.to_table();
    let helm = table.row(0).expect("row");

    for column in ["base_mob", "mw_mob", "base_mob_res", "base_group_1", "mw_group_1"] {
        assert_eq!(helm.get(column), &Cell::Empty, "column {column}");
    }
    assert_eq!(helm.get("base_res_rec"), &Cell::Int(20));
    assert_eq!(helm.get("base_group_2"), &Cell::Int(6));
    assert_eq!(helm.get("mw_group_2"), &Cell::Int(12));
    assert_eq!(helm.get("mw_total"), &Cell::Int(38));
}

#[test]
fn out_of_range_armour_stat_is_malformed() {
    let csv = format!(
        "{ARMOUR_HEADER}\nHelm,1,2,Legendary,Helmet,Titan,10,9223372036854775807,10,10,2,2,2,36\n"
    );
    let err = ArmourInventory::from_bytes(csv.as_bytes(), "huge.csv").expect_err("out of range");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
    assert!(err.message.contains("row 1"));
}
