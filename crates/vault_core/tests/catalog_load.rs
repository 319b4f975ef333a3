use std::fs;
use std::path::PathBuf;

use vault_core::catalog::Catalog;
use vault_core::columns::{CATALOG_LEADING, RANGE};
use vault_core::core_api::{CoreErrorCode, Engine};
use vault_core::stat_schema::{StatSchema, WeaponType, stat_table};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../tests/fixtures")
        .join(name)
}

#[test]
fn loading_the_same_file_twice_is_identical() {
    let path = fixture("manifest.csv");
    let a = Catalog::load(&path).expect("first load");
    let b = Catalog::load(&path).expect("second load");

    assert_eq!(a.table(), b.table());
    assert_eq!(a.fingerprint(), b.fingerprint());
    assert_eq!(a.table().columns(), b.table().columns());
}

#[test]
fn identity_columns_lead_in_canonical_order() {
    let catalog = Catalog::load(&fixture("manifest.csv")).expect("catalog loads");
    let columns: Vec<&str> = catalog
        .table()
        .columns()
        .iter()
        .take(CATALOG_LEADING.len())
        .map(String::as_str)
        .collect();
    assert_eq!(columns, CATALOG_LEADING);
    assert!(catalog.table().has_column(RANGE));
    assert!(!catalog.table().has_column("Weapon Range"));
    assert_eq!(catalog.len(), 6);
    assert_eq!(catalog.name_of(1002), Some("Mida Mini-Tool"));
}

#[test]
fn fixture_carries_every_stat_schema_column() {
    let catalog = Catalog::load(&fixture("manifest.csv")).expect("catalog loads");
    assert!(catalog.missing_stat_columns().is_empty());
    assert_eq!(catalog.slot_option_columns().len(), 8);
}

#[test]
fn partial_stat_union_is_reported_per_schema() {
    let csv = "Weapon Name With Season,Weapon Name,Weapon Season,Weapon Hash,Weapon Tier,Weapon Type,Weapon Archetype,Weapon Slot,Weapon Element,Weapon Current Version,Weapon Power Cap,Is Sunset,Impact\n\
               A,A,1,1,Legendary,Sword,Vortex,Power,Void,1,0,No,50\n";
    let catalog = Catalog::from_bytes(csv.as_bytes(), "partial").expect("loads");
    let sword = catalog
        .missing_stat_columns()
        .iter()
        .find(|(schema, _)| *schema == StatSchema::Sword)
        .expect("sword schema reported");
    assert!(sword.1.contains(&"Swing Speed"));
    assert!(!sword.1.contains(&"Impact"));
}

#[test]
fn stat_projection_uses_type_schema() {
    let catalog = Catalog::load(&fixture("manifest.csv")).expect("catalog loads");
    let table = stat_table(catalog.table(), WeaponType::Sword);
    let columns = table.columns();
    assert_eq!(columns[0], "Weapon Name With Season");
    assert!(columns.iter().any(|c| c == "Guard Efficiency"));
    assert!(!columns.iter().any(|c| c == "Magazine"));
    assert_eq!(table.len(), catalog.len());
}

#[test]
fn unreadable_catalog_is_an_io_error() {
    let err = Engine::new()
        .load_catalog(&fixture("does-not-exist.csv"))
        .expect_err("missing file");
    assert_eq!(err.code, CoreErrorCode::Io);
}

#[test]
fn catalog_missing_identity_column_is_malformed() {
    let bytes = fs::read(fixture("manifest.csv")).expect("fixture readable");
    let text = String::from_utf8(bytes).expect("utf-8 fixture");
    let broken = text.replacen("Weapon Archetype", "Archetype", 1);
    let err = Catalog::from_bytes(broken.as_bytes(), "broken").expect_err("malformed");
    assert_eq!(err.code, CoreErrorCode::MalformedInput);
    assert!(err.message.contains("Weapon Archetype"));
}
