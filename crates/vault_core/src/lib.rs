pub mod aggregate;
pub mod catalog;
pub mod columns;
pub mod core_api;
pub mod filter;
pub mod fingerprint;
pub mod inventory;
pub mod perks;
pub mod stat_schema;
pub mod table;
