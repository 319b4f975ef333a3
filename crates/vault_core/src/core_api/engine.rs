use std::cell::RefCell;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use crate::aggregate::{
    self, CRAFTED_COLUMNS, NOT_OWNED_COLUMNS, OWNED_COUNTED_COLUMNS, TYPE_COUNT_COLUMNS,
    TYPE_ELEMENT_COUNT_COLUMNS,
};
use crate::catalog::Catalog;
use crate::columns::INSTANCE_ID;
use crate::filter::{FilterOptions, FilterSelection, Selector};
use crate::fingerprint::{Fingerprint, Fingerprinter};
use crate::inventory::{ARMOUR_COLUMNS, ArmourInventory, WeaponInventory};
use crate::perks::{PERK_ASSIGNMENT_COLUMNS, PerkExplosion, PerkQuery, explode_perks};
use crate::stat_schema::{WeaponType, stat_table};
use crate::table::{Cell, Table};

use super::cache::{CachedView, ViewCache};
use super::error::{CoreError, CoreErrorCode, CoreWarning};
use super::types::{CacheStats, EngineConfig, ItemSource};

/// Computes views over a [`Session`], memoizing each by the fingerprints of
/// its inputs and arguments.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    cache: RefCell<ViewCache>,
}

/// The loaded inputs of one user session. Never mutated: loading an export
/// yields a new session and leaves this one as it was.
#[derive(Debug, Clone)]
pub struct Session {
    catalog: Arc<Catalog>,
    weapons: Option<Arc<WeaponInventory>>,
    armour: Option<Arc<ArmourInventory>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self {
            config,
            cache: RefCell::new(ViewCache::new(config.cache_capacity)),
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.borrow().stats()
    }

    pub fn clear_cache(&self) {
        self.cache.borrow_mut().clear();
    }

    pub fn load_catalog(&self, path: &Path) -> Result<Session, CoreError> {
        Catalog::load(path).map(Session::new)
    }

    pub fn open_catalog_bytes<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        source: &str,
    ) -> Result<Session, CoreError> {
        Catalog::from_bytes(bytes.as_ref(), source).map(Session::new)
    }

    /// Catalog or weapon inventory narrowed by the full filter cascade.
    pub fn browse(
        &self,
        session: &Session,
        source: ItemSource,
        filter: &FilterSelection,
    ) -> Arc<Table> {
        let Some((input, input_fp)) = session.source_table(source) else {
            return Arc::new(Table::new(session.catalog.table().columns().iter().cloned()));
        };
        let key = view_key("browse", &[input_fp], |h| filter.feed(h));
        self.table_view("browse", key, || filter.apply(input))
    }

    /// `(Weapon Type, Total Count, Unique Count)` over the tier/sunset
    /// narrowed source.
    pub fn type_count(
        &self,
        session: &Session,
        source: ItemSource,
        filter: &FilterSelection,
    ) -> Arc<Table> {
        let Some((input, input_fp)) = session.source_table(source) else {
            return placeholder(&TYPE_COUNT_COLUMNS);
        };
        let key = view_key("type_count", &[input_fp], |h| filter.feed(h));
        self.table_view("type_count", key, || {
            aggregate::type_count(&filter.apply_reduced(input))
        })
    }

    pub fn type_element_count(
        &self,
        session: &Session,
        source: ItemSource,
        filter: &FilterSelection,
    ) -> Arc<Table> {
        let Some((input, input_fp)) = session.source_table(source) else {
            return placeholder(&TYPE_ELEMENT_COUNT_COLUMNS);
        };
        let key = view_key("type_element_count", &[input_fp], |h| {
            filter.feed(h)
        });
        self.table_view("type_element_count", key, || {
            aggregate::type_element_count(&filter.apply_reduced(input))
        })
    }

    /// Owned against available when a weapon export is loaded, available
    /// only otherwise.
    pub fn coverage(&self, session: &Session, filter: &FilterSelection) -> Arc<Table> {
        let catalog = session.catalog.table();
        match session.weapons() {
            Some(weapons) => {
                let key = view_key(
                    "coverage_with_inventory",
                    &[session.catalog.fingerprint(), weapons.fingerprint()],
                    |h| filter.feed(h),
                );
                self.table_view("coverage_with_inventory", key, || {
                    aggregate::coverage_with_inventory(
                        &filter.apply_reduced(catalog),
                        &filter.apply_reduced(weapons.table()),
                    )
                })
            }
            None => {
                let key = view_key("coverage", &[session.catalog.fingerprint()], |h| {
                    filter.feed(h)
                });
                self.table_view("coverage", key, || {
                    aggregate::coverage_without_inventory(&filter.apply_reduced(catalog))
                })
            }
        }
    }

    pub fn owned_counted(&self, session: &Session, filter: &FilterSelection) -> Arc<Table> {
        let Some(weapons) = session.weapons() else {
            return placeholder(&OWNED_COUNTED_COLUMNS);
        };
        let key = view_key("owned_counted", &[weapons.fingerprint()], |h| filter.feed(h));
        self.table_view("owned_counted", key, || {
            aggregate::owned_counted_list(&filter.apply_reduced(weapons.table()))
        })
    }

    pub fn not_owned(&self, session: &Session, filter: &FilterSelection) -> Arc<Table> {
        let Some(weapons) = session.weapons() else {
            return placeholder(&NOT_OWNED_COLUMNS);
        };
        let key = view_key(
            "not_owned",
            &[session.catalog.fingerprint(), weapons.fingerprint()],
            |h| filter.feed(h),
        );
        self.table_view("not_owned", key, || {
            aggregate::not_owned_list(
                &filter.apply_reduced(session.catalog.table()),
                &filter.apply_reduced(weapons.table()),
            )
        })
    }

    pub fn crafted(&self, session: &Session, filter: &FilterSelection) -> Arc<Table> {
        let Some(weapons) = session.weapons() else {
            return placeholder(&CRAFTED_COLUMNS);
        };
        let key = view_key("crafted", &[weapons.fingerprint()], |h| filter.feed(h));
        self.table_view("crafted", key, || {
            aggregate::crafted_list(&filter.apply(weapons.table()))
        })
    }

    /// Identity columns plus the stats `weapon_type` uses, over rows of that
    /// type surviving the rest of the filter cascade.
    pub fn stat_table(
        &self,
        session: &Session,
        source: ItemSource,
        weapon_type: &str,
        filter: &FilterSelection,
    ) -> Result<Arc<Table>, CoreError> {
        let weapon_type: WeaponType = weapon_type.parse()?;
        let filter = FilterSelection {
            weapon_type: Selector::only(weapon_type.as_str()),
            ..filter.clone()
        };
        let Some((input, input_fp)) = session.source_table(source) else {
            return Ok(placeholder(&weapon_type.projection()));
        };
        let key = view_key("stat_table", &[input_fp], |h| {
            h.str(weapon_type.as_str());
            filter.feed(h);
        });
        Ok(self.table_view("stat_table", key, || {
            stat_table(&filter.apply(input), weapon_type)
        }))
    }

    /// Every equipped perk placed in its slot, with diagnostics for tokens
    /// that could not be placed uniquely. `None` without a weapon export.
    pub fn perk_explosion(&self, session: &Session) -> Option<Arc<PerkExplosion>> {
        let weapons = session.weapons()?;
        let key = view_key(
            "perk_explosion",
            &[session.catalog.fingerprint(), weapons.fingerprint()],
            |_| {},
        );
        if let Some(CachedView::Perks(hit)) = self.cache.borrow_mut().get("perk_explosion", &key) {
            return Some(hit);
        }
        let computed = Arc::new(explode_perks(weapons, &session.catalog));
        self.cache
            .borrow_mut()
            .insert(key, CachedView::Perks(Arc::clone(&computed)));
        Some(computed)
    }

    /// Assignments of the filtered instances that satisfy every slot
    /// predicate of `query`.
    pub fn perk_assignments(
        &self,
        session: &Session,
        query: &PerkQuery,
        filter: &FilterSelection,
    ) -> Arc<Table> {
        let Some(weapons) = session.weapons() else {
            return placeholder(&PERK_ASSIGNMENT_COLUMNS);
        };
        let Some(explosion) = self.perk_explosion(session) else {
            return placeholder(&PERK_ASSIGNMENT_COLUMNS);
        };
        let key = view_key(
            "perk_assignments",
            &[session.catalog.fingerprint(), weapons.fingerprint()],
            |h| {
                for (slot, perks) in query.predicates() {
                    h.str(slot).u64(perks.len() as u64);
                    for perk in perks {
                        h.str(perk);
                    }
                }
                filter.feed(h);
            },
        );
        self.table_view("perk_assignments", key, || {
            let selected = filter.apply(weapons.table());
            let instances: HashSet<String> = selected
                .column(INSTANCE_ID)
                .map(Cell::to_string)
                .collect();
            explosion
                .filtered_table(query)
                .filter_rows(|row| instances.contains(&row.get(INSTANCE_ID).to_string()))
        })
    }

    pub fn armour(&self, session: &Session) -> Arc<Table> {
        let Some(armour) = session.armour() else {
            return placeholder(&ARMOUR_COLUMNS);
        };
        let key = view_key("armour", &[armour.fingerprint()], |_| {});
        self.table_view("armour", key, || armour.to_table())
    }

    pub fn filter_options(
        &self,
        session: &Session,
        source: ItemSource,
        filter: &FilterSelection,
    ) -> Arc<FilterOptions> {
        let Some((input, input_fp)) = session.source_table(source) else {
            return Arc::new(FilterOptions::compute(&Table::default(), filter));
        };
        let key = view_key("filter_options", &[input_fp], |h| filter.feed(h));
        if let Some(CachedView::Options(hit)) =
            self.cache.borrow_mut().get("filter_options", &key)
        {
            return hit;
        }
        let computed = Arc::new(FilterOptions::compute(input, filter));
        self.cache
            .borrow_mut()
            .insert(key, CachedView::Options(Arc::clone(&computed)));
        computed
    }

    fn table_view(
        &self,
        view: &str,
        key: Fingerprint,
        compute: impl FnOnce() -> Table,
    ) -> Arc<Table> {
        if let Some(CachedView::Table(hit)) = self.cache.borrow_mut().get(view, &key) {
            return hit;
        }
        let computed = Arc::new(compute());
        self.cache
            .borrow_mut()
            .insert(key, CachedView::Table(Arc::clone(&computed)));
        computed
    }
}

impl Session {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            weapons: None,
            armour: None,
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn weapons(&self) -> Option<&WeaponInventory> {
        self.weapons.as_deref()
    }

    pub fn armour(&self) -> Option<&ArmourInventory> {
        self.armour.as_deref()
    }

    /// Replace the weapon snapshot with a parsed export.
    pub fn with_weapon_export<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        source: &str,
    ) -> Result<Self, CoreError> {
        let inventory = WeaponInventory::from_bytes(bytes.as_ref(), &self.catalog, source)?;
        Ok(self.with_weapons(inventory))
    }

    pub fn with_weapons(&self, inventory: WeaponInventory) -> Self {
        Self {
            weapons: Some(Arc::new(inventory)),
            ..self.clone()
        }
    }

    pub fn with_weapon_file(&self, path: &Path) -> Result<Self, CoreError> {
        self.with_weapon_export(read_file(path)?, &path.display().to_string())
    }

    /// Replace the armour snapshot with a parsed export.
    pub fn with_armour_export<B: AsRef<[u8]>>(
        &self,
        bytes: B,
        source: &str,
    ) -> Result<Self, CoreError> {
        let inventory = ArmourInventory::from_bytes(bytes.as_ref(), source)?;
        Ok(Self {
            armour: Some(Arc::new(inventory)),
            ..self.clone()
        })
    }

    pub fn with_armour_file(&self, path: &Path) -> Result<Self, CoreError> {
        self.with_armour_export(read_file(path)?, &path.display().to_string())
    }

    pub fn without_inventory(&self) -> Self {
        Self {
            catalog: Arc::clone(&self.catalog),
            weapons: None,
            armour: None,
        }
    }

    /// Load-time warnings of the current weapon snapshot.
    pub fn warnings(&self) -> &[CoreWarning] {
        self.weapons().map(WeaponInventory::warnings).unwrap_or(&[])
    }

    fn source_table(&self, source: ItemSource) -> Option<(&Table, Fingerprint)> {
        match source {
            ItemSource::Catalog => Some((self.catalog.table(), self.catalog.fingerprint())),
            ItemSource::Weapons => self.weapons().map(|w| (w.table(), w.fingerprint())),
        }
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, CoreError> {
    fs::read(path).map_err(|e| {
        CoreError::new(
            CoreErrorCode::Io,
            format!("failed to read {}: {e}", path.display()),
        )
    })
}

fn view_key(
    view: &str,
    inputs: &[Fingerprint],
    arguments: impl FnOnce(&mut Fingerprinter),
) -> Fingerprint {
    let mut hasher = Fingerprinter::new("view");
    hasher.str(view).u64(inputs.len() as u64);
    for input in inputs {
        hasher.bytes(input.as_bytes());
    }
    arguments(&mut hasher);
    hasher.finish()
}

fn placeholder(columns: &[&str]) -> Arc<Table> {
    Arc::new(Table::new(columns.iter().copied()))
}
