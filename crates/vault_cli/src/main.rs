use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value as JsonValue;
use tracing_subscriber::EnvFilter;
use vault_core::columns::DEFAULT_TIER;
use vault_core::core_api::{Engine, EngineConfig, ItemSource, Session, DEFAULT_CACHE_CAPACITY};
use vault_core::filter::{FilterSelection, Selector};
use vault_core::perks::PerkQuery;
use vault_core::table::Table;
use vault_render::{
    render_diagnostics_text, render_options_json, render_options_text, render_table_json,
    render_table_text,
};

const DEFAULT_MANIFEST: &str = "data/Master Weapon Manifest.csv";
const DEFAULT_LOG_FILTER: &str = "vault_tool=info,vault_core=warn";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum SourceArg {
    Catalog,
    Weapons,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Reference catalog of every known weapon.
    #[arg(long, env = "VAULT_TOOL_MANIFEST", default_value = DEFAULT_MANIFEST)]
    manifest: PathBuf,
    /// Weapon export from the inventory manager.
    #[arg(long, value_name = "CSV")]
    weapons: Option<PathBuf>,
    /// Armour export from the inventory manager.
    #[arg(long, value_name = "CSV")]
    armour: Option<PathBuf>,
    /// Tier to keep; repeatable. Without any, every tier is kept.
    #[arg(long = "tier", value_name = "TIER")]
    tiers: Vec<String>,
    /// Keep only the default tier when no --tier is given.
    #[arg(long = "default-tier", conflicts_with = "tiers")]
    default_tier: bool,
    #[arg(long = "type", value_name = "TYPE")]
    weapon_type: Option<String>,
    #[arg(long)]
    archetype: Option<String>,
    #[arg(long)]
    slot: Option<String>,
    #[arg(long)]
    element: Option<String>,
    #[arg(long = "exclude-sunset")]
    exclude_sunset: bool,
    /// Table the catalog-or-inventory views read.
    #[arg(long, value_enum, default_value = "catalog")]
    source: SourceArg,
    #[arg(long)]
    json: bool,
    #[arg(long = "cache-capacity", default_value_t = DEFAULT_CACHE_CAPACITY)]
    cache_capacity: usize,
    #[command(subcommand)]
    view: View,
}

#[derive(Debug, Subcommand)]
enum View {
    /// Rows and distinct names per weapon type.
    TypeCount,
    /// Rows and distinct names per weapon type and element.
    TypeElementCount,
    /// Per-type element coverage, owned against available when weapons are loaded.
    Coverage,
    /// Owned weapons with their copy counts.
    Owned,
    /// Catalog weapons with no owned copy.
    NotOwned,
    /// Crafted weapons by crafted level.
    Crafted,
    /// Identity and type-specific stat columns.
    Stats {
        #[arg(long = "weapon-type", value_name = "TYPE")]
        weapon_type: String,
    },
    /// Equipped perks placed in their slots.
    Perks {
        /// `Slot N=Perk`; repeatable, slots are AND-combined.
        #[arg(long = "perk", value_name = "SLOT=PERK")]
        perks: Vec<String>,
        /// Print tokens that could not be placed in exactly one slot.
        #[arg(long)]
        diagnostics: bool,
    },
    /// Armour with base and masterworked stat sums.
    Armour,
    /// Filter picker options under the current selection.
    Options,
    /// The selected table after every filter.
    Browse,
}

fn main() {
    let cli = Cli::parse();
    init_logging();

    let engine = Engine::with_config(EngineConfig {
        cache_capacity: cli.cache_capacity,
    });
    let session = load_session(&engine, &cli);
    for warning in session.warnings() {
        tracing::info!(%warning, "weapon export");
    }

    let filter = filter_from_cli(&cli);
    let source = match cli.source {
        SourceArg::Catalog => ItemSource::Catalog,
        SourceArg::Weapons => ItemSource::Weapons,
    };
    if source == ItemSource::Weapons && session.weapons().is_none() {
        eprintln!("--source weapons requires --weapons <CSV>");
        process::exit(2);
    }
    tracing::debug!(view = ?cli.view, source = source.as_str(), "rendering");

    match &cli.view {
        View::TypeCount => emit_table(&engine.type_count(&session, source, &filter), cli.json),
        View::TypeElementCount => emit_table(
            &engine.type_element_count(&session, source, &filter),
            cli.json,
        ),
        View::Coverage => emit_table(&engine.coverage(&session, &filter), cli.json),
        View::Owned => emit_table(&engine.owned_counted(&session, &filter), cli.json),
        View::NotOwned => emit_table(&engine.not_owned(&session, &filter), cli.json),
        View::Crafted => emit_table(&engine.crafted(&session, &filter), cli.json),
        View::Stats { weapon_type } => {
            let table = engine
                .stat_table(&session, source, weapon_type, &filter)
                .unwrap_or_else(|e| {
                    eprintln!("Error: {e}");
                    process::exit(2);
                });
            emit_table(&table, cli.json);
        }
        View::Perks { perks, diagnostics } => {
            let mut query = PerkQuery::new();
            for predicate in perks {
                query.parse_predicate(predicate).unwrap_or_else(|e| {
                    eprintln!("Error: {e}");
                    process::exit(2);
                });
            }
            emit_table(
                &engine.perk_assignments(&session, &query, &filter),
                cli.json,
            );
            if *diagnostics && let Some(explosion) = engine.perk_explosion(&session) {
                eprint!("{}", render_diagnostics_text(&explosion.diagnostics));
            }
        }
        View::Armour => emit_table(&engine.armour(&session), cli.json),
        View::Options => {
            let options = engine.filter_options(&session, source, &filter);
            if cli.json {
                print_json(&render_options_json(&options));
            } else {
                print!("{}", render_options_text(&options));
            }
        }
        View::Browse => emit_table(&engine.browse(&session, source, &filter), cli.json),
    }

    let stats = engine.cache_stats();
    tracing::debug!(
        hits = stats.hits,
        misses = stats.misses,
        entries = stats.entries,
        "view cache"
    );
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_session(engine: &Engine, cli: &Cli) -> Session {
    let mut session = engine.load_catalog(&cli.manifest).unwrap_or_else(|e| {
        eprintln!("Error loading catalog: {}", cli.manifest.display());
        eprintln!("  {e}");
        process::exit(1);
    });
    tracing::info!(
        path = %cli.manifest.display(),
        items = session.catalog().len(),
        "catalog loaded"
    );

    if let Some(path) = &cli.weapons {
        session = session.with_weapon_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading weapon export: {}", path.display());
            eprintln!("  {e}");
            process::exit(1);
        });
    }
    if let Some(path) = &cli.armour {
        session = session.with_armour_file(path).unwrap_or_else(|e| {
            eprintln!("Error loading armour export: {}", path.display());
            eprintln!("  {e}");
            process::exit(1);
        });
    }
    session
}

fn filter_from_cli(cli: &Cli) -> FilterSelection {
    let tiers: Vec<String> = if cli.default_tier {
        vec![DEFAULT_TIER.to_string()]
    } else {
        cli.tiers.clone()
    };
    FilterSelection {
        weapon_type: selector(cli.weapon_type.as_deref()),
        archetype: selector(cli.archetype.as_deref()),
        slot: selector(cli.slot.as_deref()),
        element: selector(cli.element.as_deref()),
        exclude_sunset: cli.exclude_sunset,
        ..FilterSelection::default()
    }
    .with_tiers(tiers)
}

fn selector(value: Option<&str>) -> Selector {
    value
        .map(|v| v.parse::<Selector>().unwrap_or_default())
        .unwrap_or_default()
}

fn emit_table(table: &Table, json: bool) {
    if json {
        print_json(&render_table_json(table));
    } else {
        print!("{}", render_table_text(table));
    }
}

fn print_json(value: &JsonValue) {
    match serde_json::to_string_pretty(value) {
        Ok(text) => println!("{text}"),
        Err(e) => {
            eprintln!("Error serializing JSON: {e}");
            process::exit(1);
        }
    }
}
