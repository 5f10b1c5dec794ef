use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use jiff::{civil::Date, tz::TimeZone};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    events::{AppEvent, EventBus},
    models::{
        campaign::{BidStrategy, CampaignStatus, ScheduleConfig},
        keyword::{KeywordStats, MatchType},
        location::{LocationRef, TargetingType},
        menu::{MenuConfig, MenuItem},
        store::Store,
    },
    services::{
        analytics::dashboard_summary,
        bulk::{BulkAction, enabled_actions, execute_bulk, is_enabled},
        campaigns::{
            CampaignLookupError, DeleteCampaignError, DuplicateCampaignParameters,
            activate_campaign, archive_campaign, delete_campaign, duplicate_campaign,
            list_campaigns, pause_campaign, resolve_campaign, restore_campaign,
        },
        categories::{
            CreateCategoryError, CreateCategoryParameters, create_category, find_category,
            list_categories,
        },
        editor::{CampaignDraft, CampaignEditor, EditorStep, SaveCampaignError},
        export::{analytics_to_csv, analytics_to_json, campaigns_to_csv, campaigns_to_json},
        filters::{CampaignFilters, DateRange, SortDirection, SortKey, apply_filters},
        keywords::{
            AddKeywordParameters, add_keyword, add_negative_keyword, conflicting_keywords,
            record_keyword_stats, remove_keyword,
        },
        locations::{
            CountySearch, ImportLocationsParameters, LocationSelection,
            SetCampaignLocationsParameters, cities_in_county, create_location_list,
            delete_location_list, find_location_list, import_locations, known_states,
            load_location_list, search_counties, selection_bounds, set_campaign_locations,
            summarize_selection,
        },
        menu::{
            add_item, load_menu_config, move_item, remove_item, reset_menu_config,
            save_menu_config, set_item_visible, set_section_visible,
        },
    },
    storage::{Storage, json::JsonFileStorage, local::JsonFileLocalStorage},
};

mod config;
mod events;
mod models;
mod services;
mod storage;
mod ui;

#[derive(Parser)]
#[command(
    name = "adcamp",
    about = "Manage advertising campaigns, targeting and the console menu from your terminal"
)]
struct Cli {
    /// Directory holding store.json and local_storage.json
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Path to config.json (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage campaigns
    #[command(subcommand)]
    Campaign(CampaignCommands),

    /// Manage campaign keywords
    #[command(subcommand)]
    Keyword(KeywordCommands),

    /// Manage categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Browse counties and cities, manage saved location lists
    #[command(subcommand)]
    Location(LocationCommands),

    /// Apply one action to several campaigns
    Bulk {
        action: BulkAction,

        /// Campaign ids, id prefixes or names
        #[arg(required = true)]
        campaigns: Vec<String>,

        /// Confirm destructive actions (delete, archive)
        #[arg(short, long)]
        yes: bool,
    },

    /// Configure the navigation menu
    #[command(subcommand)]
    Menu(MenuCommands),

    /// Show performance totals
    Dashboard,

    /// Export campaigns or analytics
    #[command(subcommand)]
    Export(ExportCommands),
}

#[derive(Subcommand)]
enum CampaignCommands {
    /// List campaigns, optionally filtered and sorted
    List(ListArgs),

    /// Show a campaign
    Show { campaign: String },

    /// Create a campaign through the editor steps
    New {
        name: String,

        #[command(flatten)]
        fields: CampaignFields,
    },

    /// Edit a campaign; only given fields change
    Edit {
        campaign: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        fields: CampaignFields,
    },

    /// Copy a campaign into a new draft
    Duplicate {
        campaign: String,

        /// Name of the copy (defaults to "<name> (Copy)")
        #[arg(long)]
        name: Option<String>,
    },

    /// Archive a campaign
    Archive { campaign: String },

    /// Restore an archived campaign as a draft
    Restore { campaign: String },

    /// Start serving a draft or paused campaign
    Activate { campaign: String },

    /// Pause an active campaign
    Pause { campaign: String },

    /// Permanently delete a draft campaign
    Delete { campaign: String },

    /// Set the locations a campaign targets
    Locations {
        campaign: String,

        /// Location refs: county:<id> or city:<name>-<state>
        locations: Vec<LocationRef>,

        /// Start from a saved location list
        #[arg(long)]
        list: Option<String>,

        /// Toggle the given refs on the current selection instead of replacing it
        #[arg(long, conflicts_with = "list")]
        toggle: bool,

        #[arg(long)]
        targeting: Option<TargetingType>,

        #[arg(long = "exclude")]
        excluded: Vec<LocationRef>,

        #[arg(long)]
        radius: Option<f64>,
    },
}

#[derive(Args)]
struct ListArgs {
    /// Match against name and description
    #[arg(short, long)]
    search: Option<String>,

    /// Only these statuses (repeatable)
    #[arg(long, action = clap::ArgAction::Append)]
    status: Vec<CampaignStatus>,

    /// Only these categories, by name or slug (repeatable)
    #[arg(short, long, action = clap::ArgAction::Append)]
    category: Vec<String>,

    #[arg(long)]
    created_from: Option<Date>,

    #[arg(long)]
    created_to: Option<Date>,

    #[arg(long)]
    updated_from: Option<Date>,

    #[arg(long)]
    updated_to: Option<Date>,

    /// name, status, created or updated
    #[arg(long)]
    sort: Option<SortKey>,

    /// Sort ascending (default is descending)
    #[arg(long)]
    asc: bool,
}

#[derive(Args)]
struct CampaignFields {
    /// Category name or slug
    #[arg(short, long)]
    category: Option<String>,

    #[arg(short, long)]
    description: Option<String>,

    /// manual_cpc, maximize_clicks, target_cpa or target_roas
    #[arg(long)]
    bid: Option<BidStrategy>,

    #[arg(long)]
    daily_budget: Option<f64>,

    #[arg(long)]
    total_budget: Option<f64>,

    #[arg(long)]
    target_cpa: Option<f64>,

    #[arg(long)]
    target_roas: Option<f64>,

    /// local, regional or national
    #[arg(long)]
    targeting: Option<TargetingType>,

    /// county:<id> or city:<name>-<state> (repeatable)
    #[arg(short, long = "location", action = clap::ArgAction::Append)]
    locations: Vec<LocationRef>,

    #[arg(long = "exclude", action = clap::ArgAction::Append)]
    excluded: Vec<LocationRef>,

    #[arg(long)]
    radius: Option<f64>,

    #[arg(short, long = "keyword", action = clap::ArgAction::Append)]
    keywords: Vec<String>,

    #[arg(long = "negative", action = clap::ArgAction::Append)]
    negative_keywords: Vec<String>,

    #[arg(long = "match-type", action = clap::ArgAction::Append)]
    match_types: Vec<MatchType>,

    /// First serving day (e.g., "2025-03-01")
    #[arg(long)]
    start: Option<Date>,

    #[arg(long)]
    end: Option<Date>,

    /// ISO weekday number, Monday = 1 (repeatable)
    #[arg(long = "weekday", action = clap::ArgAction::Append)]
    weekdays: Vec<u8>,

    /// Hour window such as "9-17"
    #[arg(long, value_parser = parse_hours)]
    hours: Option<(u8, u8)>,

    #[arg(long)]
    timezone: Option<String>,
}

#[derive(Subcommand)]
enum KeywordCommands {
    /// List keywords of a campaign
    List { campaign: String },

    /// Add a keyword
    Add {
        campaign: String,
        text: String,

        #[arg(short, long, default_value = "broad")]
        match_type: MatchType,

        /// Add as a negative keyword
        #[arg(short, long)]
        negative: bool,
    },

    /// Remove a keyword (every match type)
    Rm {
        campaign: String,
        text: String,

        #[arg(short, long)]
        negative: bool,
    },

    /// Record performance numbers for a keyword
    Stats {
        campaign: String,
        text: String,

        #[arg(long, default_value_t = 0)]
        impressions: u64,

        #[arg(long, default_value_t = 0)]
        clicks: u64,

        #[arg(long, default_value_t = 0.0)]
        cost: f64,

        #[arg(long, default_value_t = 0)]
        conversions: u64,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Create a category
    New {
        name: String,

        /// Parent category name or slug
        #[arg(short, long)]
        parent: Option<String>,
    },
    /// List categories as a tree
    List,
}

#[derive(Subcommand)]
enum LocationCommands {
    /// Search counties by name
    Search {
        #[arg(default_value = "")]
        query: String,

        #[arg(short, long)]
        state: Option<String>,

        #[arg(long)]
        min_population: Option<u64>,

        #[arg(long)]
        limit: Option<usize>,
    },

    /// List the cities of a county
    Cities {
        /// County id, county:<id>, or county name
        county: String,

        #[arg(short, long)]
        state: Option<String>,
    },

    /// List states with county data
    States,

    /// Load county and city rows from JSON arrays
    Import {
        #[arg(long)]
        counties: Option<PathBuf>,

        #[arg(long)]
        cities: Option<PathBuf>,
    },

    /// Summarise a selection: population, income, map bounds
    Summary {
        locations: Vec<LocationRef>,

        /// Summarise a saved list instead
        #[arg(long)]
        list: Option<String>,
    },

    /// Manage saved location lists
    #[command(subcommand)]
    List(LocationListCommands),
}

#[derive(Subcommand)]
enum LocationListCommands {
    /// Save a named list
    Save {
        name: String,
        #[arg(required = true)]
        locations: Vec<LocationRef>,
    },
    /// Show one list, or all of them
    Show { name: Option<String> },
    /// Delete a list
    Delete { name: String },
}

#[derive(Subcommand)]
enum MenuCommands {
    /// Show the menu tree
    Show,
    /// Hide a section
    HideSection { section: String },
    /// Show a hidden section
    ShowSection { section: String },
    /// Hide an item
    Hide { item: String },
    /// Show a hidden item
    Unhide { item: String },
    /// Append an item to a section
    Add {
        section: String,
        id: String,
        label: String,
        path: String,

        #[arg(long)]
        icon: Option<String>,
    },
    /// Remove an item
    Rm { item: String },
    /// Move an item within its section (negative moves up)
    Move {
        item: String,

        #[arg(allow_hyphen_values = true)]
        offset: isize,
    },
    /// Restore the default menu
    Reset,
}

#[derive(Clone, Copy, ValueEnum)]
enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
enum ExportCommands {
    /// Export campaigns, filtered like `campaign list`
    Campaigns {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        filters: ListArgs,
    },
    /// Export the dashboard numbers
    Analytics {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Csv)]
        format: ExportFormat,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn parse_hours(value: &str) -> Result<(u8, u8), String> {
    let (start, end) = value
        .split_once('-')
        .ok_or_else(|| format!("Hours '{}' must look like 9-17", value))?;
    let parse = |s: &str| {
        s.trim()
            .parse::<u8>()
            .map_err(|_| format!("Invalid hour '{}'", s))
    };
    Ok((parse(start)?, parse(end)?))
}

fn exit_with_error(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {}", message);
    std::process::exit(1);
}

fn init_tracing(filter: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn campaign_id(store: &Store, reference: &str) -> Uuid {
    match resolve_campaign(store, reference) {
        Ok(id) => id,
        Err(CampaignLookupError::NotFound(reference)) => {
            exit_with_error(format!("Campaign '{}' not found", reference))
        }
        Err(CampaignLookupError::Ambiguous(names)) => {
            eprintln!("Error: Campaign reference is ambiguous. Multiple campaigns found:");
            for name in names {
                eprintln!("  - {}", name);
            }
            eprintln!("\nPlease be more specific or use the campaign id.");
            std::process::exit(1);
        }
    }
}

fn category_id(store: &Store, name_or_slug: &str) -> Uuid {
    match find_category(store, name_or_slug) {
        Some(category) => category.id,
        None => {
            eprintln!("Error: Category '{}' not found", name_or_slug);
            eprintln!("\nCreate it first with:");
            eprintln!("  adcamp category new \"{}\"", name_or_slug);
            std::process::exit(1);
        }
    }
}

fn build_filters(store: &Store, args: ListArgs) -> CampaignFilters {
    CampaignFilters {
        search: args.search.unwrap_or_default(),
        statuses: args.status.into_iter().collect(),
        categories: args
            .category
            .iter()
            .map(|c| category_id(store, c))
            .collect(),
        created: DateRange {
            from: args.created_from,
            to: args.created_to,
        },
        updated: DateRange {
            from: args.updated_from,
            to: args.updated_to,
        },
        sort_key: args.sort.unwrap_or_default(),
        sort_direction: if args.asc {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        },
    }
}

/// Copies every given field into the draft; absent fields keep their value
fn apply_fields(store: &Store, draft: &mut CampaignDraft, fields: CampaignFields) {
    if let Some(category) = fields.category {
        draft.category_id = Some(category_id(store, &category));
    }
    if fields.description.is_some() {
        draft.description = fields.description;
    }

    let touches_settings = fields.bid.is_some()
        || fields.daily_budget.is_some()
        || fields.total_budget.is_some()
        || fields.target_cpa.is_some()
        || fields.target_roas.is_some();
    if touches_settings {
        let settings = draft.settings.get_or_insert_with(Default::default);
        if let Some(bid) = fields.bid {
            settings.bid_strategy = bid;
        }
        settings.daily_budget = fields.daily_budget.or(settings.daily_budget);
        settings.total_budget = fields.total_budget.or(settings.total_budget);
        settings.target_cpa = fields.target_cpa.or(settings.target_cpa);
        settings.target_roas = fields.target_roas.or(settings.target_roas);
    }

    if let Some(targeting) = fields.targeting {
        draft.targeting_type = targeting;
    }
    if !fields.locations.is_empty() {
        draft.locations = LocationSelection::default();
        for location in fields.locations {
            draft.locations.insert(location);
        }
    }
    if !fields.excluded.is_empty() {
        draft.excluded_locations = LocationSelection::default();
        for location in fields.excluded {
            draft.excluded_locations.insert(location);
        }
    }
    if fields.radius.is_some() {
        draft.radius_miles = fields.radius;
    }

    if !fields.keywords.is_empty() {
        draft.keywords = fields.keywords;
    }
    if !fields.negative_keywords.is_empty() {
        draft.negative_keywords = fields.negative_keywords;
    }
    if !fields.match_types.is_empty() {
        draft.match_types = fields.match_types;
    }

    let touches_schedule = fields.start.is_some()
        || fields.end.is_some()
        || !fields.weekdays.is_empty()
        || fields.hours.is_some()
        || fields.timezone.is_some();
    if touches_schedule {
        let schedule = draft.schedule.get_or_insert_with(|| ScheduleConfig {
            start_date: jiff::Zoned::now().date(),
            end_date: None,
            weekdays: vec![],
            hours: None,
            timezone: TimeZone::system()
                .iana_name()
                .unwrap_or("UTC")
                .to_string(),
        });
        if let Some(start) = fields.start {
            schedule.start_date = start;
        }
        if fields.end.is_some() {
            schedule.end_date = fields.end;
        }
        if !fields.weekdays.is_empty() {
            schedule.weekdays = fields.weekdays;
        }
        if fields.hours.is_some() {
            schedule.hours = fields.hours;
        }
        if let Some(timezone) = fields.timezone {
            schedule.timezone = timezone;
        }
    }
}

fn render_step_statuses(editor: &CampaignEditor) {
    for step in EditorStep::ALL {
        let status = editor.step_status(step);
        let marker = if status.has_errors {
            "✗".red()
        } else if status.completed {
            "✓".green()
        } else {
            "·".dimmed()
        };
        eprintln!("  {} {}", marker, step);
    }
}

fn save_editor(editor: &mut CampaignEditor, store: &mut Store, storage: &impl Storage) {
    for warning in editor.review_warnings() {
        println!("{} {}", "!".yellow(), warning);
    }

    match editor.save(store, storage) {
        Ok(campaign) => {
            println!("✓ Campaign saved: {}", campaign.name);
            println!("  {}  {}", ui::short_id(&campaign), campaign.status);
        }
        Err(SaveCampaignError::Validation(errors)) => {
            eprintln!("Error: Campaign has validation errors:");
            ui::render_errors(&errors);
            eprintln!();
            render_step_statuses(editor);
            std::process::exit(1);
        }
        Err(e) => exit_with_error(format!("Failed to save campaign: {}", e)),
    }
}

fn location_selection(
    store: &Store,
    list: Option<&str>,
    locations: Vec<LocationRef>,
) -> LocationSelection {
    let mut selection = match list {
        Some(name) => load_location_list(store, name).unwrap_or_else(|e| exit_with_error(e)),
        None => LocationSelection::default(),
    };
    for location in locations {
        selection.insert(location);
    }
    selection
}

fn write_export(content: String, output: Option<PathBuf>) {
    match output {
        Some(path) => {
            if let Err(e) = std::fs::write(&path, content) {
                exit_with_error(format!("Failed to write '{}': {}", path.display(), e));
            }
            println!("✓ Exported to {}", path.display());
        }
        None => print!("{}", content),
    }
}

fn section_title<'a>(menu: &'a MenuConfig, id: &'a str) -> &'a str {
    menu.section(id).map(|s| s.title.as_str()).unwrap_or(id)
}

fn save_menu(
    local_storage: &JsonFileLocalStorage,
    bus: &EventBus,
    config: &MenuConfig,
    message: &str,
) {
    if let Err(e) = save_menu_config(local_storage, bus, config) {
        exit_with_error(e);
    }
    println!("✓ {}", message);
}

fn main() {
    let cli = Cli::parse();

    let config_path = cli.config.clone().or_else(AppConfig::default_config_path);
    let config = match AppConfig::load(config_path.as_deref(), cli.data_dir.clone()) {
        Ok(config) => config,
        Err(e) => exit_with_error(e),
    };

    init_tracing(if cli.verbose {
        "adcamp=debug"
    } else {
        config.log_filter.as_str()
    });
    tracing::debug!(data_dir = %config.data_dir.display(), "configuration loaded");

    // Create data directory if it doesn't exist
    std::fs::create_dir_all(&config.data_dir).unwrap_or_else(|e| {
        exit_with_error(format!("Failed to create data directory: {}", e));
    });

    let storage = JsonFileStorage::new(config.store_path());
    let local_storage = JsonFileLocalStorage::new(config.local_storage_path());
    let bus = EventBus::new();

    let mut store = match storage.load() {
        Ok(store) => store,
        Err(e) => exit_with_error(format!("Failed to load store: {}", e)),
    };

    match cli.command {
        None => {
            let campaigns = list_campaigns(&store);
            if campaigns.is_empty() {
                println!("No campaigns yet. Create one with `adcamp campaign new <name> --category <category>`");
            } else {
                ui::render_view_header("Campaigns", Some(campaigns.len()));
                for campaign in campaigns {
                    ui::render_campaign_line(campaign, &store);
                }
                ui::render_section_separator();
            }
        }

        Some(Commands::Campaign(command)) => match command {
            CampaignCommands::List(args) => {
                let filters = build_filters(&store, args);
                let campaigns = apply_filters(&store.campaigns, &filters);

                if campaigns.is_empty() {
                    if filters.is_active() {
                        println!("No campaigns match the filters");
                    } else {
                        println!("No campaigns");
                    }
                } else {
                    let title = if filters.is_active() {
                        "Campaigns (filtered)"
                    } else {
                        "Campaigns"
                    };
                    ui::render_view_header(title, Some(campaigns.len()));
                    for campaign in campaigns {
                        ui::render_campaign_line(campaign, &store);
                    }
                    ui::render_section_separator();
                }
            }
            CampaignCommands::Show { campaign } => {
                let id = campaign_id(&store, &campaign);
                if let Some(campaign) = store.get_campaign(id) {
                    ui::render_campaign_details(campaign, &store);
                    for text in conflicting_keywords(&store, id) {
                        println!(
                            "  {} '{}' is both a keyword and a negative keyword",
                            "!".yellow(),
                            text
                        );
                    }
                }
            }
            CampaignCommands::New { name, fields } => {
                let mut editor = CampaignEditor::new();
                editor.draft.name = name;
                editor.draft.targeting_type = config.default_targeting;
                apply_fields(&store, &mut editor.draft, fields);

                while editor.current_step() != EditorStep::Review {
                    let step = editor.current_step();
                    if let Err(errors) = editor.complete_step() {
                        eprintln!("Error: {} step has errors:", step);
                        ui::render_errors(&errors);
                        std::process::exit(1);
                    }
                }

                save_editor(&mut editor, &mut store, &storage);
            }
            CampaignCommands::Edit {
                campaign,
                name,
                fields,
            } => {
                let id = campaign_id(&store, &campaign);
                let Some(existing) = store.get_campaign(id) else {
                    exit_with_error(format!("Campaign '{}' not found", campaign));
                };
                let mut editor = match CampaignEditor::edit(existing) {
                    Ok(editor) => editor,
                    Err(e) => exit_with_error(format!("Stored targeting is invalid: {}", e)),
                };
                if let Some(name) = name {
                    editor.draft.name = name;
                }
                apply_fields(&store, &mut editor.draft, fields);

                if !editor.can_save() {
                    exit_with_error("A campaign needs a name and a category to be saved");
                }
                editor.go_to(EditorStep::Review);
                save_editor(&mut editor, &mut store, &storage);
            }
            CampaignCommands::Duplicate { campaign, name } => {
                let id = campaign_id(&store, &campaign);
                let params = DuplicateCampaignParameters { id, new_name: name };
                match duplicate_campaign(&mut store, &storage, params) {
                    Ok(copy) => {
                        println!("✓ Campaign duplicated: {}", copy.name);
                        println!("  {}  {}", ui::short_id(&copy), copy.status);
                    }
                    Err(e) => exit_with_error(e),
                }
            }
            CampaignCommands::Archive { campaign } => {
                let id = campaign_id(&store, &campaign);
                match archive_campaign(&mut store, &storage, id) {
                    Ok(campaign) => println!("✓ Campaign archived: {}", campaign.name),
                    Err(e) => exit_with_error(e),
                }
            }
            CampaignCommands::Restore { campaign } => {
                let id = campaign_id(&store, &campaign);
                match restore_campaign(&mut store, &storage, id) {
                    Ok(campaign) => println!("✓ Campaign restored as draft: {}", campaign.name),
                    Err(e) => exit_with_error(e),
                }
            }
            CampaignCommands::Activate { campaign } => {
                let id = campaign_id(&store, &campaign);
                match activate_campaign(&mut store, &storage, id) {
                    Ok(campaign) => println!("✓ Campaign activated: {}", campaign.name),
                    Err(e) => exit_with_error(e),
                }
            }
            CampaignCommands::Pause { campaign } => {
                let id = campaign_id(&store, &campaign);
                match pause_campaign(&mut store, &storage, id) {
                    Ok(campaign) => println!("✓ Campaign paused: {}", campaign.name),
                    Err(e) => exit_with_error(e),
                }
            }
            CampaignCommands::Delete { campaign } => {
                let id = campaign_id(&store, &campaign);
                match delete_campaign(&mut store, &storage, id) {
                    Ok(campaign) => println!("✓ Campaign deleted: {}", campaign.name),
                    Err(DeleteCampaignError::NotDraft { name, status }) => {
                        eprintln!(
                            "Error: Campaign '{}' is {}; only drafts can be deleted",
                            name, status
                        );
                        eprintln!("\nArchive it instead:");
                        eprintln!("  adcamp campaign archive \"{}\"", name);
                        std::process::exit(1);
                    }
                    Err(DeleteCampaignError::CampaignNotFound(id)) => {
                        exit_with_error(format!("Campaign {} not found", id))
                    }
                    Err(DeleteCampaignError::Storage(e)) => {
                        exit_with_error(format!("Failed to delete campaign: {}", e))
                    }
                }
            }
            CampaignCommands::Locations {
                campaign,
                locations,
                list,
                toggle,
                targeting,
                excluded,
                radius,
            } => {
                let id = campaign_id(&store, &campaign);
                let current = store
                    .get_campaign(id)
                    .and_then(|c| c.location_targeting.clone())
                    .unwrap_or_default();

                let selection = if toggle {
                    let mut selection = LocationSelection::from_tagged(&current.included)
                        .unwrap_or_else(|e| exit_with_error(e));
                    for location in locations {
                        let label = location.to_string();
                        if selection.toggle(location) {
                            println!("  {} {}", "+".green(), label);
                        } else {
                            println!("  {} {}", "-".red(), label);
                        }
                    }
                    selection
                } else {
                    location_selection(&store, list.as_deref(), locations)
                };

                let mut excluded_selection = LocationSelection::default();
                for location in excluded {
                    excluded_selection.insert(location);
                }

                let params = SetCampaignLocationsParameters {
                    campaign_id: id,
                    targeting_type: targeting.unwrap_or(if current.included.is_empty() {
                        config.default_targeting
                    } else {
                        current.targeting_type
                    }),
                    selection,
                    excluded: excluded_selection,
                    radius_miles: radius.or(current.radius_miles),
                };
                match set_campaign_locations(&mut store, &storage, params) {
                    Ok(Some(targeting)) => println!(
                        "✓ {} targeting with {} location(s)",
                        targeting.targeting_type,
                        targeting.included.len()
                    ),
                    Ok(None) => println!("✓ Location targeting cleared"),
                    Err(e) => exit_with_error(e),
                }
            }
        },

        Some(Commands::Keyword(command)) => match command {
            KeywordCommands::List { campaign } => {
                let id = campaign_id(&store, &campaign);
                let keywords: Vec<_> = store.get_keywords_for_campaign(id).collect();
                let negatives: Vec<_> = store.get_negative_keywords_for_campaign(id).collect();

                if keywords.is_empty() && negatives.is_empty() {
                    println!("No keywords");
                } else {
                    for keyword in keywords {
                        let stats = keyword.stats.unwrap_or_default();
                        println!(
                            "  {} {}  {}",
                            keyword.text.bold(),
                            format!("[{}]", keyword.match_type).dimmed(),
                            format!(
                                "{} impr · {} clicks · CTR {} · CPC {}",
                                stats.impressions,
                                stats.clicks,
                                ui::format_percent(stats.ctr()),
                                ui::format_money(stats.cpc())
                            )
                            .dimmed()
                        );
                    }
                    for negative in negatives {
                        println!(
                            "  {} {} {}",
                            "-".red(),
                            negative.text,
                            format!("[{}]", negative.match_type).dimmed()
                        );
                    }
                    for text in conflicting_keywords(&store, id) {
                        println!(
                            "  {} '{}' is both a keyword and a negative keyword",
                            "!".yellow(),
                            text
                        );
                    }
                }
            }
            KeywordCommands::Add {
                campaign,
                text,
                match_type,
                negative,
            } => {
                let params = AddKeywordParameters {
                    campaign_id: campaign_id(&store, &campaign),
                    text,
                    match_type,
                };
                let added = if negative {
                    add_negative_keyword(&mut store, &storage, params).map(|k| k.text)
                } else {
                    add_keyword(&mut store, &storage, params).map(|k| k.text)
                };
                match added {
                    Ok(text) => println!("✓ Keyword added: {} [{}]", text, match_type),
                    Err(e) => exit_with_error(e),
                }
            }
            KeywordCommands::Rm {
                campaign,
                text,
                negative,
            } => {
                let id = campaign_id(&store, &campaign);
                match remove_keyword(&mut store, &storage, id, &text, negative) {
                    Ok(removed) => println!("✓ Removed {} keyword row(s)", removed),
                    Err(e) => exit_with_error(e),
                }
            }
            KeywordCommands::Stats {
                campaign,
                text,
                impressions,
                clicks,
                cost,
                conversions,
            } => {
                let id = campaign_id(&store, &campaign);
                let stats = KeywordStats {
                    impressions,
                    clicks,
                    cost,
                    conversions,
                };
                match record_keyword_stats(&mut store, &storage, id, &text, stats) {
                    Ok(keyword) => println!(
                        "✓ Stats recorded for '{}' (CTR {})",
                        keyword.text,
                        ui::format_percent(stats.ctr())
                    ),
                    Err(e) => exit_with_error(e),
                }
            }
        },

        Some(Commands::Category(command)) => match command {
            CategoryCommands::New { name, parent } => {
                let params = CreateCategoryParameters { name, parent };
                match create_category(&mut store, &storage, params) {
                    Ok(category) => {
                        println!("✓ Category created: {}", category.name);
                        println!("  {}", category.slug.dimmed());
                    }
                    Err(CreateCategoryError::CategoryAlreadyExists(name)) => {
                        exit_with_error(format!("Category '{}' already exists", name))
                    }
                    Err(e) => exit_with_error(e),
                }
            }
            CategoryCommands::List => {
                let categories = list_categories(&store);
                if categories.is_empty() {
                    println!("No categories");
                } else {
                    for (depth, category) in categories {
                        println!(
                            "  {}{} {}",
                            "  ".repeat(depth),
                            category.name,
                            format!("({})", category.slug).dimmed()
                        );
                    }
                }
            }
        },

        Some(Commands::Location(command)) => match command {
            LocationCommands::Search {
                query,
                state,
                min_population,
                limit,
            } => {
                let defaults = CountySearch::default();
                let search = CountySearch {
                    query: &query,
                    state: state.as_deref(),
                    min_population,
                    limit: limit.unwrap_or(defaults.limit),
                };
                let counties = search_counties(&store, &search);
                if counties.is_empty() {
                    println!("No counties found");
                } else {
                    for county in counties {
                        ui::render_county_line(county, cities_in_county(&store, county).len());
                    }
                }
            }
            LocationCommands::Cities { county, state } => {
                let found = match county.parse::<LocationRef>().ok().or_else(|| {
                    county.parse::<Uuid>().ok().map(LocationRef::County)
                }) {
                    Some(LocationRef::County(id)) => store.get_county(id),
                    _ => {
                        let matches = search_counties(
                            &store,
                            &CountySearch {
                                query: &county,
                                state: state.as_deref(),
                                ..CountySearch::default()
                            },
                        );
                        matches
                            .iter()
                            .find(|c| c.name.eq_ignore_ascii_case(county.trim()))
                            .copied()
                            .or_else(|| (matches.len() == 1).then(|| matches[0]))
                    }
                };
                let Some(county) = found else {
                    exit_with_error(format!(
                        "County '{}' not found (add --state to narrow the search)",
                        county
                    ));
                };

                let cities = cities_in_county(&store, county);
                ui::render_county_line(county, cities.len());
                for city in cities {
                    println!(
                        "    {} {}  {}",
                        "·".dimmed(),
                        city.name,
                        format!(
                            "pop {} · {}",
                            city.demographics.population,
                            LocationRef::city(&city.name, &city.state)
                        )
                        .dimmed()
                    );
                }
            }
            LocationCommands::States => {
                let states = known_states(&store);
                if states.is_empty() {
                    println!("No location data. Load some with `adcamp location import`");
                } else {
                    println!("{}", states.join(" "));
                }
            }
            LocationCommands::Import { counties, cities } => {
                if counties.is_none() && cities.is_none() {
                    exit_with_error("Pass --counties and/or --cities");
                }
                let params = ImportLocationsParameters { counties, cities };
                match import_locations(&mut store, &storage, params) {
                    Ok(result) => println!(
                        "✓ Imported {} counties and {} cities",
                        result.counties, result.cities
                    ),
                    Err(e) => exit_with_error(e),
                }
            }
            LocationCommands::Summary { locations, list } => {
                let selection = location_selection(&store, list.as_deref(), locations);
                if selection.is_empty() {
                    exit_with_error("Nothing selected");
                }
                ui::render_selection_summary(
                    &summarize_selection(&store, &selection),
                    selection_bounds(&store, &selection),
                );
            }
            LocationCommands::List(command) => match command {
                LocationListCommands::Save { name, locations } => {
                    let selection = location_selection(&store, None, locations);
                    match create_location_list(&mut store, &storage, &name, &selection) {
                        Ok(list) => println!(
                            "✓ Location list saved: {} ({} items)",
                            list.name,
                            list.items.len()
                        ),
                        Err(e) => exit_with_error(e),
                    }
                }
                LocationListCommands::Show { name: Some(name) } => {
                    let Some(list) = find_location_list(&store, &name) else {
                        exit_with_error(format!("Location list '{}' not found", name));
                    };
                    ui::render_section_header(&list.name);
                    for item in &list.items {
                        println!("  {}", item);
                    }
                    println!();
                }
                LocationListCommands::Show { name: None } => {
                    if store.location_lists.is_empty() {
                        println!("No saved location lists");
                    }
                    for list in &store.location_lists {
                        println!(
                            "  {} {}",
                            list.name.bold(),
                            format!("{} items · {}", list.items.len(), ui::format_relative_date(list.created_at))
                                .dimmed()
                        );
                    }
                }
                LocationListCommands::Delete { name } => {
                    match delete_location_list(&mut store, &storage, &name) {
                        Ok(list) => println!("✓ Location list deleted: {}", list.name),
                        Err(e) => exit_with_error(e),
                    }
                }
            },
        },

        Some(Commands::Bulk {
            action,
            campaigns,
            yes,
        }) => {
            let ids: Vec<_> = campaigns.iter().map(|c| campaign_id(&store, c)).collect();

            if !is_enabled(action, &ids, &store.campaigns) {
                eprintln!(
                    "Error: '{}' is not available for every selected campaign",
                    action
                );
                let enabled = enabled_actions(&ids, &store.campaigns);
                if !enabled.is_empty() {
                    let names: Vec<_> = enabled.iter().map(BulkAction::to_string).collect();
                    eprintln!("\nAvailable for this selection: {}", names.join(", "));
                }
                std::process::exit(1);
            }

            if action.requires_confirmation() && !yes {
                eprintln!(
                    "Error: '{}' affects {} campaign(s) and must be confirmed",
                    action,
                    ids.len()
                );
                eprintln!("\nRe-run with --yes to proceed.");
                std::process::exit(1);
            }

            let result = execute_bulk(&mut store, &storage, action, &ids);
            ui::render_bulk_result(&result, &store);
            if !result.is_complete_success() {
                std::process::exit(1);
            }
        }

        Some(Commands::Menu(command)) => {
            let mut menu = load_menu_config(&local_storage).unwrap_or_else(|e| exit_with_error(e));
            let sidebar = bus.subscribe();

            let result = match command {
                MenuCommands::Show => {
                    ui::render_menu(&menu);
                    Ok(None)
                }
                MenuCommands::HideSection { section } => {
                    set_section_visible(&mut menu, &section, false)
                        .map(|_| Some(format!("Section hidden: {}", section_title(&menu, &section))))
                }
                MenuCommands::ShowSection { section } => {
                    set_section_visible(&mut menu, &section, true)
                        .map(|_| Some(format!("Section shown: {}", section_title(&menu, &section))))
                }
                MenuCommands::Hide { item } => set_item_visible(&mut menu, &item, false)
                    .map(|_| Some(format!("Item hidden: {}", item))),
                MenuCommands::Unhide { item } => set_item_visible(&mut menu, &item, true)
                    .map(|_| Some(format!("Item shown: {}", item))),
                MenuCommands::Add {
                    section,
                    id,
                    label,
                    path,
                    icon,
                } => {
                    let item = MenuItem {
                        id,
                        label,
                        path,
                        icon,
                        visible: true,
                    };
                    let message = format!("Item added: {}", item.label);
                    add_item(&mut menu, &section, item).map(|_| Some(message))
                }
                MenuCommands::Rm { item } => remove_item(&mut menu, &item)
                    .map(|removed| Some(format!("Item removed: {}", removed.label))),
                MenuCommands::Move { item, offset } => move_item(&mut menu, &item, offset)
                    .map(|_| Some(format!("Item moved: {}", item))),
                MenuCommands::Reset => reset_menu_config(&local_storage, &bus).map(|_| {
                    println!("✓ Menu reset to defaults");
                    None
                }),
            };

            match result {
                Ok(Some(message)) => save_menu(&local_storage, &bus, &menu, &message),
                Ok(None) => {}
                Err(e) => exit_with_error(e),
            }

            for AppEvent::MenuConfigChanged(config) in sidebar.try_iter() {
                let sections: Vec<_> = config.visible_sections().map(|s| s.title.as_str()).collect();
                println!("  {}", format!("Sidebar: {}", sections.join(" · ")).dimmed());
            }
        }

        Some(Commands::Dashboard) => {
            ui::render_dashboard(&dashboard_summary(&store));
        }

        Some(Commands::Export(command)) => match command {
            ExportCommands::Campaigns {
                format,
                output,
                filters,
            } => {
                let filters = build_filters(&store, filters);
                let campaigns = apply_filters(&store.campaigns, &filters);
                let content = match format {
                    ExportFormat::Csv => campaigns_to_csv(&store, &campaigns),
                    ExportFormat::Json => {
                        campaigns_to_json(&store, &campaigns).unwrap_or_else(|e| exit_with_error(e))
                    }
                };
                write_export(content, output);
            }
            ExportCommands::Analytics { format, output } => {
                let summary = dashboard_summary(&store);
                let content = match format {
                    ExportFormat::Csv => analytics_to_csv(&summary),
                    ExportFormat::Json => {
                        analytics_to_json(&summary).unwrap_or_else(|e| exit_with_error(e))
                    }
                };
                write_export(content, output);
            }
        },
    }
}
