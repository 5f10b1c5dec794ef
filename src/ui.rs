use colored::*;

use crate::{
    models::{
        campaign::{Campaign, CampaignStatus},
        location::County,
        menu::MenuConfig,
        store::Store,
    },
    services::{
        analytics::DashboardSummary,
        bulk::BulkResult,
        locations::{BoundingBox, SelectionSummary},
    },
};

/// Get the terminal width, defaulting to 80 if unavailable
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(80)
}

pub fn get_status_glyph(status: CampaignStatus) -> ColoredString {
    match status {
        CampaignStatus::Active => "●".green(),
        CampaignStatus::Paused => "‖".yellow(),
        CampaignStatus::Draft => "○".normal(),
        CampaignStatus::Archived => "×".dimmed(),
    }
}

/// Short id used in listings; any unique prefix resolves back
pub fn short_id(campaign: &Campaign) -> String {
    campaign.id.to_string()[..8].to_string()
}

/// Right-hand context for a campaign line: category and update date
fn campaign_context(campaign: &Campaign, store: &Store) -> String {
    let updated = format_relative_date(campaign.updated_at);
    match store.category_name(campaign.category_id) {
        Some(category) => format!("{}  ·  {}", category, updated),
        None => updated,
    }
}

pub fn render_campaign_line(campaign: &Campaign, store: &Store) {
    let terminal_width = get_terminal_width();

    let id_str = short_id(campaign);
    let glyph = get_status_glyph(campaign.status);
    let left_section = format!("  {}  {}  {}", id_str, glyph, campaign.name);
    let styled_left = if campaign.is_archived() {
        left_section.dimmed()
    } else {
        left_section.bold()
    };

    let right_section = campaign_context(campaign, store);

    let left_visible_len = format!("  {}  {}  {}", id_str, " ", campaign.name)
        .chars()
        .count();
    let right_visible_len = right_section.chars().count();
    let total_content = left_visible_len + right_visible_len;

    if total_content + 4 < terminal_width {
        let padding = terminal_width - total_content - 2;
        println!("{}{}{}", styled_left, " ".repeat(padding), right_section.dimmed());
    } else {
        // Not enough space for right alignment, just print normally
        println!("{}", styled_left);
    }
}

pub fn render_campaign_details(campaign: &Campaign, store: &Store) {
    render_view_header(&campaign.name, None);

    let row = |label: &str, value: String| println!("    {:<14} {}", label.dimmed(), value);

    row("Id", campaign.id.to_string());
    row("Status", format!("{} {}", get_status_glyph(campaign.status), campaign.status));
    row(
        "Category",
        store
            .category_name(campaign.category_id)
            .unwrap_or("—")
            .to_string(),
    );
    if let Some(description) = &campaign.description {
        row("Description", description.clone());
    }
    row("Created", format_relative_date(campaign.created_at));
    row("Updated", format_relative_date(campaign.updated_at));
    if let Some(archived_at) = campaign.archived_at {
        row("Archived", format_relative_date(archived_at));
    }

    if let Some(settings) = &campaign.settings {
        render_section_header("Settings");
        row("Bid strategy", format!("{:?}", settings.bid_strategy));
        if let Some(daily) = settings.daily_budget {
            row("Daily budget", format!("{:.2}", daily));
        }
        if let Some(total) = settings.total_budget {
            row("Total budget", format!("{:.2}", total));
        }
    }

    if let Some(targeting) = &campaign.location_targeting {
        render_section_header("Locations");
        row("Targeting", targeting.targeting_type.to_string());
        for location in &targeting.included {
            println!("    {} {}", "+".green(), location);
        }
        for location in &targeting.excluded {
            println!("    {} {}", "-".red(), location);
        }
    }

    let keywords: Vec<_> = store.get_keywords_for_campaign(campaign.id).collect();
    let negatives: Vec<_> = store.get_negative_keywords_for_campaign(campaign.id).collect();
    if !keywords.is_empty() || !negatives.is_empty() {
        render_section_header("Keywords");
        for keyword in keywords {
            let stats = keyword
                .stats
                .map(|s| {
                    format!(
                        "{} impr · {} clicks · CTR {}",
                        s.impressions,
                        s.clicks,
                        format_percent(s.ctr())
                    )
                })
                .unwrap_or_default();
            println!(
                "    {} {} {}",
                keyword.text.bold(),
                format!("[{}]", keyword.match_type).dimmed(),
                stats.dimmed()
            );
        }
        for negative in negatives {
            println!(
                "    {} {} {}",
                "-".red(),
                negative.text,
                format!("[{}]", negative.match_type).dimmed()
            );
        }
    }

    if let Some(schedule) = &campaign.schedule {
        render_section_header("Schedule");
        let end = schedule
            .end_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| String::from("open-ended"));
        row("Runs", format!("{} → {}", schedule.start_date, end));
        if let Some((start, end)) = schedule.hours {
            row("Hours", format!("{:02}:00-{:02}:00 {}", start, end, schedule.timezone));
        }
        let today = jiff::Zoned::now().date().weekday();
        row(
            "Today",
            if schedule.runs_on(today) { "serving" } else { "off" }.to_string(),
        );
    }

    render_section_separator();
}

/// Format a timestamp for display (e.g., "Feb 15", "Today", "Yesterday")
pub fn format_relative_date(timestamp: jiff::Timestamp) -> String {
    let zoned = jiff::Zoned::new(timestamp, jiff::tz::TimeZone::system());
    let date = zoned.date();
    let today = jiff::Zoned::now().date();

    if date == today {
        "Today".to_string()
    } else if today.yesterday().is_ok_and(|yesterday| yesterday == date) {
        "Yesterday".to_string()
    } else if date.year() == today.year() {
        date.strftime("%b %d").to_string()
    } else {
        date.strftime("%b %d, %Y").to_string()
    }
}

pub fn format_percent(value: Option<f64>) -> String {
    value
        .map(|v| format!("{:.2}%", v * 100.0))
        .unwrap_or_else(|| String::from("—"))
}

pub fn format_money(value: Option<f64>) -> String {
    value
        .map(|v| format!("${:.2}", v))
        .unwrap_or_else(|| String::from("—"))
}

/// Render a view header with title and optional count
pub fn render_view_header(title: &str, count: Option<usize>) {
    match count {
        Some(count) => {
            let word = if count == 1 { "campaign" } else { "campaigns" };
            println!("\n  {} ({} {})\n", title.cyan().bold(), count, word);
        }
        None => println!("\n  {}\n", title.cyan().bold()),
    }
}

/// Render a section header (e.g., "Settings", "Keywords")
pub fn render_section_header(title: &str) {
    println!("\n  ─── {} ───\n", title.bold());
}

pub fn render_section_separator() {
    println!();
}

pub fn render_errors(errors: &[String]) {
    for error in errors {
        eprintln!("  {} {}", "✗".red(), error);
    }
}

pub fn render_bulk_result(result: &BulkResult, store: &Store) {
    let name = |id| {
        store
            .get_campaign(id)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| id.to_string())
    };

    if !result.succeeded.is_empty() {
        println!("✓ {} campaign(s) updated", result.succeeded.len());
    }
    if !result.failed.is_empty() {
        eprintln!("{} {} campaign(s) failed:", "✗".red(), result.failed.len());
        for (id, message) in &result.failed {
            eprintln!("  - {}: {}", name(*id), message);
        }
    }
}

pub fn render_county_line(county: &County, city_count: usize) {
    let income = format_money(county.demographics.median_household_income);
    println!(
        "  {} {}, {}  {}",
        "•".green(),
        county.name.bold(),
        county.state,
        format!(
            "pop {} · income {} · {} cities · ({:.3}, {:.3})",
            county.demographics.population, income, city_count, county.latitude, county.longitude
        )
        .dimmed()
    );
    println!("    {}", format!("county:{}", county.id).dimmed());
}

pub fn render_selection_summary(summary: &SelectionSummary, bounds: Option<BoundingBox>) {
    println!(
        "  {} counties · {} cities · population {}",
        summary.counties, summary.cities, summary.total_population
    );
    println!(
        "  Weighted median income: {}",
        format_money(summary.weighted_median_income)
    );
    if summary.unresolved > 0 {
        println!(
            "  {}",
            format!("{} location(s) not found in the location tables", summary.unresolved).yellow()
        );
    }
    if let Some(bounds) = bounds {
        let (lat, lon) = bounds.center();
        println!(
            "  Map bounds: ({:.3}, {:.3}) → ({:.3}, {:.3}), center ({:.3}, {:.3})",
            bounds.min_latitude,
            bounds.min_longitude,
            bounds.max_latitude,
            bounds.max_longitude,
            lat,
            lon
        );
    }
}

pub fn render_menu(config: &MenuConfig) {
    for section in &config.sections {
        let title = if section.visible {
            section.title.bold()
        } else {
            format!("{} (hidden)", section.title).dimmed()
        };
        println!("\n  {}  {}", title, format!("[{}]", section.id).dimmed());
        for item in &section.items {
            let marker = if item.visible { "●".green() } else { "○".dimmed() };
            println!(
                "    {} {:<18} {}",
                marker,
                item.label,
                format!("{}  [{}]", item.path, item.id).dimmed()
            );
        }
    }
    println!();
}

pub fn render_dashboard(summary: &DashboardSummary) {
    render_view_header("Dashboard", None);

    let counts = summary
        .campaigns_by_status
        .iter()
        .map(|(status, count)| format!("{} {}", count, status))
        .collect::<Vec<_>>()
        .join(" · ");
    println!("  {}", counts);
    println!(
        "  {} impressions · {} clicks · {} spend · {} conversions",
        summary.totals.impressions,
        summary.totals.clicks,
        format_money(Some(summary.totals.cost)),
        summary.totals.conversions
    );
    println!(
        "  CTR {} · CPC {} · CPA {}",
        format_percent(summary.ctr),
        format_money(summary.cpc),
        format_money(summary.cpa)
    );

    if !summary.campaigns.is_empty() {
        render_section_header("By spend");
        for row in &summary.campaigns {
            println!(
                "  {} {:<28} {}",
                get_status_glyph(row.status),
                row.name,
                format!(
                    "{} · {} clicks · CTR {} · CPC {}",
                    format_money(Some(row.totals.cost)),
                    row.totals.clicks,
                    format_percent(row.ctr),
                    format_money(row.cpc)
                )
                .dimmed()
            );
        }
    }
    println!();
}
