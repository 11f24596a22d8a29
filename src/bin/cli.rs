use std::io::{self, Write};
use std::str::FromStr;

use capacity_tool::{
    Allocation, AnalysisConfig, Conflict, Portfolio, Resource, ResourceKind, Suggestion,
    load_portfolio_from_csv, load_portfolio_from_json, logging, save_portfolio_to_csv,
    save_portfolio_to_json, sort_conflicts,
};
use chrono::NaiveDate;
use polars::prelude::{AnyValue, DataFrame, IntoColumn, NamedFrom, PlSmallStr, PolarsResult, Series};

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

fn cell_text(value: &AnyValue) -> String {
    match value {
        AnyValue::Null => String::new(),
        AnyValue::Int32(v) => v.to_string(),
        AnyValue::Int64(v) => v.to_string(),
        AnyValue::UInt32(v) => v.to_string(),
        AnyValue::Float64(v) => format!("{:.2}", v),
        AnyValue::Boolean(v) => v.to_string(),
        AnyValue::String(s) => s.to_string(),
        other => other.to_string(),
    }
}

fn render_df_as_text_table(df: &DataFrame) -> String {
    let columns = df.get_columns();
    let col_names: Vec<String> = columns.iter().map(|c| c.name().to_string()).collect();

    let mut rows: Vec<Vec<String>> = Vec::with_capacity(df.height());
    for row_idx in 0..df.height() {
        let row = columns
            .iter()
            .map(|col| col.get(row_idx).map(|av| cell_text(&av)).unwrap_or_default())
            .collect();
        rows.push(row);
    }

    let mut widths: Vec<usize> = col_names.iter().map(|n| n.len()).collect();
    for row in &rows {
        for (ci, cell) in row.iter().enumerate() {
            widths[ci] = widths[ci].max(cell.len());
        }
    }

    let mut sep = String::from("+");
    for w in &widths {
        sep.push_str(&"-".repeat(*w + 2));
        sep.push('+');
    }

    let render_row = |cells: &[String]| {
        let mut line = String::from("|");
        for (ci, cell) in cells.iter().enumerate() {
            line.push(' ');
            line.push_str(cell);
            line.push_str(&" ".repeat(widths[ci].saturating_sub(cell.len())));
            line.push_str(" |");
        }
        line
    };

    let mut out = String::new();
    out.push_str(&sep);
    out.push('\n');
    out.push_str(&render_row(&col_names));
    out.push('\n');
    out.push_str(&sep);
    out.push('\n');
    for row in &rows {
        out.push_str(&render_row(row));
        out.push('\n');
    }
    out.push_str(&sep);
    out.push('\n');
    out
}

fn string_column(name: &'static str, values: Vec<String>) -> polars::prelude::Column {
    Series::new(PlSmallStr::from_static(name), values).into_column()
}

fn f64_column(name: &'static str, values: Vec<f64>) -> polars::prelude::Column {
    Series::new(PlSmallStr::from_static(name), values).into_column()
}

fn resources_frame(resources: &[Resource]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        string_column("id", resources.iter().map(|r| r.id.clone()).collect()),
        string_column("name", resources.iter().map(|r| r.name.clone()).collect()),
        string_column("kind", resources.iter().map(|r| r.kind.to_string()).collect()),
        f64_column(
            "daily_capacity",
            resources.iter().map(|r| r.daily_capacity).collect(),
        ),
        string_column(
            "hourly_cost",
            resources
                .iter()
                .map(|r| r.hourly_cost.map(|c| format!("{c:.2}")).unwrap_or_default())
                .collect(),
        ),
    ])
}

fn allocations_frame(allocations: &[Allocation]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        string_column(
            "resource_id",
            allocations.iter().map(|a| a.resource_id.clone()).collect(),
        ),
        string_column("task_id", allocations.iter().map(|a| a.task_id.clone()).collect()),
        f64_column("hours", allocations.iter().map(|a| a.allocated_hours).collect()),
        string_column("start", allocations.iter().map(|a| a.start_date.to_string()).collect()),
        string_column("end", allocations.iter().map(|a| a.end_date.to_string()).collect()),
        f64_column(
            "percent",
            allocations.iter().map(|a| a.allocation_percent).collect(),
        ),
    ])
}

fn conflicts_frame(conflicts: &[Conflict]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        string_column(
            "resource_id",
            conflicts.iter().map(|c| c.resource_id.clone()).collect(),
        ),
        string_column("date", conflicts.iter().map(|c| c.date.to_string()).collect()),
        string_column("severity", conflicts.iter().map(|c| c.severity.to_string()).collect()),
        f64_column("over_hours", conflicts.iter().map(|c| c.over_hours).collect()),
        string_column(
            "tasks",
            conflicts
                .iter()
                .map(|c| c.involved_task_ids.join(","))
                .collect(),
        ),
    ])
}

fn suggestions_frame(suggestions: &[Suggestion]) -> PolarsResult<DataFrame> {
    DataFrame::new(vec![
        string_column("kind", suggestions.iter().map(|s| s.kind.to_string()).collect()),
        string_column(
            "resources",
            suggestions
                .iter()
                .map(|s| s.affected_resource_ids.join(","))
                .collect(),
        ),
        f64_column(
            "impact",
            suggestions.iter().map(|s| s.estimated_impact).collect(),
        ),
        string_column(
            "description",
            suggestions.iter().map(|s| s.description.clone()).collect(),
        ),
    ])
}

fn print_frame(frame: PolarsResult<DataFrame>) {
    match frame {
        Ok(df) => println!("{}", render_df_as_text_table(&df)),
        Err(e) => println!("Error rendering table: {}", e),
    }
}

fn print_help() {
    println!(
        "Commands:\n  help                                   Show this help\n  show                                   Show resources and allocations\n  resource add <id> <kind> <capacity> [hourly_cost] [name...]\n                                         Add a resource (kind: person|equipment|budget)\n  resource remove <id>                   Remove a resource and its allocations\n  alloc add <resource> <task> <hours> <start> <end> [percent]\n                                         Add an allocation (percent derived when omitted)\n  alloc remove <resource> <task>         Remove allocations of a task to a resource\n  range [<start> <end>]                  Show or set the analysis window (YYYY-MM-DD)\n  util <resource> <date>                 Utilization of a resource on one day\n  timeline <resource> [<start> <end>]    Day-by-day utilization table\n  conflicts [<start> <end>]              Conflicts, most severe first\n  metrics                                Portfolio metrics\n  suggest                                Optimization suggestions\n  analyze [<start> <end>]                Full analysis summary\n  meta name <text...>                    Update portfolio name\n  config show                            Show analysis configuration\n  config load <json_path>                Load analysis configuration\n  config save <json_path>                Save analysis configuration\n  save <json|csv> <path>                 Persist portfolio to disk\n  load <json|csv> <path>                 Load portfolio from disk\n  quit|exit                              Exit"
    );
}

fn print_range(portfolio: &Portfolio) {
    let metadata = portfolio.metadata();
    println!("Portfolio          : {}", metadata.name);
    println!(
        "Analysis window    : {} .. {}",
        metadata.range_start, metadata.range_end
    );
}

/// Optional `<start> <end>` pair; falls back to the portfolio window.
fn window_args<'a>(
    portfolio: &Portfolio,
    mut parts: impl Iterator<Item = &'a str>,
) -> Result<(NaiveDate, NaiveDate), String> {
    match (parts.next(), parts.next()) {
        (None, _) => Ok((
            portfolio.metadata().range_start,
            portfolio.metadata().range_end,
        )),
        (Some(start_s), Some(end_s)) => match (parse_date(start_s), parse_date(end_s)) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err("Invalid date (YYYY-MM-DD)".to_string()),
        },
        (Some(_), None) => Err("Both <start> and <end> are required".to_string()),
    }
}

fn main() {
    let verbosity = std::env::var("CAPACITY_TOOL_VERBOSITY")
        .ok()
        .and_then(|v| v.parse::<u8>().ok())
        .unwrap_or(0);
    logging::init(verbosity);

    let mut portfolio = Portfolio::new();

    println!("Capacity Tool (CLI) - type 'help' for commands\n");
    print_range(&portfolio);

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => {
                println!("Resources:");
                print_frame(resources_frame(portfolio.resources()));
                println!("Allocations:");
                print_frame(allocations_frame(portfolio.allocations()));
            }
            "resource" => match parts.next() {
                Some("add") => {
                    let id = parts.next();
                    let kind = parts.next();
                    let capacity = parts.next();
                    match (id, kind, capacity) {
                        (Some(id), Some(kind_s), Some(capacity_s)) => {
                            let Ok(kind) = ResourceKind::from_str(kind_s) else {
                                println!("Invalid kind (person|equipment|budget)");
                                continue;
                            };
                            let Ok(capacity) = capacity_s.parse::<f64>() else {
                                println!("Invalid capacity");
                                continue;
                            };
                            let mut resource = Resource::new(id, kind, capacity);
                            if let Some(cost_s) = parts.next() {
                                match cost_s.parse::<f64>() {
                                    Ok(cost) => resource.hourly_cost = Some(cost),
                                    Err(_) => {
                                        println!("Invalid hourly_cost");
                                        continue;
                                    }
                                }
                            }
                            let rest: Vec<&str> = parts.collect();
                            if !rest.is_empty() {
                                resource.name = rest.join(" ");
                            }
                            match portfolio.add_resource(resource) {
                                Ok(_) => println!("Resource {id} added."),
                                Err(e) => {
                                    tracing::warn!(error = %e, "resource rejected");
                                    println!("Error: {}", e);
                                }
                            }
                        }
                        _ => println!(
                            "Usage: resource add <id> <kind> <capacity> [hourly_cost] [name...]"
                        ),
                    }
                }
                Some("remove") => match parts.next() {
                    Some(id) => {
                        if portfolio.remove_resource(id) {
                            println!("Removed resource {id}.");
                        } else {
                            println!("Resource {id} not found.");
                        }
                    }
                    None => println!("Usage: resource remove <id>"),
                },
                _ => println!("Usage: resource add|remove ..."),
            },
            "alloc" => match parts.next() {
                Some("add") => {
                    let args: Vec<&str> = parts.collect();
                    if args.len() < 5 {
                        println!(
                            "Usage: alloc add <resource> <task> <hours> <start> <end> [percent]"
                        );
                        continue;
                    }
                    let Ok(hours) = args[2].parse::<f64>() else {
                        println!("Invalid hours");
                        continue;
                    };
                    let (Some(start), Some(end)) = (parse_date(args[3]), parse_date(args[4]))
                    else {
                        println!("Invalid date (YYYY-MM-DD)");
                        continue;
                    };
                    let allocation = match args.get(5) {
                        Some(percent_s) => match percent_s.parse::<f64>() {
                            Ok(percent) => {
                                Allocation::new(args[0], args[1], hours, start, end, percent)
                            }
                            Err(_) => {
                                println!("Invalid percent");
                                continue;
                            }
                        },
                        None => match portfolio.find_resource(args[0]) {
                            Some(resource) => {
                                Allocation::with_derived_percent(resource, args[1], hours, start, end)
                            }
                            None => {
                                println!("Error: unknown resource '{}'", args[0]);
                                continue;
                            }
                        },
                    };
                    match portfolio.add_allocation(allocation) {
                        Ok(_) => println!("Allocation of task {} to {} added.", args[1], args[0]),
                        Err(e) => {
                            tracing::warn!(error = %e, "allocation rejected");
                            println!("Error: {}", e);
                        }
                    }
                }
                Some("remove") => match (parts.next(), parts.next()) {
                    (Some(resource_id), Some(task_id)) => {
                        let removed = portfolio.remove_allocation(resource_id, task_id);
                        println!("Removed {removed} allocation(s).");
                    }
                    _ => println!("Usage: alloc remove <resource> <task>"),
                },
                _ => println!("Usage: alloc add|remove ..."),
            },
            "range" => match (parts.next(), parts.next()) {
                (None, _) => print_range(&portfolio),
                (Some(start_s), Some(end_s)) => match (parse_date(start_s), parse_date(end_s)) {
                    (Some(start), Some(end)) => match portfolio.set_range(start, end) {
                        Ok(_) => print_range(&portfolio),
                        Err(e) => println!("Error: {}", e),
                    },
                    _ => println!("Invalid date (YYYY-MM-DD)"),
                },
                _ => println!("Usage: range <start> <end>"),
            },
            "util" => match (parts.next(), parts.next().and_then(parse_date)) {
                (Some(resource_id), Some(date)) => match portfolio.utilization(resource_id, date) {
                    Ok(Some(day)) => println!(
                        "{resource_id} on {date}: {:.2}h ({:.1}%){}",
                        day.hours,
                        day.percent,
                        if day.overloaded { " OVERLOADED" } else { "" }
                    ),
                    Ok(None) => println!("Resource {resource_id} not found."),
                    Err(e) => println!("Error: {}", e),
                },
                _ => println!("Usage: util <resource> <YYYY-MM-DD>"),
            },
            "timeline" => {
                let Some(resource_id) = parts.next() else {
                    println!("Usage: timeline <resource> [<start> <end>]");
                    continue;
                };
                let (start, end) = match window_args(&portfolio, parts) {
                    Ok(window) => window,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                match portfolio.timeline(resource_id, start, end) {
                    Ok(Some(series)) => print_frame(series.to_dataframe()),
                    Ok(None) => println!("Resource {resource_id} not found."),
                    Err(e) => println!("Error: {}", e),
                }
            }
            "conflicts" | "analyze" => {
                let (start, end) = match window_args(&portfolio, parts) {
                    Ok(window) => window,
                    Err(message) => {
                        println!("{message}");
                        continue;
                    }
                };
                match portfolio.analyze_range(start, end) {
                    Ok(mut report) if cmd == "conflicts" => {
                        if report.conflicts.is_empty() {
                            println!("No conflicts between {start} and {end}.");
                        } else {
                            sort_conflicts(&mut report.conflicts);
                            print_frame(conflicts_frame(&report.conflicts));
                        }
                    }
                    Ok(report) => println!("Analysis ({})", report.to_cli_summary()),
                    Err(e) => println!("Analysis error: {}", e),
                }
            }
            "metrics" => match portfolio.analyze() {
                Ok(report) => {
                    let metrics = &report.metrics;
                    println!("Total resources    : {}", metrics.total);
                    println!("Active resources   : {}", metrics.active);
                    println!("Avg utilization    : {:.1}%", metrics.avg_utilization);
                    println!("Total cost         : {:.2}", metrics.total_cost);
                }
                Err(e) => println!("Analysis error: {}", e),
            },
            "suggest" => match portfolio.analyze() {
                Ok(report) if report.suggestions.is_empty() => println!("No suggestions."),
                Ok(report) => print_frame(suggestions_frame(&report.suggestions)),
                Err(e) => println!("Analysis error: {}", e),
            },
            "meta" => match parts.next() {
                Some("name") => {
                    let rest: Vec<&str> = parts.collect();
                    if rest.is_empty() {
                        println!("Usage: meta name <text...>");
                        continue;
                    }
                    let mut metadata = portfolio.metadata().clone();
                    metadata.name = rest.join(" ");
                    match portfolio.set_metadata(metadata) {
                        Ok(_) => print_range(&portfolio),
                        Err(e) => println!("Error: {}", e),
                    }
                }
                _ => print_range(&portfolio),
            },
            "config" => match parts.next() {
                Some("show") | None => match serde_json::to_string_pretty(portfolio.config()) {
                    Ok(json) => println!("{json}"),
                    Err(e) => println!("Error serializing config: {}", e),
                },
                Some("load") => match parts.next() {
                    Some(path) => match AnalysisConfig::load(path) {
                        Ok(config) => match portfolio.set_config(config) {
                            Ok(_) => println!("Config loaded from {}.", path),
                            Err(e) => println!("Invalid config: {}", e),
                        },
                        Err(e) => println!("Error loading config: {}", e),
                    },
                    None => println!("Usage: config load <json_path>"),
                },
                Some("save") => match parts.next() {
                    Some(path) => match portfolio.config().save(path) {
                        Ok(_) => println!("Config saved to {}.", path),
                        Err(e) => println!("Error saving config: {}", e),
                    },
                    None => println!("Usage: config save <json_path>"),
                },
                Some(other) => {
                    println!("Unknown config command '{}'.", other);
                    println!("Usage: config show|load <json_path>|save <json_path>");
                }
            },
            "save" => match (parts.next(), parts.next()) {
                (Some("json"), Some(path)) => match save_portfolio_to_json(&portfolio, path) {
                    Ok(_) => println!("Portfolio saved to {}.", path),
                    Err(e) => println!("Error saving portfolio: {}", e),
                },
                (Some("csv"), Some(path)) => match save_portfolio_to_csv(&portfolio, path) {
                    Ok(_) => println!("Portfolio saved to {}.", path),
                    Err(e) => println!("Error saving portfolio: {}", e),
                },
                _ => println!("Usage: save <json|csv> <path>"),
            },
            "load" => {
                let loaded = match (parts.next(), parts.next()) {
                    (Some("json"), Some(path)) => Some((path, load_portfolio_from_json(path))),
                    (Some("csv"), Some(path)) => Some((path, load_portfolio_from_csv(path))),
                    _ => None,
                };
                match loaded {
                    Some((path, Ok(next))) => {
                        portfolio = next;
                        println!("Portfolio loaded from {}.", path);
                        print_range(&portfolio);
                    }
                    Some((_, Err(e))) => println!("Error loading portfolio: {}", e),
                    None => println!("Usage: load <json|csv> <path>"),
                }
            }
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
