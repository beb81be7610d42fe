mod cli;
mod config;
mod core;
mod highlight;
mod keys;
mod logging;
mod picker;
mod plan;
mod selection;
mod terminal;
mod transform;
mod ui;

use crate::cli::Cli;
use crate::config::Config;
use crate::core::ListOptions;
use crate::plan::{Mode, Plan, Report};
use crate::transform::SeparatorPolicy;
use crate::ui::RenderSettings;
use clap::Parser;
use std::error::Error;
use std::process::ExitCode;
use tracing::info;

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn Error>> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    let _log_guard = logging::init(&config.log);

    let style = cli.style.unwrap_or(config.style);
    let separator =
        SeparatorPolicy::from_option(cli.separator.clone().or_else(|| config.separator.clone()));
    let options = ListOptions {
        include_hidden: cli.hidden || config.include_hidden,
    };

    let mut paths = cli.scan_paths();
    if let Some(list) = &cli.list {
        paths.extend(core::load_list(list).await?);
    }
    let entries = core::collect_entries(&paths, options).await?;
    info!(count = entries.len(), ?style, "collected files");
    if entries.is_empty() {
        eprintln!("no files found");
        return Ok(ExitCode::SUCCESS);
    }

    let filters = cli.initial_filters(&config.filters);
    let (chosen, filters) = if cli.all {
        (entries, filters)
    } else {
        let preselect = cli.preselect;
        let settings = RenderSettings {
            title: config.picker.title.clone(),
            highlight: ui::parse_color(&config.picker.highlight),
            show_preview: config.picker.show_preview,
            style,
            separator: separator.clone(),
        };
        tokio::task::spawn_blocking(move || -> Result<_, terminal::SessionError> {
            let outcome = picker::pick(&entries, filters, preselect, settings)?;
            Ok((outcome.selected, outcome.filters))
        })
        .await??
    };

    if chosen.is_empty() {
        eprintln!("nothing selected");
        return Ok(ExitCode::SUCCESS);
    }

    let plan = plan::build_plan(&chosen, &filters, style, &separator).await;
    print_skipped(&plan);
    if cli.dry_run {
        print_plan(&plan);
        return Ok(ExitCode::SUCCESS);
    }

    let mode = if cli.copy { Mode::Copy } else { Mode::Rename };
    let report = plan::execute(&plan, mode).await;
    print_report(&report);
    if report.failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn print_skipped(plan: &Plan) {
    for (path, reason) in &plan.skipped {
        eprintln!("skip {}: {}", path.display(), reason);
    }
}

fn print_plan(plan: &Plan) {
    for operation in &plan.operations {
        println!("{} -> {}", operation.source.display(), operation.target.display());
    }
}

fn print_report(report: &Report) {
    for operation in &report.done {
        println!("{} -> {}", operation.source.display(), operation.target.display());
    }
    for (operation, error) in &report.failed {
        eprintln!("failed {}: {}", operation.source.display(), error);
    }
}
