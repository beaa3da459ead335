use super::check_format;
use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use gate_config::parser;
use selection_gate::{
    CategoryTag, Decision, RunConfiguration, SystemEnvironment, TestItem, evaluate,
};
use serde::Serialize;
use std::path::Path;
use tracing::info;

#[derive(Serialize)]
struct Evaluation<'a> {
    test: &'a str,
    path: &'a str,
    tags: &'a [CategoryTag],
    #[serde(flatten)]
    decision: Decision,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
struct Summary {
    total: usize,
    run: usize,
    skipped: usize,
}

impl Summary {
    fn from_evaluations(evaluations: &[Evaluation<'_>]) -> Self {
        let run = evaluations.iter().filter(|e| e.decision.is_run()).count();
        Summary {
            total: evaluations.len(),
            run,
            skipped: evaluations.len() - run,
        }
    }
}

#[derive(Serialize)]
struct Report<'a> {
    results: &'a [Evaluation<'a>],
    summary: &'a Summary,
}

pub fn run(
    manifest_path: &Path,
    run_destructive: bool,
    run_expensive: bool,
    tag: Option<&str>,
    format: &str,
) -> Result<()> {
    check_format(format)?;

    let manifest = parser::parse_file(manifest_path).context("Failed to parse manifest")?;
    let suite = parser::build_suite(&manifest, false).context("Failed to load tests")?;

    // Command line flags can only enable categories
    let config = suite
        .run_config
        .merge(RunConfiguration::new(run_destructive, run_expensive));
    info!(
        run_destructive = config.run_destructive,
        run_expensive = config.run_expensive,
        "evaluating {} tests",
        suite.items.len()
    );

    let env = SystemEnvironment::new().with_probe_settings(suite.probes.clone());
    let evaluations: Vec<_> = suite
        .items
        .iter()
        .filter(|item| tag.is_none_or(|tag| item.has_tag(tag)))
        .map(|item| evaluation(item, evaluate(item, &config, &env)))
        .collect();
    let summary = Summary::from_evaluations(&evaluations);

    if format == "json" {
        let report = Report {
            results: &evaluations,
            summary: &summary,
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if evaluations.is_empty() {
        match tag {
            Some(tag) => println!("No tests tagged '{}'", tag),
            None => println!("No tests in {}", manifest_path.display()),
        }
        return Ok(());
    }

    display_table(&evaluations);
    println!(
        "{} tests: {} run, {} skipped",
        summary.total, summary.run, summary.skipped
    );
    Ok(())
}

fn evaluation(item: &TestItem, decision: Decision) -> Evaluation<'_> {
    Evaluation {
        test: item.name(),
        path: item.path(),
        tags: item.tags(),
        decision,
    }
}

fn display_table(evaluations: &[Evaluation<'_>]) {
    let mut table = Table::new();
    table.set_header(vec!["TEST", "TAGS", "DECISION", "REASON"]);

    for evaluation in evaluations {
        let tags = if evaluation.tags.is_empty() {
            "-".to_string()
        } else {
            evaluation
                .tags
                .iter()
                .map(CategoryTag::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        };

        let (decision, color, reason) = match &evaluation.decision {
            Decision::Run => ("run", Color::Green, "-".to_string()),
            Decision::Skip(reason) => (
                "skip",
                Color::Yellow,
                format!("[{}] {}", reason.kind(), reason.message()),
            ),
        };

        table.add_row(vec![
            Cell::new(evaluation.test),
            Cell::new(&tags),
            Cell::new(decision).fg(color),
            Cell::new(&reason),
        ]);
    }

    println!("{}", table);
}
