use super::{check_format, load_optional_manifest};
use anyhow::{Context, Result};
use comfy_table::{Cell, Color, Table};
use gate_config::parser;
use selection_gate::{ProbeSettings, probe_external_network, probe_local_network};
use serde::Serialize;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Serialize)]
struct ProbeReport {
    local_network: bool,
    local_ports: [u16; 2],
    external_network: bool,
    external_address: Option<SocketAddr>,
}

pub fn run(manifest_path: &Path, format: &str) -> Result<()> {
    check_format(format)?;

    let manifest = load_optional_manifest(manifest_path)?;
    let settings = parser::convert_network(
        manifest
            .as_ref()
            .and_then(|manifest| manifest.settings.network.as_ref()),
    )
    .context("Invalid network settings")?;

    let report = run_probes(&settings);

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        display_table(&report, &settings);
    }

    Ok(())
}

fn run_probes(settings: &ProbeSettings) -> ProbeReport {
    collect_report(
        settings.local_ports,
        || probe_local_network(settings),
        || probe_external_network(settings),
    )
}

// Local first, then external, the same order the gate uses
fn collect_report(
    local_ports: [u16; 2],
    local: impl FnOnce() -> bool,
    external: impl FnOnce() -> Option<SocketAddr>,
) -> ProbeReport {
    let local_network = local();
    let external_address = external();
    ProbeReport {
        local_network,
        local_ports,
        external_network: external_address.is_some(),
        external_address,
    }
}

fn display_table(report: &ProbeReport, settings: &ProbeSettings) {
    let mut table = Table::new();
    table.set_header(vec!["PROBE", "STATUS", "DETAIL"]);

    let local_detail = format!(
        "bind ports {} and {}",
        settings.local_ports[0], settings.local_ports[1]
    );
    let external_detail = match report.external_address {
        Some(addr) => format!("connected to {}", addr),
        None => format!(
            "{} addresses tried, up to {:?}",
            settings.external_addresses.len(),
            settings.external_worst_case()
        ),
    };

    table.add_row(vec![
        Cell::new("local"),
        status_cell(report.local_network),
        Cell::new(&local_detail),
    ]);
    table.add_row(vec![
        Cell::new("external"),
        status_cell(report.external_network),
        Cell::new(&external_detail),
    ]);

    println!("{}", table);
}

fn status_cell(available: bool) -> Cell {
    if available {
        Cell::new("available").fg(Color::Green)
    } else {
        Cell::new("unavailable").fg(Color::Red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[test]
    fn test_local_probe_runs_before_external() {
        let calls = RefCell::new(Vec::new());
        let addr: SocketAddr = "127.0.0.1:80".parse().unwrap();

        let report = collect_report(
            [18000, 18001],
            || {
                calls.borrow_mut().push("local");
                true
            },
            || {
                calls.borrow_mut().push("external");
                Some(addr)
            },
        );

        assert_eq!(calls.into_inner(), vec!["local", "external"]);
        assert!(report.local_network);
        assert!(report.external_network);
        assert_eq!(report.external_address, Some(addr));
    }

    #[test]
    fn test_report_without_external_address() {
        let report = collect_report([18000, 18001], || false, || None);

        assert!(!report.local_network);
        assert!(!report.external_network);
        assert_eq!(report.local_ports, [18000, 18001]);
    }
}
