//! Plain-text rendering of dashboard state.

use std::{
    io::{self, Write},
    time::Duration,
};

use client_core::{DashboardOrchestrator, MetricReveals};
use shared::domain::{MetricKind, OptimizationResult, ParameterField, ProcessParameters};
use tokio::time;

pub fn print_parameters(parameters: &ProcessParameters) {
    println!("{:<22} {:>10} {:>8} {:>8} {:>6}", "parameter", "value", "min", "max", "step");
    for (field, value) in parameters.iter() {
        print_parameter_row(field, value);
    }
}

fn print_parameter_row(field: ParameterField, value: f64) {
    let domain = field.domain();
    println!(
        "{:<22} {:>10} {:>8} {:>8} {:>6}",
        field.key(),
        value,
        domain.min,
        domain.max,
        domain.step
    );
}

fn metric_line(reveals: &MetricReveals) -> String {
    reveals
        .displayed()
        .into_iter()
        .map(|(kind, value)| format!("{}: {:.*}", short_label(kind), kind.decimals(), value))
        .collect::<Vec<_>>()
        .join(" | ")
}

fn short_label(kind: MetricKind) -> &'static str {
    match kind {
        MetricKind::StrengthGainRate => "strength/h",
        MetricKind::DemouldTime => "demould h",
        MetricKind::CostPerElement => "cost",
        MetricKind::EnergyConsumption => "energy kWh",
        MetricKind::MoldUtilization => "mold %",
        MetricKind::UnderStrengthRisk => "risk %",
    }
}

/// Redraws the metric line on stdout until every animator has reached its target.
pub async fn render_reveal(
    dashboard: &DashboardOrchestrator,
    result: &OptimizationResult,
) -> io::Result<()> {
    render_reveal_to(&mut io::stdout(), dashboard, result).await
}

async fn render_reveal_to<W: Write>(
    out: &mut W,
    dashboard: &DashboardOrchestrator,
    result: &OptimizationResult,
) -> io::Result<()> {
    let frame = Duration::from_millis(50);
    loop {
        let line = metric_line(dashboard.reveals());
        write!(out, "\r{line}")?;
        out.flush()?;

        let displayed = dashboard.reveals().displayed();
        let settled = result
            .metrics
            .iter()
            .all(|(kind, target)| displayed.get(&kind).copied() == Some(target));
        if settled {
            break;
        }
        time::sleep(frame).await;
    }
    writeln!(out)
}

pub fn print_insight(result: &OptimizationResult) {
    println!("\nDiagnostic insight\n------------------");
    for line in result.insight.lines() {
        println!("  {}", line.trim());
    }
}

pub fn print_tracker(result: &OptimizationResult) {
    if result.tracker_data.is_empty() {
        return;
    }
    println!("\nRisk tracker");
    println!("{:<26} {:>8} {:>8} {:>10}", "category", "before", "after", "reduction");
    for row in result.tracker_data.rows() {
        println!(
            "{:<26} {:>7}% {:>7}% {:>9}%",
            row.category,
            row.before,
            row.after,
            row.reduction()
        );
    }
}
