use colored::Colorize;
use comfy_table::{Cell, CellAlignment, ContentArrangement, Table};
use itertools::Itertools;

use crate::engine::{SolverResult, StateTable, StateValue};
use crate::summary::StrategySummary;

/// Default per-axis clip for the policy heat map.
pub const DEFAULT_MAX_DISPLAY: usize = 50;

pub fn format_money(value: f64) -> String {
    format!("{:.2}", value)
}

pub fn format_signed_money(value: f64) -> String {
    if value >= 0.0 {
        format!("+{:.2}", value)
    } else {
        format!("{:.2}", value)
    }
}

fn format_optional_money(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), format_money)
}

pub fn decision_label(policy: bool) -> String {
    if policy {
        "CONTINUE".green().bold().to_string()
    } else {
        "STOP".red().bold().to_string()
    }
}

fn profit_cell(value: f64) -> Cell {
    let text = format_signed_money(value);
    if value > 0.0 {
        Cell::new(text.green().to_string())
    } else if value < 0.0 {
        Cell::new(text.red().to_string())
    } else {
        Cell::new(text)
    }
}

/// Start-state KPIs. When the recommendation is to stop, the figures for
/// drawing until no winning tokens remain are appended.
pub fn kpi_table(result: &SolverResult) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("Metric".bold().to_string()),
        Cell::new("Value").set_alignment(CellAlignment::Right),
    ]);

    let (r0, b0) = result.start();
    table.add_row(vec![
        Cell::new("Start State"),
        Cell::new(format!("R={} B={}", r0, b0)),
    ]);
    table.add_row(vec![
        Cell::new("Decision"),
        Cell::new(decision_label(result.policy_start)),
    ]);
    table.add_row(vec![Cell::new("Optimal EV"), profit_cell(result.v_start)]);
    table.add_row(vec![
        Cell::new("Cost / Scratch"),
        Cell::new(format_money(result.effective_cost_per_scratch)),
    ]);
    table.add_row(vec![
        Cell::new("Cost / Win"),
        Cell::new(format_optional_money(result.avg_cost_per_win)),
    ]);
    table.add_row(vec![
        Cell::new("Expected Wins"),
        Cell::new(format!("{:.2}", result.expected_wins)),
    ]);
    table.add_row(vec![
        Cell::new("Expected Cost"),
        Cell::new(format_money(result.expected_total_cost)),
    ]);

    if !result.policy_start {
        let forced = &result.force_play_all;
        let dim = |s: &str| s.dimmed().to_string();
        table.add_row(vec![
            Cell::new(dim("Play-to-end Wins")),
            Cell::new(format!("{:.2}", forced.expected_wins)),
        ]);
        table.add_row(vec![
            Cell::new(dim("Play-to-end Cost")),
            Cell::new(format_money(forced.expected_total_cost)),
        ]);
        table.add_row(vec![
            Cell::new(dim("Play-to-end Cost / Win")),
            Cell::new(format_optional_money(forced.avg_cost_per_win)),
        ]);
        table.add_row(vec![
            Cell::new(dim("Play-to-end EV")),
            profit_cell(forced.expected_net_profit),
        ]);
    }

    table.to_string()
}

/// Green/red grid of the policy table, `r` descending down the rows and `b`
/// ascending across the columns.
pub fn policy_heatmap(policy: &StateTable<bool>, max_display: usize) -> String {
    let r0 = policy.rows() - 1;
    let b0 = policy.cols() - 1;
    let shown_r = r0.min(max_display);
    let shown_b = b0.min(max_display);
    let label_width = shown_r.to_string().len().max(1);

    let mut out = String::new();
    out.push_str(&format!("  {}\n", "Policy Map (green = continue, red = stop)".bold()));
    if r0 > max_display || b0 > max_display {
        out.push_str(&format!(
            "  {}\n",
            format!(
                "Showing only the first {}x{} states of {}x{}",
                shown_r + 1,
                shown_b + 1,
                r0 + 1,
                b0 + 1
            )
            .yellow()
        ));
    }

    for r in (0..=shown_r).rev() {
        let cells: String = policy.row(r)[..=shown_b]
            .iter()
            .map(|&go| {
                if go {
                    "\u{2588}\u{2588}".green().to_string()
                } else {
                    "\u{2588}\u{2588}".red().to_string()
                }
            })
            .collect();
        out.push_str(&format!("  {:>w$} {}\n", r, cells, w = label_width));
    }

    let axis_width = (shown_b + 1) * 2;
    let last = shown_b.to_string();
    let pad = axis_width.saturating_sub(1 + last.len());
    out.push_str(&format!(
        "  {:>w$} 0{}{}\n",
        "",
        " ".repeat(pad),
        if shown_b > 0 { last } else { String::new() },
        w = label_width
    ));
    out.push_str(&format!(
        "  {:>w$} {}",
        "",
        "R = winning left (rows), B = non-winning left (columns)".dimmed(),
        w = label_width
    ));
    out
}

/// Details for one state.
pub fn state_table(r: usize, b: usize, state: &StateValue) -> String {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new(format!("State R={} B={}", r, b).bold().to_string()),
        Cell::new("Value").set_alignment(CellAlignment::Right),
    ]);
    table.add_row(vec![Cell::new("Decision"), Cell::new(decision_label(state.policy))]);
    table.add_row(vec![Cell::new("V"), profit_cell(state.value)]);
    table.add_row(vec![Cell::new("Continue"), profit_cell(state.continue_value)]);
    table.add_row(vec![
        Cell::new("Expected Cost"),
        Cell::new(format_money(state.expected_cost)),
    ]);
    table.add_row(vec![
        Cell::new("Expected Wins"),
        Cell::new(format!("{:.2}", state.expected_wins)),
    ]);
    table.to_string()
}

pub fn summary_text(summary: &StrategySummary) -> String {
    match summary.typical_threshold {
        None => format!(
            "  {} In most states it is not worth continuing.",
            "Advice:".red().bold()
        ),
        Some(threshold) => {
            let spots = summary
                .sweet_spots
                .iter()
                .map(|s| format!("B={}: R>={}", s.column, s.min_winning))
                .join(", ");
            format!(
                "  {} Usually worth continuing while at least {} winning tokens remain.\n  {}\n  {}",
                "Sweet spot:".green().bold(),
                threshold.to_string().green().bold(),
                spots.dimmed(),
                format!(
                    "{:.1}% of states recommend continuing",
                    summary.continue_share * 100.0
                )
                .dimmed()
            )
        }
    }
}

pub fn print_section(title: &str, content: &str) {
    println!("\n{}", title.cyan().bold());
    println!("{}", content);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "Error:".red().bold(), msg);
}
