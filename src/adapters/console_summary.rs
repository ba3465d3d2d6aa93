//! Plain-text performance summary for the terminal.

use std::fmt;

use crate::domain::metrics::PerformanceReport;

/// Renders the summary block printed after a run.
pub fn render(title: &str, report: &PerformanceReport) -> String {
    Summary { title, report }.to_string()
}

struct Summary<'a> {
    title: &'a str,
    report: &'a PerformanceReport,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, out: &mut fmt::Formatter<'_>) -> fmt::Result {
        let report = self.report;
        writeln!(out, "=== {} ===", self.title)?;
        writeln!(out, "Trades:         {}", report.num_trades)?;
        writeln!(out, "Total profit:   {}", currency(report.total_profit))?;
        match report.final_equity {
            Some(equity) => writeln!(out, "Final equity:   {}", currency(equity))?,
            None => writeln!(out, "Final equity:   n/a")?,
        }
        writeln!(out, "Sharpe ratio:   {}", report.sharpe_ratio)?;
        writeln!(out, "Max drawdown:   {}", currency(report.max_drawdown))?;
        writeln!(out, "Profit factor:  {}", report.profit_factor)?;

        if report.annual.is_empty() {
            return Ok(());
        }
        writeln!(out, "Annual:")?;
        for year in &report.annual {
            writeln!(
                out,
                "  {}: {} trades, profit {}, max drawdown {}",
                year.year,
                year.num_trades,
                currency(year.total_profit),
                currency(year.max_drawdown),
            )?;
        }
        Ok(())
    }
}

/// Two decimals with comma thousands separators, e.g. `-1,234,567.89`.
pub fn currency(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && formatted != "0.00" { "-" } else { "" };
    format!("{sign}{grouped}.{frac_part}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{AnnualSummary, Statistic};

    fn report() -> PerformanceReport {
        PerformanceReport {
            num_trades: 3,
            total_profit: 1_234_567.891,
            gross_profit: 1_300_000.0,
            gross_loss: 65_432.109,
            final_equity: Some(1_734_567.891),
            sharpe_ratio: Statistic::Value(0.51234),
            max_drawdown: 65_432.109,
            profit_factor: Statistic::Infinite,
            annual: vec![AnnualSummary {
                year: 2024,
                num_trades: 3,
                total_profit: 1_234_567.891,
                max_drawdown: 0.0,
            }],
            quarterly: vec![],
        }
    }

    #[test]
    fn currency_grouping() {
        assert_eq!(currency(0.0), "0.00");
        assert_eq!(currency(999.999), "1,000.00");
        assert_eq!(currency(1_234_567.891), "1,234,567.89");
        assert_eq!(currency(-1234.5), "-1,234.50");
        assert_eq!(currency(-0.001), "0.00");
        assert_eq!(currency(100.0), "100.00");
    }

    #[test]
    fn render_lists_all_statistics() {
        let text = render("Fixed capital, one trade per day", &report());
        assert!(text.starts_with("=== Fixed capital, one trade per day ===\n"));
        assert!(text.contains("Trades:         3\n"));
        assert!(text.contains("Total profit:   1,234,567.89\n"));
        assert!(text.contains("Final equity:   1,734,567.89\n"));
        assert!(text.contains("Sharpe ratio:   0.5123\n"));
        assert!(text.contains("Max drawdown:   65,432.11\n"));
        assert!(text.contains("Profit factor:  inf\n"));
        assert!(text.contains("  2024: 3 trades, profit 1,234,567.89, max drawdown 0.00\n"));
    }

    #[test]
    fn render_undefined_sharpe() {
        let mut r = report();
        r.sharpe_ratio = Statistic::Undefined;
        r.final_equity = None;
        r.annual.clear();
        let text = render("x", &r);
        assert!(text.contains("Sharpe ratio:   nan\n"));
        assert!(text.contains("Final equity:   n/a\n"));
        assert!(!text.contains("Annual:"));
    }
}
