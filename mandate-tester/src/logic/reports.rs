use anyhow::Result;
use colored::Colorize;
use std::io::Write;
use std::time::Duration;

use mandate_game::Stat;
use mandate_game::numbers::ratio;

use super::ScenarioResult;
use super::playability::{PlayabilityAggregate, PlayabilityRecord};

const CSV_HEADER: &str = "strategy,seed_code,seed,approval,efficiency,environment,finance,approval_band,efficiency_band,environment_band,finance_band,bonus_triggered,bonus_shown";

pub fn generate_console_report(
    out: &mut dyn Write,
    results: &[ScenarioResult],
    aggregates: &[PlayabilityAggregate],
    total_duration: Duration,
) -> Result<()> {
    writeln!(out)?;
    writeln!(out, "{}", "📊 Logic Test Results Summary".bright_cyan().bold())?;
    writeln!(out, "{}", "==============================".cyan())?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "Total scenarios: {total_tests}")?;
    writeln!(out, "Passed: {}", passed_tests.to_string().green())?;
    writeln!(out, "Failed: {}", failed_tests.to_string().red())?;
    let success_rate = ratio(passed_tests, total_tests) * 100.0;
    writeln!(out, "Success rate: {success_rate:.1}%")?;
    writeln!(out, "Total time: {total_duration:?}")?;
    writeln!(out)?;

    for result in results {
        let status = if result.passed {
            "✅ PASS".green()
        } else {
            "❌ FAIL".red()
        };

        writeln!(
            out,
            "{} {} [{}]",
            status,
            result.scenario_name.bold(),
            result.seed_code
        )?;
        writeln!(
            out,
            "   Iterations: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "   Average time: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "   Failures:")?;
            for failure in &result.failures {
                writeln!(out, "     • {}", failure.red())?;
            }
        }
        writeln!(out)?;
    }

    let fastest = results.iter().min_by_key(|r| r.average_duration);
    let slowest = results.iter().max_by_key(|r| r.average_duration);
    if let (Some(fastest), Some(slowest)) = (fastest, slowest) {
        writeln!(out, "{}", "⚡ Performance Summary".bright_yellow().bold())?;
        writeln!(out, "{}", "=====================".yellow())?;
        writeln!(
            out,
            "Fastest: {} ({:?})",
            fastest.scenario_name.green(),
            fastest.average_duration
        )?;
        writeln!(
            out,
            "Slowest: {} ({:?})",
            slowest.scenario_name.yellow(),
            slowest.average_duration
        )?;
        writeln!(out)?;
    }

    if !aggregates.is_empty() {
        write_distribution_table(out, aggregates)?;
    }
    Ok(())
}

fn write_distribution_table(out: &mut dyn Write, aggregates: &[PlayabilityAggregate]) -> Result<()> {
    writeln!(out, "{}", "🎲 Outcome Distribution".bright_magenta().bold())?;
    writeln!(out, "{}", "=======================".magenta())?;
    writeln!(
        out,
        "{:<10} {:>5} {:>14} {:>10} {:>10} {:>10}",
        "strategy", "runs", "approval", "triggered", "shown", "converted"
    )?;
    for aggregate in aggregates {
        writeln!(
            out,
            "{:<10} {:>5} {:>7.1} ±{:<5.1} {:>9.1}% {:>9.1}% {:>9.1}%",
            aggregate.strategy.label(),
            aggregate.iterations,
            aggregate.mean_approval,
            aggregate.std_approval,
            aggregate.bonus_trigger_rate * 100.0,
            aggregate.bonus_shown_rate * 100.0,
            aggregate.bonus_conversion_rate * 100.0
        )?;
        for (stat, shares) in aggregate.band_distribution.iter() {
            let bands = shares
                .iter()
                .map(|share| format!("{:.0}%", share * 100.0))
                .collect::<Vec<_>>()
                .join(" / ");
            writeln!(out, "    {stat:<12} {bands}")?;
        }
    }
    Ok(())
}

pub fn generate_json_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    let json_output = serde_json::to_string_pretty(results)?;
    writeln!(out, "{json_output}")?;
    Ok(())
}

pub fn generate_markdown_report(out: &mut dyn Write, results: &[ScenarioResult]) -> Result<()> {
    writeln!(out, "# Mandate Logic Test Results\n")?;

    let total_tests = results.len();
    let passed_tests = results.iter().filter(|r| r.passed).count();
    let failed_tests = total_tests - passed_tests;

    writeln!(out, "## Summary\n")?;
    writeln!(out, "- **Total scenarios**: {total_tests}")?;
    writeln!(out, "- **Passed**: {passed_tests}")?;
    writeln!(out, "- **Failed**: {failed_tests}")?;
    let success_rate = ratio(passed_tests, total_tests) * 100.0;
    writeln!(out, "- **Success rate**: {success_rate:.1}%\n")?;

    writeln!(out, "## Detailed Results\n")?;

    for result in results {
        let status = if result.passed { "✅" } else { "❌" };

        writeln!(
            out,
            "### {} {} (`{}`)\n",
            status, result.scenario_name, result.seed_code
        )?;
        writeln!(
            out,
            "- **Iterations**: {}/{} successful",
            result.successful_iterations, result.iterations_run
        )?;
        writeln!(out, "- **Average time**: {:?}", result.average_duration)?;

        if !result.failures.is_empty() {
            writeln!(out, "- **Failures**:")?;
            for failure in &result.failures {
                writeln!(out, "  - {failure}")?;
            }
        }
        writeln!(out)?;
    }
    Ok(())
}

/// One row per analysed run.
pub fn generate_csv_report(out: &mut dyn Write, records: &[PlayabilityRecord]) -> Result<()> {
    writeln!(out, "{CSV_HEADER}")?;
    for record in records {
        let stats = Stat::ORDER
            .iter()
            .map(|stat| record.final_stats.get(*stat).to_string())
            .collect::<Vec<_>>()
            .join(",");
        let bands = record
            .ending_bands
            .iter()
            .map(|(_, band)| band.to_string())
            .collect::<Vec<_>>()
            .join(",");
        writeln!(
            out,
            "{},{},{},{stats},{bands},{},{}",
            record.strategy.label(),
            record.seed_code,
            record.seed_value,
            record.bonus_triggered,
            record.bonus_shown
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::GameplayStrategy;
    use mandate_game::{StatTable, StatVector};

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1337,
            seed_code: "MN-HARBOR37".to_string(),
            passed,
            iterations_run: 2,
            successful_iterations: if passed { 2 } else { 1 },
            failures: if passed {
                Vec::new()
            } else {
                vec!["Iteration 2: boom".to_string()]
            },
            average_duration: Duration::from_micros(250),
        }
    }

    fn sample_record() -> PlayabilityRecord {
        PlayabilityRecord {
            strategy: GameplayStrategy::Thrifty,
            seed_code: "MN-HARBOR37".to_string(),
            seed_value: 1337,
            final_stats: StatVector::from_parts(60, 45, 53),
            ending_bands: StatTable {
                approval: 0,
                efficiency: 1,
                environment: 0,
                finance: 0,
            },
            bonus_triggered: true,
            bonus_shown: false,
        }
    }

    fn render(write: impl FnOnce(&mut dyn Write) -> Result<()>) -> String {
        let mut buffer = Vec::new();
        write(&mut buffer).unwrap();
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn markdown_lists_failures() {
        let text = render(|out| generate_markdown_report(out, &[sample_result(false)]));
        assert!(text.starts_with("# Mandate Logic Test Results"));
        assert!(text.contains("- **Failed**: 1"));
        assert!(text.contains("  - Iteration 2: boom"));
    }

    #[test]
    fn csv_has_header_and_one_row_per_record() {
        let text = render(|out| generate_csv_report(out, &[sample_record()]));
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(lines[1], "Thrifty,MN-HARBOR37,1337,52,60,45,53,0,1,0,0,true,false");
        assert_eq!(
            lines[0].split(',').count(),
            lines[1].split(',').count()
        );
    }

    #[test]
    fn console_report_includes_distribution() {
        colored::control::set_override(false);
        let aggregates = crate::logic::playability::aggregate_playability(
            &[sample_record()],
            StatTable::uniform(3),
        );
        let text = render(|out| {
            generate_console_report(
                out,
                &[sample_result(true)],
                &aggregates,
                Duration::from_millis(3),
            )
        });
        assert!(text.contains("Success rate: 100.0%"));
        assert!(text.contains("Outcome Distribution"));
        assert!(text.contains("Thrifty"));
    }

    #[test]
    fn json_is_an_array_of_results() {
        let text = render(|out| generate_json_report(out, &[sample_result(true)]));
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value.as_array().map(Vec::len), Some(1));
    }
}
