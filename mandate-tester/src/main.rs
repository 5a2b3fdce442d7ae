mod common;
mod logic;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use colored::Colorize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use common::scenario::{all_scenario_keys, get_scenario, list_scenarios};
use common::split_csv;
use logic::{
    GameTester, LogicTester, PlayabilityAggregate, PlayabilityRecord, ScenarioResult, SeedInfo,
    TesterAssets, aggregate_playability, resolve_seed_inputs, run_playability_analysis,
    validate_playability_targets,
};
use mandate_game::RunConfig;

#[derive(Debug, Parser)]
#[command(name = "mandate-tester", version = "0.1.0")]
#[command(about = "Automated playthroughs and property checks for the Mandate decision engine")]
struct Args {
    /// Scenarios to run (comma-separated, or `all`)
    #[arg(long, default_value = "smoke")]
    scenarios: String,

    /// List all available scenarios and exit
    #[arg(long)]
    list_scenarios: bool,

    /// Seeds to run (comma-separated integers or share codes, or `all`)
    #[arg(long, default_value = "1337")]
    seeds: String,

    /// Number of iterations per scenario and seed
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Output report format
    #[arg(long, default_value = "console")]
    #[arg(value_parser = ["json", "markdown", "console", "csv"])]
    report: String,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Directory holding `scenarios.json` and `endings.json` (bundled content otherwise)
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Decisions per run
    #[arg(long)]
    max_choices: Option<u32>,

    /// Play every strategy over the seeds and report the ending distribution
    #[arg(long)]
    distribution: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    if maybe_list_scenarios(&args)? {
        return Ok(());
    }

    if !quiet_stdout(&args) {
        announce_banner();
    }

    let start_time = Instant::now();
    let scenarios = expand_scenarios(&args.scenarios);
    let seed_infos = resolve_seed_inputs(&split_csv(&args.seeds))?;
    let game_tester = build_tester(&args)?;

    let all_results = run_logic_scenarios(&args, &scenarios, &seed_infos, &game_tester);

    let (playability_records, playability_aggregates) =
        gather_playability(&args, &game_tester, &seed_infos)?;

    write_reports(
        &args,
        &all_results,
        playability_records.as_deref(),
        playability_aggregates.as_deref(),
        start_time,
    )?;

    if let Some(aggregates) = playability_aggregates.as_ref() {
        let record_slice = playability_records.as_deref().unwrap_or(&[]);
        validate_playability_targets(aggregates, record_slice)?;
    }

    if all_results.iter().any(|r| !r.passed) {
        std::process::exit(1);
    }

    Ok(())
}

fn maybe_list_scenarios(args: &Args) -> Result<bool> {
    if !args.list_scenarios {
        return Ok(false);
    }
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available scenarios:")?;
    for (key, description) in list_scenarios() {
        writeln!(output_target.writer(), "  {key:25} - {description}")?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

/// Machine-readable reports on stdout must not be preceded by progress text.
fn quiet_stdout(args: &Args) -> bool {
    args.output.is_none() && args.report != "console"
}

fn announce_banner() {
    println!("{}", "🎮 Mandate Automated Tester".bright_cyan().bold());
    println!("{}", "================================".cyan());
    println!("Started {}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
}

fn expand_scenarios(scenarios_arg: &str) -> Vec<String> {
    let mut scenarios = split_csv(scenarios_arg);
    if scenarios.iter().any(|s| s.eq_ignore_ascii_case("all")) {
        scenarios.retain(|s| !s.eq_ignore_ascii_case("all"));
        for key in all_scenario_keys() {
            if !scenarios.contains(&key) {
                scenarios.push(key);
            }
        }
    }
    scenarios
}

fn build_tester(args: &Args) -> Result<GameTester> {
    let assets = match &args.content_dir {
        Some(dir) => TesterAssets::load_from_dir(dir)
            .with_context(|| format!("failed to load content from {}", dir.display()))?,
        None => TesterAssets::load_default().context("bundled content is invalid")?,
    };
    let mut config = RunConfig::default();
    if let Some(max_choices) = args.max_choices {
        config.max_choices = max_choices;
    }
    config.validate().context("invalid run configuration")?;
    log::info!(
        "content: {} ({} scenarios), {} decisions per run",
        assets.source(),
        assets.scenario_count(),
        config.max_choices
    );
    Ok(GameTester::new(Arc::new(assets), config, args.verbose))
}

fn run_logic_scenarios(
    args: &Args,
    scenarios: &[String],
    seeds: &[SeedInfo],
    game_tester: &GameTester,
) -> Vec<ScenarioResult> {
    let mut results: Vec<ScenarioResult> = Vec::new();
    if !quiet_stdout(args) {
        println!("{}", "🧠 Running Logic Tests".bright_yellow().bold());
        println!("{}", "-".repeat(30).yellow());
        println!(
            "Content: {} | {} decisions per run",
            game_tester.assets().source(),
            game_tester.config().max_choices
        );
    }

    let logic_tester = LogicTester::new(game_tester.clone(), args.verbose);

    for scenario_name in scenarios {
        if let Some(scenario) = get_scenario(scenario_name) {
            results.extend(logic_tester.run_scenario(&scenario, seeds, args.iterations));
        } else {
            eprintln!("⚠️  Unknown scenario: {}", scenario_name.yellow());
        }
    }

    results
}

type PlayabilitySummary = (
    Option<Vec<PlayabilityRecord>>,
    Option<Vec<PlayabilityAggregate>>,
);

fn gather_playability(
    args: &Args,
    game_tester: &GameTester,
    seed_infos: &[SeedInfo],
) -> Result<PlayabilitySummary> {
    let require_playability = args.distribution || args.report == "csv";
    if !require_playability {
        return Ok((None, None));
    }
    let records = run_playability_analysis(game_tester, seed_infos, args.iterations)?;
    let band_counts = game_tester.assets().content().endings.band_counts();
    let aggregates = aggregate_playability(&records, band_counts);
    Ok((Some(records), Some(aggregates)))
}

fn write_reports(
    args: &Args,
    results: &[ScenarioResult],
    playability_records: Option<&[PlayabilityRecord]>,
    playability_aggregates: Option<&[PlayabilityAggregate]>,
    start_time: Instant,
) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report.as_str() {
        "json" => {
            if results.is_empty() {
                writeln!(&mut output_target, "[]")?;
            } else {
                logic::reports::generate_json_report(&mut output_target, results)?;
            }
        }
        "markdown" => {
            if results.is_empty() {
                writeln!(
                    &mut output_target,
                    "# Mandate Logic Test Results\n\n_No scenarios executed._"
                )?;
            } else {
                logic::reports::generate_markdown_report(&mut output_target, results)?;
            }
        }
        "csv" => {
            logic::reports::generate_csv_report(
                &mut output_target,
                playability_records.unwrap_or(&[]),
            )?;
        }
        _ => {
            let duration = start_time.elapsed();
            if results.is_empty() {
                writeln!(&mut output_target, "No logic scenarios executed.")?;
            } else {
                logic::reports::generate_console_report(
                    &mut output_target,
                    results,
                    playability_aggregates.unwrap_or(&[]),
                    duration,
                )?;
            }
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {duration:?}")?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn base_args() -> Args {
        Args {
            scenarios: "smoke".to_string(),
            list_scenarios: false,
            seeds: "1337".to_string(),
            iterations: 1,
            report: "json".to_string(),
            output: None,
            content_dir: None,
            max_choices: None,
            distribution: false,
            verbose: false,
        }
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "mandate-main-{}-{name}",
            std::process::id()
        ))
    }

    fn sample_result(passed: bool) -> ScenarioResult {
        ScenarioResult {
            scenario_name: "smoke".to_string(),
            seed: 1337,
            seed_code: SeedInfo::from_numeric(1337).replay_token(),
            passed,
            iterations_run: 1,
            successful_iterations: usize::from(passed),
            failures: Vec::new(),
            average_duration: Duration::from_micros(10),
        }
    }

    #[test]
    fn expands_all_scenarios_keyword() {
        let scenarios = expand_scenarios("smoke,all");
        assert_eq!(scenarios[0], "smoke");
        assert_eq!(scenarios.len(), all_scenario_keys().len());
    }

    #[test]
    fn expand_scenarios_without_all_preserves_order() {
        assert_eq!(
            expand_scenarios("exhaustion, smoke"),
            vec!["exhaustion".to_string(), "smoke".to_string()]
        );
    }

    #[test]
    fn max_choices_override_is_validated() {
        let args = Args {
            max_choices: Some(0),
            ..base_args()
        };
        assert!(build_tester(&args).is_err());
        let args = Args {
            max_choices: Some(3),
            ..base_args()
        };
        assert_eq!(build_tester(&args).unwrap().config().max_choices, 3);
    }

    #[test]
    fn gather_playability_returns_none_when_disabled() {
        let args = base_args();
        let tester = build_tester(&args).unwrap();
        let (records, aggregates) =
            gather_playability(&args, &tester, &[SeedInfo::from_numeric(1)]).unwrap();
        assert!(records.is_none());
        assert!(aggregates.is_none());
    }

    #[test]
    fn write_reports_emits_json_output() {
        let path = temp_path("report.json");
        let args = Args {
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[sample_result(true)], None, None, Instant::now()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value[0]["scenario_name"], "smoke");
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn write_reports_markdown_empty_results() {
        let path = temp_path("empty.md");
        let args = Args {
            report: "markdown".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        write_reports(&args, &[], None, None, Instant::now()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("_No scenarios executed._"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn write_reports_emits_csv_report() {
        let path = temp_path("distribution.csv");
        let args = Args {
            report: "csv".to_string(),
            output: Some(path.clone()),
            ..base_args()
        };
        let tester = build_tester(&args).unwrap();
        let (records, _) =
            gather_playability(&args, &tester, &[SeedInfo::from_numeric(9)]).unwrap();
        let records = records.unwrap();
        write_reports(&args, &[], Some(&records), None, Instant::now()).unwrap();
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), records.len() + 1);
        assert!(contents.starts_with("strategy,seed_code"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn maybe_list_scenarios_writes_output() {
        let path = temp_path("list.txt");
        let args = Args {
            list_scenarios: true,
            output: Some(path.clone()),
            ..base_args()
        };
        assert!(maybe_list_scenarios(&args).unwrap());
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Available scenarios:"));
        assert!(contents.contains("bonus-one-shot"));
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn maybe_list_scenarios_returns_false_when_disabled() {
        assert!(!maybe_list_scenarios(&base_args()).unwrap());
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        writeln!(target, "ok").unwrap();
        target.flush_inner().unwrap();
    }
}
