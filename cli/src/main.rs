use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use drivernet_core::{
    AlgorithmKind, AnalysisRequest, CancellationToken, Heuristic, HeuristicPlan, LogSink,
    RunSettings, RunStatus,
};
use log::{info, LevelFilter};

#[derive(Parser)]
#[command(name = "drivernet")]
#[command(about = "Minimum driver sets for target control of directed networks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an analysis request
    Run {
        /// Request file (JSON)
        request: PathBuf,

        /// Override the algorithm named in the request
        #[arg(long, value_enum)]
        algorithm: Option<CliAlgorithm>,

        /// Override the random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Parameter override, e.g. `--param maximumPathLength=4`
        #[arg(long = "param", value_name = "NAME=VALUE")]
        params: Vec<String>,

        /// Write the report here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Seconds between progress snapshots
        #[arg(long, default_value_t = 30)]
        progress_interval: u64,
    },
    /// List the heuristic letters of the greedy search
    Heuristics,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum CliAlgorithm {
    Greedy,
    Genetic,
}

impl From<CliAlgorithm> for AlgorithmKind {
    fn from(algorithm: CliAlgorithm) -> Self {
        match algorithm {
            CliAlgorithm::Greedy => AlgorithmKind::Greedy,
            CliAlgorithm::Genetic => AlgorithmKind::Genetic,
        }
    }
}

fn parse_override(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        bail!("missing parameter name in '{}'", raw);
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn handle_run(
    path: &Path,
    algorithm: Option<CliAlgorithm>,
    seed: Option<u64>,
    params: &[String],
    output: Option<&Path>,
    progress_interval: u64,
) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read request {}", path.display()))?;
    let mut request = AnalysisRequest::from_json(&text)
        .with_context(|| format!("failed to parse request {}", path.display()))?;

    if let Some(algorithm) = algorithm {
        request.algorithm = algorithm.into();
    }
    let mut overrides = params
        .iter()
        .map(|raw| parse_override(raw))
        .collect::<Result<Vec<_>>>()?;
    if let Some(seed) = seed {
        overrides.push(("randomSeed".to_string(), seed.to_string()));
    }
    if !overrides.is_empty() {
        request
            .apply_overrides(&overrides)
            .context("invalid parameter override")?;
    }

    info!(
        "running {} analysis {}",
        request.algorithm,
        request.name.as_deref().unwrap_or("(unnamed)")
    );
    let settings = RunSettings {
        progress_interval: Duration::from_secs(progress_interval),
    };
    let report = request.run(settings, &mut LogSink, &CancellationToken::new());

    let json = serde_json::to_string_pretty(&report).context("failed to serialize report")?;
    match output {
        Some(output) => fs::write(output, json)
            .with_context(|| format!("failed to write report {}", output.display()))?,
        None => println!("{}", json),
    }

    if report.status == RunStatus::Error {
        bail!(
            "analysis failed: {}",
            report.error.unwrap_or_else(|| "unknown error".to_string())
        );
    }
    Ok(())
}

fn handle_heuristics() {
    println!("Default plan: {}", HeuristicPlan::new(&HeuristicPlan::default_sets()));
    for heuristic in Heuristic::ALL {
        println!("  {}  {}", heuristic, heuristic.description());
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Run {
            request,
            algorithm,
            seed,
            params,
            output,
            progress_interval,
        } => {
            handle_run(&request, algorithm, seed, &params, output.as_deref(), progress_interval)?;
        }
        Commands::Heuristics => handle_heuristics(),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_override() {
        assert_eq!(
            parse_override("maximumPathLength=4").unwrap(),
            ("maximumPathLength".to_string(), "4".to_string())
        );
        assert_eq!(
            parse_override(" heuristics = A;B,C ").unwrap(),
            ("heuristics".to_string(), "A;B,C".to_string())
        );
        assert!(parse_override("repeats").is_err());
        assert!(parse_override("=3").is_err());
    }

    #[test]
    fn test_cli_arguments() {
        let cli = Cli::try_parse_from([
            "drivernet",
            "run",
            "request.json",
            "--algorithm",
            "genetic",
            "--seed",
            "7",
            "--param",
            "populationSize=20",
            "--param",
            "mutationType=Dominant",
            "-vv",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        match cli.command {
            Commands::Run {
                request,
                algorithm,
                seed,
                params,
                output,
                progress_interval,
            } => {
                assert_eq!(request, PathBuf::from("request.json"));
                assert!(algorithm == Some(CliAlgorithm::Genetic));
                assert_eq!(seed, Some(7));
                assert_eq!(params.len(), 2);
                assert!(output.is_none());
                assert_eq!(progress_interval, 30);
            }
            Commands::Heuristics => panic!("expected the run command"),
        }
    }

    #[test]
    fn test_run_writes_report() {
        let dir = std::env::temp_dir().join(format!("drivernet-cli-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let request = dir.join("request.json");
        let report = dir.join("report.json");
        fs::write(
            &request,
            r#"{
                "algorithm": "greedy",
                "network": {
                    "nodes": ["1", "2", "3", "4"],
                    "edges": [
                        {"source": "1", "target": "2"},
                        {"source": "2", "target": "3"},
                        {"source": "3", "target": "4"}
                    ],
                    "targets": ["4"]
                }
            }"#,
        )
        .unwrap();

        handle_run(
            &request,
            None,
            Some(5),
            &["maximumPathLength=1".to_string()],
            Some(&report),
            30,
        )
        .unwrap();

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&report).unwrap()).unwrap();
        assert_eq!(written["status"], "Completed");
        assert_eq!(written["solutions"][0]["drivers"][0], "3");
        fs::remove_dir_all(&dir).unwrap();
    }
}
