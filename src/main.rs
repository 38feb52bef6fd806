use std::process::ExitCode;

use clap::Parser;

use diagnoser::diagnosability;

/// Decides whether a discrete-event plant is diagnosable under its declared
/// observable/unobservable/fault event partition.
#[derive(Debug, Parser)]
#[command(name = "diagnoser", version, about)]
struct Cli {
    /// Path to the plant automaton description.
    file: String,

    /// Print the observer's macro-state table and transition graph before
    /// the cycle reports.
    #[arg(long)]
    show_cycle_graphs: bool,

    /// Print only the final verdict line, skipping every cycle's refinement
    /// trace.
    #[arg(long)]
    report_only_verdict: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .init();

    let cli = Cli::parse();

    let collect_all = !cli.report_only_verdict;
    match diagnosability::diagnosability(&cli.file, collect_all) {
        Ok(report) => {
            if cli.report_only_verdict {
                diagnoser::report::print_verdict(report.diagnosable, !report.cycles.is_empty());
            } else {
                diagnosability::print_report(&report, cli.show_cycle_graphs);
            }
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}
