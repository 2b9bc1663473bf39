use std::collections::HashMap;
use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use leanmutator::config::Config;
use leanmutator::mutants::Mutation;
use leanmutator::operators;
use leanmutator::output;
use leanmutator::parser;
use leanmutator::patterns;
use leanmutator::runner::{self, BaselineResult, RunnerConfig};
use leanmutator::scheduler::{self, ScheduleConfig};
use leanmutator::traverse;

#[derive(Parser)]
#[command(name = "leanmutator", version, about = "Mutation testing for Lean 4 projects")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run mutation testing over files or directories
    Mutate(MutateArgs),
    /// Print the registered mutation operators
    ListOperators,
    /// Write a default leanmutator.toml into the current directory
    Init,
}

#[derive(Args)]
struct MutateArgs {
    /// Lean files or directories (directories are scanned recursively)
    paths: Vec<PathBuf>,
    /// Comma-separated operator names (default: all)
    #[arg(short, long, value_delimiter = ',')]
    operators: Vec<String>,
    /// Substring patterns excluding files by full path
    #[arg(short = 'x', long, value_delimiter = ',')]
    exclude: Vec<String>,
    /// Per-mutation timeout in milliseconds
    #[arg(short, long)]
    timeout: Option<u64>,
    /// Worker count (0 = number of CPUs)
    #[arg(short, long)]
    workers: Option<usize>,
    /// Report format: console, json or html
    #[arg(long)]
    output: Option<String>,
    /// Write the report to this file
    #[arg(long)]
    report: Option<PathBuf>,
    /// Judge mutants with the parser only instead of building
    #[arg(long)]
    isolated: bool,
    /// Build command judging each mutant (default: lake build)
    #[arg(long)]
    build_cmd: Option<String>,
    /// Disable the raw source-pattern pass
    #[arg(long)]
    no_patterns: bool,
    /// Minimum score for exit code 0
    #[arg(long)]
    threshold: Option<f64>,
    /// Keep scratch files and backups for debugging
    #[arg(long)]
    keep_temp_files: bool,
    /// Show per-survivor diffs in the console report
    #[arg(short, long)]
    verbose: bool,
    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match cli.command {
        Commands::Mutate(args) => cmd_mutate(args),
        Commands::ListOperators => cmd_list_operators(),
        Commands::Init => cmd_init(),
    };
    process::exit(exit_code);
}

fn cmd_mutate(args: MutateArgs) -> i32 {
    if args.no_color || std::env::var_os("NO_COLOR").is_some() {
        console::set_colors_enabled(false);
        console::set_colors_enabled_stderr(false);
    }

    let mut cfg = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            output::print_error(&format!("failed to load config: {e}"));
            return 1;
        }
    };
    // CLI overrides file values, file values override defaults.
    if !args.operators.is_empty() {
        cfg.operators = args.operators;
    }
    if !args.exclude.is_empty() {
        cfg.exclude = args.exclude;
    }
    if let Some(timeout) = args.timeout {
        cfg.timeout = timeout;
    }
    if let Some(workers) = args.workers {
        cfg.parallel = workers;
    }
    if let Some(format) = args.output {
        cfg.output = format;
    }
    if let Some(report) = &args.report {
        cfg.report = Some(report.display().to_string());
    }
    if let Some(threshold) = args.threshold {
        cfg.threshold = threshold;
    }
    if let Some(build_cmd) = args.build_cmd {
        cfg.test_command = Some(build_cmd);
    }

    if !matches!(cfg.output.as_str(), "console" | "json" | "html") {
        output::print_error(&format!(
            "unknown output format '{}': expected console, json or html",
            cfg.output
        ));
        return 1;
    }

    let registry = operators::default_registry();
    for name in &cfg.operators {
        if registry.get(name).is_none() {
            output::print_error(&format!(
                "unknown operator '{name}'; see `leanmutator list-operators`"
            ));
            return 1;
        }
    }

    let paths: Vec<PathBuf> = if args.paths.is_empty() {
        cfg.sources
            .clone()
            .unwrap_or_default()
            .into_iter()
            .map(PathBuf::from)
            .collect()
    } else {
        args.paths
    };
    if paths.is_empty() {
        output::print_error("no paths given; pass files or directories, or set `sources` in the config");
        return 1;
    }

    let files = match leanmutator::collect_sources(&paths, &cfg.exclude) {
        Ok(files) => files,
        Err(e) => {
            output::print_error(&e.to_string());
            return 1;
        }
    };
    if files.is_empty() {
        output::print_success("No Lean sources found; nothing to do.");
        return 0;
    }

    // A crashed earlier run may have left a mutated file plus its backup.
    for file in &files {
        match runner::restore_stale_backup(file) {
            Ok(true) => output::print_warning(&format!(
                "restored {} from a stale backup left by an interrupted run",
                file.display()
            )),
            Ok(false) => {}
            Err(e) => {
                output::print_error(&format!(
                    "cannot restore {} from its stale backup: {e}",
                    file.display()
                ));
                return 1;
            }
        }
    }

    let selected = registry.get_by_names(&cfg.operators);
    let mut mutations: Vec<Mutation> = Vec::new();
    let mut sources: HashMap<PathBuf, String> = HashMap::new();
    for file in &files {
        let source = match std::fs::read_to_string(file) {
            Ok(s) => s,
            Err(e) => {
                output::print_error(&format!("failed to read {}: {e}", file.display()));
                return 1;
            }
        };
        let parsed = match parser::parse(&source) {
            Ok(parsed) if parsed.is_complete() => parsed,
            Ok(parsed) => {
                for e in &parsed.errors {
                    output::print_warning(&format!("skipping {}: {e}", file.display()));
                }
                continue;
            }
            Err(e) => {
                output::print_warning(&format!("skipping {}: {e}", file.display()));
                continue;
            }
        };

        let mut file_mutations = traverse::discover(&parsed.root, &source, file, &selected);
        if !args.no_patterns {
            let pattern_mutations = patterns::scan(&source, file, &cfg.operators);
            file_mutations.extend(patterns::dedup_against(&file_mutations, pattern_mutations));
        }
        mutations.extend(file_mutations);
        sources.insert(file.clone(), source);
    }
    traverse::renumber(&mut mutations);

    if mutations.is_empty() {
        output::print_success("No mutable code found.");
        return 0;
    }

    let runner_config = RunnerConfig {
        build_cmd: cfg
            .test_command
            .clone()
            .unwrap_or_else(|| "lake build".to_string()),
        project_dir: None,
        timeout_ms: cfg.timeout,
        isolated: args.isolated,
        keep_temp_files: args.keep_temp_files,
    };

    // The baseline build catches projects whose tests already fail; mutant
    // classifications would be meaningless noise against that.
    if !args.isolated {
        match runner::run_baseline(&runner_config, &files[0]) {
            BaselineResult::Ok { duration_ms } => {
                if args.verbose {
                    eprintln!("  baseline build passed in {duration_ms}ms");
                }
            }
            BaselineResult::Failed(msg) => {
                output::print_error(&format!(
                    "the project fails to build before any mutation; fix that first\n{msg}"
                ));
                return 1;
            }
        }
    }

    let num_workers = if cfg.parallel == 0 {
        num_cpus::get()
    } else {
        cfg.parallel
    };
    let schedule_config = ScheduleConfig {
        num_workers,
        runner: runner_config,
    };

    let progress = |done: usize, total: usize, result: &leanmutator::mutants::MutationResult| {
        output::print_progress(done, total, result);
    };
    let outcome = scheduler::schedule(mutations, &sources, &schedule_config, Some(&progress));

    if outcome.aborted {
        output::print_error(
            "a mutated source could not be restored; run aborted after best-effort restoration",
        );
    }

    match cfg.output.as_str() {
        "json" => {
            let json = output::render_json(&outcome.stats, &outcome.results);
            match &cfg.report {
                Some(path) => {
                    if let Err(e) = std::fs::write(path, &json) {
                        output::print_error(&format!("failed to write {path}: {e}"));
                        return 1;
                    }
                    output::print_success(&format!("report written to {path}"));
                }
                None => println!("{json}"),
            }
        }
        "html" => {
            let html = output::render_html(&outcome.stats, &outcome.results);
            let path = cfg
                .report
                .clone()
                .unwrap_or_else(|| "leanmutator-report.html".to_string());
            if let Err(e) = std::fs::write(&path, &html) {
                output::print_error(&format!("failed to write {path}: {e}"));
                return 1;
            }
            output::print_success(&format!("report written to {path}"));
        }
        _ => {
            output::print_console_report(&outcome.stats, &outcome.results, &sources, args.verbose);
        }
    }

    if outcome.aborted {
        return 1;
    }
    if outcome.stats.score() >= cfg.threshold {
        0
    } else {
        1
    }
}

fn cmd_list_operators() -> i32 {
    let registry = operators::default_registry();
    for op in registry.all() {
        println!("{:<24} {}", op.name(), op.description());
    }
    0
}

fn cmd_init() -> i32 {
    let path = Config::default_path();
    match Config::write_default(&path) {
        Ok(()) => {
            output::print_success(&format!("wrote {}", path.display()));
            0
        }
        Err(e) => {
            output::print_error(&e.to_string());
            1
        }
    }
}
