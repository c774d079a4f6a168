use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use std::io::Write as _;
use std::path::PathBuf;
use std::process;

use conflux::{
    compare_directories, fallback_merge, merge, run_iterative_merge, BatchConfiguration,
    CompletionResult, Choice, Filesystem, OsFilesystem, ResolutionType,
};

#[derive(Parser)]
#[command(name = "flux", version, about = "Reconciles diverging copies of the same file across a tree")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Number of threads to use for hashing (default: CPU count)
    #[arg(short = 'j', long, global = true, value_name = "THREADS")]
    threads: Option<usize>,

    /// Quiet mode (no progress output)
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Find every copy of a basename under the given roots and merge them
    /// down to one version, written back to every original location.
    Merge {
        /// Directories to search
        roots: Vec<PathBuf>,

        /// Basename or glob pattern to reconcile (e.g. "app.config")
        #[arg(short, long)]
        pattern: String,

        /// Exclude subdirectories matching these patterns
        #[arg(short, long, value_name = "PATTERN")]
        exclude: Vec<String>,

        /// Resolve every conflicting block non-interactively with
        /// git-style conflict markers instead of prompting
        #[arg(short, long)]
        non_interactive: bool,

        /// Skip the continue-to-next-operation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Compare same-named files across two directory trees.
    Compare {
        root_a: PathBuf,
        root_b: PathBuf,

        #[arg(short, long, default_value = "*")]
        pattern: String,

        #[arg(short, long)]
        recursive: bool,
    },
    /// Run a saved batch configuration end to end.
    Batch {
        /// Path to a BatchConfiguration JSON file. Defaults to
        /// `default.json` under the platform config directory.
        config: Option<PathBuf>,

        #[arg(short, long)]
        yes: bool,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run() {
        eprintln!("{} {e:#}", "Error:".red());
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    if let Some(t) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(t)
            .build_global()
            .map_err(|e| anyhow::anyhow!("failed to configure thread pool: {e}"))?;
    }

    let fs = OsFilesystem;

    match cli.command {
        Command::Merge { roots, pattern, exclude, non_interactive, yes } => {
            run_merge(&fs, &roots, &pattern, &exclude, non_interactive, yes, cli.quiet, cli.threads)
        },
        Command::Compare { root_a, root_b, pattern, recursive } => {
            run_compare(&fs, &root_a, &root_b, &pattern, recursive)
        },
        Command::Batch { config, yes } => {
            let config_path = match config {
                Some(path) => path,
                None => conflux::batch::default_config_dir()
                    .map(|dir| dir.join("default.json"))
                    .context("could not determine the platform config directory; pass a path explicitly")?,
            };
            run_batch(&fs, &config_path, yes, cli.quiet, cli.threads)
        },
    }
}

fn run_merge(
    fs: &dyn Filesystem,
    roots: &[PathBuf],
    pattern: &str,
    exclude: &[String],
    non_interactive: bool,
    yes: bool,
    quiet: bool,
    threads: Option<usize>,
) -> Result<()> {
    for root in roots {
        if !fs.exists(root) {
            anyhow::bail!("directory does not exist: {}", root.display());
        }
    }

    let paths = conflux::walker::find(fs, roots, pattern, exclude, None);
    if paths.is_empty() {
        if !quiet {
            println!("No files matched {pattern}");
        }
        return Ok(());
    }

    let groups = conflux::group(fs, &paths, threads);
    let basename =
        groups.first().and_then(|g| g.basename()).map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();

    if !quiet {
        println!("{} {} version(s) of {basename}", "Found".bold(), groups.len());
    }

    let (result, log) = run_iterative_merge(
        fs,
        &groups,
        |a, b, sim| {
            if !quiet {
                println!(
                    "{} {} <-> {} (similarity {:.0}%)",
                    "Merging".cyan(),
                    a.paths[0].display(),
                    b.paths[0].display(),
                    sim * 100.0
                );
            }
        },
        |lines_a, lines_b| {
            if non_interactive {
                Some(fallback_merge(lines_a, lines_b))
            } else {
                Some(merge(lines_a, lines_b, |block, _ctx, index| {
                    prompt_choice(index, block.delete_count_a, block.insert_count_b)
                }))
            }
        },
        |_op, remaining| yes || remaining <= 1 || confirm(&format!("{remaining} versions remain, continue?")),
    );

    for record in &log {
        if !quiet {
            println!(
                "  op {}: {} files, {} conflicts, {} lines",
                record.operation_number, record.files_affected, record.conflicts, record.merged_line_count
            );
        }
    }

    match result {
        CompletionResult::Success { final_file_name } => {
            println!("{} {final_file_name} reconciled to a single version", "Done.".green().bold());
            Ok(())
        },
        CompletionResult::NoMergingNeeded => {
            println!("{}", "Already in sync.".green());
            Ok(())
        },
        CompletionResult::Cancelled => {
            println!("{}", "Cancelled.".yellow());
            Ok(())
        },
        CompletionResult::Incomplete => {
            println!("{}", "Stopped early; already-merged files were kept.".yellow());
            Ok(())
        },
        CompletionResult::AccessDenied { message } => anyhow::bail!("access denied: {message}"),
        CompletionResult::Error { kind, message, .. } => anyhow::bail!("{kind}: {message}"),
    }
}

fn prompt_choice(index: usize, a_count: usize, b_count: usize) -> Choice {
    print!(
        "Block {} ({a_count} line(s) vs {b_count} line(s)) — [a]=keep A, [b]=keep B, [o]=keep both, [s]=skip: ",
        index + 1
    );
    let _ = std::io::stdout().flush();
    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).is_err() {
        return Choice::Skip;
    }
    match input.trim().to_lowercase().as_str() {
        "a" => Choice::UseA,
        "b" => Choice::UseB,
        "o" => Choice::UseBoth,
        _ => Choice::Skip,
    }
}

fn confirm(prompt: &str) -> bool {
    print!("{prompt} [y/N] ");
    let _ = std::io::stdout().flush();
    let mut input = String::new();
    if std::io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    input.trim().eq_ignore_ascii_case("y")
}

fn run_compare(fs: &dyn Filesystem, root_a: &PathBuf, root_b: &PathBuf, pattern: &str, recursive: bool) -> Result<()> {
    if !fs.exists(root_a) {
        anyhow::bail!("directory does not exist: {}", root_a.display());
    }
    if !fs.exists(root_b) {
        anyhow::bail!("directory does not exist: {}", root_b.display());
    }

    let result = compare_directories(fs, root_a, root_b, pattern, recursive);
    println!("{} {}", result.same.len().to_string().green(), "identical");
    println!("{} {}", result.modified.len().to_string().yellow(), "modified");
    println!("{} {}", result.only_in_a.len().to_string().cyan(), format!("only in {}", root_a.display()));
    println!("{} {}", result.only_in_b.len().to_string().cyan(), format!("only in {}", root_b.display()));
    Ok(())
}

fn run_batch(fs: &dyn Filesystem, config_path: &PathBuf, yes: bool, quiet: bool, threads: Option<usize>) -> Result<()> {
    let config = BatchConfiguration::load(fs, config_path)
        .with_context(|| format!("loading batch configuration from {}", config_path.display()))?;

    let items = conflux::batch::process_batch(fs, &config, threads);
    for item in &items {
        match item.resolution_type {
            ResolutionType::Empty => {
                if !quiet {
                    println!("{} {}", "no matches:".dimmed(), item.basename);
                }
            },
            ResolutionType::SingleFile => {
                if !quiet {
                    println!("{} {}", "single:".dimmed(), item.basename);
                }
            },
            ResolutionType::Identical => {
                if !quiet {
                    println!("{} {}", "identical:".green(), item.basename);
                }
            },
            ResolutionType::Merge => {
                if !quiet {
                    println!("{} {}", "needs merge:".yellow(), item.basename);
                }
                run_iterative_merge(
                    fs,
                    &item.groups,
                    |_, _, _| {},
                    |lines_a, lines_b| Some(fallback_merge(lines_a, lines_b)),
                    |_, remaining| yes || remaining <= 1,
                );
            },
        }
    }
    Ok(())
}
