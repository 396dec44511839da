//! OntoMend CLI - consistency-guided axiom repair from the command line

use anyhow::{Context, Result};
use clap::Parser;
use mend_core::{Mend, MendConfig};
use mend_council::ScriptedGenerator;
use mend_reason::{ConsistencyChecker, StructuralReasoner};
use mend_store::{parse_axiom, Axiom, OntologyVersion, Storage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ontomend")]
#[command(about = "OntoMend - consistency-guided ontology evolution and repair")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Run repair cycles over a script of candidate axioms
    Run {
        /// Configuration file path (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Seed ontology file, one axiom sentence per line
        #[arg(short, long)]
        ontology: PathBuf,
        /// Candidate sentences, one per line
        #[arg(long)]
        candidates: PathBuf,
        /// Number of cycles to run; defaults to the candidate count
        #[arg(long)]
        cycles: Option<usize>,
    },
    /// Parse an ontology file and check its consistency
    Check {
        /// Ontology file, one axiom sentence per line
        #[arg(short, long)]
        ontology: PathBuf,
    },
    /// Show the persisted active version and the audit tail
    Show {
        /// Configuration file path (JSON); defaults apply when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Number of audit entries to print, newest last
        #[arg(long, default_value_t = 10)]
        tail: usize,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Run {
            config,
            ontology,
            candidates,
            cycles,
        }) => run(config, &ontology, &candidates, cycles),
        Some(Commands::Check { ontology }) => check(&ontology),
        Some(Commands::Show { config, tail }) => show(config, tail),
        None => {
            println!("OntoMend v0.1.0 - Use --help for commands");
            Ok(())
        }
    }
}

fn run(
    config: Option<PathBuf>,
    ontology: &Path,
    candidates: &Path,
    cycles: Option<usize>,
) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let seed = load_axioms(ontology)?;
    let script = load_lines(candidates)?;
    let count = cycles.unwrap_or(script.len());

    let generator = ScriptedGenerator::new(script);
    let mend = Mend::unattended(config, seed, Box::new(generator))?;

    for cycle in mend.run_cycles(count) {
        println!(
            "cycle {} (v{} -> {}): {}",
            cycle.cycle_id,
            cycle.source_version,
            cycle
                .result_version()
                .map_or_else(|| "-".to_string(), |v| format!("v{v}")),
            cycle.outcome
        );
    }
    println!("active version: {}", mend.current().number());
    Ok(())
}

fn check(ontology: &Path) -> Result<()> {
    let axioms = load_axioms(ontology)?;
    let version = Arc::new(OntologyVersion::new(1, axioms));

    let checker = ConsistencyChecker::new(Box::new(StructuralReasoner::new()));
    let result = checker.check(&version, &[])?;

    if result.consistent {
        println!("consistent ({} axioms)", version.axioms().len());
    } else {
        println!("INCONSISTENT, justification:");
        for axiom in &result.justification {
            println!("  {}", axiom.form);
        }
        std::process::exit(1);
    }
    Ok(())
}

fn show(config: Option<PathBuf>, tail: usize) -> Result<()> {
    let config = load_config(config.as_deref())?;
    let storage = Storage::open(&config.store.db_path)
        .with_context(|| format!("opening database at {}", config.store.db_path.display()))?;

    match storage.latest_version()? {
        Some(version) => {
            println!("version {} ({} axioms):", version.number(), version.axioms().len());
            for axiom in version.axioms() {
                println!("  [{}] {}", axiom.provenance, axiom.form);
            }
        }
        None => println!("no persisted versions"),
    }

    let entries = storage.audit_entries()?;
    let skip = entries.len().saturating_sub(tail);
    println!("audit tail ({} of {} entries):", entries.len() - skip, entries.len());
    for entry in &entries[skip..] {
        println!(
            "  {} v{} -> {} {} ({}ms)",
            entry.cycle_id,
            entry.source_version,
            entry
                .result_version
                .map_or_else(|| "-".to_string(), |v| format!("v{v}")),
            entry.outcome,
            entry.duration_ms
        );
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<MendConfig> {
    match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            serde_json::from_str(&text)
                .with_context(|| format!("parsing config {}", path.display()))
        }
        None => Ok(MendConfig::default()),
    }
}

fn load_lines(path: &Path) -> Result<Vec<String>> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

fn load_axioms(path: &Path) -> Result<Vec<Axiom>> {
    load_lines(path)?
        .iter()
        .map(|line| {
            parse_axiom(line)
                .map(Axiom::existing)
                .with_context(|| format!("parsing axiom '{line}'"))
        })
        .collect()
}
