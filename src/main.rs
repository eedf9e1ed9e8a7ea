//! registry-reconcile CLI
//!
//! Usage:
//!   registry-reconcile match --local <file> --remote <file> [--previous <file>]
//!   registry-reconcile duplicates --local <file>
//!
//! Inputs are parquet or JSON, chosen by file extension.

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::info;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use registry_reconcile::algorithm::matching::{assign_rows, identity_batches, name_mismatches};
use registry_reconcile::io::{self, DuplicateTables, TableFormat};
use registry_reconcile::{
    FieldProfile, MatchStage, Matcher, Normalizer, ReconcileConfig, find_and_resolve,
};

#[derive(Parser)]
#[command(name = "registry-reconcile")]
#[command(about = "Reconcile participant identities between a local and a remote registry")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map every remote record to a local identity
    Match {
        #[command(flatten)]
        common: CommonArgs,

        /// Remote registry snapshot
        #[arg(long)]
        remote: PathBuf,

        /// Mapping written by an earlier run
        #[arg(long)]
        previous: Option<PathBuf>,
    },

    /// Find and resolve duplicate identities in the local registry
    Duplicates {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args)]
struct CommonArgs {
    /// Local registry snapshot
    #[arg(long)]
    local: PathBuf,

    /// Column naming used by the input files
    #[arg(long, default_value = "canonical")]
    profile: ProfileArg,

    /// JSON file overriding configuration defaults
    #[arg(long)]
    config: Option<PathBuf>,

    /// Prefix of every output file
    #[arg(long, default_value = "reconcile")]
    output_prefix: PathBuf,

    /// Output file format
    #[arg(long, default_value = "parquet")]
    format: FormatArg,
}

#[derive(Clone, Copy, ValueEnum)]
enum ProfileArg {
    /// Canonical field names
    Canonical,
    /// REDCap export column names
    Redcap,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Parquet,
    Json,
}

impl From<FormatArg> for TableFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Parquet => Self::Parquet,
            FormatArg::Json => Self::Json,
        }
    }
}

impl CommonArgs {
    fn load_config(&self) -> anyhow::Result<ReconcileConfig> {
        let Some(path) = &self.config else {
            return Ok(ReconcileConfig::default());
        };
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    fn normalizer(&self, config: ReconcileConfig) -> Normalizer {
        match self.profile {
            ProfileArg::Canonical => Normalizer::new(config),
            ProfileArg::Redcap => Normalizer::new(config)
                .with_local_profile(FieldProfile::redcap_local())
                .with_remote_profile(FieldProfile::redcap_remote()),
        }
    }
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let start = Instant::now();

    match cli.command {
        Commands::Match {
            common,
            remote,
            previous,
        } => run_match(&common, &remote, previous.as_deref())?,
        Commands::Duplicates { common } => run_duplicates(&common)?,
    }

    info!("Finished in {:?}", start.elapsed());
    Ok(())
}

fn run_match(common: &CommonArgs, remote: &Path, previous: Option<&Path>) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let normalizer = common.normalizer(config.clone());

    let local_rows = io::read_rows(&common.local)?;
    let remote_rows = io::read_rows(remote)?;
    let locals = normalizer.normalize_local(&local_rows)?;
    let remotes = normalizer.normalize_remote(&remote_rows)?;
    let previous = previous
        .map(|path| io::load_previous_mapping(path, &config.missing_sentinel))
        .transpose()?;

    let outcome =
        Matcher::new(config.clone()).perform_matching(&locals, &remotes, previous.as_ref())?;
    for stage in [
        MatchStage::CarryForward,
        MatchStage::LabId,
        MatchStage::Subject,
        MatchStage::Dependent,
        MatchStage::Allocated,
    ] {
        info!("{stage}: {} remote records", outcome.count_by_stage(stage));
    }

    let mismatches = name_mismatches(&outcome.mapping, &locals, &remotes);
    if !mismatches.is_empty() {
        info!("{} mapped pairs disagree on the subject first name", mismatches.len());
    }

    let assigned = assign_rows(
        &outcome.mapping,
        &remote_rows,
        normalizer.remote_profile(),
        &config,
    );
    let batches = identity_batches(&assigned, config.batch_size);
    info!(
        "{} remote rows planned in {} push batches of up to {} identities",
        assigned.len(),
        batches.len(),
        config.batch_size
    );

    let format = common.format.into();
    let mut written =
        io::write_match_outputs(&common.output_prefix, format, &outcome, &mismatches)?;
    written.push(io::write_push_batches(&common.output_prefix, format, &batches)?);
    for path in written {
        info!("Wrote {}", path.display());
    }
    Ok(())
}

fn run_duplicates(common: &CommonArgs) -> anyhow::Result<()> {
    let config = common.load_config()?;
    let normalizer = common.normalizer(config.clone());

    let local_rows = io::read_rows(&common.local)?;
    let locals = normalizer.normalize_local(&local_rows)?;

    let report = find_and_resolve(&locals, &config)?;
    info!(
        "{} duplicate clusters, {} need review",
        report.resolutions.len(),
        report.review_count()
    );

    let tables = DuplicateTables::from_report(&report, &locals);
    let written = io::write_duplicate_outputs(&common.output_prefix, common.format.into(), &tables)?;
    for path in written {
        info!("Wrote {}", path.display());
    }
    Ok(())
}
