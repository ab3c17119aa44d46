use clap::{Args, Parser, Subcommand};

use canonry_substrate::HEAD_REF;
use canonry_types::{ArtifactType, ParentRef};

#[derive(Parser)]
#[command(
    name = "canonry",
    about = "Canonry — lifecycle-enforcing store for structured context artifacts",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Path to the project repository
    #[arg(long, global = true, default_value = ".")]
    pub project: String,
}

#[derive(Subcommand)]
pub enum Command {
    /// Initialize a project with its canonical root
    Init(InitArgs),
    /// Create or archive branch artifacts
    Branch(BranchArgs),
    /// Create summary artifacts
    Summary(SummaryArgs),
    /// Merge summaries into the canon
    Canon(CanonArgs),
    /// Read-only views reconstructed from the substrate
    Observe(ObserveArgs),
}

#[derive(Args)]
pub struct InitArgs {
    /// Title of the root artifact
    #[arg(long)]
    pub title: String,
}

#[derive(Args)]
pub struct BranchArgs {
    #[command(subcommand)]
    pub action: BranchAction,
}

#[derive(Subcommand)]
pub enum BranchAction {
    /// Create a new active branch
    New(BranchNewArgs),
    /// Archive an active branch
    Archive(BranchArchiveArgs),
}

#[derive(Args)]
pub struct BranchNewArgs {
    /// Title of the new branch
    #[arg(long)]
    pub title: String,
    /// Parent to branch from: `root` or `type:id`
    #[arg(long, default_value = "root")]
    pub from: ParentRef,
}

#[derive(Args)]
pub struct BranchArchiveArgs {
    /// Id of the branch to archive
    #[arg(long)]
    pub branch: String,
}

#[derive(Args)]
pub struct SummaryArgs {
    #[command(subcommand)]
    pub action: SummaryAction,
}

#[derive(Subcommand)]
pub enum SummaryAction {
    /// Create a new active summary under a branch
    New(SummaryNewArgs),
}

#[derive(Args)]
pub struct SummaryNewArgs {
    /// Title of the new summary
    #[arg(long)]
    pub title: String,
    /// Id of the source branch
    #[arg(long)]
    pub branch: String,
}

#[derive(Args)]
pub struct CanonArgs {
    #[command(subcommand)]
    pub action: CanonAction,
}

#[derive(Subcommand)]
pub enum CanonAction {
    /// Merge an active summary into the root's canon
    Merge(CanonMergeArgs),
}

#[derive(Args)]
pub struct CanonMergeArgs {
    /// Id of the summary to merge
    #[arg(long)]
    pub summary: String,
}

#[derive(Args)]
pub struct ObserveArgs {
    #[command(subcommand)]
    pub action: ObserveAction,
}

#[derive(Subcommand)]
pub enum ObserveAction {
    /// List artifacts visible at a ref
    List(ObserveListArgs),
    /// Resolve a single artifact by id
    Get(ObserveGetArgs),
    /// List artifacts whose parent matches a reference
    Children(ObserveChildrenArgs),
}

#[derive(Args)]
pub struct ObserveListArgs {
    /// Restrict to one artifact type
    #[arg(long = "type")]
    pub kind: Option<ArtifactType>,
    /// Only artifacts that are part of the canon
    #[arg(long, conflicts_with = "non_canonical")]
    pub canonical: bool,
    /// Only artifacts outside the canon
    #[arg(long)]
    pub non_canonical: bool,
    /// Substrate ref to observe
    #[arg(long = "ref", default_value = HEAD_REF)]
    pub ref_name: String,
}

#[derive(Args)]
pub struct ObserveGetArgs {
    /// Artifact id to resolve
    #[arg(long)]
    pub id: String,
    /// Disambiguating type hint
    #[arg(long = "type")]
    pub kind: Option<ArtifactType>,
    /// Disambiguate toward the canonical copy
    #[arg(long, conflicts_with = "non_canonical")]
    pub canonical: bool,
    /// Disambiguate away from the canonical copy
    #[arg(long)]
    pub non_canonical: bool,
    /// Substrate ref to observe
    #[arg(long = "ref", default_value = HEAD_REF)]
    pub ref_name: String,
    /// Omit the content blob from the payload
    #[arg(long)]
    pub meta_only: bool,
}

#[derive(Args)]
pub struct ObserveChildrenArgs {
    /// Parent reference: `root` or `type:id`
    #[arg(long)]
    pub parent: ParentRef,
    /// Substrate ref to observe
    #[arg(long = "ref", default_value = HEAD_REF)]
    pub ref_name: String,
}
