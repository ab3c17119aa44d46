use anyhow::Result;
use colored::Colorize;

use canonry_observe::{IndexPayload, ObservationPayload, ObserveError, Observer};
use canonry_store::{LifecycleStore, StoreError};
use canonry_substrate::{GitSubstrate, SubstrateError};

use crate::cli::*;

/// Exit codes: 2 for usage errors (clap exits with 2 on its own), 1 for
/// domain errors, 3 for substrate failures.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<SubstrateError>().is_some() {
        return 3;
    }
    if let Some(store) = err.downcast_ref::<StoreError>() {
        return match store {
            StoreError::Substrate(_) => 3,
            _ => 1,
        };
    }
    if let Some(observe) = err.downcast_ref::<ObserveError>() {
        return match observe {
            ObserveError::Substrate(_) => 3,
            _ => 1,
        };
    }
    1
}

pub fn run_command(cli: Cli) -> Result<()> {
    let project = cli.project;
    match cli.command {
        Command::Init(args) => cmd_init(&project, args),
        Command::Branch(args) => match args.action {
            BranchAction::New(args) => cmd_branch_new(&project, args),
            BranchAction::Archive(args) => cmd_branch_archive(&project, args),
        },
        Command::Summary(args) => match args.action {
            SummaryAction::New(args) => cmd_summary_new(&project, args),
        },
        Command::Canon(args) => match args.action {
            CanonAction::Merge(args) => cmd_canon_merge(&project, args),
        },
        Command::Observe(args) => match args.action {
            ObserveAction::List(args) => cmd_observe_list(&project, args),
            ObserveAction::Get(args) => cmd_observe_get(&project, args),
            ObserveAction::Children(args) => cmd_observe_children(&project, args),
        },
    }
}

fn open_store(project: &str) -> Result<LifecycleStore<GitSubstrate>> {
    Ok(LifecycleStore::new(GitSubstrate::open(project)?))
}

fn open_observer(project: &str) -> Result<Observer<GitSubstrate>> {
    Ok(Observer::new(GitSubstrate::open(project)?))
}

/// Collapse the two mutually exclusive canonical flags into one filter.
fn canonical_filter(canonical: bool, non_canonical: bool) -> Option<bool> {
    match (canonical, non_canonical) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

fn print_payload(payload: &impl serde::Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

fn cmd_init(project: &str, args: InitArgs) -> Result<()> {
    let store = LifecycleStore::new(GitSubstrate::init(project)?);
    store.init(&args.title)?;
    println!(
        "{} Initialized project {} with canonical root",
        "✓".green().bold(),
        args.title.bold(),
    );
    println!("root");
    Ok(())
}

fn cmd_branch_new(project: &str, args: BranchNewArgs) -> Result<()> {
    let store = open_store(project)?;
    let id = store.new_branch(&args.title, &args.from)?;
    println!("{} Created branch {}", "✓".green().bold(), args.title.bold());
    println!("{id}");
    Ok(())
}

fn cmd_branch_archive(project: &str, args: BranchArchiveArgs) -> Result<()> {
    let store = open_store(project)?;
    store.archive_branch(&args.branch)?;
    println!("{} Archived branch {}", "✓".green().bold(), args.branch.yellow());
    Ok(())
}

fn cmd_summary_new(project: &str, args: SummaryNewArgs) -> Result<()> {
    let store = open_store(project)?;
    let id = store.new_summary(&args.title, &args.branch)?;
    println!(
        "{} Created summary {} under branch {}",
        "✓".green().bold(),
        args.title.bold(),
        args.branch.yellow(),
    );
    println!("{id}");
    Ok(())
}

fn cmd_canon_merge(project: &str, args: CanonMergeArgs) -> Result<()> {
    let store = open_store(project)?;
    store.merge_canon(&args.summary)?;
    println!(
        "{} Merged summary {} into the canon",
        "✓".green().bold(),
        args.summary.yellow(),
    );
    Ok(())
}

fn cmd_observe_list(project: &str, args: ObserveListArgs) -> Result<()> {
    let observer = open_observer(project)?;
    let canonical = canonical_filter(args.canonical, args.non_canonical);
    let artifacts = observer.list(&args.ref_name, args.kind, canonical)?;
    print_payload(&IndexPayload::new(&args.ref_name, &artifacts))
}

fn cmd_observe_get(project: &str, args: ObserveGetArgs) -> Result<()> {
    let observer = open_observer(project)?;
    let canonical = canonical_filter(args.canonical, args.non_canonical);
    let artifact = observer.get(&args.ref_name, &args.id, args.kind, canonical)?;
    let content = if args.meta_only {
        None
    } else {
        Some(observer.content(&args.ref_name, &artifact)?)
    };
    print_payload(&ObservationPayload::new(&args.ref_name, &artifact, content))
}

fn cmd_observe_children(project: &str, args: ObserveChildrenArgs) -> Result<()> {
    let observer = open_observer(project)?;
    let artifacts = observer.children(&args.ref_name, &args.parent)?;
    print_payload(&IndexPayload::new(&args.ref_name, &artifacts))
}
