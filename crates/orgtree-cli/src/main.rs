//! Organization hierarchy admin CLI.
//!
//! Provides the `orgtree` binary, which runs every hierarchy service
//! operation against a SQLite database file. Results are printed to stdout
//! as the uniform `{"success", "data", "error"}` JSON envelope; logs go to
//! stderr.
//!
//! Configuration comes from flags with environment fallbacks:
//! `--db` / `ORGTREE_DB_PATH` and `--log` / `ORGTREE_LOG`.

use std::collections::BTreeSet;
use std::process;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use orgtree_core::{AncestorEntry, FlatTreeRow, NodeId, OrganizationNode};
use orgtree_service::{
    ActionResult, CreateNodeRequest, HierarchyError, HierarchyService, UpdateNodeRequest,
};
use orgtree_storage::SqliteStore;

/// Organization hierarchy tools.
#[derive(Parser)]
#[command(name = "orgtree", about = "Manage an organization hierarchy")]
struct Cli {
    /// Path to the hierarchy database file.
    #[arg(long, env = "ORGTREE_DB_PATH", default_value = "orgtree.db", global = true)]
    db: String,

    /// Log filter directive (e.g. "info", "orgtree_storage=debug").
    #[arg(long, env = "ORGTREE_LOG", default_value = "warn", global = true)]
    log: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Create an organization.
    Create {
        #[arg(short, long)]
        name: String,

        /// Parent organization id; omit for a top-level organization.
        #[arg(short, long)]
        parent: Option<NodeId>,
    },
    /// Rename and/or move an organization.
    Update {
        id: NodeId,

        #[arg(short, long)]
        name: String,

        /// New parent id; omit to keep the current parent.
        #[arg(short, long)]
        parent: Option<NodeId>,

        /// Make the organization top-level.
        #[arg(long, conflicts_with = "parent")]
        root: bool,
    },
    /// Delete an organization and everything under it.
    Delete { id: NodeId },
    /// Show one organization with its ancestor path.
    Show { id: NodeId },
    /// Print the hierarchy.
    Tree {
        /// Print the nested tree as JSON instead of an indented listing.
        #[arg(long)]
        json: bool,
    },
    /// Resolve the space-joined path of each id.
    Paths { ids: Vec<NodeId> },
    /// Count the organizations under an id.
    Descendants { id: NodeId },
    /// Check whether a parent may be assigned to an organization.
    CheckParent {
        id: NodeId,

        #[arg(short, long)]
        parent: Option<NodeId>,
    },
    /// Audit the stored hierarchy for invariant violations.
    Verify,
}

/// `show` output.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeDetail {
    node: OrganizationNode,
    path: Vec<AncestorEntry>,
}

/// `descendants` output.
#[derive(Serialize)]
struct DescendantSummary {
    count: usize,
    warning: String,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log);
    process::exit(run(cli));
}

fn init_logging(directive: &str) {
    let filter = EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Execute one subcommand.
///
/// Returns exit code: 0 = success, 1 = operation rejected or integrity
/// violations found, 3 = database could not be opened.
fn run(cli: Cli) -> i32 {
    let store = match SqliteStore::new(&cli.db) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error: failed to open database '{}': {}", cli.db, e);
            return 3;
        }
    };
    tracing::debug!(db = %cli.db, "opened hierarchy database");
    let mut service = HierarchyService::new(store);

    match cli.command {
        Commands::Create { name, parent } => emit(service.create_node(CreateNodeRequest {
            name,
            parent_id: parent,
        })),
        Commands::Update {
            id,
            name,
            parent,
            root,
        } => emit(
            target_parent(&service, id, parent, root).and_then(|parent_id| {
                service.update_node(UpdateNodeRequest {
                    id,
                    name,
                    parent_id,
                })
            }),
        ),
        Commands::Delete { id } => {
            if let Ok(warning) = service.deletion_warning(id) {
                eprintln!("{warning}");
            }
            emit(service.delete_node(id))
        }
        Commands::Show { id } => emit(service.get_node(id).and_then(|node| {
            let path = service.get_ancestor_path(id)?;
            Ok(NodeDetail { node, path })
        })),
        Commands::Tree { json: true } => emit(service.get_hierarchy_tree()),
        Commands::Tree { json: false } => match service.get_flat_hierarchy() {
            Ok(rows) => {
                print!("{}", render_tree(&rows));
                0
            }
            Err(e) => emit::<()>(Err(e)),
        },
        Commands::Paths { ids } => {
            let ids: BTreeSet<NodeId> = ids.into_iter().collect();
            emit(service.resolve_paths(&ids))
        }
        Commands::Descendants { id } => emit(service.get_descendant_count(id).and_then(|count| {
            Ok(DescendantSummary {
                count,
                warning: service.deletion_warning(id)?,
            })
        })),
        Commands::CheckParent { id, parent } => emit(service.validate_parent_selection(id, parent)),
        Commands::Verify => match service.verify_hierarchy() {
            Ok(findings) => {
                let healthy = findings.is_empty();
                let code = emit(Ok(findings));
                if healthy {
                    code
                } else {
                    1
                }
            }
            Err(e) => emit::<()>(Err(e)),
        },
    }
}

/// Parent for `update`: the explicit `--parent`, none for `--root`, else the
/// organization's current parent.
fn target_parent(
    service: &HierarchyService<SqliteStore>,
    id: NodeId,
    parent: Option<NodeId>,
    root: bool,
) -> Result<Option<NodeId>, HierarchyError> {
    match (parent, root) {
        (Some(parent), _) => Ok(Some(parent)),
        (None, true) => Ok(None),
        (None, false) => Ok(service.get_node(id)?.parent_id),
    }
}

/// Prints a result envelope to stdout and returns the exit code.
fn emit<T: Serialize>(result: Result<T, HierarchyError>) -> i32 {
    let code = if result.is_ok() { 0 } else { 1 };
    let envelope = ActionResult::from(result);
    match serde_json::to_string_pretty(&envelope) {
        Ok(json) => {
            println!("{json}");
            code
        }
        Err(e) => {
            eprintln!("Error: failed to serialize result: {e}");
            1
        }
    }
}

/// Renders pre-order rows as an indented listing, two spaces per level.
fn render_tree(rows: &[FlatTreeRow]) -> String {
    let mut out = String::new();
    for row in rows {
        let indent = "  ".repeat(row.level.saturating_sub(1) as usize);
        out.push_str(&format!("{indent}{} [{}]\n", row.name, row.id));
    }
    out
}
