//! Clap CLI definitions for the `bd` command.
//!
//! This module defines the complete CLI structure using clap 4 derive macros.

use clap::{Args, Parser, Subcommand};

/// bd -- Dependency-aware issue tracker.
///
/// Issues chained together like beads. A lightweight issue tracker
/// with first-class dependency support.
#[derive(Parser, Debug)]
#[command(
    name = "bd",
    about = "Dependency-aware issue tracker",
    long_about = "Issues chained together like beads. A lightweight issue tracker with first-class dependency support.",
    version,
    propagate_version = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Global flags available to all subcommands.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Database path (default: auto-discover .beads/*.db).
    #[arg(long, global = true)]
    pub db: Option<String>,

    /// Actor name for audit trail (default: $BD_ACTOR, git user.name, $USER).
    #[arg(long, global = true, env = "BD_ACTOR")]
    pub actor: Option<String>,

    /// Output in JSON format.
    #[arg(long, global = true)]
    pub json: bool,

    /// Sandbox mode: disable auto-sync.
    #[arg(long, global = true)]
    pub sandbox: bool,

    /// Allow operations on potentially stale data (skip staleness check).
    #[arg(long, global = true)]
    pub allow_stale: bool,

    /// Read-only mode: block write operations (for worker sandboxes).
    #[arg(long, global = true)]
    pub readonly: bool,

    /// Enable verbose/debug output.
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output (errors only).
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,
}

/// All available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    // ===== Working With Issues =====
    /// Create a new issue (or multiple issues from markdown file).
    #[command(alias = "new")]
    Create(CreateArgs),

    /// Show issue details.
    #[command(alias = "view")]
    Show(ShowArgs),

    /// List issues.
    List(ListArgs),

    /// Close one or more issues.
    Close(CloseArgs),

    /// Update issue fields.
    Update(UpdateArgs),

    /// Delete issues.
    Delete(DeleteArgs),

    /// Add a comment to an issue.
    Comment(CommentArgs),

    /// List comments on an issue.
    Comments(CommentsArgs),

    // ===== Views & Reports =====
    /// Show ready work (open, no active blockers).
    Ready(ReadyArgs),

    /// Full-text search across issues.
    Search(SearchArgs),

    // ===== Dependencies & Structure =====
    /// Manage dependencies between issues.
    Dep(DepArgs),

    /// Show child issues (shortcut for `dep children`).
    Children(ChildrenArgs),

    /// Add a "related" dependency between two issues.
    Relate(RelateArgs),

    /// Remove a "related" dependency between two issues.
    Unrelate(UnrelateArgs),

    // ===== Workflow Operations (Phase 3) =====
    /// Interactively edit an issue (stub).
    Edit(EditArgs),

    /// Rename an issue's title.
    Rename(RenameArgs),

    /// Rename issue ID prefix (stub).
    RenamePrefix(RenamePrefixArgs),

    /// Reopen a closed issue.
    Reopen(ReopenArgs),

    /// Get or set issue status.
    #[command(name = "status")]
    StatusCmd(StatusCmdArgs),

    /// Manage labels on an issue.
    Label(LabelArgs),

    /// Move an issue to a new prefix (stub).
    #[command(name = "move")]
    MoveCmd(MoveCmdArgs),

    /// Refile an issue (stub).
    Refile(RefileArgs),

    /// Defer an issue for later.
    Defer(DeferArgs),

    /// Undefer a deferred issue.
    Undefer(UndeferArgs),

    /// Mark an issue as a duplicate of another.
    #[command(name = "duplicate")]
    DuplicateCmd(DuplicateCmdArgs),

    /// Mark an issue as superseded by another.
    Supersede(SupersedeArgs),

    /// Show where an issue lives (stub).
    #[command(name = "where")]
    WhereCmd(WhereCmdArgs),

    /// Show last N modified issues.
    #[command(name = "last-touched")]
    LastTouched(LastTouchedArgs),

    /// Show open issues sorted by priority.
    Todo(TodoArgs),

    // ===== Views & Reports (Phase 2) =====
    /// Count issues by status.
    Count(CountArgs),

    /// Show project statistics.
    Stats(StatsArgs),

    /// Show stale issues (not updated in N days).
    Stale(StaleArgs),

    /// Show orphan issues (no dependencies at all).
    Orphans(OrphansArgs),

    /// Show event history for an issue.
    History(HistoryArgs),

    /// Show dependency diff between two points in time (not yet implemented).
    Diff,

    /// Display issue dependency graph.
    Graph(GraphArgs),

    /// Find duplicate issues (not yet implemented).
    #[command(alias = "find-duplicates")]
    Duplicates,

    /// Promote a child issue to top-level (not yet implemented).
    Promote,

    /// Create a git branch from an issue (not yet implemented).
    Branch,

    // ===== Setup & Configuration =====
    /// Initialize bd in the current directory.
    Init(InitArgs),

    /// Manage configuration.
    Config(ConfigArgs),

    /// Sync the database with the text replica (export, then import).
    Sync,

    /// Print version information.
    Version,

    // ===== Templates =====
    /// Template operations (list, show, create, delete).
    Template(TemplateArgs),

    // ===== Phase 5: Sync, Import/Export & Flow Gates =====
    /// Import issues from the text replica (and apply any pending deletions).
    Import(ImportArgs),

    /// Export issues to the text replica.
    Export(ExportArgs),

    /// Flow gates (claim-next, close-safe, land, resume, intake, ...).
    Flow(FlowArgs),

    // ===== Phase 6: Database & Maintenance =====
    /// Check and repair database health.
    Doctor(DoctorArgs),

    /// Dolt-compatible database operations (stubs -- we use SQLite).
    Dolt(DoltArgs),

    /// Clean up temporary data and orphaned records.
    Cleanup,

    /// Reset the database (WARNING: deletes all data).
    Reset,

    /// Run database migrations.
    Migrate,

    /// Administrative operations.
    Admin(AdminArgs),

    /// Detect pollution in issue data.
    #[command(name = "detect-pollution")]
    DetectPollution,

    /// Lint issues for common problems.
    Lint(LintArgs),

    /// Restore a deleted or archived issue.
    Restore(RestoreArgs),

    // ===== Phase 7: Advanced Features =====
    /// Hook management (install, uninstall, list, test).
    Hook(HookArgs),

    /// Manage beads hooks.
    Hooks,

    /// Federation between beads instances.
    Federation,

    /// Version-control operations for beads data.
    Vc(VcArgs),

    /// Repository management.
    Repo(RepoArgs),

    /// Context management (set/get/clear working context).
    #[command(name = "context")]
    ContextCmd(ContextCmdArgs),

    /// Audit trail and compliance reporting.
    Audit,

    /// Slot management (time-boxed work slots).
    Slot,

    /// Merge a work slot back into the main timeline.
    #[command(name = "merge-slot")]
    MergeSlot,

    /// Pour issues into a container/molecule.
    Pour,

    /// Quick-create an issue with minimal input.
    Quick,

    /// Thank a contributor for their work on an issue.
    Thanks(ThanksArgs),

    /// List all known issue types (built-in + custom).
    Types(TypesArgs),

    /// Human-readable export/display.
    Human,

    /// Show issue details (alias for `show`).
    Info(InfoArgs),

    /// Route an issue to a team or person.
    Route,

    /// Show routed issues.
    Routed,

    /// Epic management.
    Epic,

    // ===== Phase 8: Utilities, Completion & Polish =====
    /// Execute a raw SQL query against the beads database.
    Query(QueryArgs),

    /// Interactive SQL shell (stub).
    Sql,

    /// Key-value metadata operations.
    Kv(KvArgs),

    /// Generate shell completions.
    Completion(CompletionArgs),

    /// Quick-start guide for new users.
    Quickstart,

    /// Write onboarding content to agent instruction file.
    Onboard(OnboardArgs),

    /// Bootstrap a beads project.
    Bootstrap,

    /// Run preflight checks.
    Preflight(PreflightArgs),

    /// Output AI-optimized workflow context.
    Prime(PrimeArgs),

    /// Check and manage bd version upgrades.
    Upgrade(UpgradeArgs),

    /// Manage git worktrees with shared beads database.
    Worktree(WorktreeArgs),

    /// Start or inspect the RPC/SSE daemon.
    Daemon(DaemonArgs),

    /// Block until a matching mutation event arrives.
    Await(AwaitArgs),

    /// Block until a decision point is responded to.
    Watch(WatchArgs),
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// Arguments for `bd create`.
#[derive(Args, Debug)]
pub struct CreateArgs {
    /// Issue title (positional argument).
    pub title: Option<String>,

    /// Issue title (alternative to positional argument).
    #[arg(long)]
    pub title_flag: Option<String>,

    /// Issue description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Issue type (bug|feature|task|epic|chore|decision).
    #[arg(short = 't', long = "type", default_value = "task")]
    pub issue_type: String,

    /// Priority (0-4 or P0-P4).
    #[arg(short = 'p', long, default_value = "2")]
    pub priority: String,

    /// Assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Labels (comma-separated, repeatable).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Explicit issue ID (e.g., 'bd-42' for partitioning).
    #[arg(long)]
    pub id: Option<String>,

    /// Parent issue ID for hierarchical child.
    #[arg(long)]
    pub parent: Option<String>,

    /// Preview what would be created without actually creating.
    #[arg(long)]
    pub dry_run: bool,

    /// Output only the issue ID (for scripting).
    #[arg(long)]
    pub silent: bool,

    /// Force creation even if prefix doesn't match.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

/// Arguments for `bd show`.
#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Issue IDs to display.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Show compact one-line output per issue.
    #[arg(long)]
    pub short: bool,
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Arguments for `bd list`.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Filter by status (open, in_progress, blocked, deferred, closed).
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Filter by labels (AND: must have ALL).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Filter by labels (OR: must have ANY). Comma-separated.
    #[arg(long = "label-any", num_args = 1..)]
    pub label_any: Vec<String>,

    /// Filter by priority (0-4 or P0-P4).
    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    /// Sort by field: priority, created, updated, closed, status, id, title, type, assignee.
    #[arg(long)]
    pub sort: Option<String>,

    /// Reverse sort order.
    #[arg(short = 'r', long)]
    pub reverse: bool,

    /// Limit results (default 50, use 0 for unlimited).
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: i32,

    /// Show all issues including closed.
    #[arg(long)]
    pub all: bool,

    /// Show detailed multi-line output for each issue.
    #[arg(long)]
    pub long: bool,

    /// Display issues in a tree format with status/priority symbols.
    #[arg(long)]
    pub tree: bool,
}

// ---------------------------------------------------------------------------
// Close
// ---------------------------------------------------------------------------

/// Arguments for `bd close`.
#[derive(Args, Debug)]
pub struct CloseArgs {
    /// Issue IDs to close.
    pub ids: Vec<String>,

    /// Reason for closing.
    #[arg(short = 'r', long)]
    pub reason: Option<String>,

    /// Force close pinned issues or unsatisfied gates.
    #[arg(short = 'f', long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Ready
// ---------------------------------------------------------------------------

/// Arguments for `bd ready`.
#[derive(Args, Debug)]
pub struct ReadyArgs {
    /// Sort policy: priority (default), hybrid, oldest.
    #[arg(short = 's', long, default_value = "priority")]
    pub sort: String,

    /// Maximum issues to show.
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: i32,

    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Filter by labels (AND: must have ALL).
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by priority.
    #[arg(short = 'p', long)]
    pub priority: Option<i32>,

    /// Show only unassigned issues.
    #[arg(short = 'u', long)]
    pub unassigned: bool,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Arguments for `bd search`.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Search query.
    pub query: String,

    /// Filter by status.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Filter by labels.
    #[arg(short = 'l', long = "label", num_args = 1..)]
    pub labels: Vec<String>,

    /// Limit results.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: i32,
}

// ---------------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------------

/// Arguments for `bd delete`.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Issue IDs to delete.
    #[arg(required = true)]
    pub ids: Vec<String>,

    /// Force deletion without confirmation.
    #[arg(short = 'f', long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Init
// ---------------------------------------------------------------------------

/// Arguments for `bd init`.
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Issue prefix (default: current directory name).
    #[arg(short = 'p', long)]
    pub prefix: Option<String>,

    /// Suppress output.
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Force re-initialization even if data already exists.
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Arguments for `bd config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Set a configuration value.
    Set(ConfigSetArgs),
    /// Get a configuration value.
    Get(ConfigGetArgs),
    /// List all configuration values.
    List,
    /// Unset a configuration value.
    Unset(ConfigUnsetArgs),
}

/// Arguments for `bd config set`.
#[derive(Args, Debug)]
pub struct ConfigSetArgs {
    /// Configuration key.
    pub key: String,
    /// Configuration value.
    pub value: String,
}

/// Arguments for `bd config get`.
#[derive(Args, Debug)]
pub struct ConfigGetArgs {
    /// Configuration key.
    pub key: String,
}

/// Arguments for `bd config unset`.
#[derive(Args, Debug)]
pub struct ConfigUnsetArgs {
    /// Configuration key.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Dep
// ---------------------------------------------------------------------------

/// Arguments for `bd dep`.
#[derive(Args, Debug)]
pub struct DepArgs {
    #[command(subcommand)]
    pub command: DepCommands,
}

/// Dependency subcommands.
#[derive(Subcommand, Debug)]
pub enum DepCommands {
    /// Add a dependency between issues.
    Add(DepAddArgs),
    /// Remove a dependency between issues.
    Remove(DepRemoveArgs),
    /// List dependencies for an issue.
    List(DepListArgs),
    /// Detect dependency cycles.
    Cycles,
    /// Show parent issues (issues with parent-child dependency where given issue is the child).
    Parents(DepParentsArgs),
    /// Show child issues (issues that depend on given issue via parent-child).
    Children(DepChildrenArgs),
}

/// Arguments for `bd dep add`.
#[derive(Args, Debug)]
pub struct DepAddArgs {
    /// Source issue ID.
    pub from: String,
    /// Target issue ID.
    pub to: String,
    /// Dependency type (blocks, related, parent-child, discovered-from).
    #[arg(short = 't', long = "type", default_value = "blocks")]
    pub dep_type: String,
}

/// Arguments for `bd dep remove`.
#[derive(Args, Debug)]
pub struct DepRemoveArgs {
    /// Source issue ID.
    pub from: String,
    /// Target issue ID.
    pub to: String,
}

/// Arguments for `bd dep list`.
#[derive(Args, Debug)]
pub struct DepListArgs {
    /// Issue ID to list dependencies for.
    pub id: String,
}

/// Arguments for `bd dep parents`.
#[derive(Args, Debug)]
pub struct DepParentsArgs {
    /// Issue ID to find parents of.
    pub id: String,
}

/// Arguments for `bd dep children`.
#[derive(Args, Debug)]
pub struct DepChildrenArgs {
    /// Issue ID to find children of.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Comment
// ---------------------------------------------------------------------------

/// Arguments for `bd comment` (add a comment).
#[derive(Args, Debug)]
pub struct CommentArgs {
    /// Issue ID.
    pub id: String,
    /// Comment text (if not provided, opens editor).
    pub text: Option<String>,
}

/// Arguments for `bd comments` (list comments).
#[derive(Args, Debug)]
pub struct CommentsArgs {
    /// Issue ID.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------------

/// Arguments for `bd update`.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Issue ID to update.
    pub id: String,

    /// New title.
    #[arg(long)]
    pub title: Option<String>,

    /// New description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// New issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// New priority (0-4 or P0-P4).
    #[arg(short = 'p', long)]
    pub priority: Option<String>,

    /// New assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// New status.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Add labels.
    #[arg(long = "add-label", num_args = 1..)]
    pub add_labels: Vec<String>,

    /// Remove labels.
    #[arg(long = "remove-label", num_args = 1..)]
    pub remove_labels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Children (top-level alias)
// ---------------------------------------------------------------------------

/// Arguments for `bd children` (top-level alias for `bd dep children`).
#[derive(Args, Debug)]
pub struct ChildrenArgs {
    /// Issue ID to find children of.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Relate / Unrelate
// ---------------------------------------------------------------------------

/// Arguments for `bd relate`.
#[derive(Args, Debug)]
pub struct RelateArgs {
    /// Source issue ID.
    pub from: String,
    /// Target issue ID.
    pub to: String,
}

/// Arguments for `bd unrelate`.
#[derive(Args, Debug)]
pub struct UnrelateArgs {
    /// Source issue ID.
    pub from: String,
    /// Target issue ID.
    pub to: String,
}

// ---------------------------------------------------------------------------
// Count
// ---------------------------------------------------------------------------

/// Arguments for `bd count`.
#[derive(Args, Debug)]
pub struct CountArgs {
    /// Filter by status.
    #[arg(short = 's', long)]
    pub status: Option<String>,

    /// Filter by issue type.
    #[arg(short = 't', long = "type")]
    pub issue_type: Option<String>,

    /// Filter by assignee.
    #[arg(short = 'a', long)]
    pub assignee: Option<String>,

    /// Group by status.
    #[arg(long)]
    pub by_status: bool,
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

/// Arguments for `bd stats`.
#[derive(Args, Debug)]
pub struct StatsArgs {
    // No additional arguments beyond global --json.
}

// ---------------------------------------------------------------------------
// Stale
// ---------------------------------------------------------------------------

/// Arguments for `bd stale`.
#[derive(Args, Debug)]
pub struct StaleArgs {
    /// Number of days without updates to consider stale (default 30).
    #[arg(short = 'd', long, default_value = "30")]
    pub days: i32,
}

// ---------------------------------------------------------------------------
// Orphans
// ---------------------------------------------------------------------------

/// Arguments for `bd orphans`.
#[derive(Args, Debug)]
pub struct OrphansArgs {
    // No additional arguments beyond global --json.
}

// ---------------------------------------------------------------------------
// History
// ---------------------------------------------------------------------------

/// Arguments for `bd history`.
#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Issue ID to show history for.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Arguments for `bd graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Issue ID to graph (show its dependency subgraph).
    pub id: Option<String>,

    /// Graph all open issues (finds connected components).
    #[arg(long)]
    pub all: bool,

    /// Output Graphviz DOT format.
    #[arg(long)]
    pub dot: bool,

    /// Compact tree output (default when not --dot or --json).
    #[arg(long)]
    pub compact: bool,
}

// ---------------------------------------------------------------------------
// Edit (Phase 3 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd edit`.
#[derive(Args, Debug)]
pub struct EditArgs {
    /// Issue ID to edit.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Rename
// ---------------------------------------------------------------------------

/// Arguments for `bd rename`.
#[derive(Args, Debug)]
pub struct RenameArgs {
    /// Issue ID to rename.
    pub id: String,
    /// New title for the issue.
    pub new_title: String,
}

// ---------------------------------------------------------------------------
// RenamePrefix (stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd rename-prefix`.
#[derive(Args, Debug)]
pub struct RenamePrefixArgs {
    /// Old prefix.
    pub old: String,
    /// New prefix.
    pub new: String,
}

// ---------------------------------------------------------------------------
// Reopen
// ---------------------------------------------------------------------------

/// Arguments for `bd reopen`.
#[derive(Args, Debug)]
pub struct ReopenArgs {
    /// Issue ID to reopen.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Status (get/set)
// ---------------------------------------------------------------------------

/// Arguments for `bd status`.
#[derive(Args, Debug)]
pub struct StatusCmdArgs {
    /// Issue ID.
    pub id: String,
    /// New status (if provided, sets the status; otherwise prints current status).
    pub new_status: Option<String>,
}

// ---------------------------------------------------------------------------
// Label (subcommands)
// ---------------------------------------------------------------------------

/// Arguments for `bd label`.
#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Issue ID.
    pub id: String,
    #[command(subcommand)]
    pub command: LabelCommands,
}

/// Label subcommands.
#[derive(Subcommand, Debug)]
pub enum LabelCommands {
    /// Add a label to an issue.
    Add(LabelAddArgs),
    /// Remove a label from an issue.
    Remove(LabelRemoveArgs),
    /// List labels on an issue.
    List,
}

/// Arguments for `bd label <id> add`.
#[derive(Args, Debug)]
pub struct LabelAddArgs {
    /// Label to add.
    pub label: String,
}

/// Arguments for `bd label <id> remove`.
#[derive(Args, Debug)]
pub struct LabelRemoveArgs {
    /// Label to remove.
    pub label: String,
}

// ---------------------------------------------------------------------------
// Move (stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd move`.
#[derive(Args, Debug)]
pub struct MoveCmdArgs {
    /// Issue ID.
    pub id: String,
    /// New prefix.
    pub new_prefix: String,
}

// ---------------------------------------------------------------------------
// Refile (stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd refile`.
#[derive(Args, Debug)]
pub struct RefileArgs {
    /// Issue ID to refile.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Defer
// ---------------------------------------------------------------------------

/// Arguments for `bd defer`.
#[derive(Args, Debug)]
pub struct DeferArgs {
    /// Issue ID to defer.
    pub id: String,

    /// Defer until date (ISO 8601 date string, e.g. 2025-06-01).
    #[arg(long)]
    pub until: Option<String>,
}

// ---------------------------------------------------------------------------
// Undefer
// ---------------------------------------------------------------------------

/// Arguments for `bd undefer`.
#[derive(Args, Debug)]
pub struct UndeferArgs {
    /// Issue ID to undefer.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Duplicate
// ---------------------------------------------------------------------------

/// Arguments for `bd duplicate`.
#[derive(Args, Debug)]
pub struct DuplicateCmdArgs {
    /// Issue ID to mark as duplicate.
    pub id: String,
    /// Issue ID this is a duplicate of.
    pub duplicate_of: String,
}

// ---------------------------------------------------------------------------
// Supersede
// ---------------------------------------------------------------------------

/// Arguments for `bd supersede`.
#[derive(Args, Debug)]
pub struct SupersedeArgs {
    /// Issue ID to mark as superseded.
    pub id: String,
    /// Issue ID that supersedes this one.
    pub superseded_by: String,
}

// ---------------------------------------------------------------------------
// Where (stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd where`.
#[derive(Args, Debug)]
pub struct WhereCmdArgs {
    /// Issue ID to locate.
    pub id: String,
}

// ---------------------------------------------------------------------------
// LastTouched
// ---------------------------------------------------------------------------

/// Arguments for `bd last-touched`.
#[derive(Args, Debug)]
pub struct LastTouchedArgs {
    /// Maximum number of issues to show.
    #[arg(short = 'n', long, default_value = "10")]
    pub limit: i32,
}

// ---------------------------------------------------------------------------
// Todo
// ---------------------------------------------------------------------------

/// Arguments for `bd todo`.
#[derive(Args, Debug)]
pub struct TodoArgs {
    /// Maximum number of issues to show.
    #[arg(short = 'n', long, default_value = "50")]
    pub limit: i32,
}

// ---------------------------------------------------------------------------
// Template (Phase 4 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd template`.
#[derive(Args, Debug)]
pub struct TemplateArgs {
    #[command(subcommand)]
    pub command: TemplateCommands,
}

/// Template subcommands.
#[derive(Subcommand, Debug)]
pub enum TemplateCommands {
    /// List available templates.
    List,
    /// Show template details and extract variables.
    Show(TemplateShowArgs),
    /// Create a new template issue.
    Create(TemplateCreateArgs),
    /// Delete a template issue.
    Delete(TemplateDeleteArgs),
    /// Instantiate a template (clone with variable substitution).
    Instantiate(TemplateInstantiateArgs),
}

/// Arguments for `bd template show`.
#[derive(Args, Debug)]
pub struct TemplateShowArgs {
    /// Template issue ID.
    pub id: String,
}

/// Arguments for `bd template create`.
#[derive(Args, Debug)]
pub struct TemplateCreateArgs {
    /// Template title.
    pub title: String,

    /// Template description.
    #[arg(short = 'd', long)]
    pub description: Option<String>,

    /// Issue type (bug|feature|task|epic|chore|decision).
    #[arg(short = 't', long = "type", default_value = "task")]
    pub issue_type: String,

    /// Priority (0-4 or P0-P4).
    #[arg(short = 'p', long, default_value = "2")]
    pub priority: String,
}

/// Arguments for `bd template delete`.
#[derive(Args, Debug)]
pub struct TemplateDeleteArgs {
    /// Template issue ID.
    pub id: String,
}

/// Arguments for `bd template instantiate`.
#[derive(Args, Debug)]
pub struct TemplateInstantiateArgs {
    /// Template issue ID to instantiate.
    pub id: String,

    /// Variable substitution (key=value), repeatable.
    #[arg(long = "var", num_args = 1..)]
    pub vars: Vec<String>,

    /// ID prefix for new issues (default: use configured prefix).
    #[arg(long)]
    pub prefix: Option<String>,
}

// ---------------------------------------------------------------------------
// Import
// ---------------------------------------------------------------------------

/// Arguments for `bd import`.
#[derive(Args, Debug)]
pub struct ImportArgs {
    /// Replica file to import from (default: `.beads/issues.jsonl`).
    pub replica: Option<String>,

    /// Only apply records newer than this RFC3339 timestamp.
    #[arg(long)]
    pub since: Option<String>,
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

/// Arguments for `bd export`.
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Replica file to write (default: `.beads/issues.jsonl`).
    pub replica: Option<String>,
}

// ---------------------------------------------------------------------------
// Flow (gates)
// ---------------------------------------------------------------------------

/// Arguments for `bd flow`.
#[derive(Args, Debug)]
pub struct FlowArgs {
    #[command(subcommand)]
    pub command: FlowCommands,
}

/// Flow gate subcommands. Each prints an envelope to stdout and exits with
/// the envelope's exit class.
#[derive(Subcommand, Debug)]
pub enum FlowCommands {
    /// Atomically claim the next ready issue matching a filter.
    ClaimNext(FlowClaimNextArgs),
    /// Close an issue after running close-reason lint and dependent checks.
    CloseSafe(FlowCloseSafeArgs),
    /// Block an issue with a structured reason and optional waiters.
    BlockWithContext(FlowBlockArgs),
    /// Create a discovered-work issue linked to its origin.
    CreateDiscovered(FlowCreateDiscoveredArgs),
    /// Run the land pipeline (WIP gate, open-children gate, close, merge).
    Land(FlowLandArgs),
    /// Resume work by replaying recent issue activity for an actor.
    Resume(FlowResumeArgs),
    /// Audit an epic's intake plan against its child issues.
    IntakeAudit(FlowIntakeAuditArgs),
    /// Sync an epic's intake plan document with its child issues.
    IntakeMapSync(FlowIntakeMapSyncArgs),
}

/// Arguments for `bd flow claim-next`.
#[derive(Args, Debug)]
pub struct FlowClaimNextArgs {
    /// Actor claiming the issue.
    #[arg(long)]
    pub actor: String,

    /// Restrict to this issue type.
    #[arg(long = "type")]
    pub issue_type: Option<String>,

    /// Restrict to this priority.
    #[arg(long)]
    pub priority: Option<i32>,

    /// Restrict to issues carrying this label.
    #[arg(long)]
    pub label: Vec<String>,
}

/// Arguments for `bd flow close-safe`.
#[derive(Args, Debug)]
pub struct FlowCloseSafeArgs {
    /// Issue ID (or cross-repo id) to close.
    pub id: String,

    /// Close reason (subject to close-reason lint).
    #[arg(short = 'r', long)]
    pub reason: String,

    /// Verification evidence (test run, manual check) recorded as a comment.
    #[arg(long)]
    pub verification: String,

    /// Actor closing the issue.
    #[arg(long)]
    pub actor: String,

    /// Allow a close reason that otherwise reads as a non-fix ("wontfix"-style).
    #[arg(long)]
    pub allow_failure_reason: bool,
}

/// Arguments for `bd flow block-with-context`.
#[derive(Args, Debug)]
pub struct FlowBlockArgs {
    /// Issue ID to block.
    pub id: String,

    /// Context pack explaining why the issue is blocked.
    #[arg(short = 'r', long)]
    pub reason: String,

    /// Actor blocking the issue.
    #[arg(long)]
    pub actor: String,

    /// Issue ID of the blocker, if known; wires a `blocks` dependency.
    #[arg(long)]
    pub blocker: Option<String>,
}

/// Arguments for `bd flow create-discovered`.
#[derive(Args, Debug)]
pub struct FlowCreateDiscoveredArgs {
    /// Title of the discovered issue.
    pub title: String,

    /// Issue ID that the discovery came from.
    #[arg(long)]
    pub origin: String,

    /// Actor filing the discovered issue.
    #[arg(long)]
    pub actor: String,

    /// Issue type.
    #[arg(long = "type", default_value = "task")]
    pub issue_type: String,
}

/// Arguments for `bd flow land`.
#[derive(Args, Debug)]
pub struct FlowLandArgs {
    /// Actor landing the session.
    #[arg(long)]
    pub actor: String,

    /// Epic ID whose children must all be closed (open-children gate).
    #[arg(long)]
    pub epic: Option<String>,

    /// Evidence that quality checks (tests, lints) passed.
    #[arg(long)]
    pub quality_evidence: Option<String>,

    /// Run all gates but stop before the push/merge choreography.
    #[arg(long)]
    pub check_only: bool,

    /// Merge `@{u}` into the working branch before pushing.
    #[arg(long)]
    pub sync_merge: bool,

    /// Run `bd sync` as part of the choreography.
    #[arg(long)]
    pub sync: bool,

    /// Push the branch after the other gates pass.
    #[arg(long)]
    pub push: bool,
}

/// Arguments for `bd flow resume`.
#[derive(Args, Debug)]
pub struct FlowResumeArgs {
    /// Actor resuming work.
    #[arg(long)]
    pub actor: String,

    /// Number of sessions closed since the actor last re-read full context.
    #[arg(long, default_value = "0")]
    pub sessions_closed: u32,

    /// Number of file re-reads since the last context refresh.
    #[arg(long, default_value = "0")]
    pub file_rereads: u32,

    /// Whether the actor's task materially changed since last context load.
    #[arg(long)]
    pub state_transition: bool,
}

/// Arguments for `bd flow intake-audit`.
#[derive(Args, Debug)]
pub struct FlowIntakeAuditArgs {
    /// Epic issue ID to audit.
    pub epic_id: String,

    /// Actor requesting the audit.
    #[arg(long)]
    pub actor: String,
}

/// A single `idx:issue-id` plan or finding entry.
#[derive(Clone, Debug)]
pub struct MapEntry {
    pub index: u32,
    pub id: String,
}

impl std::str::FromStr for MapEntry {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let (idx, id) = s
            .split_once(':')
            .ok_or_else(|| format!("expected 'idx:issue-id', got '{s}'"))?;
        let index: u32 = idx
            .parse()
            .map_err(|_| format!("expected numeric index, got '{idx}'"))?;
        Ok(MapEntry { index, id: id.to_string() })
    }
}

/// Arguments for `bd flow intake-map-sync`.
#[derive(Args, Debug)]
pub struct FlowIntakeMapSyncArgs {
    /// Epic issue ID whose plan document should be synced.
    pub epic_id: String,

    /// Actor requesting the sync.
    #[arg(long)]
    pub actor: String,

    /// Plan entry as `idx:issue-id` (repeatable).
    #[arg(long = "plan")]
    pub plan: Vec<MapEntry>,

    /// Issue ID expected to be ready in wave 1 (repeatable).
    #[arg(long = "ready")]
    pub ready_wave: Vec<String>,

    /// Finding entry as `idx:issue-id` (repeatable).
    #[arg(long = "finding")]
    pub findings: Vec<MapEntry>,

    /// Mark the plan as carrying findings (FINDING- entries expected).
    #[arg(long)]
    pub has_findings: bool,
}

// ---------------------------------------------------------------------------
// Doctor (Phase 6)
// ---------------------------------------------------------------------------

/// Arguments for `bd doctor`.
#[derive(Args, Debug)]
pub struct DoctorArgs {
    #[command(subcommand)]
    pub command: Option<DoctorCommands>,
}

/// Doctor subcommands.
#[derive(Subcommand, Debug)]
pub enum DoctorCommands {
    /// Attempt to fix detected issues.
    Fix,
    /// Check database health (default if no subcommand given).
    Health,
    /// Validate database schema and data integrity.
    Validate,
    /// Detect data pollution.
    Pollution,
    /// Check for orphaned artifacts.
    Artifacts,
}

// ---------------------------------------------------------------------------
// Dolt (Phase 6 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd dolt`.
#[derive(Args, Debug)]
pub struct DoltArgs {
    #[command(subcommand)]
    pub command: DoltCommands,
}

/// Dolt subcommands (stubs -- we use SQLite not Dolt).
#[derive(Subcommand, Debug)]
pub enum DoltCommands {
    /// Run a SQL query against the database.
    Sql(DoltSqlArgs),
    /// Show database status.
    Status,
    /// Show commit log.
    Log,
    /// Commit current state.
    Commit(DoltCommitArgs),
    /// Push changes to remote.
    Push,
    /// Pull changes from remote.
    Pull,
}

/// Arguments for `bd dolt sql`.
#[derive(Args, Debug)]
pub struct DoltSqlArgs {
    /// SQL query to execute.
    #[arg(short = 'q', long)]
    pub query: Option<String>,
}

/// Arguments for `bd dolt commit`.
#[derive(Args, Debug)]
pub struct DoltCommitArgs {
    /// Commit message.
    #[arg(short = 'm', long)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Admin (Phase 6 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd admin`.
#[derive(Args, Debug)]
pub struct AdminArgs {
    #[command(subcommand)]
    pub command: AdminCommands,
}

/// Admin subcommands.
#[derive(Subcommand, Debug)]
pub enum AdminCommands {
    /// Manage command aliases.
    Aliases,
    /// Run administrative cleanup.
    Cleanup,
    /// Administrative database compaction.
    Compact,
    /// Administrative database reset.
    Reset,
}

// ---------------------------------------------------------------------------
// Lint (Phase 6)
// ---------------------------------------------------------------------------

/// Arguments for `bd lint`.
#[derive(Args, Debug)]
pub struct LintArgs {
    /// Fix detected issues automatically where possible.
    #[arg(long)]
    pub fix: bool,
}

// ---------------------------------------------------------------------------
// Restore (Phase 6 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd restore`.
#[derive(Args, Debug)]
pub struct RestoreArgs {
    /// Issue ID to restore.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Hook (Phase 7 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd hook`.
#[derive(Args, Debug)]
pub struct HookArgs {
    #[command(subcommand)]
    pub command: HookCommands,
}

/// Hook subcommands.
#[derive(Subcommand, Debug)]
pub enum HookCommands {
    /// Install a hook.
    Install(HookInstallArgs),
    /// Uninstall a hook.
    Uninstall(HookUninstallArgs),
    /// List installed hooks.
    List,
    /// Test a hook.
    Test(HookTestArgs),
}

/// Arguments for `bd hook install`.
#[derive(Args, Debug)]
pub struct HookInstallArgs {
    /// Hook name.
    pub name: String,
}

/// Arguments for `bd hook uninstall`.
#[derive(Args, Debug)]
pub struct HookUninstallArgs {
    /// Hook name.
    pub name: String,
}

/// Arguments for `bd hook test`.
#[derive(Args, Debug)]
pub struct HookTestArgs {
    /// Hook name.
    pub name: String,
}

// ---------------------------------------------------------------------------
// Vc (Phase 7 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd vc`.
#[derive(Args, Debug)]
pub struct VcArgs {
    #[command(subcommand)]
    pub command: VcCommands,
}

/// Version-control subcommands.
#[derive(Subcommand, Debug)]
pub enum VcCommands {
    /// Commit beads data.
    Commit(VcCommitArgs),
    /// Push beads data to remote.
    Push,
    /// Pull beads data from remote.
    Pull,
    /// Show version-control status.
    Status,
}

/// Arguments for `bd vc commit`.
#[derive(Args, Debug)]
pub struct VcCommitArgs {
    /// Commit message.
    #[arg(short = 'm', long)]
    pub message: Option<String>,
}

// ---------------------------------------------------------------------------
// Repo (Phase 7 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd repo`.
#[derive(Args, Debug)]
pub struct RepoArgs {
    #[command(subcommand)]
    pub command: RepoCommands,
}

/// Repo subcommands.
#[derive(Subcommand, Debug)]
pub enum RepoCommands {
    /// List known repositories.
    List,
    /// Show repository info.
    Info(RepoInfoArgs),
}

/// Arguments for `bd repo info`.
#[derive(Args, Debug)]
pub struct RepoInfoArgs {
    /// Repository name or path.
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Context (Phase 7 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd context`.
#[derive(Args, Debug)]
pub struct ContextCmdArgs {
    #[command(subcommand)]
    pub command: ContextCmdCommands,
}

/// Context subcommands.
#[derive(Subcommand, Debug)]
pub enum ContextCmdCommands {
    /// Set the working context.
    Set(ContextSetArgs),
    /// Get the current working context.
    Get,
    /// Clear the working context.
    Clear,
}

/// Arguments for `bd context set`.
#[derive(Args, Debug)]
pub struct ContextSetArgs {
    /// Context value (e.g., molecule ID, prefix, label).
    pub value: String,
}

// ---------------------------------------------------------------------------
// Thanks (Phase 7 stub)
// ---------------------------------------------------------------------------

/// Arguments for `bd thanks`.
#[derive(Args, Debug)]
pub struct ThanksArgs {
    /// Issue ID to thank the contributor for.
    pub id: String,
}

// ---------------------------------------------------------------------------
// Types (Phase 7 -- real implementation)
// ---------------------------------------------------------------------------

/// Arguments for `bd types`.
#[derive(Args, Debug)]
pub struct TypesArgs {
    // No additional arguments beyond global --json.
}

// ---------------------------------------------------------------------------
// Info (Phase 7 -- alias for show)
// ---------------------------------------------------------------------------

/// Arguments for `bd info` (alias for `bd show`).
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Issue IDs to display.
    #[arg(required = true)]
    pub ids: Vec<String>,
}

// ---------------------------------------------------------------------------
// Query (Phase 8 -- real implementation)
// ---------------------------------------------------------------------------

/// Arguments for `bd query`.
#[derive(Args, Debug)]
pub struct QueryArgs {
    /// SQL query to execute.
    pub sql: String,
}

// ---------------------------------------------------------------------------
// Kv (Phase 8 -- real implementation)
// ---------------------------------------------------------------------------

/// Arguments for `bd kv`.
#[derive(Args, Debug)]
pub struct KvArgs {
    #[command(subcommand)]
    pub command: KvCommands,
}

/// KV subcommands.
#[derive(Subcommand, Debug)]
pub enum KvCommands {
    /// Get a metadata value.
    Get(KvGetArgs),
    /// Set a metadata value.
    Set(KvSetArgs),
    /// List all metadata entries.
    List,
    /// Delete a metadata entry.
    Delete(KvDeleteArgs),
}

/// Arguments for `bd kv get`.
#[derive(Args, Debug)]
pub struct KvGetArgs {
    /// Metadata key.
    pub key: String,
}

/// Arguments for `bd kv set`.
#[derive(Args, Debug)]
pub struct KvSetArgs {
    /// Metadata key.
    pub key: String,
    /// Metadata value.
    pub value: String,
}

/// Arguments for `bd kv delete`.
#[derive(Args, Debug)]
pub struct KvDeleteArgs {
    /// Metadata key.
    pub key: String,
}

// ---------------------------------------------------------------------------
// Completion (Phase 8 -- real implementation)
// ---------------------------------------------------------------------------

/// Arguments for `bd completion`.
#[derive(Args, Debug)]
pub struct CompletionArgs {
    #[command(subcommand)]
    pub command: CompletionCommands,
}

/// Completion subcommands.
#[derive(Subcommand, Debug)]
pub enum CompletionCommands {
    /// Generate Bash completions.
    Bash,
    /// Generate Zsh completions.
    Zsh,
    /// Generate Fish completions.
    Fish,
    /// Generate PowerShell completions.
    Powershell,
}

// ---------------------------------------------------------------------------
// Preflight
// ---------------------------------------------------------------------------

/// Arguments for `bd onboard`.
#[derive(Args, Debug)]
pub struct OnboardArgs {
    /// Auto-discover target file (default).
    #[arg(long, group = "target")]
    pub auto: bool,

    /// Write to AGENTS.md.
    #[arg(long, group = "target")]
    pub agents: bool,

    /// Write to CLAUDE.md.
    #[arg(long, group = "target")]
    pub claude: bool,

    /// Write to .github/copilot-instructions.md.
    #[arg(long, group = "target")]
    pub copilot: bool,

    /// Write to CODEX.md.
    #[arg(long, group = "target")]
    pub codex: bool,

    /// Write to .opencode/instructions.md.
    #[arg(long, group = "target")]
    pub opencode: bool,

    /// Check if onboard section is installed.
    #[arg(long, conflicts_with = "remove")]
    pub check: bool,

    /// Remove the onboard section instead of writing it.
    #[arg(long, conflicts_with = "check")]
    pub remove: bool,
}

/// Arguments for `bd preflight`.
#[derive(Args, Debug)]
pub struct PreflightArgs {
    /// Run checks automatically instead of showing static checklist.
    #[arg(long)]
    pub check: bool,

    /// Auto-fix issues where possible (not yet implemented).
    #[arg(long)]
    pub fix: bool,
}

// ---------------------------------------------------------------------------
// Prime
// ---------------------------------------------------------------------------

/// Arguments for `bd prime`.
#[derive(Args, Debug)]
pub struct PrimeArgs {
    /// Force full CLI output (ignore MCP detection).
    #[arg(long)]
    pub full: bool,

    /// Force MCP mode (minimal output).
    #[arg(long)]
    pub mcp: bool,

    /// Stealth mode (no git operations, flush only).
    #[arg(long)]
    pub stealth: bool,

    /// Output default content (ignores PRIME.md override).
    #[arg(long)]
    pub export: bool,
}

// ---------------------------------------------------------------------------
// Upgrade
// ---------------------------------------------------------------------------

/// Arguments for `bd upgrade`.
#[derive(Args, Debug)]
pub struct UpgradeArgs {
    #[command(subcommand)]
    pub command: UpgradeCommands,
}

/// Upgrade subcommands.
#[derive(Subcommand, Debug)]
pub enum UpgradeCommands {
    /// Check if bd has been upgraded since last use.
    Status,
    /// Review changes since last bd version.
    Review,
    /// Acknowledge the current bd version.
    Ack,
}

// ---------------------------------------------------------------------------
// Worktree
// ---------------------------------------------------------------------------

/// Arguments for `bd worktree`.
#[derive(Args, Debug)]
pub struct WorktreeArgs {
    #[command(subcommand)]
    pub command: WorktreeCommands,
}

/// Worktree subcommands.
#[derive(Subcommand, Debug)]
pub enum WorktreeCommands {
    /// Create a new worktree with shared beads database.
    Create(WorktreeCreateArgs),
    /// Remove a worktree.
    Remove(WorktreeRemoveArgs),
    /// List all worktrees with beads state.
    List,
    /// Show info about the current worktree.
    Info,
}

/// Arguments for `bd worktree create`.
#[derive(Args, Debug)]
pub struct WorktreeCreateArgs {
    /// Name for the new worktree.
    pub name: Option<String>,

    /// Branch name (defaults to worktree name).
    #[arg(long)]
    pub branch: Option<String>,
}

/// Arguments for `bd worktree remove`.
#[derive(Args, Debug)]
pub struct WorktreeRemoveArgs {
    /// Name of the worktree to remove.
    pub name: String,

    /// Skip safety checks (uncommitted changes, unpushed commits).
    #[arg(long)]
    pub force: bool,
}

// ---------------------------------------------------------------------------
// Daemon / Await / Watch
// ---------------------------------------------------------------------------

/// Arguments for `bd daemon`.
#[derive(Args, Debug)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommands,
}

/// Daemon subcommands.
#[derive(Subcommand, Debug)]
pub enum DaemonCommands {
    /// Start the RPC/SSE daemon in the foreground.
    Run(DaemonRunArgs),
    /// Print the running daemon's address and token path, if any.
    Status,
}

/// Arguments for `bd daemon run`.
#[derive(Args, Debug)]
pub struct DaemonRunArgs {
    /// Host to bind (default: 127.0.0.1).
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Port to bind (default: 0, let the OS choose).
    #[arg(long, default_value_t = 0)]
    pub port: u16,
}

/// Arguments for `bd await`.
#[derive(Args, Debug)]
pub struct AwaitArgs {
    /// Compact matcher string, e.g. `issue=bd-1,type=update`.
    pub matcher: String,

    /// Daemon base URL (default: read from `.beads/daemon.token` sibling).
    #[arg(long)]
    pub daemon_url: Option<String>,

    /// Timeout in seconds before giving up (exit code 1).
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

/// Arguments for `bd watch`.
#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Issue ID of the decision point to wait on.
    pub id: String,

    /// Daemon base URL (default: read from `.beads/daemon.token` sibling).
    #[arg(long)]
    pub daemon_url: Option<String>,

    /// Timeout in seconds before giving up (exit code 1).
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_version() {
        // Verify the parser doesn't panic for basic invocations
        let cli = Cli::try_parse_from(["bd", "version"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn cli_parses_create() {
        let cli = Cli::try_parse_from(["bd", "create", "Test issue"]);
        assert!(cli.is_ok());
        let cli = cli.unwrap();
        match cli.command {
            Some(Commands::Create(args)) => {
                assert_eq!(args.title, Some("Test issue".to_string()));
            }
            _ => panic!("Expected Create command"),
        }
    }

    #[test]
    fn cli_global_flags() {
        let cli = Cli::try_parse_from(["bd", "--json", "--verbose", "list"]);
        assert!(cli.is_ok());
        let cli = cli.unwrap();
        assert!(cli.global.json);
        assert!(cli.global.verbose);
    }

    #[test]
    fn cli_parses_config_set() {
        let cli = Cli::try_parse_from(["bd", "config", "set", "key", "value"]);
        assert!(cli.is_ok());
    }

    #[test]
    fn cli_parses_dep_add() {
        let cli = Cli::try_parse_from(["bd", "dep", "add", "bd-abc", "bd-def"]);
        assert!(cli.is_ok());
    }
}
