//! Realm Shim CLI
//!
//! The `realm-shim` command tames a fresh realm on the standard host and
//! reports what the permission tree did to it.
//!
//! ## Commands
//!
//! - `audit`: Bootstrap a realm and report deletions, conversions and shared globals
//! - `permits`: Print the permission tree (or its fingerprint)
//! - `check`: Bootstrap a realm and verify a second taming run changes nothing

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, Level};

use realm_shim::telemetry::init_tracing;
use realm_shim::{sanitize, Bootstrap, Host, PermissionTree, SanitizeReport, StandardHost};

#[derive(Parser)]
#[command(name = "realm-shim")]
#[command(version = realm_shim::VERSION)]
#[command(about = "Tame a realm's primordials against a permission tree", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Permission tree file (JSON). The built-in tree is used when omitted.
    #[arg(long, global = true, env = "REALM_SHIM_PERMITS")]
    permits: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Bootstrap a realm and report what taming changed
    Audit {
        /// Tame the current context instead of a fresh one
        #[arg(long)]
        current: bool,

        /// Shim names recorded on the unsafe record (repeatable)
        #[arg(long = "shim")]
        shims: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Print the permission tree in effect
    Permits {
        /// Print only the SHA-256 fingerprint
        #[arg(long)]
        fingerprint_only: bool,
    },

    /// Verify that the permission tree tames the standard host cleanly
    Check,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// What `audit` reports about one bootstrap.
#[derive(Debug, Serialize)]
struct AuditReport {
    generated_at: DateTime<Utc>,
    host: String,
    context: &'static str,
    permits: String,
    shims: Vec<String>,
    shared_globals: Vec<String>,
    sanitize: SanitizeReport,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    init_tracing(cli.json, level);

    let tree = load_tree(cli.permits.as_deref())?;

    match cli.command {
        Commands::Audit {
            current,
            shims,
            format,
        } => cmd_audit(tree, current, shims, format),
        Commands::Permits { fingerprint_only } => cmd_permits(&tree, fingerprint_only),
        Commands::Check => cmd_check(tree),
    }
}

fn load_tree(path: Option<&Path>) -> Result<PermissionTree> {
    match path {
        Some(path) => {
            info!(path = %path.display(), "loading permission tree");
            PermissionTree::from_path(path)
                .with_context(|| format!("Failed to load permission tree from {:?}", path))
        }
        None => Ok(PermissionTree::standard()),
    }
}

fn cmd_audit(
    tree: PermissionTree,
    current: bool,
    shims: Vec<String>,
    format: OutputFormat,
) -> Result<()> {
    let report = build_audit(tree, current, shims)?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
        OutputFormat::Text => println!("{}", render_audit_text(&report)),
    }
    Ok(())
}

fn build_audit(tree: PermissionTree, current: bool, shims: Vec<String>) -> Result<AuditReport> {
    let permits = tree.fingerprint()?;
    let mut bootstrap = Bootstrap::new(StandardHost::new())
        .context("Failed to initialise host")?
        .with_permission_tree(tree);

    let (rec, context) = if current {
        (bootstrap.create_current_unsafe_rec(), "current")
    } else {
        (bootstrap.create_new_unsafe_rec(shims), "new")
    };
    let rec = rec.context("Failed to create realm")?;

    let sanitize = bootstrap.last_report().cloned().unwrap_or_default();
    Ok(AuditReport {
        generated_at: Utc::now(),
        host: bootstrap.host().name().to_string(),
        context,
        permits,
        shims: rec.all_shims().to_vec(),
        shared_globals: rec
            .shared_global_descs()
            .keys()
            .map(ToString::to_string)
            .collect(),
        sanitize,
    })
}

fn render_audit_text(report: &AuditReport) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Realm ({} context) on host '{}'\n",
        report.context, report.host
    ));
    out.push_str(&format!("Generated:  {}\n", report.generated_at.to_rfc3339()));
    out.push_str(&format!("Permits:    {}\n", report.permits));
    if !report.shims.is_empty() {
        out.push_str(&format!("Shims:      {}\n", report.shims.join(", ")));
    }
    out.push_str(&format!(
        "Objects:    {} registered, {} cleaned\n",
        report.sanitize.registered, report.sanitize.cleaned
    ));
    out.push_str(&format!("Kept:       {}\n", report.sanitize.kept));

    out.push_str(&format!("\nDeleted ({}):\n", report.sanitize.deleted.len()));
    for path in &report.sanitize.deleted {
        out.push_str(&format!("  - {}\n", path));
    }
    out.push_str(&format!("\nConverted ({}):\n", report.sanitize.converted.len()));
    for path in &report.sanitize.converted {
        out.push_str(&format!("  ~ {}\n", path));
    }
    out.push_str(&format!(
        "\nShared globals ({}): {}",
        report.shared_globals.len(),
        report.shared_globals.join(" ")
    ));
    out
}

fn cmd_permits(tree: &PermissionTree, fingerprint_only: bool) -> Result<()> {
    if fingerprint_only {
        println!("{}", tree.fingerprint()?);
    } else {
        println!("{}", tree.to_json_pretty()?);
    }
    Ok(())
}

fn cmd_check(tree: PermissionTree) -> Result<()> {
    let second = run_check(tree)?;
    println!(
        "OK: {} objects tamed, second pass kept {} properties unchanged",
        second.cleaned, second.kept
    );
    Ok(())
}

/// Bootstrap a fresh realm, then tame its global again. The second run must
/// be a no-op.
fn run_check(tree: PermissionTree) -> Result<SanitizeReport> {
    let mut bootstrap = Bootstrap::new(StandardHost::new())
        .context("Failed to initialise host")?
        .with_permission_tree(tree.clone());
    let rec = bootstrap
        .create_new_unsafe_rec(Vec::new())
        .context("Failed to create realm")?;

    let second = sanitize(bootstrap.host_mut().heap_mut(), rec.unsafe_global(), &tree)
        .context("Second taming pass failed")?;
    if !second.is_noop() {
        bail!(
            "Taming is not idempotent: {} deletions and {} conversions on the second pass",
            second.deleted.len(),
            second.converted.len()
        );
    }
    Ok(second)
}

#[cfg(test)]
mod tests {
    use super::*;
    use realm_shim::{Permit, PermitTable};

    #[test]
    fn test_build_audit_reports_new_realm() {
        let report = build_audit(PermissionTree::standard(), false, vec!["a".into()]).unwrap();

        assert_eq!(report.context, "new");
        assert_eq!(report.host, "standard");
        assert_eq!(report.shims, vec!["a".to_string()]);
        assert!(report.shared_globals.iter().any(|name| name == "Array"));
        assert!(report.sanitize.deleted.iter().any(|path| path == "eval"));
        assert_eq!(report.permits, PermissionTree::standard().fingerprint().unwrap());
    }

    #[test]
    fn test_build_audit_current_ignores_shims() {
        let report = build_audit(PermissionTree::standard(), true, vec!["a".into()]).unwrap();
        assert_eq!(report.context, "current");
        assert!(report.shims.is_empty());
    }

    #[test]
    fn test_audit_json_has_timestamp_and_counts() {
        let report = build_audit(PermissionTree::standard(), false, Vec::new()).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        let generated = json["generated_at"].as_str().unwrap();
        assert!(DateTime::parse_from_rfc3339(generated).is_ok());
        assert!(json["sanitize"]["registered"].as_u64().unwrap() > 0);
        assert!(json["shared_globals"].as_array().unwrap().len() > 10);
    }

    #[test]
    fn test_render_audit_text_lists_changes() {
        let report = build_audit(PermissionTree::standard(), false, vec!["x".into()]).unwrap();
        let text = render_audit_text(&report);

        assert!(text.starts_with("Realm (new context) on host 'standard'"));
        assert!(text.contains("Shims:      x"));
        assert!(text.contains("  - Array.prototype.flat\n"));
        assert!(text.contains("  ~ Object.prototype.toString\n"));
    }

    #[test]
    fn test_run_check_passes_on_standard_tree() {
        let second = run_check(PermissionTree::standard()).unwrap();
        assert!(second.is_noop());
    }

    #[test]
    fn test_run_check_surfaces_taming_errors() {
        let broken = PermissionTree::new(PermitTable::new().with("Array", Permit::KeepData));
        let err = run_check(broken).unwrap_err();
        assert!(format!("{:#}", err).contains("unexpected intrinsic"));
    }

    #[test]
    fn test_load_tree_from_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("permits.json");
        std::fs::write(&path, r#"{"NaN": "keep_data"}"#).unwrap();

        let tree = load_tree(Some(&path)).unwrap();
        assert_eq!(tree.top_level_names().len(), 1);
        assert_eq!(load_tree(None).unwrap(), PermissionTree::standard());
    }

    #[test]
    fn test_load_tree_reports_path_on_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("broken.json");
        std::fs::write(&path, "{ not json").unwrap();

        let err = load_tree(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }

    #[test]
    fn test_cli_parses_audit_flags() {
        let cli = Cli::try_parse_from([
            "realm-shim",
            "audit",
            "--shim",
            "one",
            "--shim",
            "two",
            "--format",
            "json",
        ])
        .unwrap();
        match cli.command {
            Commands::Audit {
                current,
                shims,
                format,
            } => {
                assert!(!current);
                assert_eq!(shims, vec!["one", "two"]);
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("expected audit"),
        }
    }
}
