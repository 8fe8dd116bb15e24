//! `sawtrack validate` command - Check stored records against schemas and each other

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use console::style;
use miette::Result;

use crate::cli::helpers::Workspace;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::store::{DocumentStore, FileStore};
use crate::entities::{Blade, BladeType, Branch, SharpeningEvent, User};

#[derive(clap::Args, Debug)]
pub struct ValidateArgs {
    /// Only check one collection (BLD, SHP, BRN, BTY or USR)
    #[arg(long, short = 't')]
    pub entity_type: Option<EntityPrefix>,

    /// Show summary only, don't show individual errors
    #[arg(long)]
    pub summary: bool,
}

/// Validation statistics
#[derive(Default)]
struct ValidationStats {
    files_checked: usize,
    files_passed: usize,
    files_failed: usize,
    reference_errors: usize,
    warnings: usize,
}

pub fn run(args: ValidateArgs) -> Result<()> {
    let ws = Workspace::open()?;
    let mut stats = ValidationStats::default();

    let prefixes: Vec<EntityPrefix> = match args.entity_type {
        Some(prefix) => vec![prefix],
        None => EntityPrefix::all().to_vec(),
    };

    println!("{} Validating {} collection(s)...\n", style("→").blue(), prefixes.len());

    for prefix in &prefixes {
        for path in ws.store.document_paths(*prefix) {
            stats.files_checked += 1;
            match check_document(&ws.store, *prefix, &path) {
                Ok(()) => {
                    stats.files_passed += 1;
                    if !args.summary {
                        println!("{} {}", style("✓").green(), path.display());
                    }
                }
                Err(report) => {
                    stats.files_failed += 1;
                    if !args.summary {
                        println!("{} {}", style("✗").red(), path.display());
                        println!("{:?}", report);
                    }
                }
            }
        }
    }

    if stats.files_failed == 0 && args.entity_type.is_none() {
        let issues = check_references(&ws.store)?;
        for issue in &issues {
            match issue.severity {
                Severity::Error => stats.reference_errors += 1,
                Severity::Warning => stats.warnings += 1,
            }
            if !args.summary {
                let marker = match issue.severity {
                    Severity::Error => style("✗").red(),
                    Severity::Warning => style("!").yellow(),
                };
                println!("{} {}", marker, issue.message);
            }
        }
    } else if stats.files_failed > 0 {
        println!(
            "\n{} Reference checks skipped until the files above are fixed",
            style("!").yellow()
        );
    }

    println!();
    println!("{}", style("─".repeat(60)).dim());
    println!("{}", style("Validation Summary").bold());
    println!("{}", style("─".repeat(60)).dim());
    println!("  Files checked:    {}", style(stats.files_checked).cyan());
    println!("  Files passed:     {}", style(stats.files_passed).green());
    println!("  Files failed:     {}", style(stats.files_failed).red());
    println!("  Reference errors: {}", style(stats.reference_errors).red());
    if stats.warnings > 0 {
        println!("  Warnings:         {}", style(stats.warnings).yellow());
    }
    println!();

    let failures = stats.files_failed + stats.reference_errors;
    if failures > 0 {
        return Err(miette::miette!("Validation failed: {} problem(s) found", failures));
    }
    println!("{} All records passed validation!", style("✓").green().bold());
    Ok(())
}

/// Schema check plus the file name matching the record ID
fn check_document(store: &FileStore, prefix: EntityPrefix, path: &Path) -> Result<()> {
    let value = store.read_value(prefix, path)?;
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let id = value.get("id").and_then(|v| v.as_str()).unwrap_or_default();
    if id != stem {
        return Err(miette::miette!(
            help = "Rename the file to <ID>.yaml",
            "record id '{}' does not match file name '{}'",
            id,
            stem
        ));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone)]
struct Issue {
    severity: Severity,
    message: String,
}

impl Issue {
    fn error(message: String) -> Self {
        Self {
            severity: Severity::Error,
            message,
        }
    }

    fn warning(message: String) -> Self {
        Self {
            severity: Severity::Warning,
            message,
        }
    }
}

/// Cross-record checks: dangling references, duplicate codes, admin coverage
fn check_references<S: DocumentStore>(store: &S) -> Result<Vec<Issue>> {
    let blades: Vec<Blade> = store.fetch_all()?;
    let events: Vec<SharpeningEvent> = store.fetch_all()?;
    let branches: Vec<Branch> = store.fetch_all()?;
    let types: Vec<BladeType> = store.fetch_all()?;
    let users: Vec<User> = store.fetch_all()?;
    Ok(find_issues(&blades, &events, &branches, &types, &users))
}

fn find_issues(
    blades: &[Blade],
    events: &[SharpeningEvent],
    branches: &[Branch],
    types: &[BladeType],
    users: &[User],
) -> Vec<Issue> {
    let branch_ids: HashSet<EntityId> = branches.iter().map(|b| b.id).collect();
    let type_ids: HashSet<EntityId> = types.iter().map(|t| t.id).collect();
    let blade_ids: HashSet<EntityId> = blades.iter().map(|b| b.id).collect();
    let mut issues = Vec::new();

    let mut by_code: BTreeMap<&str, Vec<EntityId>> = BTreeMap::new();
    for blade in blades {
        by_code.entry(blade.code.as_str()).or_default().push(blade.id);
        if !branch_ids.contains(&blade.branch) {
            issues.push(Issue::error(format!(
                "blade {} references missing branch {}",
                blade.code, blade.branch
            )));
        }
        if !type_ids.contains(&blade.blade_type) {
            issues.push(Issue::error(format!(
                "blade {} references missing blade type {}",
                blade.code, blade.blade_type
            )));
        }
        if blade.terminal_sharpening_done != blade.terminal_sharpening_date.is_some() {
            issues.push(Issue::warning(format!(
                "blade {} has an inconsistent terminal flag and date",
                blade.code
            )));
        }
    }
    for (code, ids) in by_code.iter().filter(|(_, ids)| ids.len() > 1) {
        let ids: Vec<String> = ids.iter().map(ToString::to_string).collect();
        issues.push(Issue::error(format!(
            "code {} is shared by {} blades: {}",
            code,
            ids.len(),
            ids.join(", ")
        )));
    }

    for event in events {
        if !blade_ids.contains(&event.blade) {
            issues.push(Issue::error(format!(
                "sharpening {} references missing blade {}",
                event.id, event.blade
            )));
        }
        if !branch_ids.contains(&event.branch) {
            issues.push(Issue::warning(format!(
                "sharpening {} references missing branch {}",
                event.id, event.branch
            )));
        }
    }

    for user in users {
        if !branch_ids.contains(&user.branch) {
            issues.push(Issue::error(format!(
                "user {} references missing branch {}",
                user.email, user.branch
            )));
        }
    }
    if !users.is_empty() && !users.iter().any(|u| u.is_admin() && u.active) {
        issues.push(Issue::warning("no active administrator".to_string()));
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn branch() -> Branch {
        Branch {
            id: EntityId::new(EntityPrefix::Brn),
            name: "Centro".to_string(),
            address: "Av. 1".to_string(),
            phone: "555".to_string(),
            manager: None,
            created: Utc::now(),
        }
    }

    fn blade_type() -> BladeType {
        BladeType {
            id: EntityId::new(EntityPrefix::Bty),
            code: "CIR".to_string(),
            name: "Circular".to_string(),
            active: true,
            description: None,
            created: Utc::now(),
        }
    }

    #[test]
    fn test_clean_records_have_no_issues() {
        let b = branch();
        let t = blade_type();
        let blade = Blade::new("SN-1", b.id, t.id);
        assert!(find_issues(&[blade], &[], &[b], &[t], &[]).is_empty());
    }

    #[test]
    fn test_duplicate_codes_and_dangling_refs() {
        let b = branch();
        let t = blade_type();
        let first = Blade::new("SN-1", b.id, t.id);
        let second = Blade::new("SN-1", b.id, EntityId::new(EntityPrefix::Bty));

        let issues = find_issues(&[first, second], &[], &[b], &[t], &[]);
        let errors: Vec<&Issue> = issues.iter().filter(|i| i.severity == Severity::Error).collect();
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|i| i.message.contains("missing blade type")));
        assert!(errors.iter().any(|i| i.message.contains("shared by 2 blades")));
    }

    #[test]
    fn test_orphan_sharpening() {
        let b = branch();
        let t = blade_type();
        let blade = Blade::new("SN-1", b.id, t.id);
        let event = SharpeningEvent::for_blade(&blade, crate::entities::SharpeningKind::Edge, Utc::now());

        let issues = find_issues(&[], &[event], &[b], &[t], &[]);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("missing blade"));
    }
}
