//! Shared helper functions for CLI commands
//!
//! Opening the project, restoring the session, resolving record references
//! and the interactive prompts used by several command modules.

use std::io::{self, IsTerminal};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use dialoguer::{Confirm, Password};
use miette::{IntoDiagnostic, Result};

use crate::core::directory::Directory;
use crate::core::entity::Entity;
use crate::core::identity::EntityId;
use crate::core::project::Project;
use crate::core::session::{IdentityGate, Session};
use crate::core::shortid::ShortIdIndex;
use crate::core::store::FileStore;
use crate::core::Config;

/// The discovered project with its store and effective configuration
pub struct Workspace {
    pub project: Project,
    pub store: FileStore,
    pub config: Config,
}

impl Workspace {
    pub fn open() -> Result<Self> {
        let project = Project::discover().map_err(|e| miette::miette!("{}", e))?;
        let store = FileStore::open(&project)?;
        Ok(Self {
            project,
            store,
            config: Config::load(),
        })
    }

    /// Restore the signed-in session; fails when nobody is signed in
    pub fn session(&self) -> Result<Session> {
        Ok(IdentityGate::new(&self.project).open(&self.store)?)
    }

    pub fn short_ids(&self) -> ShortIdIndex {
        ShortIdIndex::load(&self.project)
    }

    /// Save the short ID index, warning instead of failing
    pub fn save_short_ids(&self, short_ids: &ShortIdIndex) {
        if let Err(e) = short_ids.save(&self.project) {
            tracing::warn!(error = %e, "failed to save short IDs");
        }
    }
}

/// Resolve a reference to a record in `listing`.
///
/// Accepts a short ID (`BRN@2`), a full ID, or anything `matches` accepts
/// (names, codes, emails).
pub fn resolve_ref<T: Entity>(
    reference: &str,
    listing: &Directory<T>,
    short_ids: &ShortIdIndex,
    kind: &str,
    matches: impl Fn(&T, &str) -> bool,
) -> Result<EntityId> {
    let reference = reference.trim();
    if let Some(id) = short_ids.resolve(reference) {
        if id.prefix() == T::PREFIX && listing.get(&id).is_some() {
            return Ok(id);
        }
    }
    if let Some(item) = listing.iter().find(|item| matches(item, reference)) {
        return Ok(*item.id());
    }
    Err(miette::miette!(
        help = format!("Run 'sawtrack {} list' to see valid references", kind),
        "no {} matches '{}'",
        kind,
        reference
    ))
}

/// Match on the record's title, ignoring case
pub fn title_matches<T: Entity>(item: &T, reference: &str) -> bool {
    item.title().eq_ignore_ascii_case(reference)
}

/// Parse `now`, an RFC 3339 timestamp, `YYYY-MM-DD HH:MM` or `YYYY-MM-DD` (UTC)
pub fn parse_timestamp(s: &str) -> std::result::Result<DateTime<Utc>, String> {
    let s = s.trim();
    if s.eq_ignore_ascii_case("now") {
        return Ok(Utc::now());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M") {
        return Ok(naive.and_utc());
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(naive.and_utc());
        }
    }
    Err(format!(
        "'{}' is not a timestamp (use 'now', YYYY-MM-DD, 'YYYY-MM-DD HH:MM' or RFC 3339)",
        s
    ))
}

/// Format a timestamp for tables and summaries
pub fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

/// Truncate a string to max_len characters, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Use the given password or prompt for one on a terminal.
///
/// With `confirm`, an interactively entered password is asked twice and the
/// second entry is returned as the confirmation.
pub fn password_or_prompt(
    given: Option<String>,
    prompt: &str,
    confirm: bool,
) -> Result<(String, Option<String>)> {
    if let Some(password) = given {
        return Ok((password, None));
    }
    if !io::stdin().is_terminal() {
        return Err(miette::miette!(
            help = "Pass --password or set SAWTRACK_PASSWORD",
            "a password is required"
        ));
    }
    let password = Password::new().with_prompt(prompt).interact().into_diagnostic()?;
    let confirmation = if confirm {
        Some(
            Password::new()
                .with_prompt("Repeat password")
                .interact()
                .into_diagnostic()?,
        )
    } else {
        None
    };
    Ok((password, confirmation))
}

/// Ask for confirmation unless `assume_yes`; non-terminals never confirm
pub fn confirm(question: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    if !io::stdin().is_terminal() {
        return Ok(false);
    }
    Confirm::new()
        .with_prompt(question)
        .default(false)
        .interact()
        .into_diagnostic()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::EntityPrefix;
    use crate::entities::Branch;
    use chrono::TimeZone;

    #[test]
    fn test_parse_timestamp_forms() {
        let expected = Utc.with_ymd_and_hms(2026, 3, 1, 14, 30, 0).unwrap();
        assert_eq!(parse_timestamp("2026-03-01 14:30").unwrap(), expected);
        assert_eq!(parse_timestamp("2026-03-01T14:30:00Z").unwrap(), expected);
        assert_eq!(
            parse_timestamp("2026-03-01").unwrap(),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
        assert!(parse_timestamp("now").is_ok());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
    }

    #[test]
    fn test_resolve_ref() {
        let branch = Branch {
            id: EntityId::new(EntityPrefix::Brn),
            name: "Norte".to_string(),
            address: "Calle 1".to_string(),
            phone: "555".to_string(),
            manager: None,
            created: Utc::now(),
        };
        let listing = Directory::from_items(vec![branch.clone()]);
        let mut short_ids = ShortIdIndex::new();
        short_ids.add(&branch.id);

        let by_alias = resolve_ref("BRN@1", &listing, &short_ids, "branch", title_matches);
        assert_eq!(by_alias.unwrap(), branch.id);
        let by_name = resolve_ref("norte", &listing, &short_ids, "branch", title_matches);
        assert_eq!(by_name.unwrap(), branch.id);
        let by_id = resolve_ref(&branch.id.to_string(), &listing, &short_ids, "branch", title_matches);
        assert_eq!(by_id.unwrap(), branch.id);
        assert!(resolve_ref("Sur", &listing, &short_ids, "branch", title_matches).is_err());
    }
}
