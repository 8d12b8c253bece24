use anyhow::{Context, Result, anyhow, bail};
use colored::Colorize;
use lam_core::controllers::upload::IssueDraft;
use lam_core::{
    FloorLevel, IssueRepository, JsonFile, ListQuery, ModerationAction, RankingRecord,
    RankingService, RecordStatus, format_hms, mapping_for, normalize_persona_name, sinner_by_id,
    sinner_by_name, sinners::parse_sinner_id,
};
use log::debug;
use std::io::Write;

use crate::{Args, Command, KindArg};

pub fn run(args: &Args, out: &mut impl Write) -> Result<()> {
    match &args.command {
        Command::List {
            sinner,
            floor,
            sort,
            desc,
            page,
            limit,
        } => {
            let page_arg = page.to_string();
            let limit_arg = limit.to_string();
            let query = ListQuery::from_params(
                sinner.as_deref(),
                floor.as_deref(),
                Some(sort),
                Some(if *desc { "desc" } else { "asc" }),
                Some(&page_arg),
                Some(&limit_arg),
                None,
            )?;
            let result = open(args)?.list(&query)?;
            let p = result.pagination;
            writeln!(
                out,
                "{}",
                format!(
                    "🏆 Approved records: {} (page {}/{})",
                    p.total,
                    p.page,
                    p.total_pages.max(1)
                )
                .bright_cyan()
                .bold()
            )?;
            print_records(out, &result.records)?;
        }
        Command::Pending => {
            let records = open(args)?.pending()?;
            writeln!(out, "{}", format!("⏳ Pending: {}", records.len()).yellow().bold())?;
            print_records(out, &records)?;
        }
        Command::Show { id } => {
            let record = open(args)?.get(*id)?;
            writeln!(out, "{}", serde_json::to_string_pretty(&record)?)?;
        }
        Command::Approve { id } => moderate(args, out, *id, ModerationAction::Approve)?,
        Command::Reject { id } => moderate(args, out, *id, ModerationAction::Reject)?,
        Command::Delete { id } => {
            let removed = open(args)?.delete(*id)?;
            writeln!(
                out,
                "{} #{} ({} / {})",
                "🗑️  Deleted".red(),
                removed.id,
                removed.username,
                removed.persona
            )?;
        }
        Command::Normalize { sinner_id, name } => {
            writeln!(out, "{}", normalize_persona_name(sinner_id, name))?;
        }
        Command::Aliases { sinner } => {
            let sinner = resolve_sinner(sinner)?;
            writeln!(out, "{}", format!("{} ({})", sinner.name, sinner.english_name).bold())?;
            for (template, canonical) in mapping_for(sinner.id) {
                writeln!(out, "  {template} → {}", canonical.green())?;
            }
        }
        Command::Floors => {
            writeln!(out, "{}", FloorLevel::labels().collect::<Vec<_>>().join(" "))?;
        }
        Command::IssueUrl {
            kind,
            sinner,
            persona,
            floor,
            time,
            ego,
            note,
        } => {
            let sinner = resolve_sinner(sinner)?;
            let floor_level = floor.parse::<FloorLevel>()?;
            let draft = IssueDraft {
                kind: match kind {
                    KindArg::Full => lam_core::UploadKind::Full,
                    KindArg::FloorOnly => lam_core::UploadKind::FloorOnly,
                },
                sinner: sinner.name.to_string(),
                persona: normalize_persona_name(&sinner.id.to_string(), persona),
                time: *time,
                floor_level: Some(floor_level),
                used_ego: *ego,
                note: note.clone(),
            };
            let url = draft.issue_url(&IssueRepository::default())?;
            writeln!(out, "{url}")?;
        }
    }
    Ok(())
}

fn open(args: &Args) -> Result<RankingService<JsonFile>> {
    let file = JsonFile::new(&args.db);
    if !file.path().exists() {
        bail!("no leaderboard store at {}", file.path().display());
    }
    debug!("Opened leaderboard store at {}", file.path().display());
    Ok(RankingService::new(file))
}

fn moderate(args: &Args, out: &mut impl Write, id: u64, action: ModerationAction) -> Result<()> {
    let record = open(args)?
        .moderate(id, action)
        .with_context(|| format!("moderating record #{id}"))?;
    let verdict = match record.status {
        RecordStatus::Approved => "✅ Approved".green(),
        _ => "❌ Rejected".red(),
    };
    writeln!(out, "{verdict} #{} ({} / {})", record.id, record.username, record.persona)?;
    Ok(())
}

fn resolve_sinner(raw: &str) -> Result<&'static lam_core::Sinner> {
    parse_sinner_id(raw)
        .and_then(sinner_by_id)
        .or_else(|| sinner_by_name(raw))
        .ok_or_else(|| anyhow!("unknown sinner '{raw}'"))
}

fn print_records(out: &mut impl Write, records: &[RankingRecord]) -> Result<()> {
    for r in records {
        writeln!(
            out,
            "  #{:<4} {:<16} {:<10} {:<24} {:>5} {}  {}",
            r.id,
            r.username,
            r.sinner,
            r.persona,
            r.floor_level.label(),
            format_hms(r.time),
            r.created_at.format("%Y-%m-%d %H:%M").to_string().dimmed()
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use lam_core::{RankingStorage, Submission};
    use serde_json::json;

    fn seeded_store(dir: &tempfile::TempDir) -> std::path::PathBuf {
        let path = dir.path().join("rankings.json");
        let mut service = RankingService::new(JsonFile::new(&path));
        for (user, time) in [("a", 8000), ("b", 7400)] {
            let submission: Submission = serde_json::from_value(json!({
                "username": user,
                "sinner": "Faust",
                "persona": "LCB罪人",
                "time": time,
                "floorLevel": "5-1",
            }))
            .unwrap();
            service.submit(submission).unwrap();
        }
        path
    }

    fn exec(argv: &[&str]) -> Result<String> {
        colored::control::set_override(false);
        let args = Args::try_parse_from(argv)?;
        let mut out = Vec::new();
        run(&args, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn approve_then_list() {
        let dir = tempfile::tempdir().unwrap();
        let db = seeded_store(&dir);
        let db = db.to_str().unwrap();

        let pending = exec(&["lam-admin", "--db", db, "pending"]).unwrap();
        assert!(pending.contains("Pending: 2"));

        exec(&["lam-admin", "--db", db, "approve", "2"]).unwrap();
        let listed = exec(&["lam-admin", "--db", db, "list"]).unwrap();
        assert!(listed.contains("Approved records: 1"));
        assert!(listed.contains("02:03:20"));

        assert!(exec(&["lam-admin", "--db", db, "reject", "2"]).is_err());
        let doc = RankingStorage::load(&JsonFile::new(db)).unwrap();
        assert_eq!(doc.rankings[1].status, RecordStatus::Approved);
    }

    #[test]
    fn missing_store_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join("nope.json");
        assert!(exec(&["lam-admin", "--db", db.to_str().unwrap(), "pending"]).is_err());
    }

    #[test]
    fn issue_url_normalizes_persona() {
        let out = exec(&[
            "lam-admin",
            "issue-url",
            "--kind",
            "floor-only",
            "--sinner",
            "Ishmael",
            "--persona",
            "六协会南部4科(以实玛利)",
            "--floor",
            "12",
        ])
        .unwrap();
        assert!(out.starts_with(
            "https://github.com/Jhh003/lam/issues/new?template=submit-floor-only.yml"
        ));
        assert!(out.contains("&floor=12"));
        assert!(!out.contains("%28"));
    }

    #[test]
    fn short_full_runs_are_refused() {
        let err = exec(&[
            "lam-admin", "issue-url", "--sinner", "2", "--persona", "LCB罪人", "--floor", "3",
            "--time", "60",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn help_warns_against_moderating_a_live_store() {
        use clap::CommandFactory;
        let help = Args::command().render_long_help().to_string();
        assert!(help.contains("lam-server is stopped"));
    }

    #[test]
    fn normalize_prints_canonical_name() {
        let out = exec(&["lam-admin", "normalize", "9", "新人格(罗佳)"]).unwrap();
        assert_eq!(out.trim(), "新人格");
        let out = exec(&["lam-admin", "normalize", "99", "新人格(罗佳)"]).unwrap();
        assert_eq!(out.trim(), "新人格(罗佳)");
    }
}
