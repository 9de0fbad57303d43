//! CLI handlers for `studyplan plan` subcommands.
//!
//! Implements:
//! - `studyplan plan generate --user <email> [--dry-run] [--raw]`
//! - `studyplan plan render <file|-> [--json]`

use std::io::Read;

use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::PgPool;

use studyplan_core::planner::StudyPlanner;
use studyplan_core::prompt::{SYSTEM_INSTRUCTION, build_prompt};
use studyplan_core::render::render;
use studyplan_core::store::{PgStore, SubjectRepository};
use studyplan_core::subject::{Subject, SubjectBatch};

use crate::display::{PLAN_TITLE, print_blocks};
use crate::user_cmds::resolve_user;

// -----------------------------------------------------------------------
// studyplan plan generate
// -----------------------------------------------------------------------

/// Generate a plan from the stored subjects of `user`.
///
/// With `dry_run` the prompt is printed and the model is not called.
pub async fn cmd_generate(
    pool: &PgPool,
    planner: &StudyPlanner,
    user: &str,
    dry_run: bool,
    raw: bool,
) -> Result<()> {
    let user_id = resolve_user(pool, user).await?;
    let store = PgStore::new(pool.clone());
    let subjects: Vec<Subject> = store
        .list_for_user(user_id)
        .await?
        .into_iter()
        .map(|stored| stored.subject)
        .collect();

    let now = Utc::now();
    if dry_run {
        let batch = SubjectBatch::new(subjects)?;
        println!("[system]\n{SYSTEM_INSTRUCTION}\n");
        println!("[user]\n{}", build_prompt(&batch, now));
        return Ok(());
    }

    let plan = planner.generate(subjects, now).await?;
    print_plan(&plan, raw)
}

// -----------------------------------------------------------------------
// studyplan plan render
// -----------------------------------------------------------------------

/// Render plan text from a file (or stdin when `file` is `-`).
pub fn cmd_render(file: &str, json: bool) -> Result<()> {
    let text = if file == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .context("failed to read plan from stdin")?;
        buf
    } else {
        std::fs::read_to_string(file)
            .with_context(|| format!("failed to read plan file: {file}"))?
    };

    if json {
        let blocks = render(&text);
        println!("{}", serde_json::to_string_pretty(&blocks)?);
        return Ok(());
    }
    print_plan(&text, false)
}

fn print_plan(plan: &str, raw: bool) -> Result<()> {
    if raw {
        println!("{plan}");
        return Ok(());
    }
    println!("{PLAN_TITLE}");
    println!();
    print_blocks(&render(plan)).context("failed to write plan")?;
    Ok(())
}
