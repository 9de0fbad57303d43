//! CLI handlers for `studyplan subject` subcommands.
//!
//! Implements:
//! - `studyplan subject --user <email> add <name> --deadline <date> [--priority p]`
//! - `studyplan subject --user <email> list`
//! - `studyplan subject --user <email> delete <id>`

use anyhow::{Context, Result, bail};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use studyplan_core::prompt::{days_left, format_short_date};
use studyplan_core::store::{PgStore, SubjectRepository};
use studyplan_core::subject::{Priority, StoredSubject, Subject, parse_deadline};

use crate::SubjectCommands;
use crate::user_cmds::resolve_user;

/// Days-left threshold at or below which a subject is shown as urgent.
const URGENT_DAYS: i64 = 3;

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

pub async fn run_subject_command(command: SubjectCommands, user: &str, pool: &PgPool) -> Result<()> {
    let user_id = resolve_user(pool, user).await?;
    let store = PgStore::new(pool.clone());

    match command {
        SubjectCommands::Add {
            name,
            deadline,
            priority,
        } => cmd_add(&store, user_id, &name, &deadline, &priority).await,
        SubjectCommands::List => cmd_list(&store, user_id).await,
        SubjectCommands::Delete { id } => cmd_delete(&store, user_id, &id).await,
    }
}

// -----------------------------------------------------------------------
// Handlers
// -----------------------------------------------------------------------

async fn cmd_add(
    store: &dyn SubjectRepository,
    user_id: Uuid,
    name: &str,
    deadline: &str,
    priority: &str,
) -> Result<()> {
    let deadline = parse_deadline(deadline)
        .with_context(|| format!("invalid deadline {deadline:?} (expected YYYY-MM-DD)"))?;
    let priority: Priority = priority.parse()?;
    let subject = Subject::new(name, deadline, priority)?;

    let stored = store.insert(user_id, &subject).await?;
    println!("Subject added: {}", stored.id);
    println!("  {}", subject_summary(&stored, days_left(deadline, Utc::now())));
    Ok(())
}

async fn cmd_list(store: &dyn SubjectRepository, user_id: Uuid) -> Result<()> {
    let subjects = store.list_for_user(user_id).await?;
    if subjects.is_empty() {
        println!("Нет предметов");
        return Ok(());
    }

    let now = Utc::now();
    println!("Ваши предметы ({})", subjects.len());
    for stored in &subjects {
        let days = days_left(stored.subject.deadline(), now);
        let marker = if is_urgent(days) { "!" } else { " " };
        println!("{marker} {}  {}", stored.id, subject_summary(stored, days));
    }
    Ok(())
}

async fn cmd_delete(store: &dyn SubjectRepository, user_id: Uuid, id: &str) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("invalid subject ID: {id}"))?;
    if !store.delete(user_id, id).await? {
        bail!("subject {id} not found");
    }
    println!("Предмет удалён");
    Ok(())
}

// -----------------------------------------------------------------------
// Formatting
// -----------------------------------------------------------------------

fn subject_summary(stored: &StoredSubject, days: i64) -> String {
    let subject = &stored.subject;
    format!(
        "{} [{}] {} ({})",
        subject.name(),
        subject.priority().label(),
        format_short_date(subject.deadline()),
        days_label(days),
    )
}

fn days_label(days: i64) -> String {
    if days > 0 {
        format!("{days} дн.")
    } else {
        "Сегодня!".to_string()
    }
}

fn is_urgent(days: i64) -> bool {
    days <= URGENT_DAYS
}
