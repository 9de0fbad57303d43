//! Prompt construction for study-plan generation.
//!
//! Turns a [`SubjectBatch`] and the current instant into the instruction text
//! sent to the model. Pure: no I/O, no clock reads, no randomness. The same
//! batch and the same `now` always produce byte-identical output.

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use crate::subject::{Subject, SubjectBatch};

/// System message that fixes the model's output language.
pub const SYSTEM_INSTRUCTION: &str =
    "Ты дружелюбный помощник для студентов. Отвечай на русском языке.";

const DAY_MS: i64 = 86_400_000;

const WEEKDAYS: [&str; 7] = [
    "понедельник",
    "вторник",
    "среда",
    "четверг",
    "пятница",
    "суббота",
    "воскресенье",
];

// Genitive case, as used after a day number.
const MONTHS: [&str; 12] = [
    "января",
    "февраля",
    "марта",
    "апреля",
    "мая",
    "июня",
    "июля",
    "августа",
    "сентября",
    "октября",
    "ноября",
    "декабря",
];

const REQUIRED_SECTIONS: &str = "\
1. **ЧТО УЧИТЬ СЕГОДНЯ** - конкретные задачи на сегодня (2-3 пункта)
2. **НЕДЕЛЬНЫЙ ПЛАН** - распределение предметов по дням недели
3. **СОВЕТЫ** - краткие рекомендации по эффективной подготовке";

/// Build the full user prompt for a batch of subjects.
pub fn build_prompt(subjects: &SubjectBatch, now: DateTime<Utc>) -> String {
    let today = format_long_date(now.date_naive());
    let subject_lines = subjects
        .iter()
        .map(|s| subject_line(s, now))
        .collect::<Vec<_>>()
        .join("\n");

    let mut prompt = String::with_capacity(512 + subject_lines.len());
    prompt.push_str(&format!(
        "Ты опытный репетитор и планировщик учебы. Сегодня {today}.\n\n"
    ));
    prompt.push_str("У студента следующие предметы и дедлайны:\n");
    prompt.push_str(&subject_lines);
    prompt.push_str("\n\n");
    prompt.push_str("Создай подробный персональный учебный план. Ответ должен включать:\n\n");
    prompt.push_str(REQUIRED_SECTIONS);
    prompt.push_str("\n\n");
    prompt.push_str(
        "Формат ответа: используй markdown с эмодзи для наглядности. \
         Будь конкретным и практичным.",
    );
    prompt
}

/// One bullet line describing a subject.
pub fn subject_line(subject: &Subject, now: DateTime<Utc>) -> String {
    format!(
        "- {}: дедлайн {}, осталось {} дней, приоритет: {}",
        subject.name(),
        format_short_date(subject.deadline()),
        days_left(subject.deadline(), now),
        subject.priority(),
    )
}

/// Whole days from `now` until the start (00:00 UTC) of `deadline`, rounded
/// up. Zero when due today, negative once overdue.
pub fn days_left(deadline: NaiveDate, now: DateTime<Utc>) -> i64 {
    let due = deadline.and_time(NaiveTime::MIN).and_utc();
    let remaining_ms = (due - now).num_milliseconds();
    remaining_ms.div_euclid(DAY_MS) + i64::from(remaining_ms.rem_euclid(DAY_MS) != 0)
}

/// `DD.MM.YYYY`.
pub fn format_short_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

/// Long Russian form, e.g. `пятница, 16 октября 2026 г.`.
pub fn format_long_date(date: NaiveDate) -> String {
    let weekday = WEEKDAYS[date.weekday().num_days_from_monday() as usize];
    let month = MONTHS[date.month0() as usize];
    format!("{weekday}, {} {month} {} г.", date.day(), date.year())
}
