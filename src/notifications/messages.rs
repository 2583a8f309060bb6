//! Slack message builders
//!
//! All user-facing text is Korean. Timestamps are rendered in the clock's
//! offset and labelled `KST` when that offset is UTC+9.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate};
use serde_json::{json, Value};

use super::SlackMessage;
use crate::calendar::{weekday_label, DayKind};
use crate::clock::KST_OFFSET_SECS;
use crate::roster::Responder;
use crate::storage::Assignment;
use crate::swap::{CommandError, SwapCommand, SwapError, SwapOutcome};

const SWAP_FAILURE_PREFIX: &str = "⚠️ 온콜 일정 변경에 실패했습니다.";

/// Empty-list reply for the schedule command
pub const EMPTY_SCHEDULE_TEXT: &str = "📅 향후 30일간 예정된 온콜 스케줄이 없습니다.";

/// Render a timestamp as `YYYY-MM-DD HH:MM:SS KST`
pub fn timestamp(at: DateTime<FixedOffset>) -> String {
    if at.offset().local_minus_utc() == KST_OFFSET_SECS {
        at.format("%Y-%m-%d %H:%M:%S KST").to_string()
    } else {
        at.format("%Y-%m-%d %H:%M:%S UTC%:z").to_string()
    }
}

fn date_with_weekday(date: NaiveDate) -> String {
    format!("{} ({})", date, weekday_label(date.weekday()))
}

fn header(text: &str) -> Value {
    json!({
        "type": "header",
        "text": { "type": "plain_text", "text": text, "emoji": true }
    })
}

fn divider() -> Value {
    json!({ "type": "divider" })
}

fn section(markdown: impl Into<String>) -> Value {
    json!({
        "type": "section",
        "text": { "type": "mrkdwn", "text": markdown.into() }
    })
}

fn context(markdown: impl Into<String>) -> Value {
    json!({
        "type": "context",
        "elements": [{ "type": "mrkdwn", "text": markdown.into() }]
    })
}

// ============================================================================
// Swap
// ============================================================================

/// Immediate reply for a malformed swap command
pub fn usage_error(error: &CommandError) -> SlackMessage {
    SlackMessage::in_channel(format!("{SWAP_FAILURE_PREFIX}\n\n{}", error.korean_desc()))
}

/// Immediate acknowledgment while the swap runs in the background
pub fn swap_in_progress(command: &SwapCommand) -> SlackMessage {
    SlackMessage::ephemeral(format!(
        "⏳ *{}*와 *{}*의 온콜 일정을 변경하고 있습니다...",
        command.first, command.second
    ))
}

/// Final result of a completed swap
pub fn swap_success(outcome: &SwapOutcome, at: DateTime<FixedOffset>) -> SlackMessage {
    let first = outcome.first_name();
    let second = outcome.second_name();

    let blocks = vec![
        header("✅ 온콜 일정이 변경되었습니다"),
        divider(),
        section(format!("*{first}*와 *{second}*의 일정이 교체되었습니다.")),
        json!({
            "type": "section",
            "fields": [
                {
                    "type": "mrkdwn",
                    "text": format!(
                        "*{}*\n{} → *{}*",
                        date_with_weekday(outcome.first.date), first, second
                    )
                },
                {
                    "type": "mrkdwn",
                    "text": format!(
                        "*{}*\n{} → *{}*",
                        date_with_weekday(outcome.second.date), second, first
                    )
                }
            ]
        }),
        divider(),
        context(format!("_변경 시각: {}_", timestamp(at))),
    ];

    SlackMessage::blocks(blocks).with_text(format!(
        "✅ {first} ({}) ↔ {second} ({}) 온콜 일정이 변경되었습니다",
        outcome.first.date, outcome.second.date
    ))
}

/// Final result of a failed swap
///
/// Lookup misses are explained verbatim; store failures get a generic line.
pub fn swap_failure(error: &SwapError) -> SlackMessage {
    SlackMessage::in_channel(format!("{SWAP_FAILURE_PREFIX}\n\n{}", error.korean_desc()))
}

/// Reply for an unexpected handler error
pub fn internal_error(detail: &str) -> SlackMessage {
    SlackMessage::ephemeral(format!("⚠️ 오류가 발생했습니다: {detail}"))
}

// ============================================================================
// Schedule List
// ============================================================================

/// Upcoming assignments grouped under month headers
pub fn schedule_list(assignments: &[Assignment], at: DateTime<FixedOffset>) -> SlackMessage {
    if assignments.is_empty() {
        return SlackMessage::in_channel(EMPTY_SCHEDULE_TEXT);
    }

    let mut blocks = vec![header("📅 온콜 스케줄 (향후 30일)"), divider()];
    let mut current_month = None;

    for assignment in assignments {
        let date = assignment.date;
        let month = (date.year(), date.month());

        if current_month != Some(month) {
            current_month = Some(month);
            blocks.push(section(format!("*{}년 {:02}월*", date.year(), date.month())));
        }

        blocks.push(section(format!(
            "• `{:02}월 {:02}일 ({})` - {}",
            date.month(),
            date.day(),
            weekday_label(date.weekday()),
            assignment.responder
        )));
    }

    blocks.push(divider());
    blocks.push(context(format!("_마지막 업데이트: {}_", timestamp(at))));

    SlackMessage::blocks(blocks).with_text("📅 온콜 스케줄 (향후 30일)")
}

// ============================================================================
// Reminder
// ============================================================================

/// Weekend/holiday reminder mentioning today's responder
pub fn reminder(date: NaiveDate, kind: DayKind, responder: &Responder) -> SlackMessage {
    let line = format!(
        "({} {}) 온콜 담당자 : {} / 연락처 : {}",
        date,
        kind.korean_label(),
        responder.mention(),
        responder.phone
    );

    SlackMessage::blocks(vec![header("🚨 On-Call 알리미 🚨"), section(line.clone())])
        .with_text(format!("🚨 *On-Call 알리미* 🚨\n{line}"))
}

/// Channel topic naming the current responder
pub fn oncall_topic(responder: &Responder) -> String {
    format!("현재 온콜 담당자: {} ({})", responder.name, responder.phone)
}
