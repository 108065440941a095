//! Capture throttle.
//!
//! Decides whether a save should surface a capture prompt. The rules are
//! checked in order and the first match wins:
//!
//! 1. A forced (manual) capture always prompts.
//! 2. Auto prompts disabled: suppress.
//! 3. Never prompted before: prompt.
//! 4. Stored prompt time unreadable: prompt (fail open).
//! 5. Fewer than `skip_threshold_minutes` since the last prompt: suppress.
//! 6. Otherwise prompt.
//!
//! Whenever the answer is prompt, the current time is written back as the
//! new `last_prompt_time` straight away, before any note is collected. A
//! burst of saves therefore prompts once even if every prompt is dismissed.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone};
use serde::Serialize;

use crate::config::{SettingsStore, LAST_PROMPT_TIME};
use crate::storage::{StoreError, TIMESTAMP_FORMAT};

/// Format used to store `last_prompt_time` (local time with offset).
pub const PROMPT_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S %z";

/// Outcome of a capture event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    /// Show the capture prompt.
    Prompt,
    /// Skip silently.
    Suppress,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Prompt => write!(f, "prompt"),
            Decision::Suppress => write!(f, "suppress"),
        }
    }
}

/// Which rule produced a decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "rule")]
pub enum Reason {
    Forced,
    AutoPromptsDisabled,
    NeverPrompted,
    UnreadableLastPrompt,
    WithinThreshold { elapsed_minutes: f64, threshold_minutes: f64 },
    ThresholdElapsed { elapsed_minutes: f64, threshold_minutes: f64 },
}

/// A decision together with the rule that made it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Evaluation {
    pub decision: Decision,
    pub reason: Reason,
}

impl Evaluation {
    fn new(decision: Decision, reason: Reason) -> Self {
        Self { decision, reason }
    }

    pub fn should_prompt(&self) -> bool {
        self.decision == Decision::Prompt
    }
}

/// Applies the rules without touching the settings.
pub fn decide(settings: &SettingsStore, forced: bool, now: DateTime<Local>) -> Evaluation {
    if forced {
        return Evaluation::new(Decision::Prompt, Reason::Forced);
    }
    if settings.disable_auto_prompts() {
        return Evaluation::new(Decision::Suppress, Reason::AutoPromptsDisabled);
    }
    let Some(stored) = settings.last_prompt_time() else {
        return Evaluation::new(Decision::Prompt, Reason::NeverPrompted);
    };
    let Some(last) = parse_prompt_time(&stored) else {
        tracing::warn!(value = %stored, "Could not parse {}; prompting anyway", LAST_PROMPT_TIME);
        return Evaluation::new(Decision::Prompt, Reason::UnreadableLastPrompt);
    };

    let elapsed = now.signed_duration_since(last.with_timezone(&Local));
    let elapsed_minutes = elapsed.num_milliseconds() as f64 / 60_000.0;
    let threshold_minutes = settings.skip_threshold_minutes();

    if elapsed_minutes < threshold_minutes {
        Evaluation::new(
            Decision::Suppress,
            Reason::WithinThreshold { elapsed_minutes, threshold_minutes },
        )
    } else {
        Evaluation::new(
            Decision::Prompt,
            Reason::ThresholdElapsed { elapsed_minutes, threshold_minutes },
        )
    }
}

/// Evaluates a capture event at `now`, recording the prompt time on prompt.
pub fn evaluate_at(
    settings: &mut SettingsStore,
    forced: bool,
    now: DateTime<Local>,
) -> Result<Evaluation, StoreError> {
    let evaluation = decide(settings, forced, now);
    tracing::debug!(?evaluation, forced, "Evaluated capture event");

    if evaluation.should_prompt() {
        settings.set(LAST_PROMPT_TIME, format_prompt_time(now))?;
    }
    Ok(evaluation)
}

/// Evaluates a capture event at the current local time.
pub fn evaluate(settings: &mut SettingsStore, forced: bool) -> Result<Evaluation, StoreError> {
    evaluate_at(settings, forced, Local::now())
}

pub fn format_prompt_time(when: DateTime<Local>) -> String {
    when.format(PROMPT_TIME_FORMAT).to_string()
}

/// Parses a stored prompt time.
///
/// Accepts the stored format, RFC 3339, and a bare record timestamp which
/// is taken as local time.
pub fn parse_prompt_time(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_str(s, PROMPT_TIME_FORMAT) {
        return Some(dt);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt);
    }
    NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
        .ok()
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
        .map(|dt| dt.fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DISABLE_AUTO_PROMPTS, SKIP_THRESHOLD_MINUTES};
    use chrono::Duration;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn store_with_last_prompt(ago: Duration) -> SettingsStore {
        let mut store = SettingsStore::in_memory();
        store
            .set(LAST_PROMPT_TIME, format_prompt_time(noon() - ago))
            .unwrap();
        store
    }

    #[test]
    fn test_forced_overrides_disabled_prompts() {
        let mut store = SettingsStore::in_memory();
        store.set(DISABLE_AUTO_PROMPTS, true).unwrap();

        let eval = evaluate_at(&mut store, true, noon()).unwrap();
        assert_eq!(eval.decision, Decision::Prompt);
        assert_eq!(eval.reason, Reason::Forced);
    }

    #[test]
    fn test_disabled_prompts_suppress() {
        let mut store = SettingsStore::in_memory();
        store.set(DISABLE_AUTO_PROMPTS, true).unwrap();

        let eval = evaluate_at(&mut store, false, noon()).unwrap();
        assert_eq!(eval.decision, Decision::Suppress);
        assert_eq!(store.last_prompt_time(), None);
    }

    #[test]
    fn test_first_save_prompts_and_records_time() {
        let mut store = SettingsStore::in_memory();
        let eval = evaluate_at(&mut store, false, noon()).unwrap();

        assert_eq!(eval.reason, Reason::NeverPrompted);
        assert_eq!(store.last_prompt_time(), Some(format_prompt_time(noon())));
    }

    #[test]
    fn test_threshold_boundary_is_inclusive() {
        let mut store = store_with_last_prompt(Duration::minutes(5));
        let eval = evaluate_at(&mut store, false, noon()).unwrap();
        assert_eq!(eval.decision, Decision::Prompt);
    }

    #[test]
    fn test_one_second_short_of_threshold_suppresses() {
        let mut store = store_with_last_prompt(Duration::minutes(5) - Duration::seconds(1));
        let before = store.last_prompt_time();

        let eval = evaluate_at(&mut store, false, noon()).unwrap();
        assert_eq!(eval.decision, Decision::Suppress);
        assert_eq!(store.last_prompt_time(), before);
    }

    #[test]
    fn test_custom_threshold() {
        let mut store = store_with_last_prompt(Duration::minutes(7));
        store.set(SKIP_THRESHOLD_MINUTES, 10i64).unwrap();
        assert_eq!(decide(&store, false, noon()).decision, Decision::Suppress);

        store.set(SKIP_THRESHOLD_MINUTES, 0i64).unwrap();
        assert_eq!(decide(&store, false, noon()).decision, Decision::Prompt);
    }

    #[test]
    fn test_unparsable_time_fails_open() {
        let mut store = SettingsStore::in_memory();
        store.set(LAST_PROMPT_TIME, "last tuesday-ish").unwrap();

        let eval = evaluate_at(&mut store, false, noon()).unwrap();
        assert_eq!(eval.decision, Decision::Prompt);
        assert_eq!(eval.reason, Reason::UnreadableLastPrompt);
        assert_eq!(store.last_prompt_time(), Some(format_prompt_time(noon())));
    }

    #[test]
    fn test_burst_of_saves_prompts_once() {
        let mut store = SettingsStore::in_memory();
        let decisions: Vec<Decision> = (0..4)
            .map(|i| {
                evaluate_at(&mut store, false, noon() + Duration::seconds(i * 20))
                    .unwrap()
                    .decision
            })
            .collect();
        assert_eq!(
            decisions,
            vec![Decision::Prompt, Decision::Suppress, Decision::Suppress, Decision::Suppress]
        );
    }

    #[test]
    fn test_parse_prompt_time_formats() {
        assert!(parse_prompt_time("2025-06-01 12:00:00 +0200").is_some());
        assert!(parse_prompt_time("2025-06-01T12:00:00Z").is_some());
        assert!(parse_prompt_time("2025-06-01 12:00:00").is_some());
        assert!(parse_prompt_time("").is_none());
    }
}
