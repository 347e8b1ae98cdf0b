//! Daily trivia generation: orchestrates one run of the pipeline.
//!
//! Flow: load history → skip if today already exists → build prompt →
//!       LLM generate → validate → prepend new day → save history.
//!
//! At most one record per calendar day: re-running on the same day is a no-op.

use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::{error, info, warn};

use crate::errors::TriviaError;
use crate::generation::prompts::{NO_PREVIOUS_QUESTIONS, TRIVIA_PROMPT_TEMPLATE};
use crate::generation::validation::parse_and_validate;
use crate::history::{load_history, previous_questions, save_history, MAX_CONTEXT_QUESTIONS};
use crate::llm_client::{TriviaGenerator, MODEL};
use crate::models::trivia::DayRecord;

/// Madrid as a fixed UTC+1. Summer time (UTC+2) is not observed, so between
/// 00:00 and 01:00 local time in summer the run still counts as the previous day.
const MADRID_UTC_OFFSET_HOURS: i64 = 1;

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// How a run ended when it did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A new day was generated and saved.
    Generated(DayRecord),
    /// The history already had a record for this date; the model was not called.
    Skipped { date: NaiveDate },
}

// ────────────────────────────────────────────────────────────────────────────
// Generation pipeline
// ────────────────────────────────────────────────────────────────────────────

/// Calendar date of `now` in the fixed Madrid offset.
pub fn today_in_madrid(now: DateTime<Utc>) -> NaiveDate {
    (now + chrono::Duration::hours(MADRID_UTC_OFFSET_HOURS)).date_naive()
}

/// Runs the daily pipeline against the history file at `history_path`.
///
/// Steps:
/// 1. load_history() → Vec<DayRecord>
/// 2. front record dated `today` → Skipped
/// 3. previous_questions() + build_prompt()
/// 4. generator.generate() → raw text (fatal on error, no retries)
/// 5. parse_and_validate() → DailyBatch (fatal on error, raw text logged)
/// 6. prepend DayRecord and save_history()
pub async fn run_daily(
    generator: &dyn TriviaGenerator,
    history_path: &Path,
    today: NaiveDate,
) -> Result<RunOutcome, TriviaError> {
    // Step 1: Load history
    let mut history = load_history(history_path)?;
    info!("📂 History loaded: {} existing days", history.len());

    // Step 2: One record per day
    if history.first().is_some_and(|front| front.date == today) {
        warn!("⚠️  A record for today ({today}) already exists. Skipping generation.");
        return Ok(RunOutcome::Skipped { date: today });
    }

    let day_number = next_day_number(&history)?;

    // Step 3: Prompt
    let previous = previous_questions(&history, MAX_CONTEXT_QUESTIONS);
    info!("🧠 Anti-repetition context: {} previous questions", previous.len());
    let prompt = build_prompt(&previous, day_number);

    // Step 4: Model call
    info!("🤖 Calling Groq ({MODEL})...");
    let raw_text = generator.generate(&prompt).await?;
    info!("📥 Response received ({} characters)", raw_text.chars().count());

    // Step 5: Validate
    let batch = match parse_and_validate(&raw_text) {
        Ok(batch) => batch,
        Err(source) => {
            error!("❌ Failed to parse model response: {source}");
            error!("   Raw response:\n{raw_text}");
            return Err(TriviaError::InvalidResponse {
                source,
                raw: raw_text,
            });
        }
    };

    // Step 6: Persist
    let record = DayRecord::new(day_number, today, batch);
    history.insert(0, record.clone());
    save_history(history_path, &history)?;

    info!("✅ Day #{day_number} ({today}) generated");
    info!("   📝 Questions:");
    for question in &record.questions {
        info!("      - {}", question.text);
    }
    info!("   🤡 Taunt: {}", record.taunt_message);
    info!(
        "💾 {} updated ({} days total)",
        history_path.display(),
        history.len()
    );

    Ok(RunOutcome::Generated(record))
}

fn next_day_number(history: &[DayRecord]) -> Result<u32, TriviaError> {
    match history.first() {
        None => Ok(1),
        Some(front) => front
            .day_number
            .checked_add(1)
            .ok_or(TriviaError::DayNumberOverflow(front.day_number)),
    }
}

/// Builds the generation prompt. Pure: same inputs, same text.
pub fn build_prompt(previous_questions: &[String], day_number: u32) -> String {
    let previous = if previous_questions.is_empty() {
        NO_PREVIOUS_QUESTIONS.to_string()
    } else {
        previous_questions
            .iter()
            .map(|q| format!("  - {q}"))
            .collect::<Vec<_>>()
            .join("\n")
    };

    TRIVIA_PROMPT_TEMPLATE
        .replace("{previous_questions}", &previous)
        .replace("{day_number}", &day_number.to_string())
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm_client::LlmError;
    use crate::models::trivia::Question;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const VALID_RESPONSE: &str = r#"{
        "preguntas": [
            {"pregunta": "¿Quién pintó Las Meninas?", "opciones": ["Goya", "Velázquez", "El Greco"], "respuesta_correcta": 1},
            {"pregunta": "Madrid es la capital de España.", "opciones": ["Verdadero", "Falso"], "respuesta_correcta": 0},
            {"pregunta": "¿Cuántas comunidades autónomas hay?", "opciones": ["15", "17", "19"], "respuesta_correcta": 1}
        ],
        "mensaje_burla": "¡Sabes menos que un GPS en Cuenca! 🧭😂"
    }"#;

    /// Returns a canned response and records every prompt it receives.
    struct CannedGenerator {
        response: Result<String, u16>,
        calls: AtomicUsize,
        prompts: Mutex<Vec<String>>,
    }

    impl CannedGenerator {
        fn ok(text: &str) -> Self {
            Self {
                response: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing(status: u16) -> Self {
            Self {
                response: Err(status),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TriviaGenerator for CannedGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(LlmError::Api {
                    status: *status,
                    message: "upstream unavailable".to_string(),
                }),
            }
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn make_day(day_number: u32, on: &str) -> DayRecord {
        DayRecord {
            day_number,
            date: date(on),
            questions: (0..3)
                .map(|i| Question {
                    text: format!("Pregunta antigua {day_number}.{i}"),
                    options: vec!["Verdadero".to_string(), "Falso".to_string()],
                    correct_index: 0,
                    extra: serde_json::Map::new(),
                })
                .collect(),
            taunt_message: "😜".to_string(),
            extra: serde_json::Map::new(),
        }
    }

    // ── build_prompt ────────────────────────────────────────────────────────

    #[test]
    fn test_build_prompt_empty_history() {
        let prompt = build_prompt(&[], 1);
        assert!(prompt.contains("día #1"));
        assert!(prompt.contains("(ninguna todavía)"));
        assert!(!prompt.contains("{previous_questions}"));
        assert!(!prompt.contains("{day_number}"));
    }

    #[test]
    fn test_build_prompt_lists_previous_questions() {
        let previous = vec![
            "¿Quién escribió La Regenta?".to_string(),
            "¿Dónde está la Alhambra?".to_string(),
        ];
        let prompt = build_prompt(&previous, 42);

        assert!(prompt.contains("  - ¿Quién escribió La Regenta?\n  - ¿Dónde está la Alhambra?"));
        assert!(prompt.contains("día #42"));
        assert!(!prompt.contains("(ninguna todavía)"));
    }

    #[test]
    fn test_build_prompt_describes_output_contract() {
        let prompt = build_prompt(&[], 3);
        for field in ["preguntas", "pregunta", "opciones", "respuesta_correcta", "mensaje_burla"] {
            assert!(prompt.contains(&format!("\"{field}\"")), "missing {field}");
        }
        assert!(prompt.contains("exactamente 3 preguntas"));
        assert!(prompt.contains("Verdadero"));
    }

    #[test]
    fn test_build_prompt_is_deterministic() {
        let previous = vec!["¿Río más largo de España?".to_string()];
        assert_eq!(build_prompt(&previous, 7), build_prompt(&previous, 7));
    }

    // ── today_in_madrid ─────────────────────────────────────────────────────

    #[test]
    fn test_today_in_madrid_rolls_over_at_23_utc() {
        let before = Utc.with_ymd_and_hms(2025, 6, 30, 22, 59, 59).unwrap();
        let after = Utc.with_ymd_and_hms(2025, 6, 30, 23, 0, 0).unwrap();
        assert_eq!(today_in_madrid(before), date("2025-06-30"));
        assert_eq!(today_in_madrid(after), date("2025-07-01"));
    }

    #[test]
    fn test_today_in_madrid_ignores_summer_time() {
        // 22:30 UTC in July is 00:30 CEST, but the fixed offset keeps it on the 14th
        let now = Utc.with_ymd_and_hms(2025, 7, 14, 22, 30, 0).unwrap();
        assert_eq!(today_in_madrid(now), date("2025-07-14"));
    }

    // ── run_daily ───────────────────────────────────────────────────────────

    #[tokio::test]
    async fn test_first_run_creates_day_one() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        let generator = CannedGenerator::ok(VALID_RESPONSE);

        let outcome = run_daily(&generator, &path, date("2025-02-01"))
            .await
            .unwrap();

        let RunOutcome::Generated(record) = outcome else {
            panic!("expected a generated day");
        };
        assert_eq!(record.day_number, 1);
        assert_eq!(record.date, date("2025-02-01"));
        assert_eq!(record.questions[0].options[1], "Velázquez");

        let saved = load_history(&path).unwrap();
        assert_eq!(saved, vec![record]);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("día #1"));
        assert!(prompts[0].contains("(ninguna todavía)"));
    }

    #[tokio::test]
    async fn test_new_day_is_prepended_with_next_number() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        let existing = vec![make_day(8, "2025-02-08"), make_day(7, "2025-02-07")];
        save_history(&path, &existing).unwrap();
        let generator = CannedGenerator::ok(VALID_RESPONSE);

        run_daily(&generator, &path, date("2025-02-09"))
            .await
            .unwrap();

        let saved = load_history(&path).unwrap();
        assert_eq!(saved.len(), 3);
        assert_eq!(saved[0].day_number, 9);
        assert_eq!(saved[0].date, date("2025-02-09"));
        assert_eq!(&saved[1..], &existing[..]);

        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].contains("día #9"));
        assert!(prompts[0].contains("  - Pregunta antigua 8.0"));
        assert!(prompts[0].contains("  - Pregunta antigua 7.2"));
    }

    #[tokio::test]
    async fn test_second_run_same_day_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        let generator = CannedGenerator::ok(VALID_RESPONSE);
        let today = date("2025-03-15");

        run_daily(&generator, &path, today).await.unwrap();
        let second = run_daily(&generator, &path, today).await.unwrap();

        assert_eq!(second, RunOutcome::Skipped { date: today });
        assert_eq!(generator.calls(), 1);
        assert_eq!(load_history(&path).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_skip_only_checks_front_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        save_history(&path, &[make_day(2, "2025-03-02"), make_day(1, "2025-03-01")]).unwrap();
        let generator = CannedGenerator::ok(VALID_RESPONSE);

        let outcome = run_daily(&generator, &path, date("2025-03-02"))
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Skipped { .. }));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_response_leaves_history_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        let existing = vec![make_day(1, "2025-04-01")];
        save_history(&path, &existing).unwrap();
        let generator = CannedGenerator::ok(r#"{"preguntas": [], "mensaje_burla": "x"}"#);

        let err = run_daily(&generator, &path, date("2025-04-02"))
            .await
            .unwrap_err();

        match err {
            TriviaError::InvalidResponse { raw, .. } => assert!(raw.contains("mensaje_burla")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(load_history(&path).unwrap(), existing);
    }

    #[tokio::test]
    async fn test_transport_failure_is_fatal_and_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        let generator = CannedGenerator::failing(503);

        let err = run_daily(&generator, &path, date("2025-05-05"))
            .await
            .unwrap_err();

        assert!(matches!(err, TriviaError::Llm(LlmError::Api { status: 503, .. })));
        assert_eq!(generator.calls(), 1);
        assert!(!path.exists());
    }

    #[test]
    fn test_next_day_number() {
        assert_eq!(next_day_number(&[]).unwrap(), 1);
        assert_eq!(next_day_number(&[make_day(41, "2025-02-10")]).unwrap(), 42);
    }

    #[tokio::test]
    async fn test_day_number_overflow_aborts_before_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        let existing = vec![make_day(u32::MAX, "2025-05-04")];
        save_history(&path, &existing).unwrap();
        let generator = CannedGenerator::ok(VALID_RESPONSE);

        let err = run_daily(&generator, &path, date("2025-05-05"))
            .await
            .unwrap_err();

        assert!(matches!(err, TriviaError::DayNumberOverflow(u32::MAX)));
        assert_eq!(generator.calls(), 0);
        assert_eq!(load_history(&path).unwrap(), existing);
    }

    #[tokio::test]
    async fn test_corrupt_history_aborts_before_model_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        std::fs::write(&path, "not json").unwrap();
        let generator = CannedGenerator::ok(VALID_RESPONSE);

        let err = run_daily(&generator, &path, date("2025-05-05"))
            .await
            .unwrap_err();

        assert!(matches!(err, TriviaError::Storage(_)));
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_fenced_model_output_is_accepted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("historial.json");
        let generator = CannedGenerator::ok(&format!("```json\n{VALID_RESPONSE}\n```"));

        let outcome = run_daily(&generator, &path, date("2025-06-01"))
            .await
            .unwrap();

        assert!(matches!(outcome, RunOutcome::Generated(_)));
    }
}
