use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A single trivia question as persisted in `historial.json`.
///
/// Field names are the Spanish wire names the front-end reads directly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    #[serde(rename = "pregunta")]
    pub text: String,
    /// Two options for true/false questions, three for single-answer ones.
    #[serde(rename = "opciones")]
    pub options: Vec<String>,
    /// Index into `options`.
    #[serde(rename = "respuesta_correcta")]
    pub correct_index: usize,
    /// Keys outside the schema, kept so rewriting the history never drops them.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The validated payload of one model response: three questions and the taunt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyBatch {
    pub questions: Vec<Question>,
    pub taunt_message: String,
}

/// One persisted day. Immutable once written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayRecord {
    #[serde(rename = "dia")]
    pub day_number: u32,
    /// Calendar date in the fixed UTC+1 offset, serialized as `YYYY-MM-DD`.
    #[serde(rename = "fecha")]
    pub date: NaiveDate,
    #[serde(rename = "preguntas")]
    pub questions: Vec<Question>,
    #[serde(rename = "mensaje_burla")]
    pub taunt_message: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DayRecord {
    pub fn new(day_number: u32, date: NaiveDate, batch: DailyBatch) -> Self {
        Self {
            day_number,
            date,
            questions: batch.questions,
            taunt_message: batch.taunt_message,
            extra: Map::new(),
        }
    }
}
