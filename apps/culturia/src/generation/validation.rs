//! Response validation: turns raw model text into a `DailyBatch` or rejects
//! the whole batch. Checks stop at the first violation.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::trivia::{DailyBatch, Question};

pub const QUESTIONS_PER_DAY: usize = 3;

const QUESTION_FIELDS: [&str; 3] = ["pregunta", "opciones", "respuesta_correcta"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Malformed JSON: {0}")]
    MalformedJson(String),

    #[error("Response is not a JSON object")]
    NotAnObject,

    #[error("Missing field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' must be {expected}")]
    WrongType {
        field: &'static str,
        expected: &'static str,
    },

    #[error("Expected 3 questions, got {0}")]
    WrongQuestionCount(usize),

    #[error("Question {0}: not a JSON object")]
    QuestionNotAnObject(usize),

    #[error("Question {index}: missing '{field}'")]
    QuestionMissingField { index: usize, field: &'static str },

    #[error("Question {index}: '{field}' must be {expected}")]
    QuestionWrongType {
        index: usize,
        field: &'static str,
        expected: &'static str,
    },

    #[error("Question {index}: must have 2 or 3 options, got {count}")]
    WrongOptionCount { index: usize, count: usize },

    #[error("Question {index}: correct index {value} out of range for {count} options")]
    IndexOutOfRange {
        index: usize,
        value: i128,
        count: usize,
    },
}

/// Removes every line that is only a code-fence marker (```` ``` ```` or ```` ```json ````).
pub fn strip_fence_lines(text: &str) -> String {
    text.trim()
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Parses raw model output and validates it against the daily batch schema.
pub fn parse_and_validate(raw_text: &str) -> Result<DailyBatch, ValidationError> {
    let cleaned = strip_fence_lines(raw_text);
    let value: Value = serde_json::from_str(&cleaned)
        .map_err(|e| ValidationError::MalformedJson(e.to_string()))?;

    let root = value.as_object().ok_or(ValidationError::NotAnObject)?;

    let preguntas = root
        .get("preguntas")
        .ok_or(ValidationError::MissingField("preguntas"))?;
    let taunt = root
        .get("mensaje_burla")
        .ok_or(ValidationError::MissingField("mensaje_burla"))?;

    let entries = preguntas.as_array().ok_or(ValidationError::WrongType {
        field: "preguntas",
        expected: "an array",
    })?;
    if entries.len() != QUESTIONS_PER_DAY {
        return Err(ValidationError::WrongQuestionCount(entries.len()));
    }

    let questions = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| validate_question(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    let taunt_message = taunt
        .as_str()
        .ok_or(ValidationError::WrongType {
            field: "mensaje_burla",
            expected: "a string",
        })?
        .to_string();

    Ok(DailyBatch {
        questions,
        taunt_message,
    })
}

fn validate_question(index: usize, entry: &Value) -> Result<Question, ValidationError> {
    let obj = entry
        .as_object()
        .ok_or(ValidationError::QuestionNotAnObject(index))?;

    let text = required(obj, index, "pregunta")?;
    let options = required(obj, index, "opciones")?;
    let correct = required(obj, index, "respuesta_correcta")?;

    let text = text
        .as_str()
        .ok_or(ValidationError::QuestionWrongType {
            index,
            field: "pregunta",
            expected: "a string",
        })?
        .to_string();

    let options = options
        .as_array()
        .ok_or(ValidationError::QuestionWrongType {
            index,
            field: "opciones",
            expected: "an array",
        })?
        .iter()
        .map(|o| o.as_str().map(str::to_string))
        .collect::<Option<Vec<_>>>()
        .ok_or(ValidationError::QuestionWrongType {
            index,
            field: "opciones",
            expected: "an array of strings",
        })?;

    let count = options.len();
    if !(2..=3).contains(&count) {
        return Err(ValidationError::WrongOptionCount { index, count });
    }

    // both are None for booleans and floats
    let value = correct
        .as_i64()
        .map(i128::from)
        .or_else(|| correct.as_u64().map(i128::from))
        .ok_or(ValidationError::QuestionWrongType {
            index,
            field: "respuesta_correcta",
            expected: "an integer",
        })?;
    let correct_index = usize::try_from(value)
        .ok()
        .filter(|&i| i < count)
        .ok_or(ValidationError::IndexOutOfRange {
            index,
            value,
            count,
        })?;

    let extra = obj
        .iter()
        .filter(|(key, _)| !QUESTION_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect();

    Ok(Question {
        text,
        options,
        correct_index,
        extra,
    })
}

fn required<'a>(
    obj: &'a Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<&'a Value, ValidationError> {
    obj.get(field)
        .ok_or(ValidationError::QuestionMissingField { index, field })
}
