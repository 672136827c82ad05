use chrono::NaiveDate;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use std::fmt::Display;
use std::sync::LazyLock;

/// Month-first dates as the workbook API renders them for the US locale: `M/DD/YYYY`.
static MONTH_FIRST_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})/(\d{2})/(\d{4})$").expect("Hardcode regex pattern"));

/// A single cell as received from the remote range API.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub enum CellValue {
    #[default]
    Empty,
    /// Boolean values (true/false)
    Boolean(bool),
    /// Numeric values
    Number(f64),
    /// Strings, including date-like strings and error literals such as `#N/A`
    Text(String),
}

impl From<Value> for CellValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Self::Empty,
            Value::Bool(value) => Self::Boolean(value),
            Value::Number(value) => value
                .as_f64()
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(value.to_string())),
            Value::String(value) => Self::Text(value),
            other => Self::Text(other.to_string()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl Display for CellValue {
    /// Writes the raw textual form, before any normalization.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => Ok(()),
            Self::Boolean(true) => write!(f, "True"),
            Self::Boolean(false) => write!(f, "False"),
            Self::Number(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
                write!(f, "{}", *value as i64)
            }
            Self::Number(value) => write!(f, "{}", value),
            Self::Text(value) => write!(f, "{}", value),
        }
    }
}

/// Converts a raw cell to its normalized string form.
///
/// Line breaks are removed, and a value that is exactly a valid `M/DD/YYYY`
/// date is re-rendered as `DD/MM/YYYY`. Anything else passes through as-is.
pub fn normalize(value: &CellValue) -> String {
    let text = value.to_string();
    let text = if text.contains(['\n', '\r']) {
        text.replace("\r\n", "").replace('\n', "")
    } else {
        text
    };
    reformat_month_first_date(&text).unwrap_or(text)
}

/// Re-renders a strict `M/DD/YYYY` date as `DD/MM/YYYY`.
/// Returns None when the text is not exactly that pattern or not a calendar date.
pub(crate) fn reformat_month_first_date(text: &str) -> Option<String> {
    let captures = MONTH_FIRST_DATE.captures(text)?;
    let month = captures[1].parse::<u32>().ok()?;
    let day = captures[2].parse::<u32>().ok()?;
    let year = captures[3].parse::<i32>().ok().filter(|year| *year > 0)?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;
    Some(date.format("%d/%m/%Y").to_string())
}
