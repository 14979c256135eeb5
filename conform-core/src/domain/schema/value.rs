// conform-core/src/domain/schema/value.rs

use super::mapping::DataType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::borrow::Cow;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y", "%d-%b-%Y", "%d.%m.%Y"];
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// A typed cell after normalization.
///
/// `Null` is a legitimately empty cell, `Invalid` keeps the raw text of a cell
/// whose coercion failed. Both count as missing input for rules.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Text(String),
    Category(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDateTime),
    Invalid(String),
}

impl CellValue {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Null | Self::Invalid(_))
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid(_))
    }

    /// Text rendering used for comparisons and grouping. `None` when missing.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Null | Self::Invalid(_) => None,
            Self::Text(s) | Self::Category(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Integer(i) => Some(Cow::Owned(i.to_string())),
            Self::Float(f) => Some(Cow::Owned(f.to_string())),
            Self::Date(d) => Some(Cow::Owned(format_date(d))),
        }
    }

    /// Date view of the cell; text cells are parsed leniently.
    pub fn as_date(&self) -> Option<NaiveDateTime> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Text(s) | Self::Category(s) => parse_date(s),
            _ => None,
        }
    }

    /// Coerce one raw cell to the declared type. Blank input is `Null`.
    pub fn coerce(raw: Option<&str>, data_type: DataType) -> Result<Self, String> {
        let trimmed = match raw.map(str::trim) {
            None | Some("") => return Ok(Self::Null),
            Some(t) => t,
        };

        match data_type {
            DataType::String => Ok(Self::Text(trimmed.to_string())),
            DataType::Category => Ok(Self::Category(trimmed.to_string())),
            DataType::Integer => parse_integer(trimmed)
                .map(Self::Integer)
                .ok_or_else(|| trimmed.to_string()),
            DataType::Float => trimmed
                .parse::<f64>()
                .ok()
                .filter(|f| f.is_finite())
                .map(Self::Float)
                .ok_or_else(|| trimmed.to_string()),
            DataType::Date => parse_date(trimmed)
                .map(Self::Date)
                .ok_or_else(|| trimmed.to_string()),
        }
    }
}

fn parse_integer(s: &str) -> Option<i64> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(i);
    }
    // Spreadsheet exports often render integers as "12.0"
    let f = s.parse::<f64>().ok()?;
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15 {
        Some(f as i64)
    } else {
        None
    }
}

pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .map(|d| d.and_time(NaiveTime::MIN))
}

pub fn format_date(d: &NaiveDateTime) -> String {
    if d.time() == NaiveTime::MIN {
        d.format("%Y-%m-%d").to_string()
    } else {
        d.format("%Y-%m-%d %H:%M:%S").to_string()
    }
}

impl Serialize for CellValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Text(s) | Self::Category(s) => serializer.serialize_str(s),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::Date(d) => serializer.serialize_str(&format_date(d)),
            Self::Invalid(raw) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("invalid", raw)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_cells_are_null() {
        assert_eq!(CellValue::coerce(None, DataType::Date), Ok(CellValue::Null));
        assert_eq!(
            CellValue::coerce(Some("   "), DataType::Integer),
            Ok(CellValue::Null)
        );
    }

    #[test]
    fn test_coercion_per_type() {
        assert_eq!(
            CellValue::coerce(Some(" Approved "), DataType::String),
            Ok(CellValue::Text("Approved".into()))
        );
        assert_eq!(
            CellValue::coerce(Some("42"), DataType::Integer),
            Ok(CellValue::Integer(42))
        );
        assert_eq!(
            CellValue::coerce(Some("42.0"), DataType::Integer),
            Ok(CellValue::Integer(42))
        );
        assert_eq!(
            CellValue::coerce(Some("2.5"), DataType::Float),
            Ok(CellValue::Float(2.5))
        );
        assert_eq!(
            CellValue::coerce(Some("Low"), DataType::Category),
            Ok(CellValue::Category("Low".into()))
        );
    }

    #[test]
    fn test_coercion_failures_keep_raw_text() {
        assert_eq!(
            CellValue::coerce(Some("12x"), DataType::Integer),
            Err("12x".to_string())
        );
        assert_eq!(
            CellValue::coerce(Some("NaN"), DataType::Float),
            Err("NaN".to_string())
        );
        assert_eq!(
            CellValue::coerce(Some("31/31/2024"), DataType::Date),
            Err("31/31/2024".to_string())
        );
    }

    #[test]
    fn test_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5)
            .unwrap()
            .and_time(NaiveTime::MIN);
        for raw in ["2024-03-05", "2024/03/05", "03/05/2024", "05-Mar-2024"] {
            assert_eq!(parse_date(raw), Some(expected), "format {raw}");
        }
        let with_time = parse_date("2024-03-05 14:30:00").unwrap();
        assert_eq!(format_date(&with_time), "2024-03-05 14:30:00");
        assert_eq!(format_date(&expected), "2024-03-05");
    }

    #[test]
    fn test_serialization_shapes() -> anyhow::Result<()> {
        let cells = vec![
            CellValue::Null,
            CellValue::Text("a".into()),
            CellValue::Integer(3),
            CellValue::Invalid("oops".into()),
        ];
        let json = serde_json::to_string(&cells)?;
        assert_eq!(json, r#"[null,"a",3,{"invalid":"oops"}]"#);
        Ok(())
    }

    #[test]
    fn test_text_view() {
        assert_eq!(CellValue::Integer(7).as_text().as_deref(), Some("7"));
        assert!(CellValue::Invalid("x".into()).as_text().is_none());
        assert!(CellValue::Invalid("x".into()).is_missing());
    }
}
