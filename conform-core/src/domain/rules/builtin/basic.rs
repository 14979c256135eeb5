// conform-core/src/domain/rules/builtin/basic.rs

use regex::Regex;

use crate::domain::rules::{
    ConformanceRule, RuleContext, RuleError, RuleOutcome, RuleParams, column, param_errors,
};
use crate::domain::schema::{CellValue, NormalizedTable};

// --- field_equals ---

/// `field` must equal `value` (or one of `values`).
pub struct FieldEquals;

impl FieldEquals {
    fn expected(params: &RuleParams) -> Result<Vec<String>, RuleError> {
        match (params.contains("value"), params.contains("values")) {
            (true, false) => Ok(vec![params.require_scalar_text("value")?]),
            (false, true) => params.require_str_list("values"),
            (true, true) => Err(RuleError::invalid("value", "use either 'value' or 'values', not both")),
            (false, false) => Err(RuleError::MissingParameter("value".into())),
        }
    }
}

impl ConformanceRule for FieldEquals {
    fn name(&self) -> &'static str {
        "field_equals"
    }

    fn description(&self) -> &'static str {
        "Field value equals an expected value"
    }

    fn check_params(&self, params: &RuleParams) -> Vec<RuleError> {
        param_errors([
            params.require_str("field").err(),
            Self::expected(params).err(),
            params.opt_bool("case_sensitive").err(),
        ])
    }

    fn referenced_fields(&self, params: &RuleParams) -> Vec<String> {
        params.require_str("field").map(|f| vec![f.to_string()]).unwrap_or_default()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        _ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let field = params.require_str("field")?;
        let case_sensitive = params.opt_bool("case_sensitive")?.unwrap_or(true);
        let expected = Self::expected(params)?;
        let col = column(table, field)?;

        // Numeric cells compare by value so that 100 and 100.0 are equal
        let expected_numbers: Vec<f64> = expected
            .iter()
            .filter_map(|e| e.trim().parse::<f64>().ok())
            .collect();
        let matches = |cell: &CellValue, actual: &str| {
            let number = match cell {
                CellValue::Integer(i) => Some(*i as f64),
                CellValue::Float(f) => Some(*f),
                _ => None,
            };
            if number.is_some_and(|n| expected_numbers.contains(&n)) {
                return true;
            }
            expected.iter().any(|e| {
                if case_sensitive {
                    e == actual
                } else {
                    e.eq_ignore_ascii_case(actual)
                }
            })
        };

        Ok(table
            .column_values(col)
            .map(|cell| match cell.as_text() {
                None => RuleOutcome::fail(format!("'{field}' is missing")),
                Some(actual) if matches(cell, actual.as_ref()) => RuleOutcome::pass(),
                Some(actual) => RuleOutcome::fail(format!(
                    "'{field}' is '{actual}', expected {}",
                    expected.join(" or ")
                )),
            })
            .collect())
    }
}

// --- not_null ---

/// Every listed field must hold a usable value.
pub struct NotNull;

impl ConformanceRule for NotNull {
    fn name(&self) -> &'static str {
        "not_null"
    }

    fn description(&self) -> &'static str {
        "Required fields are populated"
    }

    fn check_params(&self, params: &RuleParams) -> Vec<RuleError> {
        param_errors([params.require_str_list("fields").err()])
    }

    fn referenced_fields(&self, params: &RuleParams) -> Vec<String> {
        params.require_str_list("fields").unwrap_or_default()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        _ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let fields = params.require_str_list("fields")?;
        let cols = fields
            .iter()
            .map(|f| column(table, f).map(|c| (f.as_str(), c)))
            .collect::<Result<Vec<_>, _>>()?;

        Ok((0..table.len())
            .map(|row| {
                let missing: Vec<&str> = cols
                    .iter()
                    .filter(|(_, col)| table.value(row, *col).is_missing())
                    .map(|(f, _)| *f)
                    .collect();
                if missing.is_empty() {
                    RuleOutcome::pass()
                } else {
                    RuleOutcome::fail(format!("missing: {}", missing.join(", ")))
                }
            })
            .collect())
    }
}

// --- field_matches ---

/// `field` must match the regular expression `pattern`.
pub struct FieldMatches;

impl FieldMatches {
    fn pattern(params: &RuleParams) -> Result<Regex, RuleError> {
        let raw = params.require_str("pattern")?;
        Regex::new(raw).map_err(|e| RuleError::invalid("pattern", e.to_string()))
    }
}

impl ConformanceRule for FieldMatches {
    fn name(&self) -> &'static str {
        "field_matches"
    }

    fn description(&self) -> &'static str {
        "Field value matches a regular expression"
    }

    fn check_params(&self, params: &RuleParams) -> Vec<RuleError> {
        param_errors([
            params.require_str("field").err(),
            Self::pattern(params).err(),
        ])
    }

    fn referenced_fields(&self, params: &RuleParams) -> Vec<String> {
        params.require_str("field").map(|f| vec![f.to_string()]).unwrap_or_default()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        _ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let field = params.require_str("field")?;
        let re = Self::pattern(params)?;
        let col = column(table, field)?;

        Ok(table
            .column_values(col)
            .map(|cell| match cell.as_text() {
                None => RuleOutcome::fail(format!("'{field}' is missing")),
                Some(text) if re.is_match(&text) => RuleOutcome::pass(),
                Some(text) => RuleOutcome::fail(format!("'{field}' value '{text}' does not match {}", re.as_str())),
            })
            .collect())
    }
}
