// conform-core/src/domain/rules/builtin/third_party.rs

use crate::domain::rules::{
    ConformanceRule, RuleContext, RuleError, RuleOutcome, RuleParams, column, param_errors,
};
use crate::domain::schema::NormalizedTable;

const DEFAULT_NA_MARKER: &str = "N/A";

/// No third party <=> risk level is the N/A marker.
pub struct ThirdPartyRiskValidation;

impl ConformanceRule for ThirdPartyRiskValidation {
    fn name(&self) -> &'static str {
        "third_party_risk_validation"
    }

    fn description(&self) -> &'static str {
        "Third-party risk is assessed exactly when a third party is involved"
    }

    fn check_params(&self, params: &RuleParams) -> Vec<RuleError> {
        param_errors([
            params.require_str("third_party_field").err(),
            params.require_str("risk_level_field").err(),
            params.opt_str("na_marker").err(),
        ])
    }

    fn referenced_fields(&self, params: &RuleParams) -> Vec<String> {
        ["third_party_field", "risk_level_field"]
            .iter()
            .filter_map(|key| params.require_str(key).ok())
            .map(str::to_string)
            .collect()
    }

    fn evaluate(
        &self,
        table: &NormalizedTable,
        params: &RuleParams,
        _ctx: &RuleContext<'_>,
    ) -> Result<Vec<RuleOutcome>, RuleError> {
        let party_col = column(table, params.require_str("third_party_field")?)?;
        let risk_col = column(table, params.require_str("risk_level_field")?)?;
        let na = params.opt_str("na_marker")?.unwrap_or(DEFAULT_NA_MARKER);

        Ok((0..table.len())
            .map(|row| {
                let party = table.value(row, party_col).as_text();
                let risk = table.value(row, risk_col).as_text();
                let risk_is_na = risk.as_deref().is_some_and(|r| r.eq_ignore_ascii_case(na));

                match (party, risk) {
                    (None, _) if risk_is_na => RuleOutcome::pass(),
                    (None, None) => {
                        RuleOutcome::fail(format!("no third party, risk level should be '{na}'"))
                    }
                    (None, Some(r)) => RuleOutcome::fail(format!(
                        "no third party but risk level is '{r}', expected '{na}'"
                    )),
                    (Some(p), _) if risk_is_na => RuleOutcome::fail(format!(
                        "third party '{p}' present but risk level is '{na}'"
                    )),
                    (Some(p), None) => {
                        RuleOutcome::fail(format!("third party '{p}' present without a risk level"))
                    }
                    (Some(_), Some(_)) => RuleOutcome::pass(),
                }
            })
            .collect())
    }
}
