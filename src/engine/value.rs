//! Value Evaluation
//!
//! Evaluates aggregate value expressions against a record. Nulls contribute
//! zero to a sum, matching how the source systems total sparse columns.

use crate::catalog::metric::ValueExpr;
use crate::engine::filter::FilterEval;
use crate::error::Result;
use crate::records::record::SourceRecord;

pub(crate) fn eval_value(
    eval: &FilterEval<'_>,
    record: &SourceRecord,
    expr: &ValueExpr,
) -> Result<f64> {
    match expr {
        ValueExpr::Column(name) => Ok(eval.numeric(record, name)?.unwrap_or(0.0)),
        ValueExpr::Add { add } => {
            let mut total = 0.0;
            for sub in add {
                total += eval_value(eval, record, sub)?;
            }
            Ok(total)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::context::ComputeContext;
    use crate::records::record::FieldValue;
    use chrono::NaiveDate;

    #[test]
    fn test_add_expression_skips_nulls() {
        let ctx = ComputeContext::new(NaiveDate::from_ymd_opt(2025, 8, 1).unwrap());
        let eval = FilterEval {
            metric: "active_contract_value",
            system: "vgs",
            ctx: &ctx,
        };
        let record = SourceRecord::empty()
            .with("original_value", FieldValue::Float(10_000.0))
            .with("amendment_value", FieldValue::Null);

        let expr = ValueExpr::Add {
            add: vec![
                ValueExpr::Column("original_value".into()),
                ValueExpr::Column("amendment_value".into()),
            ],
        };
        assert_eq!(eval_value(&eval, &record, &expr).unwrap(), 10_000.0);
    }
}
