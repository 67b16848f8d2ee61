//! Filter conversion to Qdrant `Filter`.
//!
//! Supports exact equality on scalar fields (`String`, integer `Number`, `Bool`).
//! Conditions go to `must`, so every one of them has to match.

use crate::record::RagFilter;
use qdrant_client::qdrant::{
    Condition, FieldCondition, Filter, Match, condition::ConditionOneOf, r#match::MatchValue,
};
use tracing::{debug, warn};

/// Converts [`RagFilter`] to a Qdrant [`Filter`].
///
/// - `String` → `Keyword`
/// - integer `Number` → `Integer`
/// - `Bool`   → `Boolean`
///
/// Other values are skipped with a warning.
pub fn to_qdrant_filter(f: &RagFilter) -> Filter {
    debug!(conditions = f.equals.len(), "building qdrant filter");

    let mut must: Vec<Condition> = Vec::with_capacity(f.equals.len());

    for (field, val) in &f.equals {
        let value = match val {
            serde_json::Value::String(s) => MatchValue::Keyword(s.clone()),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => MatchValue::Integer(i),
                None => {
                    warn!(%field, "non-integer number is not supported in filters; skipped");
                    continue;
                }
            },
            serde_json::Value::Bool(b) => MatchValue::Boolean(*b),
            other => {
                warn!(%field, value = %other, "unsupported filter value; skipped");
                continue;
            }
        };

        must.push(Condition {
            condition_one_of: Some(ConditionOneOf::Field(FieldCondition {
                key: field.clone(),
                r#match: Some(Match {
                    match_value: Some(value),
                }),
                ..Default::default()
            })),
        });
    }

    Filter {
        must,
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn keyword_of(c: &Condition) -> Option<(&str, &MatchValue)> {
        match &c.condition_one_of {
            Some(ConditionOneOf::Field(fc)) => {
                let m = fc.r#match.as_ref()?.match_value.as_ref()?;
                Some((fc.key.as_str(), m))
            }
            _ => None,
        }
    }

    #[test]
    fn conditions_are_conjunctive() {
        let f = RagFilter::default()
            .with("date", "2025-10-20")
            .with("service_type", "oil change");
        let q = to_qdrant_filter(&f);

        assert!(q.should.is_empty());
        assert_eq!(q.must.len(), 2);
        assert_eq!(
            keyword_of(&q.must[0]),
            Some(("date", &MatchValue::Keyword("2025-10-20".into())))
        );
    }

    #[test]
    fn unsupported_values_are_skipped() {
        let f = RagFilter::default()
            .with("ratio", json!(0.5))
            .with("tags", json!(["a"]))
            .with("appointment_id", json!(42))
            .with("confirmed", json!(true));
        let q = to_qdrant_filter(&f);

        assert_eq!(q.must.len(), 2);
        assert_eq!(
            keyword_of(&q.must[0]),
            Some(("appointment_id", &MatchValue::Integer(42)))
        );
        assert_eq!(
            keyword_of(&q.must[1]),
            Some(("confirmed", &MatchValue::Boolean(true)))
        );
    }
}
