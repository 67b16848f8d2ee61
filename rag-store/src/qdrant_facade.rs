//! Thin adapter around `qdrant-client` to isolate API usage.
//!
//! All Qdrant calls live here; the rest of the crate deals in plain JSON
//! payloads and `(score, payload)` pairs.

use std::collections::HashMap;

use crate::config::RagConfig;
use crate::errors::RagError;

use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    Filter, SearchParamsBuilder, SearchPointsBuilder, Value as QValue, value::Kind,
};
use tracing::{debug, info};

/// Search options taken from [`RagConfig`].
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchOptions {
    pub exact: bool,
    pub score_threshold: Option<f32>,
}

/// A facade over the Qdrant client bound to one collection.
pub struct QdrantFacade {
    client: Qdrant,
    collection: String,
}

impl QdrantFacade {
    /// Creates a new facade from the given configuration.
    ///
    /// Building the client does not connect; the first request does.
    pub fn new(cfg: &RagConfig) -> Result<Self, RagError> {
        cfg.validate()?;

        let mut builder = Qdrant::from_url(&cfg.qdrant_url).skip_compatibility_check();
        if let Some(key) = &cfg.qdrant_api_key {
            builder = builder.api_key(key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        info!(url = %cfg.qdrant_url, collection = %cfg.collection, "Qdrant client ready");

        Ok(Self {
            client,
            collection: cfg.collection.clone(),
        })
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Performs a similarity search with payloads.
    ///
    /// Returns `(score, payload)` tuples in Qdrant's ranking order.
    pub async fn search(
        &self,
        vector: Vec<f32>,
        top_k: u64,
        filter: Option<Filter>,
        opts: SearchOptions,
    ) -> Result<Vec<(f32, serde_json::Value)>, RagError> {
        debug!(
            collection = %self.collection,
            top_k,
            filtered = filter.is_some(),
            exact = opts.exact,
            "qdrant search"
        );

        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector, top_k).with_payload(true);

        if let Some(f) = filter {
            builder = builder.filter(f);
        }
        if opts.exact {
            builder = builder.params(SearchParamsBuilder::default().exact(true));
        }
        if let Some(t) = opts.score_threshold {
            builder = builder.score_threshold(t);
        }

        let res = self
            .client
            .search_points(builder)
            .await
            .map_err(|e| RagError::Qdrant(e.to_string()))?;

        let out: Vec<_> = res
            .result
            .into_iter()
            .map(|p| (p.score, payload_to_json(p.payload)))
            .collect();

        debug!(hits = out.len(), "qdrant search completed");
        Ok(out)
    }

    /// Pings the server.
    pub async fn health_check(&self) -> Result<(), RagError> {
        self.client
            .health_check()
            .await
            .map(|_| ())
            .map_err(|e| RagError::Qdrant(e.to_string()))
    }
}

/// Converts a Qdrant payload into a JSON object, nested values included.
pub(crate) fn payload_to_json(payload: HashMap<String, QValue>) -> serde_json::Value {
    serde_json::Value::Object(
        payload
            .into_iter()
            .map(|(k, v)| (k, value_to_json(v)))
            .collect(),
    )
}

fn value_to_json(v: QValue) -> serde_json::Value {
    match v.kind {
        Some(Kind::StringValue(s)) => serde_json::Value::String(s),
        Some(Kind::IntegerValue(i)) => serde_json::Value::Number(i.into()),
        Some(Kind::DoubleValue(f)) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::BoolValue(b)) => serde_json::Value::Bool(b),
        Some(Kind::StructValue(s)) => payload_to_json(s.fields),
        Some(Kind::ListValue(l)) => {
            serde_json::Value::Array(l.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::NullValue(_)) | None => serde_json::Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qdrant_client::qdrant::{ListValue, Struct};
    use serde_json::json;

    #[test]
    fn converts_scalars_and_nested_values() {
        let mut vehicle = HashMap::new();
        vehicle.insert("make".to_string(), QValue::from("Toyota"));
        vehicle.insert("year".to_string(), QValue::from(2019_i64));

        let mut payload = HashMap::new();
        payload.insert("source".to_string(), QValue::from("Appointment #7"));
        payload.insert("appointment_id".to_string(), QValue::from(7_i64));
        payload.insert("paid".to_string(), QValue::from(false));
        payload.insert("cost".to_string(), QValue::from(49.5_f64));
        payload.insert(
            "vehicle".to_string(),
            QValue {
                kind: Some(Kind::StructValue(Struct { fields: vehicle })),
            },
        );
        payload.insert(
            "tags".to_string(),
            QValue {
                kind: Some(Kind::ListValue(ListValue {
                    values: vec![QValue::from("brakes"), QValue::from("oil")],
                })),
            },
        );
        payload.insert("notes".to_string(), QValue { kind: None });

        let j = payload_to_json(payload);
        assert_eq!(
            j,
            json!({
                "source": "Appointment #7",
                "appointment_id": 7,
                "paid": false,
                "cost": 49.5,
                "vehicle": { "make": "Toyota", "year": 2019 },
                "tags": ["brakes", "oil"],
                "notes": null
            })
        );
    }

    #[test]
    fn non_finite_double_becomes_null() {
        assert_eq!(value_to_json(QValue::from(f64::NAN)), serde_json::Value::Null);
    }
}
