//! Wire types for the `/predict/no-show` endpoint.

use serde::{Deserialize, Serialize};

use crate::features::FeatureVector;
use crate::risk::RiskLevel;

/// Request body for a no-show prediction. All four fields are required.
///
/// Numeric fields also accept numeric strings (`"25"`, `"5.0"`), and the
/// integer fields accept floats with no fractional part (`25.0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(deserialize_with = "coerce::integer")]
    pub age: i64,
    #[serde(deserialize_with = "coerce::real")]
    pub distance: f64,
    #[serde(deserialize_with = "coerce::integer")]
    pub lead_time: i64,
    #[serde(deserialize_with = "coerce::integer")]
    pub previous_no_shows: i64,
}

impl From<&PredictionRequest> for FeatureVector {
    fn from(req: &PredictionRequest) -> Self {
        FeatureVector::new(req.age, req.distance, req.lead_time, req.previous_no_shows)
    }
}

/// Response body: the model's probability and the tier it falls in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub no_show_probability: f64,
    pub risk_level: RiskLevel,
}

impl PredictionResponse {
    pub fn from_probability(no_show_probability: f64) -> Self {
        Self {
            no_show_probability,
            risk_level: RiskLevel::from_probability(no_show_probability),
        }
    }
}

mod coerce {
    use std::fmt;

    use serde::Deserializer;
    use serde::de::{Error, Unexpected, Visitor};

    /// Integer from a JSON integer, an integral float, or a numeric string.
    pub fn integer<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        deserializer.deserialize_any(IntegerVisitor)
    }

    /// Float from any JSON number or a numeric string.
    pub fn real<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
        deserializer.deserialize_any(RealVisitor)
    }

    // Largest float magnitude that converts to i64 without saturating.
    const I64_LIMIT: f64 = 9_223_372_036_854_775_808.0;

    fn integral<E: Error>(v: f64, exp: &dyn serde::de::Expected) -> Result<i64, E> {
        if v.is_finite() && v.fract() == 0.0 && (-I64_LIMIT..I64_LIMIT).contains(&v) {
            Ok(v as i64)
        } else {
            Err(E::invalid_value(Unexpected::Float(v), exp))
        }
    }

    struct IntegerVisitor;

    impl Visitor<'_> for IntegerVisitor {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer or a string containing one")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<i64, E> {
            Ok(v)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<i64, E> {
            i64::try_from(v).map_err(|_| E::invalid_value(Unexpected::Unsigned(v), &self))
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<i64, E> {
            integral(v, &self)
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<i64, E> {
            let s = v.trim();
            if let Ok(n) = s.parse::<i64>() {
                return Ok(n);
            }
            match s.parse::<f64>() {
                Ok(f) => integral(f, &self),
                Err(_) => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }

    struct RealVisitor;

    impl Visitor<'_> for RealVisitor {
        type Value = f64;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a number or a string containing one")
        }

        fn visit_i64<E: Error>(self, v: i64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_u64<E: Error>(self, v: u64) -> Result<f64, E> {
            Ok(v as f64)
        }

        fn visit_f64<E: Error>(self, v: f64) -> Result<f64, E> {
            Ok(v)
        }

        fn visit_str<E: Error>(self, v: &str) -> Result<f64, E> {
            match v.trim().parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(f),
                _ => Err(E::invalid_value(Unexpected::Str(v), &self)),
            }
        }
    }
}
