use std::future::ready;

use quote_crew_core::tool::{Error as ToolError, Tool, ToolResult};
use schemars::{JsonSchema, schema_for};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const DEFAULT_CITY: &str = "salem";
const DEFAULT_SPEC: &str = "standard";

/// Baseline construction rates in INR per sq.ft, by city and finish level.
const CITY_BASELINE: &[(&str, &[(&str, u32)])] = &[
    (
        "chennai",
        &[("basic", 1900), ("standard", 2300), ("premium", 3000)],
    ),
    (
        "coimbatore",
        &[("basic", 1750), ("standard", 2150), ("premium", 2850)],
    ),
    ("salem", &[("basic", 1700), ("standard", 2100), ("premium", 2750)]),
];

/// Input of [`RateLookupTool`].
#[derive(Deserialize, JsonSchema)]
pub struct RateParameters {
    #[schemars(description = "City of the site, e.g. \"Salem\".")]
    city: String,
    #[schemars(
        description = "Finish level: basic, standard or premium. Defaults to standard."
    )]
    spec: Option<String>,
}

/// A rate looked up from the baseline table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RateQuote {
    /// The normalized city that was asked for.
    pub city: String,
    /// The normalized finish level that was asked for.
    pub spec: String,
    /// Rate in INR per sq.ft.
    pub inr_per_sqft: u32,
}

/// Looks up the baseline rate of `city` for the `spec` finish level.
///
/// Both inputs are trimmed and lower-cased. An unknown city uses Salem's
/// table, an unknown finish level uses the table's standard rate. The
/// returned quote keeps the normalized inputs, not the fallbacks.
pub fn rate_per_sqft(city: &str, spec: &str) -> RateQuote {
    let city = city.trim().to_lowercase();
    let spec = spec.trim().to_lowercase();

    let lookup = |name: &str| {
        CITY_BASELINE
            .iter()
            .find(|(city, _)| *city == name)
            .map(|(_, table)| *table)
    };
    let table = lookup(&city).or_else(|| lookup(DEFAULT_CITY)).unwrap_or(&[]);
    let rate_of = |name: &str| {
        table
            .iter()
            .find(|(spec, _)| *spec == name)
            .map(|(_, rate)| *rate)
    };
    let inr_per_sqft = rate_of(&spec).or_else(|| rate_of(DEFAULT_SPEC)).unwrap_or(0);

    RateQuote {
        city,
        spec,
        inr_per_sqft,
    }
}

/// Tells the estimator the rough rate of building in a city.
pub struct RateLookupTool {
    parameter_schema: Value,
}

impl RateLookupTool {
    /// Creates a new rate lookup tool.
    #[inline]
    pub fn new() -> Self {
        Self {
            parameter_schema: schema_for!(RateParameters).to_value(),
        }
    }
}

impl Default for RateLookupTool {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for RateLookupTool {
    type Input = RateParameters;

    fn name(&self) -> &str {
        "get_inr_rate_per_sqft"
    }

    fn description(&self) -> &str {
        r#"
Returns the rough construction rate in INR per sq.ft for a city and finish level.
Known cities are Chennai, Coimbatore and Salem; other cities use Salem's rates."#
    }

    fn parameter_schema(&self) -> &Value {
        &self.parameter_schema
    }

    fn execute(
        &self,
        input: RateParameters,
    ) -> impl Future<Output = ToolResult> + Send + 'static {
        let spec = input.spec.as_deref().unwrap_or(DEFAULT_SPEC);
        let quote = rate_per_sqft(&input.city, spec);
        debug!("rate for {}/{}: {}", quote.city, quote.spec, quote.inr_per_sqft);
        ready(serde_json::to_string(&quote).map_err(|err| {
            ToolError::execution_error().with_reason(err.to_string())
        }))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_known_rates() {
        let expected = [
            ("chennai", "basic", 1900),
            ("chennai", "standard", 2300),
            ("chennai", "premium", 3000),
            ("coimbatore", "basic", 1750),
            ("coimbatore", "standard", 2150),
            ("coimbatore", "premium", 2850),
            ("salem", "basic", 1700),
            ("salem", "standard", 2100),
            ("salem", "premium", 2750),
        ];
        for (city, spec, rate) in expected {
            assert_eq!(rate_per_sqft(city, spec).inr_per_sqft, rate, "{city}/{spec}");
        }

        // Every cell of the table is reachable and listed above.
        for (city, table) in CITY_BASELINE {
            for (spec, rate) in *table {
                assert_eq!(rate_per_sqft(city, spec).inr_per_sqft, *rate);
                assert!(expected.contains(&(*city, *spec, *rate)));
            }
        }
        let cells: usize = CITY_BASELINE.iter().map(|(_, table)| table.len()).sum();
        assert_eq!(cells, expected.len());
    }

    #[test]
    fn test_normalizes_input() {
        let quote = rate_per_sqft("  CHENNAI ", " Basic");
        assert_eq!(
            quote,
            RateQuote {
                city: "chennai".to_owned(),
                spec: "basic".to_owned(),
                inr_per_sqft: 1900,
            }
        );
    }

    #[test]
    fn test_fallbacks() {
        let quote = rate_per_sqft("Madurai", "premium");
        assert_eq!(quote.city, "madurai");
        assert_eq!(quote.inr_per_sqft, 2750);

        assert_eq!(rate_per_sqft("chennai", "luxury").inr_per_sqft, 2300);
        assert_eq!(rate_per_sqft("", "").inr_per_sqft, 2100);
    }

    #[tokio::test]
    async fn test_execute() {
        let tool = RateLookupTool::new();
        let input: RateParameters =
            serde_json::from_value(json!({ "city": "Salem" })).unwrap();
        let output = tool.execute(input).await.unwrap();
        let output: Value = serde_json::from_str(&output).unwrap();
        assert_eq!(
            output,
            json!({ "city": "salem", "spec": "standard", "inr_per_sqft": 2100 })
        );
    }
}
