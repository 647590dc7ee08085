use std::convert::Infallible;

use serde::{Deserialize, Serialize};

use funcstream_core::ValueObject;
use funcstream_events::FunctionRegistryBuilder;

use crate::rounding::{ROUNDING_SCALE, round_half_up};

/// Registry name of [`calculate`].
pub const CALCULATE: &str = "calculate";

/// Registry name of [`round`].
pub const ROUND: &str = "round";

/// Two operands to add.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRequest {
    a: f64,
    b: f64,
}

impl CalculationRequest {
    pub fn new(a: f64, b: f64) -> Self {
        Self { a, b }
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn b(&self) -> f64 {
        self.b
    }
}

impl ValueObject for CalculationRequest {}

/// The raw sum, before rounding.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationResult {
    result: f64,
}

impl CalculationResult {
    pub fn new(result: f64) -> Self {
        Self { result }
    }

    pub fn result(&self) -> f64 {
        self.result
    }

    /// Round half-up to two decimal places.
    pub fn round(&self) -> RoundedResult {
        RoundedResult {
            result: round_half_up(self.result, ROUNDING_SCALE),
        }
    }
}

impl ValueObject for CalculationResult {}

/// A sum rendered as `"<integer>.<2 digits>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundedResult {
    result: String,
}

impl RoundedResult {
    pub fn result(&self) -> &str {
        &self.result
    }

    pub fn into_inner(self) -> String {
        self.result
    }
}

impl core::fmt::Display for RoundedResult {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.result)
    }
}

impl ValueObject for RoundedResult {}

pub fn calculate(request: CalculationRequest) -> CalculationResult {
    CalculationResult::new(request.a + request.b)
}

pub fn round(result: CalculationResult) -> RoundedResult {
    result.round()
}

/// Register `calculate` and `round`.
pub fn register(builder: FunctionRegistryBuilder) -> FunctionRegistryBuilder {
    builder
        .function(CALCULATE, |request: CalculationRequest| {
            Ok::<_, Infallible>(calculate(request))
        })
        .function(ROUND, |result: CalculationResult| {
            Ok::<_, Infallible>(round(result))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcstream_events::FunctionRegistry;
    use proptest::prelude::*;
    use serde_json::json;

    #[test]
    fn one_plus_two_is_three_then_three_point_zero_zero() {
        let result = calculate(CalculationRequest::new(1.0, 2.0));
        assert_eq!(result.result(), 3.0);
        assert_eq!(round(result).result(), "3.00");
    }

    #[test]
    fn wire_shapes() {
        let request: CalculationRequest = serde_json::from_value(json!({ "a": 1, "b": 2 })).unwrap();
        assert_eq!(request, CalculationRequest::new(1.0, 2.0));

        assert_eq!(
            serde_json::to_value(calculate(request)).unwrap(),
            json!({ "result": 3.0 })
        );
        assert_eq!(
            serde_json::to_value(CalculationResult::new(2.675).round()).unwrap(),
            json!({ "result": "2.68" })
        );
    }

    #[test]
    fn registered_chain_composes() {
        let registry = register(FunctionRegistry::builder()).build().unwrap();

        let sum: CalculationResult = registry
            .lookup(CALCULATE)
            .unwrap()
            .call(&CalculationRequest::new(1.0, 2.0))
            .unwrap();
        assert_eq!(sum.result(), 3.0);

        let rounded: RoundedResult = registry
            .lookup("calculate|round")
            .unwrap()
            .call(&CalculationRequest::new(2.675, 0.0))
            .unwrap();
        assert_eq!(rounded.result(), "2.68");
    }

    proptest! {
        #[test]
        fn calculate_is_plain_ieee_addition(a in -1.0e12f64..1.0e12f64, b in -1.0e12f64..1.0e12f64) {
            prop_assert_eq!(calculate(CalculationRequest::new(a, b)).result(), a + b);
        }

        #[test]
        fn rounded_sum_has_two_fractional_digits(a in -1.0e12f64..1.0e12f64, b in -1.0e12f64..1.0e12f64) {
            let rounded = calculate(CalculationRequest::new(a, b)).round();
            let (_, frac) = rounded.result().split_once('.').unwrap();
            prop_assert_eq!(frac.len(), 2);
        }
    }
}
