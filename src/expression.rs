//! Data-driven paint expressions.
//!
//! A typed tree over the subset of the rendering engine's expression
//! vocabulary this crate emits:
//! - `feature-state`, `zoom`, `literal`, `boolean`
//! - `interpolate` (linear only)
//! - `case`, `match`, `in`
//! - Comparison: `==`, `<`, `>`
//!
//! [`Expression::to_json`] produces the engine's nested-array form and
//! [`Expression::from_json`] parses it back. [`Expression::evaluate`]
//! evaluates a tree against one feature's runtime state.

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::color::Rgba;
use crate::data::Category;
use crate::error::{Error, Result};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `==`
    Eq,
    /// `<`
    Lt,
    /// `>`
    Gt,
}

impl Comparison {
    fn op(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Lt => "<",
            Comparison::Gt => ">",
        }
    }
}

/// A declarative expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// `null`
    Null,
    /// Boolean constant.
    Bool(bool),
    /// Numeric constant.
    Number(f64),
    /// String constant.
    String(String),
    /// Color constant, serialized as a CSS string.
    Color(Rgba),
    /// `["literal", [..]]`
    Literal(Vec<Expression>),
    /// `["feature-state", name]`
    FeatureState(String),
    /// `["boolean", input, fallback]`
    Boolean(Box<Expression>, bool),
    /// `["zoom"]`
    Zoom,
    /// `["interpolate", ["linear"], input, stop0, out0, ...]`
    Interpolate {
        /// Interpolation input.
        input: Box<Expression>,
        /// Strictly ascending `(stop, output)` pairs.
        stops: Vec<(f64, Expression)>,
    },
    /// `["case", cond0, out0, ..., fallback]`
    Case {
        /// `(condition, output)` pairs tested in order.
        branches: Vec<(Expression, Expression)>,
        /// Output when no condition holds.
        fallback: Box<Expression>,
    },
    /// `["match", input, label0, out0, ..., fallback]`
    Match {
        /// Value matched against labels.
        input: Box<Expression>,
        /// `(label, output)` pairs.
        arms: Vec<(Category, Expression)>,
        /// Output when no label matches.
        fallback: Box<Expression>,
    },
    /// `[op, left, right]`
    Compare {
        /// Operator.
        op: Comparison,
        /// Left operand.
        left: Box<Expression>,
        /// Right operand.
        right: Box<Expression>,
    },
    /// `["in", needle, ["literal", [..]]]`
    In {
        /// Value searched for.
        needle: Box<Expression>,
        /// Candidates.
        haystack: Vec<Expression>,
    },
}

impl Expression {
    /// `["feature-state", name]`.
    #[must_use]
    pub fn feature_state(name: &str) -> Self {
        Expression::FeatureState(name.to_string())
    }

    /// Linear interpolation of `input` through `stops`.
    #[must_use]
    pub fn interpolate(input: Expression, stops: Vec<(f64, Expression)>) -> Self {
        Expression::Interpolate {
            input: Box::new(input),
            stops,
        }
    }

    /// Conditional with a fallback.
    #[must_use]
    pub fn case(branches: Vec<(Expression, Expression)>, fallback: Expression) -> Self {
        Expression::Case {
            branches,
            fallback: Box::new(fallback),
        }
    }

    /// Label match with a fallback.
    #[must_use]
    pub fn matching(
        input: Expression,
        arms: Vec<(Category, Expression)>,
        fallback: Expression,
    ) -> Self {
        Expression::Match {
            input: Box::new(input),
            arms,
            fallback: Box::new(fallback),
        }
    }

    /// `[op, left, right]`.
    #[must_use]
    pub fn compare(op: Comparison, left: Expression, right: Expression) -> Self {
        Expression::Compare {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// `["in", needle, ["literal", haystack]]`.
    #[must_use]
    pub fn is_in(needle: Expression, haystack: Vec<Expression>) -> Self {
        Expression::In {
            needle: Box::new(needle),
            haystack,
        }
    }

    /// `(input, stops)` when this is a linear interpolation.
    #[must_use]
    pub fn as_interpolation(&self) -> Option<(&Expression, &[(f64, Expression)])> {
        match self {
            Expression::Interpolate { input, stops } => Some((input, stops)),
            _ => None,
        }
    }

    /// Numeric value of a constant.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Expression::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Nested-array JSON form understood by the rendering engine.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Expression::Null => Value::Null,
            Expression::Bool(b) => Value::Bool(*b),
            Expression::Number(n) => Value::from(*n),
            Expression::String(s) => Value::String(s.clone()),
            Expression::Color(c) => Value::String(c.to_css()),
            Expression::Literal(items) => {
                let items = items.iter().map(Expression::to_json).collect();
                op("literal", [Value::Array(items)])
            }
            Expression::FeatureState(name) => op("feature-state", [Value::String(name.clone())]),
            Expression::Boolean(input, fallback) => {
                op("boolean", [input.to_json(), Value::Bool(*fallback)])
            }
            Expression::Zoom => op("zoom", []),
            Expression::Interpolate { input, stops } => {
                let mut args = vec![op("linear", []), input.to_json()];
                for (stop, output) in stops {
                    args.push(Value::from(*stop));
                    args.push(output.to_json());
                }
                op("interpolate", args)
            }
            Expression::Case { branches, fallback } => {
                let mut args = Vec::with_capacity(branches.len() * 2 + 1);
                for (condition, output) in branches {
                    args.push(condition.to_json());
                    args.push(output.to_json());
                }
                args.push(fallback.to_json());
                op("case", args)
            }
            Expression::Match {
                input,
                arms,
                fallback,
            } => {
                let mut args = vec![input.to_json()];
                for (label, output) in arms {
                    args.push(label.to_json());
                    args.push(output.to_json());
                }
                args.push(fallback.to_json());
                op("match", args)
            }
            Expression::Compare {
                op: cmp,
                left,
                right,
            } => op(cmp.op(), [left.to_json(), right.to_json()]),
            Expression::In { needle, haystack } => {
                let literal = Expression::Literal(haystack.clone()).to_json();
                op("in", [needle.to_json(), literal])
            }
        }
    }

    /// Parse the JSON form produced by [`Expression::to_json`].
    ///
    /// Strings stay strings; colors are not re-typed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedExpression`] for operators outside the
    /// supported vocabulary or operands of the wrong shape.
    pub fn from_json(value: &Value) -> Result<Self> {
        match value {
            Value::Null => Ok(Expression::Null),
            Value::Bool(b) => Ok(Expression::Bool(*b)),
            Value::Number(n) => n
                .as_f64()
                .map(Expression::Number)
                .ok_or_else(|| malformed(value)),
            Value::String(s) => Ok(Expression::String(s.clone())),
            Value::Object(_) => Err(malformed(value)),
            Value::Array(arr) => parse_array(arr),
        }
    }

    /// Evaluate against a feature's runtime state.
    ///
    /// Type mismatches evaluate to `null`, which the rendering engine treats as
    /// "use the property default".
    #[must_use]
    pub fn evaluate(&self, ctx: &EvalContext<'_>) -> Value {
        match self {
            Expression::Null => Value::Null,
            Expression::Bool(b) => Value::Bool(*b),
            Expression::Number(n) => Value::from(*n),
            Expression::String(s) => Value::String(s.clone()),
            Expression::Color(c) => Value::String(c.to_css()),
            Expression::Literal(items) => {
                Value::Array(items.iter().map(|e| e.evaluate(ctx)).collect())
            }
            Expression::FeatureState(name) => ctx.state.get(name).cloned().unwrap_or(Value::Null),
            Expression::Boolean(input, fallback) => match input.evaluate(ctx) {
                Value::Bool(b) => Value::Bool(b),
                _ => Value::Bool(*fallback),
            },
            Expression::Zoom => Value::from(ctx.zoom),
            Expression::Interpolate { input, stops } => match input.evaluate(ctx).as_f64() {
                Some(x) => eval_interpolate(x, stops, ctx),
                None => Value::Null,
            },
            Expression::Case { branches, fallback } => {
                let hit = branches
                    .iter()
                    .find(|(condition, _)| condition.evaluate(ctx) == Value::Bool(true));
                match hit {
                    Some((_, output)) => output.evaluate(ctx),
                    None => fallback.evaluate(ctx),
                }
            }
            Expression::Match {
                input,
                arms,
                fallback,
            } => {
                let value = input.evaluate(ctx);
                let hit = arms
                    .iter()
                    .find(|(label, _)| values_equal(&label.to_json(), &value));
                match hit {
                    Some((_, output)) => output.evaluate(ctx),
                    None => fallback.evaluate(ctx),
                }
            }
            Expression::Compare { op, left, right } => {
                let (l, r) = (left.evaluate(ctx), right.evaluate(ctx));
                let numbers = l.as_f64().zip(r.as_f64());
                let result = match op {
                    Comparison::Eq => values_equal(&l, &r),
                    Comparison::Lt => matches!(numbers, Some((a, b)) if a < b),
                    Comparison::Gt => matches!(numbers, Some((a, b)) if a > b),
                };
                Value::Bool(result)
            }
            Expression::In { needle, haystack } => {
                let value = needle.evaluate(ctx);
                let found = haystack
                    .iter()
                    .any(|candidate| values_equal(&candidate.evaluate(ctx), &value));
                Value::Bool(found)
            }
        }
    }
}

impl From<f64> for Expression {
    fn from(n: f64) -> Self {
        Expression::Number(n)
    }
}

impl From<Rgba> for Expression {
    fn from(c: Rgba) -> Self {
        Expression::Color(c)
    }
}

impl Serialize for Expression {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

/// Evaluation context: one feature's runtime state and the current zoom.
#[derive(Debug, Clone, Copy)]
pub struct EvalContext<'a> {
    /// Feature-state map (`value`, `valueAbs`, `hover`, ...).
    pub state: &'a Map<String, Value>,
    /// Current zoom level.
    pub zoom: f64,
}

impl<'a> EvalContext<'a> {
    /// Create a context.
    #[must_use]
    pub fn new(state: &'a Map<String, Value>, zoom: f64) -> Self {
        Self { state, zoom }
    }
}

fn op<I: IntoIterator<Item = Value>>(name: &str, args: I) -> Value {
    let mut arr = vec![Value::String(name.to_string())];
    arr.extend(args);
    Value::Array(arr)
}

fn malformed(value: &Value) -> Error {
    Error::MalformedExpression(value.to_string())
}

fn values_equal(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn eval_interpolate(x: f64, stops: &[(f64, Expression)], ctx: &EvalContext<'_>) -> Value {
    let (Some(first), Some(last)) = (stops.first(), stops.last()) else {
        return Value::Null;
    };
    if x <= first.0 {
        return first.1.evaluate(ctx);
    }
    if x >= last.0 {
        return last.1.evaluate(ctx);
    }

    let upper = stops
        .iter()
        .position(|(stop, _)| *stop > x)
        .unwrap_or(stops.len() - 1);
    let (lo_stop, lo_out) = &stops[upper - 1];
    let (hi_stop, hi_out) = &stops[upper];
    let t = (x - lo_stop) / (hi_stop - lo_stop);

    let (lo, hi) = (lo_out.evaluate(ctx), hi_out.evaluate(ctx));
    if let (Some(a), Some(b)) = (lo.as_f64(), hi.as_f64()) {
        return Value::from(a + (b - a) * t);
    }
    if let (Some(a), Some(b)) = (lo.as_str(), hi.as_str()) {
        if let (Ok(a), Ok(b)) = (Rgba::from_hex(a), Rgba::from_hex(b)) {
            return Value::String(a.lerp(b, t as f32).to_css());
        }
    }
    lo
}

fn parse_array(arr: &[Value]) -> Result<Expression> {
    let whole = || Error::MalformedExpression(Value::Array(arr.to_vec()).to_string());
    let name = arr.first().and_then(Value::as_str).ok_or_else(whole)?;
    let args = &arr[1..];

    match (name, args) {
        ("literal", [Value::Array(items)]) => {
            let items: Result<Vec<_>> = items.iter().map(Expression::from_json).collect();
            Ok(Expression::Literal(items?))
        }
        ("feature-state", [Value::String(field)]) => Ok(Expression::FeatureState(field.clone())),
        ("boolean", [input, Value::Bool(fallback)]) => {
            Ok(Expression::Boolean(Box::new(Expression::from_json(input)?), *fallback))
        }
        ("zoom", []) => Ok(Expression::Zoom),
        ("interpolate", [kind, input, rest @ ..]) => {
            let kind = kind.as_array().map(Vec::as_slice);
            let linear = matches!(kind, Some([k]) if *k == "linear");
            if !linear || rest.is_empty() || rest.len() % 2 != 0 {
                return Err(whole());
            }
            let stops = rest
                .chunks(2)
                .map(|pair| {
                    let stop = pair[0].as_f64().ok_or_else(whole)?;
                    Ok((stop, Expression::from_json(&pair[1])?))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::interpolate(Expression::from_json(input)?, stops))
        }
        ("case", rest) if rest.len() % 2 == 1 => {
            let (pairs, fallback) = rest.split_at(rest.len() - 1);
            let branches = pairs
                .chunks(2)
                .map(|pair| {
                    let condition = Expression::from_json(&pair[0])?;
                    Ok((condition, Expression::from_json(&pair[1])?))
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(Expression::case(branches, Expression::from_json(&fallback[0])?))
        }
        ("match", [input, rest @ ..]) if rest.len() % 2 == 1 => {
            let (pairs, fallback) = rest.split_at(rest.len() - 1);
            let arms = pairs
                .chunks(2)
                .map(|pair| {
                    let label = match &pair[0] {
                        Value::Number(n) => Category::Number(n.as_f64().ok_or_else(whole)?),
                        Value::String(s) => Category::Text(s.clone()),
                        _ => return Err(whole()),
                    };
                    Ok((label, Expression::from_json(&pair[1])?))
                })
                .collect::<Result<Vec<_>>>()?;
            let input = Expression::from_json(input)?;
            let fallback = Expression::from_json(&fallback[0])?;
            Ok(Expression::matching(input, arms, fallback))
        }
        ("==" | "<" | ">", [left, right]) => {
            let cmp = match name {
                "==" => Comparison::Eq,
                "<" => Comparison::Lt,
                _ => Comparison::Gt,
            };
            let left = Expression::from_json(left)?;
            let right = Expression::from_json(right)?;
            Ok(Expression::compare(cmp, left, right))
        }
        ("in", [needle, haystack]) => match Expression::from_json(haystack)? {
            Expression::Literal(items) => {
                Ok(Expression::is_in(Expression::from_json(needle)?, items))
            }
            _ => Err(whole()),
        },
        _ => Err(whole()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state(value: Value) -> Map<String, Value> {
        let mut map = Map::new();
        let abs = value.as_f64().map_or(Value::Null, |v| json!(v.abs()));
        map.insert("value".to_string(), value);
        map.insert("valueAbs".to_string(), abs);
        map
    }

    fn ramp() -> Expression {
        let stops = vec![(0.0, 2.0.into()), (100.0, 25.0.into())];
        Expression::interpolate(Expression::feature_state("value"), stops)
    }

    fn hidden_for_zero_or_null() -> Expression {
        let zero_or_null = vec![0.0.into(), Expression::Null];
        let condition = Expression::is_in(Expression::feature_state("value"), zero_or_null);
        Expression::case(vec![(condition, 0.0.into())], 0.8.into())
    }

    #[test]
    fn test_interpolate_json_shape() {
        let expected = json!([
            "interpolate",
            ["linear"],
            ["feature-state", "value"],
            0.0,
            2.0,
            100.0,
            25.0,
        ]);
        assert_eq!(ramp().to_json(), expected);
    }

    #[test]
    fn test_case_and_in_json_shape() {
        let expected = json!([
            "case",
            ["in", ["feature-state", "value"], ["literal", [0.0, null]]],
            0.0,
            0.8,
        ]);
        assert_eq!(hidden_for_zero_or_null().to_json(), expected);
    }

    #[test]
    fn test_json_round_trip_through_parser() {
        let red = Expression::String("#ff0000".to_string());
        let expr = Expression::matching(
            Expression::feature_state("category"),
            vec![(Category::from("rail"), red)],
            Expression::String("#808080".to_string()),
        );
        assert_eq!(Expression::from_json(&expr.to_json()).unwrap(), expr);
        assert_eq!(Expression::from_json(&ramp().to_json()).unwrap(), ramp());
    }

    #[test]
    fn test_from_json_rejects_unknown() {
        let step = json!(["step", ["zoom"], 1, 5, 2]);
        assert!(Expression::from_json(&step).is_err());
        let exponential = json!(["interpolate", ["exponential", 2], ["zoom"], 0, 1]);
        assert!(Expression::from_json(&exponential).is_err());
        assert!(Expression::from_json(&json!({"stops": []})).is_err());
        assert!(Expression::from_json(&json!([])).is_err());
    }

    #[test]
    fn test_evaluate_interpolate() {
        let s = state(json!(50.0));
        let ctx = EvalContext::new(&s, 10.0);
        assert_eq!(ramp().evaluate(&ctx), json!(13.5));
    }

    #[test]
    fn test_evaluate_interpolate_clamps_and_nulls() {
        let below = state(json!(-10.0));
        assert_eq!(ramp().evaluate(&EvalContext::new(&below, 0.0)), json!(2.0));
        let missing = state(Value::Null);
        let ctx = EvalContext::new(&missing, 0.0);
        assert_eq!(ramp().evaluate(&ctx), Value::Null);
    }

    #[test]
    fn test_evaluate_color_interpolation() {
        let expr = Expression::interpolate(
            Expression::feature_state("value"),
            vec![(0.0, Rgba::BLACK.into()), (10.0, Rgba::WHITE.into())],
        );
        let s = state(json!(5.0));
        assert_eq!(expr.evaluate(&EvalContext::new(&s, 0.0)), json!("#808080"));
    }

    #[test]
    fn test_evaluate_case_in_null() {
        let expr = hidden_for_zero_or_null();
        for (value, expected) in [
            (json!(0), json!(0.0)),
            (Value::Null, json!(0.0)),
            (json!(3), json!(0.8)),
        ] {
            let s = state(value);
            assert_eq!(expr.evaluate(&EvalContext::new(&s, 0.0)), expected);
        }
    }

    #[test]
    fn test_evaluate_match_numeric_labels() {
        let expr = Expression::matching(
            Expression::feature_state("value"),
            vec![(Category::Number(1.0), Expression::String("yes".into()))],
            Expression::String("no".into()),
        );
        let one = state(json!(1));
        let two = state(json!(2));
        assert_eq!(expr.evaluate(&EvalContext::new(&one, 0.0)), json!("yes"));
        assert_eq!(expr.evaluate(&EvalContext::new(&two, 0.0)), json!("no"));
    }

    #[test]
    fn test_evaluate_comparisons() {
        let s = state(json!(5.0));
        let ctx = EvalContext::new(&s, 0.0);
        let value = || Expression::feature_state("value");
        let lt = Expression::compare(Comparison::Lt, value(), 10.0.into());
        let gt = Expression::compare(Comparison::Gt, value(), 10.0.into());
        let eq = Expression::compare(Comparison::Eq, value(), 5.0.into());
        assert_eq!(lt.evaluate(&ctx), json!(true));
        assert_eq!(gt.evaluate(&ctx), json!(false));
        assert_eq!(eq.evaluate(&ctx), json!(true));

        let missing = state(Value::Null);
        let ctx = EvalContext::new(&missing, 0.0);
        assert_eq!(lt.evaluate(&ctx), json!(false));
    }

    #[test]
    fn test_evaluate_boolean_and_zoom() {
        let s = Map::new();
        let ctx = EvalContext::new(&s, 7.5);
        let hover = Expression::Boolean(Box::new(Expression::feature_state("hover")), false);
        assert_eq!(hover.evaluate(&ctx), json!(false));
        assert_eq!(Expression::Zoom.evaluate(&ctx), json!(7.5));
    }

    #[test]
    fn test_serialize_matches_to_json() {
        let serialized = serde_json::to_value(ramp()).unwrap();
        assert_eq!(serialized, ramp().to_json());
    }
}
