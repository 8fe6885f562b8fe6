//! Rhai-backed [`Evaluator`].

use crate::error::{LabFlowError, Result};
use crate::scripting::Evaluator;
use crate::types::{is_missing, MISSING_VALUE};
use rhai::{Dynamic, Engine, Scope, AST};

/// Evaluates a compiled Rhai expression once per row.
pub struct RhaiEvaluator {
    engine: Engine,
    ast: AST,
    source: String,
}

impl RhaiEvaluator {
    /// Compile `source`. Fails if the expression does not parse.
    pub fn new(source: &str) -> Result<Self> {
        let mut engine = Engine::new();
        Self::configure_engine(&mut engine);
        let ast = engine
            .compile(source)
            .map_err(|e| LabFlowError::Evaluator(format!("Compilation error: {}", e)))?;
        Ok(Self {
            engine,
            ast,
            source: source.to_string(),
        })
    }

    /// Configure the Rhai engine with built-in functions and safety limits
    fn configure_engine(engine: &mut Engine) {
        engine.set_max_expr_depths(64, 64);
        engine.set_max_call_levels(32);
        engine.set_max_operations(10_000);
        engine.set_max_string_size(10_000);
        engine.set_max_array_size(1_000);
        engine.set_max_map_size(1_000);

        // Missing values
        engine.register_fn("nan", || MISSING_VALUE);
        engine.register_fn("is_missing", is_missing);
        engine.register_fn("is_missing", |_: i64| false);
        engine.register_fn("or_else", |x: f64, fallback: f64| {
            if is_missing(x) {
                fallback
            } else {
                x
            }
        });

        engine.register_fn("abs", |x: f64| x.abs());
        engine.register_fn("sqrt", |x: f64| x.sqrt());
        engine.register_fn("pow", |x: f64, y: f64| x.powf(y));
        engine.register_fn("exp", |x: f64| x.exp());
        engine.register_fn("ln", |x: f64| x.ln());
        engine.register_fn("log10", |x: f64| x.log10());
        engine.register_fn("sin", |x: f64| x.sin());
        engine.register_fn("cos", |x: f64| x.cos());
        engine.register_fn("tan", |x: f64| x.tan());
        engine.register_fn("atan2", |y: f64, x: f64| y.atan2(x));

        engine.register_fn("floor", |x: f64| x.floor());
        engine.register_fn("ceil", |x: f64| x.ceil());
        engine.register_fn("round", |x: f64| x.round());

        engine.register_fn("clamp", |x: f64, min: f64, max: f64| {
            // f64::clamp panics on inverted or NaN bounds
            if min <= max {
                x.clamp(min, max)
            } else {
                MISSING_VALUE
            }
        });
        engine.register_fn("min", |a: f64, b: f64| a.min(b));
        engine.register_fn("max", |a: f64, b: f64| a.max(b));

        engine.register_fn("pi", || std::f64::consts::PI);
    }

    /// Check an expression without keeping it.
    pub fn validate(source: &str) -> Result<()> {
        Self::new(source).map(|_| ())
    }

    pub fn source(&self) -> &str {
        &self.source
    }
}

impl Evaluator for RhaiEvaluator {
    fn evaluate(&self, variables: &[f64]) -> Result<f64> {
        let mut scope = Scope::new();
        scope.push("x", variables.first().copied().unwrap_or(MISSING_VALUE));
        for (i, value) in variables.iter().enumerate() {
            scope.push(format!("x{}", i + 1), *value);
        }

        let v = self
            .engine
            .eval_ast_with_scope::<Dynamic>(&mut scope, &self.ast)
            .map_err(LabFlowError::from_rhai_error)?;
        if let Ok(f) = v.as_float() {
            Ok(f)
        } else if let Ok(i) = v.as_int() {
            Ok(i as f64)
        } else {
            Err(LabFlowError::Evaluator(format!(
                "Expression must return a numeric value, got {}",
                v.type_name()
            )))
        }
    }
}

impl std::fmt::Debug for RhaiEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RhaiEvaluator")
            .field("source", &self.source)
            .finish()
    }
}
