//! Query templates and experiment suites

use std::fmt;
use std::io::{self, Error, ErrorKind};

use serde::{Deserialize, Serialize};

use crate::core::config::Suite;

const SLOT: &str = "{}";

/// SQL text with exactly two `{}` slots: table size exponent, then lambda body
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", into = "String")]
pub struct QueryTemplate(String);

impl QueryTemplate {
    pub fn parse(template: &str) -> io::Result<Self> {
        let slots = template.matches(SLOT).count();
        if slots != 2 {
            return Err(Error::new(
                ErrorKind::InvalidInput,
                format!("Query template needs exactly 2 '{{}}' slots, found {}: {}", slots, template),
            ));
        }
        Ok(Self(template.to_string()))
    }

    /// Fill the size slot and the lambda slot, in that order
    pub fn render(&self, size: &str, lambda_body: &str) -> String {
        let mut parts = self.0.splitn(3, SLOT);
        let head = parts.next().unwrap_or_default();
        let middle = parts.next().unwrap_or_default();
        let tail = parts.next().unwrap_or_default();
        let mut query = String::with_capacity(self.0.len() + size.len() + lambda_body.len());
        query.push_str(head);
        query.push_str(size);
        query.push_str(middle);
        query.push_str(lambda_body);
        query.push_str(tail);
        query
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for QueryTemplate {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<QueryTemplate> for String {
    fn from(template: QueryTemplate) -> Self {
        template.0
    }
}

impl fmt::Display for QueryTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One benchmark phase: session setup, a template swept over exponents, teardown
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ExperimentSpec {
    pub name: String,
    pub template: QueryTemplate,
    pub label: u32,
    /// Falls back to the global `MaxExponent` when absent
    #[serde(default)]
    pub max_exponent: Option<u32>,
    #[serde(default)]
    pub setup: Vec<String>,
    #[serde(default)]
    pub teardown: Vec<String>,
}

// ============================================================================
// BUILT-IN SUITES
// ============================================================================

const JIT_OFF: &[&str] = &["set jit='off'"];

const JIT_FORCED: &[&str] = &[
    "set jit='on'",
    "load 'llvmjit.so'",
    "set jit_above_cost = 0",
    "set jit_inline_above_cost = 0",
    "set jit_optimize_above_cost = 0",
];

/// Template for a table-valued function taking the `perftests<n>` rows and a lambda
pub fn lambda_function_template(function: &str) -> QueryTemplate {
    QueryTemplate(format!(
        "select * from {}((select x, y, z from perftests{{}}), (lambda(a)({{}})))",
        function
    ))
}

/// Trailing arguments of the gradient-descent functions
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescentParameters {
    pub iterations: u32,
    /// Leading columns replaced by coefficients; all three of `x, y, z`
    pub num_atts: u32,
    /// Rows per coefficient update; the smallest table has 10 rows
    pub batch_size: u32,
    pub learning_rate: f64,
}

pub const DESCENT_PARAMETERS: DescentParameters = DescentParameters {
    iterations: 5,
    num_atts: 3,
    batch_size: 10,
    learning_rate: 0.001,
};

/// Like [`lambda_function_template`], followed by iterations, attribute count, batch size and learning rate
pub fn descent_function_template(function: &str, params: DescentParameters) -> QueryTemplate {
    QueryTemplate(format!(
        "select * from {}((select x, y, z from perftests{{}}), (lambda(a)({{}})), {}, {}, {}, {:?})",
        function, params.iterations, params.num_atts, params.batch_size, params.learning_rate
    ))
}

fn experiment(name: &str, function: &str, label: u32, setup: &[&str]) -> ExperimentSpec {
    with_template(name, lambda_function_template(function), label, setup)
}

fn descent_experiment(name: &str, function: &str, label: u32, setup: &[&str]) -> ExperimentSpec {
    with_template(name, descent_function_template(function, DESCENT_PARAMETERS), label, setup)
}

fn with_template(name: &str, template: QueryTemplate, label: u32, setup: &[&str]) -> ExperimentSpec {
    ExperimentSpec {
        name: name.to_string(),
        template,
        label,
        max_exponent: None,
        setup: setup.iter().map(|s| s.to_string()).collect(),
        teardown: Vec::new(),
    }
}

/// JIT-off baseline, then forced JIT for the same function and the two deeper levels
pub fn builtin_suite(suite: Suite) -> Vec<ExperimentSpec> {
    match suite {
        Suite::Autodiff => vec![
            experiment("jit-off", "autodiff_l1_2", 1, JIT_OFF),
            experiment("jit-forced", "autodiff_l1_2", 2, JIT_FORCED),
            experiment("l3", "autodiff_l3", 3, &[]),
            experiment("l4", "autodiff_l4", 4, &[]),
        ],
        Suite::AutodiffTiming => vec![
            experiment("timing-jit-off", "autodiff_t_l2", 1, JIT_OFF),
            experiment("timing-jit-forced", "autodiff_t_l2", 2, JIT_FORCED),
            experiment("timing-l3", "autodiff_t_l3", 3, &[]),
            experiment("timing-l4", "autodiff_t_l4", 4, &[]),
        ],
        Suite::GradientDescent => vec![
            descent_experiment("gd-jit-off", "gradient_descent_l1_2", 1, JIT_OFF),
            descent_experiment("gd-jit-forced", "gradient_descent_l1_2", 2, JIT_FORCED),
            descent_experiment("gd-l3", "gradient_descent_l3", 3, &[]),
            descent_experiment("gd-l4", "gradient_descent_l4", 4, &[]),
        ],
        Suite::GradientDescentMomentum => vec![
            descent_experiment("gdm-jit-off", "gradient_descent_m_l1_2", 1, JIT_OFF),
            descent_experiment("gdm-jit-forced", "gradient_descent_m_l1_2", 2, JIT_FORCED),
            descent_experiment("gdm-l3", "gradient_descent_m_l3", 3, &[]),
            descent_experiment("gdm-l4", "gradient_descent_m_l4", 4, &[]),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_size_then_lambda() {
        let template = QueryTemplate::parse("select {} {}").unwrap();
        assert_eq!(template.render("3", "a.x"), "select 3 a.x");
    }

    #[test]
    fn rendered_builtin_query_has_no_open_slots() {
        let template = lambda_function_template("autodiff_l3");
        let query = template.render("4", "sin(a.x) / cos(a.y) + sqrt(a.z)");
        assert_eq!(
            query,
            "select * from autodiff_l3((select x, y, z from perftests4), (lambda(a)(sin(a.x) / cos(a.y) + sqrt(a.z))))"
        );
        assert!(!query.contains(SLOT));
    }

    #[test]
    fn wrong_slot_count_is_rejected() {
        assert_eq!(QueryTemplate::parse("select 1").unwrap_err().kind(), ErrorKind::InvalidInput);
        assert!(QueryTemplate::parse("select {}").is_err());
        assert!(QueryTemplate::parse("select {} {} {}").is_err());
    }

    #[test]
    fn builtin_suites_are_valid_templates() {
        for suite in [
            Suite::Autodiff,
            Suite::AutodiffTiming,
            Suite::GradientDescent,
            Suite::GradientDescentMomentum,
        ] {
            for spec in builtin_suite(suite) {
                QueryTemplate::parse(spec.template.as_str()).unwrap();
            }
        }
    }

    #[test]
    fn autodiff_suite_forces_jit_before_second_phase() {
        let suite = builtin_suite(Suite::Autodiff);
        let labels: Vec<u32> = suite.iter().map(|s| s.label).collect();
        assert_eq!(labels, vec![1, 2, 3, 4]);
        assert_eq!(suite[0].setup, vec!["set jit='off'"]);
        assert_eq!(suite[1].setup.len(), 5);
        assert!(suite[1].setup.iter().any(|s| s == "set jit_optimize_above_cost = 0"));
        assert!(suite[2].setup.is_empty() && suite[3].setup.is_empty());
        assert_eq!(suite[0].template, suite[1].template);
    }

    #[test]
    fn gradient_descent_query_carries_training_arguments() {
        let suite = builtin_suite(Suite::GradientDescent);
        let query = suite[2].template.render("2", "a.x * a.y");
        assert_eq!(
            query,
            "select * from gradient_descent_l3((select x, y, z from perftests2), (lambda(a)(a.x * a.y)), 5, 3, 10, 0.001)"
        );
        assert_eq!(suite[0].template, suite[1].template);
        assert_eq!(suite[1].setup, JIT_FORCED);
    }

    #[test]
    fn momentum_suite_uses_momentum_functions() {
        let suite = builtin_suite(Suite::GradientDescentMomentum);
        let functions: Vec<bool> = suite
            .iter()
            .map(|s| s.template.as_str().starts_with("select * from gradient_descent_m_"))
            .collect();
        assert_eq!(functions, vec![true; 4]);
        assert!(suite[3].template.as_str().contains("gradient_descent_m_l4("));
    }
}
