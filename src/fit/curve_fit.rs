//! Least-squares fit of a user-typed model `y = f(x; p…)`.
//!
//! The model is minimized with Levenberg-Marquardt.  Bounded parameters are
//! mapped onto an unbounded internal space (the MINUIT/lmfit transforms), so
//! the solver itself never sees a constraint.  Standard errors come from the
//! Jacobian at the solution: `sqrt(diag(s² (JᵀJ)⁻¹))` with `s² = SSR/(n - p)`.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::storage::Owned;
use nalgebra::{DMatrix, DVector, Dyn, Matrix, Vector};
use thiserror::Error;

use super::expr::{Expr, ExprError};

// ---------------------------------------------------------------------------
// Errors and options
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FitError {
    #[error("Invalid fit function: {0}")]
    Expression(#[from] ExprError),
    #[error("No parameter names given")]
    NoParameters,
    #[error("Invalid parameter name '{0}'")]
    InvalidName(String),
    #[error("Invalid number '{0}'")]
    InvalidNumber(String),
    #[error("Expected {expected} initial values, got {found}")]
    ParameterCount { expected: usize, found: usize },
    #[error("Expected {expected} {side} bounds, got {found}")]
    BoundsCount {
        side: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Lower bound of '{0}' is not below its upper bound")]
    InvalidBounds(String),
    #[error("Initial value of '{0}' is outside its bounds")]
    Infeasible(String),
    #[error("No data in the selected range!")]
    EmptyRange,
    #[error("Only {points} point(s) in range for {params} parameter(s)")]
    TooFewPoints { points: usize, params: usize },
    #[error("The model is not finite at the initial parameters")]
    NonFiniteModel,
    #[error("Optimal parameters not found: {0}")]
    NotConverged(String),
}

/// Solver settings.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Evaluation budget, in multiples of `(number of parameters + 1)`.
    pub max_patience: usize,
    pub ftol: f64,
    pub xtol: f64,
    /// Samples used to draw a model curve.
    pub samples: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_patience: 200,
            ftol: 1.49012e-8,
            xtol: 1.49012e-8,
            samples: 500,
        }
    }
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A fit function of `x` and named parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    expr: Expr,
    params: Vec<String>,
}

impl Model {
    /// Build a model from an expression and a comma-separated list of
    /// parameter names (`"a, b"`).
    pub fn new(expression: &str, param_names: &str) -> Result<Self, FitError> {
        let params: Vec<String> = param_names
            .split(',')
            .map(|p| p.trim().to_string())
            .collect();
        if params.len() == 1 && params[0].is_empty() {
            return Err(FitError::NoParameters);
        }
        for (i, p) in params.iter().enumerate() {
            let valid = p
                .chars()
                .next()
                .is_some_and(|c| c.is_alphabetic() || c == '_')
                && p.chars().all(|c| c.is_alphanumeric() || c == '_')
                && p != "x"
                && !params[..i].contains(p);
            if !valid {
                return Err(FitError::InvalidName(p.clone()));
            }
        }

        let mut names: Vec<&str> = Vec::with_capacity(params.len() + 1);
        names.push("x");
        names.extend(params.iter().map(String::as_str));
        let expr = Expr::parse(expression, &names)?;

        Ok(Self { expr, params })
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn expression(&self) -> &str {
        self.expr.source()
    }

    /// Evaluate at every `x` with parameter values `p`.
    pub fn eval_many(&self, x: &[f64], p: &[f64]) -> Vec<f64> {
        let mut slots = Vec::with_capacity(p.len() + 1);
        slots.push(0.0);
        slots.extend_from_slice(p);
        x.iter()
            .map(|&xi| {
                slots[0] = xi;
                self.expr.eval(&slots)
            })
            .collect()
    }

    /// `samples` evenly spaced points of the model over `[start, end]`.
    pub fn curve(&self, start: f64, end: f64, samples: usize, p: &[f64]) -> Vec<[f64; 2]> {
        let samples = samples.max(2);
        let step = (end - start) / (samples - 1) as f64;
        let xs: Vec<f64> = (0..samples).map(|i| start + step * i as f64).collect();
        let ys = self.eval_many(&xs, p);
        xs.into_iter().zip(ys).map(|(x, y)| [x, y]).collect()
    }
}

// ---------------------------------------------------------------------------
// Parameter bounds
// ---------------------------------------------------------------------------

/// Closed interval allowed for a parameter; infinite ends are open.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub lower: f64,
    pub upper: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::UNBOUNDED
    }
}

impl Bounds {
    pub const UNBOUNDED: Self = Self {
        lower: f64::NEG_INFINITY,
        upper: f64::INFINITY,
    };

    pub fn contains(&self, v: f64) -> bool {
        v >= self.lower && v <= self.upper
    }

    /// Move `v` a small step off a finite bound.  Both transforms are
    /// stationary at the bounds, where the solver would see no gradient.
    fn start_inside(self, v: f64) -> f64 {
        let width = self.upper - self.lower;
        let step = |at: f64| {
            let s = 1e-3 * at.abs().max(1.0);
            if width.is_finite() {
                s.min(width / 4.0)
            } else {
                s
            }
        };
        if self.lower.is_finite() && v <= self.lower {
            self.lower + step(self.lower)
        } else if self.upper.is_finite() && v >= self.upper {
            self.upper - step(self.upper)
        } else {
            v
        }
    }

    fn to_internal(self, v: f64) -> f64 {
        match (self.lower.is_finite(), self.upper.is_finite()) {
            (true, true) => {
                let t = 2.0 * (v - self.lower) / (self.upper - self.lower) - 1.0;
                t.clamp(-1.0, 1.0).asin()
            }
            (true, false) => ((v - self.lower + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            (false, true) => ((self.upper - v + 1.0).powi(2) - 1.0).max(0.0).sqrt(),
            (false, false) => v,
        }
    }

    fn to_external(self, u: f64) -> f64 {
        match (self.lower.is_finite(), self.upper.is_finite()) {
            (true, true) => self.lower + (u.sin() + 1.0) * (self.upper - self.lower) / 2.0,
            (true, false) => self.lower - 1.0 + (u * u + 1.0).sqrt(),
            (false, true) => self.upper + 1.0 - (u * u + 1.0).sqrt(),
            (false, false) => u,
        }
    }
}

/// Parse a comma-separated list of numbers (`"1, 2.5, -3e-2"`).
pub fn parse_values(text: &str) -> Result<Vec<f64>, FitError> {
    text.split(',')
        .map(str::trim)
        .map(|tok| {
            tok.parse::<f64>()
                .map_err(|_| FitError::InvalidNumber(tok.to_string()))
        })
        .collect()
}

/// Parse lower/upper bound lists.  An empty list leaves every parameter
/// unbounded; empty entries, `inf` and `-inf` leave one side open.
pub fn parse_bounds(lower: &str, upper: &str, n: usize) -> Result<Vec<Bounds>, FitError> {
    fn side(text: &str, n: usize, name: &'static str, open: f64) -> Result<Vec<f64>, FitError> {
        if text.trim().is_empty() {
            return Ok(vec![open; n]);
        }
        let values = text
            .split(',')
            .map(str::trim)
            .map(|tok| {
                if tok.is_empty() {
                    Ok(open)
                } else {
                    tok.parse::<f64>()
                        .map_err(|_| FitError::InvalidNumber(tok.to_string()))
                }
            })
            .collect::<Result<Vec<f64>, FitError>>()?;
        if values.len() != n {
            return Err(FitError::BoundsCount {
                side: name,
                expected: n,
                found: values.len(),
            });
        }
        Ok(values)
    }

    let lower = side(lower, n, "lower", f64::NEG_INFINITY)?;
    let upper = side(upper, n, "upper", f64::INFINITY)?;
    Ok(lower
        .into_iter()
        .zip(upper)
        .map(|(lower, upper)| Bounds { lower, upper })
        .collect())
}

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FittedParameter {
    pub name: String,
    pub value: f64,
    /// One standard error; infinite when it cannot be estimated.
    pub uncertainty: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    pub parameters: Vec<FittedParameter>,
    /// Points inside the fit range.
    pub points: usize,
    /// Sum of squared residuals at the solution.
    pub ssr: f64,
    pub evaluations: usize,
}

impl FitOutcome {
    pub fn values(&self) -> Vec<f64> {
        self.parameters.iter().map(|p| p.value).collect()
    }

    /// One `name = value +- error` line per parameter.
    pub fn summary(&self) -> String {
        self.parameters
            .iter()
            .map(|p| format!("{} = {:.3e} +- {:.3e}", p.name, p.value, p.uncertainty))
            .collect::<Vec<_>>()
            .join(";\n")
    }
}

// ---------------------------------------------------------------------------
// Solver glue
// ---------------------------------------------------------------------------

struct CurveProblem<'a> {
    model: &'a Model,
    x: &'a [f64],
    y: &'a [f64],
    bounds: &'a [Bounds],
    internal: DVector<f64>,
}

impl CurveProblem<'_> {
    fn external(&self, internal: &DVector<f64>) -> Vec<f64> {
        internal
            .iter()
            .zip(self.bounds)
            .map(|(&u, b)| b.to_external(u))
            .collect()
    }

    fn residuals_at(&self, internal: &DVector<f64>) -> Option<DVector<f64>> {
        let p = self.external(internal);
        residuals(self.model, self.x, self.y, &p)
    }
}

fn residuals(model: &Model, x: &[f64], y: &[f64], p: &[f64]) -> Option<DVector<f64>> {
    let fx = model.eval_many(x, p);
    let r = DVector::from_iterator(y.len(), fx.iter().zip(y).map(|(f, yi)| f - yi));
    if r.iter().all(|v| v.is_finite()) {
        Some(r)
    } else {
        None
    }
}

impl LeastSquaresProblem<f64, Dyn, Dyn> for CurveProblem<'_> {
    type ResidualStorage = Owned<f64, Dyn>;
    type JacobianStorage = Owned<f64, Dyn, Dyn>;
    type ParameterStorage = Owned<f64, Dyn>;

    fn set_params(&mut self, p: &Vector<f64, Dyn, Self::ParameterStorage>) {
        self.internal.copy_from(p);
    }

    fn params(&self) -> Vector<f64, Dyn, Self::ParameterStorage> {
        self.internal.clone()
    }

    fn residuals(&self) -> Option<Vector<f64, Dyn, Self::ResidualStorage>> {
        self.residuals_at(&self.internal)
    }

    fn jacobian(&self) -> Option<Matrix<f64, Dyn, Dyn, Self::JacobianStorage>> {
        // Forward differences in the internal space.
        let base = self.residuals_at(&self.internal)?;
        let mut jac = DMatrix::zeros(base.len(), self.internal.len());
        for j in 0..self.internal.len() {
            let h = f64::EPSILON.sqrt() * self.internal[j].abs().max(1.0);
            let mut shifted = self.internal.clone();
            shifted[j] += h;
            let r = self.residuals_at(&shifted)?;
            jac.set_column(j, &((r - &base) / h));
        }
        Some(jac)
    }
}

/// Central-difference Jacobian of the model in external parameters.
fn external_jacobian(model: &Model, x: &[f64], p: &[f64]) -> Option<DMatrix<f64>> {
    let mut jac = DMatrix::zeros(x.len(), p.len());
    for j in 0..p.len() {
        let h = f64::EPSILON.cbrt() * p[j].abs().max(1.0);
        let mut plus = p.to_vec();
        let mut minus = p.to_vec();
        plus[j] += h;
        minus[j] -= h;
        let fp = model.eval_many(x, &plus);
        let fm = model.eval_many(x, &minus);
        for (i, (a, b)) in fp.iter().zip(&fm).enumerate() {
            let d = (a - b) / (2.0 * h);
            if !d.is_finite() {
                return None;
            }
            jac[(i, j)] = d;
        }
    }
    Some(jac)
}

/// Standard errors from `s² (JᵀJ)⁻¹`; infinite when the covariance is not
/// estimable (singular Jacobian or no degrees of freedom).
fn standard_errors(model: &Model, x: &[f64], p: &[f64], ssr: f64) -> Vec<f64> {
    let unknown = vec![f64::INFINITY; p.len()];
    if x.len() <= p.len() {
        log::warn!("Covariance of the parameters could not be estimated: no degrees of freedom");
        return unknown;
    }
    let Some(jac) = external_jacobian(model, x, p) else {
        return unknown;
    };
    let Some(inv) = (jac.transpose() * &jac).try_inverse() else {
        log::warn!("Covariance of the parameters could not be estimated: singular Jacobian");
        return unknown;
    };
    let s_sq = ssr / (x.len() - p.len()) as f64;
    (0..p.len())
        .map(|i| {
            let var = inv[(i, i)] * s_sq;
            if var >= 0.0 {
                var.sqrt()
            } else {
                f64::INFINITY
            }
        })
        .collect()
}

/// Fit `model` to the points with `start <= x <= end`.
pub fn curve_fit(
    model: &Model,
    x: &[f64],
    y: &[f64],
    (start, end): (f64, f64),
    initial: &[f64],
    bounds: &[Bounds],
    options: &FitOptions,
) -> Result<FitOutcome, FitError> {
    let n_params = model.params().len();
    if initial.len() != n_params {
        return Err(FitError::ParameterCount {
            expected: n_params,
            found: initial.len(),
        });
    }
    let bounds: Vec<Bounds> = if bounds.is_empty() {
        vec![Bounds::UNBOUNDED; n_params]
    } else if bounds.len() == n_params {
        bounds.to_vec()
    } else {
        return Err(FitError::BoundsCount {
            side: "parameter",
            expected: n_params,
            found: bounds.len(),
        });
    };
    for ((name, b), &v) in model.params().iter().zip(&bounds).zip(initial) {
        if b.lower >= b.upper {
            return Err(FitError::InvalidBounds(name.clone()));
        }
        if !b.contains(v) {
            return Err(FitError::Infeasible(name.clone()));
        }
    }

    let (lo, hi) = if start <= end { (start, end) } else { (end, start) };
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|&(&xi, &yi)| xi >= lo && xi <= hi && yi.is_finite())
        .map(|(&xi, &yi)| (xi, yi))
        .unzip();
    if xs.is_empty() {
        return Err(FitError::EmptyRange);
    }
    if xs.len() < n_params {
        return Err(FitError::TooFewPoints {
            points: xs.len(),
            params: n_params,
        });
    }
    if residuals(model, &xs, &ys, initial).is_none() {
        return Err(FitError::NonFiniteModel);
    }

    let internal = DVector::from_iterator(
        n_params,
        initial
            .iter()
            .zip(&bounds)
            .map(|(&v, b)| b.to_internal(b.start_inside(v))),
    );
    let problem = CurveProblem {
        model,
        x: &xs,
        y: &ys,
        bounds: &bounds,
        internal,
    };

    let (problem, report) = LevenbergMarquardt::new()
        .with_ftol(options.ftol)
        .with_xtol(options.xtol)
        .with_patience(options.max_patience)
        .minimize(problem);

    if !report.termination.was_successful() {
        log::error!("Fit did not converge: {:?}", report.termination);
        return Err(FitError::NotConverged(format!(
            "{:?} after {} evaluations",
            report.termination, report.number_of_evaluations
        )));
    }

    let values = problem.external(&problem.internal);
    let ssr = residuals(model, &xs, &ys, &values)
        .map(|r| r.norm_squared())
        .ok_or(FitError::NonFiniteModel)?;
    let errors = standard_errors(model, &xs, &values, ssr);

    let parameters = model
        .params()
        .iter()
        .zip(values.iter().zip(errors))
        .map(|(name, (&value, uncertainty))| FittedParameter {
            name: name.clone(),
            value,
            uncertainty,
        })
        .collect();

    Ok(FitOutcome {
        parameters,
        points: xs.len(),
        ssr,
        evaluations: report.number_of_evaluations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect()
    }

    #[test]
    fn recovers_line_parameters() {
        let model = Model::new("a*(x - b)", "a, b").unwrap();
        let x = linspace(-1.0, 1.0, 50);
        let y = model.eval_many(&x, &[2.0, 0.5]);

        let outcome = curve_fit(
            &model,
            &x,
            &y,
            (-1.0, 1.0),
            &[1.0, 1.0],
            &[],
            &FitOptions::default(),
        )
        .unwrap();
        let values = outcome.values();
        assert!((values[0] - 2.0).abs() < 1e-6, "{values:?}");
        assert!((values[1] - 0.5).abs() < 1e-6, "{values:?}");
        assert_eq!(outcome.points, 50);
    }

    #[test]
    fn fits_a_noisy_loop_branch_with_errors() {
        let model = Model::new("ms*np.tanh((x - hc)/w)", "ms, hc, w").unwrap();
        let x = linspace(-3.0, 3.0, 121);
        let y: Vec<f64> = model
            .eval_many(&x, &[1.2, 0.4, 0.7])
            .into_iter()
            .enumerate()
            .map(|(i, v)| v + 0.002 * (i as f64 * 1.7).sin())
            .collect();

        let outcome = curve_fit(
            &model,
            &x,
            &y,
            (-3.0, 3.0),
            &[1.0, 0.0, 1.0],
            &[],
            &FitOptions::default(),
        )
        .unwrap();
        let v = outcome.values();
        assert!((v[0] - 1.2).abs() < 0.01, "{v:?}");
        assert!((v[1] - 0.4).abs() < 0.01, "{v:?}");
        assert!((v[2] - 0.7).abs() < 0.01, "{v:?}");
        for p in &outcome.parameters {
            assert!(p.uncertainty.is_finite() && p.uncertainty > 0.0);
        }
        assert!(outcome.summary().starts_with("ms = "));
    }

    #[test]
    fn only_points_in_range_are_used() {
        let model = Model::new("a", "a").unwrap();
        let x = [0.0, 1.0, 2.0, 3.0];
        let y = [10.0, 1.0, 3.0, 10.0];
        let outcome = curve_fit(
            &model,
            &x,
            &y,
            (1.0, 2.0),
            &[0.0],
            &[],
            &FitOptions::default(),
        )
        .unwrap();
        assert!((outcome.values()[0] - 2.0).abs() < 1e-6);
        assert_eq!(outcome.points, 2);
    }

    #[test]
    fn bounded_fit_recovers_interior_value() {
        let model = Model::new("a*x + b", "a, b").unwrap();
        let x = linspace(0.0, 1.0, 20);
        let y = model.eval_many(&x, &[1.5, -0.25]);
        let bounds = parse_bounds("0, -1", "2, 1", 2).unwrap();
        let outcome = curve_fit(
            &model,
            &x,
            &y,
            (0.0, 1.0),
            &[0.5, 0.0],
            &bounds,
            &FitOptions::default(),
        )
        .unwrap();
        let v = outcome.values();
        assert!((v[0] - 1.5).abs() < 1e-6, "{v:?}");
        assert!((v[1] + 0.25).abs() < 1e-6, "{v:?}");
    }

    #[test]
    fn bounds_hold_parameters() {
        let model = Model::new("a*x", "a").unwrap();
        let x = linspace(0.0, 1.0, 20);
        let y = model.eval_many(&x, &[3.0]);
        let bounds = parse_bounds("0", "2", 1).unwrap();
        let outcome = curve_fit(
            &model,
            &x,
            &y,
            (0.0, 1.0),
            &[1.0],
            &bounds,
            &FitOptions::default(),
        )
        .unwrap();
        let a = outcome.values()[0];
        assert!((a - 2.0).abs() < 1e-3, "{a}");
    }

    #[test]
    fn fit_starting_on_a_bound_moves_away_from_it() {
        let model = Model::new("a*x", "a").unwrap();
        let x = linspace(0.0, 1.0, 20);
        let y = model.eval_many(&x, &[3.0]);
        for (lower, upper, start) in [("0", "", 0.0), ("0", "5", 0.0), ("", "5", 5.0)] {
            let bounds = parse_bounds(lower, upper, 1).unwrap();
            let outcome = curve_fit(
                &model,
                &x,
                &y,
                (0.0, 1.0),
                &[start],
                &bounds,
                &FitOptions::default(),
            )
            .unwrap();
            let a = outcome.values()[0];
            assert!((a - 3.0).abs() < 1e-3, "[{lower}, {upper}]: {a}");
            assert!(outcome.ssr < 1e-6, "[{lower}, {upper}]: {}", outcome.ssr);
            assert!(outcome.evaluations > 1);
        }
    }

    #[test]
    fn error_messages_start_with_a_capital() {
        let errors = [
            FitError::EmptyRange,
            FitError::NoParameters,
            FitError::NonFiniteModel,
            FitError::InvalidNumber("x1".into()),
            FitError::ParameterCount { expected: 2, found: 1 },
            FitError::Expression(ExprError::Empty),
        ];
        for err in errors {
            let msg = err.to_string();
            assert!(msg.starts_with(char::is_uppercase), "{msg}");
        }
        assert_eq!(
            FitError::ParameterCount { expected: 2, found: 1 }.to_string(),
            "Expected 2 initial values, got 1"
        );
    }

    #[test]
    fn start_inside_steps_off_finite_bounds() {
        let b = Bounds {
            lower: 0.0,
            upper: f64::INFINITY,
        };
        assert!(b.start_inside(0.0) > 0.0);
        assert_eq!(b.start_inside(1.0), 1.0);
        let b = Bounds {
            lower: 0.0,
            upper: 0.001,
        };
        let v = b.start_inside(0.001);
        assert!(v > 0.0 && v < 0.001, "{v}");
    }

    #[test]
    fn bound_transforms_round_trip_inside_the_interval() {
        for b in [
            Bounds { lower: -1.0, upper: 4.0 },
            Bounds { lower: 0.5, upper: f64::INFINITY },
            Bounds { lower: f64::NEG_INFINITY, upper: 2.0 },
        ] {
            let v = 1.5;
            assert!((b.to_external(b.to_internal(v)) - v).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_bad_requests() {
        let model = Model::new("a*x + b", "a, b").unwrap();
        let x = [0.0, 1.0, 2.0];
        let y = [0.0, 1.0, 2.0];
        let opts = FitOptions::default();

        assert_eq!(
            curve_fit(&model, &x, &y, (0.0, 2.0), &[1.0], &[], &opts).unwrap_err(),
            FitError::ParameterCount { expected: 2, found: 1 }
        );
        assert_eq!(
            curve_fit(&model, &x, &y, (5.0, 6.0), &[1.0, 1.0], &[], &opts).unwrap_err(),
            FitError::EmptyRange
        );
        let bounds = parse_bounds("2, ", "", 2).unwrap();
        assert_eq!(
            curve_fit(&model, &x, &y, (0.0, 2.0), &[1.0, 1.0], &bounds, &opts).unwrap_err(),
            FitError::Infeasible("a".into())
        );
        let log_model = Model::new("log(a*x)", "a").unwrap();
        assert_eq!(
            curve_fit(&log_model, &x, &y, (0.0, 2.0), &[1.0], &[], &opts).unwrap_err(),
            FitError::NonFiniteModel
        );
    }

    #[test]
    fn model_validates_parameter_names() {
        assert_eq!(Model::new("x", " ").unwrap_err(), FitError::NoParameters);
        assert_eq!(
            Model::new("a*x", "a, a").unwrap_err(),
            FitError::InvalidName("a".into())
        );
        assert_eq!(
            Model::new("a*x", "a, x").unwrap_err(),
            FitError::InvalidName("x".into())
        );
        assert!(matches!(
            Model::new("a*q", "a").unwrap_err(),
            FitError::Expression(ExprError::UnknownName(_))
        ));
    }

    #[test]
    fn parses_value_lists() {
        assert_eq!(parse_values("1, 2.5 ,-3e-1").unwrap(), vec![1.0, 2.5, -0.3]);
        assert_eq!(
            parse_values("1, two").unwrap_err(),
            FitError::InvalidNumber("two".into())
        );
        let bounds = parse_bounds("", "inf, 3", 2).unwrap();
        assert_eq!(bounds[0], Bounds::UNBOUNDED);
        assert_eq!(bounds[1].upper, 3.0);
        assert!(matches!(
            parse_bounds("1", "", 2).unwrap_err(),
            FitError::BoundsCount { .. }
        ));
    }

    #[test]
    fn curve_spans_the_range() {
        let model = Model::new("2*x", "a").unwrap();
        let pts = model.curve(0.0, 1.0, 500, &[0.0]);
        assert_eq!(pts.len(), 500);
        assert_eq!(pts[0], [0.0, 0.0]);
        assert!((pts[499][0] - 1.0).abs() < 1e-12);
    }
}
