//! User-typed model expressions such as `a*tanh((x - b)/c) + d*x`.
//!
//! Parsing is done by `meval`; this module supplies the names, constants
//! and functions an expression may use and maps failures to [`ExprError`].

use meval::{ContextProvider, FuncEvalError};
use thiserror::Error;

/// Prefixes tolerated in front of names (`np.exp(x)`), longest first.
const MODULE_PREFIXES: [&str; 4] = ["scipy.special.", "numpy.", "math.", "np."];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("Invalid expression: {0}")]
    Syntax(String),
    #[error("Name '{0}' is not defined")]
    UnknownName(String),
    #[error("Unknown function '{0}'")]
    UnknownFunction(String),
    #[error("Wrong arguments for {name}(): {reason}")]
    Arity { name: String, reason: String },
    #[error("The expression is empty")]
    Empty,
}

impl From<meval::Error> for ExprError {
    fn from(err: meval::Error) -> Self {
        match err {
            meval::Error::UnknownVariable(name) => Self::UnknownName(name),
            meval::Error::Function(name, FuncEvalError::UnknownFunction) => {
                Self::UnknownFunction(name)
            }
            meval::Error::Function(name, e) => Self::Arity {
                name,
                reason: e.to_string(),
            },
            other => Self::Syntax(other.to_string()),
        }
    }
}

/// A parsed expression whose free names are fixed at parse time.
#[derive(Debug, Clone)]
pub struct Expr {
    source: String,
    parsed: meval::Expr,
    names: Vec<String>,
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source && self.names == other.names
    }
}

impl Expr {
    /// Parse `source`; `names` are the variables `eval` will receive, in
    /// order. Unknown names and functions are reported here rather than
    /// at evaluation.
    pub fn parse(source: &str, names: &[&str]) -> Result<Self, ExprError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(ExprError::Empty);
        }
        let parsed: meval::Expr = normalize_source(source).parse()?;
        let expr = Self {
            source: source.to_string(),
            parsed,
            names: names.iter().map(|n| n.to_string()).collect(),
        };
        let zeros = vec![0.0; expr.names.len()];
        expr.parsed.eval_with_context(expr.scope(&zeros))?;
        Ok(expr)
    }

    /// Evaluate with `values[i]` bound to the i-th name given to `parse`.
    /// Values missing from the slice evaluate to NaN.
    pub fn eval(&self, values: &[f64]) -> f64 {
        self.parsed
            .eval_with_context(self.scope(values))
            .unwrap_or(f64::NAN)
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    fn scope<'a>(&'a self, values: &'a [f64]) -> Scope<'a> {
        Scope {
            names: &self.names,
            values,
        }
    }
}

/// `**` becomes `^` and module prefixes are dropped where a name starts.
fn normalize_source(source: &str) -> String {
    let source = source.replace("**", "^");
    let mut out = String::with_capacity(source.len());
    let mut rest = source.as_str();
    let mut prev: Option<char> = None;
    while let Some(ch) = rest.chars().next() {
        let at_name_start = !prev.is_some_and(|p| p.is_alphanumeric() || p == '_' || p == '.');
        if at_name_start {
            if let Some(prefix) = MODULE_PREFIXES.iter().find(|p| rest.starts_with(*p)) {
                rest = &rest[prefix.len()..];
                continue;
            }
        }
        out.push(ch);
        prev = Some(ch);
        rest = &rest[ch.len_utf8()..];
    }
    out
}

struct Scope<'a> {
    names: &'a [String],
    values: &'a [f64],
}

impl ContextProvider for Scope<'_> {
    fn get_var(&self, name: &str) -> Option<f64> {
        if let Some(i) = self.names.iter().position(|n| n == name) {
            return Some(self.values.get(i).copied().unwrap_or(f64::NAN));
        }
        match name {
            "pi" => Some(std::f64::consts::PI),
            "e" => Some(std::f64::consts::E),
            "inf" => Some(f64::INFINITY),
            "nan" => Some(f64::NAN),
            _ => None,
        }
    }

    fn eval_func(&self, name: &str, args: &[f64]) -> Result<f64, FuncEvalError> {
        if let Some(f) = unary(name) {
            return match args {
                [x] => Ok(f(*x)),
                _ => Err(FuncEvalError::NumberArgs(1)),
            };
        }
        if let Some(f) = binary(name) {
            return match args {
                [a, b] => Ok(f(*a, *b)),
                _ => Err(FuncEvalError::NumberArgs(2)),
            };
        }
        Err(FuncEvalError::UnknownFunction)
    }
}

fn unary(name: &str) -> Option<fn(f64) -> f64> {
    Some(match name {
        "abs" | "fabs" => f64::abs,
        "sqrt" => f64::sqrt,
        "exp" => f64::exp,
        "log" | "ln" => f64::ln,
        "log10" => f64::log10,
        "log2" => f64::log2,
        "sin" => f64::sin,
        "cos" => f64::cos,
        "tan" => f64::tan,
        "asin" | "arcsin" => f64::asin,
        "acos" | "arccos" => f64::acos,
        "atan" | "arctan" => f64::atan,
        "sinh" => f64::sinh,
        "cosh" => f64::cosh,
        "tanh" => f64::tanh,
        "asinh" | "arcsinh" => f64::asinh,
        "acosh" | "arccosh" => f64::acosh,
        "atanh" | "arctanh" => f64::atanh,
        "erf" => statrs::function::erf::erf,
        "erfc" => statrs::function::erf::erfc,
        "sign" => sign,
        "langevin" => langevin,
        _ => return None,
    })
}

fn binary(name: &str) -> Option<fn(f64, f64) -> f64> {
    Some(match name {
        "atan2" | "arctan2" => f64::atan2,
        "pow" => f64::powf,
        "min" => f64::min,
        "max" => f64::max,
        _ => return None,
    })
}

fn sign(x: f64) -> f64 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

/// L(x) = coth(x) - 1/x, with its series near zero.
fn langevin(x: f64) -> f64 {
    if x.abs() < 1e-4 {
        x / 3.0 - x.powi(3) / 45.0
    } else {
        1.0 / x.tanh() - 1.0 / x
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(src: &str, names: &[&str], values: &[f64]) -> f64 {
        Expr::parse(src, names).unwrap().eval(values)
    }

    #[test]
    fn respects_precedence_and_associativity() {
        assert_eq!(eval("1 + 2 * 3", &[], &[]), 7.0);
        assert_eq!(eval("(1 + 2) * 3", &[], &[]), 9.0);
        assert_eq!(eval("2 ** 3 ** 2", &[], &[]), 512.0);
        assert_eq!(eval("-2 ** 2", &[], &[]), -4.0);
        assert_eq!(eval("2 ^ -1", &[], &[]), 0.5);
        assert_eq!(eval("8 / 4 / 2", &[], &[]), 1.0);
        assert!((eval("1e-3 * 2e2", &[], &[]) - 0.2).abs() < 1e-15);
    }

    #[test]
    fn binds_names_in_order() {
        let v = eval("a*(x - b)", &["x", "a", "b"], &[3.0, 2.0, 1.0]);
        assert_eq!(v, 4.0);
    }

    #[test]
    fn missing_values_give_nan() {
        assert!(eval("a + b", &["a", "b"], &[1.0]).is_nan());
    }

    #[test]
    fn accepts_numpy_prefixes() {
        let v = eval("np.exp(0) + numpy.cos(0) + math.fabs(-1)", &[], &[]);
        assert_eq!(v, 3.0);
        assert_eq!(eval("np.pi", &[], &[]), std::f64::consts::PI);
        assert!((eval("scipy.special.erf(0)", &[], &[])).abs() < 1e-15);
        // only stripped where a name starts
        assert_eq!(normalize_source("snp.x + np.y"), "snp.x + y");
    }

    #[test]
    fn bound_names_shadow_constants() {
        assert_eq!(eval("e", &["e"], &[2.0]), 2.0);
        assert_eq!(eval("e", &[], &[]), std::f64::consts::E);
    }

    #[test]
    fn special_functions() {
        assert!((eval("erf(0.5)", &[], &[]) - 0.520_499_877_813_046_5).abs() < 1e-12);
        assert!((eval("erf(3)", &[], &[]) - 0.999_977_909_503_001_4).abs() < 1e-12);
        assert!((eval("erfc(-1)", &[], &[]) - 1.842_700_792_949_715).abs() < 1e-12);
        assert!((eval("langevin(1)", &[], &[]) - 0.313_035_285_499_331_3).abs() < 1e-12);
        assert!(eval("langevin(0)", &[], &[]).abs() < 1e-15);
        assert_eq!(eval("max(1, min(5, 3))", &[], &[]), 3.0);
        assert_eq!(eval("sign(-4) + sign(0)", &[], &[]), -1.0);
    }

    #[test]
    fn reports_errors() {
        assert_eq!(
            Expr::parse("a * y", &["a"]).unwrap_err(),
            ExprError::UnknownName("y".into())
        );
        assert_eq!(
            Expr::parse("foo(1)", &[]).unwrap_err(),
            ExprError::UnknownFunction("foo".into())
        );
        assert!(matches!(
            Expr::parse("exp(1, 2)", &[]).unwrap_err(),
            ExprError::Arity { name, .. } if name == "exp"
        ));
        assert!(matches!(
            Expr::parse("(1 + 2", &[]).unwrap_err(),
            ExprError::Syntax(_)
        ));
        assert!(matches!(
            Expr::parse("1 + $", &[]).unwrap_err(),
            ExprError::Syntax(_)
        ));
        assert_eq!(Expr::parse("   ", &[]).unwrap_err(), ExprError::Empty);
    }

    #[test]
    fn error_messages_read_as_sentences() {
        let err = Expr::parse("a * y", &["a"]).unwrap_err();
        assert_eq!(err.to_string(), "Name 'y' is not defined");
    }
}
