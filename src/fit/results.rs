use std::collections::BTreeMap;

use super::curve_fit::FitOutcome;

/// Named values shared between the fit window and the command console.
///
/// A fit of parameter `p` stores `p` and `error_p`; the console may add or
/// remove its own names.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FitResults {
    values: BTreeMap<String, f64>,
}

impl FitResults {
    /// Store every parameter of `outcome` and its standard error.
    pub fn record(&mut self, outcome: &FitOutcome) {
        for p in &outcome.parameters {
            self.values.insert(p.name.clone(), p.value);
            self.values.insert(format!("error_{}", p.name), p.uncertainty);
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    pub fn set(&mut self, name: impl Into<String>, value: f64) {
        self.values.insert(name.into(), value);
    }

    pub fn remove(&mut self, name: &str) -> Option<f64> {
        self.values.remove(name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.values.keys().map(String::as_str).collect()
    }

    /// Values in name order, matching [`FitResults::names`].
    pub fn values(&self) -> Vec<f64> {
        self.values.values().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::curve_fit::FittedParameter;

    #[test]
    fn records_values_and_errors() {
        let outcome = FitOutcome {
            parameters: vec![FittedParameter {
                name: "hc".into(),
                value: 12.5,
                uncertainty: 0.3,
            }],
            points: 10,
            ssr: 0.0,
            evaluations: 4,
        };
        let mut results = FitResults::default();
        results.record(&outcome);
        assert_eq!(results.get("hc"), Some(12.5));
        assert_eq!(results.get("error_hc"), Some(0.3));
        assert_eq!(results.names(), vec!["error_hc", "hc"]);
        assert_eq!(results.values(), vec![0.3, 12.5]);
    }
}
