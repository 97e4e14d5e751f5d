//! Target and drifted portfolio weights.
//!
//! A [`WeightVector`] maps asset identifiers to signed weights expressed as a
//! fraction of balance. Negative weights are short or borrowed exposure.
//! An asset that is absent from the map, or whose weight is non-finite, has
//! an undefined weight.

use std::collections::{BTreeMap, BTreeSet};

use super::error::RebalanceError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeightVector {
    weights: BTreeMap<String, f64>,
}

impl WeightVector {
    pub fn new() -> Self {
        Self::default()
    }

    /// All-zero vector over the given assets.
    pub fn zeros<I, S>(assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        assets.into_iter().map(|a| (a, 0.0)).collect()
    }

    pub fn insert(&mut self, asset: impl Into<String>, weight: f64) {
        self.weights.insert(asset.into(), weight);
    }

    pub fn get(&self, asset: &str) -> Option<f64> {
        self.weights.get(asset).copied()
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(a, &w)| (a.as_str(), w))
    }

    pub fn assets(&self) -> impl Iterator<Item = &str> {
        self.weights.keys().map(String::as_str)
    }

    /// Entries actually held: undefined and zero weights removed.
    pub fn held(&self) -> WeightVector {
        self.iter()
            .filter(|&(_, w)| w.is_finite() && w != 0.0)
            .collect()
    }

    /// Sum of absolute defined weights.
    pub fn gross(&self) -> f64 {
        self.weights
            .values()
            .filter(|w| w.is_finite())
            .map(|w| w.abs())
            .sum()
    }

    /// Sum of signed defined weights.
    pub fn net(&self) -> f64 {
        self.weights.values().filter(|w| w.is_finite()).sum()
    }

    /// Assets whose weight is non-finite.
    pub fn non_finite(&self) -> Vec<String> {
        self.weights
            .iter()
            .filter(|(_, w)| !w.is_finite())
            .map(|(a, _)| a.clone())
            .collect()
    }

    /// Pairs both vectors over the union of their assets, filling missing
    /// entries with zero.
    ///
    /// Blank identifiers and non-finite weights cannot be aligned and are
    /// reported with the offending assets.
    pub fn align(&self, other: &WeightVector) -> Result<Vec<(String, f64, f64)>, RebalanceError> {
        let union: BTreeSet<&String> = self.weights.keys().chain(other.weights.keys()).collect();

        let blank: Vec<&str> = union
            .iter()
            .filter(|a| a.trim().is_empty())
            .map(|a| a.as_str())
            .collect();
        if !blank.is_empty() {
            return Err(RebalanceError::invalid_input(format!(
                "cannot align weights: {} blank asset identifier(s)",
                blank.len()
            )));
        }

        let aligned: Vec<(String, f64, f64)> = union
            .into_iter()
            .map(|asset| {
                let left = self.weights.get(asset).copied().unwrap_or(0.0);
                let right = other.weights.get(asset).copied().unwrap_or(0.0);
                (asset.clone(), left, right)
            })
            .collect();

        let bad: Vec<&str> = aligned
            .iter()
            .filter(|(_, l, r)| !l.is_finite() || !r.is_finite())
            .map(|(a, _, _)| a.as_str())
            .collect();
        if !bad.is_empty() {
            return Err(RebalanceError::invalid_input(format!(
                "cannot align weights: non-finite weight for {}",
                bad.join(", ")
            )));
        }

        Ok(aligned)
    }

    /// Sum of absolute weight changes between `self` and `other`.
    pub fn turnover(&self, other: &WeightVector) -> Result<f64, RebalanceError> {
        Ok(self
            .align(other)?
            .iter()
            .map(|(_, l, r)| (l - r).abs())
            .sum())
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for WeightVector {
    fn from_iter<T: IntoIterator<Item = (S, f64)>>(iter: T) -> Self {
        WeightVector {
            weights: iter.into_iter().map(|(a, w)| (a.into(), w)).collect(),
        }
    }
}
