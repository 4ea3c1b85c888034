//! Ordinary least squares for the regression part of a regression-with-SARIMA-errors model.

use crate::model::error::ModelError;
use serde::{Deserialize, Serialize};

/// Intercept and one coefficient per regressor column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OlsFit {
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl OlsFit {
    pub fn num_regressors(&self) -> usize {
        self.coefficients.len()
    }

    /// `intercept + Σ β_i x_i` for every row of the column-major `regressors`.
    pub fn predict(&self, regressors: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        if regressors.len() != self.coefficients.len() {
            return Err(ModelError::RegressorCount {
                expected: self.coefficients.len(),
                got: regressors.len(),
            });
        }
        let n = regressors.first().map_or(0, Vec::len);
        let mut predictions = vec![self.intercept; n];
        for (beta, column) in self.coefficients.iter().zip(regressors) {
            if column.len() != n {
                return Err(ModelError::DimensionMismatch {
                    expected: n,
                    got: column.len(),
                });
            }
            for (p, x) in predictions.iter_mut().zip(column) {
                *p += beta * x;
            }
        }
        Ok(predictions)
    }

    /// `y - ŷ`.
    pub fn residuals(&self, y: &[f64], regressors: &[Vec<f64>]) -> Result<Vec<f64>, ModelError> {
        let fitted = self.predict(regressors)?;
        if fitted.len() != y.len() {
            return Err(ModelError::DimensionMismatch {
                expected: y.len(),
                got: fitted.len(),
            });
        }
        Ok(y.iter().zip(fitted).map(|(a, f)| a - f).collect())
    }
}

/// Fits `y = β0 + Σ β_i x_i` through the normal equations, solved by Cholesky
/// decomposition with a small ridge on the diagonal.
pub fn ols_fit(y: &[f64], regressors: &[Vec<f64>]) -> Result<OlsFit, ModelError> {
    let n = y.len();
    if n == 0 {
        return Err(ModelError::EmptyData);
    }
    for column in regressors {
        if column.len() != n {
            return Err(ModelError::DimensionMismatch {
                expected: n,
                got: column.len(),
            });
        }
    }
    if y.iter().chain(regressors.iter().flatten()).any(|v| !v.is_finite()) {
        return Err(ModelError::NonFinite);
    }

    let k = regressors.len();
    let dim = k + 1;
    let mut xtx = vec![vec![0.0; dim]; dim];
    let mut xty = vec![0.0; dim];

    let mut row = vec![1.0; dim];
    for obs in 0..n {
        for (j, column) in regressors.iter().enumerate() {
            row[j + 1] = column[obs];
        }
        for i in 0..dim {
            xty[i] += row[i] * y[obs];
            for j in 0..=i {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..dim {
        for j in 0..i {
            xtx[j][i] = xtx[i][j];
        }
        xtx[i][i] += 1e-8;
    }

    let beta = solve_symmetric(&xtx, &xty).ok_or(ModelError::SingularDesign)?;
    Ok(OlsFit {
        intercept: beta[0],
        coefficients: beta[1..].to_vec(),
    })
}

/// Solves `A x = b` for symmetric positive definite `A`.
fn solve_symmetric(a: &[Vec<f64>], b: &[f64]) -> Option<Vec<f64>> {
    let n = b.len();
    if n == 0 || a.len() != n {
        return None;
    }

    let mut l = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..=i {
            let mut sum = a[i][j];
            for k in 0..j {
                sum -= l[i][k] * l[j][k];
            }
            if i == j {
                if sum <= 0.0 {
                    return None;
                }
                l[i][j] = sum.sqrt();
            } else {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    let mut z = vec![0.0; n];
    for i in 0..n {
        let sum: f64 = (0..i).map(|j| l[i][j] * z[j]).sum();
        z[i] = (b[i] - sum) / l[i][i];
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let sum: f64 = (i + 1..n).map(|j| l[j][i] * x[j]).sum();
        x[i] = (z[i] - sum) / l[i][i];
    }
    Some(x)
}
