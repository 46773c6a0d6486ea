//! Augmented Dickey-Fuller unit-root test (constant, no trend).
//!
//! Regression: Δx[t] = α + γ·x[t] + Σ δᵢ·Δx[t-i] + ε, i = 1..p
//!
//! - p is chosen by minimum AIC over 0..=maxlag, with every candidate fitted on
//!   the common sample left after dropping maxlag observations.
//! - maxlag = ceil(12·(n/100)^¼), capped at n/2 - 2.
//! - The statistic is the t-value of γ; its p-value comes from MacKinnon's
//!   (1994) response surface for a single series with constant.
//!
//! A low p-value rejects the unit root, i.e. the window looks mean reverting.

use statrs::function::erf::erfc;

use crate::domain::error::StatisticError;

const TAU_MAX_C: f64 = 2.74;
const TAU_MIN_C: f64 = -18.83;
const TAU_STAR_C: f64 = -1.61;
const TAU_C_SMALLP: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_C_LARGEP: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdfResult {
    pub statistic: f64,
    pub p_value: f64,
    pub used_lag: usize,
    pub nobs: usize,
}

pub fn adfuller(series: &[f64]) -> Result<AdfResult, StatisticError> {
    let n = series.len();
    let cap = (n / 2) as i64 - 2;
    if n < 4 || cap < 0 {
        return Err(StatisticError::TooFewObservations { observations: n });
    }
    if series.iter().any(|v| !v.is_finite()) {
        return Err(StatisticError::NonFinite);
    }
    let first = series[0];
    if series.iter().all(|&v| v == first) {
        return Err(StatisticError::DegenerateWindow);
    }

    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as i64;
    let maxlag = schwert.min(cap) as usize;

    let diff: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();

    let mut best: Option<(f64, usize)> = None;
    for lag in 0..=maxlag {
        let (y, x) = design(series, &diff, lag, maxlag);
        let fit = ols(&y, &x)?;
        let aic = fit.aic();
        match best {
            Some((best_aic, _)) if aic >= best_aic => {}
            _ => best = Some((aic, lag)),
        }
    }
    let used_lag = best.map(|(_, lag)| lag).unwrap_or(0);

    let (y, x) = design(series, &diff, used_lag, used_lag);
    let fit = ols(&y, &x)?;
    let se = fit.std_errors()?;
    let statistic = fit.params[1] / se[1];
    if !statistic.is_finite() {
        return Err(StatisticError::NonFinite);
    }

    Ok(AdfResult {
        statistic,
        p_value: mackinnon_p_value(statistic),
        used_lag,
        nobs: y.len(),
    })
}

/// Approximate p-value of an ADF statistic (one series, constant only).
pub fn mackinnon_p_value(statistic: f64) -> f64 {
    if statistic > TAU_MAX_C {
        return 1.0;
    }
    if statistic < TAU_MIN_C {
        return 0.0;
    }
    let coef: &[f64] = if statistic <= TAU_STAR_C {
        &TAU_C_SMALLP
    } else {
        &TAU_C_LARGEP
    };
    let z = coef.iter().rev().fold(0.0, |acc, c| acc * statistic + c);
    normal_cdf(z)
}

fn normal_cdf(z: f64) -> f64 {
    0.5 * erfc(-z / std::f64::consts::SQRT_2)
}

/// Rows t = skip..diff.len(): y = Δx[t], regressors [1, x[t], Δx[t-1], .., Δx[t-lag]].
fn design(series: &[f64], diff: &[f64], lag: usize, skip: usize) -> (Vec<f64>, Vec<Vec<f64>>) {
    let rows = diff.len() - skip;
    let mut y = Vec::with_capacity(rows);
    let mut x = Vec::with_capacity(rows);
    for t in skip..diff.len() {
        y.push(diff[t]);
        let mut row = Vec::with_capacity(lag + 2);
        row.push(1.0);
        row.push(series[t]);
        for i in 1..=lag {
            row.push(diff[t - i]);
        }
        x.push(row);
    }
    (y, x)
}

#[derive(Debug)]
struct OlsFit {
    params: Vec<f64>,
    xtx_inv: Vec<Vec<f64>>,
    ssr: f64,
    nobs: usize,
}

impl OlsFit {
    fn k(&self) -> usize {
        self.params.len()
    }

    fn aic(&self) -> f64 {
        let n = self.nobs as f64;
        let llf = -n / 2.0 * ((2.0 * std::f64::consts::PI).ln() + (self.ssr / n).ln() + 1.0);
        -2.0 * llf + 2.0 * self.k() as f64
    }

    fn std_errors(&self) -> Result<Vec<f64>, StatisticError> {
        let df_resid = self.nobs.checked_sub(self.k()).filter(|&df| df > 0).ok_or(
            StatisticError::TooFewObservations {
                observations: self.nobs,
            },
        )?;
        let sigma2 = self.ssr / df_resid as f64;
        Ok((0..self.k())
            .map(|i| (sigma2 * self.xtx_inv[i][i]).sqrt())
            .collect())
    }
}

fn ols(y: &[f64], x: &[Vec<f64>]) -> Result<OlsFit, StatisticError> {
    let nobs = y.len();
    let k = x.first().map(|row| row.len()).unwrap_or(0);
    if nobs <= k {
        return Err(StatisticError::TooFewObservations { observations: nobs });
    }

    let mut xtx = vec![vec![0.0; k]; k];
    let mut xty = vec![0.0; k];
    for (row, &yi) in x.iter().zip(y) {
        for i in 0..k {
            xty[i] += row[i] * yi;
            for j in i..k {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for i in 0..k {
        for j in 0..i {
            xtx[i][j] = xtx[j][i];
        }
    }

    let xtx_inv = invert(xtx)?;
    let params: Vec<f64> = xtx_inv
        .iter()
        .map(|r| r.iter().zip(&xty).map(|(a, b)| a * b).sum())
        .collect();

    let ssr = x
        .iter()
        .zip(y)
        .map(|(row, &yi)| {
            let fitted: f64 = row.iter().zip(&params).map(|(a, b)| a * b).sum();
            (yi - fitted).powi(2)
        })
        .sum();

    Ok(OlsFit {
        params,
        xtx_inv,
        ssr,
        nobs,
    })
}

/// Gauss-Jordan inversion with partial pivoting.
fn invert(mut a: Vec<Vec<f64>>) -> Result<Vec<Vec<f64>>, StatisticError> {
    let n = a.len();
    let scale = (0..n).map(|i| a[i][i].abs()).fold(0.0, f64::max);
    let tolerance = scale * 1e-13;
    let mut inv: Vec<Vec<f64>> = (0..n)
        .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
        .collect();

    for col in 0..n {
        let pivot_row = (col..n)
            .max_by(|&r1, &r2| a[r1][col].abs().total_cmp(&a[r2][col].abs()))
            .unwrap_or(col);
        if !(a[pivot_row][col].abs() > tolerance) {
            return Err(StatisticError::SingularMatrix);
        }
        a.swap(col, pivot_row);
        inv.swap(col, pivot_row);

        let pivot = a[col][col];
        for j in 0..n {
            a[col][j] /= pivot;
            inv[col][j] /= pivot;
        }

        for row in 0..n {
            if row == col {
                continue;
            }
            let factor = a[row][col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..n {
                a[row][j] -= factor * a[col][j];
                inv[row][j] -= factor * inv[col][j];
            }
        }
    }

    Ok(inv)
}
