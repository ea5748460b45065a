//! Price forecasting over the stored sample series.
//!
//! The stored series is irregular (fetch failures leave holes), so every
//! forecast first resamples it onto a uniform one-sample-per-minute grid,
//! filling gaps by linear interpolation between the nearest known points.
//! Two models are available behind the same entry point; the caller picks
//! one per request. A caller-supplied bias is added uniformly to every
//! forecast point; it is display-side slack, not part of either model.
//!
//! The numerics (closed-form least squares, a small regularized
//! normal-equation solver) are self-contained.

use chrono::NaiveDateTime;

use crate::config::TIMESTAMP_FORMAT;
use crate::error::{BitforcastError, Result};
use crate::models::PriceSample;

/// Autoregressive lag order of the ARIMA(5,1,0) model.
const AR_ORDER: usize = 5;

/// Ridge term keeping the normal equations solvable when lag columns are
/// collinear (e.g. a perfectly linear history has constant differences).
const RIDGE: f64 = 1e-8;

/// Forecasting strategy, selected explicitly per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForecastModel {
    /// Ordinary least-squares trend extrapolation over the time index.
    LinearTrend,
    /// ARIMA(5,1,0): AR(5) on the first-differenced series, fit by
    /// conditional least squares.
    Arima,
}

/// Forecast `horizon` future per-minute prices from the stored series.
///
/// `samples` must be in ascending id order. Returns exactly `horizon` points
/// with `bias` added to each. Insufficient history or a degenerate fit is an
/// error; a zero horizon is a successful empty forecast.
pub fn forecast_series(
    samples: &[PriceSample],
    model: ForecastModel,
    horizon: usize,
    bias: f64,
) -> Result<Vec<f64>> {
    if horizon == 0 {
        return Ok(Vec::new());
    }

    let grid = resample_minutes(samples)?;

    let mut points = match model {
        ForecastModel::LinearTrend => linear_trend(&grid, horizon)?,
        ForecastModel::Arima => arima(&grid, horizon)?,
    };

    for p in &mut points {
        *p += bias;
    }
    Ok(points)
}

// ---------------------------------------------------------------------------
// Resampling
// ---------------------------------------------------------------------------

/// Project the stored series onto a uniform one-price-per-minute grid.
///
/// A minute with no sample is never left empty: it takes the linearly
/// interpolated value between the nearest known neighbours. Several samples
/// within the same minute collapse to the most recent one.
pub fn resample_minutes(samples: &[PriceSample]) -> Result<Vec<f64>> {
    if samples.is_empty() {
        return Err(BitforcastError::Forecast(
            "no samples recorded yet".into(),
        ));
    }

    let mut known: Vec<(i64, f64)> = Vec::with_capacity(samples.len());
    let mut origin: Option<NaiveDateTime> = None;

    for sample in samples {
        let ts = NaiveDateTime::parse_from_str(&sample.timestamp, TIMESTAMP_FORMAT)
            .map_err(|e| {
                BitforcastError::Forecast(format!(
                    "unparseable timestamp '{}': {e}",
                    sample.timestamp
                ))
            })?;
        let origin = *origin.get_or_insert(ts);
        let minute = (ts - origin).num_minutes();
        match known.last_mut() {
            Some((m, p)) if *m == minute => *p = sample.price,
            _ => known.push((minute, sample.price)),
        }
    }

    known.sort_by_key(|(m, _)| *m);
    known.dedup_by_key(|(m, _)| *m);

    let last_minute = known.last().map(|(m, _)| *m).unwrap_or(0);
    let mut grid = Vec::with_capacity(last_minute as usize + 1);

    for window in known.windows(2) {
        let (m0, p0) = window[0];
        let (m1, p1) = window[1];
        grid.push(p0);
        let span = (m1 - m0) as f64;
        for step in 1..(m1 - m0) {
            grid.push(p0 + (p1 - p0) * step as f64 / span);
        }
    }
    if let Some((_, last_price)) = known.last() {
        grid.push(*last_price);
    }

    Ok(grid)
}

// ---------------------------------------------------------------------------
// Linear trend
// ---------------------------------------------------------------------------

fn linear_trend(grid: &[f64], horizon: usize) -> Result<Vec<f64>> {
    let n = grid.len();
    if n < 2 {
        return Err(BitforcastError::Forecast(format!(
            "linear trend needs at least 2 points, have {n}"
        )));
    }

    // Closed-form OLS over the time index 0..n.
    let nf = n as f64;
    let mean_x = (nf - 1.0) / 2.0;
    let mean_y = grid.iter().sum::<f64>() / nf;

    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (i, y) in grid.iter().enumerate() {
        let dx = i as f64 - mean_x;
        sxx += dx * dx;
        sxy += dx * (y - mean_y);
    }

    let slope = sxy / sxx;
    let intercept = mean_y - slope * mean_x;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(BitforcastError::Forecast(
            "linear trend fit produced a non-finite line".into(),
        ));
    }

    Ok((n..n + horizon)
        .map(|x| intercept + slope * x as f64)
        .collect())
}

// ---------------------------------------------------------------------------
// ARIMA(5,1,0)
// ---------------------------------------------------------------------------

fn arima(grid: &[f64], horizon: usize) -> Result<Vec<f64>> {
    if grid.len() < AR_ORDER + 2 {
        return Err(BitforcastError::Forecast(format!(
            "ARIMA({AR_ORDER},1,0) needs at least {} points, have {}",
            AR_ORDER + 2,
            grid.len()
        )));
    }

    let diffs: Vec<f64> = grid.windows(2).map(|w| w[1] - w[0]).collect();

    // Conditional least squares: regress each difference on its AR_ORDER
    // predecessors plus an intercept via the normal equations.
    let dim = AR_ORDER + 1;
    let mut xtx = vec![vec![0.0; dim]; dim];
    let mut xty = vec![0.0; dim];

    for t in AR_ORDER..diffs.len() {
        let mut row = [0.0; AR_ORDER + 1];
        row[0] = 1.0;
        for lag in 1..=AR_ORDER {
            row[lag] = diffs[t - lag];
        }
        for i in 0..dim {
            xty[i] += row[i] * diffs[t];
            for j in 0..dim {
                xtx[i][j] += row[i] * row[j];
            }
        }
    }
    for (i, row) in xtx.iter_mut().enumerate() {
        row[i] += RIDGE;
    }

    let coeffs = solve(xtx, xty).ok_or_else(|| {
        BitforcastError::Forecast("AR fit did not converge (singular system)".into())
    })?;
    if coeffs.iter().any(|c| !c.is_finite()) {
        return Err(BitforcastError::Forecast(
            "AR fit produced non-finite coefficients".into(),
        ));
    }

    // Roll the model forward, then integrate back to price level.
    let mut lags: Vec<f64> = diffs[diffs.len() - AR_ORDER..].to_vec();
    let mut level = *grid.last().unwrap_or(&0.0);
    let mut out = Vec::with_capacity(horizon);

    for _ in 0..horizon {
        let mut next = coeffs[0];
        for lag in 1..=AR_ORDER {
            next += coeffs[lag] * lags[lags.len() - lag];
        }
        lags.push(next);
        level += next;
        out.push(level);
    }

    Ok(out)
}

/// Gaussian elimination with partial pivoting. `None` if the system is
/// singular to working precision.
fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Option<Vec<f64>> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n).max_by(|&i, &j| {
            a[i][col]
                .abs()
                .partial_cmp(&a[j][col].abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        })?;
        if a[pivot][col].abs() < 1e-12 {
            return None;
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let mut sum = b[row];
        for col in row + 1..n {
            sum -= a[row][col] * x[col];
        }
        x[row] = sum / a[row][row];
    }
    Some(x)
}
