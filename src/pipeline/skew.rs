//! Skew correction with persisted power-transform parameters.
//!
//! Parameters are fitted once on a training sample ([`SkewParams::fit`]) and
//! applied unchanged at inference ([`SkewParams::apply`]). Nothing here
//! refits per request.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::stats::{mean, skewness, variance};

/// Default absolute skewness above which a column is selected for correction
pub const DEFAULT_SKEW_THRESHOLD: f64 = 1.0;

/// Search interval for the Yeo-Johnson lambda
const LAMBDA_BOUNDS: (f64, f64) = (-5.0, 5.0);

/// Convergence tolerance for the lambda search
const LAMBDA_TOLERANCE: f64 = 1e-10;

/// Maximum iterations for the lambda search
const LAMBDA_MAX_ITER: usize = 500;

/// Power transform family
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkewMethod {
    /// Yeo-Johnson with standardized output (default)
    #[default]
    YeoJohnson,
    /// `ln(1 + x)`, parameter free
    Log1p,
}

impl std::fmt::Display for SkewMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkewMethod::YeoJohnson => write!(f, "yeo-johnson"),
            SkewMethod::Log1p => write!(f, "log1p"),
        }
    }
}

impl std::str::FromStr for SkewMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yeo-johnson" | "yeojohnson" => Ok(SkewMethod::YeoJohnson),
            "log" | "log1p" => Ok(SkewMethod::Log1p),
            _ => Err(format!(
                "Unknown skew method: '{}'. Use 'yeo-johnson' or 'log'.",
                s
            )),
        }
    }
}

/// Fitted transform for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "kebab-case")]
pub enum SkewTransform {
    YeoJohnson { lambda: f64, mean: f64, std: f64 },
    Log1p,
}

/// Persisted skew-correction parameters for one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkewParams {
    pub column: String,
    #[serde(flatten)]
    pub transform: SkewTransform,
}

impl SkewParams {
    /// Fit parameters on a training sample. Non-finite values are ignored.
    pub fn fit(column: &str, values: &[f64], method: SkewMethod) -> Result<Self> {
        let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
        if finite.is_empty() {
            anyhow::bail!(
                "Column '{}' has no finite values to fit a {} transform on",
                column,
                method
            );
        }

        let transform = match method {
            SkewMethod::YeoJohnson => {
                let lambda = fit_yeo_johnson_lambda(&finite);
                let transformed: Vec<f64> =
                    finite.iter().map(|&x| yeo_johnson(x, lambda)).collect();
                let mean = mean(&transformed).unwrap_or(0.0);
                let std = variance(&transformed, 0).map(f64::sqrt).unwrap_or(0.0);
                // zero-variance output is left unscaled
                let std = if std > f64::EPSILON { std } else { 1.0 };
                SkewTransform::YeoJohnson { lambda, mean, std }
            }
            SkewMethod::Log1p => {
                if let Some(min) = finite.iter().copied().reduce(f64::min) {
                    if min <= -1.0 {
                        anyhow::bail!(
                            "Column '{}' has values <= -1 ({}); log1p is undefined there",
                            column,
                            min
                        );
                    }
                }
                SkewTransform::Log1p
            }
        };

        Ok(Self {
            column: column.to_string(),
            transform,
        })
    }

    pub fn method(&self) -> SkewMethod {
        match self.transform {
            SkewTransform::YeoJohnson { .. } => SkewMethod::YeoJohnson,
            SkewTransform::Log1p => SkewMethod::Log1p,
        }
    }

    /// Apply the fitted transform to one value.
    ///
    /// Returns `None` when the result is not finite (NaN input, or `log1p`
    /// of a value `<= -1`).
    pub fn apply(&self, x: f64) -> Option<f64> {
        let y = match self.transform {
            SkewTransform::YeoJohnson { lambda, mean, std } => {
                (yeo_johnson(x, lambda) - mean) / std
            }
            SkewTransform::Log1p => x.ln_1p(),
        };
        y.is_finite().then_some(y)
    }

    /// Apply the transform to a column of values.
    pub fn correct(&self, values: &[f64]) -> Vec<Option<f64>> {
        values.iter().map(|&v| self.apply(v)).collect()
    }

    pub fn validate(&self) -> Result<()> {
        if let SkewTransform::YeoJohnson { lambda, mean, std } = self.transform {
            if !lambda.is_finite() || !mean.is_finite() || !std.is_finite() || std <= 0.0 {
                anyhow::bail!(
                    "Invalid Yeo-Johnson parameters for '{}': lambda={}, mean={}, std={}",
                    self.column,
                    lambda,
                    mean,
                    std
                );
            }
        }
        Ok(())
    }
}

/// Yeo-Johnson transform of a single value
pub fn yeo_johnson(x: f64, lambda: f64) -> f64 {
    if x >= 0.0 {
        if lambda.abs() < f64::EPSILON {
            x.ln_1p()
        } else {
            ((x + 1.0).powf(lambda) - 1.0) / lambda
        }
    } else if (lambda - 2.0).abs() < f64::EPSILON {
        -(-x).ln_1p()
    } else {
        -((-x + 1.0).powf(2.0 - lambda) - 1.0) / (2.0 - lambda)
    }
}

/// Yeo-Johnson profile log-likelihood for `lambda`
fn yeo_johnson_log_likelihood(values: &[f64], lambda: f64) -> f64 {
    let n = values.len() as f64;
    let transformed: Vec<f64> = values.iter().map(|&x| yeo_johnson(x, lambda)).collect();
    let var = variance(&transformed, 0).unwrap_or(0.0);
    if var <= 0.0 || !var.is_finite() {
        return f64::NEG_INFINITY;
    }
    let jacobian: f64 = values.iter().map(|&x| x.signum() * x.abs().ln_1p()).sum();
    -n / 2.0 * var.ln() + (lambda - 1.0) * jacobian
}

/// Maximum-likelihood lambda via golden-section search over [`LAMBDA_BOUNDS`].
///
/// Constant samples return `1.0` (the identity transform).
pub fn fit_yeo_johnson_lambda(values: &[f64]) -> f64 {
    if values.len() < 2 || variance(values, 0).map_or(true, |v| v <= 0.0) {
        return 1.0;
    }

    let objective = |lambda: f64| -yeo_johnson_log_likelihood(values, lambda);
    let inv_phi = (5.0f64.sqrt() - 1.0) / 2.0;

    let (mut a, mut b) = LAMBDA_BOUNDS;
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = objective(c);
    let mut fd = objective(d);

    for _ in 0..LAMBDA_MAX_ITER {
        if (b - a).abs() < LAMBDA_TOLERANCE {
            break;
        }
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = objective(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = objective(d);
        }
    }

    (a + b) / 2.0
}

/// Columns whose absolute skewness meets `threshold`, with their skewness.
///
/// Used at fit time to pick skew columns automatically.
pub fn detect_skewed_columns<'a, I>(columns: I, threshold: f64) -> Vec<(String, f64)>
where
    I: IntoIterator<Item = (&'a str, &'a [f64])>,
{
    columns
        .into_iter()
        .filter_map(|(name, values)| {
            let finite: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
            let skew = skewness(&finite)?;
            (skew.abs() >= threshold).then(|| (name.to_string(), skew))
        })
        .collect()
}
