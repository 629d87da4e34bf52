// Numeric helpers shared by the diversification strategies

/// Fallback used wherever a product, ratio or normalizer degenerates.
pub const NEUTRAL: f64 = 1.0;

/// `numerator / denominator`, or [`NEUTRAL`] when the denominator is zero
/// or the result is not finite.
pub fn safe_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        return NEUTRAL;
    }
    let ratio = numerator / denominator;
    if ratio.is_finite() {
        ratio
    } else {
        NEUTRAL
    }
}

/// Geometric-mean style aggregation: `(∏ values)^exponent`.
///
/// The empty product is 1.0, so an empty input always yields 1.0.
pub fn geometric_product(values: impl IntoIterator<Item = f64>, exponent: f64) -> f64 {
    let product: f64 = values.into_iter().product();
    if exponent == 0.0 {
        return NEUTRAL;
    }
    product.powf(exponent)
}

/// Divisor that rescales `values` so the largest becomes 1.0.
///
/// Returns [`NEUTRAL`] when there is no positive finite maximum.
pub fn max_divisor(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    if max > 0.0 {
        max
    } else {
        NEUTRAL
    }
}

/// `lambda * relevance + (1 - lambda) * novelty`.
///
/// The novelty term is dropped entirely at `lambda == 1.0` so a degenerate
/// novelty value cannot leak into a pure-relevance ranking.
pub fn interpolate(lambda: f64, relevance: f64, novelty: f64) -> f64 {
    if lambda >= 1.0 {
        relevance
    } else {
        lambda * relevance + (1.0 - lambda) * novelty
    }
}
