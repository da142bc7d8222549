//! Finite-difference curvature of a value function over a price grid.
//!
//! The decay index aggregates higher-order derivative contributions of a
//! value function `V(S)`: for each order n in 2..=5 the contribution is
//! `mean(|d^n V / dS^n| * dS^n)`, and the index is their `1/n²`-weighted
//! sum. A *low* index means the value function has flattened out - the
//! decay trigger fires when the index falls to or below its threshold.

use num_traits::Float;

/// Lowest derivative order contributing to the decay index.
pub const MIN_ORDER: u32 = 2;
/// Highest derivative order contributing to the decay index.
pub const MAX_ORDER: u32 = 5;

/// First derivative of `values` with respect to `grid` by central
/// differences, one-sided at the boundaries.
///
/// Mirrors the usual second-order-accurate gradient on a uniform grid.
/// Returns an empty vector when fewer than two points are supplied.
pub fn gradient<T: Float>(values: &[T], grid: &[T]) -> Vec<T> {
    let n = values.len();
    if n < 2 || grid.len() != n {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(n);
    out.push((values[1] - values[0]) / (grid[1] - grid[0]));
    for i in 1..n - 1 {
        out.push((values[i + 1] - values[i - 1]) / (grid[i + 1] - grid[i - 1]));
    }
    out.push((values[n - 1] - values[n - 2]) / (grid[n - 1] - grid[n - 2]));
    out
}

/// Mean absolute n-th derivative contribution `mean(|d^n V| * dS^n)`.
fn order_contribution<T: Float>(values: &[T], grid: &[T], delta_s: T, order: u32) -> T {
    let mut deriv = values.to_vec();
    for _ in 0..order {
        deriv = gradient(&deriv, grid);
        if deriv.is_empty() {
            return T::zero();
        }
    }
    let scale = delta_s.powi(order as i32);
    let sum = deriv
        .iter()
        .fold(T::zero(), |acc, &d| acc + d.abs() * scale);
    sum / T::from(deriv.len()).unwrap_or_else(T::one)
}

/// The `1/n²`-weighted decay index over derivative orders 2..=5.
///
/// `grid` and `values` must have equal length; `delta_s` is the price
/// perturbation used to scale each order's contribution.
pub fn decay_index<T: Float>(grid: &[T], values: &[T], delta_s: T) -> T {
    let mut index = T::zero();
    for order in MIN_ORDER..=MAX_ORDER {
        let weight = T::one() / T::from(order * order).unwrap_or_else(T::one);
        index = index + weight * order_contribution(values, grid, delta_s, order);
    }
    index
}

/// Decay trigger: fires when the index has fallen to or below `threshold`.
#[inline]
pub fn is_decay_triggered<T: Float>(index: T, threshold: T) -> bool {
    index <= threshold
}
