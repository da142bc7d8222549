//! Family-specific trigger evaluation: tick cascades, curvature decay,
//! dual price/volatility triggers and the FX arbitrage loop.

use note_core::Path;

use super::{EvalError, PathOutcome};
use crate::note::{CurvatureDecayNote, DualTriggerNote, FxArbitrageNote, TickJumpNote};

/// Scans for a cascade of `tick_threshold` consecutive declines, each
/// steeper than `tick_size`, with the equity line crossed from above to
/// below inside the cascade window. Returns the step index at which the
/// cascade completes.
pub(crate) fn tick_cascade_day(cfg: &TickJumpNote, path: &Path) -> Option<usize> {
    let values = path.values();
    let s0 = path.initial();
    let line = cfg.margin_line();
    let equity = |price: f64| cfg.initial_equity * price / s0;

    let mut run = 0usize;
    for t in 1..values.len() {
        if values[t] - values[t - 1] < -cfg.tick_size {
            run += 1;
        } else {
            run = 0;
            continue;
        }
        if run >= cfg.tick_threshold {
            let window_start = t + 1 - cfg.tick_threshold;
            for j in window_start..=t {
                if equity(values[j - 1]) > line && equity(values[j]) <= line {
                    return Some(t);
                }
            }
        }
    }
    None
}

/// Tick-jump note: a fixed payout on trigger, zero otherwise. The note
/// price emerges at the aggregate level as `payout * P(trigger)`.
pub(crate) fn evaluate_tick_jump(cfg: &TickJumpNote, path: &Path) -> PathOutcome {
    let trigger_day = tick_cascade_day(cfg, path);
    let triggered = trigger_day.is_some();
    PathOutcome {
        payoff: if triggered { cfg.payout } else { 0.0 },
        triggered,
        trigger_day,
        max_drawdown: path.max_drawdown(),
        ..PathOutcome::default()
    }
}

/// Curvature-decay note: pays out only when the note is armed (decay index
/// at or below its threshold) and the path's realised drawdown breaches
/// the risk threshold.
pub(crate) fn evaluate_curvature(
    cfg: &CurvatureDecayNote,
    armed: bool,
    path: &Path,
) -> PathOutcome {
    let drawdown = path.max_drawdown();
    let triggered = armed && drawdown > cfg.var_threshold;
    PathOutcome {
        payoff: if triggered { cfg.fixed_payout } else { 0.0 },
        triggered,
        trigger_day: None,
        max_drawdown: drawdown,
        ..PathOutcome::default()
    }
}

/// Dual-trigger note over a stochastic-volatility path.
pub(crate) fn evaluate_dual_trigger(
    cfg: &DualTriggerNote,
    path: &Path,
) -> Result<PathOutcome, EvalError> {
    let vols = path.vols().ok_or(EvalError::MissingVolTrack {
        family: "dual_trigger",
    })?;

    let terminal = path.terminal();
    let price_triggered = terminal > cfg.barrier_level;
    let max_vol = vols.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let vol_triggered = max_vol > cfg.vol_trigger;

    let payoff = match (price_triggered, vol_triggered) {
        // Both triggers met: lookback participation on the path minimum.
        (true, true) => {
            cfg.participation_rate * (terminal - path.min()) / path.initial() * cfg.principal
        }
        // One trigger met: fixed coupon.
        (true, false) | (false, true) => cfg.coupon_rate * cfg.principal,
        // Neither: partial capital return.
        (false, false) => cfg.capital_floor * cfg.principal,
    };

    Ok(PathOutcome {
        payoff,
        knocked_in: price_triggered,
        triggered: price_triggered && vol_triggered,
        max_drawdown: path.max_drawdown(),
        ..PathOutcome::default()
    })
}

/// FX arbitrage loop over k correlated legs.
///
/// The day-t loop profit is `prod_l (S_l[t] / S_l[0]) * (1 - fee)^legs - 1`
/// (the loop closes at par at t = 0, so the ratio form keeps the product
/// anchored at the fee-adjusted level). Knock-in is sticky; a knocked-in
/// position exits the first day profit decays below the knock-out
/// threshold and realises that day's profit.
pub(crate) fn evaluate_fx_legs(
    cfg: &FxArbitrageNote,
    legs: &[Path],
) -> Result<PathOutcome, EvalError> {
    if legs.len() != cfg.legs {
        return Err(EvalError::LegCountMismatch {
            expected: cfg.legs,
            got: legs.len(),
        });
    }

    let days = legs.iter().map(Path::len).min().unwrap_or(0);
    let fee_factor = cfg.fee_factor();

    let mut loop_values = Vec::with_capacity(days);
    for t in 0..days {
        let product: f64 = legs
            .iter()
            .map(|leg| leg.values()[t] / leg.initial())
            .product();
        loop_values.push(product * fee_factor);
    }

    let mut trigger_day = None;
    let mut exit_day = None;
    let mut final_profit = loop_values.last().copied().unwrap_or(fee_factor) - 1.0;

    for (t, &value) in loop_values.iter().enumerate() {
        let profit = value - 1.0;
        if trigger_day.is_none() && profit > cfg.knock_in_threshold {
            trigger_day = Some(t);
        }
        if trigger_day.is_some() && profit < cfg.knock_out_threshold {
            exit_day = Some(t);
            final_profit = profit;
            break;
        }
    }

    let triggered = trigger_day.is_some();
    let payoff = if triggered {
        final_profit * cfg.notional
    } else {
        // Never entered the trade.
        0.0
    };

    Ok(PathOutcome {
        payoff,
        knocked_in: triggered,
        knocked_out: exit_day.is_some(),
        triggered,
        trigger_day,
        exit_day,
        max_drawdown: note_core::math::stats::max_drawdown(&loop_values),
        ..PathOutcome::default()
    })
}
