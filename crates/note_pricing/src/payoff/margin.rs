//! The shared knock-in / cap-pool / margin state machine.
//!
//! Evaluation walks the path one price at a time:
//!
//! - knock-in is sticky: once the excess return exceeds the threshold the
//!   flag never reverts;
//! - excess return above the cap is banked into the pool at its high-water
//!   mark, so the same excess is never banked twice;
//! - a margin shortfall draws down the pool (partial refill allowed);
//! - a shortfall with an exhausted pool is a hard terminal state: the walk
//!   stops and the payoff is the post-refill equity at that instant.
//!
//! The walk is driven through a pull closure, so it works identically over
//! a finished [`Path`](note_core::Path) and a live
//! [`PathStepper`](note_models::PathStepper) (which it can stop early).

use note_core::Path;

use super::PathOutcome;
use crate::note::CappedKnockInNote;

/// Step-wise margin machine state.
pub(crate) struct MarginMachine<'a> {
    cfg: &'a CappedKnockInNote,
    s0: f64,
    day: usize,
    knocked_in: bool,
    trigger_day: Option<usize>,
    pool: f64,
    banked_high_water: f64,
    peak: f64,
    worst_drawdown: f64,
    last_price: f64,
    liquidation: Option<(usize, f64)>,
}

/// Whether the walk continues or hit the hard terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum MachineStatus {
    Continue,
    Liquidated,
}

impl<'a> MarginMachine<'a> {
    pub(crate) fn new(cfg: &'a CappedKnockInNote, s0: f64) -> Self {
        Self {
            cfg,
            s0,
            day: 0,
            knocked_in: false,
            trigger_day: None,
            pool: 0.0,
            banked_high_water: 0.0,
            peak: s0,
            worst_drawdown: 0.0,
            last_price: s0,
            liquidation: None,
        }
    }

    /// Consumes one price and advances the state machine.
    pub(crate) fn on_price(&mut self, price: f64) -> MachineStatus {
        self.day += 1;
        self.last_price = price;

        self.peak = self.peak.max(price);
        self.worst_drawdown = self.worst_drawdown.max((self.peak - price) / self.peak);

        let excess_return = (price - self.s0) / self.s0;
        if !self.knocked_in && excess_return > self.cfg.knock_in_return {
            self.knocked_in = true;
            self.trigger_day = Some(self.day);
        }

        // Bank the excess above the cap, high-water marked.
        let excess = ((excess_return - self.cfg.cap_return) * self.cfg.principal).max(0.0);
        if excess > self.banked_high_water {
            self.pool += excess - self.banked_high_water;
            self.banked_high_water = excess;
        }

        // Mark equity to market and refill from the pool if short.
        let mut equity = self.cfg.principal * price / self.s0;
        if equity < self.cfg.maintenance_margin && self.pool > 0.0 {
            let refill = self.pool.min(self.cfg.maintenance_margin - equity);
            self.pool -= refill;
            equity += refill;
        }

        if equity < self.cfg.maintenance_margin && self.pool <= 0.0 {
            self.liquidation = Some((self.day, equity));
            return MachineStatus::Liquidated;
        }

        MachineStatus::Continue
    }

    /// Finalises the outcome once the walk has ended (horizon or
    /// liquidation).
    pub(crate) fn finish(self) -> PathOutcome {
        if let Some((day, equity)) = self.liquidation {
            // Forced liquidation overrides every other payoff rule.
            return PathOutcome {
                payoff: equity,
                knocked_in: self.knocked_in,
                knocked_out: true,
                triggered: self.knocked_in,
                trigger_day: self.trigger_day,
                exit_day: Some(day),
                max_drawdown: self.worst_drawdown,
                pool_final: self.pool,
            };
        }

        let gross = self.last_price / self.s0;
        let excess_return = gross - 1.0;
        let payoff = if self.knocked_in && excess_return > self.cfg.cap_return {
            (1.0 + self.cfg.cap_return) * self.cfg.principal
        } else {
            gross * self.cfg.principal
        };

        PathOutcome {
            payoff,
            knocked_in: self.knocked_in,
            knocked_out: false,
            triggered: self.knocked_in,
            trigger_day: self.trigger_day,
            exit_day: None,
            max_drawdown: self.worst_drawdown,
            pool_final: self.pool,
        }
    }

    /// Pool balance (for invariant checks).
    #[cfg(test)]
    pub(crate) fn pool(&self) -> f64 {
        self.pool
    }
}

/// Evaluates a finished path through the margin machine.
pub(crate) fn evaluate_path(cfg: &CappedKnockInNote, path: &Path) -> PathOutcome {
    let mut machine = MarginMachine::new(cfg, path.initial());
    for &price in &path.values()[1..] {
        if machine.on_price(price) == MachineStatus::Liquidated {
            break;
        }
    }
    machine.finish()
}
