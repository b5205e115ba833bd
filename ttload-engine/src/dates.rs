//! Travel date selection

use chrono::{Days, NaiveDate};
use rand::Rng;

/// Draws travel dates from `base + 0..spread_days`.
///
/// Each draw starts from the same base date, so dates never drift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TravelDates {
    base: NaiveDate,
    spread_days: u32,
}

impl TravelDates {
    pub fn new(base: NaiveDate, spread_days: u32) -> Self {
        Self { base, spread_days }
    }

    pub fn base(&self) -> NaiveDate {
        self.base
    }

    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> NaiveDate {
        if self.spread_days == 0 {
            return self.base;
        }

        let offset = rng.gen_range(0..self.spread_days);
        self.base
            .checked_add_days(Days::new(u64::from(offset)))
            .unwrap_or(self.base)
    }
}
