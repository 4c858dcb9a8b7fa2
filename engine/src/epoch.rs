//! Epoch (cycle) calendar.
//!
//! Cycles are week-long windows counted from the start of cycle one. Cycle
//! zero predates the weekly cadence and has its own irregular bounds.

use rings_types::Timestamp;

use crate::EngineError;

pub const ONE_WEEK_SECS: u64 = 604_800;

/// How far behind the chain head a still-running epoch is cut off.
pub const MID_EPOCH_LAG_SECS: u64 = 2 * 60 * 60;

/// Which cycle to compute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleSelector {
    /// The number of whole cycles elapsed since cycle one started.
    Current,
    Cycle(u64),
}

/// Resolved bounds of one cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochWindow {
    pub cycle: u64,
    pub start: Timestamp,
    pub end: Timestamp,
}

impl EpochWindow {
    /// The timestamp whose block closes the sampled range.
    ///
    /// A window that has not ended yet is sampled up to a little before
    /// `now` so the block subgraph has indexed it.
    pub fn sampling_end(&self, now: Timestamp) -> Timestamp {
        if self.end > now {
            now.saturating_sub(MID_EPOCH_LAG_SECS)
        } else {
            self.end
        }
    }

    pub fn is_complete(&self, now: Timestamp) -> bool {
        self.end <= now
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EpochSchedule {
    pub cycle_zero_start: Timestamp,
    pub cycle_zero_end: Timestamp,
    pub cycle_one_start: Timestamp,
    pub cycle_length_secs: u64,
}

impl EpochSchedule {
    pub fn window(
        &self,
        selector: CycleSelector,
        now: Timestamp,
    ) -> Result<EpochWindow, EngineError> {
        let cycle = match selector {
            CycleSelector::Cycle(c) => c,
            CycleSelector::Current => self.current_cycle(now)?,
        };
        if cycle == 0 {
            return Ok(EpochWindow {
                cycle,
                start: self.cycle_zero_start,
                end: self.cycle_zero_end,
            });
        }
        let offset = (cycle - 1)
            .checked_mul(self.cycle_length_secs)
            .ok_or_else(|| EngineError::Config(format!("cycle {cycle} is out of range")))?;
        let start = self.cycle_one_start.saturating_add(offset);
        Ok(EpochWindow {
            cycle,
            start,
            end: start.saturating_add(self.cycle_length_secs),
        })
    }

    /// Whole cycles elapsed since cycle one started.
    ///
    /// During cycle one's own week this is 0, and [`window`](Self::window)
    /// then yields cycle zero's recorded bounds rather than a synthetic week
    /// ending at cycle one's start.
    pub fn current_cycle(&self, now: Timestamp) -> Result<u64, EngineError> {
        if self.cycle_length_secs == 0 {
            return Err(EngineError::Config("cycle length must be positive".into()));
        }
        if now < self.cycle_one_start {
            return Err(EngineError::Config(format!(
                "cycle one has not started yet (starts at {})",
                self.cycle_one_start
            )));
        }
        Ok(self.cycle_one_start.elapsed_since(now) / self.cycle_length_secs)
    }
}

impl Default for EpochSchedule {
    fn default() -> Self {
        Self {
            cycle_zero_start: Timestamp::new(1_734_627_600),
            cycle_zero_end: Timestamp::new(1_735_340_400),
            cycle_one_start: Timestamp::new(1_735_340_400),
            cycle_length_secs: ONE_WEEK_SECS,
        }
    }
}
