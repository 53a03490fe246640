//! Boot/shutdown LED pattern generator.
//!
//! Pure step sequences only: each [`PatternStep`] says which line to set,
//! to what, and how long to hold before the next step. Playing a pattern
//! (the actual delays) is the caller's job, which keeps raw timing out of
//! the core and makes the sequences testable.
//!
//! The traffic-light boards play [`boot_sweep`] at bring-up and again
//! right before teardown: four up/down sweeps followed by a triple
//! all-on flash, always ending dark.

use heapless::Vec;

use crate::app::commands::LineId;

/// Generated steps cap: 4 sweeps + 3 flashes over up to 4 lines.
pub const MAX_PATTERN_STEPS: usize = 64;

/// Hold time for each sweep step, milliseconds.
const SWEEP_HOLD_MS: u32 = 75;
/// Hold time for each flash phase, milliseconds.
const FLASH_HOLD_MS: u32 = 150;
/// Number of up/down sweep cycles.
const SWEEP_CYCLES: usize = 4;
/// Number of all-on flashes at the end.
const FLASH_CYCLES: usize = 3;

/// One pattern step: set `line` to `value`, then wait `hold_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatternStep {
    pub line: LineId,
    pub value: bool,
    /// Delay after applying this step; 0 groups it with the next step.
    pub hold_ms: u32,
}

/// The classic bring-up sequence over `lines`, in order.
pub fn boot_sweep(lines: &[LineId]) -> Vec<PatternStep, MAX_PATTERN_STEPS> {
    let mut steps = Vec::new();

    for _ in 0..SWEEP_CYCLES {
        // Light up ascending, then douse descending.
        for &line in lines {
            let _ = steps.push(PatternStep { line, value: true, hold_ms: SWEEP_HOLD_MS });
        }
        for &line in lines.iter().rev() {
            let _ = steps.push(PatternStep { line, value: false, hold_ms: SWEEP_HOLD_MS });
        }
    }

    for _ in 0..FLASH_CYCLES {
        push_group(&mut steps, lines, true, FLASH_HOLD_MS);
        push_group(&mut steps, lines, false, FLASH_HOLD_MS);
    }

    steps
}

/// Set every line to `value` as one visual phase: zero hold on all but
/// the last step, so the group appears simultaneous to the player.
fn push_group(
    steps: &mut Vec<PatternStep, MAX_PATTERN_STEPS>,
    lines: &[LineId],
    value: bool,
    hold_ms: u32,
) {
    for (i, &line) in lines.iter().enumerate() {
        let hold = if i + 1 == lines.len() { hold_ms } else { 0 };
        let _ = steps.push(PatternStep { line, value, hold_ms: hold });
    }
}
