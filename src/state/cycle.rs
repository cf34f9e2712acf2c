use super::{DisplaySlotStore, RemoteSummaryState, SLOT_COUNT};
use crate::Millis;

/// Position in the four-step display rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Built-in sensor summary.
    Builtin = 0,
    /// First custom bitmap.
    Custom = 1,
    /// Remote summary pushed over `/setscreen2`.
    Remote = 2,
    /// Second custom bitmap.
    CustomAgain = 3,
}

impl Phase {
    pub fn next(self) -> Self {
        match self {
            Phase::Builtin => Phase::Custom,
            Phase::Custom => Phase::Remote,
            Phase::Remote => Phase::CustomAgain,
            Phase::CustomAgain => Phase::Builtin,
        }
    }
}

/// What the panel should show after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderAction {
    BuiltinSummary,
    RemoteSummary,
    CustomBitmap(usize),
}

/// Result of resolving one tick: the phase and cursor to keep, and what to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub phase: Phase,
    pub cursor: usize,
    pub action: RenderAction,
}

/// Advance one phase and pick a screen, degrading forward when content is missing.
///
/// A custom phase with no displayable slot falls through to the following
/// phase within the same call. A stale remote summary resets the rotation to
/// the built-in screen. At most one fallback hop happens per call.
pub fn resolve_phase(
    phase: Phase,
    cursor: usize,
    slots: &DisplaySlotStore,
    remote_fresh: bool,
    now: Millis,
    slot_max_age: Millis,
) -> Resolution {
    let phase = phase.next();
    match phase {
        Phase::Custom | Phase::CustomAgain => {
            match slots.next_displayable(cursor, now, slot_max_age) {
                Some(index) => Resolution {
                    phase,
                    cursor: index,
                    action: RenderAction::CustomBitmap(index),
                },
                None => settle(phase.next(), cursor, remote_fresh),
            }
        }
        other => settle(other, cursor, remote_fresh),
    }
}

fn settle(phase: Phase, cursor: usize, remote_fresh: bool) -> Resolution {
    match phase {
        Phase::Remote if remote_fresh => Resolution {
            phase,
            cursor,
            action: RenderAction::RemoteSummary,
        },
        _ => Resolution {
            phase: Phase::Builtin,
            cursor,
            action: RenderAction::BuiltinSummary,
        },
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayCycle {
    phase: Phase,
    cursor: usize,
    last_tick: Millis,
}

impl Default for DisplayCycle {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayCycle {
    pub fn new() -> Self {
        Self {
            phase: Phase::Builtin,
            // One before slot 0 so the first scan starts at the beginning.
            cursor: SLOT_COUNT - 1,
            last_tick: 0,
        }
    }

    /// Fire a tick if `interval` has elapsed and return the screen to render.
    pub fn maybe_advance(
        &mut self,
        now: Millis,
        interval: Millis,
        slots: &DisplaySlotStore,
        summary: &RemoteSummaryState,
        slot_max_age: Millis,
        summary_max_age: Millis,
    ) -> Option<RenderAction> {
        if now.saturating_sub(self.last_tick) < interval {
            return None;
        }
        self.last_tick += interval;

        let remote_fresh = summary.is_fresh(now, summary_max_age);
        let resolved = resolve_phase(
            self.phase,
            self.cursor,
            slots,
            remote_fresh,
            now,
            slot_max_age,
        );
        self.phase = resolved.phase;
        self.cursor = resolved.cursor;
        Some(resolved.action)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn last_tick(&self) -> Millis {
        self.last_tick
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{SummaryUpdate, SLOT_BYTES};

    const AGE: Millis = 300_000;

    fn slots_with(active: &[usize]) -> DisplaySlotStore {
        let mut store = DisplaySlotStore::new();
        for &i in active {
            store.write(i, &[0xff; SLOT_BYTES], 0).unwrap();
        }
        store
    }

    #[test]
    fn empty_state_always_renders_builtin() {
        let slots = DisplaySlotStore::new();
        let mut phase = Phase::Builtin;
        for _ in 0..8 {
            let r = resolve_phase(phase, SLOT_COUNT - 1, &slots, false, 0, AGE);
            assert_eq!(r.action, RenderAction::BuiltinSummary);
            assert_eq!(r.phase, Phase::Builtin);
            phase = r.phase;
        }
    }

    #[test]
    fn custom_phase_falls_through_to_remote() {
        let slots = DisplaySlotStore::new();
        let r = resolve_phase(Phase::Builtin, 0, &slots, true, 0, AGE);
        assert_eq!(r.phase, Phase::Remote);
        assert_eq!(r.action, RenderAction::RemoteSummary);
    }

    #[test]
    fn second_custom_phase_falls_through_to_builtin() {
        let slots = DisplaySlotStore::new();
        let r = resolve_phase(Phase::Remote, 4, &slots, true, 0, AGE);
        assert_eq!(r.phase, Phase::Builtin);
        assert_eq!(r.action, RenderAction::BuiltinSummary);
        assert_eq!(r.cursor, 4);
    }

    #[test]
    fn stale_remote_resets_to_builtin() {
        let slots = slots_with(&[3]);
        let r = resolve_phase(Phase::Custom, 3, &slots, false, 0, AGE);
        assert_eq!(r.phase, Phase::Builtin);
        assert_eq!(r.action, RenderAction::BuiltinSummary);
    }

    #[test]
    fn full_rotation_with_everything_available() {
        let slots = slots_with(&[2, 7]);
        let mut phase = Phase::Builtin;
        let mut cursor = SLOT_COUNT - 1;
        let mut actions = Vec::new();
        for _ in 0..8 {
            let r = resolve_phase(phase, cursor, &slots, true, 0, AGE);
            phase = r.phase;
            cursor = r.cursor;
            actions.push(r.action);
        }
        assert_eq!(
            actions,
            vec![
                RenderAction::CustomBitmap(2),
                RenderAction::RemoteSummary,
                RenderAction::CustomBitmap(7),
                RenderAction::BuiltinSummary,
                RenderAction::CustomBitmap(2),
                RenderAction::RemoteSummary,
                RenderAction::CustomBitmap(7),
                RenderAction::BuiltinSummary,
            ]
        );
    }

    #[test]
    fn waits_for_interval_and_keeps_cadence() {
        let slots = DisplaySlotStore::new();
        let summary = RemoteSummaryState::new(5_000);
        let mut cycle = DisplayCycle::new();

        assert_eq!(cycle.maybe_advance(4_999, 5_000, &slots, &summary, AGE, AGE), None);
        assert_eq!(
            cycle.maybe_advance(5_300, 5_000, &slots, &summary, AGE, AGE),
            Some(RenderAction::BuiltinSummary)
        );
        assert_eq!(cycle.last_tick(), 5_000);
        assert_eq!(cycle.maybe_advance(9_999, 5_000, &slots, &summary, AGE, AGE), None);
        assert!(cycle.maybe_advance(10_000, 5_000, &slots, &summary, AGE, AGE).is_some());
    }

    #[test]
    fn remote_summary_shows_while_fresh() {
        let slots = DisplaySlotStore::new();
        let mut summary = RemoteSummaryState::new(1_000);
        summary.apply_update(SummaryUpdate::default(), 500);
        let mut cycle = DisplayCycle::new();

        let action = cycle.maybe_advance(1_000, 1_000, &slots, &summary, AGE, 10_000);
        assert_eq!(action, Some(RenderAction::RemoteSummary));
        assert_eq!(cycle.phase(), Phase::Remote);

        let mut cycle = DisplayCycle::new();
        let action = cycle.maybe_advance(20_000, 1_000, &slots, &summary, AGE, 10_000);
        assert_eq!(action, Some(RenderAction::BuiltinSummary));
    }

    #[test]
    fn cursor_persists_across_cycles() {
        let slots = slots_with(&[2, 7, 15]);
        let summary = RemoteSummaryState::new(1_000);
        let mut cycle = DisplayCycle::new();
        let mut shown = Vec::new();
        for tick in 1..=12 {
            if let Some(RenderAction::CustomBitmap(i)) =
                cycle.maybe_advance(tick * 1_000, 1_000, &slots, &summary, AGE, AGE)
            {
                shown.push(i);
            }
        }
        assert_eq!(shown, vec![2, 7, 15, 2, 7, 15]);
    }
}
