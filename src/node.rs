//! All mutable node state, owned in one place and driven by explicit ticks.

use crate::display::{screens, Frame};
use crate::metrics::{format_metrics, Identity, TemperatureUnit};
use crate::sensors::{RefreshReport, SensorSampler};
use crate::state::{DisplayCycle, DisplaySlotStore, RemoteSummaryState, RenderAction};
use crate::Millis;

/// Ages and limits that stay fixed for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeSettings {
    pub slot_max_age_ms: Millis,
    pub summary_max_age_ms: Millis,
    pub min_display_interval_ms: Millis,
    pub unit: TemperatureUnit,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            slot_max_age_ms: crate::config::DEFAULT_SLOT_MAX_AGE_MS,
            summary_max_age_ms: crate::config::DEFAULT_SUMMARY_MAX_AGE_MS,
            min_display_interval_ms: crate::config::DEFAULT_MIN_DISPLAY_INTERVAL_MS,
            unit: TemperatureUnit::Celsius,
        }
    }
}

pub struct Node {
    pub sampler: SensorSampler,
    pub slots: DisplaySlotStore,
    pub summary: RemoteSummaryState,
    pub cycle: DisplayCycle,
    identity: Identity,
    settings: NodeSettings,
}

impl Node {
    pub fn new(
        sampler: SensorSampler,
        identity: Identity,
        settings: NodeSettings,
        display_interval_ms: Millis,
    ) -> Self {
        Self {
            sampler,
            slots: DisplaySlotStore::new(),
            summary: RemoteSummaryState::new(display_interval_ms),
            cycle: DisplayCycle::new(),
            identity,
            settings,
        }
    }

    pub fn tick_sensors(&mut self, now: Millis) -> RefreshReport {
        self.sampler.refresh(now)
    }

    /// Advance the display rotation if its interval elapsed.
    pub fn tick_display(&mut self, now: Millis) -> Option<RenderAction> {
        let interval = self.display_interval();
        self.cycle.maybe_advance(
            now,
            interval,
            &self.slots,
            &self.summary,
            self.settings.slot_max_age_ms,
            self.settings.summary_max_age_ms,
        )
    }

    /// Effective rotation interval, never below the configured minimum.
    pub fn display_interval(&self) -> Millis {
        self.summary
            .interval_ms()
            .max(self.settings.min_display_interval_ms)
    }

    pub fn compose(&self, action: RenderAction) -> Frame {
        match action {
            RenderAction::BuiltinSummary => {
                screens::builtin_summary(&self.sampler.snapshot(), self.settings.unit)
            }
            RenderAction::RemoteSummary => screens::remote_summary(&self.summary),
            RenderAction::CustomBitmap(index) => match self.slots.payload(index) {
                Some(bytes) => screens::custom_bitmap(bytes),
                None => screens::builtin_summary(&self.sampler.snapshot(), self.settings.unit),
            },
        }
    }

    pub fn metrics(&self, now: Millis) -> String {
        format_metrics(
            &self.sampler.snapshot(),
            &self.identity,
            now / 1_000,
            self.settings.unit,
        )
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn settings(&self) -> &NodeSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::{fake::ScriptedSensor, Quantity, SamplerIntervals};
    use crate::state::{SummaryUpdate, SLOT_BYTES};

    fn node() -> Node {
        let mut sampler = SensorSampler::new(SamplerIntervals::default());
        sampler.attach(Box::new(ScriptedSensor::constant(Quantity::Co2, 700.0)));
        Node::new(
            sampler,
            Identity::new("test", None),
            NodeSettings::default(),
            1_000,
        )
    }

    #[test]
    fn remote_interval_is_clamped_to_minimum() {
        let mut node = node();
        node.summary.apply_update(SummaryUpdate::default().with_interval(10), 0);
        assert_eq!(
            node.display_interval(),
            crate::config::DEFAULT_MIN_DISPLAY_INTERVAL_MS
        );
    }

    #[test]
    fn metrics_reflect_sampled_values_and_uptime() {
        let mut node = node();
        node.tick_sensors(5_000);
        let body = node.metrics(61_999);
        assert!(body.contains("rco2{id=\"test\"} 700\n"));
        assert!(body.contains("uptimesec{id=\"test\"} 61\n"));
    }

    #[test]
    fn custom_action_composes_the_slot_bitmap() {
        let mut node = node();
        node.slots.write(4, &[0x0f; SLOT_BYTES], 0).unwrap();
        let frame = node.compose(RenderAction::CustomBitmap(4));
        assert_eq!(frame.as_bytes(), &[0x0f; SLOT_BYTES]);
    }

    #[test]
    fn display_tick_uses_remote_interval() {
        let mut node = node();
        assert_eq!(node.tick_display(999), None);
        assert_eq!(node.tick_display(1_000), Some(RenderAction::BuiltinSummary));
    }
}
