use crate::Millis;

/// Free-form text fields pushed by a home-automation host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    Watt,
    WattAvg,
    Water,
    WaterToday,
    Garage,
    GarageTime,
}

impl SummaryField {
    pub const ALL: [SummaryField; 6] = [
        SummaryField::Watt,
        SummaryField::WattAvg,
        SummaryField::Water,
        SummaryField::WaterToday,
        SummaryField::Garage,
        SummaryField::GarageTime,
    ];

    /// Form argument name.
    pub fn key(self) -> &'static str {
        match self {
            SummaryField::Watt => "watt",
            SummaryField::WattAvg => "wattavg",
            SummaryField::Water => "water",
            SummaryField::WaterToday => "watertoday",
            SummaryField::Garage => "garage",
            SummaryField::GarageTime => "garagetime",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// One `/setscreen2` request; `None` leaves the current value alone.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SummaryUpdate {
    fields: [Option<String>; 6],
    pub interval_ms: Option<Millis>,
}

impl SummaryUpdate {
    pub fn set(&mut self, field: SummaryField, value: impl Into<String>) {
        self.fields[field.index()] = Some(value.into());
    }

    pub fn with(mut self, field: SummaryField, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn with_interval(mut self, interval_ms: Millis) -> Self {
        self.interval_ms = Some(interval_ms);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSummaryState {
    fields: [String; 6],
    interval_ms: Millis,
    last_set: Option<Millis>,
}

impl RemoteSummaryState {
    pub fn new(interval_ms: Millis) -> Self {
        Self {
            fields: Default::default(),
            interval_ms,
            last_set: None,
        }
    }

    /// Merge an update. The timestamp is refreshed even when the update is empty.
    pub fn apply_update(&mut self, update: SummaryUpdate, now: Millis) {
        for (current, incoming) in self.fields.iter_mut().zip(update.fields) {
            if let Some(value) = incoming {
                *current = value;
            }
        }
        if let Some(interval) = update.interval_ms {
            self.interval_ms = interval;
        }
        self.last_set = Some(now);
    }

    pub fn is_fresh(&self, now: Millis, max_age: Millis) -> bool {
        self.last_set
            .is_some_and(|set| now.saturating_sub(set) < max_age)
    }

    pub fn field(&self, field: SummaryField) -> &str {
        &self.fields[field.index()]
    }

    /// Display cycle interval requested by the remote host.
    pub fn interval_ms(&self) -> Millis {
        self.interval_ms
    }

    pub fn last_set(&self) -> Option<Millis> {
        self.last_set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_set_is_never_fresh() {
        let state = RemoteSummaryState::new(5_000);
        assert!(!state.is_fresh(0, 300_000));
        assert!(!state.is_fresh(10, 300_000));
    }

    #[test]
    fn absent_fields_keep_previous_values() {
        let mut state = RemoteSummaryState::new(5_000);
        state.apply_update(
            SummaryUpdate::default()
                .with(SummaryField::Watt, "933")
                .with(SummaryField::Garage, "Shut"),
            100,
        );
        state.apply_update(SummaryUpdate::default().with(SummaryField::Watt, "1084"), 200);

        assert_eq!(state.field(SummaryField::Watt), "1084");
        assert_eq!(state.field(SummaryField::Garage), "Shut");
        assert_eq!(state.field(SummaryField::Water), "");
        assert_eq!(state.interval_ms(), 5_000);
        assert_eq!(state.last_set(), Some(200));
    }

    #[test]
    fn empty_update_still_refreshes_timestamp() {
        let mut state = RemoteSummaryState::new(5_000);
        state.apply_update(SummaryUpdate::default(), 42);
        assert_eq!(state.last_set(), Some(42));
        assert!(state.is_fresh(42, 1));
    }

    #[test]
    fn freshness_expires_after_max_age() {
        let mut state = RemoteSummaryState::new(5_000);
        state.apply_update(SummaryUpdate::default(), 1_000);
        assert!(state.is_fresh(1_999, 1_000));
        assert!(!state.is_fresh(2_000, 1_000));
    }

    #[test]
    fn interval_is_overwritten_when_present() {
        let mut state = RemoteSummaryState::new(5_000);
        state.apply_update(SummaryUpdate::default().with_interval(2_000), 1);
        assert_eq!(state.interval_ms(), 2_000);

        state.apply_update(SummaryUpdate::default().with(SummaryField::Water, "Low"), 2);
        assert_eq!(state.interval_ms(), 2_000);
    }

    #[test]
    fn field_keys_round_trip() {
        for field in SummaryField::ALL {
            assert_eq!(SummaryField::from_key(field.key()), Some(field));
        }
        assert_eq!(SummaryField::from_key("oledInterval"), None);
    }
}
