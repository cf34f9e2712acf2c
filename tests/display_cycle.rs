use airnode::{
    display::{MemoryPanel, Panel},
    metrics::{Identity, TemperatureUnit},
    node::{Node, NodeSettings},
    sensors::{fake::ScriptedSensor, Quantity, SamplerIntervals, SensorSampler},
    state::{RenderAction, SummaryField, SummaryUpdate, SLOT_BYTES},
};

const INTERVAL: u64 = 1_000;

fn node(max_age: u64) -> Node {
    let mut sampler = SensorSampler::new(SamplerIntervals::default());
    sampler.attach(Box::new(ScriptedSensor::constant(Quantity::Pm25, 8.0)));
    sampler.attach(Box::new(ScriptedSensor::constant(Quantity::Temperature, 21.0)));
    Node::new(
        sampler,
        Identity::new("cycle", None),
        NodeSettings {
            slot_max_age_ms: max_age,
            summary_max_age_ms: max_age,
            min_display_interval_ms: 500,
            unit: TemperatureUnit::Celsius,
        },
        INTERVAL,
    )
}

fn bitmap(fill: u8) -> Vec<u8> {
    vec![fill; SLOT_BYTES]
}

fn ticks(node: &mut Node, times: &[u64]) -> Vec<Option<RenderAction>> {
    times.iter().map(|&t| node.tick_display(t)).collect()
}

#[test]
fn full_rotation_visits_every_phase() {
    let mut node = node(300_000);
    node.slots.write(2, &bitmap(0x0f), 0).unwrap();
    node.summary.apply_update(
        SummaryUpdate::default().with(SummaryField::Watt, "512"),
        0,
    );

    let seen = ticks(&mut node, &[1_000, 2_000, 3_000, 4_000, 5_000]);
    assert_eq!(
        seen,
        vec![
            Some(RenderAction::CustomBitmap(2)),
            Some(RenderAction::RemoteSummary),
            Some(RenderAction::CustomBitmap(2)),
            Some(RenderAction::BuiltinSummary),
            Some(RenderAction::CustomBitmap(2)),
        ]
    );
}

#[test]
fn nothing_happens_before_the_interval() {
    let mut node = node(300_000);
    assert_eq!(node.tick_display(INTERVAL - 1), None);
    assert_eq!(node.tick_display(INTERVAL), Some(RenderAction::BuiltinSummary));
    assert_eq!(node.tick_display(INTERVAL + 10), None);
}

#[test]
fn custom_slots_rotate_without_remote_summary() {
    let mut node = node(300_000);
    node.slots.write(3, &bitmap(0x01), 0).unwrap();
    node.slots.write(7, &bitmap(0x02), 0).unwrap();

    let seen = ticks(&mut node, &[1_000, 2_000, 3_000, 4_000, 5_000]);
    assert_eq!(
        seen,
        vec![
            Some(RenderAction::CustomBitmap(3)),
            Some(RenderAction::BuiltinSummary),
            Some(RenderAction::CustomBitmap(7)),
            Some(RenderAction::BuiltinSummary),
            Some(RenderAction::CustomBitmap(3)),
        ]
    );
}

#[test]
fn stale_content_degrades_to_builtin_screen() {
    let mut node = node(10_000);
    node.slots.write(5, &bitmap(0xff), 0).unwrap();
    node.summary.apply_update(SummaryUpdate::default(), 0);

    assert_eq!(node.tick_display(1_000), Some(RenderAction::CustomBitmap(5)));
    let later = ticks(&mut node, &[20_000, 20_000, 20_000, 20_000]);
    assert!(later
        .iter()
        .all(|a| *a == Some(RenderAction::BuiltinSummary)));
}

#[test]
fn remote_interval_changes_the_cadence() {
    let mut node = node(300_000);
    node.summary.apply_update(SummaryUpdate::default().with_interval(3_000), 0);
    assert_eq!(node.tick_display(2_000), None);
    assert!(node.tick_display(3_000).is_some());
}

#[test]
fn composed_frames_reach_the_panel() {
    let mut node = node(300_000);
    node.tick_sensors(5_000);
    let payload = bitmap(0x55);
    node.slots.write(0, &payload, 0).unwrap();

    let mut panel = MemoryPanel::new();
    let action = node.tick_display(1_000).unwrap();
    assert_eq!(action, RenderAction::CustomBitmap(0));
    panel.show(&node.compose(action)).unwrap();
    assert_eq!(&panel.last().unwrap().as_bytes()[..], &payload[..]);

    let builtin = node.compose(RenderAction::BuiltinSummary);
    assert!(!builtin.is_blank());
    panel.show(&builtin).unwrap();
    assert_eq!(panel.shown(), 2);
}
