use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use std::thread;
use std::time::{Duration, Instant};

use super::lifecycle::render_shutdown;
use super::telemetry::Telemetry;
use super::Logger;
use crate::display::Panel;
use crate::http::{routes, HttpServer};
use crate::node::Node;
use crate::{Millis, Result};

const IDLE_SLEEP_MS: u64 = 10;

/// Everything one loop iteration touches.
pub(super) struct PollContext<'a, P: Panel + ?Sized> {
    pub node: &'a mut Node,
    pub panel: &'a mut P,
    pub server: &'a HttpServer,
    pub telemetry: &'a mut Telemetry,
    pub logger: &'a Logger,
}

/// Drive sensors, the display rotation and the HTTP listener until `running` clears.
pub(super) fn run_poll_loop<P: Panel + ?Sized>(
    ctx: &mut PollContext<'_, P>,
    running: Arc<AtomicBool>,
) -> Result<()> {
    let started = Instant::now();
    while running.load(Ordering::SeqCst) {
        let now = started.elapsed().as_millis() as Millis;
        poll_once(ctx, now);
        thread::sleep(Duration::from_millis(IDLE_SLEEP_MS));
    }

    ctx.logger.info("shutdown requested; stopping");
    render_shutdown(&mut *ctx.panel)
}

/// One cooperative pass. Nothing in here is fatal; failures are logged and the loop goes on.
pub(super) fn poll_once<P: Panel + ?Sized>(ctx: &mut PollContext<'_, P>, now: Millis) {
    let report = ctx.node.tick_sensors(now);
    for failure in &report.failures {
        ctx.logger.debug(format!(
            "{} read via {} failed: {}",
            failure.quantity, failure.driver, failure.error
        ));
        if let Err(err) = ctx.telemetry.record_failure(failure) {
            ctx.logger.warn(format!("telemetry write failed: {err}"));
        }
    }
    for &quantity in &report.updated {
        if let Err(err) = ctx.telemetry.record_recovery(quantity) {
            ctx.logger.warn(format!("telemetry write failed: {err}"));
        }
    }

    if let Some(action) = ctx.node.tick_display(now) {
        ctx.logger.trace(format!("display -> {action:?}"));
        let frame = ctx.node.compose(action);
        if let Err(err) = ctx.panel.show(&frame) {
            ctx.logger
                .warn(format!("{} panel update failed: {err}", ctx.panel.name()));
        }
    }

    let node = &mut *ctx.node;
    let logger = ctx.logger;
    ctx.server
        .poll(logger, |request| routes::handle(node, request, now, logger));
}
