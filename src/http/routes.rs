use super::{Request, Response};
use crate::app::logger::Logger;
use crate::node::Node;
use crate::state::{SlotError, SlotWrite, SummaryField, SummaryUpdate, SLOT_COUNT};
use crate::Millis;

const OLED_INTERVAL_ARG: &str = "oledInterval";

/// Route a request into the node and build the response.
pub fn handle(node: &mut Node, request: &Request, now: Millis, logger: &Logger) -> Response {
    match (request.method.as_str(), request.path.as_str()) {
        ("GET", "/") | ("GET", "/metrics") => Response::text(node.metrics(now)),
        ("POST", "/setscreen2") => set_screen(node, request, now, logger),
        ("POST", "/uploadscreen") => upload_screen(node, request, now, logger),
        _ => not_found(request),
    }
}

fn set_screen(node: &mut Node, request: &Request, now: Millis, logger: &Logger) -> Response {
    let mut update = SummaryUpdate::default();
    for field in SummaryField::ALL {
        if let Some(value) = request.arg_str(field.key()) {
            update.set(field, value);
        }
    }

    if let Some(raw) = request.arg_str(OLED_INTERVAL_ARG) {
        let min = node.settings().min_display_interval_ms;
        match raw.trim().parse::<Millis>() {
            Ok(ms) if ms < min => {
                logger.debug(format!("{OLED_INTERVAL_ARG}={ms} raised to minimum {min}ms"));
                update.interval_ms = Some(min);
            }
            Ok(ms) => update.interval_ms = Some(ms),
            Err(_) => logger.warn(format!(
                "ignoring {OLED_INTERVAL_ARG} '{raw}': expected integer milliseconds"
            )),
        }
    }

    node.summary.apply_update(update, now);
    Response::html("Thank you.\n")
}

fn upload_screen(node: &mut Node, request: &Request, now: Millis, logger: &Logger) -> Response {
    let mut report = String::new();
    for index in 0..SLOT_COUNT {
        let key = format!("d{index}");
        let Some(payload) = request.arg(&key) else {
            continue;
        };
        let line = match node.slots.write(index, payload, now) {
            Ok(SlotWrite::Stored) => format!("{key}: OK"),
            Ok(SlotWrite::Cleared) => format!("{key}: cleared"),
            Err(SlotError::LengthMismatch { expected, actual }) => {
                format!("ERROR: {key} expected {expected} bytes, got {actual}")
            }
            Err(err @ SlotError::OutOfRange(_)) => format!("ERROR: {key} {err}"),
        };
        report.push_str(&line);
        report.push('\n');
    }
    logger.debug(format!(
        "upload: {} slot(s) active after request",
        node.slots.active_count()
    ));
    Response::text(report)
}

fn not_found(request: &Request) -> Response {
    let mut body = format!(
        "File Not Found\n\nURI: {}\nMethod: {}\nArguments: {}\n",
        request.path,
        request.method,
        request.args().len()
    );
    for (name, value) in request.args() {
        body.push_str(&format!(" {}: {}\n", name, String::from_utf8_lossy(value)));
    }
    Response::not_found(body)
}
