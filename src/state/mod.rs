//! Display content state: uploaded bitmap slots, the remote summary, and the
//! four-phase cycle that picks what to show next.

pub mod cycle;
pub mod slots;
pub mod summary;

pub use cycle::{resolve_phase, DisplayCycle, Phase, RenderAction, Resolution};
pub use slots::{DisplaySlotStore, SlotError, SlotWrite, SLOT_BYTES, SLOT_COUNT};
pub use summary::{RemoteSummaryState, SummaryField, SummaryUpdate};
