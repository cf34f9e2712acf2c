use super::Frame;
use crate::Result;

/// Sink a composed frame is pushed to.
pub trait Panel {
    fn name(&self) -> &'static str;

    fn show(&mut self, frame: &Frame) -> Result<()>;
}

/// Keeps the last frame in memory. Used headless and in tests.
#[derive(Debug, Default)]
pub struct MemoryPanel {
    last: Option<Frame>,
    shown: usize,
}

impl MemoryPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&Frame> {
        self.last.as_ref()
    }

    pub fn shown(&self) -> usize {
        self.shown
    }
}

impl Panel for MemoryPanel {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn show(&mut self, frame: &Frame) -> Result<()> {
        self.last = Some(frame.clone());
        self.shown += 1;
        Ok(())
    }
}

impl<P: Panel + ?Sized> Panel for Box<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn show(&mut self, frame: &Frame) -> Result<()> {
        (**self).show(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_panel_keeps_last_frame() {
        let mut panel = MemoryPanel::new();
        assert!(panel.last().is_none());

        let mut frame = Frame::blank();
        panel.show(&frame).unwrap();
        frame.set_pixel(1, 1, true);
        panel.show(&frame).unwrap();

        assert_eq!(panel.shown(), 2);
        assert!(panel.last().unwrap().pixel(1, 1));
    }

    #[test]
    fn boxed_panel_forwards() {
        let mut panel: Box<dyn Panel> = Box::new(MemoryPanel::new());
        assert_eq!(panel.name(), "memory");
        panel.show(&Frame::blank()).unwrap();
    }
}
