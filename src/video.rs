use crate::types::Frame;
use anyhow::{bail, Result};

/// A live frame source owned by one detection session. Not required to be
/// `Send`: device handles such as webcams are usually tied to their thread.
pub trait VideoSource {
    fn name(&self) -> String;

    /// Acquire the device. May fail with permission or availability errors.
    fn open(&mut self) -> Result<()>;

    /// Frame size once the stream is producing frames.
    fn dimensions(&self) -> Option<(u32, u32)>;

    fn capture(&mut self) -> Result<Frame>;

    /// Best-effort release; safe to call repeatedly.
    fn release(&mut self);
}

/// Produces black frames of a fixed size. Used with providers that do not
/// look at pixels (simulation, replay).
pub struct BlankSource {
    width: u32,
    height: u32,
    open: bool,
}

impl BlankSource {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            open: false,
        }
    }
}

impl VideoSource for BlankSource {
    fn name(&self) -> String {
        format!("Blank {}x{}", self.width, self.height)
    }

    fn open(&mut self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("Blank source has no area ({}x{})", self.width, self.height);
        }
        self.open = true;
        Ok(())
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.open.then_some((self.width, self.height))
    }

    fn capture(&mut self) -> Result<Frame> {
        if !self.open {
            bail!("Blank source is not open");
        }
        Ok(Frame::new(self.width, self.height))
    }

    fn release(&mut self) {
        self.open = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimensions_only_while_open() {
        let mut src = BlankSource::new(64, 48);
        assert_eq!(src.dimensions(), None);
        assert!(src.capture().is_err());
        src.open().unwrap();
        assert_eq!(src.dimensions(), Some((64, 48)));
        assert_eq!(src.capture().unwrap().dimensions(), (64, 48));
        src.release();
        src.release();
        assert_eq!(src.dimensions(), None);
    }

    #[test]
    fn zero_area_refuses_to_open() {
        assert!(BlankSource::new(0, 10).open().is_err());
    }
}
