//! Acquisition timer capability

/// The periodic timer that paces sampling.
pub trait AcquisitionTimer {
    /// Whether an update (reload) event is pending
    fn update_pending(&self) -> bool;

    /// Acknowledge the update event so the next one can fire
    fn clear_update(&mut self);

    /// Program a new prescaler; takes effect at the next reload
    fn set_prescaler(&mut self, prescaler: u16);
}

/// Software stand-in for the hardware timer
#[derive(Debug, Clone)]
pub struct SoftTimer {
    pending: bool,
    prescaler: u16,
}

impl SoftTimer {
    pub fn new(prescaler: u16) -> Self {
        Self {
            pending: false,
            prescaler,
        }
    }

    /// Raise the update flag, as the counter reaching its reload value would
    pub fn fire(&mut self) {
        self.pending = true;
    }

    pub fn prescaler(&self) -> u16 {
        self.prescaler
    }
}

impl AcquisitionTimer for SoftTimer {
    fn update_pending(&self) -> bool {
        self.pending
    }

    fn clear_update(&mut self) {
        self.pending = false;
    }

    fn set_prescaler(&mut self, prescaler: u16) {
        self.prescaler = prescaler;
    }
}
