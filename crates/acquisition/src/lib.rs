//! Timer-Driven Acquisition
//!
//! The producer side of the stream: on every timer update the handler reads
//! one converter sample, flags out-of-band values, encodes the sample and
//! pushes sealed frames into the ring buffer. The sampling rate is shared
//! with the command path through [`AcquisitionPeriod`].

mod handler;
mod indicator;
mod period;
mod source;
mod timer;

pub use handler::{AcquisitionConfig, AcquisitionHandler, HandlerStats};
pub use indicator::{CountingIndicator, StatusIndicator};
pub use period::AcquisitionPeriod;
pub use source::{SampleSource, SineSource, SineSourceConfig, SourceConfigError};
pub use timer::{AcquisitionTimer, SoftTimer};
