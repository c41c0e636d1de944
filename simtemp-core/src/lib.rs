//! # simtemp-core
//!
//! A simulated temperature sensor: a periodic generator publishes one
//! sample per tick into a single locked state cell, and consumers take the
//! latest sample through blocking or non-blocking reads and readiness polls.
//!
//! ### Key Submodules:
//! - `device`: lifecycle (`start`/`stop`) and the consumer interface
//! - `control`: typed and line-oriented configuration
//! - `timer`: re-arming timers (`ThreadTimer`, `ManualTimer`)
//! - `time`: monotonic and virtual clocks
//! - `selftest`: end-to-end check of the alert path
//!
//! ### Example:
//! ```no_run
//! use simtemp_core::prelude::*;
//!
//! let device = SimTemp::new();
//! device.start(Settings::default())?;
//! let sample = device.read(&ReadOptions::blocking())?;
//! println!("{} m°C", sample.temp_mc());
//! # Ok::<(), DeviceError>(())
//! ```

pub mod cancel;
pub mod control;
pub mod device;
pub mod error;
pub mod limits;
pub mod mode;
pub mod sample;
pub mod selftest;
pub mod stats;
pub mod time;
pub mod timer;

mod gate;
mod generator;
mod state;

pub mod prelude {
    pub use crate::cancel::CancelToken;
    pub use crate::control::Attribute;
    pub use crate::device::{ReadOptions, Readiness, Settings, SimTemp, SimTempBuilder};
    pub use crate::error::DeviceError;
    pub use crate::mode::Mode;
    pub use crate::sample::{Sample, SampleFlags, SAMPLE_SIZE};
    pub use crate::stats::Statistics;
    pub use crate::time::{Clock, MonotonicClock, VirtualClock};
    pub use crate::timer::{ManualTimer, ThreadTimer, Timer, TimerHandle};
}

pub use device::SimTemp;
pub use error::DeviceError;
