//! Live adapters around the loudprobe metering engine.
//!
//! Two ways to run the engine against a capture source:
//! - **Metering thread**: the capture callback pushes frames into a SPSC ring
//!   buffer; [`run_meter_thread`] owns the engine and assembles blocks
//! - **Capture thread**: [`CaptureMeter`] runs the engine inline on the thread
//!   that already produces whole blocks
//!
//! Either way the latest snapshot is swapped into [`LiveMeterState`] and read
//! through a [`MeterHandle`] without locking.

pub mod capture;
pub mod error;
pub mod live;

mod handle;

pub use capture::CaptureMeter;
pub use error::{Error, Result};
pub use handle::MeterHandle;
pub use live::{run_meter_thread, LiveConfig, LiveMeterState, MeterCommand};
