//! Calendar export of completed focus work.

mod ics;

pub use ics::{ics_timestamp, FocusDayExport, ICS_FILE_NAME};
