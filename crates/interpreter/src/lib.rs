//! Step interpreter
//!
//! Takes an ordered list of declarative steps and drives the live document
//! accordingly: strictly sequential, a fixed settle delay between steps,
//! and any step failure aborts the remainder of the run.

mod errors;
mod fill;
mod interpreter;
mod report;
mod timing;
mod wait;

pub use errors::{StepError, TimeoutKind};
pub use interpreter::StepInterpreter;
pub use report::RunReport;
pub use timing::StepTiming;
