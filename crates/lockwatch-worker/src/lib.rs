// Lockwatch dispatch worker
//
// Wires the core scanner and dispatcher to their production backends and
// runs one dispatch pass.

pub mod runner;

pub use runner::{DispatchReport, DispatchRunner};
