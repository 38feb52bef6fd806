pub mod cycles;
pub mod diagnosability;
pub mod errors;
pub mod io;
pub mod label;
pub mod model;
pub mod monitor;
pub mod observer;
pub mod recognizer;
pub mod report;
