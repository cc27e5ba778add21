pub mod cpu;
pub mod runner;
pub mod worker;

pub use cpu::Machine;
pub use runner::{Burst, Runner};
pub use worker::{Reply, Request, Worker};
