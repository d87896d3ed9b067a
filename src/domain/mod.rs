//! Domain types and the ports through which the monitor reaches its collaborators.

pub mod keys;
pub mod outcome;
pub mod ports;
pub mod session;
pub mod shipping;
