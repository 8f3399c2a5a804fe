pub mod providers;
pub mod sink;
pub mod transport;
