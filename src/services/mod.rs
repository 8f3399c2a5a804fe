pub mod correlation;
pub mod receiver;
pub mod sender;
pub mod session;
pub mod transport;
