pub mod clock;
pub mod collector;
pub mod config;
pub mod crypto;
pub mod packet;
pub mod sampling;
pub mod transmitter;
pub mod transport;
