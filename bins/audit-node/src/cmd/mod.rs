pub mod client;
pub mod demo;
pub mod serve;
