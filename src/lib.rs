pub mod cli;
pub mod config;
pub mod logfile;
pub mod network;
pub mod output;
pub mod pipeline;
pub mod ports;
pub mod scanner;
