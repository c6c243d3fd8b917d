#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod configuration;
pub mod description;
pub mod jsep;
pub mod media_engine;
pub mod payload;
pub mod session;
pub mod stream;
