//! Background services: network work runs on the tokio runtime and results
//! come back to the UI thread over `std::sync::mpsc`.

pub mod city_service;
pub mod weather_service;
