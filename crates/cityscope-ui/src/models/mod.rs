pub mod city_table_model;
pub mod weather_model;

pub use city_table_model::CityTableModel;
pub use weather_model::{WeatherModel, WeatherState};
