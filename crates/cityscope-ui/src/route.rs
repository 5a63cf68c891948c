//! Screen routes.
//!
//! `/` is the city table. `/weather/{cityName}` is the weather detail; the
//! coordinates travel with the route rather than in the path.

use cityscope_cities::City;
use cityscope_weather::Coordinates;

#[derive(Debug, Clone, PartialEq)]
pub enum Route {
    CityTable,
    Weather {
        city_name: String,
        coordinates: Coordinates,
    },
}

impl Route {
    /// Route to the weather detail for `city`.
    pub fn for_city(city: &City) -> Self {
        let (latitude, longitude) = city.coordinates();
        Route::Weather {
            city_name: city.name.clone(),
            coordinates: Coordinates::new(latitude, longitude),
        }
    }

    /// Path with the city name URL-encoded.
    pub fn path(&self) -> String {
        match self {
            Route::CityTable => "/".to_string(),
            Route::Weather { city_name, .. } => {
                format!("/weather/{}", urlencoding::encode(city_name))
            }
        }
    }
}
