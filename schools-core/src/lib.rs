//! schools-core library
//!
//! Input validation, great-circle distance and proximity ranking for the
//! schools service. Everything here is pure and synchronous; storage and
//! HTTP live in `schools-data` and `schools-web`.

pub mod distance;
pub mod error;
pub mod proximity;
pub mod types;
pub mod validation;

pub use distance::{haversine_distance_km, EARTH_RADIUS_KM};
pub use error::ValidationFailure;
pub use proximity::rank_by_proximity;
pub use types::{Coordinate, NewSchool, RankedSchool, School};
pub use validation::{
    parse_coordinate, parse_new_school, validate_coordinates, validate_creation, ValidationResult,
};
