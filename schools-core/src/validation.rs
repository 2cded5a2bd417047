//! Validation of school creation payloads and coordinate query parameters.
//!
//! Payloads are untyped JSON. Every rule is checked independently and each
//! violation adds its own message, so a caller with several bad fields sees
//! all of them in one response.

use serde_json::Value;

use crate::error::ValidationFailure;
use crate::types::{Coordinate, NewSchool};

const NAME_REQUIRED: &str = "Name is required and must be a non-empty string";
const ADDRESS_REQUIRED: &str = "Address is required and must be a non-empty string";
const LATITUDE_INVALID: &str = "Latitude must be a valid number";
const LATITUDE_RANGE: &str = "Latitude must be between -90 and 90";
const LONGITUDE_INVALID: &str = "Longitude must be a valid number";
const LONGITUDE_RANGE: &str = "Longitude must be between -180 and 180";

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationResult {
    /// Violated rules, in check order.
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }

    pub fn into_result(self) -> Result<(), ValidationFailure> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(ValidationFailure::new(self.errors))
        }
    }
}

/// How a coordinate field looked after parsing.
#[derive(Debug, Clone, Copy, PartialEq)]
enum NumberField {
    Missing,
    Invalid,
    Value(f64),
}

fn field<'a>(payload: &'a Value, key: &str) -> Option<&'a Value> {
    payload.get(key).filter(|v| !v.is_null())
}

fn non_blank_string(value: Option<&Value>) -> Option<&str> {
    value
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Parse a number that may arrive as a JSON number or as a string.
fn number_field(value: Option<&Value>) -> NumberField {
    let parsed = match value {
        None => return NumberField::Missing,
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(n) if n.is_finite() => NumberField::Value(n),
        _ => NumberField::Invalid,
    }
}

/// Accumulates coordinate checks. Missing fields only report "required".
struct CoordinateChecks {
    latitude: NumberField,
    longitude: NumberField,
}

impl CoordinateChecks {
    fn read(payload: &Value) -> Self {
        Self {
            latitude: number_field(field(payload, "latitude")),
            longitude: number_field(field(payload, "longitude")),
        }
    }

    fn check(
        &self,
        result: &mut ValidationResult,
        latitude_required: &str,
        longitude_required: &str,
    ) {
        if self.latitude == NumberField::Missing {
            result.add_error(latitude_required);
        }
        if self.longitude == NumberField::Missing {
            result.add_error(longitude_required);
        }

        match self.latitude {
            NumberField::Invalid => result.add_error(LATITUDE_INVALID),
            NumberField::Value(lat) if !(-90.0..=90.0).contains(&lat) => {
                result.add_error(LATITUDE_RANGE)
            }
            _ => {}
        }

        match self.longitude {
            NumberField::Invalid => result.add_error(LONGITUDE_INVALID),
            NumberField::Value(lon) if !(-180.0..=180.0).contains(&lon) => {
                result.add_error(LONGITUDE_RANGE)
            }
            _ => {}
        }
    }

    fn coordinate(&self) -> Option<Coordinate> {
        match (self.latitude, self.longitude) {
            (NumberField::Value(lat), NumberField::Value(lon)) => Some(Coordinate::new(lat, lon)),
            _ => None,
        }
    }
}

/// Validate a school creation payload (`name`, `address`, `latitude`, `longitude`).
pub fn validate_creation(payload: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();

    if non_blank_string(field(payload, "name")).is_none() {
        result.add_error(NAME_REQUIRED);
    }
    if non_blank_string(field(payload, "address")).is_none() {
        result.add_error(ADDRESS_REQUIRED);
    }

    CoordinateChecks::read(payload).check(
        &mut result,
        "Latitude is required",
        "Longitude is required",
    );

    result
}

/// Validate `latitude`/`longitude` query parameters.
pub fn validate_coordinates(params: &Value) -> ValidationResult {
    let mut result = ValidationResult::new();
    CoordinateChecks::read(params).check(
        &mut result,
        "Latitude parameter is required",
        "Longitude parameter is required",
    );
    result
}

/// Validate a creation payload and build the typed request from it.
pub fn parse_new_school(payload: &Value) -> Result<NewSchool, ValidationFailure> {
    validate_creation(payload).into_result()?;

    let name = non_blank_string(field(payload, "name"));
    let address = non_blank_string(field(payload, "address"));
    match (name, address, CoordinateChecks::read(payload).coordinate()) {
        (Some(name), Some(address), Some(point)) => Ok(NewSchool::new(
            name.to_string(),
            address.to_string(),
            point.latitude,
            point.longitude,
        )),
        _ => Err(ValidationFailure::new(vec![
            "School payload is incomplete".to_string(),
        ])),
    }
}

/// Validate query parameters and build the target coordinate.
pub fn parse_coordinate(params: &Value) -> Result<Coordinate, ValidationFailure> {
    validate_coordinates(params).into_result()?;

    CoordinateChecks::read(params)
        .coordinate()
        .ok_or_else(|| ValidationFailure::new(vec![LATITUDE_INVALID.to_string()]))
}
