use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{CityDetailType, PicnicDetailType, RegistrationDetailType, UserDetailType},
};

/***************** City models *********************/

/**
 * Query parameters for creating a city.
 */
#[derive(Debug, Deserialize)]
pub struct CreateCityQuery {
    /**
     * The raw city name. Required; its absence is a 400.
     */
    pub city: Option<String>,
}

/**
 * Query parameters for listing cities.
 */
#[derive(Debug, Deserialize)]
pub struct CityListQuery {
    /**
     * Optional case-sensitive substring filter on the city name.
     */
    pub q: Option<String>,
}

/**
 * Response structure for a single city.
 */
#[derive(Debug, Serialize)]
pub struct CityResponse {
    /**
     * The unique identifier of the city.
     */
    pub id: i64,
    /**
     * The normalized city name.
     */
    pub name: String,
    /**
     * The stored weather description, unset on creation.
     */
    pub weather: Option<String>,
}

impl From<CityDetailType> for CityResponse {
    fn from(city: CityDetailType) -> Self {
        CityResponse { id: city.id, name: city.name, weather: city.weather }
    }
}

/***************** User models *********************/

/**
 * Query parameters for listing users.
 */
#[derive(Debug, Deserialize)]
pub struct UserListQuery {
    /**
     * Optional sort order, asc or desc by age.
     */
    pub sort: Option<String>,
}

/**
 * Request body for registering a user.
 */
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub name: String,
    pub surname: String,
    pub age: i32,
}

/**
 * Response structure for a single user.
 */
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /**
     * The unique identifier of the user.
     */
    pub id: i64,
    /**
     * The user's first name.
     */
    pub name: String,
    /**
     * The user's surname.
     */
    pub surname: String,
    /**
     * The user's age in years.
     */
    pub age: i32,
}

impl From<UserDetailType> for UserResponse {
    fn from(user: UserDetailType) -> Self {
        UserResponse { id: user.id, name: user.name, surname: user.surname, age: user.age }
    }
}

/***************** Picnic models *********************/

/**
 * Query parameters for listing picnics.
 */
#[derive(Debug, Deserialize)]
pub struct PicnicListQuery {
    /**
     * Optional exact-match filter on the picnic time.
     */
    pub datetime: Option<DateTime<Utc>>,
    /**
     * Whether picnics before the current time are included. Defaults to
     * true.
     */
    #[serde(default = "default_include_past")]
    pub past: bool,
}

fn default_include_past() -> bool {
    true
}

/**
 * Query parameters for adding a picnic.
 */
#[derive(Debug, Deserialize)]
pub struct PicnicAddQuery {
    pub city_id: Option<i64>,
    pub datetime: Option<DateTime<Utc>>,
}

/**
 * Query parameters for registering a user to a picnic.
 */
#[derive(Debug, Deserialize)]
pub struct PicnicRegisterQuery {
    pub picnic_id: Option<i64>,
    pub user_id: Option<i64>,
}

/**
 * Response structure for a picnic with its registered users.
 */
#[derive(Debug, Serialize)]
pub struct PicnicResponse {
    /**
     * The unique identifier of the picnic.
     */
    pub id: i64,
    /**
     * The resolved name of the city the picnic takes place in.
     */
    pub city: String,
    /**
     * The time of the picnic.
     */
    pub time: DateTime<Utc>,
    /**
     * The users registered for the picnic.
     */
    pub users: Vec<UserResponse>,
}

impl From<PicnicDetailType> for PicnicResponse {
    fn from(picnic: PicnicDetailType) -> Self {
        PicnicResponse { id: picnic.id, city: picnic.city_name, time: picnic.time, users: picnic.users.into_iter().map(UserResponse::from).collect() }
    }
}

/**
 * Response structure for a freshly added picnic.
 */
#[derive(Debug, Serialize)]
pub struct PicnicAddResponse {
    pub id: i64,
    pub city: String,
    pub time: DateTime<Utc>,
}

impl From<PicnicDetailType> for PicnicAddResponse {
    fn from(picnic: PicnicDetailType) -> Self {
        PicnicAddResponse { id: picnic.id, city: picnic.city_name, time: picnic.time }
    }
}

/**
 * Response structure for a picnic registration, with the picnic's city
 * and time and the user's name resolved.
 */
#[derive(Debug, Serialize)]
pub struct PicnicRegisterResponse {
    pub id: i64,
    pub city: String,
    pub time: DateTime<Utc>,
    pub user_id: i64,
    pub name: String,
}

impl From<RegistrationDetailType> for PicnicRegisterResponse {
    fn from(registration: RegistrationDetailType) -> Self {
        PicnicRegisterResponse { id: registration.id, city: registration.city_name, time: registration.time, user_id: registration.user_id, name: registration.user_name }
    }
}

/***************** Error models *********************/

/**
 * Custom error response for the application.
 */
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /**
     * The error code associated with the error type.
     */
    pub code: u16,
    /**
     * A human-readable message describing the error.
     */
    pub message: String,
}

impl ResponseError for ApplicationError {
    /**
     * Generates an error response for the application error.
     */
    fn error_response(&self) -> HttpResponse {
        let error_response = ErrorResponse { code: get_error_code(&self.error_type), message: self.message.clone() };
        HttpResponse::build(get_statuscode(&self.error_type)).json(&error_response)
    }

    fn status_code(&self) -> StatusCode {
        get_statuscode(&self.error_type)
    }
}

/**
* Maps application errors to HTTP status codes.
*
* # Arguments
* `application_error`: The type of error that occurred.
*
* # Returns
* The corresponding HTTP status code.
*/
fn get_statuscode(application_error: &ErrorType) -> StatusCode {
    match application_error {
        ErrorType::MissingParameter => StatusCode::BAD_REQUEST,
        ErrorType::InvalidParameter => StatusCode::BAD_REQUEST,
        ErrorType::Validation => StatusCode::BAD_REQUEST,
        ErrorType::ReferentialGap => StatusCode::BAD_REQUEST,
        ErrorType::GeocodingUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorType::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::Initialization => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorType::Application => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/**
 * Maps application errors to error codes.
 *
 * # Arguments
 * `application_error`: The type of error that occurred.
 *
 * # Returns
 * The corresponding error code.
 */
fn get_error_code(application_error: &ErrorType) -> u16 {
    match application_error {
        ErrorType::MissingParameter => 1000,
        ErrorType::InvalidParameter => 1001,
        ErrorType::Validation => 1002,
        ErrorType::ReferentialGap => 1003,
        ErrorType::GeocodingUnavailable => 1004,
        ErrorType::DatabaseError => 1005,
        ErrorType::Initialization => 1006,
        ErrorType::Application => 1007,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_statuscode_mapping() {
        assert_eq!(get_statuscode(&ErrorType::MissingParameter), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::InvalidParameter), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::ReferentialGap), StatusCode::BAD_REQUEST);
        assert_eq!(get_statuscode(&ErrorType::GeocodingUnavailable), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(get_statuscode(&ErrorType::DatabaseError), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_error_code_mapping_is_distinct() {
        let codes = [
            get_error_code(&ErrorType::MissingParameter),
            get_error_code(&ErrorType::InvalidParameter),
            get_error_code(&ErrorType::Validation),
            get_error_code(&ErrorType::ReferentialGap),
            get_error_code(&ErrorType::GeocodingUnavailable),
            get_error_code(&ErrorType::DatabaseError),
            get_error_code(&ErrorType::Initialization),
            get_error_code(&ErrorType::Application),
        ];
        let mut deduped = codes.to_vec();
        deduped.sort_unstable();
        deduped.dedup();
        assert_eq!(deduped.len(), codes.len());
    }

    #[test]
    fn test_city_response_from_detail() {
        let city = CityDetailType::new(1, "Paris".to_string(), None);
        let response = CityResponse::from(city);
        assert_eq!(response.id, 1);
        assert_eq!(response.name, "Paris");
        assert!(response.weather.is_none());
    }

    #[test]
    fn test_picnic_response_from_detail() {
        let time = chrono::Utc::now();
        let users = vec![UserDetailType::new(7, "A".to_string(), "B".to_string(), 30)];
        let picnic = PicnicDetailType::new(2, "Oslo".to_string(), time, users);
        let response = PicnicResponse::from(picnic);
        assert_eq!(response.id, 2);
        assert_eq!(response.city, "Oslo");
        assert_eq!(response.time, time);
        assert_eq!(response.users.len(), 1);
        assert_eq!(response.users[0].id, 7);
    }

    #[test]
    fn test_register_response_from_detail() {
        let time = chrono::Utc::now();
        let registration = RegistrationDetailType::new(3, "Oslo".to_string(), time, 7, "A".to_string());
        let response = PicnicRegisterResponse::from(registration);
        assert_eq!(response.id, 3);
        assert_eq!(response.user_id, 7);
        assert_eq!(response.name, "A");
    }

    #[test]
    fn test_picnic_list_query_past_defaults_true() {
        let query: PicnicListQuery = serde_json::from_str("{}").unwrap();
        assert!(query.past);
        assert!(query.datetime.is_none());
    }

    #[test]
    fn test_error_response_body() {
        let error = ApplicationError::new(ErrorType::InvalidParameter, "Parameter city must be an existing city".to_string());
        let response = error.error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
