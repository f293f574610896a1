use chrono::{DateTime, Utc};

use crate::model::apperror::{ApplicationError, ErrorType};

/**
 * Detail of a single city.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct CityDetailType {
    pub id: i64,
    pub name: String,
    pub weather: Option<String>,
}

impl CityDetailType {
    pub fn new(id: i64, name: String, weather: Option<String>) -> Self {
        CityDetailType { id, name, weather }
    }
}

/**
 * Detail of a single user.
 */
#[derive(Debug, Clone, PartialEq)]
pub struct UserDetailType {
    pub id: i64,
    pub name: String,
    pub surname: String,
    pub age: i32,
}

impl UserDetailType {
    pub fn new(id: i64, name: String, surname: String, age: i32) -> Self {
        UserDetailType { id, name, surname, age }
    }
}

/**
 * Detail of a single picnic with its resolved city name and the users
 * registered for it.
 */
#[derive(Debug, Clone)]
pub struct PicnicDetailType {
    pub id: i64,
    pub city_name: String,
    pub time: DateTime<Utc>,
    pub users: Vec<UserDetailType>,
}

impl PicnicDetailType {
    pub fn new(id: i64, city_name: String, time: DateTime<Utc>, users: Vec<UserDetailType>) -> Self {
        PicnicDetailType { id, city_name, time, users }
    }
}

/**
 * Detail of a registration linking one user to one picnic, with the
 * picnic's city and time and the user's name resolved.
 */
#[derive(Debug, Clone)]
pub struct RegistrationDetailType {
    pub id: i64,
    pub city_name: String,
    pub time: DateTime<Utc>,
    pub user_id: i64,
    pub user_name: String,
}

impl RegistrationDetailType {
    pub fn new(id: i64, city_name: String, time: DateTime<Utc>, user_id: i64, user_name: String) -> Self {
        RegistrationDetailType { id, city_name, time, user_id, user_name }
    }
}

/**
 * Input for creating a city. The stored name is the normalized form,
 * which is also the dedup key.
 */
#[derive(Debug, Clone)]
pub struct CityAddInputType {
    pub name: String,
}

impl CityAddInputType {
    /**
     * Creates the input from a raw city name, normalizing it.
     */
    pub fn new(name: &str) -> Self {
        CityAddInputType { name: normalize_city_name(name) }
    }
}

/**
 * Input for registering a user.
 */
#[derive(Debug, Clone)]
pub struct UserAddInputType {
    pub name: String,
    pub surname: String,
    pub age: i32,
}

impl UserAddInputType {
    pub fn new(name: String, surname: String, age: i32) -> Self {
        UserAddInputType { name, surname, age }
    }

    /**
     * Validates the input.
     *
     * # Returns
     * The validated input or an `ApplicationError` of type `Validation`.
     */
    pub fn validate(self) -> Result<Self, ApplicationError> {
        if self.name.trim().is_empty() {
            return Err(ApplicationError::new(ErrorType::Validation, "Name must not be empty".to_string()));
        }
        if self.surname.trim().is_empty() {
            return Err(ApplicationError::new(ErrorType::Validation, "Surname must not be empty".to_string()));
        }
        if self.age < 0 {
            return Err(ApplicationError::new(ErrorType::Validation, "Age must not be negative".to_string()));
        }
        Ok(self)
    }
}

/**
 * Input for creating a picnic.
 */
#[derive(Debug, Clone)]
pub struct PicnicAddInputType {
    pub city_id: i64,
    pub time: DateTime<Utc>,
}

impl PicnicAddInputType {
    pub fn new(city_id: i64, time: DateTime<Utc>) -> Self {
        PicnicAddInputType { city_id, time }
    }
}

/**
 * Input for registering a user to a picnic.
 */
#[derive(Debug, Clone)]
pub struct RegistrationAddInputType {
    pub picnic_id: i64,
    pub user_id: i64,
}

impl RegistrationAddInputType {
    pub fn new(picnic_id: i64, user_id: i64) -> Self {
        RegistrationAddInputType { picnic_id, user_id }
    }
}

/**
 * Filter for listing picnics.
 */
#[derive(Debug, Clone)]
pub struct PicnicsListInputType {
    /**
     * When set, only picnics at exactly this time are returned.
     */
    pub time: Option<DateTime<Utc>>,
    /**
     * When false, picnics strictly before the current time are excluded.
     */
    pub include_past: bool,
}

impl PicnicsListInputType {
    pub fn new(time: Option<DateTime<Utc>>, include_past: bool) -> Self {
        PicnicsListInputType { time, include_past }
    }
}

/**
 * Ordering of the user list.
 */
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UserSortOrder {
    /**
     * Ascending by age.
     */
    AgeAscending,
    /**
     * Descending by age.
     */
    AgeDescending,
    /**
     * Insertion order, used when no sort parameter is supplied.
     */
    Unsorted,
}

impl UserSortOrder {
    /**
     * Parses the `sort` query parameter. The source system left unknown
     * values as an unhandled state; here they are rejected.
     *
     * # Arguments
     * `sort`: The raw parameter value, if supplied.
     *
     * # Returns
     * The sort order or an `ApplicationError` of type `InvalidParameter`.
     */
    pub fn parse(sort: Option<&str>) -> Result<Self, ApplicationError> {
        match sort {
            Some("asc") => Ok(UserSortOrder::AgeAscending),
            Some("desc") => Ok(UserSortOrder::AgeDescending),
            None => Ok(UserSortOrder::Unsorted),
            Some(other) => Err(ApplicationError::new(ErrorType::InvalidParameter, format!("Parameter sort must be asc or desc, got {other}"))),
        }
    }
}

/**
 * Normalizes a city name for storage and lookup. The first character is
 * uppercased and the remainder lowercased, so "paris", "PARIS" and
 * "Paris" all map to the same row.
 *
 * # Arguments
 * `name`: The raw city name.
 *
 * # Returns
 * The normalized name.
 */
pub fn normalize_city_name(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase(),
        None => String::new(),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_normalize_lowercase() {
        assert_eq!(normalize_city_name("paris"), "Paris");
    }

    #[test]
    fn test_normalize_uppercase() {
        assert_eq!(normalize_city_name("PARIS"), "Paris");
    }

    #[test]
    fn test_normalize_already_normalized() {
        assert_eq!(normalize_city_name("Paris"), "Paris");
    }

    #[test]
    fn test_normalize_multiword_only_touches_first_letter() {
        assert_eq!(normalize_city_name("new york"), "New york");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_city_name(""), "");
    }

    #[test]
    fn test_sort_order_asc() {
        assert_eq!(UserSortOrder::parse(Some("asc")).unwrap(), UserSortOrder::AgeAscending);
    }

    #[test]
    fn test_sort_order_desc() {
        assert_eq!(UserSortOrder::parse(Some("desc")).unwrap(), UserSortOrder::AgeDescending);
    }

    #[test]
    fn test_sort_order_absent() {
        assert_eq!(UserSortOrder::parse(None).unwrap(), UserSortOrder::Unsorted);
    }

    #[test]
    fn test_sort_order_unknown_rejected() {
        let result = UserSortOrder::parse(Some("upwards"));
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().error_type, crate::model::apperror::ErrorType::InvalidParameter);
    }

    #[test]
    fn test_user_input_valid() {
        let input = UserAddInputType::new("A".to_string(), "B".to_string(), 30);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_user_input_empty_name_rejected() {
        let input = UserAddInputType::new(" ".to_string(), "B".to_string(), 30);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_user_input_negative_age_rejected() {
        let input = UserAddInputType::new("A".to_string(), "B".to_string(), -1);
        assert!(input.validate().is_err());
    }

    #[test]
    fn test_city_input_normalizes() {
        let input = CityAddInputType::new("oslo");
        assert_eq!(input.name, "Oslo");
    }
}
