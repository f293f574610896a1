use std::borrow::Cow;

use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use tracing::{Instrument, instrument};

use crate::model::{
    apperror::{ApplicationError, ErrorType},
    models::{CityAddInputType, CityDetailType, PicnicAddInputType, PicnicsListInputType, RegistrationAddInputType, UserAddInputType, UserDetailType, UserSortOrder},
};

/**
 * Database response type for querying cities.
 */
pub type QueryCityDbResp = (i64, String, Option<String>);

/**
 * Database response type for querying users.
 */
pub type QueryUserDbResp = (i64, String, String, i32);

/**
 * Database response type for querying picnics with their resolved city name.
 */
pub type QueryPicnicDbResp = (i64, String, DateTime<Utc>);

/**
 * SQL query to retrieve a city by its exact normalized name.
 */
const QUERY_CITY_BY_NAME: &str = "SELECT id, name, weather FROM cities WHERE name = $1";

/**
 * SQL query to retrieve cities, optionally filtered to names containing a
 * case-sensitive substring.
 */
const QUERY_CITY_LIST: &str = "SELECT id, name, weather FROM cities WHERE $1::text IS NULL OR position($1 in name) > 0 ORDER BY id";

/**
 * SQL query to add a new city. Weather is unset on creation.
 */
const ADD_CITY: &str = "INSERT INTO cities (name) VALUES ($1) RETURNING id, name, weather";

/**
 * SQL query to check whether a city id exists.
 */
const QUERY_CITY_EXISTS: &str = "SELECT id FROM cities WHERE id = $1";

/**
 * SQL queries to retrieve users in the supported orderings.
 */
const QUERY_USER_LIST: &str = "SELECT id, name, surname, age FROM users ORDER BY id";
const QUERY_USER_LIST_AGE_ASC: &str = "SELECT id, name, surname, age FROM users ORDER BY age";
const QUERY_USER_LIST_AGE_DESC: &str = "SELECT id, name, surname, age FROM users ORDER BY age DESC";

/**
 * SQL query to retrieve a user by id.
 */
const QUERY_USER_BY_ID: &str = "SELECT id, name, surname, age FROM users WHERE id = $1";

/**
 * SQL query to add a new user.
 */
const ADD_USER: &str = "INSERT INTO users (name, surname, age) VALUES ($1, $2, $3) RETURNING id, name, surname, age";

/**
 * SQL query to retrieve picnics with their city name, optionally filtered
 * to an exact time and optionally excluding picnics before the current
 * time.
 */
const QUERY_PICNIC_LIST: &str = "SELECT p.id, c.name, p.time
                                 FROM picnics p JOIN cities c ON c.id = p.city_id
                                 WHERE ($1::timestamptz IS NULL OR p.time = $1) AND
                                 ($2::bool OR p.time >= now())
                                 ORDER BY p.id";

/**
 * SQL query to retrieve one picnic with its city name.
 */
const QUERY_PICNIC_BY_ID: &str = "SELECT p.id, c.name, p.time FROM picnics p JOIN cities c ON c.id = p.city_id WHERE p.id = $1";

/**
 * SQL query to add a new picnic.
 */
const ADD_PICNIC: &str = "INSERT INTO picnics (city_id, time) VALUES ($1, $2) RETURNING id";

/**
 * SQL query to retrieve the users registered for a picnic.
 */
const QUERY_PICNIC_USERS: &str = "SELECT u.id, u.name, u.surname, u.age
                                  FROM picnic_registrations r JOIN users u ON u.id = r.user_id
                                  WHERE r.picnic_id = $1
                                  ORDER BY r.id";

/**
 * SQL query to add a new picnic registration.
 */
const ADD_REGISTRATION: &str = "INSERT INTO picnic_registrations (user_id, picnic_id) VALUES ($1, $2) RETURNING id";

/**
 * DAO for picnic-related database operations.
 */
pub struct PicnicDao {}

impl PicnicDao {
    /**
     * Creates a new instance of `PicnicDao`.
     *
     * # Returns
     * A new instance of `PicnicDao`.
     */
    pub fn new() -> Self {
        PicnicDao {}
    }

    /**
     * Retrieves a city by its normalized name.
     *
     * # Arguments
     * `connection`: The database connection.
     * `name`: The normalized city name.
     *
     * # Returns
     * A Result containing the city if one exists, or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_city_by_name(&self, connection: &mut PgConnection, name: &str) -> Result<Option<CityDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryCityDbResp> = sqlx::query_as(QUERY_CITY_BY_NAME)
            .bind(name)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to find city by name: {err}")))?;
        Ok(result.map(|(id, name, weather)| CityDetailType::new(id, name, weather)))
    }

    /**
     * Adds a new city to the database.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `city_add_input`: The input containing the normalized city name.
     *
     * # Returns
     * A Result containing the created city or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_city(&self, transaction: &mut PgConnection, city_add_input: CityAddInputType) -> Result<CityDetailType, ApplicationError> {
        let span = tracing::Span::current();
        let (id, name, weather): QueryCityDbResp = sqlx::query_as(ADD_CITY)
            .bind(city_add_input.name)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        Ok(CityDetailType::new(id, name, weather))
    }

    /**
     * Checks whether a city with the given id exists.
     *
     * # Arguments
     * `connection`: The database connection.
     * `city_id`: The id to check.
     *
     * # Returns
     * A Result containing true if the city exists, or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn city_exists(&self, connection: &mut PgConnection, city_id: i64) -> Result<bool, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<(i64,)> = sqlx::query_as(QUERY_CITY_EXISTS)
            .bind(city_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to check city existence: {err}")))?;
        Ok(result.is_some())
    }

    /**
     * Retrieves cities, optionally filtered to names containing the given
     * substring.
     *
     * # Arguments
     * `connection`: The database connection.
     * `name_filter`: Optional substring filter, matched case-sensitively.
     *
     * # Returns
     * A Result containing the list of cities or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_city_list(&self, connection: &mut PgConnection, name_filter: Option<String>) -> Result<Vec<CityDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryCityDbResp> = sqlx::query_as(QUERY_CITY_LIST)
            .bind(name_filter)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get city list: {err}")))?;
        Ok(results.into_iter().map(|(id, name, weather)| CityDetailType::new(id, name, weather)).collect())
    }

    /**
     * Adds a new user to the database.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `user_add_input`: The input containing the user's details.
     *
     * # Returns
     * A Result containing the created user or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_user(&self, transaction: &mut PgConnection, user_add_input: UserAddInputType) -> Result<UserDetailType, ApplicationError> {
        let span = tracing::Span::current();
        let (id, name, surname, age): QueryUserDbResp = sqlx::query_as(ADD_USER)
            .bind(user_add_input.name)
            .bind(user_add_input.surname)
            .bind(user_add_input.age)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        Ok(UserDetailType::new(id, name, surname, age))
    }

    /**
     * Retrieves users in the requested ordering.
     *
     * # Arguments
     * `connection`: The database connection.
     * `sort_order`: The requested ordering.
     *
     * # Returns
     * A Result containing the list of users or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_user_list(&self, connection: &mut PgConnection, sort_order: UserSortOrder) -> Result<Vec<UserDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let query = match sort_order {
            UserSortOrder::AgeAscending => QUERY_USER_LIST_AGE_ASC,
            UserSortOrder::AgeDescending => QUERY_USER_LIST_AGE_DESC,
            UserSortOrder::Unsorted => QUERY_USER_LIST,
        };
        let results: Vec<QueryUserDbResp> = sqlx::query_as(query)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get user list: {err}")))?;
        Ok(results.into_iter().map(|(id, name, surname, age)| UserDetailType::new(id, name, surname, age)).collect())
    }

    /**
     * Retrieves a user by id.
     *
     * # Arguments
     * `connection`: The database connection.
     * `user_id`: The id of the user.
     *
     * # Returns
     * A Result containing the user if one exists, or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_user_by_id(&self, connection: &mut PgConnection, user_id: i64) -> Result<Option<UserDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryUserDbResp> = sqlx::query_as(QUERY_USER_BY_ID)
            .bind(user_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to find user by id: {err}")))?;
        Ok(result.map(|(id, name, surname, age)| UserDetailType::new(id, name, surname, age)))
    }

    /**
     * Adds a new picnic to the database.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `picnic_add_input`: The input containing city id and time.
     *
     * # Returns
     * A Result containing the id of the created picnic or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_picnic(&self, transaction: &mut PgConnection, picnic_add_input: PicnicAddInputType) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let (id,): (i64,) = sqlx::query_as(ADD_PICNIC)
            .bind(picnic_add_input.city_id)
            .bind(picnic_add_input.time)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        Ok(id)
    }

    /**
     * Retrieves picnics with their resolved city names, honoring the
     * provided filter.
     *
     * # Arguments
     * `connection`: The database connection.
     * `filter_params`: The time and past-inclusion filter.
     *
     * # Returns
     * A Result containing tuples of picnic id, city name and time, or an
     * `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_picnic_list(&self, connection: &mut PgConnection, filter_params: &PicnicsListInputType) -> Result<Vec<QueryPicnicDbResp>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryPicnicDbResp> = sqlx::query_as(QUERY_PICNIC_LIST)
            .bind(filter_params.time)
            .bind(filter_params.include_past)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get picnic list: {err}")))?;
        Ok(results)
    }

    /**
     * Retrieves one picnic with its resolved city name.
     *
     * # Arguments
     * `connection`: The database connection.
     * `picnic_id`: The id of the picnic.
     *
     * # Returns
     * A Result containing the picnic row if one exists, or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn find_picnic_by_id(&self, connection: &mut PgConnection, picnic_id: i64) -> Result<Option<QueryPicnicDbResp>, ApplicationError> {
        let span = tracing::Span::current();
        let result: Option<QueryPicnicDbResp> = sqlx::query_as(QUERY_PICNIC_BY_ID)
            .bind(picnic_id)
            .fetch_optional(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to find picnic by id: {err}")))?;
        Ok(result)
    }

    /**
     * Retrieves the users registered for a picnic.
     *
     * # Arguments
     * `connection`: The database connection.
     * `picnic_id`: The id of the picnic.
     *
     * # Returns
     * A Result containing the registered users or an `ApplicationError`.
     */
    #[instrument(skip(self, connection), fields(result))]
    pub async fn get_picnic_users(&self, connection: &mut PgConnection, picnic_id: i64) -> Result<Vec<UserDetailType>, ApplicationError> {
        let span = tracing::Span::current();
        let results: Vec<QueryUserDbResp> = sqlx::query_as(QUERY_PICNIC_USERS)
            .bind(picnic_id)
            .fetch_all(connection)
            .instrument(span)
            .await
            .map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to execute query to get picnic users: {err}")))?;
        Ok(results.into_iter().map(|(id, name, surname, age)| UserDetailType::new(id, name, surname, age)).collect())
    }

    /**
     * Adds a new picnic registration to the database. Duplicate
     * registrations for the same user and picnic are allowed.
     *
     * # Arguments
     * `transaction`: The database transaction to execute the query within.
     * `registration_add_input`: The input containing user and picnic ids.
     *
     * # Returns
     * A Result containing the id of the created registration or an `ApplicationError`.
     */
    #[instrument(skip(self, transaction), fields(result))]
    pub async fn add_registration(&self, transaction: &mut PgConnection, registration_add_input: RegistrationAddInputType) -> Result<i64, ApplicationError> {
        let span = tracing::Span::current();
        let (id,): (i64,) = sqlx::query_as(ADD_REGISTRATION)
            .bind(registration_add_input.user_id)
            .bind(registration_add_input.picnic_id)
            .fetch_one(transaction)
            .instrument(span)
            .await
            .map_err(|err| Self::handle_database_error(err.as_database_error()))?;
        Ok(id)
    }

    /**
     * Handles database errors and maps them to application errors.
     *
     * # Arguments
     * `error`: The database error to handle.
     *
     * # Returns
     * An `ApplicationError` corresponding to the database error.
     */
    fn handle_database_error(error: Option<&dyn sqlx::error::DatabaseError>) -> ApplicationError {
        if let Some(db_error) = error {
            tracing::debug!("Database error: {}", db_error);
            if db_error.code() == Some(Cow::Borrowed("23503")) {
                // Foreign key violation
                return ApplicationError::new(ErrorType::ReferentialGap, "Missing parent row".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("23505")) {
                // Unique violation
                return ApplicationError::new(ErrorType::Validation, "Already exists".to_string());
            } else if db_error.code() == Some(Cow::Borrowed("22001")) {
                // Value too long
                return ApplicationError::new(ErrorType::Validation, "Value too long".to_string());
            }
            tracing::error!("Unhandled database error: {}", db_error);
            return ApplicationError::new(ErrorType::DatabaseError, "Unhandled database error".to_string());
        }
        ApplicationError::new(ErrorType::DatabaseError, "Failed to execute database operation".to_string())
    }
}

#[cfg(feature = "integration-test")]
#[cfg(test)]
mod integration_test {
    use super::*;
    use chrono::TimeZone;
    use sqlx::PgPool;

    #[sqlx::test]
    async fn test_add_then_find_city_by_name() {
        let pool = init_db().await;
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let created = picnic_dao.add_city(&mut transaction, CityAddInputType::new("paris")).await.unwrap();
        assert_eq!(created.name, "Paris");
        assert!(created.weather.is_none());
        let found = picnic_dao.find_city_by_name(&mut transaction, "Paris").await.unwrap();
        assert_eq!(found.unwrap().id, created.id);
        transaction.rollback().await.unwrap(); // Rollback the transaction to avoid leaving test data in the database
    }

    #[sqlx::test]
    async fn test_city_list_substring_filter() {
        let pool = init_db().await;
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        picnic_dao.add_city(&mut transaction, CityAddInputType::new("oslo")).await.unwrap();
        picnic_dao.add_city(&mut transaction, CityAddInputType::new("bergen")).await.unwrap();
        let all = picnic_dao.get_city_list(&mut transaction, None).await.unwrap();
        assert_eq!(all.len(), 2);
        let filtered = picnic_dao.get_city_list(&mut transaction, Some("slo".to_string())).await.unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].name, "Oslo");
        let none = picnic_dao.get_city_list(&mut transaction, Some("OSLO".to_string())).await.unwrap();
        assert!(none.is_empty());
        transaction.rollback().await.unwrap();
    }

    #[sqlx::test]
    async fn test_user_list_orderings() {
        let pool = init_db().await;
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        picnic_dao.add_user(&mut transaction, UserAddInputType::new("A".to_string(), "B".to_string(), 30)).await.unwrap();
        picnic_dao.add_user(&mut transaction, UserAddInputType::new("C".to_string(), "D".to_string(), 20)).await.unwrap();
        let asc = picnic_dao.get_user_list(&mut transaction, UserSortOrder::AgeAscending).await.unwrap();
        assert_eq!(asc[0].age, 20);
        let desc = picnic_dao.get_user_list(&mut transaction, UserSortOrder::AgeDescending).await.unwrap();
        assert_eq!(desc[0].age, 30);
        let unsorted = picnic_dao.get_user_list(&mut transaction, UserSortOrder::Unsorted).await.unwrap();
        assert_eq!(unsorted[0].name, "A");
        transaction.rollback().await.unwrap();
    }

    #[sqlx::test]
    async fn test_picnic_add_list_and_register() {
        let pool = init_db().await;
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let city = picnic_dao.add_city(&mut transaction, CityAddInputType::new("oslo")).await.unwrap();
        let user = picnic_dao.add_user(&mut transaction, UserAddInputType::new("A".to_string(), "B".to_string(), 30)).await.unwrap();
        let time = chrono::Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let picnic_id = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType::new(city.id, time)).await.unwrap();
        picnic_dao.add_registration(&mut transaction, RegistrationAddInputType::new(picnic_id, user.id)).await.unwrap();
        let picnics = picnic_dao.get_picnic_list(&mut transaction, &PicnicsListInputType::new(None, true)).await.unwrap();
        assert_eq!(picnics.len(), 1);
        assert_eq!(picnics[0].1, "Oslo");
        let users = picnic_dao.get_picnic_users(&mut transaction, picnic_id).await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, user.id);
        transaction.rollback().await.unwrap();
    }

    #[sqlx::test]
    async fn test_picnic_list_excludes_past() {
        let pool = init_db().await;
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let city = picnic_dao.add_city(&mut transaction, CityAddInputType::new("oslo")).await.unwrap();
        let past = chrono::Utc.with_ymd_and_hms(2000, 6, 1, 12, 0, 0).unwrap();
        let future = chrono::Utc.with_ymd_and_hms(2100, 6, 1, 12, 0, 0).unwrap();
        picnic_dao.add_picnic(&mut transaction, PicnicAddInputType::new(city.id, past)).await.unwrap();
        picnic_dao.add_picnic(&mut transaction, PicnicAddInputType::new(city.id, future)).await.unwrap();
        let all = picnic_dao.get_picnic_list(&mut transaction, &PicnicsListInputType::new(None, true)).await.unwrap();
        assert_eq!(all.len(), 2);
        let upcoming = picnic_dao.get_picnic_list(&mut transaction, &PicnicsListInputType::new(None, false)).await.unwrap();
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].2, future);
        transaction.rollback().await.unwrap();
    }

    #[sqlx::test]
    async fn test_picnic_list_exact_time_filter() {
        let pool = init_db().await;
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let city = picnic_dao.add_city(&mut transaction, CityAddInputType::new("oslo")).await.unwrap();
        let noon = chrono::Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let evening = chrono::Utc.with_ymd_and_hms(2030, 6, 1, 18, 0, 0).unwrap();
        let noon_id = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType::new(city.id, noon)).await.unwrap();
        picnic_dao.add_picnic(&mut transaction, PicnicAddInputType::new(city.id, evening)).await.unwrap();
        let matching = picnic_dao.get_picnic_list(&mut transaction, &PicnicsListInputType::new(Some(noon), true)).await.unwrap();
        assert_eq!(matching.len(), 1);
        assert_eq!(matching[0].0, noon_id);
        assert_eq!(matching[0].2, noon);
        let unmatched = chrono::Utc.with_ymd_and_hms(2030, 6, 2, 12, 0, 0).unwrap();
        let none = picnic_dao.get_picnic_list(&mut transaction, &PicnicsListInputType::new(Some(unmatched), true)).await.unwrap();
        assert!(none.is_empty());
        transaction.rollback().await.unwrap();
    }

    #[sqlx::test]
    async fn test_add_picnic_unknown_city_is_referential_gap() {
        let pool = init_db().await;
        let picnic_dao = PicnicDao::new();
        let mut transaction = pool.begin().await.unwrap();
        let time = chrono::Utc.with_ymd_and_hms(2030, 6, 1, 12, 0, 0).unwrap();
        let result = picnic_dao.add_picnic(&mut transaction, PicnicAddInputType::new(99999, time)).await;
        assert_eq!(result.unwrap_err().error_type, ErrorType::ReferentialGap);
        transaction.rollback().await.unwrap();
    }

    /**
     * Initialize the database connection pool.
     */
    async fn init_db() -> PgPool {
        dotenv::from_filename("./sqlx-postgresql-migration/.env-test").ok();
        let pool = PgPool::connect(dotenv::var("DATABASE_URL").unwrap().as_str()).await.unwrap();
        sqlx::migrate!("./sqlx-postgresql-migration/migrations").run(&pool).await.unwrap();
        pool
    }
}
