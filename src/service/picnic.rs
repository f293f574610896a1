use sqlx::{Pool, Postgres};

use crate::{
    dao::picnic::PicnicDao,
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{
            CityAddInputType, CityDetailType, PicnicAddInputType, PicnicDetailType, PicnicsListInputType, RegistrationAddInputType, RegistrationDetailType, UserAddInputType, UserDetailType,
            UserSortOrder,
        },
    },
};

/**
 * Represents the service for managing cities, users, picnics and
 * registrations.
 */
pub struct PicnicService {
    /**
     * The DAO for picnic operations.
     */
    picnic_dao: PicnicDao,
    /**
     * Connection pool for database operations.
     */
    connection_pool: Pool<Postgres>,
}

impl PicnicService {
    /**
     * Creates a new instance of `PicnicService`.
     *
     * # Arguments
     * `picnic_dao`: The DAO for picnic operations.
     * `connection_pool`: Connection pool for database operations.
     *
     * # Returns
     * A new instance of `PicnicService`.
     */
    pub fn new(picnic_dao: PicnicDao, connection_pool: Pool<Postgres>) -> Self {
        PicnicService { picnic_dao, connection_pool }
    }

    /**
     * Creates a city, or returns the existing row when one already
     * matches the normalized name. The caller is expected to have
     * verified the name against the geocoding service.
     *
     * # Arguments
     * `city_add_input`: The input containing the normalized city name.
     *
     * # Returns
     * A Result containing the city or an `ApplicationError`.
     */
    pub async fn create_city(&self, city_add_input: CityAddInputType) -> Result<CityDetailType, ApplicationError> {
        let mut transaction = self.connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = async {
            if let Some(existing) = self.picnic_dao.find_city_by_name(&mut transaction, &city_add_input.name).await? {
                return Ok(existing);
            }
            self.picnic_dao.add_city(&mut transaction, city_add_input).await
        }
        .await;
        match result {
            Ok(city) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(city)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    /**
     * Retrieves cities, optionally filtered to names containing the given
     * substring.
     *
     * # Arguments
     * `name_filter`: Optional case-sensitive substring filter.
     *
     * # Returns
     * A Result containing the list of cities or an `ApplicationError`.
     */
    pub async fn get_city_list(&self, name_filter: Option<String>) -> Result<Vec<CityDetailType>, ApplicationError> {
        let mut connection = self.connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.picnic_dao.get_city_list(&mut connection, name_filter).await
    }

    /**
     * Registers a new user.
     *
     * # Arguments
     * `user_add_input`: The validated input containing the user's details.
     *
     * # Returns
     * A Result containing the created user or an `ApplicationError`.
     */
    pub async fn register_user(&self, user_add_input: UserAddInputType) -> Result<UserDetailType, ApplicationError> {
        let mut transaction = self.connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        match self.picnic_dao.add_user(&mut transaction, user_add_input).await {
            Ok(user) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(user)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    /**
     * Retrieves users in the requested ordering.
     *
     * # Arguments
     * `sort_order`: The requested ordering.
     *
     * # Returns
     * A Result containing the list of users or an `ApplicationError`.
     */
    pub async fn get_user_list(&self, sort_order: UserSortOrder) -> Result<Vec<UserDetailType>, ApplicationError> {
        let mut connection = self.connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        self.picnic_dao.get_user_list(&mut connection, sort_order).await
    }

    /**
     * Retrieves picnics honoring the provided filter, each with its
     * resolved city name and registered users.
     *
     * # Arguments
     * `filter_params`: The time and past-inclusion filter.
     *
     * # Returns
     * A Result containing the list of picnics or an `ApplicationError`.
     */
    pub async fn get_picnic_list(&self, filter_params: PicnicsListInputType) -> Result<Vec<PicnicDetailType>, ApplicationError> {
        let mut connection = self.connection_pool.acquire().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to acquire connection: {err}")))?;
        let rows = self.picnic_dao.get_picnic_list(&mut connection, &filter_params).await?;
        let mut picnics = Vec::with_capacity(rows.len());
        for (id, city_name, time) in rows {
            let users = self.picnic_dao.get_picnic_users(&mut connection, id).await?;
            picnics.push(PicnicDetailType::new(id, city_name, time, users));
        }
        Ok(picnics)
    }

    /**
     * Creates a picnic after verifying that the referenced city exists.
     *
     * # Arguments
     * `picnic_add_input`: The input containing city id and time.
     *
     * # Returns
     * A Result containing the created picnic (without users) or an
     * `ApplicationError` of type `ReferentialGap` when the city is
     * unknown.
     */
    pub async fn add_picnic(&self, picnic_add_input: PicnicAddInputType) -> Result<PicnicDetailType, ApplicationError> {
        let mut transaction = self.connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = async {
            if !self.picnic_dao.city_exists(&mut transaction, picnic_add_input.city_id).await? {
                return Err(ApplicationError::new(ErrorType::ReferentialGap, format!("City with id {} does not exist", picnic_add_input.city_id)));
            }
            let picnic_id = self.picnic_dao.add_picnic(&mut transaction, picnic_add_input).await?;
            self.picnic_dao
                .find_picnic_by_id(&mut transaction, picnic_id)
                .await?
                .ok_or_else(|| ApplicationError::new(ErrorType::Application, format!("Picnic with id {picnic_id} missing after insert")))
        }
        .await;
        match result {
            Ok((id, city_name, time)) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(PicnicDetailType::new(id, city_name, time, vec![]))
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }

    /**
     * Registers a user for a picnic after verifying that both exist.
     * Duplicate registrations for the same pair are allowed.
     *
     * # Arguments
     * `registration_add_input`: The input containing picnic and user ids.
     *
     * # Returns
     * A Result containing the registration with resolved city, time and
     * user name, or an `ApplicationError` of type `ReferentialGap` when
     * either reference is unknown.
     */
    pub async fn register_for_picnic(&self, registration_add_input: RegistrationAddInputType) -> Result<RegistrationDetailType, ApplicationError> {
        let mut transaction = self.connection_pool.begin().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to begin transaction: {err}")))?;
        let result = async {
            let Some((_, city_name, time)) = self.picnic_dao.find_picnic_by_id(&mut transaction, registration_add_input.picnic_id).await? else {
                return Err(ApplicationError::new(ErrorType::ReferentialGap, format!("Picnic with id {} does not exist", registration_add_input.picnic_id)));
            };
            let Some(user) = self.picnic_dao.find_user_by_id(&mut transaction, registration_add_input.user_id).await? else {
                return Err(ApplicationError::new(ErrorType::ReferentialGap, format!("User with id {} does not exist", registration_add_input.user_id)));
            };
            let registration_id = self.picnic_dao.add_registration(&mut transaction, registration_add_input).await?;
            Ok(RegistrationDetailType::new(registration_id, city_name, time, user.id, user.name))
        }
        .await;
        match result {
            Ok(registration) => {
                transaction.commit().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to commit transaction: {err}")))?;
                Ok(registration)
            }
            Err(err) => {
                transaction.rollback().await.map_err(|err| ApplicationError::new(ErrorType::DatabaseError, format!("Failed to rollback transaction: {err}")))?;
                Err(err)
            }
        }
    }
}
