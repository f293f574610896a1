use actix_web::{HttpRequest, HttpResponse, get, post, web};
use tracing::{Instrument, instrument};

use crate::{
    api::{
        rest::{CityListQuery, CityResponse, CreateCityQuery, PicnicAddQuery, PicnicAddResponse, PicnicListQuery, PicnicRegisterQuery, PicnicRegisterResponse, PicnicResponse, RegisterUserRequest, UserListQuery, UserResponse},
        state::AppState,
    },
    model::{
        apperror::{ApplicationError, ErrorType},
        models::{CityAddInputType, PicnicAddInputType, PicnicsListInputType, RegistrationAddInputType, UserAddInputType, UserSortOrder},
    },
};

/**
 * Endpoint to create a city by its name. The name is verified against the
 * external geocoding service, normalized, and deduplicated: when a city
 * with the normalized name already exists, that row is returned.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "createCity", trace_id = get_trace_id(&http_request), result))]
#[get("/create-city/")]
pub async fn create_city(http_request: HttpRequest, query: web::Query<CreateCityQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let Some(city_name) = &query.city else {
        return Err(ApplicationError::new(ErrorType::MissingParameter, "Parameter city must be specified".to_string()));
    };
    if !app_state.geocoding_service.city_exists(city_name).instrument(span.clone()).await? {
        return Err(ApplicationError::new(ErrorType::InvalidParameter, "Parameter city must be an existing city".to_string()));
    }
    let city_add_input = CityAddInputType::new(city_name);
    let city = app_state.picnic_service.create_city(city_add_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(CityResponse::from(city)))
}

/**
 * Endpoint to retrieve the list of cities, optionally filtered to names
 * containing the q parameter as a case-sensitive substring.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "getCities", trace_id = get_trace_id(&http_request), result))]
#[get("/get-cities/")]
pub async fn get_cities(http_request: HttpRequest, query: web::Query<CityListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let cities = app_state.picnic_service.get_city_list(query.into_inner().q).instrument(span).await?;
    Ok(HttpResponse::Ok().json(cities.into_iter().map(CityResponse::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to retrieve the list of users, ordered by age when the sort
 * parameter is asc or desc and in insertion order otherwise.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "usersList", trace_id = get_trace_id(&http_request), result))]
#[post("/users-list/")]
pub async fn users_list(http_request: HttpRequest, query: web::Query<UserListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let sort_order = UserSortOrder::parse(query.sort.as_deref())?;
    let users = app_state.picnic_service.get_user_list(sort_order).instrument(span).await?;
    Ok(HttpResponse::Ok().json(users.into_iter().map(UserResponse::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to register a new user.
 */
#[instrument(level = "info", skip(http_request, app_state, request_body), fields(service = "registerUser", trace_id = get_trace_id(&http_request), result))]
#[post("/register-user/")]
pub async fn register_user(http_request: HttpRequest, request_body: web::Json<RegisterUserRequest>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let request_body = request_body.into_inner();
    let user_add_input = UserAddInputType::new(request_body.name, request_body.surname, request_body.age).validate()?;
    let user = app_state.picnic_service.register_user(user_add_input).instrument(span).await?;
    Ok(HttpResponse::Ok().json(UserResponse::from(user)))
}

/**
 * Endpoint to retrieve all picnics, optionally filtered to an exact time
 * and, when past=false, to picnics not before the current time. Each
 * picnic carries its resolved city name and registered users.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "allPicnics", trace_id = get_trace_id(&http_request), result))]
#[get("/all-picnics/")]
pub async fn all_picnics(http_request: HttpRequest, query: web::Query<PicnicListQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let filter_params = PicnicsListInputType::new(query.datetime, query.past);
    let picnics = app_state.picnic_service.get_picnic_list(filter_params).instrument(span).await?;
    Ok(HttpResponse::Ok().json(picnics.into_iter().map(PicnicResponse::from).collect::<Vec<_>>()))
}

/**
 * Endpoint to add a picnic for a city at a given time. The city must
 * exist.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "picnicAdd", trace_id = get_trace_id(&http_request), result))]
#[get("/picnic-add/")]
pub async fn picnic_add(http_request: HttpRequest, query: web::Query<PicnicAddQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let Some(city_id) = query.city_id else {
        return Err(ApplicationError::new(ErrorType::MissingParameter, "Parameter city_id must be specified".to_string()));
    };
    let Some(time) = query.datetime else {
        return Err(ApplicationError::new(ErrorType::MissingParameter, "Parameter datetime must be specified".to_string()));
    };
    let picnic = app_state.picnic_service.add_picnic(PicnicAddInputType::new(city_id, time)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(PicnicAddResponse::from(picnic)))
}

/**
 * Endpoint to register a user for a picnic. Both must exist; duplicate
 * registrations for the same pair are allowed.
 */
#[instrument(level = "info", skip(http_request, app_state), fields(service = "picnicRegister", trace_id = get_trace_id(&http_request), result))]
#[get("/picnic-register/")]
pub async fn picnic_register(http_request: HttpRequest, query: web::Query<PicnicRegisterQuery>, app_state: web::Data<AppState>) -> Result<HttpResponse, ApplicationError> {
    let span = tracing::Span::current();
    let Some(picnic_id) = query.picnic_id else {
        return Err(ApplicationError::new(ErrorType::MissingParameter, "Parameter picnic_id must be specified".to_string()));
    };
    let Some(user_id) = query.user_id else {
        return Err(ApplicationError::new(ErrorType::MissingParameter, "Parameter user_id must be specified".to_string()));
    };
    let registration = app_state.picnic_service.register_for_picnic(RegistrationAddInputType::new(picnic_id, user_id)).instrument(span).await?;
    Ok(HttpResponse::Ok().json(PicnicRegisterResponse::from(registration)))
}

/**
 * Retrieves the trace ID from the HTTP request headers.
 * If the trace ID is not present, a new UUID is generated.
 */
fn get_trace_id(http_request: &HttpRequest) -> String {
    http_request.headers().get("X-Trace-ID")
        .and_then(|v| v.to_str().ok().map(std::string::ToString::to_string))
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string())
}

#[cfg(test)]
mod test {
    use actix_web::test::TestRequest;

    use super::*;

    #[actix_web::test]
    async fn test_get_trace_id_exists() {
        let request = TestRequest::default()
            .insert_header(("X-Trace-ID", "test"))
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert_eq!(trace_id, "test");
    }


    #[actix_web::test]
    async fn test_get_trace_id_not_exists() {
        let request = TestRequest::default()
            .to_http_request();
        let trace_id = get_trace_id(&request);
        assert!(!trace_id.is_empty());
    }
}
