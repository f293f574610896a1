use crate::service::{geocoding::GeocodingService, picnic::PicnicService};

/**
* Represents the application state shared across the Actix web application.
*/
pub struct AppState {
    /**
     * The geocoding service used to verify city names before creation.
     */
    pub geocoding_service: GeocodingService,
    /**
     * The picnic service for handling city, user, picnic and registration
     * operations.
     */
    pub picnic_service: PicnicService,
}

impl AppState {
    /**
     * Creates a new instance of `AppState`.
     *
     * # Arguments
     * `geocoding_service`: The geocoding service used to verify city names.
     * `picnic_service`: The picnic service for handling entity operations.
     */
    pub fn new(geocoding_service: GeocodingService, picnic_service: PicnicService) -> Self {
        AppState { geocoding_service, picnic_service }
    }
}
