use std::fmt;

/**
 * Represents the type of error that can occur within the application.
 */
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorType {
    /**
     * A required request parameter was not supplied.
     */
    MissingParameter,
    /**
     * A request parameter was supplied but its value is not acceptable.
     */
    InvalidParameter,
    /**
     * Input failed schema or range validation.
     */
    Validation,
    /**
     * A referenced entity does not exist.
     */
    ReferentialGap,
    /**
     * The external geocoding service could not be reached or answered
     * with an unusable response.
     */
    GeocodingUnavailable,
    /**
     * Database operation failed.
     */
    DatabaseError,
    /**
     * Application failed during startup.
     */
    Initialization,
    /**
     * Internal application failure.
     */
    Application,
}

/**
 * Represents an error that occurs within the application.
 */
#[derive(Debug, Clone)]
pub struct ApplicationError {
    /**
     * Error type.
     */
    pub error_type: ErrorType,
    /**
     * Error message describing problem.
     */
    pub message: String,
}

impl ApplicationError {
    /**
     * Creates a new ApplicationError.
     *
     * #Arguments
     * `error_type`: The type of error.
     * `message`: A description of the error.
     */
    pub fn new(error_type: ErrorType, message: String) -> Self {
        ApplicationError { error_type, message }
    }
}

impl fmt::Display for ApplicationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}
