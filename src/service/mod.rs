pub mod geocoding;
pub mod picnic;
