pub mod picnic;
