pub mod profiles;
pub mod subjects;
