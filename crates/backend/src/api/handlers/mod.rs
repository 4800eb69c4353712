// Aggregate handlers
pub mod shops;

// UseCase handlers
pub mod usecases;
