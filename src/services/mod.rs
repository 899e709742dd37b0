pub mod bayes;
pub mod catalog;
pub mod genres;
pub mod recommendations;
pub mod similarity;
pub mod store;
