pub mod config;
pub mod context;
pub mod events;
pub mod growing_units;
pub mod locations;
pub mod overview;
pub mod plant_species;
pub mod plants;
pub mod projector;
pub mod query;

#[cfg(test)]
pub(crate) mod test_support;
