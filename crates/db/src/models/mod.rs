pub mod growing_unit;
pub mod location;
pub mod plant;
pub mod plant_species;
pub mod values;
pub mod views;
