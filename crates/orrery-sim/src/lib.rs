pub mod elements;
pub mod lunar;
pub mod planets;
pub mod system;
pub mod time_controller;

pub use elements::{MeanElements, OrbitalElements};
pub use lunar::{lunar_position, LunarPosition};
pub use planets::{Body, UnknownBody};
pub use system::{epoch_to_jc, jc_to_epoch, BodyState, SolarSystem, SystemSnapshot};
pub use time_controller::{rates, time_bucket, TimeController};
