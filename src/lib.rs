#![allow(clippy::new_without_default)]

#[macro_use]
extern crate log;
#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate lazy_static;

pub mod emissions;
pub mod gps_processor;
pub mod logs;
pub mod permission;
pub mod road_snapper;
pub mod route_geometry;
pub mod routing;
pub mod sample_source;
pub mod speed;
pub mod trip;
pub mod trip_db;
pub mod trip_recorder;
pub mod utils;
