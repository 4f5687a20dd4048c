//! Scenario tests driving [`crate::map::TrailMap`] end to end against the
//! in-memory backend and a recording surface.


mod capture_flow;
mod collaborators;
mod measure_flow;
