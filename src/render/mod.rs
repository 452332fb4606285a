//! File-producing renderers: a turnaround histogram (PNG) and a route map (HTML).

pub mod artifact;
pub mod font;
pub mod histogram;
pub mod route_map;
pub mod tier;
