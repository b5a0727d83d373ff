pub mod api;
pub mod config;
pub mod consts;
pub mod error;
pub mod labels;
pub mod model;
pub mod optimizer;
// cmd and reports are binary modules of main.rs.
