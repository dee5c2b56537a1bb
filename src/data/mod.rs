pub mod annotations;
pub mod buffer;
pub mod catalog;
pub mod clock;
pub mod discontinuity;
pub mod page;
pub mod page_specs;
pub mod render;
pub mod status;
pub mod trace_look;
