pub mod controls;
pub mod render_interface;
