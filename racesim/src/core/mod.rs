pub mod agent;
pub mod errors;
pub mod event_injector;
pub mod handle_race;
pub mod race;
pub mod state_handler;
pub mod timer_queue;
pub mod tireset;
pub mod track;
