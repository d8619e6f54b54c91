//! Terminal front end: the app state machine, its forms and screens, and the
//! crossterm event loop that drives them.

mod app;
mod forms;
mod helpers;
mod screens;
mod terminal;

pub use app::App;
pub use terminal::run_app;
