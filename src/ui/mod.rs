/// Terminal front end: prompting for selections and rendering reports.
pub mod prompt;
pub mod render;
