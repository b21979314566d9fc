pub mod gamepad;
pub mod input;
pub mod prompt;
pub mod renderer;
pub mod shell;
pub mod sound;
