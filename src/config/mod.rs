pub mod keybindings;
pub mod loader;
pub mod types;
