pub mod footer;
pub mod help_overlay;
pub mod preview;
pub mod stat_tiles;
pub mod table;
pub mod text_input;
