pub mod cell;
pub mod decoder;
pub mod frame;
pub mod maze;
pub mod player;
pub mod viewport;
