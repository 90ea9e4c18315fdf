/// Game-code generation and validation.
pub mod codes;
/// Assignment engine computing who gives to whom.
pub mod draw;
/// Lifecycle operations on games.
pub mod game_service;
/// Time-driven purge of expired games.
pub mod purge_service;
