pub mod actions;
pub mod controller;
pub mod handlers;
pub mod intake;
pub mod messages;
pub mod registry;
pub mod session;

#[cfg(test)]
pub mod testing;
