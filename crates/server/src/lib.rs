pub mod bootstrap;
pub mod health;
pub mod routes;
pub mod sink;
pub mod sweeper;
