//! Event hook integrations that the server wires into the engine at startup.
pub mod activity_log;
