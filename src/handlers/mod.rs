// src/handlers/mod.rs

pub mod archive;
pub mod directory;
pub mod general;
pub mod invoice;
pub mod ledger;
pub mod notification;
pub mod salary;
