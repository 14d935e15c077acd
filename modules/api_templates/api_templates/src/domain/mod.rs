pub mod admin;
pub mod compiler;
pub mod error;
pub mod parameter_spec;
pub mod repo;
pub mod resolver;
pub mod service;
pub mod template_store;

#[cfg(test)]
mod service_test;
