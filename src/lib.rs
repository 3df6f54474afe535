pub mod command;
pub mod config;
pub mod dispatcher;
pub mod documents;
pub mod error;
pub mod kubectl;
pub mod kustomization_types;
pub mod kustomize;
pub mod ownership;
pub mod patch_pipeline;
pub mod rotation;
pub mod session;
pub mod status;
pub mod tracking;
pub mod watch;


pub use error::Error;
