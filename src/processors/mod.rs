//! Document translation processors

pub mod selection;
