pub mod commands;
pub mod doctor;
pub mod envmap;
pub mod paths;
pub mod permanent;
pub mod prompt;
pub mod registry;
pub mod resolve;
pub mod shell;
pub mod store;
pub mod ui;

#[cfg(test)]
pub mod test_utils;
