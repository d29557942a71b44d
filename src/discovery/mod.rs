//! Work list discovery: path rules, directory scanning, and list parsing

pub mod paths;
pub mod scanner;
pub mod worklist;

pub use worklist::build;
