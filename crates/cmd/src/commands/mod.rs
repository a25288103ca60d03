pub mod show;
pub mod structure;
pub mod validate;

pub use show::show_command;
pub use structure::structure_command;
pub use validate::validate_command;
