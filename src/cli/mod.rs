mod root;
mod run;
mod sessions;
mod shell;

pub use root::Cli;
pub use shell::Shell;
