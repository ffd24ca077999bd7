use std::process;

/// Exits the program with an error message
pub fn exit_with_error(message: &str) -> ! {
    eprintln!("Error: {}", message);
    process::exit(1);
}

/// Exits the program with an error message and usage information
pub fn exit_with_usage_error(message: &str, usage: &str) -> ! {
    eprintln!("Error: {}", message);
    eprintln!();
    eprintln!("{}", usage);
    process::exit(1);
}

/// Exits with usage information if any positional arguments were given
pub fn reject_free_arguments(free: &[String], usage: &str) {
    if !free.is_empty() {
        exit_with_usage_error(&format!("Unexpected arguments: {:?}", free), usage);
    }
}

/// Whether the positional arguments ask for help
pub fn wants_help(free: &[String]) -> bool {
    matches!(free.first().map(String::as_str), Some("help"))
}
