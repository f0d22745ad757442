fn main() {
    if let Err(err) = copilot_spaces_bridge::cli::main() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}
