use std::process;

fn main() {
    if let Err(e) = baton::cli::run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
