use stash::core::error::StashError;

fn main() {
    match stash::run() {
        Ok(()) => {}
        // Reader went away (e.g. `stash list | head`); nothing left to report.
        Err(StashError::IoError(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {}
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
