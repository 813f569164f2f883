//! chuckbox - packages a Python project and its requirements into a
//! deployable tarball.

use std::process;

#[tokio::main]
async fn main() {
    let exit_code = match chuckbox::cli::run().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            1
        }
    };

    process::exit(exit_code);
}
