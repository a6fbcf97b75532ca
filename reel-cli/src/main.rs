//! # Reel
//!
//! A terminal player for reel cutscenes: paced video rendered as half-block
//! cells, the soundtrack on the default output device and subtitles below.

use log::error;

mod cli;
mod controls;
mod logging;
mod runner;
mod ui;

fn main() {
    let log_buffer = logging::init();
    let args = cli::args::build_cli().get_matches();

    let code = match runner::run(&args, log_buffer) {
        Ok(code) => code,
        Err(err) => {
            let message = err.to_string().to_lowercase();
            error!("{}", message);
            eprintln!("error: {}", message);
            -1
        }
    };

    std::process::exit(code)
}
