//! `reel probe`: report media contents without playback.

use clap::ArgMatches;

use reel_lib::{probe, DirectoryProvider, Result};

use super::args::media_dir;

pub fn run_probe(args: &ArgMatches) -> Result<i32> {
    let media = args.get_one::<String>("MEDIA").map(String::as_str).unwrap_or_default();
    let provider = DirectoryProvider::new(media_dir(args));
    let info = probe(&provider, media)?;
    println!("{}", info);
    Ok(0)
}
