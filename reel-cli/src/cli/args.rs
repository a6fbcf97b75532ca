//! CLI argument definitions for `reel`.

use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::fs;
use std::path::PathBuf;

use reel_lib::{PlaybackSettings, ReelError, Result};

fn dir_arg() -> Arg {
    Arg::new("dir")
        .long("dir")
        .short('d')
        .value_name("DIR")
        .value_parser(value_parser!(PathBuf))
        .default_value(".")
        .help("Directory holding <MEDIA>.wav, <MEDIA>.rvf and <MEDIA>.sub")
}

fn media_arg() -> Arg {
    Arg::new("MEDIA")
        .help("Media name, without extension")
        .required(true)
        .index(1)
}

/// Build the CLI argument parser and command definitions.
pub fn build_cli() -> Command {
    Command::new("reel")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Play reel cutscenes in the terminal")
        .arg_required_else_help(true)
        .subcommand_required(true)
        .subcommand(
            Command::new("play")
                .about("Play a cutscene")
                .arg(media_arg())
                .arg(dir_arg())
                .arg(
                    Arg::new("smoothing")
                        .long("smoothing")
                        .value_name("SAMPLES")
                        .value_parser(value_parser!(usize))
                        .help("Moving-average window applied to the soundtrack"),
                )
                .arg(
                    Arg::new("volume")
                        .long("volume")
                        .short('v')
                        .value_name("VOLUME")
                        .value_parser(value_parser!(f32))
                        .help("Output volume (0.0-1.0)"),
                )
                .arg(
                    Arg::new("settings")
                        .long("settings")
                        .short('s')
                        .value_name("PATH")
                        .value_parser(value_parser!(PathBuf))
                        .help("Path to a PlaybackSettings JSON file"),
                )
                .arg(
                    Arg::new("mute")
                        .long("mute")
                        .short('m')
                        .action(ArgAction::SetTrue)
                        .help("Keep audio timing but send no sound to the device"),
                )
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("Play without the TUI and print a summary at the end"),
                ),
        )
        .subcommand(
            Command::new("probe")
                .about("Print what a cutscene contains without playing it")
                .arg(media_arg())
                .arg(dir_arg()),
        )
        .subcommand(
            Command::new("create")
                .about("Emit default payloads and sample media")
                .subcommand_required(true)
                .subcommand(
                    Command::new("settings-json")
                        .about("Print the default PlaybackSettings JSON payload"),
                )
                .subcommand(
                    Command::new("sample")
                        .about("Write a test cutscene: tone, gradient clip and subtitles")
                        .arg(media_arg())
                        .arg(dir_arg())
                        .arg(
                            Arg::new("seconds")
                                .long("seconds")
                                .value_name("SECONDS")
                                .value_parser(value_parser!(f64))
                                .default_value("5.0")
                                .help("Soundtrack length"),
                        )
                        .arg(
                            Arg::new("frames")
                                .long("frames")
                                .value_name("COUNT")
                                .value_parser(value_parser!(u32))
                                .default_value("40")
                                .help("Number of video frames"),
                        )
                        .arg(
                            Arg::new("fps")
                                .long("fps")
                                .value_name("FPS")
                                .value_parser(value_parser!(f64))
                                .default_value("10.0")
                                .help("Video frame rate"),
                        ),
                ),
        )
}

/// Media directory for subcommands that take `--dir`.
pub fn media_dir(args: &ArgMatches) -> PathBuf {
    args.get_one::<PathBuf>("dir")
        .cloned()
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Settings for `play`: the JSON file (if any), then flag overrides.
pub fn playback_settings(args: &ArgMatches) -> Result<PlaybackSettings> {
    let mut settings = match args.get_one::<PathBuf>("settings") {
        Some(path) => {
            let json = fs::read_to_string(path).map_err(|err| {
                ReelError::Settings(format!("cannot read {}: {}", path.display(), err))
            })?;
            PlaybackSettings::from_json(&json)?
        }
        None => PlaybackSettings::default(),
    };

    if let Some(window) = args.get_one::<usize>("smoothing") {
        settings.smoothing_window = *window;
    }
    if let Some(volume) = args.get_one::<f32>("volume") {
        settings.volume = *volume;
    }

    Ok(settings.sanitized())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play_args(argv: &[&str]) -> ArgMatches {
        let matches = build_cli().get_matches_from(argv);
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "play");
        sub.clone()
    }

    #[test]
    fn flags_override_defaults() {
        let args = play_args(&["reel", "play", "intro", "--smoothing", "5", "--volume", "2.0"]);
        let settings = playback_settings(&args).unwrap();
        assert_eq!(settings.smoothing_window, 5);
        assert_eq!(settings.volume, 1.0);
        assert_eq!(media_dir(&args), PathBuf::from("."));
    }

    #[test]
    fn missing_settings_file_is_a_settings_error() {
        let args = play_args(&["reel", "play", "intro", "--settings", "/nonexistent/reel.json"]);
        assert!(matches!(
            playback_settings(&args),
            Err(ReelError::Settings(_))
        ));
    }
}
