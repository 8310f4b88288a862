use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;
use std::process;

use tracing::info;

use mix_kit::volume::sw_volume_from_linear;
use mix_kit::{ChannelVolumes, MemChunk, MixInfo, SampleFormat, SampleSpec, init_tracing, mix};

const USAGE: &str = "Usage: mixctl --format <fmt> --channels <n> [--rate <hz>] [--master <gain>] \
[--mute] --output <path> <input>[:<gain>]...

Mixes raw interleaved PCM files of a single format. Gains are linear amplitudes.";

struct Input {
    path: PathBuf,
    gain: f64,
}

struct Options {
    format: SampleFormat,
    channels: usize,
    rate: u32,
    master: f64,
    mute: bool,
    output: PathBuf,
    inputs: Vec<Input>,
}

fn parse_input(arg: &str) -> Input {
    if let Some((path, gain)) = arg.rsplit_once(':') {
        if let Ok(gain) = gain.parse::<f64>() {
            return Input {
                path: PathBuf::from(path),
                gain,
            };
        }
    }
    Input {
        path: PathBuf::from(arg),
        gain: 1.0,
    }
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Option<Options>, Box<dyn Error>> {
    let mut format = None;
    let mut channels = None;
    let mut rate = 44_100;
    let mut master = 1.0;
    let mut mute = false;
    let mut output = None;
    let mut inputs = Vec::new();

    while let Some(arg) = args.next() {
        let mut value = |name: &str| {
            args.next()
                .ok_or_else(|| format!("missing value for {name}"))
        };
        match arg.as_str() {
            "--help" | "-h" => return Ok(None),
            "--format" | "-f" => format = Some(value("--format")?.parse::<SampleFormat>()?),
            "--channels" | "-c" => channels = Some(value("--channels")?.parse::<usize>()?),
            "--rate" | "-r" => rate = value("--rate")?.parse::<u32>()?,
            "--master" | "-m" => master = value("--master")?.parse::<f64>()?,
            "--output" | "-o" => output = Some(PathBuf::from(value("--output")?)),
            "--mute" => mute = true,
            other if other.starts_with('-') => {
                return Err(format!("unknown argument '{other}'").into());
            }
            other => inputs.push(parse_input(other)),
        }
    }

    Ok(Some(Options {
        format: format.ok_or("--format is required")?,
        channels: channels.ok_or("--channels is required")?,
        rate,
        master,
        mute,
        output: output.ok_or("--output is required")?,
        inputs,
    }))
}

fn run(options: Options) -> Result<(), Box<dyn Error>> {
    let spec = SampleSpec::new(options.format, options.rate, options.channels)?;
    let frame_size = spec.frame_size();

    let mut streams = Vec::with_capacity(options.inputs.len());
    let mut longest = 0;
    for input in &options.inputs {
        let mut bytes = fs::read(&input.path)
            .map_err(|err| format!("{}: {err}", input.path.display()))?;
        bytes.truncate(bytes.len() - bytes.len() % frame_size);
        longest = longest.max(bytes.len());
        let volume = ChannelVolumes::set(spec.channels(), sw_volume_from_linear(input.gain));
        streams.push(MixInfo::new(MemChunk::from_vec(bytes), volume));
    }
    if longest == 0 {
        longest = frame_size;
    }

    let master = ChannelVolumes::set(spec.channels(), sw_volume_from_linear(options.master));
    let mut output = vec![0u8; longest];
    let mixed = mix(&mut streams, &mut output, &spec, Some(&master), options.mute);
    output.truncate(mixed);
    fs::write(&options.output, &output)
        .map_err(|err| format!("{}: {err}", options.output.display()))?;

    info!(
        %spec,
        streams = streams.len(),
        bytes = mixed,
        output = %options.output.display(),
        "mix written"
    );
    Ok(())
}

fn main() {
    init_tracing();

    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            println!("{USAGE}");
            return;
        }
        Err(err) => {
            eprintln!("mixctl: {err}\n\n{USAGE}");
            process::exit(1);
        }
    };

    if let Err(err) = run(options) {
        eprintln!("mixctl: {err}");
        process::exit(1);
    }
}
