use anyhow::{bail, Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use simple_eq::dsp::{ChainCoefficients, ChannelSettings, CoefficientController, EqChain, Slope};
use std::path::PathBuf;

const USAGE: &str = "usage:
  eq_render <input.wav> <output.wav> [key=value ...]
  eq_render --response [key=value ...]

keys: lowcut highcut peak gain q lowslope highslope (12/24/36/48) sample_rate";

/// ISO third-octave centers.
const THIRD_OCTAVES: [f32; 31] = [
    20.0, 25.0, 31.5, 40.0, 50.0, 63.0, 80.0, 100.0, 125.0, 160.0, 200.0, 250.0, 315.0, 400.0,
    500.0, 630.0, 800.0, 1000.0, 1250.0, 1600.0, 2000.0, 2500.0, 3150.0, 4000.0, 5000.0, 6300.0,
    8000.0, 10000.0, 12500.0, 16000.0, 20000.0,
];

fn parse_slope(value: &str) -> Result<Slope> {
    let db: usize = value
        .trim_end_matches("dB")
        .parse()
        .with_context(|| format!("invalid slope '{value}'"))?;
    if db % 12 != 0 || !(12..=48).contains(&db) {
        bail!("slope must be 12, 24, 36 or 48 dB/oct, got {db}");
    }
    Ok(Slope::from_index(db / 12 - 1))
}

/// Apply `key=value` pairs on top of the default settings.
fn parse_settings<'a>(
    pairs: impl Iterator<Item = &'a String>,
) -> Result<(ChannelSettings, Option<f32>)> {
    let mut settings = ChannelSettings::default();
    let mut sample_rate = None;

    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{pair}'"))?;
        let number = || -> Result<f32> {
            value
                .parse::<f32>()
                .with_context(|| format!("invalid number for '{key}': '{value}'"))
        };
        match key {
            "lowcut" => settings.low_cut_freq = number()?,
            "highcut" => settings.high_cut_freq = number()?,
            "peak" => settings.peak_freq = number()?,
            "gain" => settings.peak_gain_db = number()?,
            "q" => settings.peak_quality = number()?,
            "lowslope" => settings.low_cut_slope = parse_slope(value)?,
            "highslope" => settings.high_cut_slope = parse_slope(value)?,
            "sample_rate" => sample_rate = Some(number()?),
            _ => bail!("unknown setting '{key}'\n{USAGE}"),
        }
    }

    Ok((settings, sample_rate))
}

fn print_response(settings: &ChannelSettings, sample_rate: f32) {
    let coeffs = ChainCoefficients::design(settings, sample_rate);
    println!("Response at {sample_rate} Hz:");
    for &f in THIRD_OCTAVES.iter().filter(|&&f| f < sample_rate * 0.5) {
        println!("  {:>8.1} Hz : {:>8.2} dB", f, coeffs.magnitude_db_at(f));
    }
}

fn read_interleaved(reader: WavReader<std::io::BufReader<std::fs::File>>) -> Result<Vec<f32>> {
    let spec = reader.spec();
    match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<Vec<_>, _>>()
            .context("failed to read float samples"),
        SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 * scale))
                .collect::<Result<Vec<_>, _>>()
                .context("failed to read integer samples")
        }
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();

    if args.first().map(String::as_str) == Some("--response") {
        let (settings, sample_rate) = parse_settings(args[1..].iter())?;
        print_response(&settings, sample_rate.unwrap_or(48000.0));
        return Ok(());
    }

    if args.len() < 2 {
        bail!("{USAGE}");
    }
    let input = PathBuf::from(&args[0]);
    let output = PathBuf::from(&args[1]);
    let (settings, _) = parse_settings(args[2..].iter())?;

    let reader = WavReader::open(&input)
        .with_context(|| format!("failed to open input WAV '{}'", input.display()))?;
    let spec = reader.spec();
    let channels = spec.channels as usize;
    if channels == 0 || channels > 2 {
        bail!("only mono and stereo files are supported, got {channels} channels");
    }

    let mut controller = CoefficientController::new();
    if !controller.prepare(spec.sample_rate as f32) {
        bail!("unusable sample rate {}", spec.sample_rate);
    }
    let mut chains = [EqChain::new(), EqChain::new()];
    controller.update(&settings, &mut chains);

    let mut samples = read_interleaved(reader)?;
    let mut input_peak = 0.0f32;
    let mut output_peak = 0.0f32;
    for frame in samples.chunks_mut(channels) {
        for (sample, chain) in frame.iter_mut().zip(chains.iter_mut()) {
            input_peak = input_peak.max(sample.abs());
            *sample = chain.process(*sample);
            output_peak = output_peak.max(sample.abs());
        }
    }

    let out_spec = WavSpec {
        channels: spec.channels,
        sample_rate: spec.sample_rate,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&output, out_spec)
        .with_context(|| format!("failed to create output WAV '{}'", output.display()))?;
    for &s in &samples {
        writer.write_sample(s)?;
    }
    writer.finalize().context("failed to finalize output WAV")?;

    let to_db = |v: f32| 20.0 * v.max(1e-9).log10();
    println!("Render summary for '{}':", input.display());
    println!("  frames processed : {}", samples.len() / channels);
    println!("  sample rate      : {} Hz", spec.sample_rate);
    println!("  input peak       : {:.2} dBFS", to_db(input_peak));
    println!("  output peak      : {:.2} dBFS", to_db(output_peak));
    println!("  written to       : {}", output.display());
    Ok(())
}
