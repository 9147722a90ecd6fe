use std::path::{Path, PathBuf};

use tracing::Level;
use voxshift::analysis::frequency::{dominant_frequency, rms};
use voxshift::core::resample::resample_rate;
use voxshift::{Algorithm, AudioBuffer, PitchShiftRequest, Profile, ShiftConfig, WavEncoding};

/// Default shift: three semitones down.
const DEFAULT_SEMITONES: f64 = -3.0;

/// Parsed command line.
#[derive(Debug, Clone, PartialEq)]
struct Options {
    input: PathBuf,
    output: Option<PathBuf>,
    semitones: f64,
    algorithm: Option<Algorithm>,
    profile: Option<Profile>,
    config_path: Option<PathBuf>,
    n_fft: Option<usize>,
    hop: Option<usize>,
    rate: Option<u32>,
    normalize: bool,
    float: bool,
    verbose: bool,
}

impl Options {
    fn new(input: PathBuf) -> Self {
        Self {
            input,
            output: None,
            semitones: DEFAULT_SEMITONES,
            algorithm: None,
            profile: None,
            config_path: None,
            n_fft: None,
            hop: None,
            rate: None,
            normalize: false,
            float: false,
            verbose: false,
        }
    }

    /// `<stem>_pitched.wav` next to the input unless `-o` was given.
    fn output_path(&self) -> PathBuf {
        if let Some(out) = &self.output {
            return out.clone();
        }
        let stem = self
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "output".to_string());
        self.input.with_file_name(format!("{}_pitched.wav", stem))
    }

    /// Builds the engine config: file or profile first, then flag overrides.
    fn config(&self) -> Result<ShiftConfig, String> {
        let mut config = match (&self.config_path, self.profile) {
            (Some(path), _) => ShiftConfig::load(path)
                .map_err(|e| format!("Failed to load {}: {}", path.display(), e))?,
            (None, Some(profile)) => ShiftConfig::from_profile(profile),
            (None, None) => ShiftConfig::default(),
        };
        if let Some(n_fft) = self.n_fft {
            config = config.with_n_fft(n_fft);
        }
        if let Some(hop) = self.hop {
            config = config.with_hop_length(hop);
        }
        if let Some(algorithm) = self.algorithm {
            config = config.with_algorithm(algorithm);
        }
        if self.normalize {
            config = config.with_normalize(true);
        }
        Ok(config)
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();
    if args.iter().skip(1).any(|a| a == "--help" || a == "-h") {
        print_usage();
        return;
    }

    let options = match parse_args(args.get(1..).unwrap_or(&[])) {
        Ok(o) => o,
        Err(msg) => {
            eprintln!("ERROR: {}", msg);
            print_usage();
            std::process::exit(1);
        }
    };

    let level = if options.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(msg) = run(&options) {
        eprintln!("ERROR: {}", msg);
        std::process::exit(1);
    }
}

fn run(options: &Options) -> Result<(), String> {
    if !is_wav(&options.input) {
        return Err(format!(
            "{}: only WAV input is supported; convert other formats first",
            options.input.display()
        ));
    }
    if !options.input.exists() {
        return Err(format!("file does not exist: {}", options.input.display()));
    }

    let config = options.config()?;
    let request = PitchShiftRequest::new(options.semitones);
    let algorithm = request.algorithm_or(config.algorithm);
    let output_path = options.output_path();

    let mut buffer = voxshift::io::wav::read_wav_file(&options.input)
        .map_err(|e| format!("Failed to read {}: {}", options.input.display(), e))?;

    tracing::info!(
        "Input: {} samples, {} Hz, {:.2}s",
        buffer.len(),
        buffer.sample_rate,
        buffer.duration_secs()
    );

    if let Some(target) = options.rate {
        if target != buffer.sample_rate {
            tracing::info!("Resampling {} Hz -> {} Hz", buffer.sample_rate, target);
            let resampled = resample_rate(&buffer.data, buffer.sample_rate, target);
            buffer = AudioBuffer::new(resampled, target);
        }
    }

    tracing::debug!("Parameters: {}", config);
    tracing::info!(
        "Shifting by {:+.2} semitones ({})",
        request.semitones,
        algorithm
    );
    if !algorithm.preserves_duration() {
        tracing::info!("Resample mode changes duration along with pitch");
    }

    let input_report = options.verbose.then(|| report(&buffer, config.n_fft));

    let start = std::time::Instant::now();
    let output = voxshift::shift_pitch_buffer(buffer, &request, &config)
        .map_err(|e| format!("Pitch shifting failed: {}", e))?;
    let elapsed = start.elapsed();

    tracing::info!(
        "Output: {} samples, {:.2}s",
        output.len(),
        output.duration_secs()
    );

    if let Some((in_freq, in_rms)) = input_report {
        let (out_freq, out_rms) = report(&output, config.n_fft);
        let processing_secs = elapsed.as_secs_f64();
        let realtime_factor = if processing_secs > 0.0 {
            output.duration_secs() / processing_secs
        } else {
            f64::INFINITY
        };
        tracing::debug!("Dominant frequency: {:.1} Hz -> {:.1} Hz", in_freq, out_freq);
        tracing::debug!("RMS level: {:.4} -> {:.4}", in_rms, out_rms);
        tracing::debug!(
            "Processing time: {:.3}s ({:.1}x realtime)",
            processing_secs,
            realtime_factor
        );
    }

    let encoding = if options.float {
        WavEncoding::Float32
    } else {
        WavEncoding::Pcm16
    };
    voxshift::io::wav::write_wav_file(&output_path, &output, encoding)
        .map_err(|e| format!("Failed to write {}: {}", output_path.display(), e))?;

    tracing::info!("Written to {}", output_path.display());
    Ok(())
}

fn report(buffer: &AudioBuffer, n_fft: usize) -> (f64, f32) {
    (
        dominant_frequency(&buffer.data, buffer.sample_rate, n_fft),
        rms(&buffer.data),
    )
}

fn print_usage() {
    eprintln!("Usage: voxshift <input.wav> [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -s, --semitones <f>   Pitch change in semitones, negative lowers (default: -3.0)");
    eprintln!("  -o, --output <path>   Output file (default: <input>_pitched.wav)");
    eprintln!("  -a, --algorithm <a>   phase-vocoder (keeps duration) or resample (speed change)");
    eprintln!("  --profile <name>      studio (2048/512) or low-memory (512/128, linear resample)");
    eprintln!("  --config <file>       TOML configuration file");
    eprintln!("  --n-fft <N>           FFT window size (hop follows at N/4)");
    eprintln!("  --hop <N>             Hop length");
    eprintln!("  --rate <hz>           Resample input to this rate first (e.g. 16000 for speech)");
    eprintln!("  --normalize, -n       Match output RMS to input");
    eprintln!("  --float               Write 32-bit float output (default: 16-bit PCM)");
    eprintln!("  --verbose, -v         Show parameters, pitch/level report, and timing");
    eprintln!();
    eprintln!("Examples:");
    eprintln!("  voxshift voice.wav");
    eprintln!("  voxshift voice.wav -s -5 -o lower.wav");
    eprintln!("  voxshift voice.wav --profile low-memory --rate 16000");
    eprintln!("  voxshift voice.wav -s 2 --algorithm resample");
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut input: Option<PathBuf> = None;
    let mut options = Options::new(PathBuf::new());

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--semitones" | "-s" => {
                i += 1;
                options.semitones = parse_value(args, i, "semitones")?;
            }
            "--output" | "-o" => {
                i += 1;
                options.output = Some(PathBuf::from(value(args, i, "output")?));
            }
            "--algorithm" | "-a" => {
                i += 1;
                options.algorithm = Some(
                    value(args, i, "algorithm")?
                        .parse()
                        .map_err(|e: voxshift::ShiftError| e.to_string())?,
                );
            }
            "--profile" => {
                i += 1;
                options.profile = Some(
                    value(args, i, "profile")?
                        .parse()
                        .map_err(|e: voxshift::ShiftError| e.to_string())?,
                );
            }
            "--config" => {
                i += 1;
                options.config_path = Some(PathBuf::from(value(args, i, "config")?));
            }
            "--n-fft" => {
                i += 1;
                options.n_fft = Some(parse_value(args, i, "n-fft")?);
            }
            "--hop" => {
                i += 1;
                options.hop = Some(parse_value(args, i, "hop")?);
            }
            "--rate" => {
                i += 1;
                options.rate = Some(parse_value(args, i, "rate")?);
            }
            "--normalize" | "-n" => options.normalize = true,
            "--float" => options.float = true,
            "--verbose" | "-v" => options.verbose = true,
            other if other.starts_with('-') && other.parse::<f64>().is_err() => {
                return Err(format!("unknown option '{}'", other));
            }
            other => {
                if input.is_some() {
                    return Err(format!("unexpected argument '{}'", other));
                }
                input = Some(PathBuf::from(other));
            }
        }
        i += 1;
    }

    options.input = input.ok_or_else(|| "missing input file".to_string())?;
    Ok(options)
}

fn value<'a>(args: &'a [String], idx: usize, name: &str) -> Result<&'a str, String> {
    args.get(idx)
        .map(String::as_str)
        .ok_or_else(|| format!("--{} requires a value", name))
}

fn parse_value<T: std::str::FromStr>(args: &[String], idx: usize, name: &str) -> Result<T, String> {
    let raw = value(args, idx, name)?;
    raw.parse()
        .map_err(|_| format!("Invalid {}: {}", name, raw))
}

fn is_wav(path: &Path) -> bool {
    path.extension()
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let options = parse_args(&args(&["talk.wav"])).unwrap();
        assert_eq!(options.input, PathBuf::from("talk.wav"));
        assert_eq!(options.semitones, -3.0);
        assert!(options.algorithm.is_none());
        assert!(!options.float);
    }

    #[test]
    fn test_negative_semitones_value() {
        let options = parse_args(&args(&["talk.wav", "-s", "-5.5"])).unwrap();
        assert_eq!(options.semitones, -5.5);
    }

    #[test]
    fn test_default_output_path() {
        let options = parse_args(&args(&["/tmp/rec/talk.wav"])).unwrap();
        assert_eq!(options.output_path(), PathBuf::from("/tmp/rec/talk_pitched.wav"));

        let options = parse_args(&args(&["talk.wav", "-o", "low.wav"])).unwrap();
        assert_eq!(options.output_path(), PathBuf::from("low.wav"));
    }

    #[test]
    fn test_algorithm_and_profile() {
        let options = parse_args(&args(&[
            "talk.wav",
            "--algorithm",
            "resample",
            "--profile",
            "low-memory",
        ]))
        .unwrap();
        assert_eq!(options.algorithm, Some(Algorithm::ResampleRatio));
        assert_eq!(options.profile, Some(Profile::LowMemory));

        let config = options.config().unwrap();
        assert_eq!(config.n_fft, 512);
        assert_eq!(config.algorithm, Algorithm::ResampleRatio);
    }

    #[test]
    fn test_flag_overrides() {
        let options = parse_args(&args(&[
            "talk.wav", "--n-fft", "1024", "--hop", "128", "-n", "--rate", "16000",
        ]))
        .unwrap();
        let config = options.config().unwrap();
        assert_eq!(config.n_fft, 1024);
        assert_eq!(config.hop_length, 128);
        assert!(config.normalize);
        assert_eq!(options.rate, Some(16000));
    }

    #[test]
    fn test_errors() {
        assert!(parse_args(&args(&[])).is_err());
        assert!(parse_args(&args(&["talk.wav", "-s"])).is_err());
        assert!(parse_args(&args(&["talk.wav", "-s", "low"])).is_err());
        assert!(parse_args(&args(&["talk.wav", "--algorithm", "granular"])).is_err());
        assert!(parse_args(&args(&["talk.wav", "--bogus"])).is_err());
        assert!(parse_args(&args(&["a.wav", "b.wav"])).is_err());
    }

    #[test]
    fn test_is_wav() {
        assert!(is_wav(Path::new("a.WAV")));
        assert!(!is_wav(Path::new("a.m4a")));
    }
}
