//! Pedalboard CLI - run a pedal chain live or render it offline

use clap::{Parser, Subcommand};
use pedalboard::audio::{self, AudioEngine};
use pedalboard::midi_input::MidiControlInput;
use pedalboard::{Frame, Pedalboard, PedalboardConfig, PedalboardControl};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "pedalboard")]
#[command(about = "Guitar pedal chains with LFO modulation and MIDI control", long_about = None)]
struct Cli {
    /// Board configuration (TOML); defaults apply when omitted
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the assembled chain and every control binding
    List,

    /// List audio and MIDI devices
    Devices,

    /// Run the chain on a synthetic plucked note and print levels
    Render {
        /// Duration in seconds (default: 4.0)
        #[arg(short, long, default_value = "4.0")]
        duration: f32,

        /// Plucks per second (default: 2.0)
        #[arg(short, long, default_value = "2.0")]
        rate: f32,

        /// Pluck pitch in Hz (default: 110)
        #[arg(short, long, default_value = "110.0")]
        pitch: f32,
    },

    /// Process the default input device live, controlled over MIDI
    Run {
        /// MIDI device name (partial match); overrides the configuration
        #[arg(short, long)]
        device: Option<String>,

        /// Stop after this many seconds; runs until killed otherwise
        #[arg(short, long)]
        seconds: Option<f32>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => PedalboardConfig::load(path)?,
        None => PedalboardConfig::default(),
    };

    match cli.command {
        Commands::List => list(&config),
        Commands::Devices => devices(),
        Commands::Render {
            duration,
            rate,
            pitch,
        } => render(&config, duration, rate, pitch),
        Commands::Run { device, seconds } => run(config, device, seconds),
    }
}

fn list(config: &PedalboardConfig) -> Result<(), Box<dyn std::error::Error>> {
    let board = Pedalboard::new(config)?;
    let control = board.control();
    for unit in control.chain().units() {
        println!(
            "{:>2}  {:<18} [{}]  {}",
            unit.index(),
            unit.name(),
            if unit.is_active() { "on " } else { "off" },
            unit.label()
        );
        for info in unit.info() {
            println!(
                "      {:<16} {:>10.4}   [{} .. {}] step {}",
                info.name, info.value, info.min, info.max, info.step
            );
        }
    }
    for failure in control.failures() {
        println!("{:>2}  {:<18} FAILED: {}", failure.index, failure.kind, failure.error);
    }
    Ok(())
}

fn devices() -> Result<(), Box<dyn std::error::Error>> {
    println!("Audio devices:");
    for device in audio::list_devices()? {
        let role = match (device.input, device.output) {
            (true, true) => "in/out",
            (true, false) => "in",
            (false, true) => "out",
            (false, false) => "-",
        };
        println!("  {:<7} {}", role, device.name);
    }
    println!("MIDI inputs:");
    for device in MidiControlInput::list_devices()? {
        println!("  {:>2}: {}", device.index, device.name);
    }
    Ok(())
}

/// Decaying sawtooth, retriggered `rate` times per second
fn pluck(frame: usize, sample_rate: f32, rate: f32, pitch: f32) -> f32 {
    let period = (sample_rate / rate.max(0.01)) as usize;
    let t = (frame % period.max(1)) as f32 / sample_rate;
    let phase = (t * pitch).fract();
    (2.0 * phase - 1.0) * (-t * 6.0).exp() * 0.3
}

fn render(
    config: &PedalboardConfig,
    duration: f32,
    rate: f32,
    pitch: f32,
) -> Result<(), Box<dyn std::error::Error>> {
    let (mut processor, control) = Pedalboard::new(config)?.into_parts();
    let sample_rate = config.sample_rate as f32;
    let block_size = config.block_size;
    let total = (duration * sample_rate) as usize;
    let second = config.sample_rate as usize;

    let mut input = vec![Frame::SILENCE; block_size];
    let mut output = vec![Frame::SILENCE; block_size];
    let mut peak = 0.0f32;
    let mut sum_squares = 0.0f64;
    let mut counted = 0usize;
    let started = Instant::now();

    let mut frame = 0;
    while frame < total {
        let frames = block_size.min(total - frame);
        for (i, slot) in input[..frames].iter_mut().enumerate() {
            *slot = Frame::mono(pluck(frame + i, sample_rate, rate, pitch));
        }
        processor.process_block(&input[..frames], &mut output[..frames]);

        for out in &output[..frames] {
            peak = peak.max(out.peak());
            sum_squares += (out.mix() as f64).powi(2);
            counted += 1;
            if counted == second {
                report(frame / second, peak, sum_squares, counted);
                peak = 0.0;
                sum_squares = 0.0;
                counted = 0;
            }
        }
        frame += frames;
    }
    if counted > 0 {
        report(total / second, peak, sum_squares, counted);
    }

    let elapsed = started.elapsed().as_secs_f32();
    info!(
        seconds = duration,
        elapsed,
        realtime = duration / elapsed.max(f32::EPSILON),
        "render finished"
    );
    control.deactivate();
    Ok(())
}

fn report(second: usize, peak: f32, sum_squares: f64, count: usize) {
    let rms = (sum_squares / count as f64).sqrt();
    println!("{:>4}s  peak {:.4}  rms {:.4}", second, peak, rms);
}

fn connect_midi(port: Option<&str>) -> Option<MidiControlInput> {
    let connected = match port {
        Some(name) => MidiControlInput::connect(name),
        None => MidiControlInput::connect_by_index(0),
    };
    match connected {
        Ok(input) => Some(input),
        Err(e) => {
            warn!("running without MIDI control: {}", e);
            None
        }
    }
}

fn run(
    mut config: PedalboardConfig,
    device: Option<String>,
    seconds: Option<f32>,
) -> Result<(), Box<dyn std::error::Error>> {
    config.sample_rate = AudioEngine::default_sample_rate()?;
    let block_size = config.block_size;
    let port = device.or_else(|| config.midi.port.clone());

    let (processor, mut control) = Pedalboard::new(&config)?.into_parts();
    let _engine = AudioEngine::start(processor, block_size)?;
    let midi = connect_midi(port.as_deref());

    let deadline = seconds.map(|s| Instant::now() + Duration::from_secs_f32(s));
    info!("pedalboard running");
    loop {
        if let Some(midi) = &midi {
            dispatch(&mut control, midi);
        }
        control.poll();
        if deadline.map_or(false, |d| Instant::now() >= d) {
            break;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    control.deactivate();
    Ok(())
}

fn dispatch(control: &mut PedalboardControl, midi: &MidiControlInput) {
    for event in midi.drain() {
        if let Ok(routed) = control.route(event) {
            info!(?routed, "control");
        }
    }
}
