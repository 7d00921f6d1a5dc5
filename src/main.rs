use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use dtmf_pipe_core::{
    alphabet::Alphabet,
    audio::{list_audio_devices, CpalSink},
    encoder::{checksum, encode_bytes, Transmission},
    export::{render, write_wav},
    scheduler::{Scheduler, TickOutcome},
    sink::AudioSink,
    symbol::format_symbols,
    Config, ToneConfig, DEFAULT_PAYLOAD,
};
use std::io::{self, BufRead, Read};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "dtmf-pipe")]
#[command(about = "Send text as a checksummed sequence of DTMF tones", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ToneArgs {
    /// Directory holding 0.wav .. 9.wav, a.wav .. d.wav, star.wav, pound.wav
    /// (tones are synthesized when omitted)
    #[arg(long)]
    clips: Option<PathBuf>,

    /// Synthesized tone length in milliseconds
    #[arg(long, default_value = "100")]
    tone_duration: u32,

    /// Silence after each synthesized tone in milliseconds
    #[arg(long, default_value = "50")]
    gap: u32,

    /// Volume level (0.0 - 1.0)
    #[arg(long, default_value = "1.0")]
    volume: f32,
}

#[derive(Subcommand)]
enum Commands {
    /// Play the encoded text through the default output device
    Play {
        /// Text to transmit
        #[arg(short, long, default_value = DEFAULT_PAYLOAD)]
        data: String,

        #[command(flatten)]
        tone: ToneArgs,

        /// Frame interval in milliseconds
        #[arg(long, default_value = "16")]
        tick: u64,

        /// Stay open after the last symbol and wait for a replay
        #[arg(long, short)]
        repeat: bool,
    },

    /// Print the symbol sequence for some text
    Encode {
        /// Text to encode (if not provided, reads from stdin)
        #[arg(short, long)]
        data: Option<String>,
    },

    /// Render the transmission to a WAV file
    Render {
        /// Output WAV path
        #[arg(short, long)]
        output: PathBuf,

        /// Text to encode (if not provided, reads from stdin)
        #[arg(short, long)]
        data: Option<String>,

        #[command(flatten)]
        tone: ToneArgs,
    },

    /// List available audio output devices
    Devices,
}

enum Control {
    Replay,
    Quit,
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Play {
            data,
            tone,
            tick,
            repeat,
        } => {
            let config = Config {
                payload: data,
                tone: tone_config(&tone),
                tick_interval_ms: tick.max(1),
                ..Default::default()
            }
            .with_volume(tone.volume);

            let alphabet = load_alphabet(tone.clips.as_deref(), &config.tone)?;
            play(&config, alphabet, repeat)?;
        }

        Commands::Encode { data } => {
            let input = read_input(data)?;
            let symbols = encode_bytes(&input);
            println!("{}", format_symbols(&symbols));
            eprintln!("{} bytes, checksum {:02x}", input.len(), checksum(&input));
        }

        Commands::Render { output, data, tone } => {
            let input = read_input(data)?;
            let config = tone_config(&tone);
            let alphabet = load_alphabet(tone.clips.as_deref(), &config)?;

            let symbols = encode_bytes(&input);
            eprintln!("Rendering {} symbols: {}", symbols.len(), format_symbols(&symbols));
            let clip = render(&symbols, &alphabet, tone.volume)?;
            write_wav(&output, &clip)?;
            eprintln!("Wrote {:.1} s to {}", clip.duration().as_secs_f32(), output.display());
        }

        Commands::Devices => {
            println!("Available audio devices:");
            for device in list_audio_devices() {
                println!("  {}", device);
            }
        }
    }

    Ok(())
}

fn tone_config(args: &ToneArgs) -> ToneConfig {
    ToneConfig {
        tone_duration_ms: args.tone_duration,
        gap_ms: args.gap,
        ..Default::default()
    }
}

fn load_alphabet(clips: Option<&Path>, tone: &ToneConfig) -> Result<Alphabet> {
    let alphabet = match clips {
        Some(dir) => Alphabet::load_dir(dir)?,
        None => Alphabet::synthesize(tone),
    };

    let missing = alphabet.missing();
    if !missing.is_empty() {
        eprintln!("Warning: no clip for {}", format_symbols(&missing));
    }

    Ok(alphabet)
}

fn read_input(data: Option<String>) -> Result<Vec<u8>> {
    match data {
        Some(d) => Ok(d.into_bytes()),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Forwards stdin lines as controls: an empty line or `r` replays, `q` quits.
fn spawn_controls() -> Receiver<Control> {
    let (tx, rx) = mpsc::channel();

    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            let control = match line.trim() {
                "" | "r" => Control::Replay,
                "q" => Control::Quit,
                other => {
                    eprintln!("Unknown command {:?} (Enter = replay, q = quit)", other);
                    continue;
                }
            };
            if tx.send(control).is_err() {
                break;
            }
        }
    });

    rx
}

fn play(config: &Config, alphabet: Alphabet, repeat: bool) -> Result<()> {
    let transmission = Transmission::new(config.payload.clone());
    eprintln!(
        "Transmitting {:?} as {} symbols (checksum {:02x})",
        transmission.payload,
        transmission.symbols.len(),
        transmission.checksum
    );
    eprintln!("Press Enter to replay from the start, q to quit.");

    let sink = CpalSink::new()?;
    let mut scheduler = Scheduler::new(
        transmission.symbols.clone(),
        Arc::new(alphabet),
        sink,
        config.volume,
    )?;

    let controls = spawn_controls();
    let frame = Duration::from_millis(config.tick_interval_ms);
    run_frames(&mut scheduler, &controls, repeat, frame)
}

/// Drives the scheduler once per frame until it goes idle, or until quit.
///
/// With `repeat` the loop keeps waiting for a replay while idle, as long as
/// the control channel is still connected.
fn run_frames<S: AudioSink>(
    scheduler: &mut Scheduler<S>,
    controls: &Receiver<Control>,
    repeat: bool,
    frame: Duration,
) -> Result<()> {
    let mut controls_open = true;
    let mut overlay = String::new();

    loop {
        if controls_open {
            match controls.try_recv() {
                Ok(Control::Replay) => scheduler.replay()?,
                Ok(Control::Quit) => break,
                Err(TryRecvError::Empty) => {}
                Err(TryRecvError::Disconnected) => controls_open = false,
            }
        }

        let outcome = scheduler.tick()?;

        let remaining: Vec<_> = scheduler.remaining().collect();
        let line = match scheduler.current_symbol() {
            Some(current) => format!("[{}] {}", current, format_symbols(&remaining)),
            None => "[ ]".to_string(),
        };
        if line != overlay {
            eprintln!("{}", line);
            overlay = line;
        }

        if outcome == TickOutcome::Completed {
            eprintln!("Transmission complete!");
        }
        if scheduler.is_idle() && (!repeat || !controls_open) {
            break;
        }

        std::thread::sleep(frame);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dtmf_pipe_core::{alphabet::AudioClip, symbol::SymbolCode};
    use std::sync::mpsc::Sender;

    /// Every clip is finished on the first poll. Closing a clip drops the
    /// control sender, as if stdin hit EOF right then.
    #[derive(Default)]
    struct InstantSink {
        sender: Option<Sender<Control>>,
        plays: usize,
    }

    impl AudioSink for InstantSink {
        type Handle = ();

        fn play(&mut self, _clip: Arc<AudioClip>, _volume: f32) -> dtmf_pipe_core::Result<()> {
            self.plays += 1;
            Ok(())
        }

        fn is_finished(&self, _handle: &()) -> bool {
            true
        }

        fn close(&mut self, _handle: ()) {
            self.sender = None;
        }
    }

    fn scheduler(sink: InstantSink) -> Scheduler<InstantSink> {
        let alphabet = Alphabet::synthesize(&ToneConfig::default());
        Scheduler::new(vec![SymbolCode::D1], Arc::new(alphabet), sink, 1.0).unwrap()
    }

    #[test]
    fn test_repeat_exits_when_controls_close_after_completion() {
        let (tx, rx) = mpsc::channel();
        let sink = InstantSink {
            sender: Some(tx),
            ..Default::default()
        };
        let mut scheduler = scheduler(sink);

        run_frames(&mut scheduler, &rx, true, Duration::ZERO).unwrap();
        assert!(scheduler.is_idle());
        assert_eq!(scheduler.sink().plays, 1);
    }

    #[test]
    fn test_without_repeat_exits_once_idle() {
        let (_tx, rx) = mpsc::channel();
        let mut scheduler = scheduler(InstantSink::default());

        run_frames(&mut scheduler, &rx, false, Duration::ZERO).unwrap();
        assert!(scheduler.is_idle());
    }

    #[test]
    fn test_replay_then_quit() {
        let (tx, rx) = mpsc::channel();
        tx.send(Control::Replay).unwrap();
        tx.send(Control::Quit).unwrap();
        let mut scheduler = scheduler(InstantSink::default());

        run_frames(&mut scheduler, &rx, true, Duration::ZERO).unwrap();
        assert_eq!(scheduler.sink().plays, 2);
    }
}
