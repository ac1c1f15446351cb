use sentrycam::{
    camera::Camera,
    common::{Config, DevMode, StorageConfig},
    serial::{LineSource, SerialLink},
    storage::CaptureStore,
    watch::Sentry,
};

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "sentrycam")]
#[command(about = "Serial-triggered intruder camera")]
struct Cli {
    /// Enable development mode (saves captures under ./dev_data)
    #[arg(long, global = true)]
    dev: bool,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the serial line and capture a frame on each intrusion report
    Watch,
    /// Capture a single frame and save it
    TestCamera,
    /// Echo incoming serial traffic for a few seconds
    TestSerial {
        /// How long to listen
        #[arg(short, long, default_value = "10")]
        seconds: u64,
    },
    /// List available camera devices
    ListCameras,
    /// List available serial ports
    ListPorts,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.dev);

    let dev_mode = DevMode::new(cli.dev)?;
    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Watch => {
            println!(
                "Watching {} for \"{}\" (press q to quit)",
                config.serial.port, config.serial.trigger
            );

            // Open the serial link first, then the camera; either failing is
            // fatal before the loop starts.
            let serial = SerialLink::open(&config.serial)?;
            let camera = Camera::new(&config.camera)?;
            let store = CaptureStore::new_with_dev_mode(&config.storage, &dev_mode)?;

            let mut sentry = Sentry::new(serial, camera, store, &config);
            sentry.run()?;
            println!("Stopped.");
        }
        Commands::TestCamera => {
            println!("Testing camera...");
            let mut camera = Camera::new(&config.camera)?;
            let frame = camera.capture_frame()?;

            let test_storage = StorageConfig {
                file_prefix: "test".to_string(),
                ..config.storage.clone()
            };
            let store = CaptureStore::new_with_dev_mode(&test_storage, &dev_mode)?;
            let path = store.save_frame(&frame)?;
            println!(
                "Captured {}x{} frame -> {}",
                frame.width(),
                frame.height(),
                path.display()
            );
        }
        Commands::TestSerial { seconds } => {
            println!(
                "Listening on {} at {} baud for {}s...",
                config.serial.port, config.serial.baud_rate, seconds
            );
            let mut link = SerialLink::open(&config.serial)?;
            let deadline = Instant::now() + Duration::from_secs(seconds);

            while Instant::now() < deadline {
                match link.poll_line()? {
                    Some(line) => println!("{}", line),
                    None => std::thread::sleep(Duration::from_millis(
                        config.serial.poll_interval_ms,
                    )),
                }
            }
        }
        Commands::ListCameras => {
            let cameras = Camera::list_all_cameras()?;

            if cameras.is_empty() {
                println!("No cameras found!");
                println!("\nTroubleshooting:");
                println!("  1. Check if a camera is connected");
                println!("  2. Ensure you have permission to access /dev/video*");
                return Ok(());
            }

            for (index, name, features) in &cameras {
                println!("/dev/video{}: {}", index, name);
                for feature in features {
                    println!("   - {}", feature);
                }
                println!();
            }

            println!("To select a camera, edit the configuration:");
            println!("   [camera]");
            println!("   device_index = <NUMBER>");
        }
        Commands::ListPorts => {
            let ports = SerialLink::list_ports()?;
            if ports.is_empty() {
                println!("No serial ports found!");
                return Ok(());
            }
            for port in &ports {
                println!("{}", port.port_name);
            }
        }
    }

    Ok(())
}

fn setup_logging(dev_mode: bool) {
    if dev_mode {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_file(true)
            .with_line_number(true)
            .init();
    } else {
        tracing_subscriber::fmt::init();
    }
}
