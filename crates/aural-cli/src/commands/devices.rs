//! Audio device enumeration command.

use aural_io::{default_device, list_devices};
use clap::{Args, Subcommand};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,
    /// Show default device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices()?;
            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            println!("Available Audio Devices");
            println!("========================\n");
            for (idx, device) in devices.iter().enumerate() {
                let kind = match (device.is_input, device.is_output) {
                    (true, true) => "input/output",
                    (true, false) => "input",
                    _ => "output",
                };
                println!("  [{}] {} ({kind}, {} Hz)", idx, device.name, device.default_sample_rate);
            }
        }
        DevicesCommand::Info => {
            let (input, output) = default_device()?;

            println!("Default Audio Devices");
            println!("======================\n");
            match input {
                Some(d) => println!("Default Input:  {} ({} Hz)", d.name, d.default_sample_rate),
                None => println!("Default Input:  none"),
            }
            match output {
                Some(d) => println!("Default Output: {} ({} Hz)", d.name, d.default_sample_rate),
                None => println!("Default Output: none"),
            }
        }
    }

    Ok(())
}
