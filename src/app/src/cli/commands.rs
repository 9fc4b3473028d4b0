//! Command definitions for the SM-6210 RFID CLI application

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List available serial ports
    ListPorts,

    /// List the standard baud rates the host can select
    ListBauds,

    /// List the reader driver models this build supports
    ListModels,

    /// Connect and watch for tags, printing each change as it's observed
    Watch(ConnectArgs),

    /// Write the EPC bank of the current tag
    WriteEpc(WriteArgs),

    /// Write the RFU (reserved/access password) bank of the current tag
    WriteRfu(WriteArgs),

    /// Write the user bank of the current tag
    WriteUser(WriteArgs),

    /// Zero the current tag's EPC, user and RFU banks
    Erase(ConfirmArgs),

    /// Kill the current tag (unsupported by the SM-6210 driver)
    Kill(ConfirmArgs),

    /// Lock the current tag (unsupported by the SM-6210 driver)
    Lock(ConfirmArgs),

    /// Wait for a tag and print a hex dump of its memory banks
    Dump(ConnectArgs),

    /// Watch for tags and export the observed history as CSV
    Csv(CsvArgs),
}

#[derive(Args)]
pub struct ConnectArgs {
    /// Index into `list-ports`' output to open
    #[arg(short, long)]
    pub port: usize,

    /// Baud rate to open the connection at (9600 is mandatory for the SM-6210)
    #[arg(short, long, default_value = "9600")]
    pub baud: u32,

    /// How long to wait for a tag before giving up, in seconds
    #[arg(short, long, default_value = "10")]
    pub seconds: u64,
}

#[derive(Args)]
pub struct WriteArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Data to write (hexadecimal string, e.g., 01020304)
    #[arg(short, long, value_parser = parse_hex_data)]
    pub data: Vec<u8>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ConfirmArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct CsvArgs {
    #[command(flatten)]
    pub connect: ConnectArgs,

    /// File to write the CSV export to; prints to stdout if omitted
    #[arg(short, long)]
    pub output: Option<std::path::PathBuf>,
}

fn parse_hex_data(arg: &str) -> Result<Vec<u8>, String> {
    if !arg.len().is_multiple_of(2) {
        return Err("Hex data must have an even number of characters".to_string());
    }

    hex::decode(arg).map_err(|_| "Invalid hex data. Use only 0-9 and A-F characters".to_string())
}
