use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "checkin-kiosk")]
#[command(about = "Contactless check-in kiosk: scan a code, print the tags")]
pub struct Cli {
    /// Config file to use instead of the one in the user config directory
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Read scans from stdin and print screens as text instead of drawing the TUI
    #[arg(long)]
    pub headless: bool,
}
