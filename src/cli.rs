//! Command line interface for the relay binary.
//!
//! Kept free of crate-internal imports so the build script can include it
//! for man page generation.

use clap::Parser;

/// Command line arguments for the `framegate` binary.
#[derive(Debug, Parser)]
#[command(
    name = "framegate",
    version,
    about = "Segment-aware transparent TCP relay"
)]
pub struct Cli {
    /// Address to accept connections on, as an IPv4 `host:port` literal.
    #[arg(short, long)]
    pub listen: String,

    /// Destination address each accepted connection is relayed to.
    #[arg(short, long)]
    pub connect: String,

    /// Hex-dump every forwarded chunk to the diagnostic log.
    #[arg(short, long)]
    pub verbose: bool,
}
