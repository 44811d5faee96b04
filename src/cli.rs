//! Command line interface for the `blebridge` diagnostics binary.
//!
//! Provides offline tools for inspecting wallet notification traffic:
//! reassembling captured fragments and producing fragments for a body.

use clap::{Parser, Subcommand};

/// Command line arguments for the `blebridge` binary.
#[derive(Debug, Parser)]
#[command(name = "blebridge", version, about = "Wallet BLE notification tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Feed hex-encoded notification fragments through the reassembly
    /// buffer and print each completed message as hex.
    Reassemble {
        /// Largest body length a header may declare.
        #[arg(long, default_value_t = 1024 * 1024)]
        max_message_size: usize,
        /// Fragments in arrival order, hex encoded.
        #[arg(required = true)]
        fragments: Vec<String>,
    },
    /// Frame a hex-encoded body and print the notification fragments.
    Split {
        /// Message type placed in the header.
        #[arg(long = "type", default_value_t = 0)]
        message_type: u16,
        /// Notification size in bytes.
        #[arg(long, default_value_t = 64)]
        mtu: usize,
        /// Body bytes, hex encoded.
        body: String,
    },
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cli, Command};

    #[test]
    fn parses_reassemble_fragments() {
        let cli = Cli::parse_from(["blebridge", "reassemble", "3f2323", "aabb"]);
        let Command::Reassemble {
            max_message_size,
            fragments,
        } = cli.command
        else {
            panic!("expected reassemble");
        };
        assert_eq!(max_message_size, 1024 * 1024);
        assert_eq!(fragments, ["3f2323", "aabb"]);
    }

    #[test]
    fn parses_split_options() {
        let cli = Cli::parse_from(["blebridge", "split", "--type", "17", "--mtu", "20", "cafe"]);
        let Command::Split {
            message_type,
            mtu,
            body,
        } = cli.command
        else {
            panic!("expected split");
        };
        assert_eq!((message_type, mtu, body.as_str()), (17, 20, "cafe"));
    }

    #[test]
    fn reassemble_requires_fragments() {
        assert!(Cli::try_parse_from(["blebridge", "reassemble"]).is_err());
    }
}
