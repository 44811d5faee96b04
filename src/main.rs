//! Diagnostics binary for `blebridge`.
//!
//! Reassembles captured notification fragments or splits a body into the
//! fragments a wallet would send.

mod cli;

use std::num::NonZeroUsize;

use blebridge::{Fragmenter, ReassemblyBuffer, ReassemblyConfig};
use clap::Parser;

use crate::cli::{Cli, Command};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Enable structured logging for diagnostics. Applications embedding the
    // library should install their own subscriber.
    tracing_subscriber::fmt::init();

    match Cli::parse().command {
        Command::Reassemble {
            max_message_size,
            fragments,
        } => reassemble(max_message_size, &fragments),
        Command::Split {
            message_type,
            mtu,
            body,
        } => split(message_type, mtu, &body),
    }
}

fn reassemble(
    max_message_size: usize,
    fragments: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let max_message_size =
        NonZeroUsize::new(max_message_size).ok_or("max message size must be non-zero")?;
    let mut buffer = ReassemblyBuffer::new(ReassemblyConfig::new(max_message_size));
    for fragment in fragments {
        let bytes = hex::decode(fragment.trim())?;
        if let Some(message) = buffer.push(&bytes)? {
            println!("{}", message.to_hex());
        }
    }
    if !buffer.is_idle() {
        eprintln!(
            "incomplete message: {} of {} bytes",
            buffer.accumulated_len(),
            u64::from(buffer.declared_length()) + blebridge::HEADER_OVERHEAD as u64
        );
    }
    Ok(())
}

fn split(message_type: u16, mtu: usize, body: &str) -> Result<(), Box<dyn std::error::Error>> {
    let body = hex::decode(body.trim())?;
    for fragment in Fragmenter::new(mtu)?.fragment(message_type, &body)? {
        println!("{}", hex::encode(fragment));
    }
    Ok(())
}
