//! Hex dump of a mapped file region.
//!
//! Usage: `dump <file> <mode> <length> <offset>`
//!
//! The numbers accept decimal, `0x` hexadecimal and leading-`0` octal. A bare
//! `0x` reads as 0, as `strtoul` does; trailing garbage is an error.

use std::io::{self, BufWriter, Write};

use anyhow::{bail, Context, Result};
use mmap_pages::{acquire, open};

fn parse_number(text: &str) -> Result<usize> {
    let parsed = if let Some(hex) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        if hex.is_empty() {
            return Ok(0);
        }
        usize::from_str_radix(hex, 16)
    } else if text.len() > 1 && text.starts_with('0') {
        usize::from_str_radix(&text[1..], 8)
    } else {
        text.parse()
    };
    parsed.with_context(|| format!("invalid number '{text}'"))
}

fn write_dump<W: Write>(out: &mut W, bytes: &[u8]) -> io::Result<()> {
    for (line, chunk) in bytes.chunks(16).enumerate() {
        if line > 0 {
            writeln!(out)?;
        }
        write!(out, "{:4x}:", line * 16)?;
        for j in 0..16 {
            if j % 4 == 0 {
                write!(out, " ")?;
            }
            match chunk.get(j) {
                Some(b) => write!(out, "{b:02x}")?,
                None => write!(out, "  ")?,
            }
        }
        write!(out, " | ")?;
        for j in 0..16 {
            let ch = match chunk.get(j) {
                Some(&b) if (0x20..0x7f).contains(&b) => char::from(b),
                Some(_) => '.',
                None => ' ',
            };
            write!(out, "{ch}")?;
        }
    }
    writeln!(out)
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 5 {
        bail!("usage: dump (file) (mode) (length) (offset)");
    }
    let fname = &args[1];
    let length = parse_number(&args[3])?;
    let offset = parse_number(&args[4])?;

    let mapping = open(fname, &args[2], length, offset)
        .with_context(|| format!("failed to open file '{fname}'"))?;
    let page = acquire(&mapping, mapping.len(), 0)
        .with_context(|| format!("failed to map file '{fname}'"))?;

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_dump(&mut out, page.as_slice())?;
    out.flush()?;
    Ok(())
}
