// Decodes a compiled parts file and prints its records, one per line.
// Usage: cargo run --bin read_blueprint -- path/to/out.txt

use std::env;
use std::fs;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().collect();
    if args.len() != 2 {
        eprintln!("usage: read_blueprint <file>");
        std::process::exit(2);
    }
    let encoded = fs::read_to_string(&args[1])?;
    let json = STANDARD.decode(encoded.trim())?;
    let records: Vec<serde_json::Value> = serde_json::from_slice(&json)?;

    for (i, record) in records.iter().enumerate() {
        println!("#{:<4} {}", i + 1, record);
    }
    Ok(())
}
