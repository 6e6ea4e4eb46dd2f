// Prints the working state and output of a CTR_DRBG run, step by step,
// for comparing against other implementations.

use std::error::Error;

use clap::Parser;

use ctr_drbg::{CtrDrbg, KeySize};

#[derive(Parser)]
#[command(name = "drbg_dump", version, about = "Dump CTR_DRBG state transitions")]
struct Cli {
    /// AES key size in bits
    #[arg(short, long, default_value_t = 256)]
    key_bits: usize,

    /// Entropy input, hex, exactly seed_len bytes
    #[arg(short, long)]
    entropy: String,

    /// Personalization string, hex
    #[arg(short, long, default_value = "")]
    personalization: String,

    /// Entropy input for a reseed before generating, hex
    #[arg(long)]
    reseed: Option<String>,

    /// Additional input for every generate, hex
    #[arg(short, long, default_value = "")]
    additional_input: String,

    /// Bytes per generate
    #[arg(short, long, default_value_t = 32)]
    bytes: usize,

    /// Number of generate calls
    #[arg(short, long, default_value_t = 3)]
    rounds: usize,
}

fn print_state(label: &str, drbg: &CtrDrbg) {
    println!("{label}:");
    println!("  Key = {}", hex::encode(drbg.key().unwrap_or_default()));
    println!("  V   = {}", hex::encode(drbg.v().map(|v| v.as_slice()).unwrap_or_default()));
    if let Some(counter) = drbg.reseed_counter() {
        println!("  reseed_counter = {counter}");
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let key_size = KeySize::from_bits(cli.key_bits)?;
    let entropy = hex::decode(cli.entropy.trim())?;
    let personalization = hex::decode(cli.personalization.trim())?;
    let additional_input = hex::decode(cli.additional_input.trim())?;

    let mut drbg = CtrDrbg::new(key_size);
    drbg.instantiate(&entropy, &personalization)?;
    print_state("instantiate", &drbg);

    if let Some(reseed) = &cli.reseed {
        drbg.reseed(&hex::decode(reseed.trim())?, &[])?;
        print_state("reseed", &drbg);
    }

    for round in 1..=cli.rounds {
        let out = drbg.generate(cli.bytes, &additional_input)?;
        println!("out[{round}] ({} bytes) = {}", out.len(), hex::encode(&out));
        print_state(&format!("generate {round}"), &drbg);
    }

    drbg.uninstantiate();
    Ok(())
}
