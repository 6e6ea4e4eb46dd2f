// Checks a NIST CAVP CTR_DRBG vector file (CTR_DRBG.rsp, no df sections)
// against this implementation, one key size at a time.

use std::error::Error;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

use ctr_drbg::{parse_vectors, KeySize};

#[derive(Parser)]
#[command(name = "ctr_drbg_check_rsp", version, about = "Replay CAVP CTR_DRBG known-answer vectors")]
struct Cli {
    /// AES key size in bits (128, 192 or 256); all three when omitted
    #[arg(short, long)]
    key_bits: Option<usize>,

    /// Vector file
    #[arg(default_value = "kat/CTR_DRBG.txt")]
    file: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    let txt = fs::read_to_string(&cli.file)
        .map_err(|e| format!("cannot read {}: {e}", cli.file.display()))?;

    let key_sizes = match cli.key_bits {
        Some(bits) => vec![KeySize::from_bits(bits)?],
        None => KeySize::ALL.to_vec(),
    };

    let mut total = 0usize;
    for key_size in key_sizes {
        let cases = parse_vectors(&txt, key_size)?;
        for case in &cases {
            case.run()?;
        }
        println!("AES-{} no df: {} cases OK", key_size.bits(), cases.len());
        total += cases.len();
    }

    if total == 0 {
        return Err(format!("no matching no df cases in {}", cli.file.display()).into());
    }
    println!("{total} cases OK");
    Ok(())
}
