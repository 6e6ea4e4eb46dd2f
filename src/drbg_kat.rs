// NIST CAVP CTR_DRBG known-answer files (CTR_DRBG.rsp / CTR_DRBG.txt).
//
// Layout, one section per mechanism:
//
//   [AES-128 no df]
//   [PredictionResistance = False]
//   [EntropyInputLen = 256]
//   ...
//
//   COUNT = 0
//   EntropyInput = ...
//   Nonce =
//   PersonalizationString =
//   EntropyInputReseed = ...        (absent in the "no reseed" file)
//   AdditionalInputReseed =
//   AdditionalInput =               (first generate)
//   AdditionalInput =               (second generate)
//   ReturnedBits = ...
//
// The intermediate-values variant also carries Key = / V = lines after each
// step, each block introduced by a step marker (`** INSTANTIATE:`,
// `** RESEED:`, `** GENERATE (FIRST CALL):`, ...). Markers are skipped; the
// Key/V pairs are kept as checkpoints and compared in order.

use crate::ctr_drbg::CtrDrbg;
use crate::drbg_error::DrbgError;
use crate::drbg_params::KeySize;

#[derive(Debug, thiserror::Error)]
pub enum KatError {
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("line {line}: invalid hex: {source}")]
    Hex {
        line: usize,
        #[source]
        source: hex::FromHexError,
    },
    #[error("COUNT {count}: unsupported case: {reason}")]
    Unsupported { count: u32, reason: String },
    #[error("COUNT {count}: {source}")]
    Drbg {
        count: u32,
        #[source]
        source: DrbgError,
    },
    #[error("COUNT {count}: {stage} mismatch: expected {expected}, got {got}")]
    Mismatch { count: u32, stage: String, expected: String, got: String },
}

/// One test case of a `no df` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KatCase {
    pub key_size: KeySize,
    pub count: u32,
    pub entropy_input: Vec<u8>,
    pub nonce: Vec<u8>,
    pub personalization: Vec<u8>,
    pub entropy_input_reseed: Option<Vec<u8>>,
    pub additional_input_reseed: Vec<u8>,
    pub additional_input: Vec<Vec<u8>>,
    pub returned_bits: Vec<u8>,
    /// (Key, V) after each step, in file order.
    pub checkpoints: Vec<(Vec<u8>, Vec<u8>)>,
}

impl KatCase {
    fn new(key_size: KeySize, count: u32) -> Self {
        Self {
            key_size,
            count,
            entropy_input: Vec::new(),
            nonce: Vec::new(),
            personalization: Vec::new(),
            entropy_input_reseed: None,
            additional_input_reseed: Vec::new(),
            additional_input: Vec::new(),
            returned_bits: Vec::new(),
            checkpoints: Vec::new(),
        }
    }

    /// Replay the case: instantiate, optional reseed, two generates.
    /// Returns the bytes of the second generate.
    pub fn run(&self) -> Result<Vec<u8>, KatError> {
        if !self.nonce.is_empty() {
            return Err(KatError::Unsupported {
                count: self.count,
                reason: "nonce is only used with a derivation function".into(),
            });
        }

        let drbg_err = |source| KatError::Drbg { count: self.count, source };
        let mut checkpoints = self.checkpoints.iter();
        let mut drbg = CtrDrbg::new(self.key_size);

        drbg.instantiate(&self.entropy_input, &self.personalization).map_err(drbg_err)?;
        self.check_state(&drbg, "instantiate", checkpoints.next())?;

        if let Some(entropy) = &self.entropy_input_reseed {
            drbg.reseed(entropy, &self.additional_input_reseed).map_err(drbg_err)?;
            self.check_state(&drbg, "reseed", checkpoints.next())?;
        }

        let len = self.returned_bits.len();
        let adin = |i: usize| self.additional_input.get(i).map(Vec::as_slice).unwrap_or(&[]);

        drbg.generate(len, adin(0)).map_err(drbg_err)?;
        self.check_state(&drbg, "generate 1", checkpoints.next())?;

        let returned = drbg.generate(len, adin(1)).map_err(drbg_err)?;
        self.check_state(&drbg, "generate 2", checkpoints.next())?;

        if returned != self.returned_bits {
            return Err(self.mismatch("ReturnedBits", &self.returned_bits, &returned));
        }
        Ok(returned)
    }

    fn check_state(
        &self,
        drbg: &CtrDrbg,
        stage: &str,
        expected: Option<&(Vec<u8>, Vec<u8>)>,
    ) -> Result<(), KatError> {
        let Some((key, v)) = expected else {
            return Ok(());
        };
        let got_key = drbg.key().unwrap_or_default();
        if got_key != key.as_slice() {
            return Err(self.mismatch(&format!("{stage} Key"), key, got_key));
        }
        let got_v = drbg.v().map(|v| v.as_slice()).unwrap_or_default();
        if got_v != v.as_slice() {
            return Err(self.mismatch(&format!("{stage} V"), v, got_v));
        }
        Ok(())
    }

    fn mismatch(&self, stage: &str, expected: &[u8], got: &[u8]) -> KatError {
        KatError::Mismatch {
            count: self.count,
            stage: stage.to_string(),
            expected: hex::encode(expected),
            got: hex::encode(got),
        }
    }
}

/// Section header `[AES-256 no df]` -> Some((256, no_df)); other brackets -> None.
fn parse_mechanism(inner: &str) -> Option<(usize, bool)> {
    let rest = inner.strip_prefix("AES-")?;
    let (bits, mode) = rest.split_once(' ')?;
    let bits = bits.parse().ok()?;
    Some((bits, mode.trim() == "no df"))
}

/// Collect every case of the `[AES-<bits> no df]` sections for `key_size`.
///
/// Sections for other key sizes, `use df` sections, other block ciphers and
/// prediction-resistance sections are skipped.
pub fn parse_vectors(text: &str, key_size: KeySize) -> Result<Vec<KatCase>, KatError> {
    let mut cases = Vec::new();
    let mut current: Option<KatCase> = None;
    let mut active = false;
    let mut pending_key: Option<Vec<u8>> = None;

    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with("**") {
            continue;
        }

        if let Some(inner) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            if let Some((bits, no_df)) = parse_mechanism(inner) {
                cases.extend(current.take());
                active = bits == key_size.bits() && no_df;
            } else if inner.starts_with("AES-") || inner.ends_with(" df") {
                cases.extend(current.take());
                active = false;
            } else if inner.replace(' ', "") == "PredictionResistance=True" {
                cases.extend(current.take());
                active = false;
            }
            continue;
        }

        if !active {
            continue;
        }

        let Some((name, value)) = line.split_once('=') else {
            return Err(KatError::Parse { line: line_no, message: format!("expected `name = value`, got `{line}`") });
        };
        let (name, value) = (name.trim(), value.trim());

        if name == "COUNT" {
            cases.extend(current.take());
            let count = value.parse().map_err(|_| KatError::Parse {
                line: line_no,
                message: format!("invalid COUNT `{value}`"),
            })?;
            current = Some(KatCase::new(key_size, count));
            pending_key = None;
            continue;
        }

        let Some(case) = current.as_mut() else {
            return Err(KatError::Parse { line: line_no, message: format!("`{name}` before COUNT") });
        };
        let bytes = hex::decode(value).map_err(|source| KatError::Hex { line: line_no, source })?;

        match name {
            "EntropyInput" => case.entropy_input = bytes,
            "Nonce" => case.nonce = bytes,
            "PersonalizationString" => case.personalization = bytes,
            "EntropyInputReseed" => case.entropy_input_reseed = Some(bytes),
            "AdditionalInputReseed" => case.additional_input_reseed = bytes,
            "AdditionalInput" => case.additional_input.push(bytes),
            "ReturnedBits" => case.returned_bits = bytes,
            "Key" => pending_key = Some(bytes),
            "V" => {
                let Some(key) = pending_key.take() else {
                    return Err(KatError::Parse { line: line_no, message: "`V` without preceding `Key`".into() });
                };
                case.checkpoints.push((key, bytes));
            }
            // fields of other DRBG flavours carry nothing this runner needs
            _ => {}
        }
    }
    cases.extend(current.take());
    Ok(cases)
}

/// Run every case, stopping at the first failure. Returns the number run.
pub fn run_all(cases: &[KatCase]) -> Result<usize, KatError> {
    for case in cases {
        case.run()?;
    }
    Ok(cases.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Layout of drbgvectors_pr_false/CTR_DRBG.txt (intermediate values).
    // AES-128 COUNT 0 and AES-256 COUNT 2 are published CAVP cases; AES-256
    // COUNT 3 adds personalization and additional input.
    const VECTORS: &str = "\
# CTR_DRBG intermediate values

[AES-128 use df]
[PredictionResistance = False]

COUNT = 0
EntropyInput = 00
Nonce = 0102

[AES-128 no df]
[PredictionResistance = False]
[EntropyInputLen = 256]
[NonceLen = 0]
[PersonalizationStringLen = 0]
[AdditionalInputLen = 0]
[ReturnedBitsLen = 512]

COUNT = 0
EntropyInput = ed1e7f21ef66ea5d8e2a85b9337245445b71d6393a4eecb0e63c193d0f72f9a9
Nonce = 
PersonalizationString = 
** INSTANTIATE:
\tKey = b5fc83ef1518da3cb85598ee9795001e
\tV   = 58f90cf75af84f221514db847ec007d1
EntropyInputReseed = 303fb519f0a4e17d6df0b6426aa0ecb2a36079bd48be47ad2a8dbfe48da3efad
AdditionalInputReseed = 
** RESEED:
\tKey = 577a79cc512258c3e255fcf3f4cf0c1a
\tV   = 531599fd616f33678192928bf771bb2b
AdditionalInput = 
** GENERATE (FIRST CALL):
\tKey = ac373fb3773597b0d6cb6f37e6b59293
\tV   = cd9bf115d35c60cbf7f2ebac8e43f53b
AdditionalInput = 
ReturnedBits = f80111d08e874672f32f42997133a5210f7a9375e22cea70587f9cfafebe0f6a6aa2eb68e7dd9164536d53fa020fcab20f54caddfab7d6d91e5ffec1dfd8deaa
** GENERATE (SECOND CALL):
\tKey = 964c57946a104aa93fc3c2137bb9bc11
\tV   = 9d58008033ac007c9ead254bfa8de2b6

[AES-256 no df]
[PredictionResistance = False]
[EntropyInputLen = 384]
[NonceLen = 0]
[PersonalizationStringLen = 0]
[AdditionalInputLen = 0]
[ReturnedBitsLen = 512]

COUNT = 2
EntropyInput = 0217a8acf2f8e2c4ab7bdcd5a694bca28d038018869dcbe2160d1ce0b4c78ead5592efed98662f2dff87f32f4835c677
Nonce =
PersonalizationString =
** INSTANTIATE:
\tKey = 5118225735bdd47d02186824625fcf2943a4c025cbfda08c1143d9330e3413b5
\tV   = 27f2ec27afc005592e2506a13d33f3f9
AdditionalInput =
** GENERATE (FIRST CALL):
\tKey = 8921a58fe74ebbaf81c0e2441bf56a110e74bf47339badbf68791467bf24a2c9
\tV   = ec255695174809d82bc333993fe38856
AdditionalInput =
** GENERATE (SECOND CALL):
\tKey = 29a7babeda561bc30e8eaad7071efde51aa611ab42e9676afef6ad25851c4b82
\tV   = 981f260a2e69d260d0ddcd941af035fa
ReturnedBits = aa36779726f52875312507fb084744d4d7f3f9468a5b246ccde316d2ab91879c2e29f5a0938a3bcd722bb718d01bbfc35831c9e64f5b6410ae908d3061f76c84

COUNT = 3
EntropyInput = 000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f202122232425262728292a2b2c2d2e2f
Nonce =
PersonalizationString = 706572736f6e616c697a6174696f6e
AdditionalInput = 6164646974696f6e616c20696e707574
AdditionalInput =
ReturnedBits = 7781cfbb94dcec34f8589981cd7253b6

[PredictionResistance = True]

COUNT = 0
EntropyInput = 00
EntropyInputPR = 01
";

    #[test]
    fn parses_only_matching_no_df_sections() {
        let aes128 = parse_vectors(VECTORS, KeySize::Aes128).unwrap();
        assert_eq!(aes128.len(), 1);
        assert_eq!(aes128[0].checkpoints.len(), 4);
        assert!(aes128[0].entropy_input_reseed.is_some());
        assert_eq!(aes128[0].additional_input, vec![Vec::<u8>::new(), Vec::new()]);

        let aes256 = parse_vectors(VECTORS, KeySize::Aes256).unwrap();
        assert_eq!(aes256.iter().map(|c| c.count).collect::<Vec<_>>(), vec![2, 3]);
        assert!(aes256[0].entropy_input_reseed.is_none());
        assert_eq!(aes256[1].personalization, b"personalization");

        assert!(parse_vectors(VECTORS, KeySize::Aes192).unwrap().is_empty());
    }

    #[test]
    fn nist_and_fixed_cases_pass() {
        for key_size in [KeySize::Aes128, KeySize::Aes256] {
            let cases = parse_vectors(VECTORS, key_size).unwrap();
            assert_eq!(run_all(&cases).unwrap(), cases.len());
        }
    }

    #[test]
    fn step_markers_and_padded_fields_are_accepted() {
        let text = "[AES-128 no df]\n\
                    COUNT = 0\n\
                    EntropyInput = ed1e7f21ef66ea5d8e2a85b9337245445b71d6393a4eecb0e63c193d0f72f9a9\n\
                    Nonce = \n\
                    PersonalizationString = \n\
                    ** INSTANTIATE:\n\
                    \tKey = b5fc83ef1518da3cb85598ee9795001e\n\
                    \tV   = 58f90cf75af84f221514db847ec007d1\n";
        let cases = parse_vectors(text, KeySize::Aes128).unwrap();
        assert_eq!(cases.len(), 1);
        assert_eq!(
            cases[0].checkpoints,
            vec![(hex::decode("b5fc83ef1518da3cb85598ee9795001e").unwrap(),
                  hex::decode("58f90cf75af84f221514db847ec007d1").unwrap())]
        );
    }

    // drbgvectors_pr_false, CTR_DRBG.txt, [AES-128 no df] COUNT = 0:
    // instantiate, reseed, two 64-byte generates.
    #[test]
    fn published_aes128_reseed_case() {
        let cases = parse_vectors(VECTORS, KeySize::Aes128).unwrap();
        let case = &cases[0];
        assert_eq!(case.count, 0);
        assert_eq!(case.checkpoints.len(), 4);
        assert_eq!(case.returned_bits.len(), 64);
        assert_eq!(case.run().unwrap(), case.returned_bits);
    }

    // Drop drbgvectors_pr_false/CTR_DRBG.txt under kat/ to replay every
    // published no df case.
    #[test]
    fn full_vector_file_when_present() {
        let path = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("kat/CTR_DRBG.txt");
        let Ok(text) = std::fs::read_to_string(&path) else {
            return;
        };
        for key_size in KeySize::ALL {
            let cases = parse_vectors(&text, key_size).unwrap();
            assert!(!cases.is_empty(), "no AES-{} no df cases", key_size.bits());
            run_all(&cases).unwrap();
        }
    }

    #[test]
    fn tampered_returned_bits_are_reported() {
        let mut cases = parse_vectors(VECTORS, KeySize::Aes256).unwrap();
        cases[0].returned_bits[0] ^= 1;
        match cases[0].run() {
            Err(KatError::Mismatch { count, stage, .. }) => {
                assert_eq!(count, 2);
                assert_eq!(stage, "ReturnedBits");
            }
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn tampered_checkpoint_names_the_step() {
        let mut cases = parse_vectors(VECTORS, KeySize::Aes128).unwrap();
        cases[0].checkpoints[1].1[15] ^= 0x80;
        match cases[0].run() {
            Err(KatError::Mismatch { stage, .. }) => assert_eq!(stage, "reseed V"),
            other => panic!("expected mismatch, got {other:?}"),
        }
    }

    #[test]
    fn nonce_is_rejected() {
        let text = "[AES-128 no df]\nCOUNT = 0\nEntropyInput = 00\nNonce = 01\nReturnedBits = 00\n";
        let cases = parse_vectors(text, KeySize::Aes128).unwrap();
        assert!(matches!(cases[0].run(), Err(KatError::Unsupported { count: 0, .. })));
    }

    #[test]
    fn wrong_entropy_length_is_a_drbg_error() {
        let text = "[AES-128 no df]\nCOUNT = 7\nEntropyInput = 0011\nReturnedBits = 00\n";
        let cases = parse_vectors(text, KeySize::Aes128).unwrap();
        assert!(matches!(
            cases[0].run(),
            Err(KatError::Drbg { count: 7, source: DrbgError::InvalidEntropyLength { expected: 32, got: 2 } })
        ));
    }

    #[test]
    fn malformed_lines_are_reported_with_line_numbers() {
        let bad_hex = "[AES-128 no df]\nCOUNT = 0\nEntropyInput = zz\n";
        assert!(matches!(parse_vectors(bad_hex, KeySize::Aes128), Err(KatError::Hex { line: 3, .. })));

        let no_count = "[AES-128 no df]\nEntropyInput = 00\n";
        assert!(matches!(parse_vectors(no_count, KeySize::Aes128), Err(KatError::Parse { line: 2, .. })));

        let orphan_v = "[AES-128 no df]\nCOUNT = 0\nV = 00\n";
        assert!(matches!(parse_vectors(orphan_v, KeySize::Aes128), Err(KatError::Parse { line: 3, .. })));

        let stray = "[AES-128 no df]\nCOUNT = 0\nINSTANTIATE\n";
        assert!(matches!(parse_vectors(stray, KeySize::Aes128), Err(KatError::Parse { line: 3, .. })));
    }
}
