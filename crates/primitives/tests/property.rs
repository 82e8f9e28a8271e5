use litewallet_primitives::{sha256d, txid_from_raw_hex, OutPoint, Transaction, TxIn, TxOut};

struct Lcg {
    state: u64,
}

impl Lcg {
    fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_mul(6364136223846793005).wrapping_add(1);
        self.state
    }

    fn next_u8(&mut self) -> u8 {
        (self.next_u64() >> 33) as u8
    }

    fn gen_range(&mut self, max: usize) -> usize {
        if max == 0 {
            0
        } else {
            ((self.next_u64() >> 33) % max as u64) as usize
        }
    }
}

fn random_vec(rng: &mut Lcg, max_len: usize) -> Vec<u8> {
    let len = rng.gen_range(max_len + 1);
    (0..len).map(|_| rng.next_u8()).collect()
}

fn random_tx(rng: &mut Lcg) -> Transaction {
    let vin = (0..1 + rng.gen_range(3))
        .map(|_| TxIn {
            prevout: OutPoint {
                hash: std::array::from_fn(|_| rng.next_u8()),
                index: rng.gen_range(8) as u32,
            },
            script_sig: random_vec(rng, 107),
            sequence: 0xffff_ffff,
        })
        .collect();
    let vout = (0..1 + rng.gen_range(3))
        .map(|_| TxOut {
            value: rng.gen_range(1_000_000_000) as i64,
            script_pubkey: random_vec(rng, 25),
        })
        .collect();
    Transaction {
        version: 1,
        vin,
        vout,
        lock_time: 0,
    }
}

#[test]
fn txid_depends_only_on_bytes() {
    let mut rng = Lcg::new(0x5eed);
    for _ in 0..32 {
        let tx = random_tx(&mut rng);
        let bytes = tx.consensus_encode();
        let raw = hex::encode(&bytes);
        assert_eq!(txid_from_raw_hex(&raw).expect("hex"), tx.txid_hex());
        assert_eq!(txid_from_raw_hex(&raw).expect("hex"), tx.txid_hex());
    }
}

#[test]
fn flipping_any_byte_changes_txid() {
    let mut rng = Lcg::new(42);
    let tx = random_tx(&mut rng);
    let bytes = tx.consensus_encode();
    let original = sha256d(&bytes);
    for index in 0..bytes.len() {
        let mut mutated = bytes.clone();
        mutated[index] ^= 0x01;
        assert_ne!(sha256d(&mutated), original, "byte {index}");
    }
}
