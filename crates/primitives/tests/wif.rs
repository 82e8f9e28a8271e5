use litewallet_consensus::{chain_params, Currency, Network};
use litewallet_primitives::{secret_key_to_wif, wif_to_secret_key, AddressError};

#[test]
fn wif_roundtrips_doge_mainnet() {
    let params = chain_params(Currency::Doge, Network::Mainnet);
    let secret = [0x11u8; 32];

    let wif = secret_key_to_wif(&secret, &params, true);
    assert!(wif.starts_with('Q'), "dogecoin compressed WIF starts with Q: {wif}");
    let (decoded, compressed) = wif_to_secret_key(&wif, &params).expect("decode wif");
    assert_eq!(decoded, secret);
    assert!(compressed);

    let wif = secret_key_to_wif(&secret, &params, false);
    let (decoded, compressed) = wif_to_secret_key(&wif, &params).expect("decode wif");
    assert_eq!(decoded, secret);
    assert!(!compressed);
}

#[test]
fn bitcoin_wif_vector() {
    let params = chain_params(Currency::Bitcoin, Network::Mainnet);
    let mut secret = [0u8; 32];
    secret[31] = 1;
    assert_eq!(
        secret_key_to_wif(&secret, &params, true),
        "KwDiBf89QgGbjEhKnhXJuH7LrciVrZi3qYjgd9M7rFU73sVHnoWn"
    );
}

#[test]
fn wif_rejects_wrong_currency() {
    let doge = chain_params(Currency::Doge, Network::Mainnet);
    let btc = chain_params(Currency::Bitcoin, Network::Mainnet);
    let wif = secret_key_to_wif(&[0x33u8; 32], &doge, true);
    let err = wif_to_secret_key(&wif, &btc).unwrap_err();
    assert!(matches!(err, AddressError::UnknownPrefix));
}
