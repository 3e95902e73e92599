//! Deterministic pool identifiers.
//!
//! The identifier is `keccak256(abi.encode(currency0, currency1, fee,
//! tickSpacing, hooks))`, i.e. the id the pool manager itself assigns. The
//! field order and word layout are part of the claim contract: fee claims are
//! addressed by this value, so changing the encoding would retarget claims.

use crate::abi::{encode_address, encode_int, encode_uint, keccak256};
use crate::domain::{PoolId, PoolKey};

/// Canonical 160-byte encoding of a pool key.
pub fn encode_pool_key(key: &PoolKey) -> [u8; 160] {
    let words = [
        encode_address(&key.currency0),
        encode_address(&key.currency1),
        encode_uint(u128::from(key.fee)),
        encode_int(i64::from(key.tick_spacing)),
        encode_address(&key.hooks),
    ];
    let mut out = [0u8; 160];
    for (i, word) in words.iter().enumerate() {
        out[i * 32..(i + 1) * 32].copy_from_slice(word);
    }
    out
}

/// Derive the pool identifier for a key. Pure; equal keys give equal ids.
pub fn derive_pool_id(key: &PoolKey) -> PoolId {
    PoolId(keccak256(&encode_pool_key(key)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Address;

    fn addr(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    fn sample_key() -> PoolKey {
        PoolKey {
            currency0: addr("0x0000000000000000000000000000000000000000"),
            currency1: addr("0x4200000000000000000000000000000000000006"),
            fee: 3000,
            tick_spacing: 60,
            hooks: addr("0x0000000000000000000000000000000000000000"),
        }
    }

    #[test]
    fn test_equal_keys_built_separately_share_id() {
        let a = sample_key();
        let b = PoolKey {
            hooks: addr("0x0000000000000000000000000000000000000000"),
            tick_spacing: 60,
            fee: 3000,
            currency1: addr("0x4200000000000000000000000000000000000006"),
            currency0: addr("0x0000000000000000000000000000000000000000"),
        };
        assert_eq!(derive_pool_id(&a), derive_pool_id(&b));
        assert_eq!(derive_pool_id(&a), derive_pool_id(&a.clone()));
    }

    #[test]
    fn test_address_case_does_not_change_id() {
        let mut lower = sample_key();
        lower.hooks = addr("0xabcdefabcdefabcdefabcdefabcdefabcdefabcd");
        let mut upper = sample_key();
        upper.hooks = addr("0xABCDEFABCDEFABCDEFABCDEFABCDEFABCDEFABCD");
        assert_eq!(derive_pool_id(&lower), derive_pool_id(&upper));
    }

    #[test]
    fn test_single_field_perturbation_changes_id() {
        let base = derive_pool_id(&sample_key());

        let mut k = sample_key();
        k.fee += 1;
        assert_ne!(derive_pool_id(&k), base);

        let mut k = sample_key();
        k.tick_spacing = -60;
        assert_ne!(derive_pool_id(&k), base);

        let mut k = sample_key();
        k.hooks = addr("0x0000000000000000000000000000000000000001");
        assert_ne!(derive_pool_id(&k), base);

        let mut k = sample_key();
        std::mem::swap(&mut k.currency0, &mut k.currency1);
        assert_ne!(derive_pool_id(&k), base);
    }

    #[test]
    fn test_encoding_layout_is_fixed() {
        let encoded = encode_pool_key(&sample_key());
        // currency1 occupies word 1, right-aligned.
        assert_eq!(encoded[32 + 12], 0x42);
        assert_eq!(encoded[63], 0x06);
        // fee 3000 = 0x0bb8 at the end of word 2.
        assert_eq!(&encoded[94..96], &[0x0b, 0xb8]);
        // tickSpacing 60 at the end of word 3.
        assert_eq!(encoded[127], 60);
        assert!(encoded[128..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_negative_tick_spacing_is_sign_extended() {
        let mut k = sample_key();
        k.tick_spacing = -1;
        let encoded = encode_pool_key(&k);
        assert!(encoded[96..128].iter().all(|b| *b == 0xff));
    }
}
