//! Calldata builders and return-data decoders for the contracts the engine
//! talks to.

use super::{ChainError, PoolStateRecord, VestingTotals};
use crate::abi::{encode_address, encode_call, selector, Words};
use crate::domain::{Address, Amount, PoolId, PoolKey};

pub const GET_VESTING_DATA_OF: &str = "getVestingDataOf(address)";
pub const GET_POOL_STATE: &str = "getPoolState(address)";
pub const COLLECT_FEES: &str = "collectFees(bytes32)";

pub fn encode_get_vesting_data_of(account: &Address) -> Vec<u8> {
    encode_call(selector(GET_VESTING_DATA_OF), &[encode_address(account)])
}

/// `(uint256 total, uint256 released)`
pub fn decode_vesting_data(data: &[u8]) -> Result<VestingTotals, ChainError> {
    let words = Words::new(data, 2)?;
    Ok(VestingTotals {
        total: Amount::from_raw(words.uint(0)?)?,
        released: Amount::from_raw(words.uint(1)?)?,
    })
}

pub fn encode_get_pool_state(asset: &Address) -> Vec<u8> {
    encode_call(selector(GET_POOL_STATE), &[encode_address(asset)])
}

/// `(address numeraire, uint8 status, PoolKey key, int24 farTick)` with the
/// static `PoolKey` struct laid out inline.
pub fn decode_pool_state(data: &[u8]) -> Result<PoolStateRecord, ChainError> {
    let words = Words::new(data, 8)?;
    Ok(PoolStateRecord {
        numeraire: words.address(0)?,
        status_code: words.uint8(1)?,
        key: PoolKey {
            currency0: words.address(2)?,
            currency1: words.address(3)?,
            fee: words.uint24(4)?,
            tick_spacing: words.int24(5)?,
            hooks: words.address(6)?,
        },
        far_tick: words.int24(7)?,
    })
}

pub fn encode_collect_fees(pool_id: &PoolId) -> Vec<u8> {
    encode_call(selector(COLLECT_FEES), &[*pool_id.as_bytes()])
}

/// Pool id targeted by `collectFees` calldata, if `data` is such a call.
pub fn decode_collect_fees_target(data: &[u8]) -> Option<PoolId> {
    if data.len() != 36 || data[..4] != selector(COLLECT_FEES) {
        return None;
    }
    let mut id = [0u8; 32];
    id.copy_from_slice(&data[4..]);
    Some(PoolId(id))
}

/// ABI return data for `getPoolState`, used by test doubles.
pub fn encode_pool_state(record: &PoolStateRecord) -> Vec<u8> {
    use crate::abi::{encode_int, encode_uint};
    let words = [
        encode_address(&record.numeraire),
        encode_uint(u128::from(record.status_code)),
        encode_address(&record.key.currency0),
        encode_address(&record.key.currency1),
        encode_uint(u128::from(record.key.fee)),
        encode_int(i64::from(record.key.tick_spacing)),
        encode_address(&record.key.hooks),
        encode_int(i64::from(record.far_tick)),
    ];
    words.concat()
}
