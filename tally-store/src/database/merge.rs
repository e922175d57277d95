use rocksdb::MergeOperands;

use super::columns::Buckets;

pub const MERGE_OPERATOR_NAME: &str = "tally_saturating_add";

/// Associative merge operator of the buckets column.
///
/// Returning `None` marks the merge as failed which rocksdb reports as
/// corruption on the read that triggered it.
pub fn saturating_add(
    _key: &[u8],
    existing: Option<&[u8]>,
    operands: &MergeOperands,
) -> Option<Vec<u8>> {
    let mut total = match existing {
        Some(value) => Buckets::decode_value(value).ok()?,
        None => 0,
    };
    for operand in operands.iter() {
        total = total.saturating_add(Buckets::decode_value(operand).ok()?);
    }
    Some(Buckets::encode_value(total).to_vec())
}
