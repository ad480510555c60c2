//! Positional record decoding.
//!
//! The contract returns records as bare arrays; what each slot means is fixed
//! by the contract's ABI order, captured in the field tables below.

use super::stack::{decode, DecodedValue, StackItem};
use crate::error::CoreError;
use serde::Serialize;

pub const DAO_SUMMARY_FIELDS: [&str; 5] = [
    "id",
    "proposalDeposit",
    "processingReward",
    "displayName",
    "membershipFee",
];

pub const PROPOSAL_SUMMARY_FIELDS: [&str; 7] = [
    "id",
    "details",
    "lootRequested",
    "paymentRequested",
    "sharesRequested",
    "tributeOffered",
    "neofsCompoundIdPairs",
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaoSummary {
    pub id: DecodedValue,
    pub proposal_deposit: DecodedValue,
    pub processing_reward: DecodedValue,
    pub display_name: DecodedValue,
    pub membership_fee: DecodedValue,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProposalSummary {
    pub id: DecodedValue,
    pub details: DecodedValue,
    pub loot_requested: DecodedValue,
    pub payment_requested: DecodedValue,
    pub shares_requested: DecodedValue,
    pub tribute_offered: DecodedValue,
    pub neofs_compound_id_pairs: DecodedValue,
}

pub fn decode_dao_summary(node: &StackItem) -> Result<DaoSummary, CoreError> {
    let [id, proposal_deposit, processing_reward, display_name, membership_fee] =
        decode_positional("DAO summary", node, &DAO_SUMMARY_FIELDS)?;
    Ok(DaoSummary {
        id,
        proposal_deposit,
        processing_reward,
        display_name,
        membership_fee,
    })
}

pub fn decode_proposal_summary(node: &StackItem) -> Result<ProposalSummary, CoreError> {
    let [id, details, loot_requested, payment_requested, shares_requested, tribute_offered, neofs_compound_id_pairs] =
        decode_positional("proposal summary", node, &PROPOSAL_SUMMARY_FIELDS)?;
    Ok(ProposalSummary {
        id,
        details,
        loot_requested,
        payment_requested,
        shares_requested,
        tribute_offered,
        neofs_compound_id_pairs,
    })
}

pub fn decode_dao_list(stack: &[StackItem]) -> Result<Vec<DaoSummary>, CoreError> {
    record_nodes("DAO list", stack)?
        .iter()
        .map(decode_dao_summary)
        .collect()
}

pub fn decode_proposal_list(stack: &[StackItem]) -> Result<Vec<ProposalSummary>, CoreError> {
    record_nodes("proposal list", stack)?
        .iter()
        .map(decode_proposal_summary)
        .collect()
}

/// The single record returned by a getter call: the first stack element.
pub fn first_on_stack<'a>(record: &str, stack: &'a [StackItem]) -> Result<&'a StackItem, CoreError> {
    stack
        .first()
        .ok_or_else(|| CoreError::SchemaMismatch(format!("{}: empty result stack", record)))
}

/// A list result is one Array node on the stack whose children are the records.
fn record_nodes<'a>(record: &str, stack: &'a [StackItem]) -> Result<&'a [StackItem], CoreError> {
    match first_on_stack(record, stack)? {
        StackItem::Array(items) => Ok(items),
        other => Err(CoreError::SchemaMismatch(format!(
            "{}: expected Array on stack, got {}",
            record,
            other.kind()
        ))),
    }
}

fn decode_positional<const K: usize>(
    record: &str,
    node: &StackItem,
    fields: &[&'static str; K],
) -> Result<[DecodedValue; K], CoreError> {
    let StackItem::Array(items) = node else {
        return Err(CoreError::SchemaMismatch(format!(
            "{}: expected Array, got {}",
            record,
            node.kind()
        )));
    };
    if items.len() != K {
        return Err(CoreError::SchemaMismatch(format!(
            "{}: expected {} fields ({}), got {}",
            record,
            K,
            fields.join(", "),
            items.len()
        )));
    }

    let mut values = Vec::with_capacity(K);
    for (item, field) in items.iter().zip(fields) {
        let value = decode(item).map_err(|e| {
            CoreError::MalformedRpcValue(format!("{} field '{}': {}", record, field, e))
        })?;
        values.push(value);
    }
    values
        .try_into()
        .map_err(|_| CoreError::SchemaMismatch(format!("{}: field count changed", record)))
}
