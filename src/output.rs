use crate::rpc::stack::DecodedValue;
use crate::rpc::summary::{DaoSummary, ProposalSummary};
use crate::types::{ApiEnvelope, PriceDetail};
use anyhow::{Context, Result};
use serde::Serialize;

pub fn print_price_table(details: &[&PriceDetail]) {
    println!(
        "\n{:<10} {:<18} {:<10} {:<16} {}",
        "Symbol", "Price", "Currency", "Source", "Fetched at"
    );
    println!("{}", "-".repeat(80));
    for d in details {
        println!(
            "{:<10} {:<18.8} {:<10} {:<16} {}",
            d.asset_symbol(),
            d.asset_price(),
            d.denominated_in_currency(),
            d.source_api_id(),
            d.fetched_at().to_rfc3339()
        );
    }
    println!();
}

pub fn print_dao_table(daos: &[DaoSummary]) {
    println!(
        "\n{:<8} {:<24} {:<18} {:<18} {}",
        "Id", "Name", "Deposit", "Reward", "Membership fee"
    );
    println!("{}", "-".repeat(90));
    for d in daos {
        println!(
            "{:<8} {:<24} {:<18} {:<18} {}",
            cell(&d.id),
            cell(&d.display_name),
            cell(&d.proposal_deposit),
            cell(&d.processing_reward),
            cell(&d.membership_fee)
        );
    }
    println!();
}

pub fn print_proposal_table(proposals: &[ProposalSummary]) {
    println!(
        "\n{:<8} {:<32} {:<10} {:<12} {:<10} {}",
        "Id", "Details", "Loot", "Payment", "Shares", "Tribute"
    );
    println!("{}", "-".repeat(90));
    for p in proposals {
        println!(
            "{:<8} {:<32} {:<10} {:<12} {:<10} {}",
            cell(&p.id),
            cell(&p.details),
            cell(&p.loot_requested),
            cell(&p.payment_requested),
            cell(&p.shares_requested),
            cell(&p.tribute_offered)
        );
    }
    println!();
}

fn cell(value: &DecodedValue) -> String {
    match value {
        DecodedValue::Null => "-".to_string(),
        DecodedValue::Boolean(b) => b.to_string(),
        DecodedValue::Text(s) => s.clone(),
        DecodedValue::Bytes(bytes) => format!("0x{}", hex::encode(bytes)),
        DecodedValue::Items(items) => format!("[{} item(s)]", items.len()),
        DecodedValue::Entries(entries) => format!("{{{} entr(ies)}}", entries.len()),
    }
}

pub fn print_json<T: Serialize>(envelope: &ApiEnvelope<T>) -> Result<()> {
    let json = serde_json::to_string_pretty(envelope).context("serializing response envelope")?;
    println!("{}", json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rpc::stack::StackItem;

    #[test]
    fn cells_render_each_decoded_kind() {
        assert_eq!(cell(&DecodedValue::Null), "-");
        assert_eq!(cell(&DecodedValue::Text("MyDao".to_string())), "MyDao");
        assert_eq!(cell(&DecodedValue::Bytes(vec![0xab, 0x01])), "0xab01");
        assert_eq!(
            cell(&DecodedValue::Items(vec![StackItem::Any, StackItem::Any])),
            "[2 item(s)]"
        );
    }
}
