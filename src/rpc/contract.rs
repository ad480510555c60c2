use super::bridge::{ContractInvoker, ContractParam};
use super::stack::StackItem;
use super::summary::{
    decode_dao_list, decode_dao_summary, decode_proposal_list, first_on_stack, DaoSummary,
    ProposalSummary,
};
use crate::error::ContractCallError;
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

pub const LIST_DAOS: &str = "listDaos";
pub const GET_DAO: &str = "getDao";
pub const LIST_PROPOSALS: &str = "listProposals";

pub struct ContractConfig {
    pub rpc_url: String,
    pub script_hash: String,
    /// Account sent as the invocation signer, if any.
    pub signer: Option<String>,
}

impl ContractConfig {
    pub fn from_env() -> Result<Self> {
        let rpc_url =
            std::env::var("NEO_RPC_URL").unwrap_or_else(|_| "http://localhost:10332".to_string());

        let script_hash = std::env::var("NEODAO_CONTRACT_HASH")
            .context("NEODAO_CONTRACT_HASH must be set for contract calls")?;
        validate_script_hash(&script_hash)?;

        let signer = std::env::var("NEODAO_SIGNER_ACCOUNT").ok();
        if let Some(account) = &signer {
            validate_script_hash(account).context("NEODAO_SIGNER_ACCOUNT")?;
        }

        Ok(Self {
            rpc_url,
            script_hash,
            signer,
        })
    }
}

/// `0x` followed by 40 hex digits.
fn validate_script_hash(hash: &str) -> Result<()> {
    let digits = hash
        .strip_prefix("0x")
        .with_context(|| format!("contract hash '{}' must start with 0x", hash))?;
    let bytes = hex::decode(digits).with_context(|| format!("contract hash '{}' is not hex", hash))?;
    if bytes.len() != 20 {
        anyhow::bail!("contract hash '{}' must be 20 bytes, got {}", hash, bytes.len());
    }
    Ok(())
}

/// Typed calls on the Neodao contract.
pub struct NeodaoContract {
    invoker: Arc<dyn ContractInvoker>,
}

impl NeodaoContract {
    pub fn new(invoker: Arc<dyn ContractInvoker>) -> Self {
        Self { invoker }
    }

    async fn call(
        &self,
        method: &str,
        params: &[ContractParam],
    ) -> Result<Vec<StackItem>, ContractCallError> {
        let result = self.invoker.invoke(method, params).await?;
        result.ensure_halted(method)?;
        info!("[contract] {} consumed {} gas", method, result.gas_consumed);
        Ok(result.stack_items()?)
    }

    pub async fn list_daos(&self) -> Result<Vec<DaoSummary>, ContractCallError> {
        let stack = self.call(LIST_DAOS, &[]).await?;
        Ok(decode_dao_list(&stack)?)
    }

    pub async fn get_dao(&self, dao_id: i64) -> Result<DaoSummary, ContractCallError> {
        let stack = self.call(GET_DAO, &[ContractParam::integer(dao_id)]).await?;
        Ok(decode_dao_summary(first_on_stack("DAO summary", &stack)?)?)
    }

    pub async fn list_proposals(
        &self,
        dao_id: i64,
    ) -> Result<Vec<ProposalSummary>, ContractCallError> {
        let stack = self
            .call(LIST_PROPOSALS, &[ContractParam::integer(dao_id)])
            .await?;
        Ok(decode_proposal_list(&stack)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CoreError, TransportFailure};
    use crate::rpc::bridge::{parse_invoke_response, InvokeResult};
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::Mutex;

    /// Replays one canned JSON-RPC reply and records the calls made.
    struct CannedInvoker {
        reply: Option<Value>,
        calls: Mutex<Vec<(String, Vec<ContractParam>)>>,
    }

    impl CannedInvoker {
        fn replying(stack: Value) -> Self {
            Self {
                reply: Some(json!({
                    "jsonrpc": "2.0",
                    "id": 1,
                    "result": { "state": "HALT", "gasconsumed": "100", "stack": stack }
                })),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn unreachable() -> Self {
            Self {
                reply: None,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl ContractInvoker for CannedInvoker {
        async fn invoke(
            &self,
            method: &str,
            params: &[ContractParam],
        ) -> Result<InvokeResult, ContractCallError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), params.to_vec()));
            let failure = |reason: String| {
                ContractCallError::Transport(TransportFailure {
                    method: method.to_string(),
                    reason,
                })
            };
            let reply = self.reply.clone().ok_or_else(|| failure("connection refused".to_string()))?;
            parse_invoke_response(reply).map_err(failure)
        }
    }

    fn dao(display_name_b64: &str) -> Value {
        json!({
            "type": "Array",
            "value": [
                { "type": "Integer", "value": "1" },
                { "type": "Integer", "value": "100" },
                { "type": "Integer", "value": "10" },
                { "type": "ByteString", "value": display_name_b64 },
                { "type": "Integer", "value": "50" }
            ]
        })
    }

    #[tokio::test]
    async fn get_dao_decodes_display_name() {
        let invoker = Arc::new(CannedInvoker::replying(json!([dao("TXlEYW8=")])));
        let contract = NeodaoContract::new(invoker.clone());

        let summary = contract.get_dao(1).await.unwrap();
        assert_eq!(summary.display_name.as_text(), Some("MyDao"));

        let calls = invoker.calls.lock().unwrap();
        assert_eq!(calls[0].0, GET_DAO);
        assert_eq!(calls[0].1, vec![ContractParam::integer(1)]);
    }

    #[tokio::test]
    async fn list_daos_decodes_every_record() {
        let invoker = Arc::new(CannedInvoker::replying(json!([{
            "type": "Array",
            "value": [dao("TXlEYW8="), dao("SGVsbG8=")]
        }])));
        let daos = NeodaoContract::new(invoker).list_daos().await.unwrap();
        let names: Vec<_> = daos.iter().map(|d| d.display_name.as_text()).collect();
        assert_eq!(names, vec![Some("MyDao"), Some("Hello")]);
    }

    #[tokio::test]
    async fn transport_and_schema_failures_stay_distinct() {
        let contract = NeodaoContract::new(Arc::new(CannedInvoker::unreachable()));
        assert!(matches!(
            contract.list_proposals(1).await,
            Err(ContractCallError::Transport(_))
        ));

        let contract = NeodaoContract::new(Arc::new(CannedInvoker::replying(json!([]))));
        assert!(matches!(
            contract.list_proposals(1).await,
            Err(ContractCallError::Core(CoreError::SchemaMismatch(_)))
        ));
    }

    #[tokio::test]
    async fn malformed_stack_node_is_a_hard_error() {
        let contract = NeodaoContract::new(Arc::new(CannedInvoker::replying(json!([
            { "type": "Array" }
        ]))));
        assert!(matches!(
            contract.list_daos().await,
            Err(ContractCallError::Core(CoreError::MalformedRpcValue(_)))
        ));
    }

    #[test]
    fn script_hash_must_be_prefixed_20_byte_hex() {
        assert!(validate_script_hash("0x0123456789abcdef0123456789abcdef01234567").is_ok());
        assert!(validate_script_hash("0123456789abcdef0123456789abcdef01234567").is_err());
        assert!(validate_script_hash("0x1234").is_err());
        assert!(validate_script_hash("0xzz23456789abcdef0123456789abcdef01234567").is_err());
    }
}
