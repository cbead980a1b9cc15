//! [`ChainClient`] backed by a node RPC endpoint and the TzKT indexer API.

use core::time::Duration;

use std::collections::BTreeMap;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, de::DeserializeOwned};
use tezos_multisig_coordinator_engine::{ChainClient, ChainError, ContractScript, ObservedOperation};
use tezos_multisig_coordinator_utils::{Address, ChainId, PubKey};
use tezos_multisig_michelson::{OpCode, Prim};
use url::Url;

const HEAD: &str = "chains/main/blocks/head/context/contracts";

// rows per indexer request; longer histories are walked page by page on `id`
const PAGE_LIMIT: usize = 1000;

pub struct TezosRpcClient {
    client: Client,
    node_url: Url,
    indexer_url: Url,
}

impl TezosRpcClient {
    pub fn new(node_url: Url, indexer_url: Url, timeout: Duration) -> reqwest::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self { client, node_url, indexer_url })
    }

    fn node(&self, path: &str) -> Result<Url, ChainError> {
        self.node_url.join(path).map_err(|e| ChainError::transport(e.to_string()))
    }

    async fn get<T>(&self, url: Url) -> Result<T, ChainError>
    where
        T: DeserializeOwned,
    {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ChainError::transport(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(ChainError::NotFound(url.path().to_string().into()));
        }

        response
            .error_for_status()
            .map_err(|e| ChainError::transport(e.to_string()))?
            .json()
            .await
            .map_err(|e| ChainError::invalid_response(e.to_string()))
    }

    /// Reads every transaction matching `filter` above `after_level`, in id order.
    async fn indexed_transactions(
        &self,
        filter: (&str, &str),
        after_level: u64,
    ) -> Result<Vec<IndexedTransaction>, ChainError> {
        let endpoint = self
            .indexer_url
            .join("v1/operations/transactions")
            .map_err(|e| ChainError::transport(e.to_string()))?;

        let mut transactions = Vec::new();
        let mut last_id: Option<u64> = None;

        loop {
            let mut url = endpoint.clone();
            {
                let mut query = url.query_pairs_mut();
                query
                    .append_pair(filter.0, filter.1)
                    .append_pair("level.gt", &after_level.to_string())
                    .append_pair("sort.asc", "id")
                    .append_pair("limit", &PAGE_LIMIT.to_string())
                    .append_pair("micheline", "2");

                if let Some(id) = last_id {
                    query.append_pair("id.gt", &id.to_string());
                }
            }

            let page: Vec<IndexedTransaction> = self.get(url).await?;
            let exhausted = page.len() < PAGE_LIMIT;

            last_id = page.last().map(|transaction| transaction.id).or(last_id);
            transactions.extend(page);

            if exhausted {
                break;
            }

            tracing::debug!(filter = filter.0, last_id, "reading next indexer page");
        }

        Ok(transactions)
    }
}

#[derive(Deserialize)]
struct ContractScriptJson {
    code: serde_json::Value,
}

#[derive(Deserialize)]
struct IndexedAccount {
    address: Address,
}

#[derive(Deserialize)]
struct IndexedParameter {
    entrypoint: String,
    value: serde_json::Value,
}

#[derive(Deserialize)]
struct IndexedTransaction {
    id: u64,
    level: u64,
    hash: String,
    status: String,
    #[serde(default)]
    amount: u64,
    sender: IndexedAccount,
    target: Option<IndexedAccount>,
    parameter: Option<IndexedParameter>,
}

impl IndexedTransaction {
    fn into_observed(self) -> Result<Option<ObservedOperation>, ChainError> {
        let Some(target) = self.target else {
            return Ok(None);
        };

        let (entrypoint, parameters) = match self.parameter {
            Some(parameter) => {
                let value = Prim::from_json_value(&parameter.value)
                    .map_err(|e| ChainError::invalid_response(e.to_string()))?;
                (Some(parameter.entrypoint), Some(value))
            },
            None => (None, None),
        };

        let operation = ObservedOperation::builder()
            .hash(self.hash)
            .level(self.level)
            .applied(self.status == "applied")
            .amount(self.amount)
            .sender(self.sender.address)
            .target(target.address)
            .maybe_entrypoint(entrypoint)
            .maybe_parameters(parameters)
            .build();

        Ok(Some(operation))
    }
}

fn script_section(code: &Prim, section: OpCode) -> Result<Prim, ChainError> {
    code.as_seq()
        .and_then(|sections| sections.iter().find(|prim| prim.is(section)))
        .cloned()
        .ok_or_else(|| ChainError::invalid_response(format!("script has no {section} section")))
}

#[async_trait]
impl ChainClient for TezosRpcClient {
    #[tracing::instrument(skip_all)]
    async fn chain_id(&self) -> Result<ChainId, ChainError> {
        let chain_id: String = self.get(self.node("chains/main/chain_id")?).await?;

        chain_id.parse().map_err(|e: tezos_multisig_coordinator_utils::EncodingError| {
            ChainError::invalid_response(e.to_string())
        })
    }

    #[tracing::instrument(skip_all, fields(%address))]
    async fn contract_script(&self, address: &Address) -> Result<ContractScript, ChainError> {
        let script: ContractScriptJson = self.get(self.node(&format!("{HEAD}/{address}/script"))?).await?;

        let code = Prim::from_json_value(&script.code)
            .map_err(|e| ChainError::invalid_response(e.to_string()))?;

        Ok(ContractScript::builder()
            .parameter(script_section(&code, OpCode::K_PARAMETER)?)
            .storage(script_section(&code, OpCode::K_STORAGE)?)
            .build())
    }

    #[tracing::instrument(skip_all, fields(%address))]
    async fn contract_storage(&self, address: &Address) -> Result<Prim, ChainError> {
        let storage: serde_json::Value = self.get(self.node(&format!("{HEAD}/{address}/storage"))?).await?;

        Prim::from_json_value(&storage).map_err(|e| ChainError::invalid_response(e.to_string()))
    }

    #[tracing::instrument(skip_all, fields(%address))]
    async fn manager_key(&self, address: &Address) -> Result<Option<PubKey>, ChainError> {
        let key: Option<String> = match self.get(self.node(&format!("{HEAD}/{address}/manager_key"))?).await {
            Err(ChainError::NotFound(_)) => None,
            key => key?,
        };

        key.map(|key| key.parse())
            .transpose()
            .map_err(|e: tezos_multisig_coordinator_utils::EncodingError| {
                ChainError::invalid_response(e.to_string())
            })
    }

    #[tracing::instrument(skip_all, fields(%address))]
    async fn balance(&self, address: &Address) -> Result<u64, ChainError> {
        let balance: String = self.get(self.node(&format!("{HEAD}/{address}/balance"))?).await?;

        balance.parse().map_err(|e: core::num::ParseIntError| ChainError::invalid_response(e.to_string()))
    }

    #[tracing::instrument(skip_all, fields(%address, after_level))]
    async fn contract_operations(
        &self,
        address: &Address,
        after_level: u64,
    ) -> Result<Vec<ObservedOperation>, ChainError> {
        let address = address.to_string();

        let filters = [
            ("anyof.sender.target", address.as_str()),
            ("parameter.to", address.as_str()),
            ("parameter.[*].txs.[*].to_", address.as_str()),
        ];

        // the same transaction may match several filters
        let mut transactions = BTreeMap::new();

        for filter in filters {
            for transaction in self.indexed_transactions(filter, after_level).await? {
                transactions.insert(transaction.id, transaction);
            }
        }

        let operations: Vec<_> = transactions
            .into_values()
            .map(IndexedTransaction::into_observed)
            .filter_map(Result::transpose)
            .collect::<Result<_, _>>()?;

        tracing::debug!(count = operations.len(), "indexed operations fetched");

        Ok(operations)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::{Json, Router, extract::Query, routing::get};
    use tokio::net::TcpListener;

    use super::*;

    const SENDER: &str = "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH";
    const MULTISIG: &str = "KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV";

    /// Serves `total` plain transfers to the multisig at levels `1..=total`, honouring the
    /// paging parameters the client sends.
    async fn serve_indexer(total: usize) -> Url {
        let transactions = move |Query(query): Query<HashMap<String, String>>| async move {
            if !query.contains_key("anyof.sender.target") {
                return Json(Vec::new());
            }

            let param = |name: &str| query.get(name).map_or(0, |value| value.parse::<usize>().unwrap());
            let first = param("id.gt").max(param("level.gt")) + 1;
            let limit = param("limit");

            let rows = (first..=total)
                .take(limit)
                .map(|id| {
                    serde_json::json!({
                        "id": id,
                        "level": id,
                        "hash": format!("op{id}"),
                        "status": "applied",
                        "amount": 1,
                        "sender": { "address": SENDER },
                        "target": { "address": MULTISIG },
                    })
                })
                .collect::<Vec<_>>();

            Json(rows)
        };

        let app = Router::new().route("/v1/operations/transactions", get(transactions));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        Url::parse(&format!("http://{addr}/")).unwrap()
    }

    #[tokio::test]
    async fn operations_are_read_across_indexer_pages() {
        let total = 2 * PAGE_LIMIT + 500;
        let url = serve_indexer(total).await;
        let client = TezosRpcClient::new(url.clone(), url, Duration::from_secs(5)).unwrap();
        let multisig: Address = MULTISIG.parse().unwrap();

        let operations = client.contract_operations(&multisig, 0).await.unwrap();
        assert_eq!(operations.len(), total);
        assert_eq!(operations.last().unwrap().level(), u64::try_from(total).unwrap());
        assert!(operations.windows(2).all(|pair| pair[0].level() < pair[1].level()));

        let operations = client.contract_operations(&multisig, u64::try_from(total - 10).unwrap()).await.unwrap();
        assert_eq!(operations.len(), 10);
    }

    #[test]
    fn indexed_transactions_become_observed_operations() {
        let json = serde_json::json!({
            "type": "transaction",
            "id": 42,
            "level": 1_500_000,
            "hash": "ooqTbUmwPDbUvU2ZcxVaYWTVKtEwHBNy8rFXsEYvg3GYxbrn1kA",
            "sender": { "address": "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH" },
            "target": { "address": "KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV" },
            "amount": 0,
            "parameter": {
                "entrypoint": "main_parameter",
                "value": { "prim": "Pair", "args": [{ "int": "1" }, []] }
            },
            "status": "applied"
        });

        let transaction: IndexedTransaction = serde_json::from_value(json).unwrap();
        let operation = transaction.into_observed().unwrap().unwrap();

        assert!(operation.applied());
        assert_eq!(operation.level(), 1_500_000);
        assert_eq!(operation.entrypoint(), Some("main_parameter"));
        assert_eq!(operation.parameters(), Some(&Prim::pair(Prim::int(1), Prim::Seq(Vec::new()))));
    }

    #[test]
    fn failed_plain_transfers_are_kept_but_not_applied() {
        let json = serde_json::json!({
            "id": 7,
            "level": 10,
            "hash": "ooqTbUmwPDbUvU2ZcxVaYWTVKtEwHBNy8rFXsEYvg3GYxbrn1kA",
            "sender": { "address": "tz1dBT7PKeSDbPK1No7KNhTvrr3XoLe8vKLH" },
            "target": { "address": "KT1LAuGLiaCF9A72qZtFvVhyzzNFg86fwFnV" },
            "amount": 5000,
            "status": "backtracked"
        });

        let transaction: IndexedTransaction = serde_json::from_value(json).unwrap();
        let operation = transaction.into_observed().unwrap().unwrap();

        assert!(!operation.applied());
        assert_eq!(operation.amount(), 5000);
        assert_eq!(operation.entrypoint(), None);
    }

    #[test]
    fn script_sections_are_found_by_keyword() {
        let code = Prim::Seq(vec![
            Prim::unary(OpCode::K_PARAMETER, Prim::nullary(OpCode::T_UNIT)),
            Prim::unary(OpCode::K_STORAGE, Prim::nullary(OpCode::T_NAT)),
            Prim::unary(OpCode::K_CODE, Prim::Seq(Vec::new())),
        ]);

        assert_eq!(
            script_section(&code, OpCode::K_STORAGE).unwrap(),
            Prim::unary(OpCode::K_STORAGE, Prim::nullary(OpCode::T_NAT))
        );
        assert!(script_section(&Prim::int(0), OpCode::K_CODE).is_err());
    }
}
