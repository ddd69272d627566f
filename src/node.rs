use crate::config::Config;
use crate::error::ChainError;
use crate::ledger::Ledger;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    Booting,
    Ready,
    Degraded,
}

/// One process-wide ledger plus its lifecycle state. Constructed once at
/// startup and shared by handle; there is no global instance.
pub struct Node {
    pub config: Config,
    pub ledger: Arc<RwLock<Ledger>>,
    pub state: Arc<RwLock<NodeState>>,
}

impl Node {
    pub fn init(config: Config) -> Result<Self, ChainError> {
        config.validate()?;
        info!("Starting StakeChain node (network_id = {})", config.network.network_id);

        let ledger = Ledger::from_config(&config)?;
        Ok(Self {
            config,
            ledger: Arc::new(RwLock::new(ledger)),
            state: Arc::new(RwLock::new(NodeState::Booting)),
        })
    }

    /// Periodically process a block whenever transactions are pending.
    pub fn spawn_block_producer(&self, interval: Duration) -> JoinHandle<()> {
        let ledger = self.ledger.clone();
        let state = self.state.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;

                let mut ledger = ledger.write().await;
                if ledger.pending_count() == 0 {
                    continue;
                }

                match ledger.process_block() {
                    Ok(processed) => {
                        debug!(
                            index = processed.index,
                            consensus = processed.consensus_reached,
                            "block produced"
                        );
                        if !ledger.is_valid() {
                            warn!("chain failed integrity check after block {}", processed.index);
                            *state.write().await = NodeState::Degraded;
                        }
                    }
                    Err(e) => warn!("Block production failed: {}", e),
                }
            }
        })
    }

    pub async fn start(self: Arc<Self>) -> Result<(), Box<dyn std::error::Error>> {
        let _producer = if self.config.block_production.enabled {
            let interval = self.config.block_production.interval()?;
            info!("Block production enabled every {:?}", interval);
            Some(self.spawn_block_producer(interval))
        } else {
            None
        };

        *self.state.write().await = NodeState::Ready;

        Node::start_api(self.clone(), self.config.network.api_port).await
    }

    #[cfg(feature = "api")]
    async fn start_api(node: Arc<Self>, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let api_node = Arc::new(crate::api::ApiNode::new_shared(
            node.ledger.clone(),
            Some(node.state.clone()),
        ));
        crate::api::run_api_server(api_node, port).await
    }

    #[cfg(not(feature = "api"))]
    async fn start_api(_node: Arc<Self>, _port: u16) -> Result<(), Box<dyn std::error::Error>> {
        Err("API feature not enabled in this build".into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConsensusConfig;

    fn config() -> Config {
        Config {
            consensus: ConsensusConfig { rng_seed: Some(3) },
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_init_builds_seeded_ledger() {
        let node = Node::init(config()).unwrap();
        assert_eq!(*node.state.read().await, NodeState::Booting);
        let ledger = node.ledger.read().await;
        assert_eq!(ledger.get_all_validators().len(), 4);
    }

    #[tokio::test]
    async fn test_block_producer_drains_pending() {
        let node = Node::init(config()).unwrap();
        node.ledger.write().await.fund("alice", 25).unwrap();

        let handle = node.spawn_block_producer(Duration::from_millis(10));
        for _ in 0..100 {
            if node.ledger.read().await.pending_count() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        handle.abort();

        let ledger = node.ledger.read().await;
        assert_eq!(ledger.pending_count(), 0);
        assert_eq!(ledger.chain_info().length, 2);
        assert_eq!(ledger.get_balance("alice"), 25);
    }
}
