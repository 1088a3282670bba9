//! Shared utilities for integration tests.

use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use access_gate::config::{GateConfig, IpRangeRuleConfig, RuleConfig};
use access_gate::decision::RuleError;
use access_gate::{AccessDecision, GateServer, RequestInfo, Rule, Shutdown};

pub fn ip(s: &str) -> IpAddr {
    s.parse().unwrap()
}

/// Rule returning a fixed verdict and counting its invocations.
#[allow(dead_code)]
#[derive(Debug)]
pub struct ScriptedRule {
    name: String,
    verdict: AccessDecision,
    calls: Arc<AtomicUsize>,
}

#[allow(dead_code)]
pub fn scripted(name: &str, verdict: AccessDecision) -> (Arc<dyn Rule>, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let rule = ScriptedRule {
        name: name.to_string(),
        verdict,
        calls: calls.clone(),
    };
    (Arc::new(rule), calls)
}

#[async_trait]
impl Rule for ScriptedRule {
    fn name(&self) -> &str {
        &self.name
    }

    async fn evaluate(
        &self,
        _request: &RequestInfo,
        _cancel: &CancellationToken,
    ) -> Result<AccessDecision, RuleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.verdict)
    }
}

#[allow(dead_code)]
pub fn calls(counter: &AtomicUsize) -> usize {
    counter.load(Ordering::SeqCst)
}

#[allow(dead_code)]
pub fn ip_range_rule(name: &str, ranges: &[&str]) -> RuleConfig {
    RuleConfig::IpRange(IpRangeRuleConfig {
        name: name.to_string(),
        ranges: ranges.iter().map(|r| r.to_string()).collect(),
    })
}

/// Gate config with DNS disabled, so tests never touch the system resolver.
#[allow(dead_code)]
pub fn gate_config(rules: Vec<RuleConfig>) -> GateConfig {
    let mut config = GateConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.dns.enabled = false;
    config.rules = rules;
    config
}

/// A gate serving on an ephemeral local port.
#[allow(dead_code)]
pub struct RunningGate {
    pub addr: SocketAddr,
    pub updates: mpsc::UnboundedSender<GateConfig>,
    pub shutdown: Shutdown,
    pub handle: JoinHandle<Result<(), std::io::Error>>,
}

#[allow(dead_code)]
pub async fn start_gate(config: GateConfig) -> RunningGate {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (updates, config_updates) = mpsc::unbounded_channel();
    let server = GateServer::new(config).unwrap();
    let server_shutdown = shutdown.subscribe();

    let handle = tokio::spawn(server.run(listener, config_updates, server_shutdown));

    RunningGate {
        addr,
        updates,
        shutdown,
        handle,
    }
}

#[allow(dead_code)]
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}
