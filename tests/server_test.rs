//! End-to-end tests against a gate listening on a local port.

use std::time::Duration;

use access_gate::config::{ChallengeAction, HeaderRuleConfig, RuleConfig};
use access_gate::AccessDecision;

mod common;
use common::{gate_config, http_client, ip_range_rule, start_gate};

#[tokio::test]
async fn test_loopback_block_and_allow() {
    let gate = start_gate(gate_config(vec![ip_range_rule("loopback", &["127.0.0.0/8"])])).await;
    let client = http_client();

    let res = client
        .get(format!("http://{}/app", gate.addr))
        .send()
        .await
        .expect("Gate unreachable");
    assert_eq!(res.status(), 403);
    assert_eq!(res.headers()["x-access-decision"], "block");

    // Health checks are never guarded.
    let res = client
        .get(format!("http://{}/healthz", gate.addr))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    gate.shutdown.trigger();
    gate.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_config_update_applies_while_serving() {
    let gate = start_gate(gate_config(vec![ip_range_rule("private", &["10.0.0.0/8"])])).await;
    let client = http_client();
    let url = format!("http://{}/", gate.addr);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-access-decision"], "allow");

    gate.updates
        .send(gate_config(vec![ip_range_rule("loopback", &["127.0.0.1/32"])]))
        .unwrap();

    let mut status = 0;
    for _ in 0..50 {
        status = client.get(&url).send().await.unwrap().status().as_u16();
        if status == 403 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, 403, "reloaded rules never took effect");

    gate.shutdown.trigger();
    gate.handle.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_invalid_update_keeps_running_rules() {
    let gate = start_gate(gate_config(vec![ip_range_rule("loopback", &["127.0.0.0/8"])])).await;
    let client = http_client();
    let url = format!("http://{}/", gate.addr);

    let mut bad = gate_config(vec![]);
    bad.challenge.status = 200;
    gate.updates.send(bad).unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(client.get(&url).send().await.unwrap().status(), 403);

    gate.shutdown.trigger();
}

#[tokio::test]
async fn test_trusted_forwarded_for() {
    let mut config = gate_config(vec![ip_range_rule("docs", &["203.0.113.0/24"])]);
    config.request.trust_forwarded_for = true;
    config.request.trusted_proxies = vec!["127.0.0.0/8".to_string()];
    let gate = start_gate(config).await;
    let client = http_client();
    let url = format!("http://{}/", gate.addr);

    let res = client
        .get(&url)
        .header("x-forwarded-for", "203.0.113.7, 127.0.0.1")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 403);

    let res = client
        .get(&url)
        .header("x-forwarded-for", "198.51.100.7")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(&url).send().await.unwrap();
    assert_eq!(res.status(), 200);

    gate.shutdown.trigger();
}

#[tokio::test]
async fn test_challenge_policies() {
    let header_rule = RuleConfig::Header(HeaderRuleConfig {
        name: "scanner".to_string(),
        header: "user-agent".to_string(),
        equals: None,
        contains: Some("sqlmap".to_string()),
        action: AccessDecision::Challenge,
        on_missing: AccessDecision::Allow,
    });

    let gate = start_gate(gate_config(vec![header_rule.clone()])).await;
    let client = http_client();
    let url = format!("http://{}/", gate.addr);

    let res = client
        .get(&url)
        .header("user-agent", "SQLMap/1.7")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-access-decision"], "challenge");

    let mut reject = gate_config(vec![header_rule]);
    reject.challenge.action = ChallengeAction::Reject;
    reject.challenge.status = 401;
    gate.updates.send(reject).unwrap();

    let mut status = 0;
    for _ in 0..50 {
        status = client
            .get(&url)
            .header("user-agent", "sqlmap")
            .send()
            .await
            .unwrap()
            .status()
            .as_u16();
        if status == 401 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert_eq!(status, 401);

    let res = client
        .get(&url)
        .header("user-agent", "curl/8.5")
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.headers()["x-access-decision"], "allow");

    gate.shutdown.trigger();
}
