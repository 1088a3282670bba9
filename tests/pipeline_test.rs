//! Decision engine behavior: range compilation, matching and aggregation.

use std::net::Ipv4Addr;

use tokio_util::sync::CancellationToken;

use access_gate::decision::DecisionPipeline;
use access_gate::ranges::compile;
use access_gate::rules::IpRangeRule;
use access_gate::{AccessDecision, AccessEngine, RequestInfo};

mod common;
use common::{calls, ip, ip_range_rule, scripted};

async fn decide(prefixes: &[&str], client: Option<&str>) -> AccessDecision {
    let engine = AccessEngine::from_config(&[ip_range_rule("ranges", prefixes)]).unwrap();
    let request = RequestInfo::new(client.map(ip));
    engine
        .evaluate(&request, &CancellationToken::new())
        .await
        .unwrap()
}

#[tokio::test]
async fn test_client_inside_prefix_blocked() {
    assert_eq!(
        decide(&["10.0.0.0/24"], Some("10.0.0.5")).await,
        AccessDecision::Block
    );
}

#[tokio::test]
async fn test_client_outside_prefix_allowed() {
    assert_eq!(
        decide(&["10.0.0.0/24"], Some("10.0.1.5")).await,
        AccessDecision::Allow
    );
}

#[test]
fn test_adjacent_prefixes_collapse() {
    let ranges = compile(["10.0.0.0/24", "10.0.1.0/24"]);
    let intervals = ranges.v4().intervals();

    assert_eq!(intervals.len(), 1);
    assert_eq!(intervals[0].start(), u32::from(Ipv4Addr::new(10, 0, 0, 0)));
    assert_eq!(intervals[0].end(), u32::from(Ipv4Addr::new(10, 0, 1, 255)));
}

#[tokio::test]
async fn test_missing_client_challenged() {
    assert_eq!(decide(&["10.0.0.0/24"], None).await, AccessDecision::Challenge);
    assert_eq!(decide(&[], None).await, AccessDecision::Challenge);
    assert_eq!(decide(&["0.0.0.0/0", "::/0"], None).await, AccessDecision::Challenge);
}

#[tokio::test]
async fn test_ipv6_prefix() {
    assert_eq!(
        decide(&["2001:db8::/32"], Some("2001:db8::1")).await,
        AccessDecision::Block
    );
    assert_eq!(
        decide(&["2001:db8::/32"], Some("2001:db9::1")).await,
        AccessDecision::Allow
    );
}

#[tokio::test]
async fn test_families_never_cross() {
    assert_eq!(
        decide(&["::/0"], Some("10.0.0.1")).await,
        AccessDecision::Allow
    );
    assert_eq!(
        decide(&["0.0.0.0/0"], Some("::ffff:10.0.0.1")).await,
        AccessDecision::Allow
    );
}

#[tokio::test]
async fn test_block_stops_the_chain() {
    let (allow, allow_calls) = scripted("always-allow", AccessDecision::Allow);
    let (block, block_calls) = scripted("always-block", AccessDecision::Block);
    let (challenge, challenge_calls) = scripted("always-challenge", AccessDecision::Challenge);
    let pipeline = DecisionPipeline::new(vec![allow, block, challenge]);

    let decision = pipeline
        .evaluate(&RequestInfo::new(None), &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(decision, AccessDecision::Block);
    assert_eq!(calls(&allow_calls), 1);
    assert_eq!(calls(&block_calls), 1);
    assert_eq!(calls(&challenge_calls), 0);
}

const VERDICTS: [AccessDecision; 3] = [
    AccessDecision::Allow,
    AccessDecision::Challenge,
    AccessDecision::Block,
];

/// Every verdict sequence of length `len`, in lexicographic order.
fn sequences(len: u32) -> Vec<Vec<AccessDecision>> {
    (0..3usize.pow(len))
        .map(|mut n| {
            (0..len)
                .map(|_| {
                    let v = VERDICTS[n % 3];
                    n /= 3;
                    v
                })
                .collect()
        })
        .collect()
}

#[tokio::test]
async fn test_aggregation_over_all_short_sequences() {
    for len in 0..=4 {
        for verdicts in sequences(len) {
            let first_block = verdicts.iter().position(|v| *v == AccessDecision::Block);
            let considered = match first_block {
                Some(i) => &verdicts[..=i],
                None => &verdicts[..],
            };
            let expected = considered
                .iter()
                .copied()
                .max()
                .unwrap_or(AccessDecision::Allow);

            let (rules, counters): (Vec<_>, Vec<_>) = verdicts
                .iter()
                .enumerate()
                .map(|(i, v)| scripted(&format!("rule-{i}"), *v))
                .unzip();
            let pipeline = DecisionPipeline::new(rules);

            let decision = pipeline
                .evaluate(&RequestInfo::new(None), &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(decision, expected, "verdicts: {verdicts:?}");

            for (i, counter) in counters.iter().enumerate() {
                let expected_calls = if i < considered.len() { 1 } else { 0 };
                assert_eq!(calls(counter), expected_calls, "rule {i} of {verdicts:?}");
            }
        }
    }
}

#[tokio::test]
async fn test_allow_rules_are_neutral() {
    for verdicts in sequences(3) {
        let base = DecisionPipeline::new(
            verdicts
                .iter()
                .map(|v| scripted("r", *v).0)
                .collect(),
        );
        let mut padded_rules: Vec<_> = vec![scripted("pad", AccessDecision::Allow).0];
        for v in &verdicts {
            padded_rules.push(scripted("r", *v).0);
            padded_rules.push(scripted("pad", AccessDecision::Allow).0);
        }
        let padded = DecisionPipeline::new(padded_rules);

        let request = RequestInfo::new(None);
        let cancel = CancellationToken::new();
        assert_eq!(
            base.evaluate(&request, &cancel).await.unwrap(),
            padded.evaluate(&request, &cancel).await.unwrap()
        );
    }
}

/// Small deterministic generator so failures reproduce.
struct XorShift(u64);

impl XorShift {
    fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }

    fn below(&mut self, n: u64) -> u64 {
        self.next() % n
    }
}

/// Aligned IPv4 prefixes inside 10.0.0.0/20, so brute force stays cheap.
fn random_prefixes(rng: &mut XorShift, count: usize) -> Vec<(u32, u8)> {
    let base = u32::from(Ipv4Addr::new(10, 0, 0, 0));
    (0..count)
        .map(|_| {
            let len = 20 + rng.below(13) as u8;
            let host_bits = 32 - u32::from(len);
            let offset = (rng.below(1 << 12) as u32) >> host_bits << host_bits;
            (base + offset, len)
        })
        .collect()
}

fn render(prefixes: &[(u32, u8)]) -> Vec<String> {
    prefixes
        .iter()
        .map(|(net, len)| format!("{}/{}", Ipv4Addr::from(*net), len))
        .collect()
}

#[test]
fn test_merge_preserves_membership() {
    let mut rng = XorShift(0x9E37_79B9_7F4A_7C15);

    for _ in 0..50 {
        let count = 1 + rng.below(12) as usize;
        let prefixes = random_prefixes(&mut rng, count);
        let ranges = compile(render(&prefixes));

        // One address beyond either end of the window as well.
        let low = u32::from(Ipv4Addr::new(10, 0, 0, 0)) - 1;
        let high = u32::from(Ipv4Addr::new(10, 0, 16, 0));
        for addr in low..=high {
            let expected = prefixes.iter().any(|(net, len)| {
                let mask = u32::MAX.checked_shr(u32::from(*len)).unwrap_or(0);
                addr >= *net && addr <= (net | mask)
            });
            assert_eq!(
                ranges.contains(Ipv4Addr::from(addr).into()),
                expected,
                "address {} against {:?}",
                Ipv4Addr::from(addr),
                render(&prefixes)
            );
        }
    }
}

#[test]
fn test_compile_is_order_independent_and_minimal() {
    let mut rng = XorShift(0x0123_4567_89AB_CDEF);

    for _ in 0..50 {
        let count = 1 + rng.below(16) as usize;
        let mut prefixes = render(&random_prefixes(&mut rng, count));
        let forward = compile(&prefixes);

        prefixes.reverse();
        let reversed = compile(&prefixes);
        prefixes.rotate_left(count / 2);
        let rotated = compile(&prefixes);

        assert_eq!(forward, reversed);
        assert_eq!(forward, rotated);

        for pair in forward.v4().intervals().windows(2) {
            assert!(
                u64::from(pair[0].end()) + 1 < u64::from(pair[1].start()),
                "touching intervals {} and {}",
                pair[0],
                pair[1]
            );
        }
    }
}

#[tokio::test]
async fn test_malformed_entries_do_not_poison_the_rule() {
    let rule = IpRangeRule::new(
        "mixed",
        ["10.0.0.0/8", "bogus", "10.0.0.0/33", "2001:db8::/129", "192.0.2.1", "2001:db8::/32"],
    );
    assert_eq!(rule.ranges().skipped(), 4);
    assert_eq!(rule.decide(Some(ip("10.200.0.1"))), AccessDecision::Block);
    assert_eq!(rule.decide(Some(ip("2001:db8:ffff::1"))), AccessDecision::Block);
    assert_eq!(rule.decide(Some(ip("192.0.2.1"))), AccessDecision::Allow);
}
