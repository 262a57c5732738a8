//! Shortcode store tests
//!
//! Covers creation, lazy expiry, click tracking and stats on the
//! in-memory store. Time is driven by `ManualClock` so expiry is exact.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

use chrono::{DateTime, Duration, Utc};

use shorturls::audit::{AuditLevel, AuditPackage, MemoryAuditSink, NoopAuditSink};
use shorturls::errors::ShortUrlError;
use shorturls::store::{
    CreateShortUrl, GENERATED_SHORTCODE_LEN, MAX_GENERATION_ATTEMPTS, MSG_EXHAUSTED,
    MSG_INVALID_FORMAT, MSG_TAKEN, ManualClock, RandomCodeGenerator, Resolution,
    SHORTCODE_ALPHABET, SequenceCodeGenerator, ShortcodeStore, SystemClock,
};

// =============================================================================
// Test Setup
// =============================================================================

fn start_time() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339("2026-03-01T12:00:00Z")
        .unwrap()
        .with_timezone(&Utc)
}

fn manual_store() -> (ShortcodeStore, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let store = ShortcodeStore::with_components(
        Arc::new(RandomCodeGenerator),
        clock.clone(),
        Arc::new(NoopAuditSink),
    );
    (store, clock)
}

fn audited_store() -> (ShortcodeStore, Arc<ManualClock>, Arc<MemoryAuditSink>) {
    let clock = Arc::new(ManualClock::new(start_time()));
    let audit = Arc::new(MemoryAuditSink::new());
    let store =
        ShortcodeStore::with_components(Arc::new(RandomCodeGenerator), clock.clone(), audit.clone());
    (store, clock, audit)
}

// =============================================================================
// Create
// =============================================================================

#[test]
fn test_generated_shortcode_uses_alphabet_and_length() {
    let (store, _clock) = manual_store();

    let mut seen = HashSet::new();
    for i in 0..200 {
        let record = store
            .create(CreateShortUrl::new(format!("https://example.com/{}", i)))
            .unwrap();

        assert_eq!(record.shortcode.len(), GENERATED_SHORTCODE_LEN);
        assert!(
            record
                .shortcode
                .bytes()
                .all(|b| SHORTCODE_ALPHABET.contains(&b))
        );
        assert!(seen.insert(record.shortcode));
    }
    assert_eq!(store.len(), 200);
}

#[test]
fn test_create_sets_expiry_and_empty_clicks() {
    let (store, _clock) = manual_store();

    let record = store
        .create(CreateShortUrl::new("https://example.com").with_validity(45))
        .unwrap();

    assert_eq!(record.created_at, start_time());
    assert_eq!(record.expires_at, start_time() + Duration::minutes(45));
    assert_eq!(record.validity_minutes, 45);
    assert_eq!(record.click_count, 0);
    assert!(record.click_log.is_empty());
}

#[test]
fn test_default_validity_is_thirty_minutes() {
    let (store, _clock) = manual_store();

    let implicit = store.create(CreateShortUrl::new("https://a.example")).unwrap();
    let zero = store
        .create(CreateShortUrl::new("https://b.example").with_validity(0))
        .unwrap();
    let negative = store
        .create(CreateShortUrl::new("https://c.example").with_validity(-10))
        .unwrap();

    for record in [implicit, zero, negative] {
        assert_eq!(record.validity_minutes, 30);
        assert_eq!(record.expires_at - record.created_at, Duration::minutes(30));
    }
}

#[test]
fn test_target_url_is_not_validated_beyond_emptiness() {
    let (store, _clock) = manual_store();

    let record = store.create(CreateShortUrl::new("not a url at all")).unwrap();
    assert_eq!(record.target_url, "not a url at all");

    let err = store.create(CreateShortUrl::new("   ")).unwrap_err();
    assert!(matches!(err, ShortUrlError::Validation(_)));
}

#[test]
fn test_desired_shortcode_is_used_verbatim() {
    let (store, _clock) = manual_store();

    let record = store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("MyCode42"))
        .unwrap();
    assert_eq!(record.shortcode, "MyCode42");
    assert!(store.resolve("MyCode42").is_some());
    // 大小写敏感
    assert!(store.resolve("mycode42").is_none());
}

#[test]
fn test_empty_desired_shortcode_falls_back_to_generation() {
    let (store, _clock) = manual_store();

    let record = store
        .create(CreateShortUrl::new("https://example.com").with_shortcode(""))
        .unwrap();
    assert_eq!(record.shortcode.len(), GENERATED_SHORTCODE_LEN);
}

#[test]
fn test_invalid_desired_shortcodes_are_rejected() {
    let (store, _clock) = manual_store();

    for code in ["a", "abc", "válid1", "has space", "dash-code", "abcdefghijklmnopq"] {
        let err = store
            .create(CreateShortUrl::new("https://example.com").with_shortcode(code))
            .unwrap_err();
        assert!(
            matches!(err, ShortUrlError::InvalidShortcodeFormat(_)),
            "expected format error for {:?}",
            code
        );
        assert_eq!(err.message(), MSG_INVALID_FORMAT);
    }
    assert!(store.is_empty());
}

#[test]
fn test_shortcode_length_bounds_are_inclusive() {
    let (store, _clock) = manual_store();

    assert!(
        store
            .create(CreateShortUrl::new("https://example.com").with_shortcode("abcd"))
            .is_ok()
    );
    assert!(
        store
            .create(CreateShortUrl::new("https://example.com").with_shortcode("abcdefghijklmnop"))
            .is_ok()
    );
}

#[test]
fn test_taken_shortcode_is_rejected_while_live() {
    let (store, _clock) = manual_store();

    store
        .create(CreateShortUrl::new("https://first.example").with_shortcode("taken1"))
        .unwrap();
    let err = store
        .create(CreateShortUrl::new("https://second.example").with_shortcode("taken1"))
        .unwrap_err();

    assert!(matches!(err, ShortUrlError::ShortcodeTaken(_)));
    assert_eq!(err.message(), MSG_TAKEN);
    assert_eq!(
        store.resolve("taken1").unwrap().target_url,
        "https://first.example"
    );
}

#[test]
fn test_shortcode_can_be_reused_after_expiry() {
    let (store, clock) = manual_store();

    store
        .create(
            CreateShortUrl::new("https://old.example")
                .with_shortcode("reuse1")
                .with_validity(1),
        )
        .unwrap();
    clock.advance(Duration::minutes(2));

    // 未经 resolve 清理，过期记录仍在表中，但不再占用短码
    assert_eq!(store.len(), 1);
    let record = store
        .create(CreateShortUrl::new("https://new.example").with_shortcode("reuse1"))
        .unwrap();

    assert_eq!(record.target_url, "https://new.example");
    assert_eq!(record.click_count, 0);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_concurrent_creates_with_same_shortcode() {
    let store = Arc::new(ShortcodeStore::with_components(
        Arc::new(RandomCodeGenerator),
        Arc::new(SystemClock),
        Arc::new(NoopAuditSink),
    ));

    let handles: Vec<_> = (0..16)
        .map(|i| {
            let store = store.clone();
            thread::spawn(move || {
                store.create(
                    CreateShortUrl::new(format!("https://example.com/{}", i))
                        .with_shortcode("race01"),
                )
            })
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let successes = results.iter().filter(|r| r.is_ok()).count();
    let taken = results
        .iter()
        .filter(|r| matches!(r, Err(ShortUrlError::ShortcodeTaken(_))))
        .count();

    assert_eq!(successes, 1);
    assert_eq!(taken, 15);
    assert_eq!(store.len(), 1);
}

#[test]
fn test_concurrent_generated_creates_are_unique() {
    let store = Arc::new(ShortcodeStore::new(Arc::new(NoopAuditSink)));

    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            thread::spawn(move || {
                (0..100)
                    .map(|i| {
                        store
                            .create(CreateShortUrl::new(format!("https://example.com/{}/{}", t, i)))
                            .unwrap()
                            .shortcode
                    })
                    .collect::<Vec<_>>()
            })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        for code in handle.join().unwrap() {
            assert!(codes.insert(code));
        }
    }
    assert_eq!(codes.len(), 800);
    assert_eq!(store.len(), 800);
}

#[test]
fn test_generation_gives_up_after_max_attempts() {
    let generator = Arc::new(SequenceCodeGenerator::new(["aaaaaa"]));
    let audit = Arc::new(MemoryAuditSink::new());
    let store = ShortcodeStore::with_components(
        generator.clone(),
        Arc::new(ManualClock::new(start_time())),
        audit.clone(),
    );

    let first = store.create(CreateShortUrl::new("https://example.com")).unwrap();
    assert_eq!(first.shortcode, "aaaaaa");
    assert_eq!(generator.calls(), 1);

    let err = store
        .create(CreateShortUrl::new("https://example.com/again"))
        .unwrap_err();
    assert!(matches!(err, ShortUrlError::ShortcodeSpaceExhausted(_)));
    assert_eq!(err.message(), MSG_EXHAUSTED);
    assert_eq!(generator.calls(), 1 + MAX_GENERATION_ATTEMPTS);
    assert_eq!(store.len(), 1);
    assert_eq!(audit.count_level(AuditLevel::Fatal), 1);
}

#[test]
fn test_generation_skips_collisions() {
    let generator = Arc::new(SequenceCodeGenerator::new(["coll01", "coll01", "fresh1"]));
    let store = ShortcodeStore::with_components(
        generator.clone(),
        Arc::new(ManualClock::new(start_time())),
        Arc::new(NoopAuditSink),
    );

    assert_eq!(
        store
            .create(CreateShortUrl::new("https://a.example"))
            .unwrap()
            .shortcode,
        "coll01"
    );
    assert_eq!(
        store
            .create(CreateShortUrl::new("https://b.example"))
            .unwrap()
            .shortcode,
        "fresh1"
    );
    assert_eq!(generator.calls(), 3);
}

#[test]
fn test_generation_reuses_expired_shortcode() {
    let generator = Arc::new(SequenceCodeGenerator::new(["same01"]));
    let clock = Arc::new(ManualClock::new(start_time()));
    let store = ShortcodeStore::with_components(
        generator,
        clock.clone(),
        Arc::new(NoopAuditSink),
    );

    store
        .create(CreateShortUrl::new("https://old.example").with_validity(1))
        .unwrap();
    clock.advance(Duration::minutes(5));

    let record = store.create(CreateShortUrl::new("https://new.example")).unwrap();
    assert_eq!(record.shortcode, "same01");
    assert_eq!(
        store.resolve("same01").unwrap().target_url,
        "https://new.example"
    );
}

// =============================================================================
// Resolve
// =============================================================================

#[test]
fn test_round_trip_then_expiry() {
    let (store, clock) = manual_store();

    let record = store
        .create(CreateShortUrl::new("https://example.com").with_validity(1))
        .unwrap();

    let resolved = store.resolve(&record.shortcode).unwrap();
    assert_eq!(resolved.target_url, "https://example.com");

    clock.advance(Duration::minutes(1) + Duration::seconds(1));
    assert!(store.resolve(&record.shortcode).is_none());
}

#[test]
fn test_resolve_evicts_expired_record_once() {
    let (store, clock) = manual_store();

    store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("evict1"))
        .unwrap();
    clock.advance(Duration::minutes(31));

    assert_eq!(store.len(), 1);
    assert_eq!(store.resolve_detailed("evict1"), Resolution::Expired);
    assert_eq!(store.len(), 0);
    assert_eq!(store.resolve_detailed("evict1"), Resolution::Missing);
}

#[test]
fn test_resolve_unknown_is_missing() {
    let (store, _clock) = manual_store();

    assert_eq!(store.resolve_detailed("nope1234"), Resolution::Missing);
    assert!(store.resolve("nope1234").is_none());
}

#[test]
fn test_resolve_detailed_returns_live_record() {
    let (store, _clock) = manual_store();

    let created = store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("live01"))
        .unwrap();

    match store.resolve_detailed("live01") {
        Resolution::Live(record) => assert_eq!(record, created),
        other => panic!("expected live record, got {:?}", other),
    }
}

// =============================================================================
// Clicks and stats
// =============================================================================

#[test]
fn test_record_click_counts_in_order() {
    let (store, clock) = manual_store();

    store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("click1"))
        .unwrap();

    for i in 0..5 {
        clock.advance(Duration::seconds(10));
        assert!(store.record_click("click1", Some(format!("https://ref{}.example", i)), None));
    }

    let stats = store.get_stats("click1").unwrap();
    assert_eq!(stats.click_count, 5);
    assert_eq!(stats.click_log.len(), 5);
    for (i, event) in stats.click_log.iter().enumerate() {
        assert_eq!(
            event.referrer.as_deref(),
            Some(format!("https://ref{}.example", i).as_str())
        );
        assert!(event.location.is_none());
        assert_eq!(
            event.timestamp,
            start_time() + Duration::seconds(10 * (i as i64 + 1))
        );
    }
    assert!(
        stats
            .click_log
            .windows(2)
            .all(|w| w[0].timestamp <= w[1].timestamp)
    );
}

#[test]
fn test_resolve_and_click_returns_clicked_record() {
    let (store, clock) = manual_store();

    store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("hop001"))
        .unwrap();
    clock.advance(Duration::seconds(5));

    match store.resolve_and_click("hop001", Some("https://ref.example".into()), None) {
        Resolution::Live(record) => {
            assert_eq!(record.target_url, "https://example.com");
            assert_eq!(record.click_count, 1);
            assert_eq!(record.click_log[0].timestamp, start_time() + Duration::seconds(5));
            assert_eq!(
                record.click_log[0].referrer.as_deref(),
                Some("https://ref.example")
            );
        }
        other => panic!("expected live record, got {:?}", other),
    }
    assert_eq!(store.get_stats("hop001").unwrap().click_count, 1);
}

#[test]
fn test_resolve_and_click_on_expired_evicts_without_click() {
    let (store, clock) = manual_store();

    store
        .create(
            CreateShortUrl::new("https://example.com")
                .with_shortcode("hop002")
                .with_validity(1),
        )
        .unwrap();
    clock.advance(Duration::minutes(2));

    assert_eq!(
        store.resolve_and_click("hop002", None, None),
        Resolution::Expired
    );
    assert!(store.is_empty());
    assert_eq!(
        store.resolve_and_click("hop002", None, None),
        Resolution::Missing
    );
}

#[test]
fn test_resolve_and_click_after_recreate_hits_new_record() {
    let (store, clock) = manual_store();

    store
        .create(
            CreateShortUrl::new("https://old.example")
                .with_shortcode("hop003")
                .with_validity(1),
        )
        .unwrap();
    clock.advance(Duration::minutes(2));
    store
        .create(CreateShortUrl::new("https://new.example").with_shortcode("hop003"))
        .unwrap();

    let record = store
        .resolve_and_click("hop003", None, None)
        .into_live()
        .unwrap();
    assert_eq!(record.target_url, "https://new.example");
    assert_eq!(record.click_count, 1);
}

#[test]
fn test_record_click_on_unknown_is_ignored() {
    let (store, _clock) = manual_store();

    assert!(!store.record_click("ghost1", None, None));
    assert!(store.is_empty());
}

#[test]
fn test_record_click_on_expired_is_ignored_and_evicts() {
    let (store, clock) = manual_store();

    store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("stale1"))
        .unwrap();
    clock.advance(Duration::hours(1));

    assert!(!store.record_click("stale1", Some("https://ref.example".into()), None));
    assert!(store.is_empty());
}

#[test]
fn test_stats_snapshot() {
    let (store, _clock) = manual_store();

    let record = store
        .create(CreateShortUrl::new("https://example.com/page").with_shortcode("stats1"))
        .unwrap();
    store.record_click("stats1", None, None);

    let stats = store.get_stats("stats1").unwrap();
    assert_eq!(stats.original_url, "https://example.com/page");
    assert_eq!(stats.created_at, record.created_at);
    assert_eq!(stats.expires_at, record.expires_at);
    assert_eq!(stats.click_count, 1);
    assert!(stats.click_log[0].referrer.is_none());
}

#[test]
fn test_stats_on_expired_record_is_absent() {
    let (store, clock) = manual_store();

    store
        .create(
            CreateShortUrl::new("https://example.com")
                .with_shortcode("stats2")
                .with_validity(5),
        )
        .unwrap();
    clock.advance(Duration::minutes(6));

    assert!(store.get_stats("stats2").is_none());
    assert!(store.is_empty());
}

#[test]
fn test_concurrent_clicks_are_all_counted() {
    let store = Arc::new(ShortcodeStore::new(Arc::new(NoopAuditSink)));
    store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("busy01"))
        .unwrap();

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = store.clone();
            thread::spawn(move || {
                for _ in 0..250 {
                    store.record_click("busy01", None, None);
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let stats = store.get_stats("busy01").unwrap();
    assert_eq!(stats.click_count, 2000);
    assert_eq!(stats.click_log.len(), 2000);
}

// =============================================================================
// Audit events
// =============================================================================

#[test]
fn test_create_emits_one_audit_event_per_outcome() {
    let (store, _clock, audit) = audited_store();

    store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("audit1"))
        .unwrap();
    let _ = store.create(CreateShortUrl::new("https://example.com").with_shortcode("audit1"));
    let _ = store.create(CreateShortUrl::new("https://example.com").with_shortcode("x"));

    let events = audit.events();
    assert_eq!(events.len(), 3);
    assert!(events.iter().all(|e| e.package == AuditPackage::Db));

    assert_eq!(events[0].level, AuditLevel::Info);
    assert_eq!(events[0].message, "Shortcode audit1 saved.");
    assert_eq!(events[1].level, AuditLevel::Warn);
    assert_eq!(events[1].message, "Shortcode audit1 already exists.");
    assert_eq!(events[2].level, AuditLevel::Warn);
    assert_eq!(events[2].message, "Invalid shortcode format: x");
}

#[test]
fn test_lookup_audit_events() {
    let (store, clock, audit) = audited_store();

    store
        .create(CreateShortUrl::new("https://example.com").with_shortcode("audit2"))
        .unwrap();
    audit.clear();

    store.resolve("audit2");
    store.resolve("missing1");
    clock.advance(Duration::minutes(31));
    store.resolve("audit2");

    let events = audit.events();
    assert_eq!(events.len(), 3);
    assert_eq!(events[0].level, AuditLevel::Debug);
    assert_eq!(events[1].level, AuditLevel::Warn);
    assert_eq!(events[1].message, "Shortcode missing1 not found.");
    assert_eq!(events[2].level, AuditLevel::Info);
    assert_eq!(events[2].message, "Shortcode audit2 expired and deleted.");
}
