use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{Value, json};

use facetstate::config::ControllerConfig;
use facetstate::error::{FacetStateError, Result};
use facetstate::index::DeferredTransport;
use facetstate::query::{FieldSpec, FieldValue, PageStrategy, SortField};
use facetstate::store::{ErrorKind, Generation, RequestStatus, SearchStore, Snapshot};

fn catalog_config() -> ControllerConfig {
    ControllerConfig::new("memory://catalog").with_search_fields(vec![
        FieldSpec::text("*"),
        FieldSpec::list_facet("color"),
        FieldSpec::range_facet("price"),
    ])
}

fn docs(from: usize, count: usize) -> Vec<Value> {
    (from..from + count)
        .map(|i| json!({"id": format!("doc-{i}"), "title": format!("Item {i}")}))
        .collect()
}

fn response(num_found: u64, docs: Vec<Value>, colors: Value) -> Value {
    json!({
        "numFound": num_found,
        "docs": docs,
        "facetCounts": {"color": colors},
    })
}

fn recorded(store: &SearchStore) -> Arc<Mutex<Vec<Arc<Snapshot>>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe(move |snapshot: &Snapshot| sink.lock().push(Arc::new(snapshot.clone())));
    seen
}

#[test]
fn init_then_resolve_fills_results() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();

    let config = ControllerConfig::new("memory://catalog").with_rows(20);
    let generation = store.init(config)?;

    let pending = store.snapshot();
    assert_eq!(pending.generation, generation);
    assert_eq!(pending.status, RequestStatus::Pending);
    assert!(pending.results.pending);
    assert!(pending.results.docs.is_empty());
    assert_eq!(pending.results.num_found, 0);

    let ticket = transport.try_next().expect("init issues a request");
    assert_eq!(ticket.generation(), generation);
    assert_eq!(ticket.request().limit, 20);
    ticket.resolve(json!({"numFound": 57, "docs": docs(0, 20), "facetCounts": {}}));

    let resolved = store.snapshot();
    assert_eq!(resolved.status, RequestStatus::Resolved);
    assert!(!resolved.results.pending);
    assert_eq!(resolved.results.docs.len(), 20);
    assert_eq!(resolved.results.num_found, 57);
    assert!(resolved.results.facets.is_empty());
    Ok(())
}

#[test]
fn superseded_response_is_never_applied() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(catalog_config())?;
    transport
        .try_next()
        .unwrap()
        .resolve(response(3, docs(0, 3), json!(["red", 2, "blue", 1])));

    let red = store
        .set_search_field("color", FieldValue::list(["red"]))
        .unwrap();
    let blue = store
        .set_search_field("color", FieldValue::list(["blue"]))
        .unwrap();
    assert!(blue > red);

    let tickets = transport.drain();
    assert_eq!(tickets.len(), 2);
    let mut tickets = tickets.into_iter();
    let red_ticket = tickets.next().unwrap();
    let blue_ticket = tickets.next().unwrap();

    // the newer answer arrives first, then the stale one
    blue_ticket.resolve(response(1, vec![json!({"id": "blue-1"})], json!(["red", 2, "blue", 1])));
    red_ticket.resolve(response(2, vec![json!({"id": "red-1"}), json!({"id": "red-2"})], json!([])));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.generation, blue);
    assert_eq!(snapshot.results.num_found, 1);
    assert_eq!(snapshot.results.docs[0].id, "blue-1");
    assert_eq!(snapshot.status, RequestStatus::Resolved);
    Ok(())
}

#[test]
fn stale_response_before_current_one_is_dropped() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(catalog_config())?;
    transport.drain();

    store.set_search_field("color", FieldValue::list(["red"]));
    let current = store
        .set_search_field("color", FieldValue::list(["blue"]))
        .unwrap();
    let mut tickets = transport.drain().into_iter();
    let stale = tickets.next().unwrap();
    let fresh = tickets.next().unwrap();

    stale.resolve(response(9, docs(0, 9), json!([])));
    let snapshot = store.snapshot();
    assert!(snapshot.results.pending);
    assert_eq!(snapshot.results.num_found, 0);

    fresh.resolve(response(4, docs(0, 4), json!([])));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.generation, current);
    assert_eq!(snapshot.results.num_found, 4);
    Ok(())
}

#[test]
fn infinite_loading_appends_documents() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(
        catalog_config()
            .with_rows(2)
            .with_page_strategy(PageStrategy::Infinite),
    )?;
    transport
        .try_next()
        .unwrap()
        .resolve(response(5, docs(0, 2), json!(["red", 3])));

    store.load_more();
    let ticket = transport.try_next().unwrap();
    assert_eq!(ticket.request().offset, 2);
    ticket.resolve(response(6, docs(2, 2), json!(["red", 4])));

    store.load_more();
    let ticket = transport.try_next().unwrap();
    assert_eq!(ticket.request().offset, 4);
    ticket.resolve(response(6, docs(4, 2), json!(["blue", 1])));

    let snapshot = store.snapshot();
    let ids: Vec<_> = snapshot.results.docs.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec!["doc-0", "doc-1", "doc-2", "doc-3", "doc-4", "doc-5"]);
    assert_eq!(snapshot.results.num_found, 6);
    assert_eq!(snapshot.facets("color")[0].value, "blue");
    assert_eq!(snapshot.query.start, 4);
    Ok(())
}

#[test]
fn filter_change_in_infinite_mode_replaces_documents() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(
        catalog_config()
            .with_rows(2)
            .with_page_strategy(PageStrategy::Infinite),
    )?;
    transport.try_next().unwrap().resolve(response(5, docs(0, 2), json!([])));
    store.load_more();
    transport.try_next().unwrap().resolve(response(5, docs(2, 2), json!([])));
    assert_eq!(store.snapshot().results.docs.len(), 4);

    store.set_search_field("color", FieldValue::list(["red"]));
    let ticket = transport.try_next().unwrap();
    assert_eq!(ticket.request().offset, 0);
    ticket.resolve(response(1, docs(10, 1), json!([])));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.query.start, 0);
    assert_eq!(snapshot.results.docs.len(), 1);
    assert_eq!(snapshot.results.docs[0].id, "doc-10");
    Ok(())
}

fn infinite_store(transport: &DeferredTransport) -> Result<SearchStore> {
    let store = SearchStore::builder(transport.clone()).build();
    store.init(
        catalog_config()
            .with_rows(2)
            .with_page_strategy(PageStrategy::Infinite),
    )?;
    transport
        .try_next()
        .unwrap()
        .resolve(response(10, docs(0, 2), json!([])));
    Ok(store)
}

fn doc_ids(snapshot: &Snapshot) -> Vec<&str> {
    snapshot.results.docs.iter().map(|d| d.id.as_str()).collect()
}

#[test]
fn load_more_during_pending_filter_change_reloads_from_the_top() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = infinite_store(&transport)?;

    store.set_search_field("color", FieldValue::list(["red"]));
    let current = store.load_more().unwrap();
    assert_eq!(store.snapshot().query.start, 2);

    let mut tickets = transport.drain().into_iter();
    let filtered = tickets.next().unwrap();
    let more = tickets.next().unwrap();
    assert_eq!(filtered.request().offset, 0);
    // the loaded documents belong to the unfiltered query
    assert_eq!(more.request().offset, 0);
    assert_eq!(more.request().limit, 4);

    filtered.resolve(response(3, docs(20, 2), json!(["red", 3])));
    more.resolve(response(3, docs(20, 3), json!(["red", 3])));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.generation, current);
    assert_eq!(snapshot.status, RequestStatus::Resolved);
    assert_eq!(doc_ids(&snapshot), vec!["doc-20", "doc-21", "doc-22"]);
    assert_eq!(snapshot.results.num_found, 3);
    Ok(())
}

#[test]
fn rapid_load_more_with_lost_middle_page_stays_contiguous() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = infinite_store(&transport)?;

    store.load_more();
    let current = store.load_more().unwrap();
    let mut tickets = transport.drain().into_iter();
    let second = tickets.next().unwrap();
    let third = tickets.next().unwrap();
    assert_eq!(second.request().offset, 2);
    assert_eq!(second.request().limit, 2);
    // page 2 never landed, so page 3 cannot be appended on its own
    assert_eq!(third.request().offset, 0);
    assert_eq!(third.request().limit, 6);

    third.resolve(response(10, docs(0, 6), json!([])));
    second.resolve(response(10, docs(2, 2), json!([])));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.generation, current);
    assert_eq!(
        doc_ids(&snapshot),
        vec!["doc-0", "doc-1", "doc-2", "doc-3", "doc-4", "doc-5"]
    );

    // continuity is restored, so the next page appends again
    store.load_more();
    let ticket = transport.try_next().unwrap();
    assert_eq!(ticket.request().offset, 6);
    assert_eq!(ticket.request().limit, 2);
    ticket.resolve(response(10, docs(6, 2), json!([])));
    assert_eq!(store.snapshot().results.docs.len(), 8);
    assert_eq!(store.snapshot().results.docs[7].id, "doc-7");
    Ok(())
}

#[test]
fn failed_page_does_not_count_as_loaded() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = infinite_store(&transport)?;

    store.load_more();
    transport
        .try_next()
        .unwrap()
        .fail(FacetStateError::transport("connection reset"));
    let failed = store.snapshot();
    assert_eq!(failed.status, RequestStatus::Failed);
    assert_eq!(doc_ids(&failed), vec!["doc-0", "doc-1"]);

    store.load_more();
    let ticket = transport.try_next().unwrap();
    assert_eq!(ticket.request().offset, 0);
    assert_eq!(ticket.request().limit, 6);
    ticket.resolve(response(10, docs(0, 6), json!([])));
    assert_eq!(store.snapshot().results.docs.len(), 6);
    Ok(())
}

#[test]
fn jumping_ahead_in_infinite_mode_fills_the_gap() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = infinite_store(&transport)?;

    store.set_page(6);
    let ticket = transport.try_next().unwrap();
    assert_eq!(ticket.request().offset, 0);
    assert_eq!(ticket.request().limit, 8);
    // positional ids count from the top of the backfilled page
    ticket.resolve(json!({"numFound": 10, "docs": [{"title": "a"}, {"title": "b"}]}));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.query.start, 6);
    assert_eq!(doc_ids(&snapshot), vec!["0", "1"]);
    Ok(())
}

#[test]
fn init_rejects_empty_search_fields_without_transition() {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    let seen = recorded(&store);

    let err = store
        .init(ControllerConfig::new("memory://catalog").with_search_fields(vec![]))
        .unwrap_err();
    assert!(matches!(err, FacetStateError::Configuration(_)));

    assert!(transport.is_empty());
    assert!(seen.lock().is_empty());
    let snapshot = store.snapshot();
    assert_eq!(snapshot.generation, Generation::ZERO);
    assert_eq!(snapshot.status, RequestStatus::Idle);
}

#[test]
fn generations_increase_and_each_action_issues_one_request() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();

    let mut generations = vec![store.init(catalog_config())?];
    generations.extend(store.set_search_field("*", FieldValue::text("rust")));
    generations.extend(store.set_sort_fields(vec![SortField::desc("price")]));
    generations.extend(store.set_page(2));
    generations.extend(store.load_more());

    assert_eq!(generations.len(), 5);
    assert!(generations.windows(2).all(|w| w[0] < w[1]));
    assert_eq!(transport.len(), 5);

    let issued: Vec<_> = transport.drain().iter().map(|t| t.generation()).collect();
    assert_eq!(issued, generations);
    Ok(())
}

#[test]
fn search_and_sort_changes_reset_the_page() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(catalog_config().with_rows(10))?;

    store.set_page(3);
    assert_eq!(store.snapshot().query.start, 3);
    assert_eq!(transport.drain().last().unwrap().request().offset, 30);

    store.set_search_field("price", FieldValue::range(Some(5.0), None));
    assert_eq!(store.snapshot().query.start, 0);

    store.set_page(2);
    store.set_sort_fields(vec![SortField::asc("price")]);
    let snapshot = store.snapshot();
    assert_eq!(snapshot.query.start, 0);
    assert_eq!(transport.drain().last().unwrap().request().offset, 0);
    Ok(())
}

#[test]
fn repeating_an_action_still_issues_a_request() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(catalog_config())?;

    let first = store.set_search_field("color", FieldValue::list(["red"]));
    let query_after_first = store.snapshot().query.clone();
    let second = store.set_search_field("color", FieldValue::list(["red"]));

    assert_ne!(first, second);
    assert_eq!(store.snapshot().query, query_after_first);
    assert_eq!(transport.len(), 3);
    Ok(())
}

#[test]
fn ignored_actions_issue_nothing() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();

    assert_eq!(store.set_page(1), None);
    assert!(transport.is_empty());

    store.init(catalog_config())?;
    transport.drain();
    let before = store.snapshot();

    assert_eq!(store.set_search_field("size", FieldValue::list(["xl"])), None);
    assert_eq!(store.set_search_field("color", FieldValue::text("red")), None);
    assert!(transport.is_empty());
    assert_eq!(store.snapshot(), before);
    Ok(())
}

#[test]
fn transport_failure_keeps_previous_results() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(catalog_config())?;
    transport
        .try_next()
        .unwrap()
        .resolve(response(2, docs(0, 2), json!(["red", 2])));

    store.set_search_field("color", FieldValue::list(["red"]));
    transport
        .try_next()
        .unwrap()
        .fail(FacetStateError::transport("connection refused"));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.status, RequestStatus::Failed);
    assert!(!snapshot.results.pending);
    assert_eq!(snapshot.results.docs.len(), 2);
    assert_eq!(snapshot.results.num_found, 2);
    let error = snapshot.results.error.as_ref().unwrap();
    assert_eq!(error.kind, ErrorKind::Transport);
    assert!(error.message.contains("connection refused"));

    // the next success clears the error
    store.set_search_field("color", FieldValue::list(["blue"]));
    transport
        .try_next()
        .unwrap()
        .resolve(response(1, docs(0, 1), json!([])));
    let snapshot = store.snapshot();
    assert_eq!(snapshot.status, RequestStatus::Resolved);
    assert!(snapshot.results.error.is_none());
    Ok(())
}

#[test]
fn malformed_response_fails_the_request() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    store.init(catalog_config())?;

    transport.try_next().unwrap().resolve(json!({"docs": "nope"}));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.status, RequestStatus::Failed);
    assert_eq!(
        snapshot.results.error.as_ref().map(|e| e.kind),
        Some(ErrorKind::MalformedResponse)
    );
    assert!(snapshot.results.docs.is_empty());
    Ok(())
}

#[test]
fn late_response_after_settle_is_dropped() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    let generation = store.init(catalog_config())?;
    let ticket = transport.try_next().unwrap();

    store.expire(generation);
    let expired = store.snapshot();
    assert_eq!(expired.status, RequestStatus::Failed);
    assert_eq!(
        expired.results.error.as_ref().map(|e| e.kind),
        Some(ErrorKind::Timeout)
    );

    ticket.resolve(response(10, docs(0, 10), json!([])));
    assert_eq!(store.snapshot(), expired);
    Ok(())
}

#[test]
fn expiring_an_old_generation_does_nothing() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone()).build();
    let old = store.init(catalog_config())?;
    store.set_page(1);

    let before = store.snapshot();
    store.expire(old);
    assert_eq!(store.snapshot(), before);
    assert_eq!(before.status, RequestStatus::Pending);
    Ok(())
}

#[test]
fn custom_id_field_and_positional_fallback() -> Result<()> {
    let transport = DeferredTransport::new();
    let store = SearchStore::builder(transport.clone())
        .id_field("sku")
        .build();
    store.init(catalog_config().with_rows(5))?;
    store.set_page(1);
    transport.drain().pop().unwrap().resolve(json!({
        "numFound": 7,
        "docs": [{"sku": "A-1"}, {"title": "no sku"}],
    }));

    let snapshot = store.snapshot();
    assert_eq!(snapshot.results.docs[0].id, "A-1");
    assert_eq!(snapshot.results.docs[1].id, "6");
    // declared facets are present even when the index sent none
    assert!(snapshot.facets("color").is_empty());
    assert!(snapshot.results.facets.contains_key("price"));
    Ok(())
}
