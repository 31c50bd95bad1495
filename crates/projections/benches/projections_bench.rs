use common::AggregateId;
use criterion::{Criterion, criterion_group, criterion_main};
use domain::{CategoryEvent, CategoryFields, DomainEvent};
use event_store::{AppendOptions, EventEnvelope, InMemoryEventStore, Version, store::EventStore};
use projections::{Projection, ProjectionProcessor, SubcategoryIndex};

use std::sync::Arc;

fn make_envelope(aggregate_id: &AggregateId, version: i64, event: &CategoryEvent) -> EventEnvelope {
    EventEnvelope::builder()
        .aggregate_id(aggregate_id.clone())
        .aggregate_type("Category")
        .event_type(DomainEvent::event_type(event))
        .version(Version::new(version))
        .payload(event)
        .unwrap()
        .build()
}

/// Populate a store with N categories under root, each created, renamed and reordered.
async fn populate_store(store: &InMemoryEventStore, n: usize) {
    let root = AggregateId::root();
    for i in 0..n {
        let id = AggregateId::new();
        let fields = CategoryFields::named(format!("Category {i}")).with_parent(root.clone());

        let created = CategoryEvent::category_created(id.clone(), fields.clone());
        let renamed = CategoryEvent::category_updated(
            id.clone(),
            CategoryFields {
                name: format!("Renamed {i}"),
                ..fields.clone()
            },
        );
        let reordered =
            CategoryEvent::category_updated(id.clone(), fields.with_order(i as i64));

        let events = vec![
            make_envelope(&id, 1, &created),
            make_envelope(&id, 2, &renamed),
            make_envelope(&id, 3, &reordered),
        ];
        store.append(events, AppendOptions::new()).await.unwrap();
    }
}

fn bench_catch_up_100_categories(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(populate_store(&store, 100));

    c.bench_function("projections/catch_up_300_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let index = SubcategoryIndex::new();
                let mut processor = ProjectionProcessor::new(store.clone());
                processor.register(Box::new(index.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_catch_up_1000_categories(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();

    rt.block_on(populate_store(&store, 1000));

    c.bench_function("projections/catch_up_3000_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                let index = SubcategoryIndex::new();
                let mut processor = ProjectionProcessor::new(store.clone());
                processor.register(Box::new(index.clone()) as Box<dyn Projection>);
                processor.run_catch_up().await.unwrap();
            });
        });
    });
}

fn bench_process_single_event(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let index = Arc::new(SubcategoryIndex::new());
    let root = AggregateId::root();

    c.bench_function("projections/process_single_event", |b| {
        b.iter(|| {
            rt.block_on(async {
                let id = AggregateId::new();
                let fields = CategoryFields::named("Shoes").with_parent(root.clone());
                let event = CategoryEvent::category_created(id.clone(), fields);
                index.handle(&make_envelope(&id, 1, &event)).await.unwrap();
            });
        });
    });
}

fn bench_query_subcategories(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let index = Arc::new(SubcategoryIndex::new());
    let root = AggregateId::root();

    // Pre-populate with 100 children of root
    rt.block_on(async {
        populate_store(&store, 100).await;
        let mut processor = ProjectionProcessor::new(store);
        processor.register(Box::new(index.as_ref().clone()) as Box<dyn Projection>);
        processor.run_catch_up().await.unwrap();
    });

    c.bench_function("projections/subcategories_of_root_100", |b| {
        b.iter(|| {
            rt.block_on(async {
                index.subcategories(&root).await;
            });
        });
    });
}

fn bench_rebuild_100_categories(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryEventStore::new();
    let index = SubcategoryIndex::new();

    rt.block_on(async {
        populate_store(&store, 100).await;
    });

    let mut processor = ProjectionProcessor::new(store);
    processor.register(Box::new(index) as Box<dyn Projection>);
    let processor = Arc::new(processor);

    c.bench_function("projections/rebuild_300_events", |b| {
        b.iter(|| {
            rt.block_on(async {
                processor.rebuild_all().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_catch_up_100_categories,
    bench_catch_up_1000_categories,
    bench_process_single_event,
    bench_query_subcategories,
    bench_rebuild_100_categories,
);
criterion_main!(benches);
