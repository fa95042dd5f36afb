use common::{Money, ProductId};
use criterion::{Criterion, criterion_group, criterion_main};
use ledger::{InMemoryLedgerStore, InventoryLedger, MovementUpdate, NewMovement};
use resources::{InMemoryResources, ProductInput, ResourceService};

/// Builds a ledger holding `n` manual movements spread over 10 products.
async fn populate_ledger(n: usize) -> (InventoryLedger<InMemoryLedgerStore>, Vec<ProductId>) {
    let resources = InMemoryResources::new();
    let ledger = InventoryLedger::new(InMemoryLedgerStore::new(), &resources.services());

    let mut products = Vec::new();
    for i in 0..10 {
        let product = resources
            .products
            .create(ProductInput {
                name: format!("Product {i}"),
                reference: format!("REF-{i:03}"),
                unit_price: Money::from_cents(1000),
            })
            .await
            .unwrap();
        products.push(product.id);
    }

    for i in 0..n {
        let product = products[i % products.len()];
        let new = if i % 3 == 0 {
            NewMovement::outbound(product, 2, Money::from_cents(1000), "bench")
        } else {
            NewMovement::inbound(product, 5, Money::from_cents(800), "bench")
        };
        ledger.create_movement(new).await.unwrap();
    }

    (ledger, products)
}

fn bench_recompute_stock(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (ledger, products) = rt.block_on(populate_ledger(1000));

    c.bench_function("ledger/recompute_stock_100_movements", |b| {
        b.iter(|| {
            rt.block_on(async {
                ledger.recompute_stock(products[0]).await.unwrap();
            });
        });
    });
}

fn bench_update_movement(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (ledger, products) = rt.block_on(populate_ledger(1000));
    let movement = rt
        .block_on(ledger.movements(Some(products[1])))
        .unwrap()
        .remove(0);

    let mut quantity = 1;
    c.bench_function("ledger/update_movement_reversal", |b| {
        b.iter(|| {
            quantity = quantity % 50 + 1;
            rt.block_on(async {
                ledger
                    .update_movement(
                        movement.id,
                        MovementUpdate {
                            quantity,
                            unit_price: Money::from_cents(800),
                            product_id: None,
                            date: None,
                        },
                    )
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(benches, bench_recompute_stock, bench_update_movement);
criterion_main!(benches);
