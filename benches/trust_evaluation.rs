//! Benchmarks for remote user trust evaluation
//!
//! Each evaluation walks the full chain: own master and user-signing keys,
//! the subject's master and self-signing keys, then one signature check per
//! device. Cost is dominated by Ed25519 verification over canonical JSON.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use crosstrust::crypto::{canonical_json, verify_signature};
use crosstrust::keys::KeyUsage;
use crosstrust::network::{MockKeyServer, StaticDevice};
use crosstrust::secrets::MemorySecretReader;
use crosstrust::trust::{CrossSigning, IdentityFixture, OwnIdentity, UserTrust};
use std::sync::Arc;
use tokio::runtime::Runtime;

type Engine = CrossSigning<Arc<MemorySecretReader>, MockKeyServer, StaticDevice>;

/// Alice trusting Bob, who has `devices` cross-signed devices
fn create_world(runtime: &Runtime, devices: usize) -> (Engine, IdentityFixture) {
    let alice = IdentityFixture::new("@alice:example.org", 1);
    let bob = IdentityFixture::new("@bob:example.org", 50);
    let server = MockKeyServer::new();
    let secrets = Arc::new(MemorySecretReader::new());

    alice.publish(&server).unwrap();
    alice.store_secrets(&secrets);
    bob.publish(&server).unwrap();
    server.publish_key(KeyUsage::Master, alice.sign_master_of(&bob).unwrap());
    for i in 0..devices {
        server.add_device(bob.signed_device(&format!("DEVICE{i}")).unwrap());
    }

    let engine = runtime.block_on(CrossSigning::load(
        OwnIdentity::new(&alice.user_id, "ALICEDEV"),
        secrets,
        server,
        StaticDevice::new(alice.device("ALICEDEV").unwrap()),
    ));
    (engine, bob)
}

fn benchmark_single_signature(c: &mut Criterion) {
    let alice = IdentityFixture::new("@alice:example.org", 1);
    let key = alice.subkey(KeyUsage::SelfSigning).unwrap();
    let master = alice.public_key(KeyUsage::Master).unwrap();

    c.bench_function("verify_signature", |b| {
        b.iter(|| verify_signature(black_box(&key), &alice.user_id, &master));
    });

    c.bench_function("canonical_json", |b| {
        b.iter(|| canonical_json(black_box(&key)).unwrap());
    });
}

fn benchmark_trust_scaling(c: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let mut group = c.benchmark_group("evaluate_user_trust");

    for devices in [1, 10, 50, 100].iter() {
        let (engine, bob) = create_world(&runtime, *devices);
        assert_eq!(
            runtime.block_on(engine.evaluate_user_trust(&bob.user_id)),
            UserTrust::Trusted
        );

        group.bench_with_input(BenchmarkId::from_parameter(devices), devices, |b, _| {
            b.iter(|| runtime.block_on(engine.evaluate_user_trust(black_box(&bob.user_id))));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_single_signature, benchmark_trust_scaling);
criterion_main!(benches);
