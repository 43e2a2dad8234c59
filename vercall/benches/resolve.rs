use criterion::{Criterion, black_box, criterion_group, criterion_main};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use vercall::{MethodTable, Resolver, conf::{CacheMode, ResolverConfig}};
use vertype::{ClassRef, Value};

/// Arguments for `String.valueOf`, drawn from every overload's domain.
fn random_arguments(count: usize) -> Vec<Value> {
    let mut rng = ChaCha20Rng::seed_from_u64(0x42);
    (0..count)
        .map(|_| match rng.random_range(0..=5) {
            0 => Value::from(rng.random_bool(0.5)),
            1 => Value::from(rng.random::<i8>()),
            2 => Value::from(rng.random::<i32>()),
            3 => Value::from(rng.random::<i64>()),
            4 => Value::from(rng.random::<f64>()),
            5 => Value::from("text"),
            _ => unreachable!(),
        })
        .collect()
}

fn bench_resolve(c: &mut Criterion) {
    let arguments = random_arguments(256);

    let shared = Resolver::global();
    c.bench_function("resolve_value_of_cached", |b| {
        b.iter(|| {
            for arg in &arguments {
                let args = std::slice::from_ref(arg);
                black_box(shared.resolve(ClassRef::STRING, true, "valueOf", args).unwrap());
            }
        })
    });

    let uncached = Resolver::with_config(
        MethodTable::from_registrations().unwrap(),
        ResolverConfig {
            cache: CacheMode::Disabled,
        },
    );
    c.bench_function("resolve_value_of_uncached", |b| {
        b.iter(|| {
            for arg in &arguments {
                let args = std::slice::from_ref(arg);
                black_box(uncached.resolve(ClassRef::STRING, true, "valueOf", args).unwrap());
            }
        })
    });
}

fn bench_curry(c: &mut Criterion) {
    let resolver = Resolver::global();
    let int = vertype::Type::from(vertype::PrimitiveType::I32);

    c.bench_function("curry_substring", |b| {
        b.iter(|| {
            let stage = resolver
                .curry(ClassRef::STRING, "substring", &[int, int])
                .and_then(|s| s.apply("criterion"))
                .and_then(|s| s.apply(1))
                .and_then(|s| s.apply(4))
                .unwrap();
            black_box(stage.into_value());
        })
    });
}

criterion_group!(benches, bench_resolve, bench_curry);
criterion_main!(benches);
