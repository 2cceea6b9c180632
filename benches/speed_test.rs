use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rsa_blind_sign::{DefaultRng, KeyPair, Options};

pub fn protocol(c: &mut Criterion) {
    let mut group = c.benchmark_group("protocol");
    let msg = b"ballot!!";
    let options = Options::default();

    let key_sizes = [2048, 4096];
    for key_size in key_sizes {
        let rsa_sk = rsa::RsaPrivateKey::new(&mut DefaultRng, key_size).unwrap();
        let kp = KeyPair::try_from_rsa(&rsa_sk).unwrap();
        let (pk, sk) = (kp.pk, kp.sk);
        let plain_sk = sk.without_precomputation();

        group.bench_function(BenchmarkId::new("blind", key_size), |b| {
            b.iter(|| {
                _ = pk.blind(&mut DefaultRng, msg).unwrap();
            })
        });

        let blinding_result = pk.blind(&mut DefaultRng, msg).unwrap();

        group.bench_function(BenchmarkId::new("blind_sign", key_size), |b| {
            b.iter(|| {
                _ = sk
                    .blind_sign(&mut DefaultRng, &blinding_result.blind_msg)
                    .unwrap();
            })
        });

        group.bench_function(BenchmarkId::new("blind_sign_without_crt", key_size), |b| {
            b.iter(|| {
                _ = plain_sk
                    .blind_sign(&mut DefaultRng, &blinding_result.blind_msg)
                    .unwrap();
            })
        });

        let blind_sig = sk
            .blind_sign(&mut DefaultRng, &blinding_result.blind_msg)
            .unwrap();

        group.bench_function(BenchmarkId::new("unblind", key_size), |b| {
            b.iter(|| {
                _ = pk.unblind(&blind_sig, &blinding_result.unblinder).unwrap();
            })
        });

        let sig = pk.unblind(&blind_sig, &blinding_result.unblinder).unwrap();

        group.bench_function(BenchmarkId::new("check_blind_sig", key_size), |b| {
            b.iter(|| {
                assert!(pk.check_blind_sig(msg, &sig));
            })
        });

        let receipt = sk.sign(&mut DefaultRng, msg, &options).unwrap();

        group.bench_function(BenchmarkId::new("check_sig", key_size), |b| {
            b.iter(|| {
                assert!(pk.check_sig(msg, &receipt, &options));
            })
        });
    }

    group.finish();
}

criterion_group!(benches, protocol);
criterion_main!(benches);
