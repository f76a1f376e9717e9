use criterion::{criterion_group, criterion_main, Criterion};
use modda_core::tokenizer::{script_expand, tokenize};

static SAMPLE: &str = "14-модда. Ишга қабул қилиш тартиби. Ишга қабул қилиш mehnat shartnomasi асосида амалга оширилади. Меҳнат шартномаси ёзма шаклда тузилади ва икки нусхада расмийлаштирилади, бир нусхаси ходимга берилади. ";

fn bench_tokenize(c: &mut Criterion) {
    let text = SAMPLE.repeat(200);
    c.bench_function("tokenize_statute", |b| b.iter(|| tokenize(&text)));
    c.bench_function("tokenize_and_expand_statute", |b| {
        b.iter(|| {
            tokenize(&text)
                .into_iter()
                .flat_map(|t| script_expand(&t))
                .count()
        })
    });
}

criterion_group!(benches, bench_tokenize);
criterion_main!(benches);
