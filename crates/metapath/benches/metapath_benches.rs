use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use metapath::simple_node::{SimpleNode, assembly, doc, field, flag};
use metapath::{DynamicContext, Error, MetapathExpression, StaticContext};

fn sample_queries() -> Vec<&'static str> {
    vec![
        "1 + 2 * 3",
        "string-length('Lorem ipsum dolor sit amet, consectetur adipiscing elit.')",
        "/catalog/group/control[@class='a'][position() < 5]/@id",
        "for $n in 1 to 100 return $n * $n",
        "if (exists(//control[@featured='true'])) then 'featured' else 'none'",
        "every $c in //control satisfies exists($c/title)",
    ]
}

fn build_sample_document() -> SimpleNode {
    let group = |name: &str, start: usize| {
        assembly("group").flag(flag("id", name)).children((start..start + 20).map(|i| {
            let class = if i % 2 == 0 { "a" } else { "b" };
            let control = assembly("control")
                .flag(flag("id", format!("ctl-{i}")))
                .flag(flag("class", class))
                .child(field("title", format!("Control {i}")));
            if i % 7 == 0 { control.flag(flag("featured", "true")) } else { control }
        }))
    };
    doc()
        .child(assembly("catalog").child(group("alpha", 0)).child(group("beta", 20)))
        .build()
}

fn prepared_queries() -> Result<Vec<MetapathExpression>, Error> {
    let ctx = StaticContext::default();
    sample_queries().into_iter().map(|q| MetapathExpression::compile(q, &ctx)).collect()
}

fn benchmark_compile(c: &mut Criterion) {
    let queries = sample_queries();
    let ctx = StaticContext::default();
    c.bench_function("compile/metapath", |b| {
        b.iter(|| {
            for q in &queries {
                let compiled = MetapathExpression::compile(black_box(q), &ctx).expect("compile failure");
                black_box(compiled);
            }
        })
    });
}

fn benchmark_evaluate(c: &mut Criterion) {
    let document = build_sample_document();
    let focus = vec![document.to_item()];
    let ctx = DynamicContext::default();
    let compiled = prepared_queries().expect("compile failure");

    let mut group = c.benchmark_group("evaluate");
    for expr in &compiled {
        group.bench_with_input(BenchmarkId::from_parameter(expr.source()), expr, |b, expr| {
            b.iter(|| {
                let result = expr.evaluate(black_box(&ctx), &focus).expect("eval failure");
                black_box(result.len());
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark_compile, benchmark_evaluate);
criterion_main!(benches);
