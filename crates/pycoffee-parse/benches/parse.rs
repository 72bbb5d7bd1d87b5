use std::hint::black_box;

use codspeed_criterion_compat::{
    BenchmarkId, Criterion, Throughput, criterion_group, criterion_main,
};
use pycoffee_parse::{Dialect, parse};

fn benchmark_parser(c: &mut Criterion) {
    let inputs = [
        (
            "Simple",
            r#"
def foo():
    return 42
"#,
        ),
        (
            "Medium",
            r#"
class Greeter(object):
    def __init__(self, name):
        self.name = name

    def greet(self, *others):
        for other in others:
            if other is not None and other != self.name:
                print("Hello {} from {}".format(other, self.name))
            elif not other:
                continue
        return [o.upper() for o in others if o]
"#,
        ),
    ];

    let mut group = c.benchmark_group("Parser Benchmark");

    for (name, code) in inputs {
        group.throughput(Throughput::Bytes(code.len() as u64));
        group.bench_with_input(BenchmarkId::new("parse_code", name), &code, |b, &code| {
            b.iter(|| {
                let parse = parse(code, Dialect::default());
                black_box(parse);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_parser);
criterion_main!(benches);
