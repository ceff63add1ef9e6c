use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pmconvert::prelude::*;

fn transit_chain(n: usize) -> StructuralModel {
    let mut model = StructuralModel::new("transit")
        .declare(PopulationParameter::new("KTR"))
        .declare(PopulationParameter::new("TAU"));
    for i in 0..n {
        let rhs = if i == 0 {
            "-KTR * A0".to_string()
        } else {
            format!("KTR * A{} - KTR * A{}", i - 1, i)
        };
        model = model.declare(DerivativeVariable::new(
            format!("A{}", i),
            Expression::parse(rhs).unwrap(),
        ));
    }
    model.declare(VariableDefinition::new(
        "CP",
        Some(Expression::parse(format!("A{} * exp(-0.01 * t)", n - 1)).unwrap()),
    ))
}

fn block_benchmark(c: &mut Criterion) {
    let model = transit_chain(50);

    c.bench_function("StructuralBlock construction", |b| {
        b.iter(|| {
            let block = StructuralBlock::new(model.clone()).unwrap();
            black_box(block);
        })
    });

    let block = StructuralBlock::new(model.clone()).unwrap();
    c.bench_function("StructuralBlock classification", |b| {
        b.iter(|| black_box(block.kind()))
    });

    c.bench_function("StructuralBlock regressors", |b| {
        b.iter(|| black_box(block.regressors().len()))
    });

    c.bench_function("StructuralBlock ordering", |b| {
        let mut ordered = block.declarations().to_vec();
        ordered.reverse();
        b.iter(|| {
            let mut block = StructuralBlock::new(model.clone()).unwrap();
            block.set_ordered_variable_list(&ordered).unwrap();
            black_box(block);
        })
    });

    let json = model.to_json().unwrap();
    c.bench_function("load_block from JSON", |b| {
        b.iter(|| black_box(pmconvert::load_block(&json).unwrap()))
    });
}

criterion_group!(benches, block_benchmark);
criterion_main!(benches);
